//! Event handling for the console

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    /// Periodic tick; drives polling, toasts and scan progress
    Tick,
    Resize(u16, u16),
}

pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// Next event, or `Tick` when nothing arrives within the tick rate.
    pub async fn next(&self) -> Event {
        let tick_rate = self.tick_rate;

        tokio::task::spawn_blocking(move || {
            if event::poll(tick_rate).unwrap_or(false) {
                match event::read() {
                    // Windows reports both press and release
                    Ok(CrosstermEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                        Event::Key(key)
                    }
                    Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                    _ => Event::Tick,
                }
            } else {
                Event::Tick
            }
        })
        .await
        .unwrap_or(Event::Tick)
    }
}
