//! Terminal user interface for the SOAR console
//!
//! Single-screen dashboard over the SOAR backend: live stats, case triage,
//! file scanning, response-mode control, approvals and an activity feed.

pub mod app;
pub mod components;
pub mod event;
pub mod nav;
pub mod refresh;
pub mod scan;
pub mod ui;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, prelude::*, Terminal};
use std::io::stdout;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::info;

use crate::config::ConsoleConfig;
use app::App;
use event::{Event, EventHandler};

const TICK_RATE: Duration = Duration::from_millis(100);

/// Run the TUI until the analyst quits. Must be called inside a tokio runtime.
pub async fn run(config: ConsoleConfig) -> Result<()> {
    info!(base_url = %config.base_url, "Starting SOAR console");

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, Handle::current());
    let mut events = EventHandler::new(TICK_RATE);

    let result = run_app(&mut terminal, &mut app, &mut events).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("SOAR console exited");
    result
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &mut EventHandler,
) -> Result<()> {
    while app.running {
        if app.take_redraw() {
            terminal.draw(|frame| ui::draw(frame, app))?;
        }

        match events.next().await {
            Event::Key(key) => app.handle_key(key),
            Event::Tick => app.tick(),
            Event::Resize(_, _) => app.request_redraw(),
        }
    }

    Ok(())
}
