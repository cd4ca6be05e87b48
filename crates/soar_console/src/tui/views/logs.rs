use super::App;
use crossterm::event::{KeyCode, KeyEvent};

const PAGE: usize = 10;

impl App {
    /// Handle Logs view keys (key 6)
    pub(super) fn handle_logs_key(&mut self, key: KeyEvent) {
        let state = &mut self.logs_state;
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => state.scroll = state.scroll.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => state.scroll = state.scroll.saturating_sub(1),
            KeyCode::PageDown => state.scroll = state.scroll.saturating_add(PAGE),
            KeyCode::PageUp => state.scroll = state.scroll.saturating_sub(PAGE),
            KeyCode::Home | KeyCode::Char('g') => state.scroll = 0,
            _ => {}
        }
    }
}
