use super::{App, PendingAction};
use crossterm::event::{KeyCode, KeyEvent};
use soar_protocol::Mode;

impl App {
    /// Handle Control view keys (key 4)
    /// Left/Right=select mode, Enter=switch, a/s/m=switch directly
    pub(super) fn handle_control_key(&mut self, key: KeyEvent) {
        let count = Mode::ALL.len();
        match key.code {
            KeyCode::Right | KeyCode::Down | KeyCode::Char('l') | KeyCode::Char('j') => {
                self.control_state.selected_index = (self.control_state.selected_index + 1) % count;
            }
            KeyCode::Left | KeyCode::Up | KeyCode::Char('h') | KeyCode::Char('k') => {
                self.control_state.selected_index =
                    (self.control_state.selected_index + count - 1) % count;
            }
            KeyCode::Enter => {
                let mode = Mode::ALL[self.control_state.selected_index % count];
                self.request_mode_change(mode);
            }
            KeyCode::Char('a') => self.request_mode_change(Mode::Auto),
            KeyCode::Char('s') => self.request_mode_change(Mode::Semi),
            KeyCode::Char('m') => self.request_mode_change(Mode::Manual),
            _ => {}
        }
    }

    fn request_mode_change(&mut self, to: Mode) {
        if let Some(index) = Mode::ALL.iter().position(|mode| *mode == to) {
            self.control_state.selected_index = index;
        }
        if self.backend.mode == Some(to) {
            self.set_global_status(format!("{} mode is already active", to.title()), false);
            return;
        }
        self.confirm(PendingAction::ChangeMode {
            from: self.backend.mode,
            to,
        });
    }
}
