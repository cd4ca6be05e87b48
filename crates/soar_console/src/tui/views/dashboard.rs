use super::{App, RECENT_CASES};
use crossterm::event::{KeyCode, KeyEvent};

impl App {
    /// Handle Dashboard view keys (key 1)
    pub(super) fn handle_dashboard_key(&mut self, key: KeyEvent) {
        let recent = self.backend.cases.len().min(RECENT_CASES);
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.dashboard.selected_index + 1 < recent {
                    self.dashboard.selected_index += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.dashboard.selected_index = self.dashboard.selected_index.saturating_sub(1);
            }
            KeyCode::Enter => {
                if let Some(case) = self.backend.cases.get(self.dashboard.selected_index) {
                    let case_id = case.case_id.clone();
                    self.open_case_detail(&case_id);
                }
            }
            _ => {}
        }
    }
}
