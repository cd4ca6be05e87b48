use super::{App, PendingAction, View};
use crossterm::event::{KeyCode, KeyEvent};
use soar_protocol::Mode;

impl App {
    /// Handle Approvals view keys (key 5)
    /// a=approve, x=reject, Enter=details; c=open Control when the queue is inactive
    pub(super) fn handle_approvals_key(&mut self, key: KeyEvent) {
        if self.backend.mode != Some(Mode::Semi) {
            if key.code == KeyCode::Char('c') {
                self.navigate(View::Control);
            }
            return;
        }

        let pending = self.backend.pending_approvals().len();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.approvals_state.selected_index + 1 < pending {
                    self.approvals_state.selected_index += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.approvals_state.selected_index =
                    self.approvals_state.selected_index.saturating_sub(1);
            }
            KeyCode::Enter => {
                if let Some((case_id, _)) = self.selected_approval() {
                    self.open_case_detail(&case_id);
                }
            }
            KeyCode::Char('a') => {
                if let Some((case_id, ip)) = self.selected_approval() {
                    self.confirm(PendingAction::ApproveCase { case_id, ip });
                }
            }
            KeyCode::Char('x') => {
                if let Some((case_id, _)) = self.selected_approval() {
                    self.confirm(PendingAction::RejectCase { case_id });
                }
            }
            _ => {}
        }
    }

    fn selected_approval(&self) -> Option<(String, String)> {
        self.backend
            .pending_approvals()
            .get(self.approvals_state.selected_index)
            .map(|case| (case.case_id.clone(), case.ip.clone()))
    }
}
