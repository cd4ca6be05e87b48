use super::{App, PendingAction};
use crossterm::event::{KeyCode, KeyEvent};

impl App {
    /// Handle Cases view keys (key 2)
    /// j/k=move, Enter=details, f=filter, c=close, b=block IP, o=re-open
    pub(super) fn handle_cases_key(&mut self, key: KeyEvent) {
        let visible = self.filtered_cases().len();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cases_state.selected_index + 1 < visible {
                    self.cases_state.selected_index += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.cases_state.selected_index = self.cases_state.selected_index.saturating_sub(1);
            }
            KeyCode::Home => self.cases_state.selected_index = 0,
            KeyCode::End => self.cases_state.selected_index = visible.saturating_sub(1),
            KeyCode::Char('f') => {
                self.cases_state.filter = self.cases_state.filter.next();
                self.cases_state.selected_index = 0;
            }
            KeyCode::Enter => {
                if let Some(case_id) = self.selected_case_id() {
                    self.open_case_detail(&case_id);
                }
            }
            KeyCode::Char('c') | KeyCode::Char('b') | KeyCode::Char('o') => {
                if let Some(case_id) = self.selected_case_id() {
                    self.request_case_action(&case_id, key.code);
                }
            }
            _ => {}
        }
    }

    fn selected_case_id(&self) -> Option<String> {
        self.filtered_cases()
            .get(self.cases_state.selected_index)
            .map(|case| case.case_id.clone())
    }

    /// Close and block apply to open cases, re-open to closed ones.
    fn request_case_action(&mut self, case_id: &str, code: KeyCode) {
        let Some(case) = self.backend.find_case(case_id) else {
            return;
        };
        let action = match code {
            KeyCode::Char('c') if case.is_open() => PendingAction::CloseCase {
                case_id: case.case_id.clone(),
            },
            KeyCode::Char('b') if case.is_open() => PendingAction::BlockIp {
                case_id: case.case_id.clone(),
                ip: case.ip.clone(),
            },
            KeyCode::Char('o') if !case.is_open() => PendingAction::ReopenCase {
                case_id: case.case_id.clone(),
            },
            KeyCode::Char('o') => {
                self.set_global_status("Case is already open", false);
                return;
            }
            _ => {
                self.set_global_status("Case is closed", false);
                return;
            }
        };
        self.confirm(action);
    }

    /// Case detail overlay: e=edit notes, c=close, b=block IP, o=re-open, Esc=back
    pub(super) fn handle_case_detail_key(&mut self, key: KeyEvent) {
        let Some(detail) = self.case_detail.as_mut() else {
            return;
        };

        if detail.editing_notes {
            match key.code {
                KeyCode::Esc => {
                    detail.editing_notes = false;
                    detail.notes_input.clear();
                }
                KeyCode::Enter => {
                    let action = PendingAction::SaveNotes {
                        case_id: detail.case_id.clone(),
                        notes: detail.notes_input.clone(),
                    };
                    detail.editing_notes = false;
                    self.confirm(action);
                }
                KeyCode::Backspace => {
                    detail.notes_input.pop();
                }
                KeyCode::Char(c) => detail.notes_input.push(c),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.case_detail = None,
            KeyCode::Down | KeyCode::Char('j') => detail.scroll = detail.scroll.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => detail.scroll = detail.scroll.saturating_sub(1),
            KeyCode::Char('e') => {
                let case_id = detail.case_id.clone();
                let existing = self
                    .backend
                    .find_case(&case_id)
                    .and_then(|case| case.notes.clone())
                    .unwrap_or_default();
                if let Some(detail) = self.case_detail.as_mut() {
                    detail.notes_input = existing;
                    detail.editing_notes = true;
                }
            }
            KeyCode::Char('c') | KeyCode::Char('b') | KeyCode::Char('o') => {
                let case_id = detail.case_id.clone();
                self.request_case_action(&case_id, key.code);
            }
            _ => {}
        }
    }
}
