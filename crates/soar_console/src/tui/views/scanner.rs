use super::{App, ScanPhase, View};
use crossterm::event::{KeyCode, KeyEvent};
use std::path::PathBuf;
use std::time::Instant;

impl App {
    /// Handle Scanner view keys (key 3)
    pub(super) fn handle_scanner_key(&mut self, key: KeyEvent) {
        if self.scanner.editing {
            self.handle_scanner_input_key(key);
            return;
        }

        let result_visible = self.scanner.phase.result_visible(Instant::now());
        match &self.scanner.phase {
            ScanPhase::Idle => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char('i') | KeyCode::Char('/')) {
                    self.scanner.editing = true;
                }
            }
            ScanPhase::Running { .. } => {}
            ScanPhase::Completed { verdict, .. } => {
                if !result_visible {
                    return;
                }
                let malicious = verdict.malicious;
                let queued = self.scanner.phase.queued_for_approval();
                match key.code {
                    KeyCode::Char('n') | KeyCode::Enter => self.reset_scanner(),
                    KeyCode::Char('a') if queued => self.navigate(View::Approvals),
                    KeyCode::Char('v') if malicious => self.navigate(View::Cases),
                    _ => {}
                }
            }
            ScanPhase::Failed { .. } => match key.code {
                KeyCode::Char('t') | KeyCode::Enter => self.retry_scan(),
                KeyCode::Char('n') => self.reset_scanner(),
                _ => {}
            },
        }
    }

    fn handle_scanner_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.scanner.editing = false,
            KeyCode::Enter => {
                let raw = self.scanner.path_input.trim();
                if raw.is_empty() {
                    self.set_global_status("Enter a file path to scan", true);
                    return;
                }
                let path = expand_home(raw);
                if !path.is_file() {
                    self.set_global_status(format!("Not a file: {}", path.display()), true);
                    return;
                }
                self.start_scan(path);
            }
            KeyCode::Backspace => {
                self.scanner.path_input.pop();
            }
            KeyCode::Char(c) => self.scanner.path_input.push(c),
            _ => {}
        }
    }

    /// "Scan Another File": back to an empty path prompt.
    fn reset_scanner(&mut self) {
        self.scanner.phase = ScanPhase::Idle;
        self.scanner.path_input.clear();
        self.scanner.editing = true;
    }
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(raw)
}
