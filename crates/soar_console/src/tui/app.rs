//! Application state and controller for the SOAR console.
//!
//! `App` owns every piece of UI state for the lifetime of the process. Network
//! work is spawned onto the tokio runtime and reports back over channels that
//! `tick()` drains without blocking; the UI thread never awaits a request.

use chrono::{DateTime, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{debug, info, info_span, warn, Instrument};

use soar_api::SoarApi;
use soar_policy::{advise, ModeChangeRecord, Recommendation};
use soar_protocol::{ActionAck, Case, Mode, ScanVerdict, Stats};

use super::nav;
use super::refresh::RefreshGuard;
use super::scan::{FilePreview, ScanHistory, ScanHistoryEntry, RESULT_REVEAL_DELAY};
use crate::config::ConsoleConfig;

#[path = "views/approvals.rs"]
mod approvals;
#[path = "views/cases.rs"]
mod cases;
#[path = "views/control.rs"]
mod control;
#[path = "views/dashboard.rs"]
mod dashboard;
#[path = "views/logs.rs"]
mod logs;
#[path = "views/scanner.rs"]
mod scanner;

const STATUS_TTL: Duration = Duration::from_secs(3);

/// Rows in the dashboard's recent-cases table.
pub const RECENT_CASES: usize = 5;

/// Named views. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Dashboard,
    Cases,
    Scanner,
    Control,
    Approvals,
    Logs,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Dashboard,
        View::Cases,
        View::Scanner,
        View::Control,
        View::Approvals,
        View::Logs,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::Cases => "cases",
            View::Scanner => "scanner",
            View::Control => "control",
            View::Approvals => "approvals",
            View::Logs => "logs",
        }
    }

    /// Whether a background poll should redraw this view. Scanner and control
    /// hold in-progress interactions and are left alone.
    pub fn redraws_on_poll(&self) -> bool {
        matches!(
            self,
            View::Dashboard | View::Cases | View::Approvals | View::Logs
        )
    }
}

/// Backend state as last fetched. Replaced wholesale on every applied load.
#[derive(Debug, Clone, Default)]
pub struct BackendState {
    pub stats: Stats,
    /// Newest first
    pub cases: Vec<Case>,
    /// `None` until the first successful load
    pub mode: Option<Mode>,
    pub last_refresh: Option<DateTime<Local>>,
    /// Message of the most recent failed load, cleared on success
    pub last_error: Option<String>,
}

impl BackendState {
    pub fn find_case(&self, case_id: &str) -> Option<&Case> {
        self.cases.iter().find(|case| case.case_id == case_id)
    }

    /// Open critical cases, in list order.
    pub fn pending_approvals(&self) -> Vec<&Case> {
        self.cases.iter().filter(|case| case.awaits_approval()).collect()
    }
}

/// One successful load cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub stats: Stats,
    pub cases: Vec<Case>,
    pub mode: Mode,
}

/// Newest first; cases without a parseable creation time sink to the end.
pub fn sort_cases_newest_first(cases: &mut [Case]) {
    cases.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}

/// A mutation waiting for, or past, analyst confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    CloseCase { case_id: String },
    /// Reject from the approval queue; closes the case without remediation
    RejectCase { case_id: String },
    ApproveCase { case_id: String, ip: String },
    BlockIp { case_id: String, ip: String },
    ReopenCase { case_id: String },
    SaveNotes { case_id: String, notes: String },
    ChangeMode { from: Option<Mode>, to: Mode },
}

impl PendingAction {
    pub fn confirm_title(&self) -> &'static str {
        match self {
            PendingAction::CloseCase { .. } => "Close Case",
            PendingAction::RejectCase { .. } => "Reject Remediation",
            PendingAction::ApproveCase { .. } => "Approve Remediation",
            PendingAction::BlockIp { .. } => "Block IP",
            PendingAction::ReopenCase { .. } => "Re-open Case",
            PendingAction::SaveNotes { .. } => "Save Notes",
            PendingAction::ChangeMode { .. } => "Change Mode",
        }
    }

    pub fn confirm_prompt(&self) -> String {
        match self {
            PendingAction::CloseCase { .. } => "Close this case?".to_string(),
            PendingAction::RejectCase { case_id } => format!(
                "Reject remediation for case {}?\n\n\
                 The case will be closed without blocking the IP.",
                soar_protocol::short_id(case_id)
            ),
            PendingAction::ApproveCase { ip, .. } => format!(
                "Approve remediation for IP {}?\n\nThis will block the IP and close the case.",
                ip
            ),
            PendingAction::BlockIp { ip, .. } => format!(
                "Block IP {}?\n\nThis will add the IP to the firewall blocklist.",
                ip
            ),
            PendingAction::ReopenCase { .. } => {
                "Re-open this case?\n\nThe case will be marked as OPEN again.".to_string()
            }
            PendingAction::SaveNotes { case_id, .. } => format!(
                "Save analyst notes for case {}?",
                soar_protocol::short_id(case_id)
            ),
            PendingAction::ChangeMode { to, .. } => format!(
                "Switch SOAR mode to {}?\n\nThis will affect how the system responds to threats.",
                to
            ),
        }
    }

    fn failure_prefix(&self) -> &'static str {
        match self {
            PendingAction::CloseCase { .. } | PendingAction::RejectCase { .. } => {
                "Failed to close case"
            }
            PendingAction::ApproveCase { .. } => "Failed to approve case",
            PendingAction::BlockIp { .. } => "Failed to block IP",
            PendingAction::ReopenCase { .. } => "Failed to re-open case",
            PendingAction::SaveNotes { .. } => "Failed to save notes",
            PendingAction::ChangeMode { .. } => "Failed to change mode",
        }
    }

    /// Message for the blocking alert shown on success, if any.
    fn success_message(&self) -> Option<String> {
        match self {
            PendingAction::BlockIp { ip, .. } => Some(format!("IP {} has been blocked", ip)),
            PendingAction::ReopenCase { .. } => Some("Case has been re-opened".to_string()),
            PendingAction::SaveNotes { .. } => Some("Notes saved successfully".to_string()),
            PendingAction::ChangeMode { to, .. } => {
                Some(format!("SOAR mode successfully changed to {}", to))
            }
            PendingAction::CloseCase { .. }
            | PendingAction::RejectCase { .. }
            | PendingAction::ApproveCase { .. } => None,
        }
    }

    /// Notes patch local state; everything else reloads.
    fn reloads_after_success(&self) -> bool {
        !matches!(self, PendingAction::SaveNotes { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            PendingAction::CloseCase { .. } => "close_case",
            PendingAction::RejectCase { .. } => "reject_case",
            PendingAction::ApproveCase { .. } => "approve_case",
            PendingAction::BlockIp { .. } => "block_ip",
            PendingAction::ReopenCase { .. } => "reopen_case",
            PendingAction::SaveNotes { .. } => "save_notes",
            PendingAction::ChangeMode { .. } => "change_mode",
        }
    }
}

/// Overlay that captures all input until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Confirm(PendingAction),
    Alert {
        title: String,
        message: String,
        is_error: bool,
    },
}

#[derive(Debug, Clone)]
pub struct GlobalStatusMessage {
    pub message: String,
    pub is_error: bool,
    pub expires_at: Instant,
}

/// Auto-dismissing notice for a mode change made by the advisor.
#[derive(Debug, Clone)]
pub struct ModeNotification {
    pub from: Mode,
    pub to: Mode,
    pub reason: String,
    pub expires_at: Instant,
}

/// Case detail overlay (opened from dashboard, cases or approvals).
#[derive(Debug, Clone, Default)]
pub struct CaseDetailState {
    pub case_id: String,
    pub editing_notes: bool,
    pub notes_input: String,
    pub scroll: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseFilter {
    #[default]
    All,
    Open,
    Closed,
}

impl CaseFilter {
    pub fn next(self) -> Self {
        match self {
            CaseFilter::All => CaseFilter::Open,
            CaseFilter::Open => CaseFilter::Closed,
            CaseFilter::Closed => CaseFilter::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CaseFilter::All => "All",
            CaseFilter::Open => "Open",
            CaseFilter::Closed => "Closed",
        }
    }

    pub fn matches(&self, case: &Case) -> bool {
        match self {
            CaseFilter::All => true,
            CaseFilter::Open => case.is_open(),
            CaseFilter::Closed => !case.is_open(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CasesState {
    pub selected_index: usize,
    pub filter: CaseFilter,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    /// Selection within the recent-cases table
    pub selected_index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ApprovalsState {
    pub selected_index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ControlState {
    /// Index into `Mode::ALL`
    pub selected_index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LogsState {
    pub scroll: usize,
}

/// Where the scanner is in its flow.
#[derive(Debug, Clone, Default)]
pub enum ScanPhase {
    #[default]
    Idle,
    Running {
        path: PathBuf,
        started: Instant,
        preview: Option<FilePreview>,
    },
    Completed {
        preview: Option<FilePreview>,
        verdict: ScanVerdict,
        /// Mode at the time the verdict arrived; drives remediation guidance
        mode: Option<Mode>,
        started: Instant,
        completed: Instant,
    },
    Failed {
        path: PathBuf,
        preview: Option<FilePreview>,
        error: String,
    },
}

impl ScanPhase {
    /// Result panel replaces the progress panel a short delay after completion.
    pub fn result_visible(&self, now: Instant) -> bool {
        match self {
            ScanPhase::Completed { completed, .. } => {
                now.saturating_duration_since(*completed) >= RESULT_REVEAL_DELAY
            }
            _ => false,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ScanPhase::Running { .. })
    }

    /// A malicious verdict in SEMI mode that opened a case waits in the
    /// approvals queue.
    pub fn queued_for_approval(&self) -> bool {
        match self {
            ScanPhase::Completed { verdict, mode, .. } => {
                verdict.malicious && verdict.case_id.is_some() && *mode == Some(Mode::Semi)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScannerState {
    pub path_input: String,
    /// Path input has focus
    pub editing: bool,
    pub phase: ScanPhase,
    pub history: ScanHistory,
}

struct LoadOutcome {
    generation: u64,
    result: Result<Snapshot, String>,
}

struct ActionOutcome {
    action: PendingAction,
    result: Result<ActionAck, String>,
}

struct AdvisorOutcome {
    recommendation: Recommendation,
    result: Result<ActionAck, String>,
}

enum ScanEvent {
    Preview(FilePreview),
    Finished(Result<ScanVerdict, String>),
}

pub struct App {
    pub running: bool,
    pub view: View,
    pub show_help: bool,
    pub config: ConsoleConfig,
    pub backend: BackendState,
    /// Session-only record of mode changes, oldest first
    pub activity_log: Vec<ModeChangeRecord>,
    pub dashboard: DashboardState,
    pub cases_state: CasesState,
    pub approvals_state: ApprovalsState,
    pub control_state: ControlState,
    pub logs_state: LogsState,
    pub scanner: ScannerState,
    pub case_detail: Option<CaseDetailState>,
    pub modal: Option<Modal>,
    pub global_status: Option<GlobalStatusMessage>,
    pub mode_notification: Option<ModeNotification>,
    api: SoarApi,
    runtime: Handle,
    refresh: RefreshGuard,
    last_poll: Option<Instant>,
    load_tx: mpsc::Sender<LoadOutcome>,
    load_rx: mpsc::Receiver<LoadOutcome>,
    action_tx: mpsc::Sender<ActionOutcome>,
    action_rx: mpsc::Receiver<ActionOutcome>,
    actions_in_flight: usize,
    pending_advisor: Option<mpsc::Receiver<AdvisorOutcome>>,
    pending_scan: Option<mpsc::Receiver<ScanEvent>>,
    needs_redraw: bool,
}

impl App {
    pub fn new(config: ConsoleConfig, runtime: Handle) -> Self {
        let api = SoarApi::new(config.base_url.clone());
        Self::with_api(config, api, runtime)
    }

    pub fn with_api(config: ConsoleConfig, api: SoarApi, runtime: Handle) -> Self {
        let (load_tx, load_rx) = mpsc::channel();
        let (action_tx, action_rx) = mpsc::channel();
        let history = ScanHistory::with_limit(config.scan_history_limit);
        Self {
            running: true,
            view: View::default(),
            show_help: false,
            backend: BackendState::default(),
            activity_log: Vec::new(),
            dashboard: DashboardState::default(),
            cases_state: CasesState::default(),
            approvals_state: ApprovalsState::default(),
            control_state: ControlState::default(),
            logs_state: LogsState::default(),
            scanner: ScannerState {
                history,
                ..ScannerState::default()
            },
            case_detail: None,
            modal: None,
            global_status: None,
            mode_notification: None,
            config,
            api,
            runtime,
            refresh: RefreshGuard::default(),
            last_poll: None,
            load_tx,
            load_rx,
            action_tx,
            action_rx,
            actions_in_flight: 0,
            pending_advisor: None,
            pending_scan: None,
            needs_redraw: true,
        }
    }

    // ======================================================================
    // Rendering bookkeeping
    // ======================================================================

    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Whether a frame should be drawn; clears the flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    pub fn is_loading(&self) -> bool {
        self.refresh.in_flight()
    }

    pub fn actions_in_flight(&self) -> usize {
        self.actions_in_flight
    }

    pub fn advisor_in_flight(&self) -> bool {
        self.pending_advisor.is_some()
    }

    fn set_global_status(&mut self, message: impl Into<String>, is_error: bool) {
        self.set_global_status_for(message, is_error, STATUS_TTL);
    }

    fn set_global_status_for(
        &mut self,
        message: impl Into<String>,
        is_error: bool,
        duration: Duration,
    ) {
        self.global_status = Some(GlobalStatusMessage {
            message: message.into(),
            is_error,
            expires_at: Instant::now() + duration,
        });
        self.request_redraw();
    }

    fn show_alert(&mut self, title: impl Into<String>, message: impl Into<String>, is_error: bool) {
        self.modal = Some(Modal::Alert {
            title: title.into(),
            message: message.into(),
            is_error,
        });
        self.request_redraw();
    }

    // ======================================================================
    // Navigation
    // ======================================================================

    /// Switch the active view. Does not fetch.
    pub fn navigate(&mut self, view: View) {
        if self.view != view {
            debug!(from = self.view.name(), to = view.name(), "Navigate");
        }
        self.view = view;
        self.case_detail = None;
        if view == View::Control {
            if let Some(mode) = self.backend.mode {
                self.control_state.selected_index =
                    Mode::ALL.iter().position(|m| *m == mode).unwrap_or(0);
            }
        }
        self.request_redraw();
    }

    /// Text input has focus; global single-letter keys are suppressed.
    pub fn in_text_input_mode(&self) -> bool {
        (self.scanner.editing && self.view == View::Scanner)
            || self
                .case_detail
                .as_ref()
                .map(|detail| detail.editing_notes)
                .unwrap_or(false)
    }

    pub fn open_case_detail(&mut self, case_id: &str) {
        if self.backend.find_case(case_id).is_none() {
            return;
        }
        self.case_detail = Some(CaseDetailState {
            case_id: case_id.to_string(),
            ..CaseDetailState::default()
        });
        self.request_redraw();
    }

    // ======================================================================
    // Input
    // ======================================================================

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.request_redraw();

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.running = false;
            return;
        }

        if self.modal.is_some() {
            self.handle_modal_key(key);
            return;
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return;
        }

        if self.case_detail.is_some() {
            self.handle_case_detail_key(key);
            return;
        }

        if !self.in_text_input_mode() {
            match key.code {
                KeyCode::Char('q') => {
                    self.running = false;
                    return;
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                    return;
                }
                KeyCode::Char('r') => {
                    self.request_reload();
                    self.set_global_status("Refreshing...", false);
                    return;
                }
                KeyCode::Char(c) => {
                    if let Some(view) = nav::nav_view_for_key(c) {
                        self.navigate(view);
                        return;
                    }
                }
                _ => {}
            }
        }

        match self.view {
            View::Dashboard => self.handle_dashboard_key(key),
            View::Cases => self.handle_cases_key(key),
            View::Scanner => self.handle_scanner_key(key),
            View::Control => self.handle_control_key(key),
            View::Approvals => self.handle_approvals_key(key),
            View::Logs => self.handle_logs_key(key),
        }
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.modal.take() else {
            return;
        };
        match modal {
            Modal::Confirm(action) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    self.dispatch_action(action);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    debug!(action = action.name(), "Action cancelled");
                }
                _ => self.modal = Some(Modal::Confirm(action)),
            },
            alert @ Modal::Alert { .. } => match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {}
                _ => self.modal = Some(alert),
            },
        }
    }

    /// Ask for confirmation before running `action`.
    pub fn confirm(&mut self, action: PendingAction) {
        self.modal = Some(Modal::Confirm(action));
        self.request_redraw();
    }

    // ======================================================================
    // Tick: drain channels, expire toasts, schedule polls
    // ======================================================================

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&mut self, now: Instant) {
        if let Some(status) = &self.global_status {
            if status.expires_at <= now {
                self.global_status = None;
                self.request_redraw();
            }
        }
        if let Some(notification) = &self.mode_notification {
            if notification.expires_at <= now {
                self.mode_notification = None;
                self.request_redraw();
            }
        }

        self.poll_loads();
        self.poll_actions();
        self.poll_advisor();
        self.poll_scan(now);

        if self.view == View::Scanner {
            match &self.scanner.phase {
                ScanPhase::Running { .. } => self.request_redraw(),
                ScanPhase::Completed { completed, .. }
                    if now.saturating_duration_since(*completed)
                        <= RESULT_REVEAL_DELAY + Duration::from_millis(250) =>
                {
                    self.request_redraw()
                }
                _ => {}
            }
        }

        let due = self
            .last_poll
            .map(|last| now.saturating_duration_since(last) >= self.config.refresh_interval())
            .unwrap_or(true);
        if due {
            self.last_poll = Some(now);
            self.start_load();
        }
    }

    // ======================================================================
    // Data loading
    // ======================================================================

    /// Issue a load now, independent of the poll timer.
    pub fn request_reload(&mut self) {
        self.start_load();
    }

    fn start_load(&mut self) {
        let generation = self.refresh.issue();
        let api = self.api.clone();
        let tx = self.load_tx.clone();
        let span = info_span!("load_cycle", generation);

        self.runtime.spawn(
            async move {
                let result = tokio::try_join!(api.get_stats(), api.list_cases(), api.get_mode())
                    .map(|(stats, mut cases, mode)| {
                        sort_cases_newest_first(&mut cases);
                        Snapshot { stats, cases, mode }
                    })
                    .map_err(|err| err.to_string());
                let _ = tx.send(LoadOutcome { generation, result });
            }
            .instrument(span),
        );
    }

    fn poll_loads(&mut self) {
        while let Ok(outcome) = self.load_rx.try_recv() {
            if !self.refresh.accept(outcome.generation) {
                debug!(generation = outcome.generation, "Discarding stale load response");
                continue;
            }
            match outcome.result {
                Ok(snapshot) => self.apply_snapshot(snapshot),
                Err(err) => {
                    // Stale-but-available: keep showing the previous state
                    warn!(generation = outcome.generation, error = %err, "Data load failed");
                    self.backend.last_error = Some(err);
                    if self.view.redraws_on_poll() {
                        self.request_redraw();
                    }
                }
            }
        }
    }

    /// Replace backend state with a fresh snapshot, then consult the advisor.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        let header_changed = self.backend.mode != Some(snapshot.mode)
            || self.backend.stats.error != snapshot.stats.error;
        if let Some(error) = &snapshot.stats.error {
            if self.backend.stats.error.is_none() {
                warn!(%error, "Backend reported a store error; mode advisor paused");
                self.set_global_status(format!("Backend store error: {}", error), true);
            }
        }

        self.backend.stats = snapshot.stats;
        self.backend.cases = snapshot.cases;
        self.backend.mode = Some(snapshot.mode);
        self.backend.last_refresh = Some(Local::now());
        self.backend.last_error = None;
        self.clamp_selections();

        if let Some(detail) = &self.case_detail {
            if self.backend.find_case(&detail.case_id).is_none() && !detail.editing_notes {
                self.case_detail = None;
            }
        }

        self.run_mode_advisor();

        if header_changed || self.view.redraws_on_poll() {
            self.request_redraw();
        }
    }

    fn clamp_selections(&mut self) {
        let recent = self.backend.cases.len().min(RECENT_CASES);
        self.dashboard.selected_index = clamp_index(self.dashboard.selected_index, recent);
        let visible = self.filtered_cases().len();
        self.cases_state.selected_index = clamp_index(self.cases_state.selected_index, visible);
        let pending = self.backend.pending_approvals().len();
        self.approvals_state.selected_index =
            clamp_index(self.approvals_state.selected_index, pending);
    }

    pub fn filtered_cases(&self) -> Vec<&Case> {
        self.backend
            .cases
            .iter()
            .filter(|case| self.cases_state.filter.matches(case))
            .collect()
    }

    // ======================================================================
    // Mode advisor
    // ======================================================================

    fn run_mode_advisor(&mut self) {
        if !self.config.advisor_enabled || self.pending_advisor.is_some() {
            return;
        }
        if self.backend.stats.error.is_some() {
            debug!("Skipping mode advisor, stats carry a backend error");
            return;
        }
        let Some(current) = self.backend.mode else {
            return;
        };
        let Some(recommendation) = advise(&self.backend.stats, current) else {
            return;
        };

        info!(
            from = %recommendation.from,
            to = %recommendation.to,
            reason = %recommendation.reason,
            "Mode advisor recommends a change"
        );

        let (tx, rx) = mpsc::channel();
        self.pending_advisor = Some(rx);
        let api = self.api.clone();
        self.runtime.spawn(async move {
            let result = api
                .set_mode(recommendation.to)
                .await
                .map_err(|err| err.to_string())
                .and_then(ack_or_rejection);
            let _ = tx.send(AdvisorOutcome {
                recommendation,
                result,
            });
        });
    }

    fn poll_advisor(&mut self) {
        let Some(rx) = self.pending_advisor.as_ref() else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(mpsc::TryRecvError::Empty) => return,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.pending_advisor = None;
                return;
            }
        };
        self.pending_advisor = None;

        let Recommendation {
            from, to, reason, ..
        } = outcome.recommendation;
        match outcome.result {
            Ok(_) => {
                info!(%from, %to, "Mode auto-adjusted");
                self.backend.mode = Some(to);
                self.activity_log.push(ModeChangeRecord {
                    old_mode: from,
                    new_mode: to,
                    at: Utc::now(),
                    automatic: true,
                });
                self.mode_notification = Some(ModeNotification {
                    from,
                    to,
                    reason,
                    expires_at: Instant::now() + self.config.notification_ttl(),
                });
            }
            Err(err) => {
                warn!(%from, %to, error = %err, "Automatic mode change failed");
                self.set_global_status_for(
                    format!("Automatic mode change to {} failed: {}", to, err),
                    true,
                    self.config.notification_ttl(),
                );
            }
        }
        self.request_redraw();
    }

    // ======================================================================
    // Mutations
    // ======================================================================

    fn dispatch_action(&mut self, action: PendingAction) {
        info!(action = action.name(), "Dispatching action");
        let api = self.api.clone();
        let tx = self.action_tx.clone();
        self.actions_in_flight += 1;

        self.runtime.spawn(async move {
            let result = match &action {
                PendingAction::CloseCase { case_id } | PendingAction::RejectCase { case_id } => {
                    api.close_case(case_id).await
                }
                PendingAction::ApproveCase { case_id, ip } => api.approve_case(case_id, ip).await,
                PendingAction::BlockIp { case_id, ip } => api.block_ip(case_id, ip).await,
                PendingAction::ReopenCase { case_id } => api.reopen_case(case_id).await,
                PendingAction::SaveNotes { case_id, notes } => {
                    api.save_notes(case_id, notes).await
                }
                PendingAction::ChangeMode { to, .. } => api.set_mode(*to).await,
            }
            .map_err(|err| err.to_string())
            .and_then(ack_or_rejection);
            let _ = tx.send(ActionOutcome { action, result });
        });
    }

    fn poll_actions(&mut self) {
        while let Ok(outcome) = self.action_rx.try_recv() {
            self.actions_in_flight = self.actions_in_flight.saturating_sub(1);
            self.finish_action(outcome.action, outcome.result);
        }
    }

    fn finish_action(&mut self, action: PendingAction, result: Result<ActionAck, String>) {
        match result {
            Ok(_) => {
                info!(action = action.name(), "Action succeeded");
                match &action {
                    PendingAction::SaveNotes { case_id, notes } => {
                        if let Some(case) =
                            self.backend.cases.iter_mut().find(|c| &c.case_id == case_id)
                        {
                            case.notes = Some(notes.clone());
                        }
                    }
                    PendingAction::ChangeMode { from, to } => {
                        let old_mode = from.or(self.backend.mode).unwrap_or(*to);
                        self.backend.mode = Some(*to);
                        self.activity_log.push(ModeChangeRecord {
                            old_mode,
                            new_mode: *to,
                            at: Utc::now(),
                            automatic: false,
                        });
                    }
                    _ => {}
                }
                if action.reloads_after_success() {
                    self.request_reload();
                }
                if let Some(message) = action.success_message() {
                    self.show_alert("Success", message, false);
                } else {
                    self.set_global_status("Done", false);
                }
            }
            Err(err) => {
                warn!(action = action.name(), error = %err, "Action failed");
                self.show_alert(
                    "Error",
                    format!("{}: {}", action.failure_prefix(), err),
                    true,
                );
            }
        }
    }

    // ======================================================================
    // Scanning
    // ======================================================================

    /// Read, hash and upload `path`. Replaces any scan in progress.
    pub fn start_scan(&mut self, path: PathBuf) {
        info!(path = %path.display(), "Starting file scan");
        let (tx, rx) = mpsc::channel();
        self.pending_scan = Some(rx);
        self.scanner.editing = false;
        self.scanner.phase = ScanPhase::Running {
            path: path.clone(),
            started: Instant::now(),
            preview: None,
        };
        self.request_redraw();

        let api = self.api.clone();
        self.runtime.spawn(async move {
            let contents = match tokio::fs::read(&path).await {
                Ok(contents) => contents,
                Err(err) => {
                    let _ = tx.send(ScanEvent::Finished(Err(format!(
                        "Could not read {}: {}",
                        path.display(),
                        err
                    ))));
                    return;
                }
            };
            let preview = FilePreview::from_bytes(&path, &contents);
            let filename = preview.filename.clone();
            let _ = tx.send(ScanEvent::Preview(preview));

            let result = api
                .scan_file(&filename, contents)
                .await
                .map_err(|err| err.to_string());
            let _ = tx.send(ScanEvent::Finished(result));
        });
    }

    /// Re-submit the last failed path. Never called automatically.
    pub fn retry_scan(&mut self) {
        if let ScanPhase::Failed { path, .. } = &self.scanner.phase {
            let path = path.clone();
            self.start_scan(path);
        }
    }

    fn poll_scan(&mut self, now: Instant) {
        loop {
            let Some(rx) = self.pending_scan.as_ref() else {
                return;
            };
            let event = match rx.try_recv() {
                Ok(event) => event,
                Err(mpsc::TryRecvError::Empty) => return,
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.pending_scan = None;
                    if let ScanPhase::Running { path, preview, .. } = &self.scanner.phase {
                        self.scanner.phase = ScanPhase::Failed {
                            path: path.clone(),
                            preview: preview.clone(),
                            error: "Scan task ended unexpectedly".to_string(),
                        };
                    }
                    return;
                }
            };

            match event {
                ScanEvent::Preview(preview) => {
                    if let ScanPhase::Running { preview: slot, .. } = &mut self.scanner.phase {
                        *slot = Some(preview);
                    }
                }
                ScanEvent::Finished(result) => {
                    self.pending_scan = None;
                    self.finish_scan(result, now);
                    return;
                }
            }
            self.request_redraw();
        }
    }

    fn finish_scan(&mut self, result: Result<ScanVerdict, String>, now: Instant) {
        let ScanPhase::Running {
            path,
            started,
            preview,
        } = std::mem::take(&mut self.scanner.phase)
        else {
            return;
        };

        match result {
            Ok(verdict) => {
                info!(
                    filename = %verdict.filename,
                    malicious = verdict.malicious,
                    case_id = verdict.case_id.as_deref().unwrap_or(""),
                    "Scan complete"
                );
                self.scanner
                    .history
                    .record(ScanHistoryEntry::from_verdict(&verdict, Utc::now()));
                self.scanner.phase = ScanPhase::Completed {
                    preview,
                    verdict,
                    mode: self.backend.mode,
                    started,
                    completed: now,
                };
                self.request_reload();
            }
            Err(error) => {
                warn!(path = %path.display(), error = %error, "Scan failed");
                self.scanner.phase = ScanPhase::Failed {
                    path,
                    preview,
                    error,
                };
            }
        }
        self.request_redraw();
    }
}

/// A 2xx acknowledgement can still carry a refusal.
fn ack_or_rejection(ack: ActionAck) -> Result<ActionAck, String> {
    match ack.rejection() {
        Some(reason) => Err(reason.to_string()),
        None => Ok(ack),
    }
}

fn clamp_index(index: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        index.min(len - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soar_protocol::{CaseStatus, RiskLevel};

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn case(id: &str, risk: RiskLevel, status: CaseStatus, time: &str) -> Case {
        Case {
            case_id: id.to_string(),
            ip: "192.0.2.10".to_string(),
            risk,
            severity: Some(60.0),
            status,
            reason: Some("Brute force".to_string()),
            time: Some(time.to_string()),
            closed_time: None,
            closure_note: None,
            approved_by: None,
            approved_time: None,
            notes: None,
        }
    }

    fn app(rt: &tokio::runtime::Runtime) -> App {
        let config = ConsoleConfig {
            advisor_enabled: false,
            ..ConsoleConfig::default()
        };
        App::new(config, rt.handle().clone())
    }

    #[test]
    fn test_starts_on_dashboard_with_loading_mode() {
        let rt = runtime();
        let app = app(&rt);
        assert_eq!(app.view, View::Dashboard);
        assert!(app.backend.mode.is_none());
        assert!(app.running);
    }

    #[test]
    fn test_number_keys_navigate() {
        let rt = runtime();
        let mut app = app(&rt);
        app.handle_key(key(KeyCode::Char('4')));
        assert_eq!(app.view, View::Control);
        app.handle_key(key(KeyCode::Char('6')));
        assert_eq!(app.view, View::Logs);
        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn test_text_input_swallows_global_keys() {
        let rt = runtime();
        let mut app = app(&rt);
        app.navigate(View::Scanner);
        app.handle_key(key(KeyCode::Enter));
        assert!(app.scanner.editing);
        for c in "q1/tmp".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        assert!(app.running);
        assert_eq!(app.view, View::Scanner);
        assert_eq!(app.scanner.path_input, "q1/tmp");
    }

    #[test]
    fn test_cases_sorted_newest_first() {
        let mut cases = vec![
            case("old", RiskLevel::Low, CaseStatus::Open, "2024-01-01T00:00:00"),
            case("none", RiskLevel::Low, CaseStatus::Open, "garbage"),
            case("new", RiskLevel::Low, CaseStatus::Open, "2024-03-01T00:00:00"),
        ];
        sort_cases_newest_first(&mut cases);
        let ids: Vec<_> = cases.iter().map(|c| c.case_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "none"]);
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let rt = runtime();
        let mut app = app(&rt);
        let first = app.refresh.issue();
        let second = app.refresh.issue();

        app.load_tx
            .send(LoadOutcome {
                generation: second,
                result: Ok(Snapshot {
                    stats: Stats { active_cases: 2, ..Stats::default() },
                    cases: vec![],
                    mode: Mode::Semi,
                }),
            })
            .unwrap();
        app.load_tx
            .send(LoadOutcome {
                generation: first,
                result: Ok(Snapshot {
                    stats: Stats { active_cases: 99, ..Stats::default() },
                    cases: vec![],
                    mode: Mode::Auto,
                }),
            })
            .unwrap();
        app.poll_loads();

        assert_eq!(app.backend.stats.active_cases, 2);
        assert_eq!(app.backend.mode, Some(Mode::Semi));
    }

    #[test]
    fn test_failed_load_keeps_previous_state() {
        let rt = runtime();
        let mut app = app(&rt);
        app.apply_snapshot(Snapshot {
            stats: Stats { active_cases: 4, ..Stats::default() },
            cases: vec![case("a", RiskLevel::High, CaseStatus::Open, "2024-01-01T00:00:00")],
            mode: Mode::Manual,
        });
        let generation = app.refresh.issue();
        app.load_tx
            .send(LoadOutcome {
                generation,
                result: Err("fetch stats: network error".to_string()),
            })
            .unwrap();
        app.poll_loads();

        assert_eq!(app.backend.stats.active_cases, 4);
        assert_eq!(app.backend.cases.len(), 1);
        assert!(app.backend.last_error.is_some());
    }

    #[test]
    fn test_poll_redraw_only_for_live_views() {
        let rt = runtime();
        let mut app = app(&rt);
        let snapshot = Snapshot {
            stats: Stats::default(),
            cases: vec![],
            mode: Mode::Manual,
        };
        app.apply_snapshot(snapshot.clone());
        app.take_redraw();

        app.view = View::Scanner;
        app.apply_snapshot(snapshot.clone());
        assert!(!app.take_redraw());

        app.view = View::Control;
        app.apply_snapshot(snapshot.clone());
        assert!(!app.take_redraw());

        app.view = View::Logs;
        app.apply_snapshot(snapshot);
        assert!(app.take_redraw());
    }

    #[test]
    fn test_confirm_cancel_dispatches_nothing() {
        let rt = runtime();
        let mut app = app(&rt);
        app.confirm(PendingAction::CloseCase {
            case_id: "abc".to_string(),
        });
        app.handle_key(key(KeyCode::Char('x')));
        assert!(matches!(app.modal, Some(Modal::Confirm(_))));
        app.handle_key(key(KeyCode::Esc));
        assert!(app.modal.is_none());
        assert_eq!(app.actions_in_flight(), 0);
    }

    #[test]
    fn test_failed_action_raises_blocking_alert() {
        let rt = runtime();
        let mut app = app(&rt);
        app.finish_action(
            PendingAction::BlockIp {
                case_id: "abc".to_string(),
                ip: "192.0.2.10".to_string(),
            },
            Err("block IP: HTTP 500: boom".to_string()),
        );
        match &app.modal {
            Some(Modal::Alert { message, is_error, .. }) => {
                assert!(is_error);
                assert_eq!(message, "Failed to block IP: block IP: HTTP 500: boom");
            }
            other => panic!("expected alert, got {:?}", other),
        }
        // Alert blocks navigation until dismissed
        app.handle_key(key(KeyCode::Char('2')));
        assert_eq!(app.view, View::Dashboard);
        app.handle_key(key(KeyCode::Enter));
        assert!(app.modal.is_none());
    }

    #[test]
    fn test_saved_notes_patch_local_case() {
        let rt = runtime();
        let mut app = app(&rt);
        app.backend.cases = vec![case(
            "abc",
            RiskLevel::High,
            CaseStatus::Open,
            "2024-01-01T00:00:00",
        )];
        app.finish_action(
            PendingAction::SaveNotes {
                case_id: "abc".to_string(),
                notes: "contained".to_string(),
            },
            Ok(ActionAck::default()),
        );
        assert_eq!(app.backend.cases[0].notes.as_deref(), Some("contained"));
        assert!(!app.refresh.in_flight(), "notes must not trigger a reload");
    }

    #[test]
    fn test_manual_mode_change_is_logged() {
        let rt = runtime();
        let mut app = app(&rt);
        app.backend.mode = Some(Mode::Manual);
        app.finish_action(
            PendingAction::ChangeMode {
                from: Some(Mode::Manual),
                to: Mode::Auto,
            },
            Ok(ActionAck::default()),
        );
        assert_eq!(app.backend.mode, Some(Mode::Auto));
        assert_eq!(app.activity_log.len(), 1);
        assert!(!app.activity_log[0].automatic);
        assert!(matches!(
            app.modal,
            Some(Modal::Alert { is_error: false, .. })
        ));
    }

    #[test]
    fn test_ack_rejection_is_failure() {
        let ack = ActionAck {
            error: Some("Invalid mode".to_string()),
            ..ActionAck::default()
        };
        assert_eq!(ack_or_rejection(ack), Err("Invalid mode".to_string()));
    }

    #[test]
    fn test_result_revealed_after_delay() {
        let now = Instant::now();
        let phase = ScanPhase::Completed {
            preview: None,
            verdict: ScanVerdict {
                filename: "a".to_string(),
                sha256: "b".to_string(),
                malicious: false,
                case_id: None,
            },
            mode: None,
            started: now,
            completed: now,
        };
        assert!(!phase.result_visible(now));
        assert!(phase.result_visible(now + RESULT_REVEAL_DELAY));
    }

    fn semi_verdict(case_id: Option<&str>) -> ScanPhase {
        let long_ago = Instant::now() - Duration::from_secs(5);
        ScanPhase::Completed {
            preview: None,
            verdict: ScanVerdict {
                filename: "dropper.exe".to_string(),
                sha256: "c".repeat(64),
                malicious: true,
                case_id: case_id.map(str::to_string),
            },
            mode: Some(Mode::Semi),
            started: long_ago,
            completed: long_ago,
        }
    }

    #[test]
    fn test_approvals_shortcut_needs_a_case() {
        let rt = runtime();
        let mut app = app(&rt);
        app.navigate(View::Scanner);

        app.scanner.phase = semi_verdict(None);
        assert!(!app.scanner.phase.queued_for_approval());
        app.handle_key(key(KeyCode::Char('a')));
        assert_eq!(app.view, View::Scanner);

        app.scanner.phase = semi_verdict(Some("deadbeef-0001"));
        assert!(app.scanner.phase.queued_for_approval());
        app.handle_key(key(KeyCode::Char('a')));
        assert_eq!(app.view, View::Approvals);
    }

    #[test]
    fn test_store_error_pauses_advisor() {
        let rt = runtime();
        let config = ConsoleConfig {
            advisor_enabled: true,
            ..ConsoleConfig::default()
        };
        let mut app = App::new(config, rt.handle().clone());

        app.apply_snapshot(Snapshot {
            stats: Stats {
                error: Some("Connection refused: opensearch".to_string()),
                ..Stats::default()
            },
            cases: Vec::new(),
            mode: Mode::Auto,
        });

        assert!(!app.advisor_in_flight());
        assert_eq!(app.backend.mode, Some(Mode::Auto));
        let status = app.global_status.as_ref().unwrap();
        assert!(status.is_error);
        assert!(status.message.contains("opensearch"));
    }
}
