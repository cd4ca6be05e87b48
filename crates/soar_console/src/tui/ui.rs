//! Rendering. Pure functions of `&App`; nothing here mutates state.

use chrono::{DateTime, Local, Utc};
use ratatui::{
    prelude::*,
    widgets::{
        BarChart, Block, Borders, Cell, Clear, Gauge, List, ListItem, Paragraph, Row, Table,
        TableState, Tabs, Wrap,
    },
};
use std::time::Instant;

use soar_policy::{
    activity_feed, score_case, severity_counts, threat_timeline, threat_type_counts,
    ConfidenceLevel,
};
use soar_protocol::time::DISPLAY_FORMAT;
use soar_protocol::{format_timestamp, short_id, truncate_hash, Case, Mode, RiskLevel};

use super::app::{App, Modal, ScanPhase, View, RECENT_CASES};
use super::components::action_bar::{
    format_help_lines, render_action_bar, render_action_bar_message, ActionHint,
};
use super::components::modal::{centered_area, render_modal, top_right_area};
use super::nav::NAV_ITEMS;
use super::scan::{cosmetic_stage, stage_log, FilePreview, COMPLETE_STAGE};

pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(1), // Nav tabs
            Constraint::Min(0),    // View
            Constraint::Length(2), // Footer
        ])
        .split(area);

    draw_header(frame, app, chunks[0]);
    draw_tabs(frame, app, chunks[1]);

    match app.view {
        View::Dashboard => draw_dashboard(frame, app, chunks[2]),
        View::Cases => draw_cases(frame, app, chunks[2]),
        View::Scanner => draw_scanner(frame, app, chunks[2]),
        View::Control => draw_control(frame, app, chunks[2]),
        View::Approvals => draw_approvals(frame, app, chunks[2]),
        View::Logs => draw_logs(frame, app, chunks[2]),
    }

    draw_footer(frame, app, chunks[3]);

    if app.case_detail.is_some() {
        draw_case_detail(frame, app, chunks[2]);
    }
    if app.mode_notification.is_some() {
        draw_mode_notification(frame, app, chunks[2]);
    }
    if let Some(modal) = &app.modal {
        draw_modal(frame, modal, area);
    }
    if app.show_help {
        draw_help_overlay(frame, app, area);
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn risk_color(risk: RiskLevel) -> Color {
    match risk {
        RiskLevel::Low => Color::Green,
        RiskLevel::Medium => Color::Yellow,
        RiskLevel::High => Color::LightRed,
        RiskLevel::Critical => Color::Red,
        RiskLevel::Unknown => Color::Gray,
    }
}

fn mode_color(mode: Mode) -> Color {
    match mode {
        Mode::Auto => Color::Green,
        Mode::Semi => Color::Yellow,
        Mode::Manual => Color::Cyan,
    }
}

fn confidence_color(level: ConfidenceLevel) -> Color {
    match level {
        ConfidenceLevel::High => Color::Red,
        ConfidenceLevel::Medium => Color::Yellow,
        ConfidenceLevel::Low => Color::Green,
    }
}

fn format_utc(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(DISPLAY_FORMAT).to_string()
}

fn titled_block(title: &str) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title))
        .title_style(Style::default().fg(Color::Cyan).bold())
        .borders(Borders::ALL)
}

fn header_row(cells: &[&'static str]) -> Row<'static> {
    Row::new(cells.iter().map(|h| Cell::from(*h)))
        .style(Style::default().fg(Color::Cyan).bold())
        .bottom_margin(0)
}

fn label_value(label: &str, value: impl Into<String>, value_style: Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<20}", label), Style::default().fg(Color::DarkGray)),
        Span::styled(value.into(), value_style),
    ])
}

// ============================================================================
// Header, tabs, footer
// ============================================================================

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::BOTTOM);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(0)])
        .split(inner);

    let title = Paragraph::new(" SOAR Console ").style(Style::default().fg(Color::Cyan).bold());
    frame.render_widget(title, cols[0]);

    let mut spans = match app.backend.mode {
        Some(mode) => vec![
            Span::styled(
                format!("● {}", mode.as_str()),
                Style::default().fg(mode_color(mode)).bold(),
            ),
            Span::raw("  "),
            Span::styled(mode.indicator_description(), Style::default().fg(Color::Gray)),
        ],
        None => vec![Span::styled("○ LOADING", Style::default().fg(Color::DarkGray))],
    };

    if app.backend.last_error.is_some() {
        spans.push(Span::styled(
            "  ⚠ backend unreachable, showing last data",
            Style::default().fg(Color::Red),
        ));
    } else if app.backend.stats.error.is_some() {
        spans.push(Span::styled(
            "  ⚠ backend store error",
            Style::default().fg(Color::Red),
        ));
    } else if let Some(at) = app.backend.last_refresh {
        spans.push(Span::styled(
            format!("  updated {}", at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Right),
        cols[1],
    );
}

fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = NAV_ITEMS
        .iter()
        .map(|item| Line::from(format!("[{}] {}", item.key, item.label)))
        .collect();
    let selected = NAV_ITEMS
        .iter()
        .position(|item| item.view == app.view)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::Cyan).bold().underlined());
    frame.render_widget(tabs, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(status) = &app.global_status {
        let style = if status.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };
        render_action_bar_message(frame, area, &status.message, style);
        return;
    }
    render_action_bar(frame, area, &view_hints(app));
}

/// Footer hints for whatever currently has input focus.
pub fn view_hints(app: &App) -> Vec<ActionHint> {
    if let Some(detail) = &app.case_detail {
        if detail.editing_notes {
            return vec![
                ActionHint::new("Enter", "Save", 9),
                ActionHint::new("Esc", "Cancel", 8),
            ];
        }
        let open = app
            .backend
            .find_case(&detail.case_id)
            .map(Case::is_open)
            .unwrap_or(false);
        return vec![
            ActionHint::new("e", "Edit notes", 8),
            if open {
                ActionHint::new("c", "Close", 7)
            } else {
                ActionHint::new("o", "Re-open", 7)
            },
            if open {
                ActionHint::new("b", "Block IP", 6)
            } else {
                ActionHint::disabled("b", "Block IP", 2)
            },
            ActionHint::new("Esc", "Back", 9),
        ];
    }

    let mut hints = match app.view {
        View::Dashboard => vec![
            ActionHint::new("↑↓", "Select", 5),
            ActionHint::new("Enter", "Case details", 7),
        ],
        View::Cases => vec![
            ActionHint::new("↑↓", "Select", 5),
            ActionHint::new("Enter", "Details", 8),
            ActionHint::new("f", format!("Filter: {}", app.cases_state.filter.label()), 6),
            ActionHint::new("c", "Close", 7),
            ActionHint::new("b", "Block IP", 7),
            ActionHint::new("o", "Re-open", 6),
        ],
        View::Scanner if app.scanner.editing => {
            return vec![
                ActionHint::new("Enter", "Scan file", 9),
                ActionHint::new("Esc", "Stop editing", 8),
            ];
        }
        View::Scanner => match &app.scanner.phase {
            ScanPhase::Idle => vec![ActionHint::new("Enter", "Choose file", 9)],
            ScanPhase::Running { .. } => vec![ActionHint::disabled("…", "Scanning", 9)],
            ScanPhase::Completed { verdict, .. } => {
                let mut hints = vec![ActionHint::new("n", "Scan Another File", 9)];
                if app.scanner.phase.queued_for_approval() {
                    hints.push(ActionHint::new("a", "Go to Approvals", 8));
                }
                if verdict.malicious {
                    hints.push(ActionHint::new("v", "View Cases", 7));
                }
                hints
            }
            ScanPhase::Failed { .. } => vec![
                ActionHint::new("t", "Try Again", 9),
                ActionHint::new("n", "New file", 8),
            ],
        },
        View::Control => vec![
            ActionHint::new("←→", "Select mode", 6),
            ActionHint::new("Enter", "Switch", 9),
            ActionHint::new("a/s/m", "Auto/Semi/Manual", 5),
        ],
        View::Approvals if app.backend.mode == Some(Mode::Semi) => vec![
            ActionHint::new("↑↓", "Select", 5),
            ActionHint::new("a", "Approve", 9),
            ActionHint::new("x", "Reject", 8),
            ActionHint::new("Enter", "Details", 7),
        ],
        View::Approvals => vec![ActionHint::new("c", "Open Control", 9)],
        View::Logs => vec![
            ActionHint::new("↑↓", "Scroll", 6),
            ActionHint::new("g", "Top", 4),
        ],
    };

    hints.extend([
        ActionHint::new("1-6", "Views", 3),
        ActionHint::new("r", "Refresh", 2),
        ActionHint::new("?", "Help", 1),
        ActionHint::new("q", "Quit", 4),
    ]);
    hints
}

// ============================================================================
// Dashboard
// ============================================================================

fn draw_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(RECENT_CASES as u16 + 3),
        ])
        .split(area);

    draw_stat_cards(frame, app, rows[0]);
    draw_charts(frame, app, rows[1]);
    draw_recent_cases(frame, app, rows[2]);
}

fn draw_stat_cards(frame: &mut Frame, app: &App, area: Rect) {
    let stats = &app.backend.stats;
    let critical_badge = if stats.critical_threats > 0 {
        ("Alert", Color::Red)
    } else {
        ("Clear", Color::Green)
    };
    let cards = [
        ("Active Cases", stats.active_cases, ("Live", Color::Cyan)),
        ("Critical Threats", stats.critical_threats, critical_badge),
        ("Malware Detections", stats.malware_count, ("24h", Color::Yellow)),
        ("Blocked IPs", stats.blocked_ips, ("Total", Color::Magenta)),
    ];

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for ((title, value, (badge, badge_color)), col) in cards.into_iter().zip(cols.iter()) {
        let block = Block::default()
            .title(format!(" {} ", title))
            .title_style(Style::default().fg(Color::Gray))
            .borders(Borders::ALL);
        let text = Line::from(vec![
            Span::styled(value.to_string(), Style::default().fg(Color::White).bold()),
            Span::raw("  "),
            Span::styled(badge, Style::default().fg(badge_color)),
        ]);
        frame.render_widget(Paragraph::new(text).block(block), *col);
    }
}

fn draw_charts(frame: &mut Frame, app: &App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Percentage(30),
            Constraint::Percentage(25),
        ])
        .split(area);

    let cases = &app.backend.cases;

    let timeline = threat_timeline(cases, Local::now().date_naive(), &Local);
    let timeline_data: Vec<(&str, u64)> = timeline
        .iter()
        .map(|bucket| (bucket.label.as_str(), bucket.count))
        .collect();
    let chart = BarChart::default()
        .block(titled_block("Threat Timeline (7 days)"))
        .bar_width(6)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .data(timeline_data.as_slice());
    frame.render_widget(chart, cols[0]);

    let severity = severity_counts(cases);
    let severity_data: Vec<(&str, u64)> = severity
        .as_pairs()
        .iter()
        .map(|(risk, count)| (risk.as_str(), *count))
        .collect();
    let chart = BarChart::default()
        .block(titled_block("Severity"))
        .bar_width(8)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Yellow))
        .value_style(Style::default().fg(Color::Black).bg(Color::Yellow))
        .data(severity_data.as_slice());
    frame.render_widget(chart, cols[1]);

    let kinds = threat_type_counts(cases);
    let kind_data: Vec<(&str, u64)> = kinds
        .as_pairs()
        .iter()
        .map(|(kind, count)| (kind.label(), *count))
        .collect();
    let chart = BarChart::default()
        .block(titled_block("Threat Types"))
        .bar_width(10)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Magenta))
        .value_style(Style::default().fg(Color::Black).bg(Color::Magenta))
        .data(kind_data.as_slice());
    frame.render_widget(chart, cols[2]);
}

fn draw_recent_cases(frame: &mut Frame, app: &App, area: Rect) {
    let recent: Vec<&Case> = app.backend.cases.iter().take(RECENT_CASES).collect();
    if recent.is_empty() {
        let text = if app.backend.mode.is_none() {
            "Loading..."
        } else {
            "No cases yet"
        };
        frame.render_widget(
            Paragraph::new(text)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(titled_block("Recent Cases")),
            area,
        );
        return;
    }
    draw_case_table(frame, &recent, Some(app.dashboard.selected_index), "Recent Cases", area);
}

fn case_row(case: &Case) -> Row<'static> {
    Row::new(vec![
        Cell::from(short_id(&case.case_id).to_string()),
        Cell::from(case.ip.clone()),
        Cell::from(case.risk.as_str()).style(Style::default().fg(risk_color(case.risk))),
        Cell::from(case.status.as_str()).style(if case.is_open() {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        }),
        Cell::from(truncate(case.reason_text(), 40)),
        Cell::from(format_timestamp(case.time.as_deref())),
    ])
}

fn draw_case_table(
    frame: &mut Frame,
    cases: &[&Case],
    selected: Option<usize>,
    title: &str,
    area: Rect,
) {
    let rows: Vec<Row> = cases.iter().map(|case| case_row(case)).collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Min(20),
            Constraint::Length(20),
        ],
    )
    .header(header_row(&["ID", "IP", "Risk", "Status", "Reason", "Created"]))
    .block(titled_block(title))
    .row_highlight_style(Style::default().bg(Color::DarkGray).bold())
    .highlight_symbol("▸ ");

    let mut state = TableState::default().with_selected(selected);
    frame.render_stateful_widget(table, area, &mut state);
}

// ============================================================================
// Cases
// ============================================================================

fn draw_cases(frame: &mut Frame, app: &App, area: Rect) {
    let cases = app.filtered_cases();
    let title = format!(
        "Cases ({}) - filter: {}",
        cases.len(),
        app.cases_state.filter.label()
    );
    if cases.is_empty() {
        frame.render_widget(
            Paragraph::new("No cases match the current filter")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(titled_block(&title)),
            area,
        );
        return;
    }
    draw_case_table(frame, &cases, Some(app.cases_state.selected_index), &title, area);
}

fn draw_case_detail(frame: &mut Frame, app: &App, area: Rect) {
    let Some(detail) = &app.case_detail else {
        return;
    };
    let layout = render_modal(
        frame,
        area,
        76,
        24,
        if detail.editing_notes { 4 } else { 0 },
        &format!("Case {}", short_id(&detail.case_id)),
        Style::default().fg(Color::Cyan),
    );

    let Some(case) = app.backend.find_case(&detail.case_id) else {
        frame.render_widget(
            Paragraph::new("Case no longer available").style(Style::default().fg(Color::Red)),
            layout.body,
        );
        return;
    };

    let confidence = score_case(case);
    let mut lines = vec![
        label_value("Case ID", case.case_id.clone(), Style::default()),
        label_value("IP Address", case.ip.clone(), Style::default().bold()),
        label_value(
            "Risk",
            case.risk.as_str(),
            Style::default().fg(risk_color(case.risk)).bold(),
        ),
        label_value(
            "Severity",
            case.severity
                .map(|s| format!("{:.1}", s))
                .unwrap_or_else(|| "N/A".to_string()),
            Style::default(),
        ),
        label_value("Status", case.status.as_str(), Style::default()),
        label_value("Reason", case.reason_text().to_string(), Style::default()),
        label_value(
            "Confidence",
            format!("{} ({}%)", confidence.level, confidence.score),
            Style::default().fg(confidence_color(confidence.level)).bold(),
        ),
        Line::from(Span::styled(
            format!("  {}", confidence.explanation),
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        Line::from(Span::styled("Timeline", Style::default().fg(Color::Cyan).bold())),
        label_value("Created", format_timestamp(case.time.as_deref()), Style::default()),
    ];
    if let (Some(by), Some(_)) = (&case.approved_by, case.approved_at()) {
        lines.push(label_value(
            "Approved",
            format!("{} by {}", format_timestamp(case.approved_time.as_deref()), by),
            Style::default().fg(Color::Green),
        ));
    }
    if case.closed_at().is_some() {
        lines.push(label_value(
            "Closed",
            format_timestamp(case.closed_time.as_deref()),
            Style::default(),
        ));
        if let Some(note) = &case.closure_note {
            lines.push(label_value("Closure note", note.clone(), Style::default()));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Analyst Notes",
        Style::default().fg(Color::Cyan).bold(),
    )));
    if !detail.editing_notes {
        match case.notes.as_deref().filter(|n| !n.is_empty()) {
            Some(notes) => lines.push(Line::from(notes.to_string())),
            None => lines.push(Line::from(Span::styled(
                "No notes",
                Style::default().fg(Color::DarkGray),
            ))),
        }
    }

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((detail.scroll, 0)),
        layout.body,
    );

    if detail.editing_notes {
        let editor = Paragraph::new(format!("{}▏", detail.notes_input))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Notes "),
            );
        frame.render_widget(editor, layout.footer);
    }
}

// ============================================================================
// Scanner
// ============================================================================

fn draw_scanner(frame: &mut Frame, app: &App, area: Rect) {
    let history_height = (app.scanner.history.len() as u16).max(1) + 3;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(history_height)])
        .split(area);

    let now = Instant::now();
    let revealed = app.scanner.phase.result_visible(now);
    match &app.scanner.phase {
        ScanPhase::Idle => draw_scan_prompt(frame, app, rows[0]),
        ScanPhase::Running {
            started, preview, ..
        } => {
            let elapsed = now.saturating_duration_since(*started);
            draw_scan_progress(frame, preview.as_ref(), elapsed, false, rows[0]);
        }
        ScanPhase::Completed {
            preview, started, ..
        } if !revealed => {
            let elapsed = now.saturating_duration_since(*started);
            draw_scan_progress(frame, preview.as_ref(), elapsed, true, rows[0]);
        }
        ScanPhase::Completed {
            preview,
            verdict,
            mode,
            ..
        } => draw_scan_result(frame, preview.as_ref(), verdict, *mode, rows[0]),
        ScanPhase::Failed { error, path, .. } => {
            let lines = vec![
                Line::from(Span::styled("✗ Scan Failed", Style::default().fg(Color::Red).bold())),
                Line::from(""),
                label_value("File", path.display().to_string(), Style::default()),
                Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
                Line::from(""),
                Line::from("Press [t] to Try Again or [n] to choose another file."),
            ];
            frame.render_widget(
                Paragraph::new(lines)
                    .wrap(Wrap { trim: true })
                    .block(titled_block("Malware Scanner")),
                rows[0],
            );
        }
    }

    draw_scan_history(frame, app, rows[1]);
}

fn draw_scan_prompt(frame: &mut Frame, app: &App, area: Rect) {
    let input_style = if app.scanner.editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Gray)
    };
    let cursor = if app.scanner.editing { "▏" } else { "" };
    let lines = vec![
        Line::from("Submit a file for malware analysis against VirusTotal."),
        Line::from(""),
        Line::from(vec![
            Span::styled("Path: ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{}{}", app.scanner.path_input, cursor), input_style),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            if app.scanner.editing {
                "Type a path and press Enter to upload."
            } else {
                "Press Enter to choose a file."
            },
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(titled_block("Malware Scanner")),
        area,
    );
}

fn preview_lines(preview: Option<&FilePreview>) -> Vec<Line<'static>> {
    match preview {
        Some(preview) => vec![
            label_value("File", preview.filename.clone(), Style::default().bold()),
            label_value("Size", preview.size_label.clone(), Style::default()),
            label_value("SHA256", truncate_hash(&preview.sha256), Style::default()),
        ],
        None => vec![Line::from(Span::styled(
            "Reading file...",
            Style::default().fg(Color::DarkGray),
        ))],
    }
}

fn draw_scan_progress(
    frame: &mut Frame,
    preview: Option<&FilePreview>,
    elapsed: std::time::Duration,
    complete: bool,
    area: Rect,
) {
    let block = titled_block("Scanning");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    frame.render_widget(Paragraph::new(preview_lines(preview)), rows[0]);

    let stage = if complete {
        COMPLETE_STAGE
    } else {
        cosmetic_stage(elapsed)
    };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .percent(stage.percent)
        .label(format!("{}% {}", stage.percent, stage.label));
    frame.render_widget(gauge, rows[1]);

    let items: Vec<ListItem> = stage_log(elapsed, complete)
        .into_iter()
        .map(|line| ListItem::new(format!("› {}", line)))
        .collect();
    frame.render_widget(
        List::new(items).style(Style::default().fg(Color::Gray)),
        rows[2],
    );
}

fn draw_scan_result(
    frame: &mut Frame,
    preview: Option<&FilePreview>,
    verdict: &soar_protocol::ScanVerdict,
    mode: Option<Mode>,
    area: Rect,
) {
    let (border, verdict_line) = if verdict.malicious {
        (
            Color::Red,
            Line::from(Span::styled(
                "⚠ MALICIOUS - Threat Detected",
                Style::default().fg(Color::Red).bold(),
            )),
        )
    } else {
        (
            Color::Green,
            Line::from(Span::styled(
                "✓ CLEAN - File is Clean",
                Style::default().fg(Color::Green).bold(),
            )),
        )
    };

    let size = preview
        .map(|p| p.size_label.clone())
        .unwrap_or_else(|| "N/A".to_string());
    let mut lines = vec![
        verdict_line,
        Line::from(""),
        label_value("File", verdict.filename.clone(), Style::default().bold()),
        label_value("Size", size, Style::default()),
        label_value("SHA256", verdict.sha256.clone(), Style::default()),
    ];

    if verdict.malicious {
        lines.push(label_value(
            "Risk Level",
            "CRITICAL",
            Style::default().fg(Color::Red).bold(),
        ));
        lines.push(label_value(
            "Recommended Action",
            "Quarantine & Investigate",
            Style::default(),
        ));
        if let Some(case_id) = &verdict.case_id {
            lines.push(label_value(
                "Case",
                short_id(case_id).to_string(),
                Style::default().fg(Color::Cyan),
            ));
            lines.push(Line::from(""));
            lines.extend(remediation_guidance(mode, Some(case_id)));
        }
    } else {
        lines.push(label_value(
            "Risk Level",
            "LOW",
            Style::default().fg(Color::Green).bold(),
        ));
        lines.push(label_value("Recommended Action", "None Required", Style::default()));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[n] Scan Another File",
        Style::default().fg(Color::Cyan),
    )));

    let block = Block::default()
        .title(" Scan Result ")
        .title_style(Style::default().fg(border).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(block),
        area,
    );
}

/// What happens next for a malicious file, depending on the mode in force.
pub fn remediation_guidance(mode: Option<Mode>, case_id: Option<&str>) -> Vec<Line<'static>> {
    let case = case_id.map(short_id).unwrap_or("N/A").to_string();
    let heading = |text: &'static str, color: Color| {
        Line::from(Span::styled(text, Style::default().fg(color).bold()))
    };
    match mode {
        Some(Mode::Auto) => vec![
            heading("Automatic Remediation", Color::Green),
            Line::from(format!("Case Created: {}", case)),
            Line::from("Auto-response Initiated"),
        ],
        Some(Mode::Semi) => vec![
            heading("Approval Required", Color::Yellow),
            Line::from("Case has been created and queued for analyst approval before remediation."),
            label_value("Status", "Pending Approval", Style::default().fg(Color::Yellow)),
            Line::from(Span::styled(
                "[a] Go to Approvals",
                Style::default().fg(Color::Cyan),
            )),
        ],
        Some(Mode::Manual) | None => vec![
            heading("Manual Mode - Alert Only", Color::Cyan),
            Line::from(format!(
                "Case {} was created. No automatic action will be taken.",
                case
            )),
            Line::from(Span::styled("[v] View Cases", Style::default().fg(Color::Cyan))),
        ],
    }
}

fn draw_scan_history(frame: &mut Frame, app: &App, area: Rect) {
    let history = &app.scanner.history;
    if history.is_empty() {
        frame.render_widget(
            Paragraph::new("No scans yet")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(titled_block("Scan History")),
            area,
        );
        return;
    }

    let rows: Vec<Row> = history
        .iter()
        .map(|entry| {
            let (verdict, color) = if entry.malicious {
                ("MALICIOUS", Color::Red)
            } else {
                ("CLEAN", Color::Green)
            };
            Row::new(vec![
                Cell::from(truncate(&entry.filename, 40)),
                Cell::from(verdict).style(Style::default().fg(color).bold()),
                Cell::from(format_utc(&entry.timestamp)),
                Cell::from(
                    entry
                        .case_id
                        .as_deref()
                        .map(|id| short_id(id).to_string())
                        .unwrap_or_else(|| "N/A".to_string()),
                ),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(20),
            Constraint::Length(10),
        ],
    )
    .header(header_row(&["Filename", "Verdict", "Timestamp", "Case ID"]))
    .block(titled_block(&format!("Scan History ({})", history.len())));
    frame.render_widget(table, area);
}

// ============================================================================
// Control
// ============================================================================

fn draw_control(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(8)])
        .split(area);

    let advisor = if app.config.advisor_enabled {
        "enabled"
    } else {
        "disabled"
    };
    let banners = vec![
        Line::from(vec![
            Span::styled("Auto-Close Rules: ", Style::default().fg(Color::Cyan).bold()),
            Span::raw("LOW-risk cases automatically close after 24 hours if no escalation occurs"),
        ]),
        Line::from(vec![
            Span::styled("Auto-Unblock Timer: ", Style::default().fg(Color::Cyan).bold()),
            Span::raw(
                "Blocked IPs are automatically unblocked after 72 hours unless manually extended",
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "Backend {}  |  refresh every {}s  |  mode advisor {}",
                app.config.base_url,
                app.config.refresh_interval().as_secs(),
                advisor
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(
        Paragraph::new(banners)
            .wrap(Wrap { trim: true })
            .block(titled_block("SOAR Control Panel")),
        rows[0],
    );

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(rows[1]);

    for (index, (mode, col)) in Mode::ALL.iter().zip(cols.iter()).enumerate() {
        let active = app.backend.mode == Some(*mode);
        let selected = app.control_state.selected_index == index;
        let border = if selected {
            Style::default().fg(Color::Cyan).bold()
        } else if active {
            Style::default().fg(mode_color(*mode))
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let mut lines = vec![Line::from(Span::styled(
            mode.title(),
            Style::default().fg(mode_color(*mode)).bold(),
        ))];
        if active {
            lines.push(Line::from(Span::styled(
                "ACTIVE",
                Style::default().fg(Color::Black).bg(mode_color(*mode)).bold(),
            )));
        } else {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(mode.description()));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            mode.tooltip(),
            Style::default().fg(Color::DarkGray),
        )));

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(format!(" {} ", mode.as_str()));
        frame.render_widget(
            Paragraph::new(lines).wrap(Wrap { trim: true }).block(block),
            *col,
        );
    }
}

// ============================================================================
// Approvals
// ============================================================================

fn draw_approvals(frame: &mut Frame, app: &App, area: Rect) {
    if app.backend.mode != Some(Mode::Semi) {
        let current = app
            .backend
            .mode
            .map(|m| m.title())
            .unwrap_or("LOADING");
        let lines = vec![
            Line::from(Span::styled(
                "Approval Queue Not Active",
                Style::default().fg(Color::Yellow).bold(),
            )),
            Line::from(""),
            Line::from("Remediation approvals are only used in SEMI-AUTOMATIC mode."),
            Line::from(format!("Current mode: {}", current)),
            Line::from(""),
            Line::from(Span::styled(
                "[c] Open Control Panel",
                Style::default().fg(Color::Cyan),
            )),
        ];
        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .block(titled_block("Pending Approvals")),
            area,
        );
        return;
    }

    let pending = app.backend.pending_approvals();
    if pending.is_empty() {
        frame.render_widget(
            Paragraph::new("No cases awaiting approval")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(titled_block("Pending Approvals")),
            area,
        );
        return;
    }

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let rows: Vec<Row> = pending
        .iter()
        .map(|case| {
            let confidence = score_case(case);
            Row::new(vec![
                Cell::from(short_id(&case.case_id).to_string()),
                Cell::from(case.ip.clone()),
                Cell::from(truncate(case.reason_text(), 30)),
                Cell::from(format!("{} {}%", confidence.level, confidence.score))
                    .style(Style::default().fg(confidence_color(confidence.level))),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Min(12),
            Constraint::Length(12),
        ],
    )
    .header(header_row(&["Case", "IP", "Reason", "Confidence"]))
    .block(titled_block(&format!("Pending Approvals ({})", pending.len())))
    .row_highlight_style(Style::default().bg(Color::DarkGray).bold())
    .highlight_symbol("▸ ");
    let mut state = TableState::default().with_selected(Some(app.approvals_state.selected_index));
    frame.render_stateful_widget(table, cols[0], &mut state);

    if let Some(case) = pending.get(app.approvals_state.selected_index) {
        let confidence = score_case(case);
        let mut lines = vec![
            label_value("IP", case.ip.clone(), Style::default().bold()),
            label_value(
                "Severity",
                case.severity
                    .map(|s| format!("{:.1}", s))
                    .unwrap_or_else(|| "N/A".to_string()),
                Style::default(),
            ),
            label_value("Created", format_timestamp(case.time.as_deref()), Style::default()),
            label_value(
                "Proposed Action",
                "Block IP & Close Case",
                Style::default().fg(Color::Yellow),
            ),
            Line::from(""),
            Line::from(Span::styled(
                format!("{} confidence ({}%)", confidence.level, confidence.score),
                Style::default().fg(confidence_color(confidence.level)).bold(),
            )),
            Line::from(confidence.explanation.clone()),
        ];
        for indicator in &confidence.indicators {
            lines.push(Line::from(format!("  • {}", indicator)));
        }
        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .block(titled_block("Remediation")),
            cols[1],
        );
    }
}

// ============================================================================
// Logs
// ============================================================================

fn draw_logs(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Activity Logs ")
        .title_style(Style::default().fg(Color::Cyan).bold())
        .title_bottom(Line::from(" Complete audit trail of SOAR actions ").right_aligned())
        .borders(Borders::ALL);

    let feed = activity_feed(&app.backend.cases, &app.activity_log);
    if feed.is_empty() {
        frame.render_widget(
            Paragraph::new("No Activity Yet")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = feed
        .iter()
        .skip(app.logs_state.scroll.min(feed.len().saturating_sub(1)))
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<20}", format_utc(&entry.at)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<10}", entry.kind.tag()),
                    Style::default().fg(risk_color(entry.severity)).bold(),
                ),
                Span::raw(entry.message.clone()),
            ]))
        })
        .collect();
    frame.render_widget(List::new(items).block(block), area);
}

// ============================================================================
// Overlays
// ============================================================================

fn draw_modal(frame: &mut Frame, modal: &Modal, area: Rect) {
    let (title, message, border, footer) = match modal {
        Modal::Confirm(action) => (
            action.confirm_title().to_string(),
            action.confirm_prompt(),
            Color::Yellow,
            "[y] Confirm  [n] Cancel",
        ),
        Modal::Alert {
            title,
            message,
            is_error,
        } => (
            title.clone(),
            message.clone(),
            if *is_error { Color::Red } else { Color::Green },
            "[Enter] OK",
        ),
    };

    let layout = render_modal(frame, area, 60, 10, 1, &title, Style::default().fg(border));
    frame.render_widget(
        Paragraph::new(message).wrap(Wrap { trim: true }),
        layout.body,
    );
    frame.render_widget(
        Paragraph::new(footer)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        layout.footer,
    );
}

fn draw_mode_notification(frame: &mut Frame, app: &App, area: Rect) {
    let Some(notification) = &app.mode_notification else {
        return;
    };
    let toast = top_right_area(area, 46, 6);
    frame.render_widget(Clear, toast);
    let lines = vec![
        Line::from(Span::styled(
            "SOAR Mode Auto-Adjusted",
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::from(vec![
            Span::styled(
                notification.from.as_str(),
                Style::default().fg(mode_color(notification.from)),
            ),
            Span::raw(" → "),
            Span::styled(
                notification.to.as_str(),
                Style::default().fg(mode_color(notification.to)).bold(),
            ),
        ]),
        Line::from(Span::styled(
            notification.reason.clone(),
            Style::default().fg(Color::Gray),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        ),
        toast,
    );
}

fn draw_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let help_area = centered_area(area, 60, 22);
    frame.render_widget(Clear, help_area);

    let mut lines = vec![
        String::new(),
        "  NAVIGATION".to_string(),
        "  ──────────".to_string(),
    ];
    for item in NAV_ITEMS {
        lines.push(format!("  {}          {}", item.key, item.label));
    }
    lines.extend([
        String::new(),
        "  GLOBAL".to_string(),
        "  ──────".to_string(),
        "  r          Refresh now".to_string(),
        "  ?          Toggle this help".to_string(),
        "  q          Quit".to_string(),
        String::new(),
        "  THIS VIEW".to_string(),
        "  ─────────".to_string(),
    ]);
    lines.extend(format_help_lines(&view_hints(app)));
    lines.push(String::new());
    lines.push("  Press ? or Esc to close".to_string());

    let help = Paragraph::new(lines.join("\n"))
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .title(" Help ")
                .title_style(Style::default().fg(Color::Cyan).bold())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
    frame.render_widget(help, help_area);
}
