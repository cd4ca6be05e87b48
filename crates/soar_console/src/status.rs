//! `soar-console status`: one load cycle, printed as tables or JSON.
//!
//! Read-only. The advisor's recommendation is reported but never applied.

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use serde::Serialize;

use soar_api::SoarApi;
use soar_policy::{advise, score_case};
use soar_protocol::{format_timestamp, short_id, Case, Mode, RiskLevel, Stats};

use crate::tui::app::sort_cases_newest_first;

const STATUS_CASE_ROWS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct AdvisorView {
    pub from: Mode,
    pub to: Mode,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub base_url: String,
    pub mode: Mode,
    pub stats: Stats,
    pub pending_approvals: usize,
    pub advisor: Option<AdvisorView>,
    pub cases: Vec<Case>,
}

/// Fetch stats, cases and mode concurrently; any failure fails the report.
pub async fn fetch_status(api: &SoarApi) -> Result<StatusReport> {
    let (stats, mut cases, mode) =
        tokio::try_join!(api.get_stats(), api.list_cases(), api.get_mode())
            .with_context(|| format!("Failed to load status from {}", api.base_url()))?;
    sort_cases_newest_first(&mut cases);

    let advisor = advise(&stats, mode).map(|rec| AdvisorView {
        from: rec.from,
        to: rec.to,
        reason: rec.reason,
    });
    let pending_approvals = cases.iter().filter(|case| case.awaits_approval()).count();

    Ok(StatusReport {
        base_url: api.base_url().to_string(),
        mode,
        stats,
        pending_approvals,
        advisor,
        cases,
    })
}

pub async fn run(api: SoarApi, json: bool) -> Result<()> {
    let report = fetch_status(&api).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("SOAR STATUS");
    println!("===========");
    println!();
    println!("Backend:  {}", report.base_url);
    println!("Mode:     {} ({})", report.mode.title(), report.mode.description());
    if let Some(advisor) = &report.advisor {
        println!(
            "Advisor:  would switch {} -> {}: {}",
            advisor.from, advisor.to, advisor.reason
        );
    }
    if let Some(error) = &report.stats.error {
        println!("Warning:  backend reported: {}", error);
    }
    println!();
    println!("{}", summary_table(&report));
    println!();
    if report.cases.is_empty() {
        println!("No cases.");
    } else {
        println!("{}", cases_table(&report.cases, STATUS_CASE_ROWS));
        if report.cases.len() > STATUS_CASE_ROWS {
            println!("... and {} more", report.cases.len() - STATUS_CASE_ROWS);
        }
    }
    Ok(())
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);
    table
}

fn summary_table(report: &StatusReport) -> Table {
    let stats = &report.stats;
    let mut table = new_table(&["Metric", "Value"]);
    let critical = Cell::new(stats.critical_threats).fg(if stats.critical_threats > 0 {
        Color::Red
    } else {
        Color::Green
    });
    table.add_row(vec![Cell::new("Active Cases"), Cell::new(stats.active_cases)]);
    table.add_row(vec![Cell::new("Critical Threats"), critical]);
    table.add_row(vec![Cell::new("Malware Detections"), Cell::new(stats.malware_count)]);
    table.add_row(vec![Cell::new("Blocked IPs"), Cell::new(stats.blocked_ips)]);
    table.add_row(vec![Cell::new("Total Cases"), Cell::new(stats.total_cases)]);
    table.add_row(vec![
        Cell::new("Pending Approvals"),
        Cell::new(report.pending_approvals),
    ]);
    table
}

fn risk_color(risk: RiskLevel) -> Color {
    match risk {
        RiskLevel::Low => Color::Green,
        RiskLevel::Medium => Color::Yellow,
        RiskLevel::High => Color::Magenta,
        RiskLevel::Critical => Color::Red,
        RiskLevel::Unknown => Color::Grey,
    }
}

fn cases_table(cases: &[Case], limit: usize) -> Table {
    let mut table = new_table(&["ID", "IP", "Risk", "Status", "Confidence", "Reason", "Created"]);
    for case in cases.iter().take(limit) {
        let confidence = score_case(case);
        table.add_row(vec![
            Cell::new(short_id(&case.case_id)),
            Cell::new(&case.ip),
            Cell::new(case.risk.as_str()).fg(risk_color(case.risk)),
            Cell::new(case.status.as_str()),
            Cell::new(format!("{} {}%", confidence.level, confidence.score)),
            Cell::new(case.reason_text()),
            Cell::new(format_timestamp(case.time.as_deref())),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use soar_protocol::CaseStatus;

    fn case(id: &str, risk: RiskLevel) -> Case {
        Case {
            case_id: id.to_string(),
            ip: "192.0.2.44".to_string(),
            risk,
            severity: Some(85.0),
            status: CaseStatus::Open,
            reason: Some("Brute force login".to_string()),
            time: Some("2024-02-01T08:30:00".to_string()),
            closed_time: None,
            closure_note: None,
            approved_by: None,
            approved_time: None,
            notes: None,
        }
    }

    fn report() -> StatusReport {
        StatusReport {
            base_url: "http://127.0.0.1:8000".to_string(),
            mode: Mode::Semi,
            stats: Stats {
                active_cases: 3,
                critical_threats: 1,
                malware_count: 2,
                blocked_ips: 5,
                total_cases: 9,
                error: None,
            },
            pending_approvals: 1,
            advisor: None,
            cases: vec![case("0123456789ab", RiskLevel::Critical)],
        }
    }

    #[test]
    fn test_summary_table_lists_counters() {
        let rendered = summary_table(&report()).to_string();
        assert!(rendered.contains("Active Cases"));
        assert!(rendered.contains("Pending Approvals"));
        assert!(rendered.contains('9'));
    }

    #[test]
    fn test_cases_table_uses_short_ids_and_limit() {
        let cases = vec![
            case("aaaaaaaa-1111", RiskLevel::High),
            case("bbbbbbbb-2222", RiskLevel::Low),
        ];
        let rendered = cases_table(&cases, 1).to_string();
        assert!(rendered.contains("aaaaaaaa"));
        assert!(!rendered.contains("aaaaaaaa-1111"));
        assert!(!rendered.contains("bbbbbbbb"));
    }

    #[test]
    fn test_report_serializes_mode_uppercase() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["mode"], "SEMI");
        assert_eq!(json["stats"]["blocked_ips"], 5);
        assert!(json["advisor"].is_null());
    }
}
