//! Activity feed derivation for the logs view.
//!
//! The feed is rebuilt from scratch on every render out of the current case
//! list plus the session's mode-change log. An event is only emitted when its
//! own timestamp is present and parseable; nothing is defaulted.

use chrono::{DateTime, Utc};
use soar_protocol::{short_id, Case, Mode, RiskLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    CaseCreated,
    CaseClosed,
    ApprovalGranted,
    IpBlocked,
    ModeChange,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::CaseCreated => "case_created",
            ActivityKind::CaseClosed => "case_closed",
            ActivityKind::ApprovalGranted => "approval_granted",
            ActivityKind::IpBlocked => "ip_blocked",
            ActivityKind::ModeChange => "mode_change",
        }
    }

    /// Short tag shown in front of each feed line.
    pub fn tag(&self) -> &'static str {
        match self {
            ActivityKind::CaseCreated => "NEW",
            ActivityKind::CaseClosed => "CLOSED",
            ActivityKind::ApprovalGranted => "APPROVED",
            ActivityKind::IpBlocked => "BLOCKED",
            ActivityKind::ModeChange => "MODE",
        }
    }
}

/// A mode change observed during this session. Lost when the console exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeChangeRecord {
    pub old_mode: Mode,
    pub new_mode: Mode,
    pub at: DateTime<Utc>,
    /// Issued by the mode advisor rather than an analyst
    pub automatic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub at: DateTime<Utc>,
    pub kind: ActivityKind,
    pub message: String,
    pub severity: RiskLevel,
}

fn case_events(case: &Case, out: &mut Vec<ActivityEntry>) {
    let id = short_id(&case.case_id);

    if let Some(at) = case.created_at() {
        out.push(ActivityEntry {
            at,
            kind: ActivityKind::CaseCreated,
            message: format!("Case {} created for IP {} ({} risk)", id, case.ip, case.risk),
            severity: case.risk,
        });
    }

    if let Some(at) = case.closed_at() {
        let note = case
            .closure_note
            .as_deref()
            .filter(|note| !note.is_empty())
            .unwrap_or("Remediation completed");
        out.push(ActivityEntry {
            at,
            kind: ActivityKind::CaseClosed,
            message: format!("Case {} closed - {}", id, note),
            severity: RiskLevel::Low,
        });

        if case.risk == RiskLevel::Critical {
            out.push(ActivityEntry {
                at,
                kind: ActivityKind::IpBlocked,
                message: format!("IP {} blocked and added to firewall blocklist", case.ip),
                severity: RiskLevel::High,
            });
        }
    }

    if let (Some(at), Some(approver)) = (case.approved_at(), case.approved_by.as_deref()) {
        out.push(ActivityEntry {
            at,
            kind: ActivityKind::ApprovalGranted,
            message: format!(
                "Remediation approved by {} for case {} (IP: {})",
                approver, id, case.ip
            ),
            severity: RiskLevel::Medium,
        });
    }
}

/// Unified feed, newest first.
pub fn activity_feed(cases: &[Case], mode_log: &[ModeChangeRecord]) -> Vec<ActivityEntry> {
    let mut feed = Vec::with_capacity(cases.len() * 2 + mode_log.len());
    for case in cases {
        case_events(case, &mut feed);
    }
    feed.extend(mode_log.iter().map(|change| ActivityEntry {
        at: change.at,
        kind: ActivityKind::ModeChange,
        message: if change.automatic {
            format!(
                "SOAR mode auto-adjusted from {} to {}",
                change.old_mode, change.new_mode
            )
        } else {
            format!(
                "SOAR mode changed from {} to {}",
                change.old_mode, change.new_mode
            )
        },
        severity: RiskLevel::Medium,
    }));

    feed.sort_by(|a, b| b.at.cmp(&a.at));
    feed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use soar_protocol::CaseStatus;

    fn case(id: &str, risk: RiskLevel, status: CaseStatus) -> Case {
        Case {
            case_id: id.to_string(),
            ip: "203.0.113.9".to_string(),
            risk,
            severity: None,
            status,
            reason: None,
            time: Some("2024-01-05T10:00:00".to_string()),
            closed_time: None,
            closure_note: None,
            approved_by: None,
            approved_time: None,
            notes: None,
        }
    }

    #[test]
    fn test_closed_critical_case_yields_block_event() {
        let mut closed = case("abcdef0123456789", RiskLevel::Critical, CaseStatus::Closed);
        closed.closed_time = Some("2024-01-05T12:00:00".to_string());

        let feed = activity_feed(&[closed], &[]);
        let kinds: Vec<_> = feed.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActivityKind::CaseClosed,
                ActivityKind::IpBlocked,
                ActivityKind::CaseCreated
            ]
        );
        assert_eq!(feed[0].message, "Case abcdef01 closed - Remediation completed");
        assert_eq!(
            feed[1].message,
            "IP 203.0.113.9 blocked and added to firewall blocklist"
        );
        assert_eq!(
            feed[2].message,
            "Case abcdef01 created for IP 203.0.113.9 (CRITICAL risk)"
        );
    }

    #[test]
    fn test_missing_companion_timestamps_are_excluded() {
        // closed without closed_time, approver without approved_time
        let mut closed = case("case-a", RiskLevel::Critical, CaseStatus::Closed);
        closed.approved_by = Some("analyst".to_string());
        // approved_time without approver
        let mut orphan = case("case-b", RiskLevel::Low, CaseStatus::Open);
        orphan.approved_time = Some("2024-01-05T11:00:00".to_string());
        // closed_time on an open case
        orphan.closed_time = Some("2024-01-05T11:30:00".to_string());

        let feed = activity_feed(&[closed, orphan], &[]);
        assert_eq!(feed.len(), 2);
        assert!(feed.iter().all(|e| e.kind == ActivityKind::CaseCreated));
    }

    #[test]
    fn test_unparseable_creation_time_is_excluded() {
        let mut bad = case("case-a", RiskLevel::Low, CaseStatus::Open);
        bad.time = Some("yesterday".to_string());
        assert!(activity_feed(&[bad], &[]).is_empty());
    }

    #[test]
    fn test_approval_and_mode_change_are_merged() {
        let mut approved = case("case-a", RiskLevel::High, CaseStatus::Open);
        approved.approved_by = Some("night-shift".to_string());
        approved.approved_time = Some("2024-01-05T11:00:00".to_string());

        let change = ModeChangeRecord {
            old_mode: Mode::Manual,
            new_mode: Mode::Semi,
            at: Utc.with_ymd_and_hms(2024, 1, 5, 10, 30, 0).unwrap(),
            automatic: false,
        };

        let feed = activity_feed(&[approved], &[change]);
        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0].kind, ActivityKind::ApprovalGranted);
        assert_eq!(
            feed[0].message,
            "Remediation approved by night-shift for case case-a (IP: 203.0.113.9)"
        );
        assert_eq!(feed[1].kind, ActivityKind::ModeChange);
        assert_eq!(feed[1].message, "SOAR mode changed from MANUAL to SEMI");
        assert_eq!(feed[2].kind, ActivityKind::CaseCreated);
    }
}
