//! Mode Advisor
//!
//! Maps the threat landscape to a recommended response mode. Rules are
//! evaluated top to bottom and the first match wins; when nothing matches the
//! current mode is kept.

use soar_protocol::{Mode, Stats};

/// Which rule produced a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisorRule {
    /// Three or more critical threats
    Escalate,
    /// At least one critical threat
    RequireApproval,
    /// Many open cases, none critical
    Oversight,
    /// Nothing open at all
    Observation,
}

struct Rule {
    kind: AdvisorRule,
    target: Mode,
    applies: fn(u64, u64) -> bool,
}

const RULES: &[Rule] = &[
    Rule {
        kind: AdvisorRule::Escalate,
        target: Mode::Auto,
        applies: |critical, _active| critical >= 3,
    },
    Rule {
        kind: AdvisorRule::RequireApproval,
        target: Mode::Semi,
        applies: |critical, _active| critical > 0,
    },
    Rule {
        kind: AdvisorRule::Oversight,
        target: Mode::Semi,
        applies: |_critical, active| active > 10,
    },
    Rule {
        kind: AdvisorRule::Observation,
        target: Mode::Manual,
        applies: |critical, active| active == 0 && critical == 0,
    },
];

impl AdvisorRule {
    fn reason(self, critical: u64, active: u64) -> String {
        match self {
            AdvisorRule::Escalate => format!(
                "{} critical threats detected - escalating to automatic response",
                critical
            ),
            AdvisorRule::RequireApproval => format!(
                "{} critical threat(s) detected - requiring analyst approval",
                critical
            ),
            AdvisorRule::Oversight => {
                format!("{} active cases - enabling analyst oversight", active)
            }
            AdvisorRule::Observation => {
                "No active threats - switching to observation mode".to_string()
            }
        }
    }
}

/// A mode change the advisor wants applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub from: Mode,
    pub to: Mode,
    pub rule: AdvisorRule,
    pub reason: String,
}

/// First matching rule for the given counters, ignoring the current mode.
pub fn recommend(critical_threats: u64, active_cases: u64) -> Option<(Mode, AdvisorRule)> {
    RULES
        .iter()
        .find(|rule| (rule.applies)(critical_threats, active_cases))
        .map(|rule| (rule.target, rule.kind))
}

/// Recommendation for `stats`, or `None` when the current mode should stay.
///
/// Stats carrying a backend `error` have zeroed counters and never produce a
/// recommendation.
pub fn advise(stats: &Stats, current: Mode) -> Option<Recommendation> {
    if stats.error.is_some() {
        return None;
    }
    let (critical, active) = (stats.critical_threats, stats.active_cases);
    let (target, rule) = recommend(critical, active)?;
    if target == current {
        return None;
    }
    Some(Recommendation {
        from: current,
        to: target,
        rule,
        reason: rule.reason(critical, active),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(critical: u64, active: u64) -> Stats {
        Stats {
            critical_threats: critical,
            active_cases: active,
            ..Stats::default()
        }
    }

    #[test]
    fn test_three_critical_escalates_to_auto() {
        let rec = advise(&stats(3, 0), Mode::Manual).unwrap();
        assert_eq!(rec.to, Mode::Auto);
        assert_eq!(rec.rule, AdvisorRule::Escalate);
        assert_eq!(
            rec.reason,
            "3 critical threats detected - escalating to automatic response"
        );
    }

    #[test]
    fn test_single_critical_requires_approval() {
        let rec = advise(&stats(1, 0), Mode::Auto).unwrap();
        assert_eq!(rec.from, Mode::Auto);
        assert_eq!(rec.to, Mode::Semi);
        assert_eq!(
            rec.reason,
            "1 critical threat(s) detected - requiring analyst approval"
        );
    }

    #[test]
    fn test_all_clear_moves_to_manual() {
        let rec = advise(&stats(0, 0), Mode::Semi).unwrap();
        assert_eq!(rec.to, Mode::Manual);
        assert_eq!(rec.reason, "No active threats - switching to observation mode");
    }

    #[test]
    fn test_moderate_load_keeps_current_mode() {
        assert_eq!(recommend(0, 5), None);
        assert_eq!(advise(&stats(0, 5), Mode::Auto), None);
        assert_eq!(advise(&stats(0, 10), Mode::Manual), None);
    }

    #[test]
    fn test_many_active_cases_request_oversight() {
        let rec = advise(&stats(0, 11), Mode::Manual).unwrap();
        assert_eq!(rec.to, Mode::Semi);
        assert_eq!(rec.rule, AdvisorRule::Oversight);
        assert_eq!(rec.reason, "11 active cases - enabling analyst oversight");
    }

    #[test]
    fn test_critical_rules_outrank_case_volume() {
        assert_eq!(recommend(2, 50), Some((Mode::Semi, AdvisorRule::RequireApproval)));
        assert_eq!(recommend(4, 50), Some((Mode::Auto, AdvisorRule::Escalate)));
    }

    #[test]
    fn test_store_error_counters_are_ignored() {
        let outage = Stats {
            error: Some("Connection refused: opensearch".to_string()),
            ..Stats::default()
        };
        assert_eq!(advise(&outage, Mode::Auto), None);
        assert_eq!(advise(&outage, Mode::Semi), None);
    }

    #[test]
    fn test_no_recommendation_when_already_there() {
        assert_eq!(advise(&stats(5, 5), Mode::Auto), None);
        assert_eq!(advise(&stats(0, 0), Mode::Manual), None);
    }

    #[test]
    fn test_recommendation_is_total_over_small_grid() {
        for critical in 0..6u64 {
            for active in 0..15u64 {
                let expected = if critical >= 3 {
                    Some(Mode::Auto)
                } else if critical > 0 || active > 10 {
                    Some(Mode::Semi)
                } else if active == 0 {
                    Some(Mode::Manual)
                } else {
                    None
                };
                assert_eq!(recommend(critical, active).map(|(m, _)| m), expected);
            }
        }
    }
}
