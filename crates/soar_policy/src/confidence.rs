//! Confidence Scorer
//!
//! Additive scoring over three independent signals of a single case. The
//! result is a 0-100 score, a three-level label and a human explanation.

use soar_protocol::{Case, RiskLevel};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "LOW",
            ConfidenceLevel::Medium => "MEDIUM",
            ConfidenceLevel::High => "HIGH",
        }
    }

    fn from_score(score: u8) -> Self {
        if score >= 70 {
            ConfidenceLevel::High
        } else if score >= 40 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confidence {
    pub level: ConfidenceLevel,
    pub score: u8,
    pub explanation: String,
    /// Named indicators that fired, in evaluation order
    pub indicators: Vec<&'static str>,
}

fn risk_points(risk: RiskLevel) -> (u8, Option<&'static str>) {
    match risk {
        RiskLevel::Critical => (40, Some("Critical risk level")),
        RiskLevel::High => (30, Some("High risk level")),
        RiskLevel::Medium => (20, None),
        RiskLevel::Low | RiskLevel::Unknown => (10, None),
    }
}

fn severity_points(severity: Option<f64>) -> (u8, Option<&'static str>) {
    match severity {
        Some(value) if value > 80.0 => (30, Some("High severity score")),
        Some(value) if value > 50.0 => (20, None),
        _ => (0, None),
    }
}

fn reason_points(reason: &str) -> (u8, Option<&'static str>) {
    let reason = reason.to_lowercase();
    if reason.contains("malware") {
        (30, Some("Malware detected"))
    } else if reason.contains("brute") {
        (20, Some("Brute force pattern"))
    } else {
        (0, None)
    }
}

/// Score one case. Pure and total: every case yields a result.
pub fn score_case(case: &Case) -> Confidence {
    let factors = [
        risk_points(case.risk),
        severity_points(case.severity),
        reason_points(case.reason_text()),
    ];

    let score = factors.iter().map(|(points, _)| *points).sum::<u8>().min(100);
    let indicators: Vec<&'static str> = factors.iter().filter_map(|(_, name)| *name).collect();
    let level = ConfidenceLevel::from_score(score);

    let explanation = match level {
        ConfidenceLevel::High => {
            format!("Multiple threat indicators: {}", indicators.join(", "))
        }
        ConfidenceLevel::Medium if !indicators.is_empty() => indicators.join(", "),
        ConfidenceLevel::Medium => "Moderate threat indicators".to_string(),
        ConfidenceLevel::Low => "Limited threat indicators".to_string(),
    };

    Confidence {
        level,
        score,
        explanation,
        indicators,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soar_protocol::CaseStatus;

    fn case(risk: RiskLevel, severity: Option<f64>, reason: &str) -> Case {
        Case {
            case_id: "case-1".to_string(),
            ip: "10.0.0.1".to_string(),
            risk,
            severity,
            status: CaseStatus::Open,
            reason: Some(reason.to_string()),
            time: None,
            closed_time: None,
            closure_note: None,
            approved_by: None,
            approved_time: None,
            notes: None,
        }
    }

    #[test]
    fn test_critical_malware_scores_full_marks() {
        let result = score_case(&case(RiskLevel::Critical, Some(90.0), "malware detected"));
        assert_eq!(result.score, 100);
        assert_eq!(result.level, ConfidenceLevel::High);
        assert_eq!(
            result.explanation,
            "Multiple threat indicators: Critical risk level, High severity score, Malware detected"
        );
    }

    #[test]
    fn test_low_case_without_signals() {
        let result = score_case(&case(RiskLevel::Low, Some(10.0), ""));
        assert_eq!(result.score, 10);
        assert_eq!(result.level, ConfidenceLevel::Low);
        assert_eq!(result.explanation, "Limited threat indicators");
        assert!(result.indicators.is_empty());
    }

    #[test]
    fn test_medium_without_named_indicators_uses_fallback() {
        // MEDIUM risk (20) + severity 60 (20) = 40, nothing named
        let result = score_case(&case(RiskLevel::Medium, Some(60.0), "port scan"));
        assert_eq!(result.score, 40);
        assert_eq!(result.level, ConfidenceLevel::Medium);
        assert_eq!(result.explanation, "Moderate threat indicators");
    }

    #[test]
    fn test_medium_lists_named_indicators() {
        // HIGH risk (30) + brute (20) = 50
        let result = score_case(&case(RiskLevel::High, None, "SSH Brute-Force"));
        assert_eq!(result.score, 50);
        assert_eq!(result.level, ConfidenceLevel::Medium);
        assert_eq!(result.explanation, "High risk level, Brute force pattern");
    }

    #[test]
    fn test_malware_outranks_brute() {
        let result = score_case(&case(RiskLevel::Low, None, "brute force then MALWARE drop"));
        assert_eq!(result.score, 40);
        assert_eq!(result.indicators, vec!["Malware detected"]);
    }

    #[test]
    fn test_severity_boundaries_are_strict() {
        assert_eq!(severity_points(Some(80.0)).0, 20);
        assert_eq!(severity_points(Some(80.5)).0, 30);
        assert_eq!(severity_points(Some(50.0)).0, 0);
        assert_eq!(severity_points(None).0, 0);
    }

    #[test]
    fn test_unknown_risk_scores_as_baseline() {
        let result = score_case(&case(RiskLevel::Unknown, None, ""));
        assert_eq!(result.score, 10);
    }
}
