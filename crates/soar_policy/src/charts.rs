//! Aggregations behind the dashboard charts.

use chrono::{Days, NaiveDate, TimeZone};
use soar_protocol::{Case, RiskLevel};

/// Length of the threat timeline window.
pub const TIMELINE_DAYS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineBucket {
    pub date: NaiveDate,
    /// Short label such as `Jan 5`
    pub label: String,
    pub count: u64,
}

/// Cases created per calendar day for the window ending at `today`, oldest first.
///
/// Days are calendar days in `tz`. Cases without a parseable creation time
/// are not counted.
pub fn threat_timeline<Tz: TimeZone>(
    cases: &[Case],
    today: NaiveDate,
    tz: &Tz,
) -> Vec<TimelineBucket> {
    let created: Vec<NaiveDate> = cases
        .iter()
        .filter_map(Case::created_at)
        .map(|at| at.with_timezone(tz).date_naive())
        .collect();

    (0..TIMELINE_DAYS)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset as u64)))
        .map(|date| TimelineBucket {
            date,
            label: date.format("%b %-d").to_string(),
            count: created.iter().filter(|day| **day == date).count() as u64,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub critical: u64,
}

impl SeverityCounts {
    /// `(bucket, count)` pairs in ascending risk order.
    pub fn as_pairs(&self) -> [(RiskLevel, u64); 4] {
        [
            (RiskLevel::Low, self.low),
            (RiskLevel::Medium, self.medium),
            (RiskLevel::High, self.high),
            (RiskLevel::Critical, self.critical),
        ]
    }

    pub fn total(&self) -> u64 {
        self.low + self.medium + self.high + self.critical
    }
}

/// Count cases per risk bucket. Unknown risk strings are skipped.
pub fn severity_counts(cases: &[Case]) -> SeverityCounts {
    cases
        .iter()
        .fold(SeverityCounts::default(), |mut counts, case| {
            match case.risk {
                RiskLevel::Low => counts.low += 1,
                RiskLevel::Medium => counts.medium += 1,
                RiskLevel::High => counts.high += 1,
                RiskLevel::Critical => counts.critical += 1,
                RiskLevel::Unknown => {}
            }
            counts
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreatKind {
    Malware,
    BruteForce,
    Other,
}

impl ThreatKind {
    /// Classify a case reason, case-insensitively.
    pub fn classify(reason: &str) -> Self {
        let reason = reason.to_lowercase();
        if reason.contains("malware") || reason.contains("virus") {
            ThreatKind::Malware
        } else if reason.contains("brute") || reason.contains("force") {
            ThreatKind::BruteForce
        } else {
            ThreatKind::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ThreatKind::Malware => "Malware",
            ThreatKind::BruteForce => "Brute Force",
            ThreatKind::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreatTypeCounts {
    pub malware: u64,
    pub bruteforce: u64,
    pub other: u64,
}

impl ThreatTypeCounts {
    pub fn as_pairs(&self) -> [(ThreatKind, u64); 3] {
        [
            (ThreatKind::Malware, self.malware),
            (ThreatKind::BruteForce, self.bruteforce),
            (ThreatKind::Other, self.other),
        ]
    }
}

pub fn threat_type_counts(cases: &[Case]) -> ThreatTypeCounts {
    let mut counts = ThreatTypeCounts::default();
    for case in cases {
        match ThreatKind::classify(case.reason_text()) {
            ThreatKind::Malware => counts.malware += 1,
            ThreatKind::BruteForce => counts.bruteforce += 1,
            ThreatKind::Other => counts.other += 1,
        }
    }
    counts
}
