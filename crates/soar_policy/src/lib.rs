//! Deterministic heuristics over backend state.
//!
//! Nothing in this crate performs I/O. Every function takes the records it
//! needs and returns a value; callers own scheduling and side effects.

pub mod activity;
pub mod charts;
pub mod confidence;
pub mod mode_advisor;

pub use activity::{activity_feed, ActivityEntry, ActivityKind, ModeChangeRecord};
pub use charts::{
    severity_counts, threat_timeline, threat_type_counts, SeverityCounts, ThreatKind,
    ThreatTypeCounts, TimelineBucket, TIMELINE_DAYS,
};
pub use confidence::{score_case, Confidence, ConfidenceLevel};
pub use mode_advisor::{advise, recommend, AdvisorRule, Recommendation};
