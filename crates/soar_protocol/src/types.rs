//! Backend payload types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::time::parse_timestamp;
use chrono::{DateTime, Utc};

// ============================================================================
// Mode
// ============================================================================

/// Global automation posture held by the backend.
///
/// Any mode may move to any other mode; there is no disallowed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    /// Threats are remediated without human intervention
    Auto,
    /// Critical threats wait for analyst approval
    Semi,
    /// Observation only
    Manual,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Auto, Mode::Semi, Mode::Manual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Auto => "AUTO",
            Mode::Semi => "SEMI",
            Mode::Manual => "MANUAL",
        }
    }

    /// Long title used on the control panel cards.
    pub fn title(&self) -> &'static str {
        match self {
            Mode::Auto => "AUTOMATIC",
            Mode::Semi => "SEMI-AUTOMATIC",
            Mode::Manual => "MANUAL",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Mode::Auto => "Full autonomous response - Critical threats blocked instantly",
            Mode::Semi => "Analyst approval required before remediation",
            Mode::Manual => "Observe only - No automatic actions",
        }
    }

    pub fn tooltip(&self) -> &'static str {
        match self {
            Mode::Auto => "All threats are automatically remediated without human intervention",
            Mode::Semi => "Critical threats require analyst approval before blocking",
            Mode::Manual => "Cases are created but no automatic remediation occurs",
        }
    }

    /// One-line summary for the header mode indicator.
    pub fn indicator_description(&self) -> &'static str {
        match self {
            Mode::Auto => "Automatic mode - All threats remediated instantly",
            Mode::Semi => "Semi-automatic mode - Approval required for critical threats",
            Mode::Manual => "Manual mode - Observe only, no automatic actions",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid mode: '{0}'. Expected: AUTO, SEMI, or MANUAL")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AUTO" => Ok(Mode::Auto),
            "SEMI" => Ok(Mode::Semi),
            "MANUAL" => Ok(Mode::Manual),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// Body of `GET /api/control/mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeResponse {
    pub mode: Mode,
}

// ============================================================================
// Case
// ============================================================================

/// Risk bucket assigned by the backend risk engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
    /// Anything the backend sends that is not one of the four buckets
    #[serde(other)]
    Unknown,
}

impl RiskLevel {
    /// Buckets in ascending order, as used by the severity chart.
    pub const BUCKETS: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
            RiskLevel::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CaseStatus {
    Open,
    Closed,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Open => "OPEN",
            CaseStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tracked security incident.
///
/// `closed_time`/`closure_note` are only meaningful when the case is CLOSED,
/// and `approved_time` only when `approved_by` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub case_id: String,
    pub ip: String,
    pub risk: RiskLevel,
    #[serde(default)]
    pub severity: Option<f64>,
    pub status: CaseStatus,
    #[serde(default)]
    pub reason: Option<String>,
    /// Creation timestamp
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub closed_time: Option<String>,
    #[serde(default)]
    pub closure_note: Option<String>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub approved_time: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Case {
    pub fn is_open(&self) -> bool {
        self.status == CaseStatus::Open
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.time.as_deref().and_then(parse_timestamp)
    }

    /// Closure timestamp, only for CLOSED cases.
    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        if self.status != CaseStatus::Closed {
            return None;
        }
        self.closed_time.as_deref().and_then(parse_timestamp)
    }

    /// Approval timestamp, only when an approver is recorded.
    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_by.as_ref()?;
        self.approved_time.as_deref().and_then(parse_timestamp)
    }

    pub fn reason_text(&self) -> &str {
        self.reason.as_deref().unwrap_or("")
    }

    /// Pending item for the approval queue: open and critical.
    pub fn awaits_approval(&self) -> bool {
        self.is_open() && self.risk == RiskLevel::Critical
    }
}

// ============================================================================
// Stats / scan / acks
// ============================================================================

/// Aggregate counters recomputed by the backend on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub active_cases: u64,
    #[serde(default)]
    pub critical_threats: u64,
    #[serde(default)]
    pub malware_count: u64,
    #[serde(default)]
    pub blocked_ips: u64,
    #[serde(default)]
    pub total_cases: u64,
    /// Set by the backend when it could not reach its own store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `POST /api/scan/file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanVerdict {
    pub filename: String,
    pub sha256: String,
    pub malicious: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
}

/// Generic acknowledgement returned by mutating endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAck {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persisted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionAck {
    /// Read an acknowledgement out of any JSON body.
    ///
    /// Objects contribute their `message`, `persisted` and `error` fields; a
    /// bare string becomes the message; anything else is an empty ack.
    pub fn from_value(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(fields) => Self {
                message: fields
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                persisted: fields.get("persisted").and_then(|v| v.as_bool()),
                error: fields.get("error").and_then(|v| v.as_str()).map(str::to_string),
            },
            serde_json::Value::String(message) => Self {
                message: Some(message.clone()),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    /// Error text of a request the backend refused while still answering 2xx.
    ///
    /// A mode change that could not be written to disk reports `persisted:
    /// false` alongside `error`; it was applied in memory and is not a refusal.
    pub fn rejection(&self) -> Option<&str> {
        match (&self.error, self.persisted) {
            (Some(error), None) => Some(error.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesRequest {
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockIpRequest {
    pub ip: String,
}
