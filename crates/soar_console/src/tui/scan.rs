//! Local side of a file scan: preview, cosmetic progress and session history.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use soar_protocol::ScanVerdict;

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Delay between the verdict arriving and the result panel replacing the
/// progress panel.
pub const RESULT_REVEAL_DELAY: Duration = Duration::from_millis(500);

/// Human-readable size: bytes below 1 KiB, then KB and MB with two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Metadata shown before the backend has answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePreview {
    pub filename: String,
    pub size_bytes: u64,
    pub size_label: String,
    /// Locally computed; the backend's digest in the verdict is authoritative
    pub sha256: String,
}

impl FilePreview {
    pub fn from_bytes(path: &Path, contents: &[u8]) -> Self {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let size_bytes = contents.len() as u64;
        Self {
            filename,
            size_bytes,
            size_label: format_file_size(size_bytes),
            sha256: sha256_hex(contents),
        }
    }
}

/// Displayed progress of a scan.
///
/// These stages are driven by a timer only and say nothing about how far the
/// upload or the threat-intel lookup actually got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressStage {
    pub percent: u16,
    pub label: &'static str,
}

const STAGES: &[(Duration, ProgressStage)] = &[
    (
        Duration::from_millis(0),
        ProgressStage { percent: 20, label: "Uploading file..." },
    ),
    (
        Duration::from_millis(300),
        ProgressStage { percent: 40, label: "Computing file hash..." },
    ),
    (
        Duration::from_millis(600),
        ProgressStage { percent: 60, label: "Querying VirusTotal..." },
    ),
];

pub const COMPLETE_STAGE: ProgressStage = ProgressStage {
    percent: 100,
    label: "Scan complete!",
};

/// Stage to display `elapsed` after the scan started, before any verdict.
pub fn cosmetic_stage(elapsed: Duration) -> ProgressStage {
    STAGES
        .iter()
        .rev()
        .find(|(at, _)| elapsed >= *at)
        .map(|(_, stage)| *stage)
        .unwrap_or(STAGES[0].1)
}

/// Status lines accumulated so far, oldest first.
pub fn stage_log(elapsed: Duration, complete: bool) -> Vec<&'static str> {
    let mut lines = vec!["Uploading file to server..."];
    if elapsed >= STAGES[1].0 {
        lines.push("Computing SHA256 hash...");
    }
    if elapsed >= STAGES[2].0 {
        lines.push("Querying VirusTotal database...");
    }
    if complete {
        lines.push("Scan completed successfully");
    }
    lines
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHistoryEntry {
    pub filename: String,
    pub malicious: bool,
    pub timestamp: DateTime<Utc>,
    pub case_id: Option<String>,
}

impl ScanHistoryEntry {
    pub fn from_verdict(verdict: &ScanVerdict, timestamp: DateTime<Utc>) -> Self {
        Self {
            filename: verdict.filename.clone(),
            malicious: verdict.malicious,
            timestamp,
            case_id: verdict.case_id.clone(),
        }
    }
}

/// Session-only scan history, newest first, oldest evicted past the limit.
#[derive(Debug, Clone)]
pub struct ScanHistory {
    entries: VecDeque<ScanHistoryEntry>,
    limit: usize,
}

impl Default for ScanHistory {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl ScanHistory {
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn record(&mut self, entry: ScanHistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.limit);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScanHistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&ScanHistoryEntry> {
        self.entries.front()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
