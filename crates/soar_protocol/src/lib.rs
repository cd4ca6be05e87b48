//! Wire types shared by the SOAR console crates.
//!
//! Every record here is a read-mostly projection of state owned by the SOAR
//! backend. The console never derives these values itself; it fetches them,
//! replaces its copy wholesale and renders from it.

pub mod paths;
pub mod time;
pub mod types;

pub use time::{format_timestamp, parse_timestamp};
pub use types::{
    ActionAck, BlockIpRequest, Case, CaseStatus, Mode, ModeResponse, NotesRequest,
    ParseModeError, RiskLevel, ScanVerdict, Stats,
};

/// First eight characters of an identifier, as shown in tables.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Abbreviate a hex digest as `first8...last8`.
///
/// Digests shorter than 16 characters are returned unchanged.
pub fn truncate_hash(hash: &str) -> String {
    let len = hash.chars().count();
    if len < 16 {
        return hash.to_string();
    }
    let head: String = hash.chars().take(8).collect();
    let tail: String = hash.chars().skip(len - 8).collect();
    format!("{}...{}", head, tail)
}
