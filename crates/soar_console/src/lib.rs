//! SOAR console: a terminal dashboard and CLI over the SOAR backend REST API.

pub mod config;
pub mod status;
pub mod tui;
