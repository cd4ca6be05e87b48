//! Thin async client for the SOAR backend.
//!
//! One method per endpoint, one request per call. There are no retries and no
//! caching; callers decide what a failure means.

mod client;
mod error;

pub use client::{SoarApi, DEFAULT_BASE_URL};
pub use error::ApiError;

pub type Result<T> = std::result::Result<T, ApiError>;
