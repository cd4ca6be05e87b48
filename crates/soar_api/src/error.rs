use thiserror::Error;

/// Failure of a single backend request.
///
/// The exchange itself failed, the backend answered with a non-success
/// status, or a successful answer could not be understood.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request could not be sent, or the response could not be read in the
    /// expected shape.
    #[error("{action}: network error: {source}")]
    Network {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Base URL and case id do not form a valid request URL.
    #[error("{action}: invalid URL: {message}")]
    InvalidUrl {
        action: &'static str,
        message: String,
    },

    /// 2xx body was not JSON.
    #[error("{action}: malformed response: {source}")]
    Decode {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Backend answered with a non-2xx status.
    #[error("{action}: HTTP {status}: {message}")]
    Http {
        action: &'static str,
        status: u16,
        message: String,
    },
}

impl ApiError {
    pub(crate) fn network(action: &'static str, source: reqwest::Error) -> Self {
        Self::Network { action, source }
    }

    /// Name of the operation that failed.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Network { action, .. }
            | Self::InvalidUrl { action, .. }
            | Self::Decode { action, .. }
            | Self::Http { action, .. } => action,
        }
    }

    /// HTTP status, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Pull a readable message out of an error body.
///
/// FastAPI-style `{"detail": ...}` and `{"error": ...}` bodies are unwrapped;
/// anything else is returned trimmed, or the status reason when empty.
pub(crate) fn error_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "error", "message"] {
            match value.get(key) {
                Some(serde_json::Value::String(text)) => return text.clone(),
                Some(other) if !other.is_null() => return other.to_string(),
                _ => {}
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        reason.unwrap_or("request failed").to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_unwraps_detail() {
        assert_eq!(error_message(r#"{"detail":"Not Found"}"#, None), "Not Found");
        assert_eq!(error_message(r#"{"error":"Invalid mode"}"#, None), "Invalid mode");
    }

    #[test]
    fn test_error_message_falls_back_to_reason() {
        assert_eq!(error_message("  ", Some("Bad Gateway")), "Bad Gateway");
        assert_eq!(error_message("", None), "request failed");
        assert_eq!(error_message("upstream exploded\n", None), "upstream exploded");
    }

    #[test]
    fn test_http_error_display() {
        let err = ApiError::Http {
            action: "close case",
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "close case: HTTP 500: boom");
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.action(), "close case");
    }
}
