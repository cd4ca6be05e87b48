use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use soar_protocol::{
    ActionAck, BlockIpRequest, Case, Mode, ModeResponse, NotesRequest, ScanVerdict, Stats,
};

use crate::error::{error_message, ApiError};
use crate::Result;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Client for the backend REST surface.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct SoarApi {
    http: Client,
    base_url: String,
}

impl SoarApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build `{base}/api/{section}/{id}/{verb}` with the id percent-encoded as
    /// a single path segment.
    fn case_url(
        &self,
        action: &'static str,
        section: &str,
        case_id: &str,
        verb: &str,
    ) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|err| ApiError::InvalidUrl {
            action,
            message: err.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl {
                action,
                message: format!("{} cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(["api", section, case_id, verb]);
        Ok(url)
    }

    /// `GET /api/stats`
    pub async fn get_stats(&self) -> Result<Stats> {
        self.send("fetch stats", self.http.get(self.url("/api/stats")))
            .await
    }

    /// `GET /api/cases/`
    pub async fn list_cases(&self) -> Result<Vec<Case>> {
        self.send("list cases", self.http.get(self.url("/api/cases/")))
            .await
    }

    /// `POST /api/cases/{id}/close`
    pub async fn close_case(&self, case_id: &str) -> Result<ActionAck> {
        info!(case_id, "Closing case");
        let url = self.case_url("close case", "cases", case_id, "close")?;
        self.send_ack("close case", self.http.post(url)).await
    }

    /// `POST /api/cases/{id}/reopen`
    pub async fn reopen_case(&self, case_id: &str) -> Result<ActionAck> {
        info!(case_id, "Reopening case");
        let url = self.case_url("reopen case", "cases", case_id, "reopen")?;
        self.send_ack("reopen case", self.http.post(url)).await
    }

    /// `POST /api/cases/{id}/notes`
    pub async fn save_notes(&self, case_id: &str, notes: &str) -> Result<ActionAck> {
        info!(case_id, len = notes.len(), "Saving case notes");
        let url = self.case_url("save notes", "cases", case_id, "notes")?;
        let body = NotesRequest {
            notes: notes.to_string(),
        };
        self.send_ack("save notes", self.http.post(url).json(&body))
            .await
    }

    /// `POST /api/cases/{id}/block-ip`
    pub async fn block_ip(&self, case_id: &str, ip: &str) -> Result<ActionAck> {
        info!(case_id, ip, "Requesting IP block");
        let url = self.case_url("block IP", "cases", case_id, "block-ip")?;
        let body = BlockIpRequest { ip: ip.to_string() };
        self.send_ack("block IP", self.http.post(url).json(&body))
            .await
    }

    /// `GET /api/control/mode`
    pub async fn get_mode(&self) -> Result<Mode> {
        let response: ModeResponse = self
            .send("fetch mode", self.http.get(self.url("/api/control/mode")))
            .await?;
        Ok(response.mode)
    }

    /// `POST /api/control/mode?mode=X`
    pub async fn set_mode(&self, mode: Mode) -> Result<ActionAck> {
        info!(mode = mode.as_str(), "Setting response mode");
        let request = self
            .http
            .post(self.url("/api/control/mode"))
            .query(&[("mode", mode.as_str())]);
        self.send_ack("set mode", request).await
    }

    /// `POST /api/scan/file` with a single multipart field named `file`.
    pub async fn scan_file(&self, filename: &str, contents: Vec<u8>) -> Result<ScanVerdict> {
        info!(filename, size = contents.len(), "Uploading file for scan");
        let part = Part::bytes(contents)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")
            .map_err(|err| ApiError::network("scan file", err))?;
        let form = Form::new().part("file", part);
        let request = self.http.post(self.url("/api/scan/file")).multipart(form);
        self.send("scan file", request).await
    }

    /// `POST /api/approvals/{id}/approve?ip=X`
    pub async fn approve_case(&self, case_id: &str, ip: &str) -> Result<ActionAck> {
        info!(case_id, ip, "Approving case remediation");
        let url = self.case_url("approve case", "approvals", case_id, "approve")?;
        let request = self.http.post(url).query(&[("ip", ip)]);
        self.send_ack("approve case", request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        action: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::network(action, err))?;
        decode(action, response).await
    }

    /// Mutations accept any JSON body on success; `null` or an empty body is
    /// a bare acknowledgement.
    async fn send_ack(
        &self,
        action: &'static str,
        request: RequestBuilder,
    ) -> Result<ActionAck> {
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::network(action, err))?;
        let response = check_status(action, response).await?;
        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::network(action, err))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(ActionAck::default());
        }
        let value: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|source| ApiError::Decode { action, source })?;
        Ok(ActionAck::from_value(&value))
    }
}

async fn check_status(action: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body, status.canonical_reason());
        debug!(action, status = status.as_u16(), %message, "Backend rejected request");
        return Err(ApiError::Http {
            action,
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

async fn decode<T: DeserializeOwned>(action: &'static str, response: Response) -> Result<T> {
    check_status(action, response)
        .await?
        .json::<T>()
        .await
        .map_err(|err| ApiError::network(action, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        let api = SoarApi::new("http://soar.local:8000/");
        assert_eq!(api.base_url(), "http://soar.local:8000");
        assert_eq!(api.url("/api/stats"), "http://soar.local:8000/api/stats");
    }

    #[test]
    fn test_default_base_url_matches_backend() {
        let api = SoarApi::new(DEFAULT_BASE_URL);
        assert_eq!(api.url("/api/cases/"), "http://127.0.0.1:8000/api/cases/");
    }

    #[test]
    fn test_case_url_encodes_id_as_one_segment() {
        let api = SoarApi::new("http://soar.local:8000/");
        let url = api
            .case_url("close case", "cases", "a/b c?d", "close")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://soar.local:8000/api/cases/a%2Fb%20c%3Fd/close"
        );
    }

    #[test]
    fn test_case_url_keeps_base_path_prefix() {
        let api = SoarApi::new("http://gateway.local/soar/");
        let url = api
            .case_url("approve case", "approvals", "c-1", "approve")
            .unwrap();
        assert_eq!(url.as_str(), "http://gateway.local/soar/api/approvals/c-1/approve");
    }

    #[test]
    fn test_case_url_rejects_unparseable_base() {
        let api = SoarApi::new("not a url");
        let err = api.case_url("close case", "cases", "c-1", "close").unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl { .. }));
    }
}
