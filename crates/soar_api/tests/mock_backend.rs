use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use soar_api::{ApiError, SoarApi};
use soar_protocol::{CaseStatus, Mode, RiskLevel};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[derive(Clone)]
struct MockState {
    mode: Arc<Mutex<String>>,
    closed: Arc<Mutex<Vec<String>>>,
    notes: Arc<Mutex<Vec<(String, String)>>>,
    blocked: Arc<Mutex<Vec<(String, String)>>>,
    approvals: Arc<Mutex<Vec<(String, String)>>>,
    uploads: Arc<Mutex<Vec<(String, String, usize)>>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            mode: Arc::new(Mutex::new("MANUAL".to_string())),
            closed: Arc::default(),
            notes: Arc::default(),
            blocked: Arc::default(),
            approvals: Arc::default(),
            uploads: Arc::default(),
        }
    }
}

async fn stats() -> Json<Value> {
    Json(json!({
        "active_cases": 2,
        "critical_threats": 1,
        "malware_count": 1,
        "blocked_ips": 4,
        "total_cases": 6
    }))
}

async fn cases() -> Json<Value> {
    Json(json!([
        {
            "case_id": "c0ffee00-0000-4000-8000-000000000001",
            "ip": "10.0.0.7",
            "risk": "CRITICAL",
            "severity": 92,
            "status": "OPEN",
            "reason": "Malware beacon",
            "time": "2024-01-05T14:30:00"
        },
        {
            "case_id": "c0ffee00-0000-4000-8000-000000000002",
            "ip": "10.0.0.8",
            "risk": "LOW",
            "status": "CLOSED",
            "time": "2024-01-04T09:00:00",
            "closed_time": "2024-01-05T09:00:00",
            "closure_note": "auto-closed"
        }
    ]))
}

async fn get_mode(State(state): State<MockState>) -> Json<Value> {
    let mode = state.mode.lock().expect("mode lock").clone();
    Json(json!({ "mode": mode }))
}

async fn set_mode(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let Some(mode) = params.get("mode") else {
        return Json(json!({ "error": "Invalid mode" }));
    };
    if !["AUTO", "SEMI", "MANUAL"].contains(&mode.as_str()) {
        return Json(json!({ "error": "Invalid mode" }));
    }
    *state.mode.lock().expect("mode lock") = mode.clone();
    Json(json!({ "message": format!("SOAR mode set to {mode}"), "persisted": true }))
}

async fn close_case(
    State(state): State<MockState>,
    Path(case_id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if case_id == "missing" {
        return Err((StatusCode::NOT_FOUND, Json(json!({ "detail": "Case not found" }))));
    }
    state.closed.lock().expect("closed lock").push(case_id);
    Ok(Json(json!({ "message": "Case closed" })))
}

async fn reopen_case(Path(_case_id): Path<String>) -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "")
}

async fn ack_null(State(state): State<MockState>, Path(case_id): Path<String>) -> Json<Value> {
    state.closed.lock().expect("closed lock").push(case_id);
    Json(Value::Null)
}

async fn ack_empty(State(state): State<MockState>, Path(case_id): Path<String>) -> StatusCode {
    state.closed.lock().expect("closed lock").push(case_id);
    StatusCode::OK
}

async fn ack_text(State(state): State<MockState>, Path(case_id): Path<String>) -> Json<Value> {
    state.closed.lock().expect("closed lock").push(case_id);
    Json(json!("Case closed"))
}

async fn ack_not_json() -> &'static str {
    "<html>proxy error</html>"
}

async fn save_notes(
    State(state): State<MockState>,
    Path(case_id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let notes = body["notes"].as_str().unwrap_or_default().to_string();
    state.notes.lock().expect("notes lock").push((case_id, notes));
    Json(json!({ "message": "Notes saved" }))
}

async fn block_ip(
    State(state): State<MockState>,
    Path(case_id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let ip = body["ip"].as_str().unwrap_or_default().to_string();
    state.blocked.lock().expect("blocked lock").push((case_id, ip));
    Json(json!({ "message": "IP blocked" }))
}

async fn approve(
    State(state): State<MockState>,
    Path(case_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let ip = params.get("ip").cloned().unwrap_or_default();
    state.approvals.lock().expect("approvals lock").push((case_id, ip));
    Json(json!({ "message": "Approved and remediated" }))
}

async fn scan(State(state): State<MockState>, mut multipart: Multipart) -> Json<Value> {
    let mut filename = String::new();
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.expect("field bytes");
        state
            .uploads
            .lock()
            .expect("uploads lock")
            .push((name, file_name.clone(), bytes.len()));
        filename = file_name;
    }
    let malicious = filename.ends_with(".exe");
    let mut body = json!({
        "filename": filename,
        "sha256": "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08",
        "malicious": malicious
    });
    if malicious {
        body["case_id"] = json!("abc12345-dead-beef-0000-000000000000");
    }
    Json(body)
}

async fn spawn_mock_backend() -> (SoarApi, MockState, oneshot::Sender<()>) {
    let state = MockState::default();
    let app = Router::new()
        .route("/api/stats", get(stats))
        .route("/api/cases/", get(cases))
        .route("/api/cases/{case_id}/close", post(close_case))
        .route("/api/cases/{case_id}/reopen", post(reopen_case))
        .route("/api/cases/{case_id}/notes", post(save_notes))
        .route("/api/cases/{case_id}/block-ip", post(block_ip))
        .route("/api/control/mode", get(get_mode).post(set_mode))
        .route("/api/approvals/{case_id}/approve", post(approve))
        .route("/api/scan/file", post(scan))
        .route("/null/api/cases/{case_id}/close", post(ack_null))
        .route("/empty/api/cases/{case_id}/close", post(ack_empty))
        .route("/text/api/cases/{case_id}/close", post(ack_text))
        .route("/html/api/cases/{case_id}/close", post(ack_not_json))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let address: SocketAddr = listener.local_addr().expect("mock backend addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .expect("run mock backend");
    });
    (SoarApi::new(format!("http://{address}/")), state, shutdown_tx)
}

#[tokio::test]
async fn fetches_stats_and_cases() {
    let (api, _state, _shutdown) = spawn_mock_backend().await;

    let stats = api.get_stats().await.expect("stats");
    assert_eq!(stats.active_cases, 2);
    assert_eq!(stats.critical_threats, 1);
    assert_eq!(stats.total_cases, 6);
    assert!(stats.error.is_none());

    let cases = api.list_cases().await.expect("cases");
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0].risk, RiskLevel::Critical);
    assert_eq!(cases[0].severity, Some(92.0));
    assert!(cases[0].awaits_approval());
    assert_eq!(cases[1].status, CaseStatus::Closed);
    assert!(cases[1].closed_at().is_some());
}

#[tokio::test]
async fn set_mode_then_get_mode_round_trips() {
    let (api, _state, _shutdown) = spawn_mock_backend().await;

    for mode in [Mode::Auto, Mode::Semi, Mode::Manual, Mode::Semi] {
        let ack = api.set_mode(mode).await.expect("set mode");
        assert_eq!(ack.rejection(), None);
        assert_eq!(api.get_mode().await.expect("get mode"), mode);
    }
}

#[tokio::test]
async fn scan_uploads_single_file_field() {
    let (api, state, _shutdown) = spawn_mock_backend().await;

    let verdict = api
        .scan_file("dropper.exe", b"MZ\x90\x00payload".to_vec())
        .await
        .expect("scan");
    assert!(verdict.malicious);
    assert_eq!(
        verdict.case_id.as_deref(),
        Some("abc12345-dead-beef-0000-000000000000")
    );
    assert_eq!(verdict.filename, "dropper.exe");

    let clean = api
        .scan_file("notes.txt", b"hello".to_vec())
        .await
        .expect("scan");
    assert!(!clean.malicious);
    assert!(clean.case_id.is_none());

    let uploads = state.uploads.lock().expect("uploads lock").clone();
    assert_eq!(
        uploads,
        vec![
            ("file".to_string(), "dropper.exe".to_string(), 11),
            ("file".to_string(), "notes.txt".to_string(), 5),
        ]
    );
}

#[tokio::test]
async fn case_mutations_reach_backend() {
    let (api, state, _shutdown) = spawn_mock_backend().await;

    api.close_case("case-1").await.expect("close");
    api.save_notes("case-1", "triaged by night shift")
        .await
        .expect("notes");
    api.block_ip("case-1", "10.0.0.7").await.expect("block");
    api.approve_case("case-2", "10.0.0.8").await.expect("approve");

    assert_eq!(*state.closed.lock().unwrap(), vec!["case-1".to_string()]);
    assert_eq!(
        *state.notes.lock().unwrap(),
        vec![("case-1".to_string(), "triaged by night shift".to_string())]
    );
    assert_eq!(
        *state.blocked.lock().unwrap(),
        vec![("case-1".to_string(), "10.0.0.7".to_string())]
    );
    assert_eq!(
        *state.approvals.lock().unwrap(),
        vec![("case-2".to_string(), "10.0.0.8".to_string())]
    );
}

#[tokio::test]
async fn non_success_status_is_http_error() {
    let (api, _state, _shutdown) = spawn_mock_backend().await;

    match api.close_case("missing").await {
        Err(ApiError::Http { status, message, .. }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Case not found");
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }

    match api.reopen_case("case-1").await {
        Err(ApiError::Http { status, message, .. }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("addr");
    drop(listener);

    let api = SoarApi::new(format!("http://{address}"));
    let err = api.get_stats().await.expect_err("nothing listening");
    assert!(matches!(err, ApiError::Network { .. }));
    assert_eq!(err.status(), None);
    assert_eq!(err.action(), "fetch stats");
}

#[tokio::test]
async fn mutation_accepts_any_json_acknowledgement() {
    let (api, state, _shutdown) = spawn_mock_backend().await;
    let base = api.base_url().to_string();

    for prefix in ["null", "empty", "text"] {
        let api = SoarApi::new(format!("{base}/{prefix}"));
        let ack = api
            .close_case(&format!("case-{prefix}"))
            .await
            .unwrap_or_else(|err| panic!("{prefix} ack rejected: {err}"));
        assert_eq!(ack.rejection(), None);
    }
    assert_eq!(
        *state.closed.lock().unwrap(),
        vec![
            "case-null".to_string(),
            "case-empty".to_string(),
            "case-text".to_string()
        ]
    );

    let html = SoarApi::new(format!("{base}/html"));
    let err = html.close_case("case-1").await.expect_err("not JSON");
    assert!(matches!(err, ApiError::Decode { .. }));
    assert_eq!(err.action(), "close case");
}

#[tokio::test]
async fn case_id_is_sent_as_one_path_segment() {
    let (api, state, _shutdown) = spawn_mock_backend().await;

    api.close_case("case 7/b").await.expect("close");
    assert_eq!(*state.closed.lock().unwrap(), vec!["case 7/b".to_string()]);
}
