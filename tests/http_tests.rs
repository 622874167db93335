// Integration tests for the HTTP control API
//
// Requests go straight into the router with `oneshot`; no socket is bound.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use screen_recorder::{
    create_router, AppState, FanOut, NotificationSink, PlatformKind, RecordingSessionController,
    SessionConfig, StaticPlatform, StatusBoard,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

fn app(encoder: PathBuf, output_dir: PathBuf) -> Router {
    let board = Arc::new(StatusBoard::default());
    let sinks: Vec<Arc<dyn NotificationSink>> = vec![board.clone() as Arc<dyn NotificationSink>];
    let platform = StaticPlatform {
        encoder_binary: encoder,
        platform: PlatformKind::Windows,
    };
    let config = SessionConfig {
        probe_timeout: Duration::from_secs(5),
        ..SessionConfig::default()
    };
    let controller = RecordingSessionController::new(
        Arc::new(platform),
        config,
        Arc::new(FanOut(sinks)),
    );

    create_router(AppState::new(Arc::new(controller), board, output_dir))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path().join("ffmpeg"), dir.path().to_path_buf());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_status_before_any_recording() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path().join("ffmpeg"), dir.path().to_path_buf());

    let (status, json) = send(&app, "GET", "/recording/status", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "idle");
    assert!(json["session"].is_null());
    assert!(json["last_notification"].is_null());
}

#[tokio::test]
async fn test_stop_without_recording_conflicts() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path().join("ffmpeg"), dir.path().to_path_buf());

    let (status, json) = send(&app, "POST", "/recording/stop", None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "No recording process is running");
}

#[tokio::test]
async fn test_start_with_missing_encoder_fails() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path().join("missing-ffmpeg"), dir.path().to_path_buf());

    let (status, json) = send(&app, "POST", "/recording/start", Some(serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Device probe failed"));

    let (_, json) = send(&app, "GET", "/recording/status", None).await;
    assert_eq!(json["state"], "fatal");
    assert_eq!(json["last_notification"]["kind"], "FATAL");
}

#[cfg(unix)]
#[tokio::test]
async fn test_start_conflict_and_stop() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let encoder = dir.path().join("ffmpeg");
    std::fs::write(
        &encoder,
        r#"#!/bin/sh
case "$*" in
  *-list_devices*)
    echo '[dshow @ 01] DirectShow video devices' >&2
    echo '[dshow @ 01]  "UScreenCapture"' >&2
    echo '[dshow @ 01] DirectShow audio devices' >&2
    exit 1
    ;;
esac
echo "Press [q] to stop, [?] for help" >&2
IFS= read -r line
exit 0
"#,
    )
    .unwrap();
    std::fs::set_permissions(&encoder, std::fs::Permissions::from_mode(0o755)).unwrap();

    let app = app(encoder, dir.path().to_path_buf());

    let (status, json) = send(&app, "POST", "/recording/start", Some(serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let output = json["output_path"].as_str().unwrap().to_string();
    assert!(output.starts_with(&dir.path().display().to_string()));
    assert!(output.ends_with(".mp4"));

    // Wait for the encoder to report readiness
    let mut state = Value::Null;
    for _ in 0..100 {
        let (_, json) = send(&app, "GET", "/recording/status", None).await;
        state = json["state"].clone();
        if state == "recording" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(state, "recording");

    let (status, _) = send(&app, "POST", "/recording/start", Some(serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "POST", "/recording/stop", None).await;
    assert_eq!(status, StatusCode::OK);

    for _ in 0..100 {
        let (_, json) = send(&app, "GET", "/recording/status", None).await;
        state = json["state"].clone();
        if state == "completed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(state, "completed");
}
