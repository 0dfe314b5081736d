//! HTTP Backend Integration Tests
//!
//! Runs an in-process Axum mock of the prediction service on an ephemeral
//! localhost port and exercises `HttpBackend` and `Session` against it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use quality_sim::{
    Backend, BackendError, CellValue, DatasetUpload, ErrorBanner, HttpBackend, MetricsSource,
    Session, SimulationPayload, Status,
};

#[derive(Default)]
struct Recorded {
    upload: Option<(String, String, Vec<u8>)>,
    payload: Option<Value>,
}

type Shared = Arc<Mutex<Recorded>>;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ready" }))
}

async fn config() -> Json<Value> {
    Json(json!({
        "features": ["limestone_pct", "kiln_temp"],
        "target": "strength_28d",
        "slider_config": {
            "limestone_pct": { "min": 70.0, "max": 90.0, "step": 0.5, "default": 82.5 },
            "kiln_temp": { "min": 1350.0, "max": 1500.0, "step": 5.0, "default": 1455.0 }
        },
        "dataset_ready": true,
        "metrics": { "mae": 0.12, "mse": 0.03, "r2": 0.91 },
        "sample_data": [
            { "limestone_pct": 80.0, "kiln_temp": 1450.0, "strength_28d": 4.1 },
            { "limestone_pct": "81.5", "kiln_temp": null, "strength_28d": "n/a" }
        ]
    }))
}

async fn train(State(recorded): State<Shared>, mut multipart: Multipart) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap_or_default().to_vec();
        let has_target = String::from_utf8_lossy(&bytes).contains("strength_28d");
        recorded.lock().unwrap().upload = Some((name, file_name, bytes));

        if !has_target {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": "Missing columns: strength_28d" })),
            )
                .into_response();
        }
    }
    Json(json!({
        "message": "Model trained",
        "metrics": { "mae": 0.08, "mse": 0.01, "r2": 0.97 },
        "feature_names": ["limestone_pct", "kiln_temp"],
        "target_name": "strength_28d",
        "sample_data": [ { "limestone_pct": 80.0, "kiln_temp": 1450.0, "strength_28d": 4.2 } ]
    }))
    .into_response()
}

async fn predict(State(recorded): State<Shared>, Json(payload): Json<Value>) -> Response {
    let has_lsf = payload.get("lsf").is_some_and(Value::is_number);
    recorded.lock().unwrap().payload = Some(payload);
    if !has_lsf {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "detail": "lsf required" })))
            .into_response();
    }
    Json(json!({
        "predicted_strength": 4.31,
        "quality_label": "High / Good Quality",
        "quality_color": "green",
        "delta_to_target": 0.51,
        "shap_base_value": 4.0,
        "shap_contributions": [
            { "feature": "kiln_temp", "shap_value": 0.21, "actual_value": 1455.0 },
            { "feature": "limestone_pct", "shap_value": 0.1, "actual_value": 82.5 }
        ],
        "top_features": ["kiln_temp", "limestone_pct"],
        "suggestions": ["Hold current settings"]
    }))
    .into_response()
}

/// Start the mock service; returns its base URL and the request recorder.
async fn spawn_mock() -> (String, Shared) {
    let recorded = Shared::default();
    let app = Router::new()
        .route("/health", get(health))
        .route("/config", get(config))
        .route("/train", post(train))
        .route("/predict", post(predict))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/"), recorded)
}

/// Health and config decode into typed responses.
#[tokio::test]
async fn test_health_and_config_decode() {
    let (url, _) = spawn_mock().await;
    let backend = HttpBackend::new(&url, Some(Duration::from_secs(5))).unwrap();

    assert_eq!(backend.health().await.unwrap(), "ready");

    let config = backend.config().await.unwrap();
    assert!(config.dataset_ready);
    assert_eq!(config.slider_config["kiln_temp"].default, 1455.0);
    let rows = config.sample_data.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["limestone_pct"].as_finite(), Some(81.5));
    assert_eq!(rows[1]["kiln_temp"], CellValue::Missing);
    assert_eq!(rows[1]["strength_28d"].as_finite(), None);
}

/// The dataset goes up as multipart field `file` with its file name.
#[tokio::test]
async fn test_train_uploads_multipart_file() {
    let (url, recorded) = spawn_mock().await;
    let backend = HttpBackend::new(&url, None).unwrap();
    let csv = b"limestone_pct,kiln_temp,strength_28d\n80,1450,4.2\n".to_vec();

    let trained = backend
        .train(DatasetUpload::new("plant_a.csv", csv.clone()))
        .await
        .unwrap();
    assert_eq!(trained.message, "Model trained");
    assert_eq!(trained.metrics.r2, 0.97);

    let (field, file_name, bytes) = recorded.lock().unwrap().upload.clone().unwrap();
    assert_eq!(field, "file");
    assert_eq!(file_name, "plant_a.csv");
    assert_eq!(bytes, csv);
}

/// A FastAPI error body surfaces its `detail`.
#[tokio::test]
async fn test_train_rejection_carries_detail() {
    let (url, _) = spawn_mock().await;
    let backend = HttpBackend::new(&url, None).unwrap();

    let err = backend
        .train(DatasetUpload::new("bad.csv", "limestone_pct\n80\n"))
        .await
        .unwrap_err();
    match &err {
        BackendError::Status { status, detail } => {
            assert_eq!(*status, reqwest::StatusCode::BAD_REQUEST);
            assert_eq!(detail.as_deref(), Some("Missing columns: strength_28d"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("Missing columns"));
}

/// Predict sends the backend's field names, including the optional ones.
#[tokio::test]
async fn test_predict_payload_wire_format() {
    let (url, recorded) = spawn_mock().await;
    let backend = HttpBackend::new(&url, None).unwrap();

    let mut payload = SimulationPayload::default();
    payload.lsf = Some(0.64);
    let prediction = backend.predict(&payload).await.unwrap();
    assert_eq!(prediction.predicted_strength, 4.31);
    assert_eq!(prediction.strength_units, "MPa");

    let sent = recorded.lock().unwrap().payload.clone().unwrap();
    assert_eq!(sent["al2o3_pct"], json!(2.0));
    assert_eq!(sent["o2"], json!(4.5));
    assert_eq!(sent["lsf"], json!(0.64));
    assert_eq!(sent["target_strength"], json!(3.8));

    // Without lsf the field is omitted and the service refuses it
    payload.lsf = None;
    assert!(matches!(
        backend.predict(&payload).await,
        Err(BackendError::Status { status, .. }) if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
    ));
    let sent = recorded.lock().unwrap().payload.clone().unwrap();
    assert!(sent.get("lsf").is_none());
}

/// Full session flow over real HTTP.
#[tokio::test]
async fn test_session_over_http() {
    let (url, recorded) = spawn_mock().await;
    let backend = HttpBackend::new(&url, None).unwrap();
    let mut session = Session::new(Arc::new(backend), Duration::from_millis(20));

    session.activate();
    session.settle().await;
    assert_eq!(session.status(), Status::Ready);
    assert_eq!(session.model().lsf(), 0.66);

    session
        .train(DatasetUpload::new("plant_a.csv", "limestone_pct,kiln_temp,strength_28d\n80,1450,4.2\n"))
        .await
        .unwrap();
    assert_eq!(session.status(), Status::Ready);
    // Follow-up config refresh has landed
    assert_eq!(session.state().metrics.as_ref().unwrap().source, MetricsSource::Config);

    let strength = session.predict().await.unwrap().predicted_strength;
    assert_eq!(strength, 4.31);
    let sent = recorded.lock().unwrap().payload.clone().unwrap();
    assert_eq!(sent["limestone_pct"], json!(82.5));
    assert_eq!(sent["lsf"], json!(0.66));

    let impact = session.impact_ranking();
    assert_eq!(impact[0].feature, "kiln_temp");
    session.shutdown().await;
}

/// Nothing listening: waiting status and the unreachable banner.
#[tokio::test]
async fn test_unreachable_backend() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::new(&format!("http://{addr}"), Some(Duration::from_secs(2))).unwrap();
    let mut session = Session::new(Arc::new(backend), Duration::from_millis(20));
    session.activate();
    session.settle().await;

    assert_eq!(session.status(), Status::WaitingForData);
    assert_eq!(session.state().error, Some(ErrorBanner::BackendUnreachable));
}
