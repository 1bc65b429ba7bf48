//! API route definitions.

use super::state::AppState;
use crate::forecast::{ForecastOutcome, Metric};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/processes", get(list_processes))
        .route("/predict/{pid}", get(predict))
        .route("/classify", get(classify))
        .route("/labels/{pid}", post(add_label))
        .route("/labels/{pid}/{label}", delete(remove_label))
}

async fn health() -> Json<Value> {
    Json(json!({
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION")
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

async fn list_processes(State(state): State<AppState>) -> Json<Value> {
    let processes = state.scored_snapshot().await;
    let total = processes.len();
    Json(json!({
        "data": processes,
        "meta": { "total": total }
    }))
}

#[derive(Deserialize)]
struct PredictParams {
    metric: Option<String>,
}

async fn predict(
    State(state): State<AppState>,
    Path(pid): Path<u32>,
    Query(params): Query<PredictParams>,
) -> (StatusCode, Json<Value>) {
    let metric_name = params.metric.unwrap_or_else(|| "cpu".to_string());
    let metric: Metric = match metric_name.parse() {
        Ok(metric) => metric,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "message": message })),
            )
        }
    };

    let outcome = state.forecast(pid, metric).await;
    let status = match &outcome {
        ForecastOutcome::Success { .. } => StatusCode::OK,
        ForecastOutcome::Waiting { .. } => StatusCode::ACCEPTED,
        ForecastOutcome::Error { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!(outcome)))
}

#[derive(Deserialize)]
struct ClassifyParams {
    limit: Option<usize>,
}

async fn classify(
    State(state): State<AppState>,
    Query(params): Query<ClassifyParams>,
) -> Json<Value> {
    let limit = params.limit.unwrap_or(30);
    let processes = state.classified_snapshot(limit).await;
    let total = processes.len();
    Json(json!({
        "data": processes,
        "meta": {
            "total": total,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }
    }))
}

#[derive(Deserialize)]
struct AddLabel {
    label: String,
}

async fn add_label(
    State(state): State<AppState>,
    Path(pid): Path<u32>,
    Json(body): Json<AddLabel>,
) -> (StatusCode, Json<Value>) {
    if body.label.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "error", "message": "label must not be empty" })),
        );
    }
    state.labels.add(pid, body.label.trim());
    (
        StatusCode::OK,
        Json(json!({ "data": { "pid": pid, "labels": state.labels.get(pid) } })),
    )
}

async fn remove_label(
    State(state): State<AppState>,
    Path((pid, label)): Path<(u32, String)>,
) -> (StatusCode, Json<Value>) {
    if state.labels.remove(pid, &label) {
        (
            StatusCode::OK,
            Json(json!({ "data": { "pid": pid, "labels": state.labels.get(pid) } })),
        )
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "status": "error", "message": format!("no label '{}' on pid {}", label, pid) })),
        )
    }
}
