// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// HTTP API
//
// POST /v1/fixes          raw scanner issue -> FixArtifact (422 ingress, 502 terminal)
// POST /v1/fixes/batch    {issues: [...]} -> BatchReport
// POST /v1/feedback       {category, title, description, outcome} -> FeedbackResult
// GET  /v1/cache/stats    CacheStats
// GET  /health

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use crate::application::batch::process_batch;
use crate::application::feedback_learner::FeedbackLearner;
use crate::application::orchestrator::GenerationOrchestrator;
use crate::domain::feedback::{FeedbackEvent, FeedbackOutcome};
use crate::domain::issue::StructuredIssue;

pub struct AppState {
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub feedback: Arc<FeedbackLearner>,
    /// In-flight requests per batch call
    pub batch_concurrency: usize,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<GenerationOrchestrator>,
        feedback: Arc<FeedbackLearner>,
        batch_concurrency: usize,
    ) -> Self {
        Self {
            orchestrator,
            feedback,
            batch_concurrency,
            start_time: Instant::now(),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/fixes", post(create_fix_handler))
        .route("/v1/fixes/batch", post(create_fix_batch_handler))
        .route("/v1/feedback", post(feedback_handler))
        .route("/v1/cache/stats", get(cache_stats_handler))
        .with_state(Arc::new(state))
}

fn error_response(status: StatusCode, message: impl Into<String>, details: Option<Value>) -> Response {
    let mut body = json!({ "error": message.into() });
    if let Some(details) = details {
        body["details"] = details;
    }
    (status, Json(body)).into_response()
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn create_fix_handler(State(state): State<Arc<AppState>>, Json(payload): Json<Value>) -> Response {
    let issue = match StructuredIssue::from_value(payload) {
        Ok(issue) => issue,
        Err(e) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string(), None),
    };

    match state.orchestrator.process(&issue).await {
        Ok(artifact) => (StatusCode::OK, Json(artifact)).into_response(),
        Err(terminal) => error_response(
            StatusCode::BAD_GATEWAY,
            terminal.to_string(),
            serde_json::to_value(&terminal).ok(),
        ),
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub issues: Vec<Value>,
    #[serde(default)]
    pub concurrency: Option<usize>,
}

async fn create_fix_batch_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> Response {
    let concurrency = request
        .concurrency
        .unwrap_or(state.batch_concurrency)
        .clamp(1, state.batch_concurrency.max(1));
    let report = process_batch(&state.orchestrator, request.issues, concurrency).await;
    (StatusCode::OK, Json(report)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub category: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub outcome: FeedbackOutcome,
}

async fn feedback_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FeedbackRequest>,
) -> Response {
    let issue = match StructuredIssue::new(&request.category, request.title, request.description) {
        Ok(issue) => issue,
        Err(e) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string(), None),
    };
    let event = FeedbackEvent {
        issue: issue.identity(),
        outcome: request.outcome,
        timestamp: Utc::now(),
    };

    match state.feedback.record_feedback(&event).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            warn!("Feedback could not be recorded: {}", e);
            error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string(), None)
        }
    }
}

async fn cache_stats_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.orchestrator.cache().get_stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string(), None),
    }
}
