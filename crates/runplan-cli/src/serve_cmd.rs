use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use runplan_core::{Orchestrator, PipelineError, ScheduleRequest, ValidatedSchedule};
use runplan_db::ScheduleStore;

use crate::generate_cmd::to_new_schedule;
use crate::schedule_cmds::{MethodInfo, method_infos};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<dyn ScheduleStore>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Shown to clients for any failed generation. The cause is only logged.
const GENERATION_FAILED: &str = "schedule generation failed";

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    /// Logs the full chain; the client only sees a generic message.
    pub fn internal(err: anyhow::Error) -> Self {
        warn!(error = %format!("{err:#}"), "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Body of `POST /api/schedules`, for both outcomes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ValidatedSchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CreateScheduleResponse {
    fn created(id: Uuid, schedule: ValidatedSchedule) -> Self {
        Self {
            success: true,
            schedule_id: Some(id),
            schedule: Some(schedule),
            error: None,
        }
    }

    /// Request validation errors are passed through; anything else becomes
    /// [`GENERATION_FAILED`].
    fn failed(err: &anyhow::Error) -> Self {
        let message = match err.downcast_ref::<PipelineError>() {
            Some(e @ PipelineError::InvalidRequest(_)) => e.to_string(),
            _ => GENERATION_FAILED.to_string(),
        };
        Self {
            success: false,
            schedule_id: None,
            schedule: None,
            error: Some(message),
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/schedules", post(create_schedule))
        .route("/api/schedules/{id}", get(get_schedule))
        .route("/api/methods", get(list_methods))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {bind}:{port}"))?;
    info!("runplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("runplan serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn create_schedule(
    State(state): State<AppState>,
    Json(request): Json<ScheduleRequest>,
) -> axum::response::Response {
    // Cancelled when axum drops this future, i.e. the client went away.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    match generate_and_store(&state, &request, &cancel).await {
        Ok((id, schedule)) => {
            (StatusCode::OK, Json(CreateScheduleResponse::created(id, schedule))).into_response()
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "schedule request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CreateScheduleResponse::failed(&e)),
            )
                .into_response()
        }
    }
}

async fn generate_and_store(
    state: &AppState,
    request: &ScheduleRequest,
    cancel: &CancellationToken,
) -> Result<(Uuid, ValidatedSchedule)> {
    let schedule = state.orchestrator.generate(request, cancel).await?;
    let stored = state
        .store
        .store(to_new_schedule(&schedule, request)?)
        .await
        .context("failed to store schedule")?;
    info!(id = %stored.id, weeks = stored.total_weeks, "schedule created");
    Ok((stored.id, schedule))
}

async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let stored = state
        .store
        .fetch(id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("schedule {id} not found")))?;
    Ok(Json(stored).into_response())
}

async fn list_methods() -> Json<Vec<MethodInfo>> {
    Json(method_infos())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use async_trait::async_trait;
    use tower::ServiceExt;

    use runplan_core::{OrchestratorConfig, TextGenerator};
    use runplan_db::{MemoryScheduleStore, NewSchedule, ScheduleListing, StoredSchedule};
    use runplan_test_utils::{ScriptedGenerator, sample_reply, sample_request};

    use super::*;

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn state(generator: ScriptedGenerator) -> AppState {
        let mut config = OrchestratorConfig::default();
        config.retry.base_delay = Duration::from_millis(1);
        let generator: Arc<dyn TextGenerator> = Arc::new(generator);
        AppState {
            orchestrator: Arc::new(Orchestrator::new(generator, config)),
            store: Arc::new(MemoryScheduleStore::new()),
        }
    }

    /// Every call fails the way an unreachable database would.
    struct BrokenStore;

    #[async_trait]
    impl ScheduleStore for BrokenStore {
        async fn store(&self, _new: NewSchedule) -> Result<StoredSchedule> {
            anyhow::bail!("password authentication failed for user \"runplan\"")
        }

        async fn fetch(&self, _id: Uuid) -> Result<Option<StoredSchedule>> {
            anyhow::bail!("password authentication failed for user \"runplan\"")
        }

        async fn list(&self, _limit: usize) -> Result<Vec<ScheduleListing>> {
            anyhow::bail!("password authentication failed for user \"runplan\"")
        }
    }

    async fn get_request(state: AppState, uri: &str) -> axum::response::Response {
        build_router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_json(state: AppState, uri: &str, body: String) -> axum::response::Response {
        build_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 4 * 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn request_body() -> String {
        serde_json::to_string(&sample_request()).unwrap()
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_schedule_then_fetch_it() {
        let state = state(ScriptedGenerator::always(sample_reply(10, "laag")));

        let resp = post_json(state.clone(), "/api/schedules", request_body()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["schedule"]["weeks"].as_array().unwrap().len(), 10);
        assert_eq!(json["schedule"]["weeks"][9]["weekNumber"], 10);
        assert!(json.get("error").is_none());

        let id = json["scheduleId"].as_str().unwrap().to_string();
        let resp = get_request(state, &format!("/api/schedules/{id}")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let stored = body_json(resp).await;
        assert_eq!(stored["id"], id.as_str());
        assert_eq!(stored["totalWeeks"], 10);
        assert_eq!(stored["schedule"], json["schedule"]);
    }

    #[tokio::test]
    async fn test_generation_failure_is_500_with_generic_message() {
        let state = state(ScriptedGenerator::failing("503 model overloaded"));

        let resp = post_json(state.clone(), "/api/schedules", request_body()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], GENERATION_FAILED);
        assert!(!json.to_string().contains("503 model overloaded"));
        assert!(json.get("scheduleId").is_none());
    }

    #[tokio::test]
    async fn test_store_failure_is_500_without_details() {
        let mut state = state(ScriptedGenerator::always(sample_reply(10, "laag")));
        state.store = Arc::new(BrokenStore);

        let resp = post_json(state, "/api/schedules", request_body()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], GENERATION_FAILED);
        assert!(!json.to_string().contains("password authentication"));
    }

    #[tokio::test]
    async fn test_get_schedule_store_failure_hides_details() {
        let mut state = state(ScriptedGenerator::failing("unused"));
        state.store = Arc::new(BrokenStore);

        let resp = get_request(state, &format!("/api/schedules/{}", Uuid::new_v4())).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "internal server error");
        assert!(!json.to_string().contains("password authentication"));
    }

    #[tokio::test]
    async fn test_unusable_reply_is_500() {
        let state = state(ScriptedGenerator::always("I am just a language model."));

        let resp = post_json(state, "/api/schedules", request_body()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["success"], false);
    }

    #[tokio::test]
    async fn test_invalid_request_values_are_500() {
        let state = state(ScriptedGenerator::always(sample_reply(1, "easy")));
        let mut request = sample_request();
        request.training_weeks = 0;

        let resp = post_json(
            state,
            "/api/schedules",
            serde_json::to_string(&request).unwrap(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(
            json["error"],
            "invalid request: trainingWeeks must be at least 1"
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_client_error() {
        let state = state(ScriptedGenerator::always(sample_reply(1, "easy")));
        let resp = post_json(state, "/api/schedules", "{\"goal\": 5}".to_string()).await;
        assert!(resp.status().is_client_error(), "got {}", resp.status());
    }

    #[tokio::test]
    async fn test_get_schedule_not_found() {
        let state = state(ScriptedGenerator::failing("unused"));
        let resp = get_request(state, &format!("/api/schedules/{}", Uuid::new_v4())).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_list_methods() {
        let state = state(ScriptedGenerator::failing("unused"));
        let resp = get_request(state, "/api/methods").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let methods = json.as_array().unwrap();
        assert_eq!(methods.len(), 5);
        assert_eq!(methods[0]["identifier"], "Gebalanceerd");
        assert!(methods[0]["rules"].as_array().unwrap().len() >= 3);
    }
}
