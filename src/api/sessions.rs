use chrono::{DateTime, Utc};
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{get, post, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::ApiResponse;
use crate::models::{Business, SearchQuery};
use crate::scraper::{run_session, MapsClient, PacingPolicy};
use crate::server::ServerState;
use crate::session::state::{SessionStatus, SessionSummary};

type ApiResult<T> = status::Custom<Json<ApiResponse<T>>>;

fn ok<T>(data: T) -> ApiResult<T> {
    status::Custom(Status::Ok, Json(ApiResponse::success(data)))
}

fn err<T>(code: Status, message: String) -> ApiResult<T> {
    status::Custom(code, Json(ApiResponse::error(message)))
}

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub keywords: String,
    pub location: String,
    pub max_results: usize,
}

#[derive(Serialize)]
pub struct StartScrapeResponse {
    pub session_id: Uuid,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ProgressResponse {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub completed: usize,
    pub total: usize,
    pub progress_percentage: f64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct ResultsResponse {
    pub session_id: Uuid,
    pub keywords: String,
    pub location: String,
    pub status: SessionStatus,
    pub total_results: usize,
    pub results: Vec<Business>,
}

#[derive(Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

#[post("/scrape", data = "<request>")]
pub async fn start_scrape(
    state: &State<ServerState>,
    request: Json<ScrapeRequest>,
) -> ApiResult<StartScrapeResponse> {
    let request = request.into_inner();
    let query = SearchQuery {
        keywords: request.keywords.trim().to_string(),
        location: request.location.trim().to_string(),
        max_results: request.max_results,
    };

    // Bad input never creates a session.
    if let Err(reason) = query.validate() {
        return err(Status::BadRequest, reason);
    }

    let session_id = state.registry.create(query).await;

    let source = MapsClient::new(&state.config.scraping);
    let pacing = PacingPolicy::from_config(&state.config.scraping);
    let registry = state.registry.clone();
    let max_retries = state.config.scraping.max_item_retries;
    tokio::spawn(run_session(registry, session_id, source, pacing, max_retries));

    ok(StartScrapeResponse {
        session_id,
        status: "started",
    })
}

#[get("/progress/<session_id>")]
pub async fn get_progress(
    state: &State<ServerState>,
    session_id: Uuid,
) -> ApiResult<ProgressResponse> {
    let Some(snapshot) = state.registry.snapshot(&session_id).await else {
        return err(Status::NotFound, "Session not found".to_string());
    };

    ok(ProgressResponse {
        session_id,
        status: snapshot.status,
        completed: snapshot.completed,
        total: snapshot.total,
        progress_percentage: snapshot.progress_percentage(),
        error_message: snapshot.error_message.clone(),
        created_at: snapshot.created_at,
        completed_at: snapshot.completed_at,
    })
}

#[get("/results/<session_id>")]
pub async fn get_results(
    state: &State<ServerState>,
    session_id: Uuid,
) -> ApiResult<ResultsResponse> {
    let Some(snapshot) = state.registry.snapshot(&session_id).await else {
        return err(Status::NotFound, "Session not found".to_string());
    };

    // Error and cancelled sessions still serve their partial record sets.
    if !snapshot.status.is_terminal() {
        return err(
            Status::Conflict,
            format!("Extraction not finished yet (status: {})", snapshot.status),
        );
    }

    ok(ResultsResponse {
        session_id,
        keywords: snapshot.query.keywords.clone(),
        location: snapshot.query.location.clone(),
        status: snapshot.status,
        total_results: snapshot.records.len(),
        results: snapshot.records,
    })
}

#[get("/sessions")]
pub async fn list_sessions(state: &State<ServerState>) -> ApiResult<SessionsResponse> {
    ok(SessionsResponse {
        sessions: state.registry.list().await,
    })
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub session_id: Uuid,
    pub status: &'static str,
}

#[post("/cancel/<session_id>")]
pub async fn cancel_session(
    state: &State<ServerState>,
    session_id: Uuid,
) -> ApiResult<CancelResponse> {
    match state.registry.request_cancel(&session_id).await {
        None => err(Status::NotFound, "Session not found".to_string()),
        Some(false) => err(
            Status::Conflict,
            "Session already finished".to_string(),
        ),
        Some(true) => ok(CancelResponse {
            session_id,
            status: "cancellation_requested",
        }),
    }
}
