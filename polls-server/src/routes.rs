//! HTTP route handlers for the poll API.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use polls::core::ids::share_url;
use polls::io::export::{export_file_name, write_responses_csv};
use polls::io::seed::PollDefinition;
use polls::model::{Poll, PollDraft, PollResults, PollSummary, SeedReport, SubmitOutcome};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::{AppState, ChangeEvent};

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/polls", get(list_polls).post(create_poll))
        .route("/polls/{id}", get(get_poll).delete(delete_poll))
        .route("/polls/{id}/clear", post(clear_responses))
        .route("/polls/{id}/responses", post(submit_response))
        .route("/polls/{id}/results", get(get_results))
        .route("/polls/{id}/share", get(share_link))
        .route("/polls/{id}/export.csv", get(export_csv))
        .route("/import", post(import_polls))
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
pub struct VoteQuery {
    vote: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Landing {
    Vote(Poll),
    Polls(Vec<PollSummary>),
}

/// GET /?vote=<id> - target of share links; without `vote`, the poll list.
pub async fn landing(
    State(state): State<AppState>,
    Query(query): Query<VoteQuery>,
) -> Result<Json<Landing>, ApiError> {
    match query.vote {
        Some(id) => {
            let poll = state.run(move |service| service.get_poll(&id)).await?;
            Ok(Json(Landing::Vote(poll)))
        }
        None => {
            let polls = state.run(|service| Ok(service.list_polls())).await?;
            Ok(Json(Landing::Polls(polls)))
        }
    }
}

/// GET /api/polls - every poll with its response count.
async fn list_polls(State(state): State<AppState>) -> Result<Json<Vec<PollSummary>>, ApiError> {
    let polls = state.run(|service| Ok(service.list_polls())).await?;
    Ok(Json(polls))
}

/// POST /api/polls - create (or replace) a poll.
async fn create_poll(
    State(state): State<AppState>,
    Json(draft): Json<PollDraft>,
) -> Result<(StatusCode, Json<Poll>), ApiError> {
    let poll = state.run(move |service| service.create_poll(&draft)).await?;
    state.notify(ChangeEvent::PollCreated {
        poll_id: poll.id.clone(),
    });
    Ok((StatusCode::CREATED, Json(poll)))
}

/// GET /api/polls/{id}
async fn get_poll(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Poll>, ApiError> {
    let poll = state.run(move |service| service.get_poll(&id)).await?;
    Ok(Json(poll))
}

/// DELETE /api/polls/{id} - remove the poll and its responses.
async fn delete_poll(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let poll_id = id.clone();
    state.run(move |service| service.delete_poll(&id)).await?;
    state.notify(ChangeEvent::PollDeleted { poll_id });
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/polls/{id}/clear - drop every response, keep the poll.
async fn clear_responses(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let poll_id = id.clone();
    state.run(move |service| service.clear_responses(&id)).await?;
    state.notify(ChangeEvent::ResponsesCleared { poll_id });
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitReply {
    pub outcome: SubmitOutcome,
}

/// POST /api/polls/{id}/responses - record one vote.
async fn submit_response(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitReply>), ApiError> {
    let poll_id = id.clone();
    let outcome = state
        .run(move |service| service.submit_response(&id, &request.response))
        .await?;
    state.notify(ChangeEvent::ResponseSubmitted { poll_id });
    Ok((StatusCode::CREATED, Json(SubmitReply { outcome })))
}

/// GET /api/polls/{id}/results - tally, total, and percentages.
async fn get_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PollResults>, ApiError> {
    let results = state.run(move |service| service.get_results(&id)).await?;
    Ok(Json(results))
}

#[derive(Debug, Serialize)]
pub struct ShareLink {
    pub url: String,
}

/// GET /api/polls/{id}/share - voting link (what a QR code should encode).
async fn share_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ShareLink>, ApiError> {
    let poll = state.run(move |service| service.get_poll(&id)).await?;
    Ok(Json(ShareLink {
        url: share_url(&state.base_url, &poll.id),
    }))
}

/// GET /api/polls/{id}/export.csv - responses as a CSV download.
async fn export_csv(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let file_name = export_file_name(&id, chrono::Utc::now().date_naive());
    let body = state
        .run(move |service| {
            let responses = service.responses(&id)?;
            let mut buf = Vec::new();
            write_responses_csv(&mut buf, &responses)?;
            Ok(buf)
        })
        .await?;
    debug!(file = %file_name, bytes = body.len(), "csv export");
    let disposition = format!("attachment; filename=\"{file_name}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// POST /api/import - bulk create from definitions, skipping existing ids.
async fn import_polls(
    State(state): State<AppState>,
    Json(definitions): Json<Vec<PollDefinition>>,
) -> Result<Json<SeedReport>, ApiError> {
    let report = state.run(move |service| service.seed_from_config(&definitions)).await?;
    if !report.created.is_empty() {
        state.notify(ChangeEvent::PollsSeeded {
            poll_ids: report.created.clone(),
        });
    }
    Ok(Json(report))
}
