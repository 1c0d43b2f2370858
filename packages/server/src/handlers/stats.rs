use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use common::Task;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::session::Session;
use crate::ledger;
use crate::models::stats::{StatsResponse, SystemVoteCountsQuery};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/session-vote-count",
    tag = "Stats",
    operation_id = "sessionVoteCount",
    summary = "Votes cast by the current session",
    description = "Counts the non-skip votes of the current session across all tasks. Used for participant quota displays.",
    responses(
        (status = 200, description = "Vote count", body = u64),
        (status = 503, description = "Vote store unavailable (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, session), fields(session_id = %session.id()))]
pub async fn session_vote_count(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<u64>, AppError> {
    Ok(Json(ledger::session_vote_count(&state.db, session.id()).await?))
}

#[utoipa::path(
    get,
    path = "/vote-count",
    tag = "Stats",
    operation_id = "voteCount",
    summary = "Total non-skip votes",
    responses(
        (status = 200, description = "Vote count", body = u64),
        (status = 503, description = "Vote store unavailable (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn vote_count(State(state): State<AppState>) -> Result<Json<u64>, AppError> {
    Ok(Json(ledger::vote_count(&state.db, true).await?))
}

#[utoipa::path(
    get,
    path = "/votes-per-session",
    tag = "Stats",
    operation_id = "votesPerSession",
    summary = "Non-skip votes per session",
    responses(
        (status = 200, description = "Session id to vote count", body = BTreeMap<String, u64>),
        (status = 503, description = "Vote store unavailable (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn votes_per_session(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, u64>>, AppError> {
    Ok(Json(ledger::votes_per_session(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Stats",
    operation_id = "stats",
    summary = "Ledger overview",
    description = "Vote and session totals with and without skips, the distribution of votes over prompts and the votes per value.",
    responses(
        (status = 200, description = "Ledger statistics", body = StatsResponse),
        (status = 503, description = "Vote store unavailable (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let db = &state.db;
    let (votes, sessions, votes_without_skips, sessions_without_skips, histogram, per_category) = tokio::try_join!(
        ledger::vote_count(db, false),
        ledger::session_count(db, false),
        ledger::vote_count(db, true),
        ledger::session_count(db, true),
        ledger::prompt_vote_histogram(db),
        ledger::votes_per_category(db),
    )?;

    Ok(Json(StatsResponse {
        votes,
        sessions,
        votes_without_skips,
        sessions_without_skips,
        histogram: histogram
            .into_iter()
            .map(|(votes, prompts)| [votes, prompts])
            .collect(),
        votes_per_category: per_category,
    }))
}

#[utoipa::path(
    get,
    path = "/systems/vote-counts",
    tag = "Stats",
    operation_id = "systemVoteCounts",
    summary = "Non-skip votes per system in a task",
    description = "Every system with an output in the task is listed, unvoted ones with zero. These are the counts battle selection balances.",
    params(SystemVoteCountsQuery),
    responses(
        (status = 200, description = "System id to vote count", body = BTreeMap<String, u64>),
        (status = 400, description = "Malformed task (VALIDATION_ERROR)", body = ErrorBody),
        (status = 503, description = "Vote store unavailable (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(task = %query.task))]
pub async fn system_vote_counts(
    State(state): State<AppState>,
    Query(query): Query<SystemVoteCountsQuery>,
) -> Result<Json<BTreeMap<String, u64>>, AppError> {
    let task = query
        .task
        .parse::<Task>()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    Ok(Json(ledger::votes_per_system(&state.db, &task, &[]).await?))
}

#[utoipa::path(
    get,
    path = "/votes.csv",
    tag = "Stats",
    operation_id = "votesCsv",
    summary = "Download the vote ledger",
    description = "Every vote, skips included, with its prompt and both output texts. Ordered by session, then by date.",
    responses(
        (status = 200, description = "CSV with a header line", content_type = "text/csv", body = String),
        (status = 503, description = "Vote store unavailable (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn votes_csv(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows = ledger::vote_dump(&state.db).await?;
    let body = ledger::write_vote_dump_csv(&rows)
        .map_err(|e| AppError::Internal(format!("Failed to write votes CSV: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=votes.csv"),
        ],
        body,
    ))
}
