use axum::Json;
use axum::extract::{Query, State};
use common::Task;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::session::Session;
use crate::models::battle::{BattleQuery, BattleResponse};
use crate::selection;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/battles",
    tag = "Battles",
    operation_id = "listBattles",
    summary = "Get a batch of battles to annotate",
    description = "Returns up to one batch of battles for the task, least-covered systems and prompts first. Outputs the session already voted on are never returned. An empty array means there is nothing left to annotate.",
    params(BattleQuery),
    responses(
        (status = 200, description = "Battles, possibly none", body = Vec<BattleResponse>),
        (status = 400, description = "Malformed task (VALIDATION_ERROR)", body = ErrorBody),
        (status = 503, description = "Vote store unavailable (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, session, query), fields(session_id = %session.id(), task))]
pub async fn list_battles(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<BattleQuery>,
) -> Result<Json<Vec<BattleResponse>>, AppError> {
    let selection = &state.config.selection;

    let task = query
        .task
        .as_deref()
        .unwrap_or(&selection.default_task)
        .parse::<Task>()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    tracing::Span::current().record("task", task.as_str());

    let battles = selection::select_battles(
        &state.db,
        &task,
        session.id(),
        &Default::default(),
        selection.batch_size,
        selection.randomize_sides,
    )
    .await?;

    Ok(Json(battles.into_iter().map(Into::into).collect()))
}
