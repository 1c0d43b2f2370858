use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::form::AppForm;
use crate::extractors::session::Session;
use crate::models::battle::BattleResponse;
use crate::models::vote::VoteForm;
use crate::recorder;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/vote",
    tag = "Votes",
    operation_id = "vote",
    summary = "Record a vote and get a replacement battle",
    description = "Records the session's judgement of a battle and returns one new battle from the same task, so the client's queue stays full. The body is `null` when nothing is left to annotate. Votes are stored with the two systems in a canonical order, so a battle can be voted once per session whichever side each output was shown on.",
    request_body(content = VoteForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Vote recorded; replacement battle or null", body = Option<BattleResponse>),
        (status = 400, description = "Malformed vote (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Anti-automation check failed (VERIFICATION_FAILED)", body = ErrorBody),
        (status = 409, description = "Battle already voted in this session (DUPLICATE_VOTE)", body = ErrorBody),
        (status = 422, description = "Prompt or outputs do not exist (UNKNOWN_REFERENCE)", body = ErrorBody),
        (status = 503, description = "Vote store unavailable (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(
    skip(state, session, form),
    fields(session_id = %session.id(), prompt_id = %form.prompt_id)
)]
pub async fn vote(
    State(state): State<AppState>,
    session: Session,
    AppForm(form): AppForm<VoteForm>,
) -> Result<Json<Option<BattleResponse>>, AppError> {
    let token = form.turnstile_token.clone();
    let (submission, ignored) = form.into_parts()?;

    if !state.verifier.verify(token.as_deref()).await {
        return Err(AppError::VerificationFailed);
    }

    let replacement = recorder::record_vote(
        &state.db,
        session.id(),
        submission,
        ignored,
        state.config.selection.randomize_sides,
    )
    .await?;

    Ok(Json(replacement.map(Into::into)))
}
