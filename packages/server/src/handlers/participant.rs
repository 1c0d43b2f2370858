use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::form::AppForm;
use crate::extractors::session::Session;
use crate::models::participant::FinishForm;
use crate::participants;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/prolific-consent",
    tag = "Participants",
    operation_id = "prolificConsent",
    summary = "Record study consent",
    description = "Stores the consent time of the current session. Repeated calls keep the first time.",
    responses(
        (status = 204, description = "Consent recorded"),
        (status = 503, description = "Vote store unavailable (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, session), fields(session_id = %session.id()))]
pub async fn prolific_consent(
    State(state): State<AppState>,
    session: Session,
) -> Result<StatusCode, AppError> {
    participants::record_consent(&state.db, session.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/prolific-finish",
    tag = "Participants",
    operation_id = "prolificFinish",
    summary = "Finish the study",
    description = "Stores the finish time and comments of the current session, then sends the participant back to the recruitment platform.",
    request_body(content = FinishForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to the study completion page"),
        (status = 204, description = "Recorded; no completion page configured"),
        (status = 400, description = "Malformed form (VALIDATION_ERROR)", body = ErrorBody),
        (status = 503, description = "Vote store unavailable (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, session, form), fields(session_id = %session.id()))]
pub async fn prolific_finish(
    State(state): State<AppState>,
    session: Session,
    AppForm(form): AppForm<FinishForm>,
) -> Result<Response, AppError> {
    participants::record_finish(&state.db, session.id(), &form.comments).await?;
    info!("Participant finished the study");

    Ok(match &state.config.prolific.completion_url {
        Some(url) => Redirect::to(url).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}
