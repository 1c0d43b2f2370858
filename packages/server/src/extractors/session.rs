use axum::extract::{FromRequestParts, Query, Request, State};
use axum::http::header::CACHE_CONTROL;
use axum::http::request::Parts;
use axum::http::{HeaderValue, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

const GENERATED_ID_LEN: usize = 100;

/// The anonymous annotator behind a request.
///
/// Resolved by [`session_layer`]; add this as a handler parameter to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session(pub String);

impl Session {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("Session middleware is not installed".into()))
    }
}

/// Query parameters the recruitment platform appends to study links.
#[derive(Deserialize)]
struct ProlificParams {
    #[serde(rename = "PROLIFIC_PID")]
    prolific_pid: Option<String>,
    #[serde(rename = "SESSION_ID")]
    session_id: Option<String>,
}

/// Pick the session id for a request: a recruited participant's study
/// identifiers win over the cookie, and a fresh id is minted otherwise.
fn resolve_session_id(uri: &Uri, cookie: Option<&str>) -> String {
    if let Ok(Query(params)) = Query::<ProlificParams>::try_from_uri(uri)
        && let (Some(pid), Some(sid)) = (params.prolific_pid, params.session_id)
        && !pid.is_empty()
        && !sid.is_empty()
    {
        return format!("prolific-id-{pid}-{sid}");
    }

    match cookie {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => generate_session_id(),
    }
}

fn generate_session_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_ID_LEN)
        .map(char::from)
        .collect()
}

/// Resolve the session of every request and keep the client's cookie fresh.
///
/// Responses must never be cached, since battles differ per session.
pub async fn session_layer(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let config = &state.config.session;
    let session_id = resolve_session_id(
        req.uri(),
        jar.get(&config.cookie_name).map(|c| c.value()),
    );

    req.extensions_mut().insert(Session(session_id.clone()));
    let mut response = next.run(req).await;

    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0, no-cache"));

    let cookie = Cookie::build((config.cookie_name.clone(), session_id))
        .path("/")
        .max_age(time::Duration::seconds(config.max_age_secs))
        .build();

    (jar.add(cookie), response).into_response()
}
