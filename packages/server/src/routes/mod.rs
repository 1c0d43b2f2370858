use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::battle::list_battles))
        .routes(routes!(handlers::vote::vote))
        .merge(stats_routes())
        .merge(participant_routes())
}

fn stats_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::stats::session_vote_count))
        .routes(routes!(handlers::stats::vote_count))
        .routes(routes!(handlers::stats::votes_per_session))
        .routes(routes!(handlers::stats::stats))
        .routes(routes!(handlers::stats::system_vote_counts))
        .routes(routes!(handlers::stats::votes_csv))
}

fn participant_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::participant::prolific_consent))
        .routes(routes!(handlers::participant::prolific_finish))
}
