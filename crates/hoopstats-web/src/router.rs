use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::SharedState;

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/seasons", get(handlers::list_seasons))
        .route(
            "/api/seasons/{season}/points-per-game",
            get(handlers::points_per_game),
        )
        .route(
            "/api/seasons/{season}/threes-per-game",
            get(handlers::threes_per_game),
        )
        .route(
            "/api/trends/three-point-attempts",
            get(handlers::three_point_attempt_trend),
        )
        .route("/api/trends/statistics", get(handlers::trend_statistics))
        .route("/export.csv", get(handlers::export_csv))
        .with_state(state)
}
