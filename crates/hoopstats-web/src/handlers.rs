// HTTP handlers. Every handler reads the shared, already-built state.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use hoopstats_core::analytics::{self, SeasonTrendStats};
use hoopstats_core::export::{self, ExportError};
use hoopstats_core::season::Season;

use crate::charts::{self, BarChart, TrendChart};
use crate::page;
use crate::state::SharedState;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("{self}");
        let (status, message) = match self {
            ApiError::Export(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Export failed"),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct SeasonsResponse {
    pub seasons: Vec<Season>,
    pub default: Option<Season>,
}

pub async fn index(State(state): State<SharedState>) -> Html<String> {
    Html(page::render_dashboard(state.title()))
}

pub async fn list_seasons(State(state): State<SharedState>) -> Json<SeasonsResponse> {
    Json(SeasonsResponse {
        seasons: state.seasons().to_vec(),
        default: state.default_season(),
    })
}

pub async fn points_per_game(
    State(state): State<SharedState>,
    Path(season): Path<String>,
) -> Json<BarChart> {
    Json(charts::points_per_game(state.table(), &season))
}

pub async fn threes_per_game(
    State(state): State<SharedState>,
    Path(season): Path<String>,
) -> Json<BarChart> {
    Json(charts::threes_per_game(state.table(), &season))
}

pub async fn three_point_attempt_trend(State(state): State<SharedState>) -> Json<TrendChart> {
    Json(charts::three_point_attempt_trend(state.table()))
}

pub async fn trend_statistics(State(state): State<SharedState>) -> Json<Vec<SeasonTrendStats>> {
    Json(analytics::trend_statistics(state.table()))
}

/// The whole combined table as a CSV attachment.
pub async fn export_csv(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let body = export::to_csv_bytes(state.table())?;
    info!(
        "Exporting {} rows as {}",
        state.table().len(),
        state.export_filename()
    );
    let disposition = format!(
        "attachment; filename=\"{}\"",
        state.export_filename().replace('"', "")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
