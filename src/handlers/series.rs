use axum::{
    extract::{Query, State},
    Json,
};
use validator::Validate;

use crate::errors::AppError;
use crate::models::series::{SeriesQuery, SeriesSnapshot};
use crate::services::series::SeriesService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/series",
    params(SeriesQuery),
    responses(
        (status = 200, description = "Weekly bars for a ticker", body = SeriesSnapshot),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 502, description = "Market data unavailable", body = crate::errors::ErrorResponse)
    )
)]
pub async fn get_series(
    State(state): State<AppState>,
    Query(query): Query<SeriesQuery>,
) -> Result<Json<SeriesSnapshot>, AppError> {
    query
        .validate()
        .map_err(|err| AppError::Validation(err.to_string()))?;

    let service = SeriesService::new(state.scanner.provider().clone());
    let snapshot = service
        .fetch_snapshot(&query.ticker, query.lookback_years)
        .await?;

    Ok(Json(snapshot))
}
