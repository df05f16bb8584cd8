use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::AppError;
use crate::models::scan::{ScanProgress, ScanReport, ScanRequest};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct StopResponse {
    /// Whether any running scan was signalled
    pub stopped: bool,
}

#[utoipa::path(
    post,
    path = "/scan",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Ranked flip matches for the requested tickers", body = ScanReport),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 502, description = "Ticker universe unavailable", body = crate::errors::ErrorResponse)
    )
)]
pub async fn post_scan(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<ScanReport>, AppError> {
    request
        .validate()
        .map_err(|err| AppError::Validation(err.to_string()))?;

    let config = request.flip_config(&state.defaults);
    let lookback_years = request.lookback_years.unwrap_or(state.lookback_years);
    let tickers = match &request.tickers {
        Some(tickers) => tickers
            .iter()
            .map(|ticker| ticker.trim().to_uppercase())
            .collect(),
        None => state.universe.get_tickers().await?,
    };

    let (handle, signal) = state.scan_state.begin_scan().await;
    let report = state
        .scanner
        .scan(tickers, lookback_years, &config, signal, None)
        .await;
    state.scan_state.end_scan(&handle).await;

    Ok(Json(report))
}

#[utoipa::path(
    post,
    path = "/scan/stop",
    responses(
        (status = 200, description = "Stop every running scan, keeping matches found so far", body = StopResponse)
    )
)]
pub async fn post_scan_stop(State(state): State<AppState>) -> Result<Json<StopResponse>, AppError> {
    let stopped = state.scan_state.stop_active().await;
    if stopped {
        tracing::info!("Stop requested for running scans");
    }
    Ok(Json(StopResponse { stopped }))
}

#[utoipa::path(
    get,
    path = "/scan/progress",
    responses(
        (status = 200, description = "Progress of the scheduled scan", body = ScanProgress)
    )
)]
pub async fn get_scan_progress(State(state): State<AppState>) -> Json<ScanProgress> {
    Json(*state.scan_state.progress.borrow())
}
