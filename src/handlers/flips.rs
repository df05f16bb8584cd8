use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::StreamExt;

use crate::errors::AppError;
use crate::models::scan::ScanReport;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/flips",
    responses(
        (status = 200, description = "Report of the last completed scan", body = ScanReport)
    )
)]
pub async fn get_flips(State(state): State<AppState>) -> Result<Json<ScanReport>, AppError> {
    let report = state.scan_state.latest.read().await.clone();
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/flips/stream",
    responses(
        (status = 200, description = "SSE stream of scan reports", content_type = "text/event-stream")
    )
)]
pub async fn get_flips_stream(
    State(state): State<AppState>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    let initial_report = state.scan_state.latest.read().await.clone();
    let initial_events = match report_event(&initial_report) {
        Some(event) => vec![Ok(event)],
        None => Vec::new(),
    };
    let initial_stream = tokio_stream::iter(initial_events);

    let rx = state.scan_state.broadcaster.subscribe();
    let broadcast_stream = BroadcastStream::new(rx).filter_map(|message| match message {
        Ok(report) => report_event(&report).map(Ok),
        Err(BroadcastStreamRecvError::Lagged(_)) => None,
    });

    let stream = initial_stream.chain(broadcast_stream);

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

fn report_event(report: &ScanReport) -> Option<Event> {
    let data = serde_json::to_string(report).ok()?;
    let mut event = Event::default().event("report").data(data);
    if let Some(as_of) = report.as_of {
        event = event.id(as_of.to_string());
    }
    Some(event)
}
