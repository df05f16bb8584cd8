mod business_logic;
mod config;
mod errors;
mod handlers;
mod models;
mod services;
mod state;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::business_logic::config::FlipConfig;
use crate::config::AppConfig;
use crate::handlers::flips::{get_flips, get_flips_stream};
use crate::handlers::scan::{get_scan_progress, post_scan, post_scan_stop};
use crate::handlers::series::get_series;
use crate::services::indicators::SeriesIndicators;
use crate::services::monitor::MonitorService;
use crate::services::scan_state::ScanStateInner;
use crate::services::scanner::FlipScanner;
use crate::services::universe::{ConstituentsUniverse, StaticUniverse, TickerUniverse};
use crate::services::yahoo::YahooClient;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::flips::get_flips,
        handlers::flips::get_flips_stream,
        handlers::scan::post_scan,
        handlers::scan::post_scan_stop,
        handlers::scan::get_scan_progress,
        handlers::series::get_series
    ),
    components(schemas(
        handlers::health::HealthResponse,
        handlers::scan::StopResponse,
        models::scan::ScanReport,
        models::scan::ScanRequest,
        models::scan::ScanProgress,
        models::series::SeriesSnapshot,
        errors::ErrorResponse
    ))
)]
struct ApiDoc;

fn init_tracing(log_dir: Option<&str>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "flipscreener.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flipscreener=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = AppConfig::from_env();
    let _log_guard = init_tracing(app_config.log_dir.as_deref());

    let universe: Arc<dyn TickerUniverse> = if app_config.tickers.is_empty() {
        Arc::new(ConstituentsUniverse::new(
            app_config.universe_url.clone(),
            app_config.fetch_timeout,
        )?)
    } else {
        tracing::info!("Using {} configured tickers", app_config.tickers.len());
        Arc::new(StaticUniverse::new(app_config.tickers.clone()))
    };

    let yahoo = YahooClient::new(app_config.fetch_timeout)?;
    let scanner = FlipScanner::new(Arc::new(yahoo), app_config.max_concurrency)
        .with_indicators(Arc::new(SeriesIndicators));
    let scan_state = Arc::new(ScanStateInner::new(16));
    let defaults = FlipConfig::default();

    // Scheduled universe scans in background
    let mut monitor = MonitorService::new(
        scanner.clone(),
        universe.clone(),
        defaults.clone(),
        app_config.lookback_years,
        app_config.scan_interval,
        scan_state.clone(),
    );
    let scan_interval = app_config.scan_interval;
    tokio::spawn(async move {
        tracing::info!(
            "Resistance flip monitoring active, scanning every {}s",
            scan_interval.as_secs()
        );
        monitor.run().await;
    });

    let app_state = AppState {
        scan_state,
        scanner,
        universe,
        defaults,
        lookback_years: app_config.lookback_years,
    };

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/flips", get(get_flips))
        .route("/flips/stream", get(get_flips_stream))
        .route("/scan", post(post_scan))
        .route("/scan/stop", post(post_scan_stop))
        .route("/scan/progress", get(get_scan_progress))
        .route("/series", get(get_series))
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&app_config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", app_config.bind_addr))?;
    tracing::info!("Server running on http://{}", app_config.bind_addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui", app_config.bind_addr);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
