//! HTTP server implementation using Axum.

use std::sync::Arc;

use axum::response::Html;
use axum::{
    Router,
    routing::{delete, get, post},
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use cobranza_core::config::CobranzaConfig;
use cobranza_dispatch::{BatchScheduler, Dispatcher, QuotaTracker};
use cobranza_ledger::NotificationLog;
use cobranza_transport::{SessionManager, Transport};

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub config: CobranzaConfig,
    pub session: Arc<SessionManager>,
    pub transport: Arc<dyn Transport>,
    pub dispatcher: Arc<Dispatcher>,
    pub batch: Arc<BatchScheduler>,
    pub ledger: Arc<Mutex<NotificationLog>>,
    pub quota: Arc<Mutex<QuotaTracker>>,
    pub start_time: std::time::Instant,
}

/// Serve the dashboard HTML page.
async fn dashboard_page() -> Html<&'static str> {
    Html(super::dashboard::dashboard_html())
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let shared = Arc::new(state);

    Router::new()
        .route("/", get(super::routes::service_banner))
        .route("/health", get(super::routes::health_check))
        .route("/status", get(super::routes::status))
        .route("/qrcode", get(super::routes::qrcode))
        .route("/send-reminder", post(super::routes::send_reminder))
        .route(
            "/send-batch-reminders",
            post(super::routes::send_batch_reminders),
        )
        .route("/test-number", post(super::routes::test_number))
        .route(
            "/notifications/history",
            get(super::routes::notifications_history),
        )
        .route(
            "/notifications/stats",
            get(super::routes::notifications_stats),
        )
        .route(
            "/notifications/export",
            get(super::routes::notifications_export),
        )
        .route(
            "/notifications/clear",
            delete(super::routes::notifications_clear),
        )
        .route("/dashboard", get(dashboard_page))
        .layer(
            CorsLayer::new()
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(Any)
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Start the HTTP server.
pub async fn start(state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.gateway.host, state.config.gateway.port);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Gateway listening on http://{addr}");
    tracing::info!("Dashboard available at http://{addr}/dashboard");

    axum::serve(listener, app).await?;
    Ok(())
}
