//! API route handlers for the gateway.
//!
//! Request and response field names stay in Spanish where the billing
//! frontend already depends on them.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

use cobranza_core::{Client, CobranzaError, MessageKind, SendMethod};
use cobranza_dispatch::normalize_phone;
use cobranza_ledger::{ExportFormat, QueryFilters};

use super::server::AppState;

fn error_response(e: &CobranzaError) -> (StatusCode, Json<Value>) {
    let status =
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({"success": false, "error": e.to_string()})),
    )
}

/// Service banner at the root path.
pub async fn service_banner() -> Json<Value> {
    Json(json!({
        "servicio": "Cobranza",
        "version": env!("CARGO_PKG_VERSION"),
        "descripcion": "Recordatorios de pago por transporte de chat",
        "endpoints": [
            "GET /status",
            "GET /qrcode",
            "POST /send-reminder",
            "POST /send-batch-reminders",
            "POST /test-number",
            "GET /notifications/history",
            "GET /notifications/stats",
            "GET /notifications/export",
            "DELETE /notifications/clear",
            "GET /dashboard",
        ],
    }))
}

/// Health check endpoint.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "cobranza-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Connection and quota status.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let session = state.session.snapshot().await;
    let mut quota = state.quota.lock().await;
    let snapshot = quota.snapshot();
    let remaining = quota.remaining();
    drop(quota);

    Json(json!({
        "connected": state.session.is_ready().await,
        "qrAvailable": session.pairing_code.is_some(),
        "lastConnection": session.last_connected_at.map(|t| t.to_rfc3339()),
        "stats": snapshot,
        "monthlyLimit": state.config.sending.monthly_limit,
        "remaining": remaining,
        "uptimeSecs": state.start_time.elapsed().as_secs(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Current pairing code, when the transport is waiting to be linked.
/// Always answers 200; the frontend polls this while linking.
pub async fn qrcode(State(state): State<Arc<AppState>>) -> Json<Value> {
    let session = state.session.snapshot().await;
    match session.pairing_code {
        Some(qr) => Json(json!({
            "qr": qr,
            "available": true,
            "message": "Código de vinculación disponible",
        })),
        None => Json(json!({
            "available": false,
            "connected": state.session.is_ready().await,
            "message": "Código de vinculación no disponible",
        })),
    }
}

#[derive(Deserialize)]
pub struct SendReminderRequest {
    pub cliente: Client,
    pub tipo: Option<String>,
    #[serde(rename = "mensajePersonalizado")]
    pub mensaje_personalizado: Option<String>,
}

/// Send one reminder to one client.
pub async fn send_reminder(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendReminderRequest>,
) -> (StatusCode, Json<Value>) {
    let kind = MessageKind::parse(req.tipo.as_deref().unwrap_or(""));
    match state
        .dispatcher
        .send_reminder(
            &req.cliente,
            kind,
            req.mensaje_personalizado.as_deref(),
            SendMethod::Primary,
        )
        .await
    {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "cliente": req.cliente.nombre,
                "mensajeId": outcome.message_id,
                "metodo": outcome.metodo,
                "tiempoMs": outcome.tiempo_ms,
                "timestamp": Utc::now().to_rfc3339(),
            })),
        ),
        Err(e) => error_response(&e),
    }
}

#[derive(Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub clientes: Vec<Client>,
    pub tipo: Option<String>,
    /// Inter-item delay override, in milliseconds.
    pub delay: Option<u64>,
}

/// Send reminders to a capped list of clients, sequentially.
pub async fn send_batch_reminders(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchRequest>,
) -> (StatusCode, Json<Value>) {
    let kind = MessageKind::parse(req.tipo.as_deref().unwrap_or(""));
    let delay = req.delay.map(Duration::from_millis);
    match state.batch.run(&req.clientes, kind, delay).await {
        Ok(report) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "total": report.total,
                "exitosos": report.exitosos,
                "fallidos": report.fallidos,
                "resultados": report.resultados,
                "stats": report.stats,
                "timestamp": Utc::now().to_rfc3339(),
            })),
        ),
        Err(e) => error_response(&e),
    }
}

#[derive(Deserialize)]
pub struct TestNumberRequest {
    #[serde(default)]
    pub telefono: String,
}

/// Check whether a phone number has an account, without sending.
pub async fn test_number(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TestNumberRequest>,
) -> (StatusCode, Json<Value>) {
    if req.telefono.trim().is_empty() {
        return error_response(&CobranzaError::Validation(
            "telefono es requerido".to_string(),
        ));
    }
    if !state.session.is_ready().await {
        return error_response(&CobranzaError::not_ready("transport no conectado"));
    }

    let address = normalize_phone(&req.telefono);
    match state.transport.is_registered(&address).await {
        Ok(registrado) => (
            StatusCode::OK,
            Json(json!({
                "telefono": req.telefono,
                "numeroFormateado": address,
                "registrado": registrado,
                "timestamp": Utc::now().to_rfc3339(),
            })),
        ),
        Err(e) => error_response(&e),
    }
}

#[derive(Deserialize, Default)]
pub struct HistoryParams {
    pub tipo: Option<String>,
    #[serde(rename = "fechaDesde")]
    pub desde: Option<DateTime<Utc>>,
    #[serde(rename = "fechaHasta")]
    pub hasta: Option<DateTime<Utc>>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// Paginated, filterable notification history, newest first.
pub async fn notifications_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> Json<Value> {
    let filters = QueryFilters {
        tipo: params.tipo.as_deref().map(MessageKind::parse),
        desde: params.desde,
        hasta: params.hasta,
    };
    let page = state.ledger.lock().await.query(
        &filters,
        params.page.unwrap_or(1),
        params.limit.unwrap_or(50),
    );
    Json(json!({
        "total": page.total,
        "page": page.page,
        "pages": page.pages,
        "notificaciones": page.items,
    }))
}

/// Aggregate notification statistics.
pub async fn notifications_stats(State(state): State<Arc<AppState>>) -> Json<Value> {
    let stats = state.ledger.lock().await.stats();
    Json(json!({
        "total": stats.total,
        "exitosos": stats.exitosos,
        "fallidos": stats.fallidos,
        "hoy": stats.hoy,
        "porTipo": stats.por_tipo,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[derive(Deserialize, Default)]
pub struct ExportParams {
    pub format: Option<String>,
}

/// Full history dump as a JSON or CSV download.
pub async fn notifications_export(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExportParams>,
) -> Response {
    let (format, content_type, filename) = match params.format.as_deref() {
        Some("csv") => (ExportFormat::Csv, "text/csv", "notificaciones.csv"),
        _ => (ExportFormat::Json, "application/json", "notificaciones.json"),
    };
    let body = state.ledger.lock().await.export(format);
    (
        StatusCode::OK,
        [
            ("Content-Type", content_type.to_string()),
            (
                "Content-Disposition",
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// Empty the notification history.
pub async fn notifications_clear(State(state): State<Arc<AppState>>) -> Json<Value> {
    state.ledger.lock().await.clear();
    tracing::info!("Notification history cleared");
    Json(json!({"success": true, "mensaje": "Historial eliminado"}))
}
