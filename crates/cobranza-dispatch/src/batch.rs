//! Sequential rate-limited batch sends.
//!
//! A batch is capped, paced with a fixed inter-item delay, and strictly
//! sequential. Individual failures are captured per item and never stop
//! the run; only the whole-batch preconditions fail fast.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;

use cobranza_core::{Client, CobranzaError, MessageKind, Result, SendMethod};

use crate::dispatcher::Dispatcher;
use crate::quota::{QuotaSnapshot, QuotaTracker};

/// Outcome of one item in a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItemResult {
    pub cliente: String,
    pub telefono: String,
    pub exito: bool,
    #[serde(rename = "mensajeId", skip_serializing_if = "Option::is_none")]
    pub mensaje_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of a finished batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub exitosos: usize,
    pub fallidos: usize,
    pub resultados: Vec<BatchItemResult>,
    pub stats: QuotaSnapshot,
}

pub struct BatchScheduler {
    dispatcher: Arc<Dispatcher>,
    quota: Arc<Mutex<QuotaTracker>>,
    batch_cap: usize,
    default_delay: Duration,
}

impl BatchScheduler {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        quota: Arc<Mutex<QuotaTracker>>,
        batch_cap: usize,
        default_delay: Duration,
    ) -> Self {
        Self {
            dispatcher,
            quota,
            batch_cap,
            default_delay,
        }
    }

    /// Run one batch. Attempts `min(clientes.len(), batch_cap)` items in
    /// order, sleeping the inter-item delay before every item after the
    /// first. Failed items are reported in place; the run keeps going.
    pub async fn run(
        &self,
        clientes: &[Client],
        kind: MessageKind,
        delay: Option<Duration>,
    ) -> Result<BatchReport> {
        if clientes.is_empty() {
            return Err(CobranzaError::Validation(
                "Lista de clientes vacía".to_string(),
            ));
        }
        if !self.dispatcher.is_ready().await {
            return Err(CobranzaError::not_ready("transport no conectado"));
        }

        let delay = delay.unwrap_or(self.default_delay);
        let batch = &clientes[..clientes.len().min(self.batch_cap)];
        if batch.len() < clientes.len() {
            tracing::warn!(
                "Batch truncated to {} of {} clients",
                batch.len(),
                clientes.len()
            );
        }
        tracing::info!("Batch of {} {} reminders starting", batch.len(), kind);

        let mut resultados = Vec::with_capacity(batch.len());
        for (i, client) in batch.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(delay).await;
            }
            let item = match self
                .dispatcher
                .send_reminder(client, kind, None, SendMethod::Batch)
                .await
            {
                Ok(outcome) => BatchItemResult {
                    cliente: client.nombre.clone(),
                    telefono: client.telefono.clone(),
                    exito: true,
                    mensaje_id: Some(outcome.message_id),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!("Batch item failed for {}: {e}", client.nombre);
                    BatchItemResult {
                        cliente: client.nombre.clone(),
                        telefono: client.telefono.clone(),
                        exito: false,
                        mensaje_id: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            resultados.push(item);
        }

        let exitosos = resultados.iter().filter(|r| r.exito).count();
        let report = BatchReport {
            total: resultados.len(),
            exitosos,
            fallidos: resultados.len() - exitosos,
            resultados,
            stats: self.quota.lock().await.snapshot(),
        };
        tracing::info!(
            "Batch finished: {} ok, {} failed",
            report.exitosos,
            report.fallidos
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobranza_ledger::NotificationLog;
    use cobranza_transport::{MockTransport, SessionManager, TransportEvent};
    use std::time::Instant;

    fn clients(n: usize) -> Vec<Client> {
        (0..n)
            .map(|i| Client {
                nombre: format!("Cliente {i}"),
                telefono: format!("55123456{i:02}"),
                saldo: Some(-150.0),
                vencimiento: None,
                dias_vencido: None,
            })
            .collect()
    }

    async fn scheduler(name: &str, delay_ms: u64) -> (BatchScheduler, Arc<MockTransport>, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(name);
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).ok();
        let transport = Arc::new(MockTransport::new());
        let session = SessionManager::new(transport.clone(), Duration::from_millis(50));
        session.start().await.unwrap();
        transport.emit(TransportEvent::Open).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let ledger = Arc::new(Mutex::new(NotificationLog::open(&dir, 1000)));
        let quota = Arc::new(Mutex::new(QuotaTracker::new(1500)));
        let dispatcher = Arc::new(Dispatcher::new(
            transport.clone(),
            session,
            ledger,
            quota.clone(),
            200,
        ));
        (
            BatchScheduler::new(dispatcher, quota, 30, Duration::from_millis(delay_ms)),
            transport,
            dir,
        )
    }

    #[tokio::test]
    async fn test_empty_batch_fails_fast() {
        let (scheduler, _transport, dir) = scheduler("cobranza-batch-empty", 0).await;
        let err = scheduler
            .run(&[], MessageKind::FirstReminder, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CobranzaError::Validation(_)));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_batch_caps_at_thirty() {
        let (scheduler, transport, dir) = scheduler("cobranza-batch-cap", 0).await;
        let report = scheduler
            .run(&clients(35), MessageKind::FirstReminder, None)
            .await
            .unwrap();
        assert_eq!(report.total, 30);
        assert_eq!(report.exitosos, 30);
        assert_eq!(transport.sent().len(), 30);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_batch_paces_between_items() {
        let (scheduler, _transport, dir) = scheduler("cobranza-batch-pace", 20).await;
        let started = Instant::now();
        let report = scheduler
            .run(&clients(3), MessageKind::FirstReminder, None)
            .await
            .unwrap();
        assert_eq!(report.exitosos, 3);
        // two inter-item gaps of ≥20ms each
        assert!(started.elapsed() >= Duration::from_millis(40));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_item_failure_does_not_stop_the_run() {
        let (scheduler, transport, dir) = scheduler("cobranza-batch-isolate", 0).await;
        transport.fail_next_send("socket hang up");
        let report = scheduler
            .run(&clients(3), MessageKind::FirstReminder, None)
            .await
            .unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.exitosos, 2);
        assert_eq!(report.fallidos, 1);
        assert!(!report.resultados[0].exito);
        assert!(report.resultados[0].error.as_deref().unwrap().contains("socket hang up"));
        assert!(report.resultados[1].exito);
        assert!(report.resultados[2].exito);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_delay_override_wins() {
        let (scheduler, _transport, dir) = scheduler("cobranza-batch-override", 500).await;
        let started = Instant::now();
        scheduler
            .run(&clients(2), MessageKind::FirstReminder, Some(Duration::ZERO))
            .await
            .unwrap();
        // override of zero beats the 500ms default
        assert!(started.elapsed() < Duration::from_millis(400));
        std::fs::remove_dir_all(&dir).ok();
    }
}
