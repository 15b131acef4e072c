//! Send-one dispatcher.
//!
//! Runs the full contract for a single reminder: validate, gate on
//! session readiness, normalize and render, check registration, then
//! walk the ordered strategy chain — primary send first, deep-link
//! fallback only when the primary failure text matches a known
//! transient-anomaly marker. Every attempted send is recorded in the
//! ledger before the call returns, success or failure.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use cobranza_core::{Client, CobranzaError, MessageKind, Result, SendMethod};
use cobranza_ledger::{NotificationLog, RecordDraft};
use cobranza_transport::{SessionManager, Transport};

use crate::phone::normalize_phone;
use crate::quota::QuotaTracker;
use crate::templates::render_message;

/// Error-text markers for recoverable transport anomalies. Matched
/// case-insensitively as substrings; anything else skips the fallback.
const TRANSIENT_MARKERS: &[&str] = &[
    "markedunread",
    "cannot read properties of undefined",
    "chat not found",
    "execution context was destroyed",
];

/// Whether an error text names a transient anomaly worth a fallback try.
pub fn is_transient(error_text: &str) -> bool {
    let lower = error_text.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|m| lower.contains(m))
}

/// Result of a dispatched send.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub message_id: String,
    pub metodo: SendMethod,
    pub tiempo_ms: u64,
}

pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    session: Arc<SessionManager>,
    ledger: Arc<Mutex<NotificationLog>>,
    quota: Arc<Mutex<QuotaTracker>>,
    excerpt_len: usize,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<SessionManager>,
        ledger: Arc<Mutex<NotificationLog>>,
        quota: Arc<Mutex<QuotaTracker>>,
        excerpt_len: usize,
    ) -> Self {
        Self {
            transport,
            session,
            ledger,
            quota,
            excerpt_len,
        }
    }

    /// Readiness gate, re-checked by callers per item.
    pub async fn is_ready(&self) -> bool {
        self.session.is_ready().await
    }

    /// Send one reminder. `via` labels the record when the primary path
    /// delivers (`Primary` for direct calls, `Batch` inside a batch); a
    /// fallback delivery is always labeled `Fallback`.
    pub async fn send_reminder(
        &self,
        client: &Client,
        kind: MessageKind,
        override_text: Option<&str>,
        via: SendMethod,
    ) -> Result<DispatchOutcome> {
        let missing = client.missing_fields();
        if !missing.is_empty() {
            return Err(CobranzaError::Validation(format!(
                "Datos incompletos: {}",
                missing.join(", ")
            )));
        }

        if !self.session.is_ready().await {
            return Err(CobranzaError::not_ready("transport no conectado"));
        }

        let started = Instant::now();
        let address = normalize_phone(&client.telefono);
        let text = render_message(kind, client, override_text);

        // Unregistered addresses short-circuit: no send, no fallback.
        match self.transport.is_registered(&address).await {
            Ok(false) => {
                let err = CobranzaError::NotRegistered(format!(
                    "{} no tiene cuenta en el transporte",
                    client.telefono
                ));
                self.record(client, kind, &text, Err(&err), via, started)
                    .await;
                return Err(err);
            }
            Ok(true) => {}
            Err(e) => {
                // The check itself failing is not a verdict — proceed.
                tracing::warn!("Registration check failed for {}: {e}", client.telefono);
            }
        }

        match self.transport.send_message(&address, &text).await {
            Ok(sent) => {
                self.record(client, kind, &text, Ok(()), via, started).await;
                Ok(DispatchOutcome {
                    message_id: sent.id,
                    metodo: via,
                    tiempo_ms: started.elapsed().as_millis() as u64,
                })
            }
            Err(primary_err) if is_transient(&primary_err.to_string()) => {
                tracing::warn!(
                    "Transient anomaly for {} — trying deeplink fallback: {primary_err}",
                    client.nombre
                );
                match self.transport.send_via_deeplink(&address, &text).await {
                    Ok(sent) => {
                        self.record(client, kind, &text, Ok(()), SendMethod::Fallback, started)
                            .await;
                        Ok(DispatchOutcome {
                            message_id: sent.id,
                            metodo: SendMethod::Fallback,
                            tiempo_ms: started.elapsed().as_millis() as u64,
                        })
                    }
                    Err(fallback_err) => {
                        let err = CobranzaError::Transient(format!(
                            "envío principal falló ({primary_err}); respaldo también falló ({fallback_err})"
                        ));
                        self.record(client, kind, &text, Err(&err), via, started).await;
                        Err(err)
                    }
                }
            }
            Err(err) => {
                self.record(client, kind, &text, Err(&err), via, started).await;
                Err(err)
            }
        }
    }

    /// Update quota and append the ledger record. Runs before the send
    /// result is returned; ledger I/O failures are swallowed downstream.
    async fn record(
        &self,
        client: &Client,
        kind: MessageKind,
        text: &str,
        outcome: std::result::Result<(), &CobranzaError>,
        metodo: SendMethod,
        started: Instant,
    ) {
        if outcome.is_ok() {
            self.quota.lock().await.record_send();
        }
        let draft = RecordDraft {
            cliente: client.nombre.clone(),
            telefono: client.telefono.clone(),
            saldo: client.saldo.unwrap_or(0.0),
            tipo: kind,
            mensaje: text.chars().take(self.excerpt_len).collect(),
            exito: outcome.is_ok(),
            error: outcome.err().map(|e| e.to_string()),
            metodo,
            tiempo_ms: started.elapsed().as_millis() as u64,
        };
        self.ledger.lock().await.append(draft);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobranza_ledger::QueryFilters;
    use cobranza_transport::{MockTransport, TransportEvent};
    use std::time::Duration;

    fn client() -> Client {
        Client {
            nombre: "Ana Torres".into(),
            telefono: "5512345678".into(),
            saldo: Some(-200.0),
            vencimiento: None,
            dias_vencido: None,
        }
    }

    struct Harness {
        transport: Arc<MockTransport>,
        ledger: Arc<Mutex<NotificationLog>>,
        quota: Arc<Mutex<QuotaTracker>>,
        dispatcher: Dispatcher,
        dir: std::path::PathBuf,
    }

    impl Harness {
        async fn connected(name: &str) -> Self {
            let harness = Self::disconnected(name).await;
            harness.transport.emit(TransportEvent::Open).await;
            tokio::time::sleep(Duration::from_millis(10)).await;
            harness
        }

        async fn disconnected(name: &str) -> Self {
            let dir = std::env::temp_dir().join(name);
            std::fs::remove_dir_all(&dir).ok();
            std::fs::create_dir_all(&dir).ok();
            let transport = Arc::new(MockTransport::new());
            let session =
                SessionManager::new(transport.clone(), Duration::from_millis(50));
            session.start().await.unwrap();
            let ledger = Arc::new(Mutex::new(NotificationLog::open(&dir, 1000)));
            let quota = Arc::new(Mutex::new(QuotaTracker::new(1500)));
            let dispatcher = Dispatcher::new(
                transport.clone(),
                session,
                ledger.clone(),
                quota.clone(),
                200,
            );
            Self {
                transport,
                ledger,
                quota,
                dispatcher,
                dir,
            }
        }
    }

    impl Drop for Harness {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.dir).ok();
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(is_transient("Evaluation failed: Chat not found"));
        assert!(is_transient("TypeError: Cannot read properties of undefined"));
        assert!(is_transient("markedUnread is not a function"));
        assert!(is_transient("Execution context was destroyed"));
        assert!(!is_transient("socket hang up"));
        assert!(!is_transient("rate limited"));
    }

    #[tokio::test]
    async fn test_success_records_and_counts() {
        let h = Harness::connected("cobranza-disp-ok").await;
        let outcome = h
            .dispatcher
            .send_reminder(&client(), MessageKind::FirstReminder, None, SendMethod::Primary)
            .await
            .unwrap();
        assert!(outcome.message_id.starts_with("msg-"));
        assert_eq!(outcome.metodo, SendMethod::Primary);

        let ledger = h.ledger.lock().await;
        let page = ledger.query(&QueryFilters::default(), 1, 10);
        assert_eq!(page.total, 1);
        assert!(page.items[0].exito);
        assert_eq!(h.quota.lock().await.snapshot().total_sent, 1);
        // message went to the normalized address
        assert_eq!(h.transport.sent()[0].0, "5215512345678@s.whatsapp.net");
    }

    #[tokio::test]
    async fn test_validation_rejects_without_record() {
        let h = Harness::connected("cobranza-disp-val").await;
        let mut c = client();
        c.saldo = None;
        let err = h
            .dispatcher
            .send_reminder(&c, MessageKind::FirstReminder, None, SendMethod::Primary)
            .await
            .unwrap_err();
        assert!(matches!(err, CobranzaError::Validation(_)));
        assert!(h.ledger.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_not_ready_rejects_without_record() {
        let h = Harness::disconnected("cobranza-disp-notready").await;
        let err = h
            .dispatcher
            .send_reminder(&client(), MessageKind::FirstReminder, None, SendMethod::Primary)
            .await
            .unwrap_err();
        assert!(matches!(err, CobranzaError::NotReady(_)));
        assert!(h.ledger.lock().await.is_empty());
        assert_eq!(h.quota.lock().await.snapshot().total_sent, 0);
    }

    #[tokio::test]
    async fn test_not_registered_short_circuits() {
        let h = Harness::connected("cobranza-disp-noreg").await;
        h.transport.set_registered(false);
        let err = h
            .dispatcher
            .send_reminder(&client(), MessageKind::FirstReminder, None, SendMethod::Primary)
            .await
            .unwrap_err();
        assert!(matches!(err, CobranzaError::NotRegistered(_)));
        // nothing was sent through either strategy
        assert!(h.transport.sent().is_empty());
        assert!(h.transport.deeplink_sent().is_empty());
        // but the failed attempt is on the ledger
        let ledger = h.ledger.lock().await;
        let page = ledger.query(&QueryFilters::default(), 1, 10);
        assert_eq!(page.total, 1);
        assert!(!page.items[0].exito);
    }

    #[tokio::test]
    async fn test_transient_failure_engages_fallback() {
        let h = Harness::connected("cobranza-disp-fallback").await;
        h.transport.fail_next_send("Evaluation failed: Chat not found");
        let outcome = h
            .dispatcher
            .send_reminder(&client(), MessageKind::FirstReminder, None, SendMethod::Primary)
            .await
            .unwrap();
        assert_eq!(outcome.metodo, SendMethod::Fallback);
        assert_eq!(h.transport.deeplink_sent().len(), 1);

        let ledger = h.ledger.lock().await;
        let page = ledger.query(&QueryFilters::default(), 1, 10);
        assert_eq!(page.items[0].metodo, SendMethod::Fallback);
        assert!(page.items[0].exito);
    }

    #[tokio::test]
    async fn test_both_strategies_failing_names_both() {
        let h = Harness::connected("cobranza-disp-bothfail").await;
        h.transport.fail_next_send("Chat not found");
        h.transport.fail_next_deeplink("input surface never became ready");
        let err = h
            .dispatcher
            .send_reminder(&client(), MessageKind::FirstReminder, None, SendMethod::Primary)
            .await
            .unwrap_err();
        let text = err.to_string();
        assert!(matches!(err, CobranzaError::Transient(_)));
        assert!(text.contains("Chat not found"));
        assert!(text.contains("input surface never became ready"));

        let ledger = h.ledger.lock().await;
        assert!(!ledger.query(&QueryFilters::default(), 1, 10).items[0].exito);
        assert_eq!(h.quota.lock().await.snapshot().total_sent, 0);
    }

    #[tokio::test]
    async fn test_non_transient_failure_skips_fallback() {
        let h = Harness::connected("cobranza-disp-hardfail").await;
        h.transport.fail_next_send("socket hang up");
        let err = h
            .dispatcher
            .send_reminder(&client(), MessageKind::FirstReminder, None, SendMethod::Primary)
            .await
            .unwrap_err();
        assert!(matches!(err, CobranzaError::Transport(_)));
        assert!(h.transport.deeplink_sent().is_empty());
    }
}
