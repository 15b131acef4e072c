//! Scripted in-memory transport for tests.
//!
//! Sends succeed by default with generated message ids. Tests can queue
//! failures, flip the registration answer, and inject lifecycle events
//! through the sender captured at `connect` time.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{SentMessage, Transport, TransportEvent};
use cobranza_core::{CobranzaError, Result};

#[derive(Default)]
struct MockInner {
    events_tx: Option<mpsc::Sender<TransportEvent>>,
    send_results: VecDeque<Result<SentMessage>>,
    deeplink_results: VecDeque<Result<SentMessage>>,
    registered: bool,
    sent: Vec<(String, String)>,
    deeplink_sent: Vec<(String, String)>,
}

pub struct MockTransport {
    inner: Mutex<MockInner>,
    connect_calls: AtomicU32,
    next_id: AtomicU64,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MockInner {
                registered: true,
                ..MockInner::default()
            }),
            connect_calls: AtomicU32::new(0),
            next_id: AtomicU64::new(1),
        }
    }

    /// Inject a lifecycle event as the live connection would.
    pub async fn emit(&self, event: TransportEvent) {
        let tx = self
            .inner
            .lock()
            .unwrap()
            .events_tx
            .clone()
            .expect("emit() before connect()");
        tx.send(event).await.expect("event receiver dropped");
    }

    pub fn connect_count(&self) -> u32 {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// Queue an error for the next primary send.
    pub fn fail_next_send(&self, message: &str) {
        self.inner
            .lock()
            .unwrap()
            .send_results
            .push_back(Err(CobranzaError::Transport(message.to_string())));
    }

    /// Queue an error for the next deeplink send.
    pub fn fail_next_deeplink(&self, message: &str) {
        self.inner
            .lock()
            .unwrap()
            .deeplink_results
            .push_back(Err(CobranzaError::Transport(message.to_string())));
    }

    pub fn set_registered(&self, registered: bool) {
        self.inner.lock().unwrap().registered = registered;
    }

    /// Addresses and texts accepted by the primary path.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().sent.clone()
    }

    /// Addresses and texts accepted by the deeplink path.
    pub fn deeplink_sent(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().deeplink_sent.clone()
    }

    fn fresh_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn connect(&self, events: mpsc::Sender<TransportEvent>) -> Result<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.lock().unwrap().events_tx = Some(events);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    async fn send_message(&self, address: &str, text: &str) -> Result<SentMessage> {
        let scripted = self.inner.lock().unwrap().send_results.pop_front();
        match scripted {
            Some(result) => result,
            None => {
                self.inner
                    .lock()
                    .unwrap()
                    .sent
                    .push((address.to_string(), text.to_string()));
                Ok(SentMessage {
                    id: self.fresh_id("msg"),
                })
            }
        }
    }

    async fn send_via_deeplink(&self, address: &str, text: &str) -> Result<SentMessage> {
        let scripted = self.inner.lock().unwrap().deeplink_results.pop_front();
        match scripted {
            Some(result) => result,
            None => {
                self.inner
                    .lock()
                    .unwrap()
                    .deeplink_sent
                    .push((address.to_string(), text.to_string()));
                Ok(SentMessage {
                    id: self.fresh_id("dl"),
                })
            }
        }
    }

    async fn is_registered(&self, _address: &str) -> Result<bool> {
        Ok(self.inner.lock().unwrap().registered)
    }
}
