//! HTTP bridge transport.
//!
//! Talks to the local protocol sidecar that owns the real chat session
//! (pairing, encryption, credential storage). The sidecar exposes a
//! small REST surface; lifecycle events are long-polled and forwarded
//! into the session manager's event channel.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::{CloseReason, SentMessage, Transport, TransportEvent};
use cobranza_core::config::TransportConfig;
use cobranza_core::{CobranzaError, Result};

/// One event as the sidecar reports it.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BridgeEvent {
    PairingCode { code: String },
    Open,
    Closed { reason: CloseReason },
}

impl BridgeEvent {
    fn into_transport_event(self) -> TransportEvent {
        match self {
            Self::PairingCode { code } => TransportEvent::PairingCode(code),
            Self::Open => TransportEvent::Open,
            Self::Closed { reason } => TransportEvent::Closed { reason },
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    events: Vec<BridgeEvent>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ContactResponse {
    registered: bool,
}

/// Transport implementation over the bridge sidecar's REST API.
pub struct BridgeTransport {
    config: TransportConfig,
    client: reqwest::Client,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl BridgeTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            poll_task: Mutex::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.config.api_token.is_empty() {
            req
        } else {
            req.bearer_auth(&self.config.api_token)
        }
    }

    async fn post_json(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        let response = self
            .authed(self.client.post(self.url(path)))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CobranzaError::Timeout(format!("bridge {path}: {e}"))
                } else {
                    CobranzaError::Transport(format!("bridge {path}: {e}"))
                }
            })?;

        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let detail = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::REQUEST_TIMEOUT
            || status == reqwest::StatusCode::GATEWAY_TIMEOUT
        {
            Err(CobranzaError::Timeout(format!("bridge {path}: {detail}")))
        } else {
            Err(CobranzaError::Transport(format!(
                "bridge {path} error {status}: {detail}"
            )))
        }
    }

    /// Long-poll `/session/events` and forward to the session manager.
    /// Stops when the receiver side is dropped (old handle detached).
    fn spawn_event_poll(&self, events: mpsc::Sender<TransportEvent>) -> JoinHandle<()> {
        let client = self.client.clone();
        let url = self.url("/session/events");
        let token = self.config.api_token.clone();

        tokio::spawn(async move {
            tracing::debug!("Bridge event poll started");
            loop {
                let mut req = client.get(&url).query(&[("timeout", "30")]);
                if !token.is_empty() {
                    req = req.bearer_auth(&token);
                }
                match req.send().await {
                    Ok(resp) => match resp.json::<EventsResponse>().await {
                        Ok(batch) => {
                            for event in batch.events {
                                let event = event.into_transport_event();
                                let stop = matches!(&event, TransportEvent::Closed { .. });
                                if events.send(event).await.is_err() {
                                    tracing::debug!("Event poll stopped (receiver dropped)");
                                    return;
                                }
                                if stop {
                                    // A close ends this handle's event feed;
                                    // the session manager decides what next.
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Bridge event decode failed: {e}");
                            tokio::time::sleep(Duration::from_secs(5)).await;
                        }
                    },
                    Err(e) => {
                        tracing::warn!("Bridge event poll failed: {e}");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        })
    }
}

#[async_trait]
impl Transport for BridgeTransport {
    fn name(&self) -> &str {
        "bridge"
    }

    async fn connect(&self, events: mpsc::Sender<TransportEvent>) -> Result<()> {
        self.post_json("/session/start", serde_json::json!({})).await?;
        let handle = self.spawn_event_poll(events);
        if let Some(old) = self.poll_task.lock().await.replace(handle) {
            old.abort();
        }
        tracing::info!("Bridge session start requested ({})", self.config.base_url);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if let Some(task) = self.poll_task.lock().await.take() {
            task.abort();
        }
        // Best effort — the sidecar may already be gone.
        let _ = self.post_json("/session/stop", serde_json::json!({})).await;
        Ok(())
    }

    async fn send_message(&self, address: &str, text: &str) -> Result<SentMessage> {
        let response = self
            .post_json(
                "/messages",
                serde_json::json!({ "to": address, "text": text }),
            )
            .await?;
        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| CobranzaError::Transport(format!("invalid send response: {e}")))?;
        tracing::debug!("Message accepted: {} → {}", sent.id, address);
        Ok(SentMessage { id: sent.id })
    }

    async fn send_via_deeplink(&self, address: &str, text: &str) -> Result<SentMessage> {
        let response = self
            .post_json(
                "/messages/deeplink",
                serde_json::json!({
                    "to": address,
                    "text": text,
                    "ready_timeout_ms": self.config.deeplink_ready_timeout_ms,
                }),
            )
            .await?;
        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| CobranzaError::Transport(format!("invalid deeplink response: {e}")))?;

        // The deep-link path submits through the interactive surface;
        // give the session a fixed settle period before the next send.
        tokio::time::sleep(Duration::from_millis(self.config.deeplink_settle_ms)).await;
        tracing::debug!("Deeplink message accepted: {} → {}", sent.id, address);
        Ok(SentMessage { id: sent.id })
    }

    async fn is_registered(&self, address: &str) -> Result<bool> {
        let response = self
            .authed(self.client.get(self.url(&format!("/contacts/{address}"))))
            .send()
            .await
            .map_err(|e| CobranzaError::Transport(format!("bridge contact check: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            let status = response.status();
            return Err(CobranzaError::Transport(format!(
                "bridge contact check error {status}"
            )));
        }
        let contact: ContactResponse = response
            .json()
            .await
            .map_err(|e| CobranzaError::Transport(format!("invalid contact response: {e}")))?;
        Ok(contact.registered)
    }
}
