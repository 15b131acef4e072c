//! # Cobranza Transport
//! Chat transport interface and session lifecycle.
//!
//! The actual chat protocol (pairing crypto, credential persistence,
//! message encryption) lives in an external bridge process. This crate
//! owns the interface boundary: the [`Transport`] trait, the transport
//! event model, and the [`session::SessionManager`] state machine that
//! keeps exactly one live connection and reconnects on non-logout drops.

use async_trait::async_trait;
use cobranza_core::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

pub mod bridge;
pub mod mock;
pub mod session;

pub use bridge::BridgeTransport;
pub use mock::MockTransport;
pub use session::{Session, SessionManager, SessionState};

/// Why the transport connection closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Explicit logout — the paired device revoked the session.
    LoggedOut,
    ConnectionLost,
    Restarting,
    #[serde(other)]
    Other,
}

/// Events emitted by a transport connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A pairing challenge was issued; display the code out-of-band.
    PairingCode(String),
    /// Connection established and authenticated.
    Open,
    /// Connection closed.
    Closed { reason: CloseReason },
}

/// A message accepted by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentMessage {
    /// Transport-assigned message identifier.
    pub id: String,
}

/// The chat transport collaborator interface.
///
/// `connect` opens a new connection and delivers lifecycle events on the
/// given sender. The caller is responsible for tearing down any previous
/// connection first — the transport never multiplexes handles.
#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &str;

    /// Open a new connection; events are delivered on `events`.
    async fn connect(&self, events: mpsc::Sender<TransportEvent>) -> Result<()>;

    /// Close the current connection, if any. Idempotent.
    async fn disconnect(&self) -> Result<()>;

    /// Primary send path. At most one attempt per call.
    async fn send_message(&self, address: &str, text: &str) -> Result<SentMessage>;

    /// Fallback send path: drive the transport session to a deep-link
    /// send action. Slower, used only on classified transient failures.
    async fn send_via_deeplink(&self, address: &str, text: &str) -> Result<SentMessage>;

    /// Whether the address has an account on the transport.
    async fn is_registered(&self, address: &str) -> Result<bool>;
}
