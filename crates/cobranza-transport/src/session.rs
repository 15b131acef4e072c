//! Session lifecycle state machine.
//!
//! `Disconnected → PairingRequested → Connected → Disconnected` cycle,
//! with a terminal `LoggedOut` state when the transport reports an
//! explicit logout. Transitions are driven solely by transport events
//! consumed from an mpsc channel, so the pure [`transition`] function is
//! testable without a live transport.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;

use crate::{CloseReason, Transport, TransportEvent};
use cobranza_core::Result;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Disconnected,
    PairingRequested,
    Connected,
    LoggedOut,
}

/// Process-wide session snapshot. Exactly one instance, owned by
/// [`SessionManager`]; mutated only by transport events.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub state: SessionState,
    pub pairing_code: Option<String>,
    pub last_connected_at: Option<DateTime<Utc>>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            state: SessionState::Disconnected,
            pairing_code: None,
            last_connected_at: None,
        }
    }
}

/// What the event loop should do after applying an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Continue,
    /// Re-open the connection after the fixed delay.
    Reconnect,
    /// Terminal logout — stop the loop, never reconnect.
    Stop,
}

/// Pure transition function. Returns the next state and a directive.
pub fn transition(state: SessionState, event: &TransportEvent) -> (SessionState, Directive) {
    // LoggedOut is terminal — stale events from a dying handle are ignored.
    if state == SessionState::LoggedOut {
        return (SessionState::LoggedOut, Directive::Stop);
    }
    match event {
        TransportEvent::PairingCode(_) => (SessionState::PairingRequested, Directive::Continue),
        TransportEvent::Open => (SessionState::Connected, Directive::Continue),
        TransportEvent::Closed { reason } => {
            if *reason == CloseReason::LoggedOut {
                (SessionState::LoggedOut, Directive::Stop)
            } else {
                (SessionState::Disconnected, Directive::Reconnect)
            }
        }
    }
}

/// Owns the single transport connection and its lifecycle.
pub struct SessionManager {
    transport: Arc<dyn Transport>,
    session: Arc<RwLock<Session>>,
    reconnect_delay: Duration,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn Transport>, reconnect_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            transport,
            session: Arc::new(RwLock::new(Session::default())),
            reconnect_delay,
            event_loop: Mutex::new(None),
        })
    }

    /// Request a new transport connection.
    ///
    /// Tears down any previous handle first (abort the event loop,
    /// disconnect the transport) so event delivery is never duplicated.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        self.teardown().await;

        let (tx, rx) = mpsc::channel(32);
        self.transport.connect(tx).await?;

        let mgr = Arc::clone(self);
        let handle = tokio::spawn(async move { mgr.event_loop(rx).await });
        *self.event_loop.lock().await = Some(handle);
        Ok(())
    }

    /// Close the connection and stop processing events.
    pub async fn shutdown(&self) {
        self.teardown().await;
        let mut session = self.session.write().await;
        if session.state != SessionState::LoggedOut {
            session.state = SessionState::Disconnected;
        }
    }

    async fn teardown(&self) {
        if let Some(handle) = self.event_loop.lock().await.take() {
            handle.abort();
        }
        let _ = self.transport.disconnect().await;
    }

    /// True iff the session is `Connected`. Re-checked before every send.
    pub async fn is_ready(&self) -> bool {
        self.session.read().await.state == SessionState::Connected
    }

    /// Current session snapshot, for /status and /qrcode.
    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Apply one event to the shared session, returning the directive.
    async fn apply(&self, event: &TransportEvent) -> Directive {
        let mut session = self.session.write().await;
        let (next, directive) = transition(session.state, event);

        match event {
            TransportEvent::PairingCode(code) => {
                tracing::info!("Pairing code issued — scan it to link the session");
                session.pairing_code = Some(code.clone());
            }
            TransportEvent::Open => {
                tracing::info!("Transport connected and ready");
                session.pairing_code = None;
                session.last_connected_at = Some(Utc::now());
            }
            TransportEvent::Closed { reason } => {
                tracing::warn!(?reason, "Transport connection closed");
            }
        }

        session.state = next;
        directive
    }

    /// Consume transport events until logout or shutdown.
    ///
    /// A non-logout close schedules one reconnect after the fixed delay.
    /// A closed event channel without a close event means the handle died
    /// silently; treated the same as a lost connection.
    async fn event_loop(self: Arc<Self>, mut rx: mpsc::Receiver<TransportEvent>) {
        loop {
            let directive = match rx.recv().await {
                Some(event) => self.apply(&event).await,
                None => {
                    if self.session.read().await.state == SessionState::LoggedOut {
                        Directive::Stop
                    } else {
                        tracing::warn!("Transport event feed ended unexpectedly");
                        self.session.write().await.state = SessionState::Disconnected;
                        Directive::Reconnect
                    }
                }
            };

            match directive {
                Directive::Continue => {}
                Directive::Stop => {
                    tracing::info!("Session logged out — not reconnecting");
                    return;
                }
                Directive::Reconnect => {
                    tokio::time::sleep(self.reconnect_delay).await;
                    // One live handle at a time: close the dead one first.
                    let _ = self.transport.disconnect().await;
                    let (tx, new_rx) = mpsc::channel(32);
                    match self.transport.connect(tx).await {
                        Ok(()) => {
                            tracing::info!("Reconnect requested");
                            rx = new_rx;
                        }
                        Err(e) => {
                            // Keep the old (drained) receiver; next recv()
                            // yields None and we land back here after the delay.
                            tracing::error!("Reconnect failed: {e}");
                        }
                    }
                }
            }
        }
    }
}
