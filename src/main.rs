//! # Cobranza — Payment Reminder Service
//!
//! Sends payment reminders to clients over a chat transport, with a
//! throttled batch scheduler, a bounded notification ledger, and an HTTP
//! gateway for the billing frontend.
//!
//! Usage:
//!   cobranza                       # Start with ~/.cobranza/config.toml
//!   cobranza --port 8080           # Override the gateway port
//!   cobranza --config ./dev.toml   # Explicit config file

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use cobranza_core::config::CobranzaConfig;
use cobranza_dispatch::{BatchScheduler, Dispatcher, QuotaTracker};
use cobranza_gateway::AppState;
use cobranza_ledger::NotificationLog;
use cobranza_transport::{BridgeTransport, SessionManager, Transport};

#[derive(Parser)]
#[command(
    name = "cobranza",
    version,
    about = "Recordatorios de pago por transporte de chat"
)]
struct Cli {
    /// Path to the config file (default: ~/.cobranza/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Gateway port override
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "cobranza=debug,tower_http=debug"
    } else {
        "cobranza=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            let expanded = shellexpand::tilde(path).to_string();
            CobranzaConfig::load_from(Path::new(&expanded))?
        }
        None => CobranzaConfig::load()?,
    };
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    let ledger_dir = shellexpand::tilde(&config.ledger.dir).to_string();
    std::fs::create_dir_all(&ledger_dir)?;

    let transport: Arc<dyn Transport> = Arc::new(BridgeTransport::new(config.transport.clone()));
    let session = SessionManager::new(
        transport.clone(),
        Duration::from_millis(config.transport.reconnect_delay_ms),
    );
    session.start().await?;
    tracing::info!("Transport session requested via {}", config.transport.base_url);

    let ledger = Arc::new(Mutex::new(NotificationLog::open(
        Path::new(&ledger_dir),
        config.ledger.capacity,
    )));
    let loaded = ledger.lock().await.len();
    if loaded > 0 {
        tracing::info!("Notification ledger loaded: {loaded} record(s)");
    }

    let quota = Arc::new(Mutex::new(QuotaTracker::new(config.sending.monthly_limit)));
    let dispatcher = Arc::new(Dispatcher::new(
        transport.clone(),
        session.clone(),
        ledger.clone(),
        quota.clone(),
        config.sending.message_excerpt_len,
    ));
    let batch = Arc::new(BatchScheduler::new(
        dispatcher.clone(),
        quota.clone(),
        config.sending.batch_cap,
        Duration::from_millis(config.sending.batch_delay_ms),
    ));

    let state = AppState {
        config,
        session: session.clone(),
        transport,
        dispatcher,
        batch,
        ledger,
        quota,
        start_time: std::time::Instant::now(),
    };

    tokio::select! {
        result = cobranza_gateway::start(state) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            session.shutdown().await;
        }
    }

    Ok(())
}
