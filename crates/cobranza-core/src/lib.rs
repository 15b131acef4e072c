//! # Cobranza Core
//! Shared error taxonomy, configuration, and domain types.

pub mod config;
pub mod error;
pub mod types;

pub use config::CobranzaConfig;
pub use error::{CobranzaError, Result};
pub use types::{Client, MessageKind, SendMethod};
