//! # Cobranza Dispatch
//!
//! Everything between "a client owes money" and "the transport accepted
//! a message": phone normalization, template rendering, the send-one
//! dispatcher with its fallback strategy, the sequential batch driver,
//! and the in-memory send quota.
//!
//! The batch driver is deliberately sequential with an inter-item delay.
//! That throttle is the anti-abuse discipline this service exists for —
//! do not parallelize it.

pub mod batch;
pub mod dispatcher;
pub mod phone;
pub mod quota;
pub mod templates;

pub use batch::{BatchItemResult, BatchReport, BatchScheduler};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use phone::normalize_phone;
pub use quota::{QuotaSnapshot, QuotaTracker};
pub use templates::render_message;
