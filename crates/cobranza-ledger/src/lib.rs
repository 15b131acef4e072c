//! # Cobranza Ledger
//! Append-only log of notification attempts.
//!
//! Bounded at a fixed capacity, newest-first, persisted synchronously to
//! a JSON array on disk after every mutation. Low volume (tens of writes
//! per minute at worst) makes the write-through latency acceptable.

pub mod log;
pub mod record;
pub mod store;

pub use log::{ExportFormat, NotificationLog, QueryFilters, QueryPage};
pub use record::{NotificationRecord, RecordDraft};
pub use store::LedgerStore;
