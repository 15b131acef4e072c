//! Notification attempt records — the ledger's data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cobranza_core::{MessageKind, SendMethod};

/// One send attempt, success or failure. Immutable once written;
/// identity is `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub cliente: String,
    pub telefono: String,
    pub saldo: f64,
    pub tipo: MessageKind,
    /// Bounded excerpt of the rendered message.
    pub mensaje: String,
    pub exito: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metodo: SendMethod,
    pub tiempo_ms: u64,
}

/// What the dispatcher knows about an attempt; the log assigns id and
/// timestamp on append.
#[derive(Debug, Clone)]
pub struct RecordDraft {
    pub cliente: String,
    pub telefono: String,
    pub saldo: f64,
    pub tipo: MessageKind,
    pub mensaje: String,
    pub exito: bool,
    pub error: Option<String>,
    pub metodo: SendMethod,
    pub tiempo_ms: u64,
}

impl RecordDraft {
    pub fn into_record(self, id: u64, timestamp: DateTime<Utc>) -> NotificationRecord {
        NotificationRecord {
            id,
            timestamp,
            cliente: self.cliente,
            telefono: self.telefono,
            saldo: self.saldo,
            tipo: self.tipo,
            mensaje: self.mensaje,
            exito: self.exito,
            error: self.error,
            metodo: self.metodo,
            tiempo_ms: self.tiempo_ms,
        }
    }
}
