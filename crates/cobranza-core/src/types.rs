//! Domain types shared across crates.
//!
//! Wire field names stay in Spanish — they are the public HTTP contract
//! the billing frontend already speaks.

use serde::{Deserialize, Serialize};

/// A client to be reminded. External input, immutable per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub telefono: String,
    /// Outstanding balance. Negative means the client owes money.
    pub saldo: Option<f64>,
    /// Due date, free-form (e.g. "15/09/2026").
    #[serde(default)]
    pub vencimiento: Option<String>,
    /// Days overdue, for the second reminder.
    #[serde(default, rename = "diasVencido")]
    pub dias_vencido: Option<i64>,
}

impl Client {
    /// Required fields that are absent or empty, in the wire spelling.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.nombre.trim().is_empty() {
            missing.push("cliente.nombre");
        }
        if self.telefono.trim().is_empty() {
            missing.push("cliente.telefono");
        }
        if self.saldo.is_none() {
            missing.push("cliente.saldo");
        }
        missing
    }

    /// Absolute balance formatted with two decimals, as shown in messages.
    pub fn monto(&self) -> String {
        format!("{:.2}", self.saldo.unwrap_or(0.0).abs())
    }
}

/// Kind of reminder message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MessageKind {
    #[serde(rename = "primerRecordatorio")]
    FirstReminder,
    #[serde(rename = "segundoRecordatorio")]
    SecondReminder,
    #[serde(rename = "ultimoRecordatorio")]
    FinalReminder,
    #[serde(rename = "aviso")]
    GenericNotice,
    #[serde(rename = "suspension")]
    Suspension,
    #[serde(rename = "reactivacion")]
    Reactivation,
    #[serde(rename = "baja")]
    Termination,
    #[serde(rename = "personalizado")]
    Custom,
}

impl MessageKind {
    /// Parse a wire name. Unknown values fall back to the first reminder,
    /// matching the original frontend contract.
    pub fn parse(s: &str) -> Self {
        match s {
            "segundoRecordatorio" => Self::SecondReminder,
            "ultimoRecordatorio" => Self::FinalReminder,
            "aviso" => Self::GenericNotice,
            "suspension" => Self::Suspension,
            "reactivacion" => Self::Reactivation,
            "baja" => Self::Termination,
            "personalizado" => Self::Custom,
            // "recordatorio" is a legacy alias for the first reminder
            _ => Self::FirstReminder,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstReminder => "primerRecordatorio",
            Self::SecondReminder => "segundoRecordatorio",
            Self::FinalReminder => "ultimoRecordatorio",
            Self::GenericNotice => "aviso",
            Self::Suspension => "suspension",
            Self::Reactivation => "reactivacion",
            Self::Termination => "baja",
            Self::Custom => "personalizado",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which send strategy delivered (or tried to deliver) a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SendMethod {
    #[serde(rename = "principal")]
    Primary,
    #[serde(rename = "respaldo")]
    Fallback,
    #[serde(rename = "lote")]
    Batch,
}

impl SendMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "principal",
            Self::Fallback => "respaldo",
            Self::Batch => "lote",
        }
    }
}

impl std::fmt::Display for SendMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
