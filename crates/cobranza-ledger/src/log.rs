//! The bounded notification log.
//!
//! Newest-first, fixed capacity; insertion is always at the front so
//! overflow eviction from the tail is FIFO-by-age. Every mutation is
//! persisted before the call returns; persistence failures are logged
//! and swallowed so they never mask a send outcome.

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{NotificationRecord, RecordDraft};
use crate::store::LedgerStore;
use cobranza_core::MessageKind;

/// Query filters for [`NotificationLog::query`].
#[derive(Debug, Clone, Default)]
pub struct QueryFilters {
    pub tipo: Option<MessageKind>,
    pub desde: Option<DateTime<Utc>>,
    pub hasta: Option<DateTime<Utc>>,
}

/// One page of query results, newest-first.
#[derive(Debug, Clone, Serialize)]
pub struct QueryPage {
    pub items: Vec<NotificationRecord>,
    pub total: usize,
    pub page: usize,
    pub pages: usize,
}

/// Export formats for the full dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

/// Aggregate statistics over the current log contents.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerStats {
    pub total: usize,
    pub exitosos: usize,
    pub fallidos: usize,
    pub hoy: usize,
    pub por_tipo: HashMap<String, usize>,
}

pub struct NotificationLog {
    records: VecDeque<NotificationRecord>,
    next_id: u64,
    capacity: usize,
    store: LedgerStore,
}

impl NotificationLog {
    /// Open (or create) the log under the given directory.
    pub fn open(dir: &Path, capacity: usize) -> Self {
        let store = LedgerStore::new(dir);
        let loaded = store.load();
        let next_id = loaded.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let mut records: VecDeque<_> = loaded.into();
        records.truncate(capacity);
        Self {
            records,
            next_id,
            capacity,
            store,
        }
    }

    /// Append one attempt. Assigns id + timestamp, inserts at the front,
    /// evicts from the tail past capacity, persists, returns the id.
    pub fn append(&mut self, draft: RecordDraft) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let record = draft.into_record(id, Utc::now());
        tracing::debug!("Notification recorded: {} ({})", record.cliente, record.tipo);
        self.records.push_front(record);
        self.records.truncate(self.capacity);
        self.persist();
        id
    }

    /// Replace the collection with empty and persist.
    pub fn clear(&mut self) {
        self.records.clear();
        self.persist();
    }

    fn persist(&self) {
        let snapshot: Vec<_> = self.records.iter().cloned().collect();
        if let Err(e) = self.store.save(&snapshot) {
            // Never propagated: a dead disk must not fail a delivered send.
            tracing::warn!("Ledger persist failed: {e}");
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn matches(record: &NotificationRecord, filters: &QueryFilters) -> bool {
        if let Some(tipo) = filters.tipo
            && record.tipo != tipo
        {
            return false;
        }
        if let Some(desde) = filters.desde
            && record.timestamp < desde
        {
            return false;
        }
        if let Some(hasta) = filters.hasta
            && record.timestamp > hasta
        {
            return false;
        }
        true
    }

    /// Filtered, paginated view. Full scan — fine at capacity 1000.
    /// `page` is 1-based; out-of-range pages return empty items.
    pub fn query(&self, filters: &QueryFilters, page: usize, page_size: usize) -> QueryPage {
        let filtered: Vec<_> = self
            .records
            .iter()
            .filter(|r| Self::matches(r, filters))
            .cloned()
            .collect();
        let total = filtered.len();
        let page_size = page_size.max(1);
        let pages = total.div_ceil(page_size);
        let page = page.max(1);
        let items = filtered
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();
        QueryPage {
            items,
            total,
            page,
            pages,
        }
    }

    /// Aggregate stats over the whole log.
    pub fn stats(&self) -> LedgerStats {
        let today = Utc::now().date_naive();
        let mut por_tipo: HashMap<String, usize> = HashMap::new();
        let mut exitosos = 0;
        let mut hoy = 0;
        for record in &self.records {
            *por_tipo.entry(record.tipo.to_string()).or_insert(0) += 1;
            if record.exito {
                exitosos += 1;
            }
            if record.timestamp.date_naive() == today {
                hoy += 1;
            }
        }
        LedgerStats {
            total: self.records.len(),
            exitosos,
            fallidos: self.records.len() - exitosos,
            hoy,
            por_tipo,
        }
    }

    /// Full dump in the requested format.
    pub fn export(&self, format: ExportFormat) -> String {
        let snapshot: Vec<_> = self.records.iter().collect();
        match format {
            ExportFormat::Json => serde_json::to_string_pretty(&snapshot).unwrap_or_default(),
            ExportFormat::Csv => {
                let mut out = String::from(
                    "timestamp,cliente,telefono,tipo,saldo,exito,metodo,tiempo_ms\n",
                );
                for r in &snapshot {
                    out.push_str(&format!(
                        "{},{},{},{},{:.2},{},{},{}\n",
                        r.timestamp.to_rfc3339(),
                        csv_field(&r.cliente),
                        csv_field(&r.telefono),
                        r.tipo,
                        r.saldo,
                        r.exito,
                        r.metodo,
                        r.tiempo_ms
                    ));
                }
                out
            }
        }
    }
}

fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobranza_core::SendMethod;

    fn draft(name: &str, tipo: MessageKind) -> RecordDraft {
        RecordDraft {
            cliente: name.into(),
            telefono: "5512345678".into(),
            saldo: -100.0,
            tipo,
            mensaje: "hola".into(),
            exito: true,
            error: None,
            metodo: SendMethod::Primary,
            tiempo_ms: 10,
        }
    }

    fn temp_log(name: &str, capacity: usize) -> (NotificationLog, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(name);
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).ok();
        (NotificationLog::open(&dir, capacity), dir)
    }

    #[test]
    fn test_append_is_newest_first() {
        let (mut log, dir) = temp_log("cobranza-log-order", 10);
        log.append(draft("first", MessageKind::FirstReminder));
        log.append(draft("second", MessageKind::FirstReminder));
        let page = log.query(&QueryFilters::default(), 1, 10);
        assert_eq!(page.items[0].cliente, "second");
        assert_eq!(page.items[1].cliente, "first");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let (mut log, dir) = temp_log("cobranza-log-evict", 5);
        for i in 0..8 {
            log.append(draft(&format!("c{i}"), MessageKind::FirstReminder));
        }
        assert_eq!(log.len(), 5);
        let page = log.query(&QueryFilters::default(), 1, 10);
        // c0..c2 evicted; newest c7 at the front, oldest survivor c3 at the tail
        assert_eq!(page.items[0].cliente, "c7");
        assert_eq!(page.items[4].cliente, "c3");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_ids_are_monotonic_and_survive_reload() {
        let dir = std::env::temp_dir().join("cobranza-log-reload");
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).ok();
        {
            let mut log = NotificationLog::open(&dir, 10);
            assert_eq!(log.append(draft("a", MessageKind::FirstReminder)), 1);
            assert_eq!(log.append(draft("b", MessageKind::FirstReminder)), 2);
        }
        let mut log = NotificationLog::open(&dir, 10);
        assert_eq!(log.len(), 2);
        assert_eq!(log.append(draft("c", MessageKind::FirstReminder)), 3);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_clear_then_query_is_zero() {
        let (mut log, dir) = temp_log("cobranza-log-clear", 10);
        log.append(draft("a", MessageKind::FirstReminder));
        log.clear();
        let page = log.query(&QueryFilters::default(), 1, 10);
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
        // the empty collection was persisted too
        let reopened = NotificationLog::open(&dir, 10);
        assert!(reopened.is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_query_filters_by_kind() {
        let (mut log, dir) = temp_log("cobranza-log-filter", 10);
        log.append(draft("a", MessageKind::FirstReminder));
        log.append(draft("b", MessageKind::Suspension));
        log.append(draft("c", MessageKind::Suspension));
        let page = log.query(
            &QueryFilters {
                tipo: Some(MessageKind::Suspension),
                ..QueryFilters::default()
            },
            1,
            10,
        );
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|r| r.tipo == MessageKind::Suspension));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_pagination() {
        let (mut log, dir) = temp_log("cobranza-log-pages", 50);
        for i in 0..25 {
            log.append(draft(&format!("c{i}"), MessageKind::FirstReminder));
        }
        let page = log.query(&QueryFilters::default(), 2, 10);
        assert_eq!(page.total, 25);
        assert_eq!(page.pages, 3);
        assert_eq!(page.items.len(), 10);
        // page 2 starts after the 10 newest (c24..c15), so first item is c14
        assert_eq!(page.items[0].cliente, "c14");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_stats() {
        let (mut log, dir) = temp_log("cobranza-log-stats", 10);
        log.append(draft("a", MessageKind::FirstReminder));
        let mut failed = draft("b", MessageKind::Suspension);
        failed.exito = false;
        failed.error = Some("boom".into());
        log.append(failed);
        let stats = log.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.exitosos, 1);
        assert_eq!(stats.fallidos, 1);
        assert_eq!(stats.hoy, 2);
        assert_eq!(stats.por_tipo["suspension"], 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_csv_export_columns() {
        let (mut log, dir) = temp_log("cobranza-log-csv", 10);
        log.append(draft("Pérez, Juan", MessageKind::GenericNotice));
        let csv = log.export(ExportFormat::Csv);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp,cliente,telefono,tipo,saldo,exito,metodo,tiempo_ms"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("\"Pérez, Juan\""));
        assert!(row.ends_with(",aviso,-100.00,true,principal,10"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
