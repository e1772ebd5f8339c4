//! Persistence collaborator interface.
//!
//! Rows travel as JSON maps, one per record; `insert` hands back the
//! identifier the backend generated for the row, which the assembler
//! then propagates into child rows. The in-memory backend below serves
//! tests and local runs; production backends implement the same trait.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::ReportError;
use crate::records::Level;

/// One record as handed to / returned from the persistence layer.
pub type Row = serde_json::Map<String, Value>;

pub trait RecordStore {
    /// Persist one row and return its generated identifier.
    fn insert(&mut self, level: Level, row: &Row) -> Result<i64, ReportError>;

    /// All rows of a level, in insertion order, own-id column populated.
    fn select(&self, level: Level) -> Result<Vec<Row>, ReportError>;
}

/// In-memory store with per-level auto-increment identifiers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: HashMap<&'static str, Vec<Row>>,
    next_id: HashMap<&'static str, i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn insert(&mut self, level: Level, row: &Row) -> Result<i64, ReportError> {
        let table = level.table();
        let id = {
            let counter = self.next_id.entry(table).or_insert(0);
            *counter += 1;
            *counter
        };
        let mut stored = row.clone();
        stored.insert(level.id_column().to_string(), Value::from(id));
        self.tables.entry(table).or_default().push(stored);
        Ok(id)
    }

    fn select(&self, level: Level) -> Result<Vec<Row>, ReportError> {
        Ok(self.tables.get(level.table()).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn identifiers_increment_per_level() {
        let mut store = MemoryStore::new();
        let a = store
            .insert(Level::Design, &row(&[("DElabel", json!("a"))]))
            .unwrap();
        let b = store
            .insert(Level::Design, &row(&[("DElabel", json!("b"))]))
            .unwrap();
        let c = store
            .insert(Level::FishingTrip, &row(&[("FTunitName", json!("t"))]))
            .unwrap();
        assert_eq!((a, b, c), (1, 2, 1));
    }

    #[test]
    fn select_preserves_insertion_order_and_fills_id() {
        let mut store = MemoryStore::new();
        store
            .insert(Level::Design, &row(&[("DElabel", json!("first"))]))
            .unwrap();
        store
            .insert(Level::Design, &row(&[("DElabel", json!("second"))]))
            .unwrap();
        let rows = store.select(Level::Design).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["DEid"], json!(1));
        assert_eq!(rows[0]["DElabel"], json!("first"));
        assert_eq!(rows[1]["DEid"], json!(2));
    }

    #[test]
    fn empty_level_selects_empty() {
        let store = MemoryStore::new();
        assert!(store.select(Level::Sample).unwrap().is_empty());
    }
}
