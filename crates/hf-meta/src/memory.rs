//! In-memory table backend.

use std::collections::HashMap;
use std::sync::RwLock;

use hf_types::TableName;
use tracing::debug;

use crate::client::TableClient;
use crate::error::MetaError;
use crate::query::{Filter, Query, Row, apply_patch, prepare_insert};

/// Volatile tables backed by a `RwLock<HashMap<TableName, Vec<Row>>>`.
///
/// Rows keep insertion order, which is the order unordered selects return.
/// Useful for tests and for `--memory` runs of the daemon.
#[derive(Default)]
pub struct MemoryTables {
    tables: RwLock<HashMap<TableName, Vec<Row>>>,
}

impl MemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently in `table`.
    pub fn len(&self, table: TableName) -> usize {
        let map = self.tables.read().expect("lock poisoned");
        map.get(&table).map_or(0, Vec::len)
    }

    /// Whether `table` holds no rows.
    pub fn is_empty(&self, table: TableName) -> bool {
        self.len(table) == 0
    }
}

fn matches_all(filters: &[Filter], row: &Row) -> bool {
    filters.iter().all(|f| f.matches(row))
}

#[async_trait::async_trait]
impl TableClient for MemoryTables {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, MetaError> {
        let map = self.tables.read().expect("lock poisoned");
        let rows = map.get(&query.table).map(|v| v.iter()).into_iter().flatten();
        Ok(query.apply(rows))
    }

    async fn insert(&self, table: TableName, rows: Vec<Row>) -> Result<Vec<Row>, MetaError> {
        let mut map = self.tables.write().expect("lock poisoned");
        let stored = map.entry(table).or_default();

        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let (id, row) = prepare_insert(row);
            debug!(%table, %id, "inserted row in memory");
            stored.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn update(
        &self,
        table: TableName,
        patch: Row,
        filters: &[Filter],
    ) -> Result<Vec<Row>, MetaError> {
        if filters.is_empty() {
            return Err(MetaError::MissingFilter { table });
        }

        let mut map = self.tables.write().expect("lock poisoned");
        let mut updated = Vec::new();
        if let Some(stored) = map.get_mut(&table) {
            for row in stored.iter_mut().filter(|r| matches_all(filters, r)) {
                apply_patch(row, &patch);
                updated.push(row.clone());
            }
        }
        debug!(%table, count = updated.len(), "updated rows in memory");
        Ok(updated)
    }

    async fn delete(&self, table: TableName, filters: &[Filter]) -> Result<Vec<Row>, MetaError> {
        if filters.is_empty() {
            return Err(MetaError::MissingFilter { table });
        }

        let mut map = self.tables.write().expect("lock poisoned");
        let deleted = match map.get_mut(&table) {
            Some(stored) => {
                let (gone, kept): (Vec<Row>, Vec<Row>) = std::mem::take(stored)
                    .into_iter()
                    .partition(|r| matches_all(filters, r));
                *stored = kept;
                gone
            }
            None => Vec::new(),
        };
        debug!(%table, count = deleted.len(), "deleted rows from memory");
        Ok(deleted)
    }
}
