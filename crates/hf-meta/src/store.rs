//! [`FjallTables`] implementation wrapping one Fjall keyspace per table.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use fjall::{Database, Keyspace, KeyspaceCreateOptions};
use hf_types::TableName;
use tempfile::TempDir;
use tracing::debug;

use crate::MetaError;
use crate::client::TableClient;
use crate::query::{Filter, Query, Row, apply_patch, prepare_insert};

type Result<T> = std::result::Result<T, MetaError>;

/// Persistent tables backed by Fjall.
///
/// Each [`TableName`] maps to a keyspace of `row id → JSON document`.
/// Unordered selects come back in key order, which is arbitrary for
/// random ids; listings always pass an explicit [`Order`](crate::Order).
///
/// Writes are serialized: an update or delete scans then writes, and a
/// concurrent writer must not land between the two steps.
pub struct FjallTables {
    #[allow(dead_code)]
    db: Database,
    keyspaces: HashMap<TableName, Keyspace>,
    write_lock: Mutex<()>,
    /// Keeps the backing directory alive for temporary stores.
    _tmp: Option<TempDir>,
}

impl FjallTables {
    /// Open persistent tables at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::builder(path).open()?;
        Self::init_keyspaces(db, None)
    }

    /// Open temporary tables that are removed on drop.
    ///
    /// Useful for tests.
    pub fn open_temporary() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let db = Database::builder(tmp.path()).temporary(true).open()?;
        Self::init_keyspaces(db, Some(tmp))
    }

    fn init_keyspaces(db: Database, tmp: Option<TempDir>) -> Result<Self> {
        let mut keyspaces = HashMap::new();
        for table in TableName::ALL {
            let ks = db.keyspace(table.as_str(), KeyspaceCreateOptions::default)?;
            keyspaces.insert(*table, ks);
        }
        Ok(Self {
            db,
            keyspaces,
            write_lock: Mutex::new(()),
            _tmp: tmp,
        })
    }

    fn keyspace(&self, table: TableName) -> &Keyspace {
        self.keyspaces
            .get(&table)
            .expect("every table has a keyspace")
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().expect("lock poisoned")
    }

    /// Load every row of a table as `(key, row)` pairs.
    fn scan(&self, table: TableName) -> Result<Vec<(Vec<u8>, Row)>> {
        let mut rows = Vec::new();
        for guard in self.keyspace(table).iter() {
            let (key, value) = guard.into_inner()?;
            let row: Row = serde_json::from_slice(&value)?;
            rows.push((key.to_vec(), row));
        }
        Ok(rows)
    }

    fn matching(&self, table: TableName, filters: &[Filter]) -> Result<Vec<(Vec<u8>, Row)>> {
        if filters.is_empty() {
            return Err(MetaError::MissingFilter { table });
        }
        Ok(self
            .scan(table)?
            .into_iter()
            .filter(|(_, row)| filters.iter().all(|f| f.matches(row)))
            .collect())
    }
}

#[async_trait::async_trait]
impl TableClient for FjallTables {
    async fn select(&self, query: &Query) -> Result<Vec<Row>> {
        let rows = self.scan(query.table)?;
        Ok(query.apply(rows.iter().map(|(_, row)| row)))
    }

    async fn insert(&self, table: TableName, rows: Vec<Row>) -> Result<Vec<Row>> {
        let ks = self.keyspace(table);
        let _writes = self.lock_writes();
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let (id, row) = prepare_insert(row);
            let value = serde_json::to_vec(&row)?;
            ks.insert(id.to_string().as_bytes(), value.as_slice())?;
            debug!(%table, %id, "stored row");
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn update(&self, table: TableName, patch: Row, filters: &[Filter]) -> Result<Vec<Row>> {
        let ks = self.keyspace(table);
        let _writes = self.lock_writes();
        let mut updated = Vec::new();
        for (key, mut row) in self.matching(table, filters)? {
            apply_patch(&mut row, &patch);
            let value = serde_json::to_vec(&row)?;
            ks.insert(key.as_slice(), value.as_slice())?;
            updated.push(row);
        }
        debug!(%table, count = updated.len(), "updated rows");
        Ok(updated)
    }

    async fn delete(&self, table: TableName, filters: &[Filter]) -> Result<Vec<Row>> {
        let ks = self.keyspace(table);
        let _writes = self.lock_writes();
        let mut deleted = Vec::new();
        for (key, row) in self.matching(table, filters)? {
            ks.remove(key.as_slice())?;
            deleted.push(row);
        }
        debug!(%table, count = deleted.len(), "deleted rows");
        Ok(deleted)
    }
}
