//! Listing cache keyed by table name.
//!
//! Every consumer of a table (the admin listing, the public sections, the
//! dashboard overview) reads through the same [`ListingCache`]. A write
//! calls [`ListingCache::invalidate`] once for the table it touched; the next
//! read re-fetches from the backend. Consumers never track each other.
//!
//! The cache holds a whole-table snapshot and answers each [`Query`] from it
//! locally, so `select * order by name` and `where active = true` on the
//! same table share one fetch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use hf_meta::{MetaError, Query, Row, TableClient};
use hf_types::TableName;
use hf_types::events::{EventBus, Mutation, TableInvalidated};
use tracing::debug;

#[derive(Default)]
struct Slot {
    /// Bumped on every invalidation.
    generation: u64,
    rows: Option<Arc<Vec<Row>>>,
}

/// Whole-table snapshots with one invalidation signal per table.
pub struct ListingCache {
    client: Arc<dyn TableClient>,
    bus: EventBus,
    slots: Mutex<HashMap<TableName, Slot>>,
}

impl ListingCache {
    pub fn new(client: Arc<dyn TableClient>, bus: EventBus) -> Self {
        Self {
            client,
            bus,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The backend this cache reads from.
    pub fn client(&self) -> &Arc<dyn TableClient> {
        &self.client
    }

    /// The bus invalidations are announced on.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Answer `query` from the cached snapshot of `query.table`, fetching the
    /// snapshot first if needed.
    pub async fn rows(&self, query: &Query) -> Result<Vec<Row>, MetaError> {
        let snapshot = self.snapshot(query.table).await?;
        Ok(query.apply(snapshot.iter()))
    }

    /// Full contents of `table`.
    pub async fn snapshot(&self, table: TableName) -> Result<Arc<Vec<Row>>, MetaError> {
        let generation = {
            let slots = self.slots.lock().expect("cache lock poisoned");
            match slots.get(&table) {
                Some(Slot {
                    rows: Some(rows), ..
                }) => return Ok(Arc::clone(rows)),
                Some(slot) => slot.generation,
                None => 0,
            }
        };

        debug!(%table, "listing cache miss");
        let rows = Arc::new(self.client.select(&Query::select_all(table)).await?);

        // A write that landed while we were fetching makes this snapshot
        // stale: hand it to this caller but do not keep it.
        let mut slots = self.slots.lock().expect("cache lock poisoned");
        let slot = slots.entry(table).or_default();
        if slot.generation == generation {
            slot.rows = Some(Arc::clone(&rows));
        }
        Ok(rows)
    }

    /// Drop the snapshot of `table` and announce it on the bus.
    pub fn invalidate(&self, table: TableName, mutation: Mutation) {
        {
            let mut slots = self.slots.lock().expect("cache lock poisoned");
            let slot = slots.entry(table).or_default();
            slot.generation += 1;
            slot.rows = None;
        }
        debug!(%table, ?mutation, "listing invalidated");
        self.bus.emit(TableInvalidated { table, mutation });
    }

    /// Whether a snapshot of `table` is currently held.
    pub fn is_cached(&self, table: TableName) -> bool {
        self.slots
            .lock()
            .expect("cache lock poisoned")
            .get(&table)
            .is_some_and(|s| s.rows.is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use hf_meta::{Filter, MemoryTables, Order};
    use serde_json::json;

    use super::*;

    /// Counts selects so tests can see cache hits.
    struct CountingTables {
        inner: MemoryTables,
        selects: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl TableClient for CountingTables {
        async fn select(&self, query: &Query) -> Result<Vec<Row>, MetaError> {
            self.selects.fetch_add(1, Ordering::SeqCst);
            self.inner.select(query).await
        }

        async fn insert(&self, table: TableName, rows: Vec<Row>) -> Result<Vec<Row>, MetaError> {
            self.inner.insert(table, rows).await
        }

        async fn update(
            &self,
            table: TableName,
            patch: Row,
            filters: &[Filter],
        ) -> Result<Vec<Row>, MetaError> {
            self.inner.update(table, patch, filters).await
        }

        async fn delete(
            &self,
            table: TableName,
            filters: &[Filter],
        ) -> Result<Vec<Row>, MetaError> {
            self.inner.delete(table, filters).await
        }
    }

    fn setup() -> (Arc<CountingTables>, ListingCache, EventBus) {
        let tables = Arc::new(CountingTables {
            inner: MemoryTables::new(),
            selects: AtomicUsize::new(0),
        });
        let bus = EventBus::new();
        let cache = ListingCache::new(tables.clone(), bus.clone());
        (tables, cache, bus)
    }

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_queries_share_one_fetch() {
        let (tables, cache, _) = setup();
        tables
            .insert(
                TableName::Promotions,
                vec![
                    row(json!({ "title": "A", "active": true })),
                    row(json!({ "title": "B", "active": false })),
                ],
            )
            .await
            .unwrap();

        let all = cache
            .rows(&Query::select_all(TableName::Promotions).order(Order::asc("title")))
            .await
            .unwrap();
        let active = cache
            .rows(&Query::select_all(TableName::Promotions).eq("active", true))
            .await
            .unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(active.len(), 1);
        assert_eq!(tables.selects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_refetches_and_announces() {
        let (tables, cache, bus) = setup();
        let mut rx = bus.subscribe::<TableInvalidated>();

        cache.snapshot(TableName::Gallery).await.unwrap();
        assert!(cache.is_cached(TableName::Gallery));

        tables
            .insert(
                TableName::Gallery,
                vec![row(json!({ "image_url": "http://x/a.png" }))],
            )
            .await
            .unwrap();
        cache.invalidate(TableName::Gallery, Mutation::Insert);
        assert!(!cache.is_cached(TableName::Gallery));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.table, TableName::Gallery);
        assert_eq!(event.mutation, Mutation::Insert);

        let rows = cache.snapshot(TableName::Gallery).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(tables.selects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidation_is_per_table() {
        let (tables, cache, _) = setup();
        cache.snapshot(TableName::Equipment).await.unwrap();
        cache.snapshot(TableName::Promotions).await.unwrap();

        cache.invalidate(TableName::Equipment, Mutation::Delete);
        assert!(!cache.is_cached(TableName::Equipment));
        assert!(cache.is_cached(TableName::Promotions));
        assert_eq!(tables.selects.load(Ordering::SeqCst), 2);
    }
}
