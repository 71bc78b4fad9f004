//! The table client trait.

use hf_types::TableName;

use crate::error::MetaError;
use crate::query::{Filter, Query, Row};

/// Typed requests against named backend tables.
///
/// All implementations must be `Send + Sync` for use across async tasks.
/// Every write returns the rows it touched, so callers can tell a no-op
/// (empty result) from a success.
#[async_trait::async_trait]
pub trait TableClient: Send + Sync {
    /// Fetch the rows matching `query`, filtered, ordered and projected.
    async fn select(&self, query: &Query) -> Result<Vec<Row>, MetaError>;

    /// Insert rows. The backend assigns `id` and `created_at`; the stored
    /// rows are returned in input order.
    async fn insert(&self, table: TableName, rows: Vec<Row>) -> Result<Vec<Row>, MetaError>;

    /// Merge `patch` into every row matching all `filters`.
    ///
    /// Fails with [`MetaError::MissingFilter`] when `filters` is empty.
    async fn update(
        &self,
        table: TableName,
        patch: Row,
        filters: &[Filter],
    ) -> Result<Vec<Row>, MetaError>;

    /// Delete every row matching all `filters`, returning the removed rows.
    ///
    /// Fails with [`MetaError::MissingFilter`] when `filters` is empty.
    async fn delete(&self, table: TableName, filters: &[Filter]) -> Result<Vec<Row>, MetaError>;
}
