//! Table client for the H&F site.
//!
//! [`TableClient`] is the seam every manager and public section talks to:
//! select / insert / update / delete against a named table, with the
//! selected columns and filter/order clauses always spelled out in a
//! [`Query`] or a filter list. Two backends ship with the crate:
//!
//! - [`MemoryTables`] — volatile, one `Vec<Row>` per table.
//! - [`FjallTables`] — persistent, one Fjall keyspace per table, rows stored
//!   as JSON documents keyed by row id.
//!
//! Backends own identity: they mint `id` and `created_at` on insert.

mod client;
mod error;
mod memory;
mod query;
mod store;

pub use client::TableClient;
pub use error::MetaError;
pub use memory::MemoryTables;
pub use query::{Filter, Order, Query, Row};
pub use store::FjallTables;
