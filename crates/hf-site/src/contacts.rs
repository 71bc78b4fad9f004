//! Contact requests: newest-first listing and status transitions.
//!
//! Requests are created by the public contact form, outside this system.
//! The dashboard never creates or deletes them.

use std::sync::Arc;

use hf_meta::{Filter, Query};
use hf_types::events::Mutation;
use hf_types::{ContactRequest, ContactStatus, RowId, TableName};
use tracing::info;

use crate::cache::ListingCache;
use crate::entity::{Record, StatusPatch, decode, encode};
use crate::error::SiteError;

const TABLE: TableName = TableName::ContactRequests;

#[derive(Clone)]
pub struct ContactRequestManager {
    cache: Arc<ListingCache>,
}

impl ContactRequestManager {
    pub fn new(cache: Arc<ListingCache>) -> Self {
        Self { cache }
    }

    /// All requests, newest first.
    pub async fn list(&self) -> Result<Vec<ContactRequest>, SiteError> {
        let query = Query::select_all(TABLE).order(ContactRequest::listing_order());
        self.cache
            .rows(&query)
            .await?
            .into_iter()
            .map(|row| decode(TABLE, row))
            .collect()
    }

    /// Number of requests still in [`ContactStatus::New`].
    pub async fn unhandled(&self) -> Result<usize, SiteError> {
        let query = Query::select_all(TABLE).eq("status", ContactStatus::New.as_str());
        Ok(self.cache.rows(&query).await?.len())
    }

    /// Move request `id` to `status`.
    pub async fn set_status(
        &self,
        id: RowId,
        status: ContactStatus,
    ) -> Result<ContactRequest, SiteError> {
        let patch = encode(&StatusPatch { status })?;
        let updated = self
            .cache
            .client()
            .update(TABLE, patch, &[Filter::id(id)])
            .await?;

        let Some(row) = updated.into_iter().next() else {
            return Err(SiteError::NotFound { table: TABLE, id });
        };
        self.cache.invalidate(TABLE, Mutation::Update);
        info!(%id, %status, "contact request status changed");
        decode(TABLE, row)
    }
}
