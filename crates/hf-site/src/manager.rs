//! Generic CRUD manager for one table.

use std::sync::Arc;

use hf_meta::{Filter, Query, TableClient};
use hf_types::events::Mutation;
use hf_types::{RowId, TableName};
use tracing::{info, warn};

use crate::cache::ListingCache;
use crate::entity::{Draft, Entity, decode, encode};
use crate::error::SiteError;

/// Editing state of a manager's form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Idle,
    Creating,
    Editing(RowId),
}

/// One manager's form: the edit mode plus its single draft buffer.
///
/// Only one row is ever being created or edited at a time; opening the form
/// again replaces the draft.
#[derive(Debug, Clone, Default)]
pub struct Editor<D: Draft> {
    mode: EditMode,
    draft: D,
}

impl<D: Draft> Editor<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn draft(&self) -> &D {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut D {
        &mut self.draft
    }

    /// Clear the draft and start a create.
    pub fn open_create(&mut self) {
        self.draft = D::default();
        self.mode = EditMode::Creating;
    }

    /// Load `draft` for editing row `id`.
    pub fn open_edit(&mut self, id: RowId, draft: D) {
        self.draft = draft;
        self.mode = EditMode::Editing(id);
    }

    /// Drop the draft and go idle.
    pub fn cancel(&mut self) {
        self.draft = D::default();
        self.mode = EditMode::Idle;
    }
}

/// Listing and create/update/delete for one table of `E`.
///
/// Managers hold no form state; each caller owns an [`Editor`]. Every
/// successful write invalidates the table in the shared [`ListingCache`], so
/// the admin listing and the public sections both see it on their next read.
pub struct EntityManager<E: Entity> {
    table: TableName,
    cache: Arc<ListingCache>,
    _entity: std::marker::PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for EntityManager<E> {
    fn clone(&self) -> Self {
        Self {
            table: self.table,
            cache: Arc::clone(&self.cache),
            _entity: std::marker::PhantomData,
        }
    }
}

impl<E: Entity> EntityManager<E> {
    pub fn new(table: TableName, cache: Arc<ListingCache>) -> Self {
        Self {
            table,
            cache,
            _entity: std::marker::PhantomData,
        }
    }

    pub fn table(&self) -> TableName {
        self.table
    }

    fn client(&self) -> &Arc<dyn TableClient> {
        self.cache.client()
    }

    /// All rows, in the entity's listing order.
    pub async fn list(&self) -> Result<Vec<E>, SiteError> {
        let query = Query::select_all(self.table).order(E::listing_order());
        self.cache
            .rows(&query)
            .await?
            .into_iter()
            .map(|row| decode(self.table, row))
            .collect()
    }

    /// One row by id.
    pub async fn get(&self, id: RowId) -> Result<E, SiteError> {
        let query = Query::select_all(self.table).eq("id", id.to_string());
        match self.cache.rows(&query).await?.into_iter().next() {
            Some(row) => decode(self.table, row),
            None => Err(SiteError::NotFound {
                table: self.table,
                id,
            }),
        }
    }

    /// Validate `draft` and insert it.
    pub async fn create(&self, draft: &E::Draft) -> Result<E, SiteError> {
        let row = encode(&draft.validate(self.table)?)?;
        let inserted = self.client().insert(self.table, vec![row]).await?;
        self.cache.invalidate(self.table, Mutation::Insert);

        let row = inserted
            .into_iter()
            .next()
            .ok_or_else(|| hf_meta::MetaError::Backend {
                message: format!("insert into {} returned no row", self.table),
            })?;
        let created: E = decode(self.table, row)?;
        info!(table = %self.table, id = %created.id(), "row created");
        Ok(created)
    }

    /// Validate `draft` and write it over row `id`.
    pub async fn update(&self, id: RowId, draft: &E::Draft) -> Result<E, SiteError> {
        let patch = encode(&draft.validate(self.table)?)?;
        let updated = self
            .client()
            .update(self.table, patch, &[Filter::id(id)])
            .await?;

        let Some(row) = updated.into_iter().next() else {
            warn!(table = %self.table, %id, "update matched no row");
            return Err(SiteError::NotFound {
                table: self.table,
                id,
            });
        };
        self.cache.invalidate(self.table, Mutation::Update);
        info!(table = %self.table, %id, "row updated");
        decode(self.table, row)
    }

    /// Delete row `id`. Irreversible.
    pub async fn delete(&self, id: RowId) -> Result<(), SiteError> {
        let deleted = self.client().delete(self.table, &[Filter::id(id)]).await?;
        if deleted.is_empty() {
            warn!(table = %self.table, %id, "delete matched no row");
            return Err(SiteError::NotFound {
                table: self.table,
                id,
            });
        }
        self.cache.invalidate(self.table, Mutation::Delete);
        info!(table = %self.table, %id, "row deleted");
        Ok(())
    }

    /// Load row `id` into `editor` and enter [`EditMode::Editing`].
    pub async fn open_edit(
        &self,
        editor: &mut Editor<E::Draft>,
        id: RowId,
    ) -> Result<(), SiteError> {
        let record = self.get(id).await?;
        editor.open_edit(id, record.to_draft());
        Ok(())
    }

    /// Create or update from `editor` according to its mode.
    ///
    /// On success the editor is reset to idle. On failure mode and draft are
    /// left as they were so the admin can fix and retry.
    pub async fn submit(&self, editor: &mut Editor<E::Draft>) -> Result<E, SiteError> {
        let saved = match editor.mode() {
            EditMode::Idle => return Err(SiteError::NotEditing),
            EditMode::Creating => self.create(editor.draft()).await?,
            EditMode::Editing(id) => self.update(id, editor.draft()).await?,
        };
        editor.cancel();
        Ok(saved)
    }
}
