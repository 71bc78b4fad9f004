//! Section-keyed content blocks and the site logo.

use std::sync::Arc;

use hf_meta::{Filter, Query, TableClient};
use hf_types::events::Mutation;
use hf_types::{ContentSection, SiteContentBlock, TableName};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::ListingCache;
use crate::entity::{ContentPayload, Record, decode, encode};
use crate::error::SiteError;
use crate::public::{ABOUT_FALLBACK, HERO_TEXT_FALLBACK, HERO_TITLE_FALLBACK, MISSION_FALLBACK};
use crate::upload::{ImageInput, ImageUploader};
use crate::validation::optional_text;

const TABLE: TableName = TableName::SiteContent;

/// Folder logo uploads are stored under.
pub const LOGO_FOLDER: &str = "branding";

/// Title given to a logo block created on first upload.
pub const LOGO_TITLE: &str = "Company Logo";

/// Section-scoped edit buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDraft {
    pub section: ContentSection,
    pub content: String,
}

/// Editor for the text blocks of the public site.
#[derive(Clone)]
pub struct ContentManager {
    cache: Arc<ListingCache>,
}

impl ContentManager {
    pub fn new(cache: Arc<ListingCache>) -> Self {
        Self { cache }
    }

    /// Every block except the logo, ordered by section.
    pub async fn list(&self) -> Result<Vec<SiteContentBlock>, SiteError> {
        let query = Query::select_all(TABLE).order(SiteContentBlock::listing_order());
        let mut blocks = Vec::new();
        for row in self.cache.rows(&query).await? {
            let block: SiteContentBlock = decode(TABLE, row)?;
            if block.section != ContentSection::Logo {
                blocks.push(block);
            }
        }
        Ok(blocks)
    }

    /// The block for `section`, if one exists.
    pub async fn block(
        &self,
        section: ContentSection,
    ) -> Result<Option<SiteContentBlock>, SiteError> {
        let query = Query::select_all(TABLE).eq("section", section.as_str());
        self.cache
            .rows(&query)
            .await?
            .into_iter()
            .next()
            .map(|row| decode(TABLE, row))
            .transpose()
    }

    /// Load `section` into a draft. A missing block edits as empty text.
    pub async fn edit(&self, section: ContentSection) -> Result<ContentDraft, SiteError> {
        let content = self
            .block(section)
            .await?
            .and_then(|b| b.content)
            .unwrap_or_default();
        Ok(ContentDraft { section, content })
    }

    /// Write `content` to `section`.
    ///
    /// Updates the existing block; if the section has none yet, one is
    /// inserted with the section's heading as its title.
    pub async fn save(
        &self,
        section: ContentSection,
        content: &str,
    ) -> Result<SiteContentBlock, SiteError> {
        upsert(&self.cache, section, section.heading(), optional_text(content)).await
    }

    /// Insert the default hero, about and mission blocks where missing.
    ///
    /// Existing blocks are left alone. Returns how many were created.
    pub async fn seed_defaults(&self) -> Result<usize, SiteError> {
        let defaults = [
            (ContentSection::Hero, HERO_TITLE_FALLBACK, HERO_TEXT_FALLBACK),
            (ContentSection::About, ContentSection::About.heading(), ABOUT_FALLBACK),
            (ContentSection::Mission, ContentSection::Mission.heading(), MISSION_FALLBACK),
        ];

        let mut missing = Vec::new();
        for (section, title, content) in defaults {
            if self.block(section).await?.is_none() {
                missing.push(encode(&ContentPayload {
                    section,
                    title: Some(title.to_string()),
                    content: Some(content.to_string()),
                })?);
            }
        }
        if missing.is_empty() {
            return Ok(0);
        }

        let inserted = self.cache.client().insert(TABLE, missing).await?;
        self.cache.invalidate(TABLE, Mutation::Insert);
        info!(count = inserted.len(), "default content blocks seeded");
        Ok(inserted.len())
    }
}

/// Reads and replaces the `logo` content block.
#[derive(Clone)]
pub struct LogoManager {
    cache: Arc<ListingCache>,
    uploader: Arc<ImageUploader>,
}

impl LogoManager {
    pub fn new(cache: Arc<ListingCache>, uploader: Arc<ImageUploader>) -> Self {
        Self { cache, uploader }
    }

    /// The current logo block.
    pub async fn logo(&self) -> Result<Option<SiteContentBlock>, SiteError> {
        let query = Query::select_all(TABLE).eq("section", ContentSection::Logo.as_str());
        self.cache
            .rows(&query)
            .await?
            .into_iter()
            .next()
            .map(|row| decode(TABLE, row))
            .transpose()
    }

    /// Point the logo at `url`, creating the block on first use.
    pub async fn set_logo(&self, url: &str) -> Result<SiteContentBlock, SiteError> {
        upsert(&self.cache, ContentSection::Logo, LOGO_TITLE, optional_text(url)).await
    }

    /// Upload, paste or clear the logo.
    ///
    /// Uploads without a folder land in [`LOGO_FOLDER`]. A failed upload
    /// leaves the stored logo untouched.
    pub async fn apply(&self, input: ImageInput) -> Result<SiteContentBlock, SiteError> {
        let input = match input {
            ImageInput::Upload { file, folder: None } => ImageInput::Upload {
                file,
                folder: Some(LOGO_FOLDER.to_string()),
            },
            other => other,
        };

        let mut url = self
            .logo()
            .await?
            .and_then(|b| b.content)
            .unwrap_or_default();
        self.uploader.apply(input, &mut url).await?;
        self.set_logo(&url).await
    }
}

/// Update the block for `section`, or insert it if missing.
async fn upsert(
    cache: &ListingCache,
    section: ContentSection,
    title: &str,
    content: Option<String>,
) -> Result<SiteContentBlock, SiteError> {
    let client: &Arc<dyn TableClient> = cache.client();

    let mut patch = hf_meta::Row::new();
    patch.insert("content".to_string(), content.clone().into());
    let updated = client
        .update(TABLE, patch, &[Filter::eq("section", section.as_str())])
        .await?;

    if let Some(row) = updated.into_iter().next() {
        cache.invalidate(TABLE, Mutation::Update);
        info!(%section, "content block updated");
        return decode(TABLE, row);
    }

    let payload = ContentPayload {
        section,
        title: Some(title.to_string()),
        content,
    };
    let inserted = client.insert(TABLE, vec![encode(&payload)?]).await?;
    cache.invalidate(TABLE, Mutation::Insert);
    info!(%section, "content block created");

    let row = inserted
        .into_iter()
        .next()
        .ok_or_else(|| hf_meta::MetaError::Backend {
            message: format!("insert into {TABLE} returned no row"),
        })?;
    decode(TABLE, row)
}
