//! The H&F site: admin managers, image uploads and the public sections.
//!
//! [`Site`] wires everything to one table backend and one object store:
//!
//! - [`Dashboard`] — an [`EntityManager`] per editable table plus the
//!   content, logo and contact-request managers;
//! - [`PublicSite`] — the read-only sections and the composed page;
//! - [`ListingCache`] — the single cache both sides read through.
//!
//! Writes go straight to the backend and then invalidate the table they
//! touched; nothing is updated optimistically.

pub mod cache;
pub mod contacts;
pub mod content;
pub mod dashboard;
pub mod entity;
pub mod error;
pub mod manager;
pub mod public;
pub mod upload;
pub mod validation;


use std::sync::Arc;

use hf_meta::TableClient;
use hf_store::ObjectStore;
use hf_types::events::EventBus;

pub use cache::ListingCache;
pub use contacts::ContactRequestManager;
pub use content::{ContentDraft, ContentManager, LogoManager};
pub use dashboard::{Dashboard, DashboardOverview};
pub use entity::{
    Draft, Entity, EquipmentDraft, GalleryDraft, MaterialDraft, PromotionDraft, Record,
};
pub use error::SiteError;
pub use manager::{EditMode, Editor, EntityManager};
pub use public::{PublicSite, SitePage};
pub use upload::{DEFAULT_BUCKET, DEFAULT_FOLDER, ImageFile, ImageInput, ImageUploader};
pub use validation::ValidationError;

/// Public site and dashboard sharing one cache, uploader and event bus.
#[derive(Clone)]
pub struct Site {
    pub public: PublicSite,
    pub dashboard: Dashboard,
    pub bus: EventBus,
}

impl Site {
    pub fn new(
        tables: Arc<dyn TableClient>,
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
    ) -> Self {
        let bus = EventBus::new();
        let cache = Arc::new(ListingCache::new(tables, bus.clone()));
        let uploader = Arc::new(ImageUploader::new(store, bucket, bus.clone()));
        Self {
            public: PublicSite::new(cache.clone()),
            dashboard: Dashboard::new(cache, uploader),
            bus,
        }
    }
}
