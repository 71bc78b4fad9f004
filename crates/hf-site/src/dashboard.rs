//! The admin dashboard: every manager behind one handle.

use std::sync::Arc;

use hf_meta::Query;
use hf_types::{Equipment, GalleryItem, Material, MaterialKind, Promotion, TableName};
use serde::Serialize;

use crate::cache::ListingCache;
use crate::contacts::ContactRequestManager;
use crate::content::{ContentManager, LogoManager};
use crate::error::SiteError;
use crate::manager::EntityManager;
use crate::upload::ImageUploader;

/// Dashboard tabs, in display order.
pub const TABS: [&str; 6] = [
    "equipment",
    "materials",
    "promotions",
    "gallery",
    "content",
    "contacts",
];

/// Row counts shown on the dashboard landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardOverview {
    pub tabs: &'static [&'static str],
    pub equipment: usize,
    pub construction_materials: usize,
    pub structural_materials: usize,
    pub promotions: usize,
    pub active_promotions: usize,
    pub gallery: usize,
    pub contact_requests: usize,
    pub new_contact_requests: usize,
}

/// All admin managers, sharing one listing cache and one uploader.
#[derive(Clone)]
pub struct Dashboard {
    pub equipment: EntityManager<Equipment>,
    pub construction_materials: EntityManager<Material>,
    pub structural_materials: EntityManager<Material>,
    pub promotions: EntityManager<Promotion>,
    pub gallery: EntityManager<GalleryItem>,
    pub content: ContentManager,
    pub logo: LogoManager,
    pub contacts: ContactRequestManager,
    pub uploader: Arc<ImageUploader>,
    cache: Arc<ListingCache>,
}

impl Dashboard {
    pub fn new(cache: Arc<ListingCache>, uploader: Arc<ImageUploader>) -> Self {
        Self {
            equipment: EntityManager::new(TableName::Equipment, cache.clone()),
            construction_materials: EntityManager::new(
                TableName::ConstructionMaterials,
                cache.clone(),
            ),
            structural_materials: EntityManager::new(TableName::StructuralMaterials, cache.clone()),
            promotions: EntityManager::new(TableName::Promotions, cache.clone()),
            gallery: EntityManager::new(TableName::Gallery, cache.clone()),
            content: ContentManager::new(cache.clone()),
            logo: LogoManager::new(cache.clone(), uploader.clone()),
            contacts: ContactRequestManager::new(cache.clone()),
            uploader,
            cache,
        }
    }

    /// The manager for one material table.
    pub fn materials(&self, kind: MaterialKind) -> &EntityManager<Material> {
        match kind {
            MaterialKind::Construction => &self.construction_materials,
            MaterialKind::Structural => &self.structural_materials,
        }
    }

    pub fn cache(&self) -> &Arc<ListingCache> {
        &self.cache
    }

    /// Counts for the landing page.
    pub async fn overview(&self) -> Result<DashboardOverview, SiteError> {
        let (equipment, construction_materials, structural_materials) = tokio::try_join!(
            self.count(TableName::Equipment),
            self.count(TableName::ConstructionMaterials),
            self.count(TableName::StructuralMaterials),
        )?;
        let (promotions, gallery, contact_requests) = tokio::try_join!(
            self.count(TableName::Promotions),
            self.count(TableName::Gallery),
            self.count(TableName::ContactRequests),
        )?;
        let active_promotions = self
            .cache
            .rows(&Query::select_all(TableName::Promotions).eq("active", true))
            .await?
            .len();
        let new_contact_requests = self.contacts.unhandled().await?;

        Ok(DashboardOverview {
            tabs: &TABS,
            equipment,
            construction_materials,
            structural_materials,
            promotions,
            active_promotions,
            gallery,
            contact_requests,
            new_contact_requests,
        })
    }

    async fn count(&self, table: TableName) -> Result<usize, SiteError> {
        Ok(self.cache.snapshot(table).await?.len())
    }
}
