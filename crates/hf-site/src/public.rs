//! Read-only sections of the public site.
//!
//! Each section reads through the shared [`ListingCache`], so an admin write
//! shows up here on the next fetch. Views carry the display strings the site
//! renders ("Available", "$250/day", "15% OFF", ...).

use std::sync::Arc;

use hf_meta::Query;
use hf_types::{
    ContentSection, Equipment, EquipmentType, GalleryItem, Material, MaterialCategory,
    MaterialKind, Promotion, RowId, SiteContentBlock, TableName,
};
use serde::Serialize;

use crate::cache::ListingCache;
use crate::entity::{Record, decode};
use crate::error::SiteError;

pub const HERO_TITLE_FALLBACK: &str = "H&F Ltd";
pub const HERO_TEXT_FALLBACK: &str = "Professional Construction Equipment & Materials";
pub const ABOUT_FALLBACK: &str = "H&F Ltd is your trusted partner for all construction needs. \
With years of experience in the industry, we provide top-quality equipment rentals, \
professional land levelling services, and a comprehensive selection of construction and \
structural materials.";
pub const MISSION_FALLBACK: &str = "To deliver exceptional construction services and materials \
that exceed our customers' expectations while maintaining the highest standards of safety and \
quality.";
pub const GALLERY_ALT_FALLBACK: &str = "Gallery image";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentView {
    pub id: RowId,
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: EquipmentType,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub available: bool,
    /// `"Available"` or `"Rented"`.
    pub status: &'static str,
    /// `"$250/day"` when a price is published.
    pub price: Option<String>,
}

impl From<Equipment> for EquipmentView {
    fn from(e: Equipment) -> Self {
        Self {
            id: e.id,
            status: if e.available { "Available" } else { "Rented" },
            price: e.rental_price_per_day.map(|p| format!("${p}/day")),
            name: e.name,
            equipment_type: e.equipment_type,
            description: e.description,
            image_url: e.image_url,
            available: e.available,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialView {
    pub id: RowId,
    pub name: String,
    pub category: MaterialCategory,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub in_stock: bool,
    /// `"In Stock"` or `"Out of Stock"`.
    pub stock: &'static str,
    /// `"$12.5/ton"` when a price is published.
    pub price: Option<String>,
}

impl From<Material> for MaterialView {
    fn from(m: Material) -> Self {
        Self {
            id: m.id,
            stock: if m.in_stock { "In Stock" } else { "Out of Stock" },
            price: m.price_per_unit.map(|p| format!("${p}/{}", m.unit)),
            name: m.name,
            category: m.category,
            description: m.description,
            image_url: m.image_url,
            in_stock: m.in_stock,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromotionView {
    pub id: RowId,
    pub title: String,
    pub description: String,
    /// `"15% OFF"` when a discount is set.
    pub badge: Option<String>,
}

impl From<Promotion> for PromotionView {
    fn from(p: Promotion) -> Self {
        Self {
            id: p.id,
            badge: p.discount_percentage.map(|d| format!("{d}% OFF")),
            title: p.title,
            description: p.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryView {
    pub id: RowId,
    pub image_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Title, or [`GALLERY_ALT_FALLBACK`].
    pub alt: String,
}

impl From<GalleryItem> for GalleryView {
    fn from(g: GalleryItem) -> Self {
        Self {
            id: g.id,
            alt: g
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| GALLERY_ALT_FALLBACK.to_string()),
            image_url: g.image_url,
            title: g.title,
            description: g.description,
            category: g.category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeroView {
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AboutView {
    pub about: String,
    pub mission: String,
}

/// Everything the home page shows, in one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitePage {
    /// `None` means the site shows its text brand.
    pub logo_url: Option<String>,
    pub hero: HeroView,
    pub about: AboutView,
    pub contact_info: Option<String>,
    pub equipment: Vec<EquipmentView>,
    pub construction_materials: Vec<MaterialView>,
    pub structural_materials: Vec<MaterialView>,
    pub promotions: Vec<PromotionView>,
    pub gallery: Vec<GalleryView>,
}

/// The public site's data sources.
#[derive(Clone)]
pub struct PublicSite {
    cache: Arc<ListingCache>,
}

impl PublicSite {
    pub fn new(cache: Arc<ListingCache>) -> Self {
        Self { cache }
    }

    async fn fetch<R: Record>(&self, query: Query) -> Result<Vec<R>, SiteError> {
        let table = query.table;
        self.cache
            .rows(&query)
            .await?
            .into_iter()
            .map(|row| decode(table, row))
            .collect()
    }

    pub async fn equipment(&self) -> Result<Vec<EquipmentView>, SiteError> {
        let query = Query::select_all(TableName::Equipment).order(Equipment::listing_order());
        let items: Vec<Equipment> = self.fetch(query).await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    pub async fn materials(&self, kind: MaterialKind) -> Result<Vec<MaterialView>, SiteError> {
        let query = Query::select_all(kind.table()).order(Material::listing_order());
        let items: Vec<Material> = self.fetch(query).await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    /// Active promotions only, newest first.
    pub async fn promotions(&self) -> Result<Vec<PromotionView>, SiteError> {
        let query = Query::select_all(TableName::Promotions)
            .eq("active", true)
            .order(Promotion::listing_order());
        let items: Vec<Promotion> = self.fetch(query).await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    pub async fn gallery(&self) -> Result<Vec<GalleryView>, SiteError> {
        let query = Query::select_all(TableName::Gallery).order(GalleryItem::listing_order());
        let items: Vec<GalleryItem> = self.fetch(query).await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    /// The block for `section`, if present.
    pub async fn content(
        &self,
        section: ContentSection,
    ) -> Result<Option<SiteContentBlock>, SiteError> {
        let query = Query::select_all(TableName::SiteContent).eq("section", section.as_str());
        Ok(self.fetch(query).await?.into_iter().next())
    }

    pub async fn hero(&self) -> Result<HeroView, SiteError> {
        let block = self.content(ContentSection::Hero).await?;
        let (title, text) = match block {
            Some(b) => (b.title, b.content),
            None => (None, None),
        };
        Ok(HeroView {
            title: or_fallback(title, HERO_TITLE_FALLBACK),
            text: or_fallback(text, HERO_TEXT_FALLBACK),
        })
    }

    pub async fn about(&self) -> Result<AboutView, SiteError> {
        let (about, mission) = tokio::try_join!(
            self.content_text(ContentSection::About),
            self.content_text(ContentSection::Mission),
        )?;
        Ok(AboutView {
            about: or_fallback(about, ABOUT_FALLBACK),
            mission: or_fallback(mission, MISSION_FALLBACK),
        })
    }

    /// Logo URL, or `None` when no logo has been set.
    pub async fn logo_url(&self) -> Result<Option<String>, SiteError> {
        Ok(self
            .content_text(ContentSection::Logo)
            .await?
            .filter(|u| !u.is_empty()))
    }

    async fn content_text(&self, section: ContentSection) -> Result<Option<String>, SiteError> {
        Ok(self.content(section).await?.and_then(|b| b.content))
    }

    /// Compose every section into one page.
    pub async fn page(&self) -> Result<SitePage, SiteError> {
        let (logo_url, hero, about, contact_info) = tokio::try_join!(
            self.logo_url(),
            self.hero(),
            self.about(),
            self.content_text(ContentSection::ContactInfo),
        )?;
        let (equipment, construction_materials, structural_materials, promotions, gallery) =
            tokio::try_join!(
                self.equipment(),
                self.materials(MaterialKind::Construction),
                self.materials(MaterialKind::Structural),
                self.promotions(),
                self.gallery(),
            )?;

        Ok(SitePage {
            logo_url,
            hero,
            about,
            contact_info: contact_info.filter(|c| !c.is_empty()),
            equipment,
            construction_materials,
            structural_materials,
            promotions,
            gallery,
        })
    }
}

fn or_fallback(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
