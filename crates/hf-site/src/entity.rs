//! Record and draft types for every managed table.
//!
//! A [`Record`] is a row as read back from the backend. An [`Entity`] is a
//! record the dashboard can create and edit; its [`Draft`] holds the form
//! text and turns into a typed payload only through [`Draft::validate`].

use std::fmt::Debug;

use hf_meta::{Order, Row};
use hf_types::{
    ContactRequest, ContactStatus, ContentSection, Equipment, EquipmentType, GalleryItem,
    Material, MaterialCategory, MaterialKind, Promotion, RowId, SiteContentBlock, TableName,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SiteError;
use crate::validation::{
    ValidationError, choice, coerce_bounded, coerce_decimal, form_text, optional_text, require,
};

/// Unit shown for materials when none is given.
pub const DEFAULT_UNIT: &str = "ton";

/// A backend row decoded into its explicit type.
pub trait Record: DeserializeOwned + Serialize + Clone + Debug + Send + Sync + 'static {
    /// Ordering every listing of this record uses.
    fn listing_order() -> Order;

    fn id(&self) -> RowId;
}

/// A record the dashboard can create, edit and delete.
pub trait Entity: Record {
    type Draft: Draft;

    /// Load this record into a form.
    fn to_draft(&self) -> Self::Draft;
}

/// Form state for one entity.
pub trait Draft:
    Default + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// What gets written once validation passes.
    type Payload: Serialize;

    /// Check required fields and coerce text into typed values.
    ///
    /// `table` is the target table; material categories depend on it.
    fn validate(&self, table: TableName) -> Result<Self::Payload, ValidationError>;

    /// The image URL field, for drafts that carry one.
    fn image_url_mut(&mut self) -> Option<&mut String> {
        None
    }
}

/// Decode one backend row.
pub(crate) fn decode<R: Record>(table: TableName, row: Row) -> Result<R, SiteError> {
    serde_json::from_value(serde_json::Value::Object(row))
        .map_err(|source| SiteError::Decode { table, source })
}

/// Encode a validated payload as a row patch.
///
/// `None` fields are kept as explicit `null`s so clearing a value on update
/// actually clears it.
pub(crate) fn encode<P: Serialize>(payload: &P) -> Result<Row, SiteError> {
    match serde_json::to_value(payload)? {
        serde_json::Value::Object(row) => Ok(row),
        other => Err(SiteError::Encode(serde::ser::Error::custom(format!(
            "payload is not an object: {other}"
        )))),
    }
}

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub description: String,
    pub available: bool,
    #[serde(deserialize_with = "form_text")]
    pub rental_price_per_day: String,
    pub image_url: String,
}

impl Default for EquipmentDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            equipment_type: EquipmentType::Truck.to_string(),
            description: String::new(),
            available: true,
            rental_price_per_day: String::new(),
            image_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: EquipmentType,
    pub description: Option<String>,
    pub available: bool,
    pub rental_price_per_day: Option<f64>,
    pub image_url: Option<String>,
}

impl Draft for EquipmentDraft {
    type Payload = EquipmentPayload;

    fn validate(&self, _table: TableName) -> Result<EquipmentPayload, ValidationError> {
        Ok(EquipmentPayload {
            name: require("name", &self.name)?,
            equipment_type: choice("type", &self.equipment_type)?,
            description: optional_text(&self.description),
            available: self.available,
            rental_price_per_day: coerce_decimal(
                "rental_price_per_day",
                &self.rental_price_per_day,
            )?,
            image_url: optional_text(&self.image_url),
        })
    }

    fn image_url_mut(&mut self) -> Option<&mut String> {
        Some(&mut self.image_url)
    }
}

impl Record for Equipment {
    fn listing_order() -> Order {
        Order::asc("name")
    }

    fn id(&self) -> RowId {
        self.id
    }
}

impl Entity for Equipment {
    type Draft = EquipmentDraft;

    fn to_draft(&self) -> EquipmentDraft {
        EquipmentDraft {
            name: self.name.clone(),
            equipment_type: self.equipment_type.to_string(),
            description: self.description.clone().unwrap_or_default(),
            available: self.available,
            rental_price_per_day: price_text(self.rental_price_per_day),
            image_url: self.image_url.clone().unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Materials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDraft {
    pub name: String,
    pub category: String,
    pub description: String,
    pub in_stock: bool,
    #[serde(deserialize_with = "form_text")]
    pub price_per_unit: String,
    pub unit: String,
    pub image_url: String,
}

impl Default for MaterialDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            category: String::new(),
            description: String::new(),
            in_stock: true,
            price_per_unit: String::new(),
            unit: DEFAULT_UNIT.to_string(),
            image_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialPayload {
    pub name: String,
    pub category: MaterialCategory,
    pub description: Option<String>,
    pub in_stock: bool,
    pub price_per_unit: Option<f64>,
    pub unit: String,
    pub image_url: Option<String>,
}

impl Draft for MaterialDraft {
    type Payload = MaterialPayload;

    fn validate(&self, table: TableName) -> Result<MaterialPayload, ValidationError> {
        let kind =
            MaterialKind::from_table(table).ok_or(ValidationError::NotMaterialTable { table })?;
        let name = require("name", &self.name)?;
        let category: MaterialCategory = choice("category", &self.category)?;
        if !kind.allows(category) {
            return Err(ValidationError::CategoryNotAllowed { category, table });
        }

        Ok(MaterialPayload {
            name,
            category,
            description: optional_text(&self.description),
            in_stock: self.in_stock,
            price_per_unit: coerce_decimal("price_per_unit", &self.price_per_unit)?,
            unit: optional_text(&self.unit).unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            image_url: optional_text(&self.image_url),
        })
    }

    fn image_url_mut(&mut self) -> Option<&mut String> {
        Some(&mut self.image_url)
    }
}

impl Record for Material {
    fn listing_order() -> Order {
        Order::asc("name")
    }

    fn id(&self) -> RowId {
        self.id
    }
}

impl Entity for Material {
    type Draft = MaterialDraft;

    fn to_draft(&self) -> MaterialDraft {
        MaterialDraft {
            name: self.name.clone(),
            category: self.category.to_string(),
            description: self.description.clone().unwrap_or_default(),
            in_stock: self.in_stock,
            price_per_unit: price_text(self.price_per_unit),
            unit: self.unit.clone(),
            image_url: self.image_url.clone().unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Promotions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionDraft {
    pub title: String,
    pub description: String,
    #[serde(deserialize_with = "form_text")]
    pub discount_percentage: String,
    pub active: bool,
}

impl Default for PromotionDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            discount_percentage: String::new(),
            active: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromotionPayload {
    pub title: String,
    pub description: String,
    pub discount_percentage: Option<f64>,
    pub active: bool,
}

impl Draft for PromotionDraft {
    type Payload = PromotionPayload;

    fn validate(&self, _table: TableName) -> Result<PromotionPayload, ValidationError> {
        Ok(PromotionPayload {
            title: require("title", &self.title)?,
            description: require("description", &self.description)?,
            discount_percentage: coerce_bounded(
                "discount_percentage",
                &self.discount_percentage,
                100.0,
            )?,
            active: self.active,
        })
    }
}

impl Record for Promotion {
    fn listing_order() -> Order {
        Order::desc("created_at")
    }

    fn id(&self) -> RowId {
        self.id
    }
}

impl Entity for Promotion {
    type Draft = PromotionDraft;

    fn to_draft(&self) -> PromotionDraft {
        PromotionDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            discount_percentage: price_text(self.discount_percentage),
            active: self.active,
        }
    }
}

// ---------------------------------------------------------------------------
// Gallery
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryDraft {
    pub image_url: String,
    pub title: String,
    pub description: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryPayload {
    pub image_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl Draft for GalleryDraft {
    type Payload = GalleryPayload;

    fn validate(&self, _table: TableName) -> Result<GalleryPayload, ValidationError> {
        Ok(GalleryPayload {
            image_url: require("image_url", &self.image_url)?,
            title: optional_text(&self.title),
            description: optional_text(&self.description),
            category: optional_text(&self.category),
        })
    }

    fn image_url_mut(&mut self) -> Option<&mut String> {
        Some(&mut self.image_url)
    }
}

impl Record for GalleryItem {
    fn listing_order() -> Order {
        Order::desc("created_at")
    }

    fn id(&self) -> RowId {
        self.id
    }
}

impl Entity for GalleryItem {
    type Draft = GalleryDraft;

    fn to_draft(&self) -> GalleryDraft {
        GalleryDraft {
            image_url: self.image_url.clone(),
            title: self.title.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            category: self.category.clone().unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Read-mostly records
// ---------------------------------------------------------------------------

impl Record for SiteContentBlock {
    fn listing_order() -> Order {
        Order::asc("section")
    }

    fn id(&self) -> RowId {
        self.id
    }
}

impl Record for ContactRequest {
    fn listing_order() -> Order {
        Order::desc("created_at")
    }

    fn id(&self) -> RowId {
        self.id
    }
}

/// Insert payload for a content block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ContentPayload {
    pub section: ContentSection,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Status-only patch for a contact request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct StatusPatch {
    pub status: ContactStatus,
}

/// Text an edit form shows for an optional number.
fn price_text(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
