//! Per-entity record types.
//!
//! Each record mirrors one backend row as read back from a table. Required
//! and optional attributes are spelled out here; the table backend mints
//! `id` and `created_at`, so neither appears in the insert payloads built by
//! the managers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ContactStatus, ContentSection, EquipmentType, MaterialCategory, RowId};

/// A rentable piece of equipment (`equipment` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: RowId,
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: EquipmentType,
    #[serde(default)]
    pub description: Option<String>,
    pub available: bool,
    /// Daily rental price. `None` when not published.
    #[serde(default)]
    pub rental_price_per_day: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A construction or structural material (two tables, same shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: RowId,
    pub name: String,
    pub category: MaterialCategory,
    #[serde(default)]
    pub description: Option<String>,
    pub in_stock: bool,
    #[serde(default)]
    pub price_per_unit: Option<f64>,
    /// Unit the price applies to, e.g. `"ton"`.
    pub unit: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A promotion shown on the public site while `active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: RowId,
    pub title: String,
    pub description: String,
    /// Discount in percent, 0–100.
    #[serde(default)]
    pub discount_percentage: Option<f64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A gallery image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: RowId,
    pub image_url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A named block of site copy or a URL (the logo).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteContentBlock {
    pub id: RowId,
    pub section: ContentSection,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An inbound enquiry from the public contact form.
///
/// Rows are created outside this system; the dashboard only moves them
/// through [`ContactStatus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRequest {
    pub id: RowId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
}
