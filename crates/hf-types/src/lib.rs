//! Shared types for the H&F site backend.
//!
//! This crate defines the vocabulary used across the workspace:
//! row identifiers ([`RowId`]), table names ([`TableName`]), the fixed
//! enumerations exposed at the boundary ([`EquipmentType`],
//! [`MaterialCategory`], [`ContactStatus`], [`ContentSection`]), the
//! per-entity record types in [`records`], and the typed [`events`] bus.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod events;
pub mod records;

pub use records::{
    ContactRequest, Equipment, GalleryItem, Material, Promotion, SiteContentBlock,
};

// ---------------------------------------------------------------------------
// Row identifiers
// ---------------------------------------------------------------------------

/// Opaque identifier of a backend row.
///
/// Minted by the table backend on insert; this crate never generates one
/// outside of [`RowId::new_random`], which only backends call.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(uuid::Uuid);

impl RowId {
    /// Mint a fresh random identifier.
    pub fn new_random() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Return the underlying UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl From<uuid::Uuid> for RowId {
    fn from(id: uuid::Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for RowId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ParseError::new("row id", s))
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowId({})", self.0)
    }
}

/// A string did not name a legal value of a fixed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseError {
    /// What was being parsed (e.g. `"equipment type"`).
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixed enumerations
// ---------------------------------------------------------------------------

macro_rules! define_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every legal value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire representation stored in the backend.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseError::new($kind, other)),
                }
            }
        }
    };
}

define_enum!(
    /// Kind of rentable equipment. Stored in the `type` column.
    EquipmentType, "equipment type" {
        Truck => "truck",
        Excavator => "excavator",
        Other => "other",
    }
);

define_enum!(
    /// Category of a material row.
    ///
    /// The two material tables share this column but accept different
    /// subsets; see [`MaterialKind::allows`].
    MaterialCategory, "material category" {
        Gravel => "gravel",
        Sand => "sand",
        Stones => "stones",
        Steel => "steel",
        Cement => "cement",
        Rebar => "rebar",
        Other => "other",
    }
);

define_enum!(
    /// Handling state of an inbound contact request.
    ContactStatus, "contact status" {
        New => "new",
        InProgress => "in_progress",
        Completed => "completed",
    }
);

define_enum!(
    /// Named, freely editable fragment of the public site.
    ContentSection, "content section" {
        Hero => "hero",
        About => "about",
        Mission => "mission",
        ContactInfo => "contact_info",
        Logo => "logo",
    }
);

define_enum!(
    /// Backend tables this system reads and writes.
    TableName, "table" {
        Equipment => "equipment",
        ConstructionMaterials => "construction_materials",
        StructuralMaterials => "structural_materials",
        Promotions => "promotions",
        Gallery => "gallery",
        SiteContent => "site_content",
        ContactRequests => "contact_requests",
    }
);

define_enum!(
    /// Which of the two parallel material tables a row lives in.
    MaterialKind, "material kind" {
        Construction => "construction",
        Structural => "structural",
    }
);

impl MaterialKind {
    /// The backend table holding this kind of material.
    pub fn table(&self) -> TableName {
        match self {
            Self::Construction => TableName::ConstructionMaterials,
            Self::Structural => TableName::StructuralMaterials,
        }
    }

    /// Map a table back to its material kind, if it is a material table.
    pub fn from_table(table: TableName) -> Option<Self> {
        match table {
            TableName::ConstructionMaterials => Some(Self::Construction),
            TableName::StructuralMaterials => Some(Self::Structural),
            _ => None,
        }
    }

    /// Categories legal for this kind of material.
    pub fn categories(&self) -> &'static [MaterialCategory] {
        use MaterialCategory::*;
        match self {
            Self::Construction => &[Gravel, Sand, Stones, Other],
            Self::Structural => &[Steel, Cement, Rebar, Other],
        }
    }

    /// Whether `category` may be stored in this kind's table.
    pub fn allows(&self, category: MaterialCategory) -> bool {
        self.categories().contains(&category)
    }
}

impl ContentSection {
    /// Human-facing heading used by the dashboard.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Hero => "Hero Section",
            Self::About => "About Us",
            Self::Mission => "Mission Statement",
            Self::ContactInfo => "Contact Information",
            Self::Logo => "Company Logo",
        }
    }
}
