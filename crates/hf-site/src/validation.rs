//! Coercion of form text into typed values.
//!
//! Drafts hold exactly what an admin typed. Everything here runs before a
//! request is built, so a malformed number or an unknown category never
//! reaches the backend.

use std::str::FromStr;

use hf_types::{MaterialCategory, ParseError, TableName};
use serde::{Deserialize, Deserializer};

/// A draft field was missing or malformed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be a number, got {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} must not be negative")]
    Negative { field: &'static str },

    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: f64 },

    #[error(transparent)]
    Choice(#[from] ParseError),

    #[error("category {category} is not allowed in {table}")]
    CategoryNotAllowed {
        category: MaterialCategory,
        table: TableName,
    },

    #[error("{table} is not a material table")]
    NotMaterialTable { table: TableName },
}

/// Trimmed, non-empty text or [`ValidationError::Required`].
pub fn require(field: &'static str, text: &str) -> Result<String, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(text.to_string())
}

/// Trimmed text, with empty meaning absent.
pub fn optional_text(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Optional non-negative decimal.
///
/// Empty text is `None` (stored as `null`, never as zero). Anything else must
/// parse as a finite, non-negative number.
pub fn coerce_decimal(field: &'static str, text: &str) -> Result<Option<f64>, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let value: f64 = text.parse().map_err(|_| ValidationError::NotANumber {
        field,
        value: text.to_string(),
    })?;
    if !value.is_finite() {
        return Err(ValidationError::NotANumber {
            field,
            value: text.to_string(),
        });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative { field });
    }
    Ok(Some(value))
}

/// [`coerce_decimal`] with an upper bound.
pub fn coerce_bounded(
    field: &'static str,
    text: &str,
    max: f64,
) -> Result<Option<f64>, ValidationError> {
    match coerce_decimal(field, text)? {
        Some(value) if value > max => Err(ValidationError::TooLarge { field, max }),
        other => Ok(other),
    }
}

/// Required value of a fixed enumeration.
pub fn choice<T>(field: &'static str, text: &str) -> Result<T, ValidationError>
where
    T: FromStr<Err = ParseError>,
{
    Ok(require(field, text)?.parse()?)
}

/// Accept a string, a number or `null` for a form text field.
///
/// JSON clients often send `"rental_price_per_day": 250` rather than the
/// text a form would hold; both end up as the same draft text.
pub fn form_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Str(String),
        Num(serde_json::Number),
        Null,
    }

    Ok(match Text::deserialize(deserializer)? {
        Text::Str(s) => s,
        Text::Num(n) => n.to_string(),
        Text::Null => String::new(),
    })
}
