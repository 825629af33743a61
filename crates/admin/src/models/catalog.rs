//! Catalog domain types: categories, brands and items.
//!
//! All three are soft-deleted. A row with `deleted_at` set is never returned
//! by the list and find queries; only the delete operations hand back a
//! row with it set.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use backoffice_core::{BrandId, CategoryId, ItemId, Price, RawInput};

/// A catalog record whose only mutable field is its name.
///
/// Categories and brands share this shape and differ only in their id type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedRecord<I> {
    pub id: I,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A product category.
pub type Category = NamedRecord<CategoryId>;

/// A product brand.
pub type Brand = NamedRecord<BrandId>;

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub brand_id: BrandId,
    pub category_id: CategoryId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Fields written on item create and edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub brand_id: BrandId,
    pub category_id: CategoryId,
}

/// Submitted form for entities whose only mutable field is a name
/// (categories and brands).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NameForm {
    #[serde(default)]
    pub name: Option<String>,
}

impl NameForm {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    #[must_use]
    pub fn raw(&self) -> RawInput {
        let mut raw = RawInput::new();
        if let Some(name) = &self.name {
            raw.insert("name".to_owned(), name.clone());
        }
        raw
    }
}

/// Submitted item form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Unchecked amount; negative values are rejected by the item service.
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub brand_id: Option<BrandId>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

impl ItemForm {
    #[must_use]
    pub fn raw(&self) -> RawInput {
        let mut raw = RawInput::new();
        if let Some(name) = &self.name {
            raw.insert("name".to_owned(), name.clone());
        }
        if let Some(description) = &self.description {
            raw.insert("description".to_owned(), description.clone());
        }
        raw
    }
}
