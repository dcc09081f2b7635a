//! Data models for Storekeep
//!
//! `Product` is the single persisted entity. `NewProduct` carries the fields
//! for a create call and `ProductPatch` the fields for a partial update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product in the inventory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned identifier, never reused
    pub id: i64,
    /// Display name
    pub name: String,
    /// Units in stock
    pub quantity: i64,
    /// Unit price
    pub price: f64,
    /// Opaque reference to an image (file path or URI)
    pub image_uri: Option<String>,
    /// When this product was created
    pub created_at: DateTime<Utc>,
    /// When this product was last updated
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Check whether the name contains `query`, ignoring case
    pub fn name_matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Fields for creating a product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub quantity: i64,
    pub price: f64,
    #[serde(default)]
    pub image_uri: Option<String>,
}

impl NewProduct {
    /// Create product data without an image
    pub fn new(name: impl Into<String>, quantity: i64, price: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            price,
            image_uri: None,
        }
    }

    /// Attach an image reference
    ///
    /// An empty string is treated as no image.
    pub fn with_image_uri(mut self, image_uri: impl Into<String>) -> Self {
        let image_uri = image_uri.into();
        self.image_uri = if image_uri.is_empty() {
            None
        } else {
            Some(image_uri)
        };
        self
    }

    /// The image reference as it will be stored
    pub(crate) fn stored_image_uri(&self) -> Option<&str> {
        self.image_uri.as_deref().filter(|uri| !uri.is_empty())
    }
}

/// A partial update to a product
///
/// Each field is `None` when not supplied. `image_uri` has an extra level so
/// that clearing the image (`Some(None)`) differs from leaving it untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<f64>,
    pub image_uri: Option<Option<String>>,
}

impl ProductPatch {
    /// An empty patch
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_image_uri(mut self, image_uri: impl Into<String>) -> Self {
        self.image_uri = Some(Some(image_uri.into()));
        self
    }

    /// Remove the product's image reference
    pub fn clear_image_uri(mut self) -> Self {
        self.image_uri = Some(None);
        self
    }

    /// True when no field is supplied
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.quantity.is_none()
            && self.price.is_none()
            && self.image_uri.is_none()
    }
}

/// Result of a write that may match no row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A row was changed
    Applied,
    /// No row has the given id
    NoMatchingRow,
    /// Nothing to write (empty patch)
    Skipped,
}

impl WriteOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str) -> Product {
        let now = Utc::now();
        Product {
            id: 1,
            name: name.to_string(),
            quantity: 3,
            price: 1.5,
            image_uri: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_name_matches_ignores_case() {
        let laptop = sample("Laptop");
        assert!(laptop.name_matches("top"));
        assert!(laptop.name_matches("LAP"));
        assert!(laptop.name_matches(""));
        assert!(!sample("Monitor").name_matches("top"));
    }

    #[test]
    fn test_name_matches_non_ascii() {
        assert!(sample("Crème Brûlée").name_matches("BRÛLÉE"));
    }

    #[test]
    fn test_new_product_empty_image_is_none() {
        let data = NewProduct::new("Widget", 10, 2.5).with_image_uri("");
        assert_eq!(data.image_uri, None);

        let data = NewProduct::new("Widget", 10, 2.5).with_image_uri("file:///w.png");
        assert_eq!(data.image_uri.as_deref(), Some("file:///w.png"));
    }

    #[test]
    fn test_stored_image_uri_filters_empty() {
        let data = NewProduct {
            name: "Widget".to_string(),
            quantity: 1,
            price: 1.0,
            image_uri: Some(String::new()),
        };
        assert_eq!(data.stored_image_uri(), None);
    }

    #[test]
    fn test_patch_builder() {
        let patch = ProductPatch::new();
        assert!(patch.is_empty());

        let patch = ProductPatch::new().with_quantity(5);
        assert!(!patch.is_empty());
        assert_eq!(patch.quantity, Some(5));
        assert!(patch.name.is_none());

        let cleared = ProductPatch::new().clear_image_uri();
        assert!(!cleared.is_empty());
        assert_eq!(cleared.image_uri, Some(None));
    }

    #[test]
    fn test_product_serializes_camel_case() {
        let json = serde_json::to_value(sample("Widget")).unwrap();
        assert!(json.get("imageUri").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("image_uri").is_none());
    }
}
