//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub tenant_id: String,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub compare_at_price: Option<f64>,
    pub sku: Option<String>,
    pub stock: Option<i32>,
    /// Assigned category display names
    #[serde(default)]
    pub categories: Vec<String>,
    /// Hidden products do not contribute to the storefront category list
    #[serde(default = "default_true")]
    pub is_visible: bool,
    /// URL of the featured image
    pub featured_image: Option<String>,
    pub created_at: i64,
}

fn default_true() -> bool {
    true
}

/// Create product payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCreate {
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub compare_at_price: Option<f64>,
    pub sku: Option<String>,
    pub stock: Option<i32>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    pub featured_image: Option<String>,
}

impl ProductCreate {
    /// Copy the scalar fields and category list of an existing product.
    ///
    /// The featured-image pointer is not carried over; it belongs to the
    /// source tenant's image records.
    pub fn copy_of(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price,
            compare_at_price: product.compare_at_price,
            sku: product.sku.clone(),
            stock: product.stock,
            categories: product.categories.clone(),
            is_visible: product.is_visible,
            featured_image: None,
        }
    }
}

/// Update product payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub categories: Option<Vec<String>>,
    pub is_visible: Option<bool>,
    pub featured_image: Option<String>,
}

impl ProductUpdate {
    /// Whether the update can change the tenant's visible category set
    pub fn touches_categories(&self) -> bool {
        self.categories.is_some() || self.is_visible.is_some()
    }
}
