//! Product Image Model

use serde::{Deserialize, Serialize};

/// Image attached to a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProductImage {
    pub id: i64,
    pub product_id: i64,
    /// Storage location (object key or absolute URL)
    pub url: String,
    pub is_featured: bool,
    pub created_at: i64,
}

/// Create image payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImageCreate {
    pub product_id: i64,
    pub url: String,
    pub is_featured: bool,
}
