//! Category Model

use serde::{Deserialize, Serialize};

/// Category entity
///
/// `name` is the sanitized display name; case and diacritics are preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub tenant_id: String,
    pub name: String,
    pub created_at: i64,
}

/// Create category payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
}

impl CategoryCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
