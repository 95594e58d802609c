//! Tenant Model

use serde::{Deserialize, Serialize};

/// Seller account, read-only to the catalog engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Tenant {
    pub id: String,
    /// Maximum number of products the tenant may hold
    pub product_quota: i64,
}
