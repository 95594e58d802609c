//! Data models
//!
//! Tenant-scoped catalog entities consumed by the catalog engine.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! Tenant IDs are strings; catalog record IDs are snowflake `i64`.

pub mod category;
pub mod image;
pub mod product;
pub mod settings;
pub mod tenant;

// Re-exports
pub use category::*;
pub use image::*;
pub use product::*;
pub use settings::*;
pub use tenant::*;
