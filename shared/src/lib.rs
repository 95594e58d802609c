//! Shared types for the catalog engine
//!
//! Domain models for tenants, categories, products, images and the
//! storefront settings document, plus the unified error system.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
