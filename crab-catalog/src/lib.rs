//! crab-catalog: tenant catalog cloning and category display sync
//!
//! - [`clone::CloneOrchestrator`]: copy categories, products and images
//!   between tenants under merge or replace semantics
//! - [`settings::SettingsReconciler`]: keep `categoryDisplaySettings` in
//!   line with visible products
//! - [`catalog::CatalogService`]: category/product writes that trigger
//!   reconciliation
//! - [`store`]: store traits plus in-memory and PostgreSQL adapters

pub mod catalog;
pub mod clone;
pub mod config;
pub mod error;
pub mod lock;
pub mod logger;
pub mod normalize;
pub mod retry;
pub mod settings;
pub mod store;

pub use catalog::{CatalogService, CategoryBatchOutcome};
pub use clone::{
    CloneOrchestrator, CloneProgress, CloneRequest, CloneResult, LogProgress, MergeStrategy,
    ProgressSink,
};
pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use settings::SettingsReconciler;
pub use store::Stores;
