//! Store adapters
//!
//! Tenant-scoped CRUD seams consumed by the engine. Every call is an
//! awaited I/O operation; the engine never fans out over them.
//!
//! Two implementations ship with the crate:
//! - [`MemoryCatalog`]: in-process, used by tests and embedding callers
//! - [`PgCatalog`]: PostgreSQL (sqlx) + S3 for image binaries

pub mod memory;
pub mod postgres;

pub use memory::MemoryCatalog;
pub use postgres::PgCatalog;

use std::sync::Arc;

use async_trait::async_trait;
use shared::models::{
    Category, CategoryCreate, Product, ProductCreate, ProductImage, ProductImageCreate,
    ProductUpdate, SettingsDocument, Tenant,
};
use thiserror::Error;

/// Store error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for store operations
pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn get(&self, tenant_id: &str) -> RepoResult<Option<Tenant>>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list_by_tenant(&self, tenant_id: &str) -> RepoResult<Vec<Category>>;

    /// Insert-or-ignore by comparison key; returns only the rows inserted.
    async fn insert_many(
        &self,
        tenant_id: &str,
        items: &[CategoryCreate],
    ) -> RepoResult<Vec<Category>>;

    async fn delete_all_by_tenant(&self, tenant_id: &str) -> RepoResult<u64>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Products in creation order, optionally capped.
    async fn list_by_tenant(&self, tenant_id: &str, limit: Option<usize>)
    -> RepoResult<Vec<Product>>;

    async fn count_by_tenant(&self, tenant_id: &str) -> RepoResult<i64>;

    async fn insert(&self, tenant_id: &str, data: &ProductCreate) -> RepoResult<Product>;

    /// Patches a product owned by `tenant_id`; any other owner reads as `NotFound`.
    async fn update(
        &self,
        tenant_id: &str,
        product_id: i64,
        data: &ProductUpdate,
    ) -> RepoResult<Product>;

    /// Deletes the tenant's product and its images. `false` if the tenant
    /// owns no such product.
    async fn delete(&self, tenant_id: &str, product_id: i64) -> RepoResult<bool>;

    /// Deletes every product of the tenant and their images.
    async fn delete_all_by_tenant(&self, tenant_id: &str) -> RepoResult<u64>;
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn list_by_product(&self, product_id: i64) -> RepoResult<Vec<ProductImage>>;

    async fn insert(&self, data: &ProductImageCreate) -> RepoResult<ProductImage>;

    /// Physically copy the stored object into the target tenant's space,
    /// returning the new location.
    async fn duplicate_binary(&self, url: &str, target_tenant_id: &str) -> RepoResult<String>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, tenant_id: &str) -> RepoResult<Option<SettingsDocument>>;

    async fn upsert(&self, tenant_id: &str, document: &SettingsDocument) -> RepoResult<()>;
}

/// Bundle of every store the engine talks to
#[derive(Clone)]
pub struct Stores {
    pub tenants: Arc<dyn TenantStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub products: Arc<dyn ProductStore>,
    pub images: Arc<dyn ImageStore>,
    pub settings: Arc<dyn SettingsStore>,
}

impl Stores {
    /// Use one backend for every store
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: TenantStore + CategoryStore + ProductStore + ImageStore + SettingsStore + 'static,
    {
        Self {
            tenants: backend.clone(),
            categories: backend.clone(),
            products: backend.clone(),
            images: backend.clone(),
            settings: backend,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
