//! Fixtures and failure-injecting store wrappers

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use crab_catalog::retry::{RecordingSleeper, RetryPolicy};
use crab_catalog::store::{
    CategoryStore, MemoryCatalog, ProductStore, RepoError, RepoResult, SettingsStore, Stores,
};
use crab_catalog::{CloneOrchestrator, CloneProgress, SettingsReconciler};
use parking_lot::Mutex;
use shared::models::{
    Category, CategoryCreate, Product, ProductCreate, ProductUpdate, SettingsDocument,
};
use tokio_util::sync::CancellationToken;

pub fn product(title: &str, categories: &[&str]) -> ProductCreate {
    ProductCreate {
        title: title.to_string(),
        description: Some(format!("{title} description")),
        price: 49.9,
        compare_at_price: None,
        sku: Some(format!("SKU-{title}")),
        stock: Some(10),
        categories: categories.iter().map(|c| c.to_string()).collect(),
        is_visible: true,
        featured_image: None,
    }
}

/// In-memory catalog with tenants `src` and `dst`
pub fn two_tenants(src_quota: i64, dst_quota: i64) -> Arc<MemoryCatalog> {
    let store = Arc::new(MemoryCatalog::new());
    store.add_tenant("src", src_quota);
    store.add_tenant("dst", dst_quota);
    store
}

/// Orchestrator whose settings retries never touch the real clock
pub fn orchestrator_for(stores: Stores) -> CloneOrchestrator {
    let reconciler = SettingsReconciler::new(&stores, RetryPolicy::default())
        .with_sleeper(Arc::new(RecordingSleeper::new()));
    CloneOrchestrator::new(stores, reconciler)
}

pub fn orchestrator(store: &Arc<MemoryCatalog>) -> CloneOrchestrator {
    orchestrator_for(Stores::from_backend(store.clone()))
}

pub fn names(store: &MemoryCatalog, tenant_id: &str) -> Vec<String> {
    let mut names = store.category_names(tenant_id);
    names.sort();
    names
}

pub fn titles(store: &MemoryCatalog, tenant_id: &str) -> Vec<String> {
    store
        .products_of(tenant_id)
        .into_iter()
        .map(|p| p.title)
        .collect()
}

/// Progress sink that keeps every update
#[derive(Default)]
pub struct RecordedProgress {
    pub updates: Mutex<Vec<CloneProgress>>,
}

impl crab_catalog::ProgressSink for RecordedProgress {
    fn report(&self, progress: CloneProgress) {
        self.updates.lock().push(progress);
    }
}

/// Product store failing inserts of chosen titles
pub struct FailingProducts {
    pub inner: Arc<MemoryCatalog>,
    pub fail_titles: HashSet<String>,
    /// Cancelled after this many successful inserts
    pub cancel_after: Option<(usize, CancellationToken)>,
    pub inserted: AtomicUsize,
}

impl FailingProducts {
    pub fn new(inner: Arc<MemoryCatalog>, fail_titles: &[&str]) -> Self {
        Self {
            inner,
            fail_titles: fail_titles.iter().map(|t| t.to_string()).collect(),
            cancel_after: None,
            inserted: AtomicUsize::new(0),
        }
    }

    pub fn cancelling_after(mut self, count: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((count, token));
        self
    }
}

#[async_trait]
impl ProductStore for FailingProducts {
    async fn list_by_tenant(
        &self,
        tenant_id: &str,
        limit: Option<usize>,
    ) -> RepoResult<Vec<Product>> {
        ProductStore::list_by_tenant(self.inner.as_ref(), tenant_id, limit).await
    }

    async fn count_by_tenant(&self, tenant_id: &str) -> RepoResult<i64> {
        self.inner.count_by_tenant(tenant_id).await
    }

    async fn insert(&self, tenant_id: &str, data: &ProductCreate) -> RepoResult<Product> {
        if self.fail_titles.contains(&data.title) {
            return Err(RepoError::Database(format!("insert of {} rejected", data.title)));
        }
        let product = ProductStore::insert(self.inner.as_ref(), tenant_id, data).await?;
        let done = self.inserted.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((count, token)) = &self.cancel_after {
            if done >= *count {
                token.cancel();
            }
        }
        Ok(product)
    }

    async fn update(
        &self,
        tenant_id: &str,
        product_id: i64,
        data: &ProductUpdate,
    ) -> RepoResult<Product> {
        self.inner.update(tenant_id, product_id, data).await
    }

    async fn delete(&self, tenant_id: &str, product_id: i64) -> RepoResult<bool> {
        ProductStore::delete(self.inner.as_ref(), tenant_id, product_id).await
    }

    async fn delete_all_by_tenant(&self, tenant_id: &str) -> RepoResult<u64> {
        ProductStore::delete_all_by_tenant(self.inner.as_ref(), tenant_id).await
    }
}

/// Category store whose bulk insert always fails
pub struct FailingCategories {
    pub inner: Arc<MemoryCatalog>,
}

#[async_trait]
impl CategoryStore for FailingCategories {
    async fn list_by_tenant(&self, tenant_id: &str) -> RepoResult<Vec<Category>> {
        CategoryStore::list_by_tenant(self.inner.as_ref(), tenant_id).await
    }

    async fn insert_many(
        &self,
        _tenant_id: &str,
        _items: &[CategoryCreate],
    ) -> RepoResult<Vec<Category>> {
        Err(RepoError::Database("bulk insert timed out".into()))
    }

    async fn delete_all_by_tenant(&self, tenant_id: &str) -> RepoResult<u64> {
        CategoryStore::delete_all_by_tenant(self.inner.as_ref(), tenant_id).await
    }
}

/// Settings store whose upsert always fails
pub struct FailingSettings {
    pub upserts: AtomicUsize,
}

#[async_trait]
impl SettingsStore for FailingSettings {
    async fn get(&self, _tenant_id: &str) -> RepoResult<Option<SettingsDocument>> {
        Ok(None)
    }

    async fn upsert(&self, _tenant_id: &str, _document: &SettingsDocument) -> RepoResult<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Err(RepoError::Database("settings table locked".into()))
    }
}
