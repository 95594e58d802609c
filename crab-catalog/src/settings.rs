//! Category display settings reconciliation
//!
//! Keeps a tenant's `categoryDisplaySettings` in line with the categories
//! found on its visible products:
//! - entries whose key is still present keep their relative order and
//!   `enabled` flag, but take the current canonical display text
//! - stale entries are dropped
//! - new categories are appended enabled
//! - `order` is always the zero-based list position

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{CategoryDisplayEntry, Product, SettingsDocument};

use crate::error::ServiceResult;
use crate::normalize::{comparison_key, dedupe};
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::store::{ProductStore, SettingsStore, Stores};

/// Deduplicated, key-sorted category names of the visible products.
///
/// The first sanitized spelling encountered for a key is canonical.
pub fn current_category_set(products: &[Product]) -> Vec<String> {
    let mut names = dedupe(
        products
            .iter()
            .filter(|p| p.is_visible)
            .flat_map(|p| p.categories.iter()),
    );
    names.sort_by_cached_key(|name| (comparison_key(name), name.clone()));
    names
}

/// Merge stored display entries with the current category set.
///
/// Stored entries are read in list position; their `order` values are
/// ignored and rewritten. An empty current set yields an empty list.
pub fn merge_display_settings(
    existing: &[CategoryDisplayEntry],
    current: &[String],
) -> Vec<CategoryDisplayEntry> {
    if current.is_empty() {
        return Vec::new();
    }

    let canonical: HashMap<String, &str> = current
        .iter()
        .map(|name| (comparison_key(name), name.as_str()))
        .collect();

    let mut placed = HashSet::new();
    let mut merged = Vec::with_capacity(current.len());

    // Carry forward
    for entry in existing {
        let key = comparison_key(&entry.category);
        if key.is_empty() {
            continue;
        }
        if let Some(name) = canonical.get(&key) {
            if placed.insert(key) {
                merged.push(CategoryDisplayEntry::new(*name, 0, entry.enabled));
            }
        }
    }

    // Append new
    for name in current {
        if placed.insert(comparison_key(name)) {
            merged.push(CategoryDisplayEntry::new(name.clone(), 0, true));
        }
    }

    for (position, entry) in merged.iter_mut().enumerate() {
        entry.order = position as u32;
    }
    merged
}

/// Rewrites a tenant's category display settings from its products
#[derive(Clone)]
pub struct SettingsReconciler {
    products: Arc<dyn ProductStore>,
    settings: Arc<dyn SettingsStore>,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl SettingsReconciler {
    pub fn new(stores: &Stores, retry: RetryPolicy) -> Self {
        Self {
            products: stores.products.clone(),
            settings: stores.settings.clone(),
            retry,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the backoff clock
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Recompute and persist the tenant's display settings.
    ///
    /// Keys other than `categoryDisplaySettings` are written back unchanged.
    /// Returns the document that was written.
    pub async fn reconcile(&self, tenant_id: &str) -> ServiceResult<SettingsDocument> {
        let products = self.products.list_by_tenant(tenant_id, None).await?;
        let current = current_category_set(&products);

        let existing = self.settings.get(tenant_id).await?.unwrap_or_default();
        let merged = merge_display_settings(&existing.category_display_settings, &current);
        let document = existing.with_categories(merged);

        let settings = &self.settings;
        let doc = &document;
        self.retry
            .run(self.sleeper.as_ref(), |_attempt| async move {
                settings.upsert(tenant_id, doc).await
            })
            .await
            .map_err(|e| {
                tracing::error!(
                    tenant_id = %tenant_id,
                    attempts = self.retry.max_attempts,
                    error = %e,
                    "Settings write failed"
                );
                AppError::with_message(
                    ErrorCode::SettingsWriteFailed,
                    format!("Failed to write display settings for tenant {tenant_id}: {e}"),
                )
                .with_detail("tenant_id", tenant_id)
                .with_detail("attempts", self.retry.max_attempts)
            })?;

        self.verify_write(tenant_id, &document).await;

        tracing::info!(
            tenant_id = %tenant_id,
            categories = document.category_display_settings.len(),
            "Category display settings reconciled"
        );
        Ok(document)
    }

    /// Single read-back; the store may be eventually consistent, so a
    /// mismatch is only logged.
    async fn verify_write(&self, tenant_id: &str, written: &SettingsDocument) {
        match self.settings.get(tenant_id).await {
            Ok(Some(read))
                if read.category_display_settings == written.category_display_settings => {}
            Ok(read) => {
                tracing::warn!(
                    tenant_id = %tenant_id,
                    expected = written.category_display_settings.len(),
                    found = read.map_or(0, |d| d.category_display_settings.len()),
                    "Settings read-back does not match written document"
                );
            }
            Err(e) => {
                tracing::warn!(tenant_id = %tenant_id, error = %e, "Settings read-back failed");
            }
        }
    }
}

impl std::fmt::Debug for SettingsReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsReconciler")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use shared::models::ProductCreate;

    use super::*;
    use crate::retry::RecordingSleeper;
    use crate::store::{MemoryCatalog, RepoError, RepoResult};

    fn entry(name: &str, order: u32, enabled: bool) -> CategoryDisplayEntry {
        CategoryDisplayEntry::new(name, order, enabled)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn product(categories: &[&str], visible: bool) -> ProductCreate {
        ProductCreate {
            title: "P".to_string(),
            description: None,
            price: 1.0,
            compare_at_price: None,
            sku: None,
            stock: None,
            categories: names(categories),
            is_visible: visible,
            featured_image: None,
        }
    }

    #[test]
    fn test_merge_preserves_order_and_appends_new() {
        let existing = vec![entry("B", 0, true), entry("A", 1, false)];
        let merged = merge_display_settings(&existing, &names(&["A", "B", "C"]));
        assert_eq!(
            merged,
            vec![entry("B", 0, true), entry("A", 1, false), entry("C", 2, true)]
        );
    }

    #[test]
    fn test_merge_drops_stale_and_reindexes() {
        let existing = vec![entry("A", 0, true), entry("B", 1, false)];
        let merged = merge_display_settings(&existing, &names(&["B"]));
        assert_eq!(merged, vec![entry("B", 0, false)]);
    }

    #[test]
    fn test_merge_uses_current_display_text() {
        let existing = vec![entry("tenis", 0, false)];
        let merged = merge_display_settings(&existing, &names(&["Tênis"]));
        assert_eq!(merged, vec![entry("Tênis", 0, false)]);
    }

    #[test]
    fn test_merge_empty_current_clears() {
        let existing = vec![entry("A", 0, true)];
        assert!(merge_display_settings(&existing, &[]).is_empty());
    }

    #[test]
    fn test_merge_follows_list_position_and_skips_junk() {
        let existing = vec![
            entry("A", 5, true),
            entry("", 0, false),
            entry("B", 1, false),
            entry("b", 2, true),
        ];
        let merged = merge_display_settings(&existing, &names(&["A", "B"]));
        assert_eq!(merged, vec![entry("A", 0, true), entry("B", 1, false)]);
    }

    #[test]
    fn test_current_set_visible_only_first_spelling_wins() {
        let products: Vec<Product> = [
            (vec!["Roupas", " tênis "], true),
            (vec!["TÊNIS", "Acessórios"], true),
            (vec!["Oculto"], false),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (cats, visible))| Product {
            id: i as i64,
            tenant_id: "t".into(),
            title: "P".into(),
            description: None,
            price: 1.0,
            compare_at_price: None,
            sku: None,
            stock: None,
            categories: cats.into_iter().map(String::from).collect(),
            is_visible: visible,
            featured_image: None,
            created_at: 0,
        })
        .collect();

        assert_eq!(
            current_category_set(&products),
            names(&["Acessórios", "Roupas", "tênis"])
        );
    }

    #[tokio::test]
    async fn test_reconcile_keeps_unrelated_settings() {
        let store = Arc::new(MemoryCatalog::new());
        store.seed_product("t-1", product(&["Roupas", "Tênis"], true));
        store.seed_product("t-1", product(&["Oculto"], false));
        let mut prior = SettingsDocument::default().with_categories(vec![
            entry("Tênis", 0, false),
            entry("Descontinuado", 1, true),
        ]);
        prior.extra.insert("priceFilter".into(), json!({"max": 500}));
        store.seed_settings("t-1", prior);

        let stores = Stores::from_backend(store.clone());
        let reconciler = SettingsReconciler::new(&stores, RetryPolicy::default());
        let written = reconciler.reconcile("t-1").await.unwrap();

        assert_eq!(
            written.category_display_settings,
            vec![entry("Tênis", 0, false), entry("Roupas", 1, true)]
        );
        let stored = store.settings_of("t-1").unwrap();
        assert_eq!(stored, written);
        assert_eq!(stored.extra["priceFilter"]["max"], 500);
    }

    #[tokio::test]
    async fn test_reconcile_without_products_writes_empty_list() {
        let store = Arc::new(MemoryCatalog::new());
        store.seed_settings(
            "t-1",
            SettingsDocument::default().with_categories(vec![entry("A", 0, true)]),
        );
        let stores = Stores::from_backend(store.clone());
        let reconciler = SettingsReconciler::new(&stores, RetryPolicy::default());

        reconciler.reconcile("t-1").await.unwrap();
        assert!(store.settings_of("t-1").unwrap().category_display_settings.is_empty());
    }

    /// Settings store failing the first `failures` upserts
    struct FlakySettings {
        inner: MemoryCatalog,
        failures: u32,
        calls: AtomicU32,
        stale_reads: bool,
    }

    #[async_trait]
    impl SettingsStore for FlakySettings {
        async fn get(&self, tenant_id: &str) -> RepoResult<Option<SettingsDocument>> {
            if self.stale_reads && self.calls.load(Ordering::SeqCst) > 0 {
                return Ok(None);
            }
            SettingsStore::get(&self.inner, tenant_id).await
        }

        async fn upsert(&self, tenant_id: &str, document: &SettingsDocument) -> RepoResult<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(RepoError::Database("connection reset".into()));
            }
            self.inner.upsert(tenant_id, document).await
        }
    }

    fn flaky_stores(failures: u32, stale_reads: bool) -> (Stores, Arc<FlakySettings>) {
        let backend = Arc::new(MemoryCatalog::new());
        backend.seed_product("t-1", product(&["Roupas"], true));
        let flaky = Arc::new(FlakySettings {
            inner: MemoryCatalog::new(),
            failures,
            calls: AtomicU32::new(0),
            stale_reads,
        });
        let mut stores = Stores::from_backend(backend);
        stores.settings = flaky.clone();
        (stores, flaky)
    }

    #[tokio::test]
    async fn test_reconcile_retries_with_linear_backoff() {
        let (stores, flaky) = flaky_stores(2, false);
        let sleeper = Arc::new(RecordingSleeper::new());
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        let reconciler = SettingsReconciler::new(&stores, policy).with_sleeper(sleeper.clone());

        reconciler.reconcile("t-1").await.unwrap();

        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            sleeper.waits(),
            vec![Duration::from_millis(500), Duration::from_millis(1000)]
        );
        assert_eq!(
            flaky.inner.settings_of("t-1").unwrap().category_display_settings,
            vec![entry("Roupas", 0, true)]
        );
    }

    #[tokio::test]
    async fn test_reconcile_gives_up_after_cap() {
        let (stores, flaky) = flaky_stores(10, false);
        let reconciler = SettingsReconciler::new(&stores, RetryPolicy::default())
            .with_sleeper(Arc::new(RecordingSleeper::new()));

        let err = reconciler.reconcile("t-1").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::SettingsWriteFailed);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_read_back_mismatch_is_not_an_error() {
        let (stores, _flaky) = flaky_stores(0, true);
        let reconciler = SettingsReconciler::new(&stores, RetryPolicy::default())
            .with_sleeper(Arc::new(RecordingSleeper::new()));

        let written = reconciler.reconcile("t-1").await.unwrap();
        assert_eq!(written.category_display_settings.len(), 1);
    }
}
