//! Tenant catalog cloning
//!
//! Pipeline, one awaited store call at a time:
//! 1. validate both tenants
//! 2. quota pre-flight (before any write)
//! 3. replace-strategy wipe of the target
//! 4. copy missing categories
//! 5. copy products, then their images
//! 6. reconcile the target's display settings
//!
//! Only a missing tenant, identical tenants, a failed wipe or the quota
//! check abort the run. Everything else is recorded in `errors` and the
//! pipeline moves on.

mod types;

pub use types::{
    CloneProgress, CloneRequest, CloneResult, LogProgress, MergeStrategy, ProgressSink,
};

use std::collections::HashSet;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    CategoryCreate, Product, ProductCreate, ProductImageCreate, ProductUpdate, Tenant,
};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::ServiceResult;
use crate::lock::TenantLocks;
use crate::normalize::comparison_key;
use crate::settings::SettingsReconciler;
use crate::store::{RepoError, Stores};

/// Progress steps reported per run
pub const TOTAL_STEPS: usize = 6;

const STEP_VALIDATE: usize = 1;
const STEP_PREPARE: usize = 2;
const STEP_CATEGORIES: usize = 3;
const STEP_PRODUCTS: usize = 4;
const STEP_SETTINGS: usize = 5;
const STEP_COMPLETE: usize = 6;

struct Progress<'a> {
    sink: &'a dyn ProgressSink,
}

impl Progress<'_> {
    fn step(&self, index: usize, message: impl Into<String>) {
        let update = CloneProgress::new(index, TOTAL_STEPS, message);
        tracing::debug!(step = index, percentage = update.percentage, "{}", update.message);
        self.sink.report(update);
    }
}

#[derive(Debug, Default)]
struct ImageOutcome {
    copied: usize,
    cancelled: bool,
}

/// Runs clone requests against a set of stores
#[derive(Debug, Clone)]
pub struct CloneOrchestrator {
    stores: Stores,
    reconciler: SettingsReconciler,
    locks: TenantLocks,
    quick_copy_max_products: usize,
}

impl CloneOrchestrator {
    pub fn new(stores: Stores, reconciler: SettingsReconciler) -> Self {
        Self {
            stores,
            reconciler,
            locks: TenantLocks::new(),
            quick_copy_max_products: Config::default().quick_copy_max_products,
        }
    }

    pub fn from_config(stores: Stores, config: &Config) -> Self {
        let reconciler = SettingsReconciler::new(&stores, config.retry_policy());
        Self::new(stores, reconciler).with_quick_copy_cap(config.quick_copy_max_products)
    }

    /// Share a lock registry with other orchestrators in the process
    pub fn with_locks(mut self, locks: TenantLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn with_quick_copy_cap(mut self, cap: usize) -> Self {
        self.quick_copy_max_products = cap;
        self
    }

    pub fn reconciler(&self) -> &SettingsReconciler {
        &self.reconciler
    }

    pub fn locks(&self) -> &TenantLocks {
        &self.locks
    }

    /// Run a clone to completion
    pub async fn clone_catalog(&self, req: &CloneRequest, sink: &dyn ProgressSink) -> CloneResult {
        self.clone_catalog_with_cancel(req, sink, &CancellationToken::new())
            .await
    }

    /// Run a clone, stopping between products or images once `cancel` fires
    pub async fn clone_catalog_with_cancel(
        &self,
        req: &CloneRequest,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> CloneResult {
        self.run(req, sink, cancel, true).await
    }

    /// Categories and products only: no images, reduced product cap, no
    /// settings reconciliation
    pub async fn quick_copy(
        &self,
        source_tenant_id: &str,
        target_tenant_id: &str,
        sink: &dyn ProgressSink,
    ) -> CloneResult {
        let req = CloneRequest::new(source_tenant_id, target_tenant_id)
            .with_images(false)
            .with_max_products(self.quick_copy_max_products);
        self.run(&req, sink, &CancellationToken::new(), false).await
    }

    async fn run(
        &self,
        req: &CloneRequest,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
        reconcile: bool,
    ) -> CloneResult {
        let progress = Progress { sink };
        let source_id = req.source_tenant_id.as_str();
        let target_id = req.target_tenant_id.as_str();

        tracing::info!(
            source_tenant_id = %source_id,
            target_tenant_id = %target_id,
            strategy = ?req.merge_strategy,
            copy_categories = req.copy_categories,
            copy_products = req.copy_products,
            copy_images = req.copy_images,
            physical_duplicate = req.physical_duplicate,
            max_products = req.max_products,
            "Clone started"
        );

        if source_id == target_id {
            let err = AppError::with_message(
                ErrorCode::SameTenant,
                format!("Cannot clone tenant {source_id} into itself"),
            );
            return Self::abort(&progress, err);
        }

        let _guard = self.locks.acquire(target_id).await;

        // Step 1: tenants
        let (_source, target) = match self.load_tenants(req).await {
            Ok(pair) => pair,
            Err(e) => return Self::abort(&progress, e.into()),
        };

        // Quota pre-flight, before the first write of this run
        let products = if req.copy_products {
            match self.plan_products(req, &target).await {
                Ok(products) => products,
                Err(e) => return Self::abort(&progress, e.into()),
            }
        } else {
            Vec::new()
        };
        progress.step(STEP_VALIDATE, "Tenants validated");

        // Step 2: replace wipe
        if req.merge_strategy == MergeStrategy::Replace {
            if let Err(e) = self.wipe_target(target_id).await {
                return Self::abort(&progress, e.into());
            }
        }
        progress.step(STEP_PREPARE, "Target prepared");

        let mut result = CloneResult::default();

        // Step 3: categories
        if req.copy_categories {
            match self.copy_categories(source_id, target_id).await {
                Ok(inserted) => result.categories_cloned = inserted,
                Err(e) => {
                    let err: AppError = e.into();
                    tracing::warn!(target_tenant_id = %target_id, error = %err, "Category copy failed");
                    result.errors.push(format!("Failed to copy categories: {}", err.message));
                }
            }
        }
        progress.step(
            STEP_CATEGORIES,
            format!("{} categories copied", result.categories_cloned),
        );

        // Step 4: products and images
        let mut cancelled = false;
        for product in &products {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let Some(copy) = self.copy_product(product, target_id, &mut result).await else {
                continue;
            };
            result.products_cloned += 1;

            if req.copy_images {
                let images = self
                    .copy_images(product, &copy, req, cancel, &mut result)
                    .await;
                result.images_cloned += images.copied;
                if images.cancelled {
                    cancelled = true;
                    break;
                }
            }
        }
        progress.step(
            STEP_PRODUCTS,
            format!(
                "{} products and {} images copied",
                result.products_cloned, result.images_cloned
            ),
        );

        // Step 5: display settings, never fatal
        if reconcile {
            if let Err(e) = self.reconciler.reconcile(target_id).await {
                let err: AppError = e.into();
                tracing::warn!(
                    target_tenant_id = %target_id,
                    error = %err,
                    "Settings reconciliation failed, continuing"
                );
                result.errors.push(format!(
                    "Settings reconciliation failed (non-critical): {}",
                    err.message
                ));
            }
            progress.step(STEP_SETTINGS, "Display settings reconciled");
        } else {
            progress.step(STEP_SETTINGS, "Display settings left unchanged");
        }

        result.cancelled = cancelled;
        result.success = !cancelled;
        if cancelled {
            tracing::warn!(
                target_tenant_id = %target_id,
                products_cloned = result.products_cloned,
                "Clone cancelled"
            );
            result
                .errors
                .push(AppError::new(ErrorCode::CloneCancelled).message);
            progress.step(STEP_COMPLETE, "Clone cancelled");
        } else {
            progress.step(STEP_COMPLETE, "Clone completed");
        }

        tracing::info!(
            source_tenant_id = %source_id,
            target_tenant_id = %target_id,
            success = result.success,
            categories_cloned = result.categories_cloned,
            products_cloned = result.products_cloned,
            images_cloned = result.images_cloned,
            errors = result.errors.len(),
            "Clone finished"
        );
        result
    }

    fn abort(progress: &Progress<'_>, err: AppError) -> CloneResult {
        tracing::error!(code = %err.code, error = %err, "Clone aborted");
        progress.step(STEP_COMPLETE, format!("Clone aborted: {}", err.message));
        CloneResult::aborted(err.message)
    }

    async fn load_tenants(&self, req: &CloneRequest) -> ServiceResult<(Tenant, Tenant)> {
        let source = self
            .stores
            .tenants
            .get(&req.source_tenant_id)
            .await?
            .ok_or_else(|| AppError::tenant_not_found(&req.source_tenant_id))?;
        let target = self
            .stores
            .tenants
            .get(&req.target_tenant_id)
            .await?
            .ok_or_else(|| AppError::tenant_not_found(&req.target_tenant_id))?;
        Ok((source, target))
    }

    /// Source products to copy, if they fit the target's quota
    async fn plan_products(
        &self,
        req: &CloneRequest,
        target: &Tenant,
    ) -> ServiceResult<Vec<Product>> {
        let products = self
            .stores
            .products
            .list_by_tenant(&req.source_tenant_id, Some(req.max_products))
            .await?;

        // A replace clone starts from an empty target
        let existing = match req.merge_strategy {
            MergeStrategy::Replace => 0,
            MergeStrategy::Merge => self.stores.products.count_by_tenant(&target.id).await?,
        };
        let projected = existing + products.len() as i64;
        if projected > target.product_quota {
            return Err(AppError::quota_exceeded(&target.id, projected, target.product_quota).into());
        }
        Ok(products)
    }

    async fn wipe_target(&self, tenant_id: &str) -> ServiceResult<()> {
        let products = self.stores.products.delete_all_by_tenant(tenant_id).await?;
        let categories = self.stores.categories.delete_all_by_tenant(tenant_id).await?;
        tracing::warn!(
            target: "audit",
            tenant_id = %tenant_id,
            products_deleted = products,
            categories_deleted = categories,
            "Replace clone wiped target catalog"
        );
        Ok(())
    }

    /// Insert source categories whose key the target lacks
    async fn copy_categories(&self, source_id: &str, target_id: &str) -> ServiceResult<usize> {
        let source = self.stores.categories.list_by_tenant(source_id).await?;
        let target = self.stores.categories.list_by_tenant(target_id).await?;

        let mut taken: HashSet<String> = target.iter().map(|c| comparison_key(&c.name)).collect();
        let missing: Vec<CategoryCreate> = source
            .iter()
            .filter(|c| {
                let key = comparison_key(&c.name);
                !key.is_empty() && taken.insert(key)
            })
            .map(|c| CategoryCreate::new(c.name.clone()))
            .collect();
        if missing.is_empty() {
            return Ok(0);
        }

        let inserted = self.stores.categories.insert_many(target_id, &missing).await?;
        tracing::info!(
            target_tenant_id = %target_id,
            inserted = inserted.len(),
            requested = missing.len(),
            "Categories copied"
        );
        Ok(inserted.len())
    }

    async fn copy_product(
        &self,
        product: &Product,
        target_id: &str,
        result: &mut CloneResult,
    ) -> Option<Product> {
        match self
            .stores
            .products
            .insert(target_id, &ProductCreate::copy_of(product))
            .await
        {
            Ok(copy) => Some(copy),
            Err(e) => {
                tracing::warn!(
                    target_tenant_id = %target_id,
                    source_product_id = product.id,
                    error = %e,
                    "Product copy failed"
                );
                result
                    .errors
                    .push(format!("Failed to copy product \"{}\": {e}", product.title));
                None
            }
        }
    }

    /// Copy a product's images, then point the copy at its featured image
    async fn copy_images(
        &self,
        source: &Product,
        copy: &Product,
        req: &CloneRequest,
        cancel: &CancellationToken,
        result: &mut CloneResult,
    ) -> ImageOutcome {
        let mut outcome = ImageOutcome::default();
        let images = match self.stores.images.list_by_product(source.id).await {
            Ok(images) => images,
            Err(e) => {
                result.errors.push(format!(
                    "Failed to list images of product \"{}\": {e}",
                    source.title
                ));
                return outcome;
            }
        };

        // Flagged image first, else the one the product points at
        let featured = images.iter().position(|img| img.is_featured).or_else(|| {
            source
                .featured_image
                .as_ref()
                .and_then(|url| images.iter().position(|img| &img.url == url))
        });

        let mut featured_url = None;
        for (index, image) in images.iter().enumerate() {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            let url = if req.physical_duplicate {
                match self
                    .stores
                    .images
                    .duplicate_binary(&image.url, &req.target_tenant_id)
                    .await
                {
                    Ok(url) => url,
                    Err(e) => {
                        let err = image_copy_failed(source, &image.url, "duplicate", &e);
                        tracing::warn!(
                            image_id = image.id,
                            code = %err.code,
                            error = %err,
                            "Image duplication failed"
                        );
                        result.errors.push(err.message);
                        continue;
                    }
                }
            } else {
                image.url.clone()
            };

            let is_featured = featured == Some(index);
            let record = ProductImageCreate {
                product_id: copy.id,
                url,
                is_featured,
            };
            match self.stores.images.insert(&record).await {
                Ok(created) => {
                    outcome.copied += 1;
                    if is_featured {
                        featured_url = Some(created.url);
                    }
                }
                Err(e) => {
                    let err = image_copy_failed(source, &image.url, "copy", &e);
                    tracing::warn!(
                        image_id = image.id,
                        code = %err.code,
                        error = %err,
                        "Image record copy failed"
                    );
                    result.errors.push(err.message);
                }
            }
        }

        if let Some(url) = featured_url {
            let update = ProductUpdate {
                featured_image: Some(url),
                ..Default::default()
            };
            if let Err(e) = self.stores.products.update(&copy.tenant_id, copy.id, &update).await {
                result.errors.push(format!(
                    "Failed to set featured image of product \"{}\": {e}",
                    source.title
                ));
            }
        }
        outcome
    }
}

fn image_copy_failed(
    product: &Product,
    url: &str,
    action: &str,
    reason: &RepoError,
) -> AppError {
    AppError::with_message(
        ErrorCode::ImageCopyFailed,
        format!(
            "Failed to {action} image {url} of product \"{}\": {reason}",
            product.title
        ),
    )
    .with_detail("product_id", product.id)
    .with_detail("url", url)
}
