//! Category and product mutations
//!
//! Every write that can change a tenant's category set is followed by a
//! settings reconciliation. A failed reconciliation is logged and does not
//! fail the write.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{Category, CategoryCreate, Product, ProductCreate, ProductUpdate};

use crate::error::ServiceResult;
use crate::normalize::{comparison_key, dedupe, is_valid_name, validate_and_sanitize_batch};
use crate::settings::SettingsReconciler;
use crate::store::{RepoError, Stores};

/// Result of a category batch creation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryBatchOutcome {
    pub created: Vec<Category>,
    /// Raw names that failed validation
    pub invalid: Vec<String>,
    /// Names dropped because their key already exists (in the batch or tenant)
    pub duplicates: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CatalogService {
    stores: Stores,
    reconciler: SettingsReconciler,
}

impl CatalogService {
    pub fn new(stores: Stores, reconciler: SettingsReconciler) -> Self {
        Self { stores, reconciler }
    }

    /// Validate, deduplicate and insert a batch of category names
    pub async fn create_categories<I, S>(
        &self,
        tenant_id: &str,
        names: I,
    ) -> ServiceResult<CategoryBatchOutcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let batch = validate_and_sanitize_batch(names);
        let existing: HashSet<String> = self
            .stores
            .categories
            .list_by_tenant(tenant_id)
            .await?
            .iter()
            .map(|c| comparison_key(&c.name))
            .collect();

        let mut duplicates = batch.duplicates;
        let mut fresh = Vec::with_capacity(batch.valid.len());
        for name in batch.valid {
            if existing.contains(&comparison_key(&name)) {
                duplicates.push(name);
            } else {
                fresh.push(CategoryCreate::new(name));
            }
        }

        if fresh.is_empty() {
            return Err(AppError::with_message(
                ErrorCode::CategoryBatchEmpty,
                "No valid category names to create",
            )
            .with_detail("invalid", batch.invalid)
            .with_detail("duplicates", duplicates)
            .into());
        }

        if !duplicates.is_empty() {
            tracing::warn!(
                tenant_id = %tenant_id,
                dropped = ?duplicates,
                "Duplicate category names dropped"
            );
        }

        let created = self
            .stores
            .categories
            .insert_many(tenant_id, &fresh)
            .await
            .map_err(|e| {
                AppError::with_message(
                    ErrorCode::CategoryCreateFailed,
                    format!("Failed to create categories: {e}"),
                )
            })?;

        // Lost a race with a concurrent insert of the same key
        if created.len() < fresh.len() {
            let inserted: HashSet<String> =
                created.iter().map(|c| comparison_key(&c.name)).collect();
            duplicates.extend(
                fresh
                    .into_iter()
                    .map(|c| c.name)
                    .filter(|name| !inserted.contains(&comparison_key(name))),
            );
        }

        tracing::info!(tenant_id = %tenant_id, created = created.len(), "Categories created");
        Ok(CategoryBatchOutcome {
            created,
            invalid: batch.invalid,
            duplicates,
        })
    }

    pub async fn create_product(
        &self,
        tenant_id: &str,
        mut data: ProductCreate,
    ) -> ServiceResult<Product> {
        data.categories = clean_category_list(&data.categories);
        let product = self
            .stores
            .products
            .insert(tenant_id, &data)
            .await
            .map_err(|e| {
                AppError::with_message(
                    ErrorCode::ProductCreateFailed,
                    format!("Failed to create product: {e}"),
                )
            })?;
        tracing::info!(tenant_id = %tenant_id, product_id = product.id, "Product created");

        self.reconcile_quietly(tenant_id).await;
        Ok(product)
    }

    pub async fn update_product(
        &self,
        tenant_id: &str,
        product_id: i64,
        mut data: ProductUpdate,
    ) -> ServiceResult<Product> {
        if let Some(categories) = data.categories.as_deref() {
            data.categories = Some(clean_category_list(categories));
        }
        let product = self
            .stores
            .products
            .update(tenant_id, product_id, &data)
            .await
            .map_err(|e| match e {
                RepoError::NotFound(_) => product_not_found(product_id).into(),
                other => crate::error::ServiceError::from(other),
            })?;
        tracing::info!(tenant_id = %tenant_id, product_id, "Product updated");

        if data.touches_categories() {
            self.reconcile_quietly(&product.tenant_id).await;
        }
        Ok(product)
    }

    pub async fn delete_product(&self, tenant_id: &str, product_id: i64) -> ServiceResult<()> {
        if !self.stores.products.delete(tenant_id, product_id).await? {
            return Err(product_not_found(product_id).into());
        }
        tracing::info!(tenant_id = %tenant_id, product_id, "Product deleted");

        self.reconcile_quietly(tenant_id).await;
        Ok(())
    }

    async fn reconcile_quietly(&self, tenant_id: &str) {
        if let Err(e) = self.reconciler.reconcile(tenant_id).await {
            tracing::warn!(tenant_id = %tenant_id, error = %e, "Settings reconciliation failed");
        }
    }
}

fn product_not_found(product_id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::ProductNotFound,
        format!("Product {product_id} not found"),
    )
    .with_detail("product_id", product_id)
}

/// Sanitized, deduplicated, valid category names
fn clean_category_list(names: &[String]) -> Vec<String> {
    dedupe(names)
        .into_iter()
        .filter(|name| is_valid_name(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_category_list() {
        let names: Vec<String> = ["Nike", " nike ", "X", "  ", "Tênis"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(clean_category_list(&names), vec!["Nike", "Tênis"]);
    }
}
