//! PostgreSQL + S3 catalog store
//!
//! Schema lives in `migrations/0001_catalog.sql`. Category keys are never
//! stored: `insert_many` recomputes them inside a transaction that holds a
//! per-tenant advisory lock.

use std::collections::HashSet;

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use shared::models::{
    Category, CategoryCreate, Product, ProductCreate, ProductImage, ProductImageCreate,
    ProductUpdate, SettingsDocument, Tenant,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;
use sqlx::types::Json;

use super::{
    CategoryStore, ImageStore, ProductStore, RepoError, RepoResult, SettingsStore, TenantStore,
};
use crate::normalize::{comparison_key, sanitize};

const PRODUCT_COLUMNS: &str = "id, tenant_id, title, description, price, compare_at_price, \
     sku, stock, categories, is_visible, featured_image, created_at";

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate(db.message().to_string())
            }
            other => RepoError::Database(other.to_string()),
        }
    }
}

/// S3 bucket used for physical image duplication
#[derive(Debug, Clone)]
pub struct BlobBucket {
    pub client: S3Client,
    pub bucket: String,
}

/// PostgreSQL-backed implementation of every store trait
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
    blobs: Option<BlobBucket>,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, blobs: None }
    }

    pub fn with_blob_bucket(mut self, client: S3Client, bucket: impl Into<String>) -> Self {
        self.blobs = Some(BlobBucket {
            client,
            bucket: bucket.into(),
        });
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TenantStore for PgCatalog {
    async fn get(&self, tenant_id: &str) -> RepoResult<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT id, product_quota FROM tenants WHERE id = $1",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant)
    }
}

#[async_trait]
impl CategoryStore for PgCatalog {
    async fn list_by_tenant(&self, tenant_id: &str) -> RepoResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, tenant_id, name, created_at FROM catalog_categories
                WHERE tenant_id = $1
                ORDER BY created_at, id",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_many(
        &self,
        tenant_id: &str,
        items: &[CategoryCreate],
    ) -> RepoResult<Vec<Category>> {
        let mut tx = self.pool.begin().await?;

        // Serializes key check + insert across processes for this tenant
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;

        let existing: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM catalog_categories WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_all(&mut *tx)
                .await?;
        let mut taken: HashSet<String> = existing
            .iter()
            .map(|(name,)| comparison_key(name))
            .collect();

        let now = now_millis();
        let mut inserted = Vec::new();
        for item in items {
            let name = sanitize(&item.name);
            if name.is_empty() || !taken.insert(comparison_key(&name)) {
                continue;
            }
            let category = sqlx::query_as::<_, Category>(
                "INSERT INTO catalog_categories (id, tenant_id, name, created_at)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id, tenant_id, name, created_at",
            )
            .bind(snowflake_id())
            .bind(tenant_id)
            .bind(&name)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(category);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn delete_all_by_tenant(&self, tenant_id: &str) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM catalog_categories WHERE tenant_id = $1")
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ProductStore for PgCatalog {
    async fn list_by_tenant(
        &self,
        tenant_id: &str,
        limit: Option<usize>,
    ) -> RepoResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM catalog_products
                WHERE tenant_id = $1
                ORDER BY created_at, id
                LIMIT $2"
        );
        // NULL limit means no limit in PostgreSQL
        let limit = limit.map(|n| i64::try_from(n).unwrap_or(i64::MAX));
        let rows = sqlx::query_as::<_, Product>(&sql)
            .bind(tenant_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count_by_tenant(&self, tenant_id: &str) -> RepoResult<i64> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM catalog_products WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    async fn insert(&self, tenant_id: &str, data: &ProductCreate) -> RepoResult<Product> {
        let sql = format!(
            "INSERT INTO catalog_products ({PRODUCT_COLUMNS})
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING {PRODUCT_COLUMNS}"
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(snowflake_id())
            .bind(tenant_id)
            .bind(&data.title)
            .bind(&data.description)
            .bind(data.price)
            .bind(data.compare_at_price)
            .bind(&data.sku)
            .bind(data.stock)
            .bind(&data.categories)
            .bind(data.is_visible)
            .bind(&data.featured_image)
            .bind(now_millis())
            .fetch_one(&self.pool)
            .await?;
        Ok(product)
    }

    async fn update(
        &self,
        tenant_id: &str,
        product_id: i64,
        data: &ProductUpdate,
    ) -> RepoResult<Product> {
        let sql = format!(
            "UPDATE catalog_products SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                categories = COALESCE($5, categories),
                is_visible = COALESCE($6, is_visible),
                featured_image = COALESCE($7, featured_image)
                WHERE id = $1 AND tenant_id = $8
                RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(product_id)
            .bind(&data.title)
            .bind(&data.description)
            .bind(data.price)
            .bind(&data.categories)
            .bind(data.is_visible)
            .bind(&data.featured_image)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("product {product_id}")))
    }

    async fn delete(&self, tenant_id: &str, product_id: i64) -> RepoResult<bool> {
        // Images go with the product (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM catalog_products WHERE id = $1 AND tenant_id = $2")
            .bind(product_id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_by_tenant(&self, tenant_id: &str) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM catalog_products WHERE tenant_id = $1")
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ImageStore for PgCatalog {
    async fn list_by_product(&self, product_id: i64) -> RepoResult<Vec<ProductImage>> {
        let rows = sqlx::query_as::<_, ProductImage>(
            "SELECT id, product_id, url, is_featured, created_at FROM catalog_product_images
                WHERE product_id = $1
                ORDER BY created_at, id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert(&self, data: &ProductImageCreate) -> RepoResult<ProductImage> {
        let image = sqlx::query_as::<_, ProductImage>(
            "INSERT INTO catalog_product_images (id, product_id, url, is_featured, created_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, product_id, url, is_featured, created_at",
        )
        .bind(snowflake_id())
        .bind(data.product_id)
        .bind(&data.url)
        .bind(data.is_featured)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await?;
        Ok(image)
    }

    async fn duplicate_binary(&self, url: &str, target_tenant_id: &str) -> RepoResult<String> {
        let blobs = self
            .blobs
            .as_ref()
            .ok_or_else(|| RepoError::Storage("no image bucket configured".to_string()))?;

        let source_key = url.trim_start_matches('/');
        let file_name = source_key.rsplit('/').next().unwrap_or(source_key);
        let new_key = format!("images/{target_tenant_id}/{}-{file_name}", snowflake_id());

        blobs
            .client
            .copy_object()
            .bucket(&blobs.bucket)
            .copy_source(format!("{}/{source_key}", blobs.bucket))
            .key(&new_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(source = %source_key, target = %new_key, error = %e, "S3 copy failed");
                RepoError::Storage(format!("copy {source_key}: {e}"))
            })?;

        Ok(new_key)
    }
}

#[async_trait]
impl SettingsStore for PgCatalog {
    async fn get(&self, tenant_id: &str) -> RepoResult<Option<SettingsDocument>> {
        let row: Option<(Json<SettingsDocument>,)> =
            sqlx::query_as("SELECT document FROM storefront_settings WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(Json(doc),)| doc))
    }

    async fn upsert(&self, tenant_id: &str, document: &SettingsDocument) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO storefront_settings (tenant_id, document, updated_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (tenant_id)
                DO UPDATE SET document = EXCLUDED.document, updated_at = EXCLUDED.updated_at",
        )
        .bind(tenant_id)
        .bind(Json(document))
        .bind(now_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
