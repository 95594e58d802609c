//! In-process catalog store
//!
//! Implements every store trait over a single `RwLock`-guarded state.
//! Blob bytes are kept in a map keyed by URL so physical duplication can be
//! observed.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::models::{
    Category, CategoryCreate, Product, ProductCreate, ProductImage, ProductImageCreate,
    ProductUpdate, SettingsDocument, Tenant,
};
use shared::util::now_millis;

use super::{
    CategoryStore, ImageStore, ProductStore, RepoError, RepoResult, SettingsStore, TenantStore,
};
use crate::normalize::{comparison_key, sanitize};

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    tenants: HashMap<String, Tenant>,
    categories: Vec<Category>,
    products: Vec<Product>,
    images: Vec<ProductImage>,
    settings: HashMap<String, SettingsDocument>,
    blobs: HashMap<String, Vec<u8>>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_product(&mut self, tenant_id: &str, data: &ProductCreate) -> Product {
        let product = Product {
            id: self.next_id(),
            tenant_id: tenant_id.to_string(),
            title: data.title.clone(),
            description: data.description.clone(),
            price: data.price,
            compare_at_price: data.compare_at_price,
            sku: data.sku.clone(),
            stock: data.stock,
            categories: data.categories.clone(),
            is_visible: data.is_visible,
            featured_image: data.featured_image.clone(),
            created_at: now_millis(),
        };
        self.products.push(product.clone());
        product
    }

    fn insert_image(&mut self, data: &ProductImageCreate) -> ProductImage {
        let image = ProductImage {
            id: self.next_id(),
            product_id: data.product_id,
            url: data.url.clone(),
            is_featured: data.is_featured,
            created_at: now_millis(),
        };
        self.images.push(image.clone());
        image
    }
}

/// In-memory implementation of every store trait
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: RwLock<State>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Seeding ──

    pub fn add_tenant(&self, tenant_id: &str, product_quota: i64) {
        self.state.write().tenants.insert(
            tenant_id.to_string(),
            Tenant {
                id: tenant_id.to_string(),
                product_quota,
            },
        );
    }

    /// Insert a category as-is (no key check)
    pub fn seed_category(&self, tenant_id: &str, name: &str) -> Category {
        let mut state = self.state.write();
        let category = Category {
            id: state.next_id(),
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            created_at: now_millis(),
        };
        state.categories.push(category.clone());
        category
    }

    pub fn seed_product(&self, tenant_id: &str, data: ProductCreate) -> Product {
        self.state.write().insert_product(tenant_id, &data)
    }

    /// Attach an image; when `bytes` is given it is stored as the blob at `url`
    pub fn seed_image(
        &self,
        product_id: i64,
        url: &str,
        is_featured: bool,
        bytes: Option<&[u8]>,
    ) -> ProductImage {
        let mut state = self.state.write();
        if let Some(bytes) = bytes {
            state.blobs.insert(url.to_string(), bytes.to_vec());
        }
        state.insert_image(&ProductImageCreate {
            product_id,
            url: url.to_string(),
            is_featured,
        })
    }

    pub fn seed_settings(&self, tenant_id: &str, document: SettingsDocument) {
        self.state
            .write()
            .settings
            .insert(tenant_id.to_string(), document);
    }

    // ── Inspection ──

    pub fn category_names(&self, tenant_id: &str) -> Vec<String> {
        self.state
            .read()
            .categories
            .iter()
            .filter(|c| c.tenant_id == tenant_id)
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn products_of(&self, tenant_id: &str) -> Vec<Product> {
        self.state
            .read()
            .products
            .iter()
            .filter(|p| p.tenant_id == tenant_id)
            .cloned()
            .collect()
    }

    pub fn images_of(&self, product_id: i64) -> Vec<ProductImage> {
        self.state
            .read()
            .images
            .iter()
            .filter(|i| i.product_id == product_id)
            .cloned()
            .collect()
    }

    pub fn settings_of(&self, tenant_id: &str) -> Option<SettingsDocument> {
        self.state.read().settings.get(tenant_id).cloned()
    }

    pub fn blob(&self, url: &str) -> Option<Vec<u8>> {
        self.state.read().blobs.get(url).cloned()
    }
}

#[async_trait]
impl TenantStore for MemoryCatalog {
    async fn get(&self, tenant_id: &str) -> RepoResult<Option<Tenant>> {
        Ok(self.state.read().tenants.get(tenant_id).cloned())
    }
}

#[async_trait]
impl CategoryStore for MemoryCatalog {
    async fn list_by_tenant(&self, tenant_id: &str) -> RepoResult<Vec<Category>> {
        Ok(self.categories_of(tenant_id))
    }

    async fn insert_many(
        &self,
        tenant_id: &str,
        items: &[CategoryCreate],
    ) -> RepoResult<Vec<Category>> {
        let mut state = self.state.write();
        let mut taken: HashSet<String> = state
            .categories
            .iter()
            .filter(|c| c.tenant_id == tenant_id)
            .map(|c| comparison_key(&c.name))
            .collect();

        let now = now_millis();
        let mut inserted = Vec::new();
        for item in items {
            let name = sanitize(&item.name);
            if name.is_empty() || !taken.insert(comparison_key(&name)) {
                continue;
            }
            let category = Category {
                id: state.next_id(),
                tenant_id: tenant_id.to_string(),
                name,
                created_at: now,
            };
            state.categories.push(category.clone());
            inserted.push(category);
        }
        Ok(inserted)
    }

    async fn delete_all_by_tenant(&self, tenant_id: &str) -> RepoResult<u64> {
        let mut state = self.state.write();
        let before = state.categories.len();
        state.categories.retain(|c| c.tenant_id != tenant_id);
        Ok((before - state.categories.len()) as u64)
    }
}

impl MemoryCatalog {
    fn categories_of(&self, tenant_id: &str) -> Vec<Category> {
        self.state
            .read()
            .categories
            .iter()
            .filter(|c| c.tenant_id == tenant_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ProductStore for MemoryCatalog {
    async fn list_by_tenant(
        &self,
        tenant_id: &str,
        limit: Option<usize>,
    ) -> RepoResult<Vec<Product>> {
        let state = self.state.read();
        let products = state.products.iter().filter(|p| p.tenant_id == tenant_id);
        Ok(match limit {
            Some(n) => products.take(n).cloned().collect(),
            None => products.cloned().collect(),
        })
    }

    async fn count_by_tenant(&self, tenant_id: &str) -> RepoResult<i64> {
        let state = self.state.read();
        Ok(state
            .products
            .iter()
            .filter(|p| p.tenant_id == tenant_id)
            .count() as i64)
    }

    async fn insert(&self, tenant_id: &str, data: &ProductCreate) -> RepoResult<Product> {
        Ok(self.state.write().insert_product(tenant_id, data))
    }

    async fn update(
        &self,
        tenant_id: &str,
        product_id: i64,
        data: &ProductUpdate,
    ) -> RepoResult<Product> {
        let mut state = self.state.write();
        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == product_id && p.tenant_id == tenant_id)
            .ok_or_else(|| RepoError::NotFound(format!("product {product_id}")))?;

        if let Some(title) = &data.title {
            product.title = title.clone();
        }
        if let Some(description) = &data.description {
            product.description = Some(description.clone());
        }
        if let Some(price) = data.price {
            product.price = price;
        }
        if let Some(categories) = &data.categories {
            product.categories = categories.clone();
        }
        if let Some(visible) = data.is_visible {
            product.is_visible = visible;
        }
        if let Some(url) = &data.featured_image {
            product.featured_image = Some(url.clone());
        }
        Ok(product.clone())
    }

    async fn delete(&self, tenant_id: &str, product_id: i64) -> RepoResult<bool> {
        let mut state = self.state.write();
        let before = state.products.len();
        state
            .products
            .retain(|p| !(p.id == product_id && p.tenant_id == tenant_id));
        let removed = state.products.len() < before;
        if removed {
            state.images.retain(|i| i.product_id != product_id);
        }
        Ok(removed)
    }

    async fn delete_all_by_tenant(&self, tenant_id: &str) -> RepoResult<u64> {
        let mut state = self.state.write();
        let doomed: HashSet<i64> = state
            .products
            .iter()
            .filter(|p| p.tenant_id == tenant_id)
            .map(|p| p.id)
            .collect();
        state.products.retain(|p| !doomed.contains(&p.id));
        state.images.retain(|i| !doomed.contains(&i.product_id));
        Ok(doomed.len() as u64)
    }
}

#[async_trait]
impl ImageStore for MemoryCatalog {
    async fn list_by_product(&self, product_id: i64) -> RepoResult<Vec<ProductImage>> {
        Ok(self.images_of(product_id))
    }

    async fn insert(&self, data: &ProductImageCreate) -> RepoResult<ProductImage> {
        let mut state = self.state.write();
        if !state.products.iter().any(|p| p.id == data.product_id) {
            return Err(RepoError::NotFound(format!("product {}", data.product_id)));
        }
        Ok(state.insert_image(data))
    }

    async fn duplicate_binary(&self, url: &str, target_tenant_id: &str) -> RepoResult<String> {
        let mut state = self.state.write();
        let bytes = state
            .blobs
            .get(url)
            .cloned()
            .ok_or_else(|| RepoError::Storage(format!("blob {url} does not exist")))?;
        let file_name = url.rsplit('/').next().unwrap_or(url);
        let new_url = format!("images/{target_tenant_id}/{}-{file_name}", state.next_id());
        state.blobs.insert(new_url.clone(), bytes);
        Ok(new_url)
    }
}

#[async_trait]
impl SettingsStore for MemoryCatalog {
    async fn get(&self, tenant_id: &str) -> RepoResult<Option<SettingsDocument>> {
        Ok(self.settings_of(tenant_id))
    }

    async fn upsert(&self, tenant_id: &str, document: &SettingsDocument) -> RepoResult<()> {
        self.seed_settings(tenant_id, document.clone());
        Ok(())
    }
}
