//! Product endpoints with per-action error normalization.

use crate::error::ApiResult;
use crate::gateway::Gateway;
use crate::types::Product;

pub const PRODUCTS_FAILED: &str = "Failed to load products";
pub const PRODUCT_FAILED: &str = "Failed to load product";
pub const CATEGORY_PRODUCTS_FAILED: &str = "Failed to load products for category";
pub const CATEGORIES_FAILED: &str = "Failed to load categories";

#[derive(Debug, Clone)]
pub struct ProductsActions {
    gateway: Gateway,
}

impl ProductsActions {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn fetch_all_products(&self) -> ApiResult<Vec<Product>> {
        self.gateway
            .get("/products", true)
            .map_err(|e| e.into_domain(PRODUCTS_FAILED))
    }

    pub fn fetch_product(&self, id: i64) -> ApiResult<Product> {
        self.gateway
            .get(&format!("/products/{id}"), true)
            .map_err(|e| e.into_domain(PRODUCT_FAILED))
    }

    /// Server-side category filter. The category is percent-encoded as a
    /// single path segment ("men's clothing" and friends).
    pub fn fetch_products_by_category(&self, category: &str) -> ApiResult<Vec<Product>> {
        let path = format!("/products/category/{}", urlencoding::encode(category));
        self.gateway
            .get(&path, true)
            .map_err(|e| e.into_domain(CATEGORY_PRODUCTS_FAILED))
    }

    pub fn fetch_categories(&self) -> ApiResult<Vec<String>> {
        self.gateway
            .get("/products/categories", true)
            .map_err(|e| e.into_domain(CATEGORIES_FAILED))
    }
}
