//! Product catalog state: remote results merged with on-device products.
//!
//! # Design
//! Local and remote products are never reconciled by identity. After every
//! fetch the working list is `local ++ remote`, local products first, each
//! half in its own order. Local ids are negative and strictly decreasing
//! from -1; remote ids are assumed positive. A remote product that breaks
//! that assumption is kept as returned and logged.
//!
//! Only `localProducts` is persisted. Everything else is rebuilt by fetches.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::PRODUCTS_STORAGE_KEY;
use crate::error::{ApiError, ApiResult};
use crate::products_actions::{ProductsActions, CATEGORIES_FAILED, PRODUCTS_FAILED};
use crate::storage::{load_snapshot, save_snapshot, KeyValueStorage};
use crate::types::{CreateProductDto, Product};

pub const CREATE_PRODUCT_FAILED: &str = "Failed to create product";
pub const LOCAL_PRODUCT_NOT_FOUND: &str = "Local product not found";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Local products first, then the last remote fetch.
    pub products: Vec<Product>,
    /// Newest first.
    pub local_products: Vec<Product>,
    pub selected_product: Option<Product>,
    pub categories: Vec<String>,
    pub selected_category: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedCatalog {
    #[serde(default)]
    local_products: Vec<Product>,
}

pub struct CatalogStore {
    state: Catalog,
    actions: ProductsActions,
    storage: Arc<dyn KeyValueStorage>,
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("products", &self.state.products.len())
            .field("local_products", &self.state.local_products.len())
            .finish_non_exhaustive()
    }
}

impl CatalogStore {
    /// Build the store, restoring local products from storage.
    pub fn new(actions: ProductsActions, storage: Arc<dyn KeyValueStorage>) -> Self {
        let mut state = Catalog::default();
        if let Some(saved) = load_snapshot::<PersistedCatalog>(storage.as_ref(), PRODUCTS_STORAGE_KEY) {
            info!(count = saved.local_products.len(), "restored local products");
            state.local_products = saved.local_products;
        }
        Self {
            state,
            actions,
            storage,
        }
    }

    pub fn state(&self) -> &Catalog {
        &self.state
    }

    pub fn products(&self) -> &[Product] {
        &self.state.products
    }

    pub fn local_products(&self) -> &[Product] {
        &self.state.local_products
    }

    pub fn categories(&self) -> &[String] {
        &self.state.categories
    }

    pub fn selected_product(&self) -> Option<&Product> {
        self.state.selected_product.as_ref()
    }

    pub fn selected_category(&self) -> Option<&str> {
        self.state.selected_category.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    /// Refresh the full list. Failures are recorded, the previous list kept.
    pub fn fetch_products(&mut self) {
        self.state.is_loading = true;
        self.state.error = None;
        match self.actions.fetch_all_products() {
            Ok(remote) => {
                let local = self.state.local_products.clone();
                self.commit_products(local, remote);
            }
            Err(e) => self.record_fetch_failure(e, PRODUCTS_FAILED),
        }
    }

    /// Refresh the list for one category. Local products are filtered by a
    /// case-insensitive exact match; the remote list is filtered by the API.
    pub fn fetch_products_by_category(&mut self, category: &str) {
        self.state.is_loading = true;
        self.state.error = None;
        self.state.selected_category = Some(category.to_string());
        match self.actions.fetch_products_by_category(category) {
            Ok(remote) => {
                let local = self
                    .state
                    .local_products
                    .iter()
                    .filter(|p| p.in_category(category))
                    .cloned()
                    .collect();
                self.commit_products(local, remote);
            }
            Err(e) => self.record_fetch_failure(e, PRODUCTS_FAILED),
        }
    }

    /// Replace the category list. Does not touch `is_loading`.
    pub fn fetch_categories(&mut self) {
        match self.actions.fetch_categories() {
            Ok(categories) => self.state.categories = categories,
            Err(e) => {
                warn!(error = %e, "category refresh failed");
                self.state.error = Some(non_empty(e.message(), CATEGORIES_FAILED));
            }
        }
    }

    /// Create a product on-device and put it at the front of both lists.
    ///
    /// The new id is one below the smallest existing local id, or -1 for
    /// the first one. The in-memory commit stands even if the snapshot write
    /// fails; the write error is recorded and returned.
    pub fn create_local_product(&mut self, dto: CreateProductDto) -> ApiResult<Product> {
        let result = self.try_create_local_product(dto);
        if let Err(e) = &result {
            warn!(error = %e, "local product creation failed");
            self.state.error = Some(non_empty(e.message(), CREATE_PRODUCT_FAILED));
        }
        result
    }

    fn try_create_local_product(&mut self, dto: CreateProductDto) -> ApiResult<Product> {
        let id = next_local_id(&self.state.local_products)
            .ok_or_else(|| ApiError::domain("local product ids exhausted"))?;
        let product = dto.into_local_product(id);

        self.state.local_products.insert(0, product.clone());
        self.state.products.insert(0, product.clone());
        info!(id, title = %product.title, "created local product");

        let snapshot = PersistedCatalog {
            local_products: self.state.local_products.clone(),
        };
        save_snapshot(self.storage.as_ref(), PRODUCTS_STORAGE_KEY, &snapshot)?;
        Ok(product)
    }

    /// Resolve a product for a detail view without changing store state.
    ///
    /// Negative ids are looked up among local products; everything else is
    /// fetched from the API.
    pub fn product_detail(&self, id: i64) -> ApiResult<Product> {
        if id < 0 {
            return self
                .state
                .local_products
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| ApiError::domain(LOCAL_PRODUCT_NOT_FOUND));
        }
        self.actions.fetch_product(id)
    }

    pub fn select_product(&mut self, product: Option<Product>) {
        self.state.selected_product = product;
    }

    pub fn select_category(&mut self, category: Option<String>) {
        self.state.selected_category = category;
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    fn commit_products(&mut self, local: Vec<Product>, remote: Vec<Product>) {
        for product in remote.iter().filter(|p| p.id <= 0) {
            warn!(id = product.id, "remote product with non-positive id may collide with local ids");
        }
        let mut products = local;
        products.extend(remote);
        self.state.products = products;
        self.state.is_loading = false;
    }

    fn record_fetch_failure(&mut self, err: ApiError, fallback: &str) {
        warn!(error = %err, "product refresh failed");
        self.state.error = Some(non_empty(err.message(), fallback));
        self.state.is_loading = false;
    }
}

fn next_local_id(local: &[Product]) -> Option<i64> {
    match local.iter().map(|p| p.id).min() {
        Some(min) => min.checked_sub(1),
        None => Some(-1),
    }
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SharedToken;
    use crate::http::HttpMethod;
    use crate::storage::{MemoryStorage, StorageError};
    use crate::testing::{product_json, products_json, ScriptedTransport};
    use crate::types::Rating;

    fn store_with(
        transport: &Arc<ScriptedTransport>,
        storage: Arc<dyn KeyValueStorage>,
    ) -> CatalogStore {
        CatalogStore::new(
            ProductsActions::new(transport.gateway(SharedToken::new())),
            storage,
        )
    }

    fn dto(title: &str, category: &str) -> CreateProductDto {
        CreateProductDto {
            title: title.to_string(),
            price: 19.99,
            description: "made on device".to_string(),
            category: category.to_string(),
            image: "data:image/jpeg;base64,AAAA".to_string(),
        }
    }

    fn ids(products: &[Product]) -> Vec<i64> {
        products.iter().map(|p| p.id).collect()
    }

    #[test]
    fn local_ids_count_down_newest_first() {
        let transport = ScriptedTransport::new();
        let mut store = store_with(&transport, Arc::new(MemoryStorage::new()));

        store.create_local_product(dto("A", "electronics")).unwrap();
        store.create_local_product(dto("B", "electronics")).unwrap();
        let c = store.create_local_product(dto("C", "jewelery")).unwrap();

        assert_eq!(c.id, -3);
        assert!(c.is_local());
        assert_eq!(c.rating, Rating { rate: 0.0, count: 0 });
        assert_eq!(ids(store.local_products()), vec![-3, -2, -1]);
        assert_eq!(store.products(), store.local_products());
        let titles: Vec<&str> = store.local_products().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "B", "A"]);
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn new_id_is_below_smallest_even_with_gaps() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_item(
                PRODUCTS_STORAGE_KEY,
                &format!(
                    r#"{{"state":{{"localProducts":[{}]}},"version":0}}"#,
                    product_json(-7, "Old", "electronics")
                ),
            )
            .unwrap();
        let mut store = store_with(&ScriptedTransport::new(), storage);
        let product = store.create_local_product(dto("New", "electronics")).unwrap();
        assert_eq!(product.id, -8);
    }

    #[test]
    fn fetch_products_puts_local_first() {
        let transport = ScriptedTransport::new();
        transport.respond(
            HttpMethod::Get,
            "/products",
            200,
            &products_json(&[(1, "Backpack", "men's clothing"), (2, "Ring", "jewelery")]),
        );
        let mut store = store_with(&transport, Arc::new(MemoryStorage::new()));
        store.create_local_product(dto("A", "electronics")).unwrap();
        store.create_local_product(dto("B", "jewelery")).unwrap();

        store.fetch_products();

        assert_eq!(ids(store.products()), vec![-2, -1, 1, 2]);
        assert!(!store.is_loading());
        assert!(store.error().is_none());
    }

    #[test]
    fn create_after_fetch_prepends_to_displayed_list() {
        let transport = ScriptedTransport::new();
        transport.respond(
            HttpMethod::Get,
            "/products",
            200,
            &products_json(&[(1, "Backpack", "men's clothing")]),
        );
        let mut store = store_with(&transport, Arc::new(MemoryStorage::new()));
        store.fetch_products();
        store.create_local_product(dto("A", "electronics")).unwrap();
        assert_eq!(ids(store.products()), vec![-1, 1]);
    }

    #[test]
    fn failed_fetch_keeps_stale_products() {
        let transport = ScriptedTransport::new();
        transport.respond(
            HttpMethod::Get,
            "/products",
            200,
            &products_json(&[(1, "Backpack", "men's clothing")]),
        );
        let mut store = store_with(&transport, Arc::new(MemoryStorage::new()));
        store.fetch_products();

        transport.fail(HttpMethod::Get, "/products", "offline");
        store.fetch_products();

        assert_eq!(ids(store.products()), vec![1]);
        assert_eq!(store.error(), Some("offline"));
        assert!(!store.is_loading());

        transport.respond(HttpMethod::Get, "/products", 200, "[]");
        store.fetch_products();
        assert!(store.error().is_none());
    }

    #[test]
    fn category_fetch_filters_local_case_insensitively() {
        let transport = ScriptedTransport::new();
        transport.respond(
            HttpMethod::Get,
            "/products/category/electronics",
            200,
            &products_json(&[(9, "SSD", "electronics")]),
        );
        let mut store = store_with(&transport, Arc::new(MemoryStorage::new()));
        store.create_local_product(dto("Lamp", "Electronics")).unwrap();
        store.create_local_product(dto("Ring", "jewelery")).unwrap();
        store.create_local_product(dto("Phone", "electronics")).unwrap();

        store.fetch_products_by_category("electronics");

        assert_eq!(ids(store.products()), vec![-3, -1, 9]);
        assert_eq!(store.selected_category(), Some("electronics"));
        assert!(!store.is_loading());
    }

    #[test]
    fn category_is_selected_even_when_fetch_fails() {
        let transport = ScriptedTransport::new();
        transport.fail(HttpMethod::Get, "/products/category/jewelery", "offline");
        let mut store = store_with(&transport, Arc::new(MemoryStorage::new()));
        store.fetch_products_by_category("jewelery");
        assert_eq!(store.selected_category(), Some("jewelery"));
        assert_eq!(store.error(), Some("offline"));
    }

    #[test]
    fn categories_replaced_on_success_kept_on_failure() {
        let transport = ScriptedTransport::new();
        transport.respond(
            HttpMethod::Get,
            "/products/categories",
            200,
            r#"["electronics","jewelery"]"#,
        );
        let mut store = store_with(&transport, Arc::new(MemoryStorage::new()));
        store.fetch_categories();
        assert_eq!(store.categories(), ["electronics", "jewelery"]);

        transport.respond(HttpMethod::Get, "/products/categories", 500, "");
        store.fetch_categories();
        assert_eq!(store.categories(), ["electronics", "jewelery"]);
        assert_eq!(store.error(), Some("HTTP Error: 500"));
        assert!(!store.is_loading());
    }

    #[test]
    fn only_local_products_are_persisted() {
        let transport = ScriptedTransport::new();
        transport.respond(
            HttpMethod::Get,
            "/products",
            200,
            &products_json(&[(1, "Backpack", "men's clothing")]),
        );
        let storage = Arc::new(MemoryStorage::new());
        let mut store = store_with(&transport, storage.clone());
        store.fetch_products();
        store.create_local_product(dto("A", "electronics")).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&storage.get_item(PRODUCTS_STORAGE_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(raw["state"].as_object().unwrap().len(), 1);
        assert_eq!(raw["state"]["localProducts"][0]["id"], -1);
        assert_eq!(raw["state"]["localProducts"][0]["isLocal"], true);

        let restored = store_with(&transport, storage);
        assert_eq!(ids(restored.local_products()), vec![-1]);
        assert!(restored.products().is_empty());
    }

    struct ReadOnlyStorage;

    impl KeyValueStorage for ReadOnlyStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }
        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("read-only".to_string()))
        }
        fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn create_surfaces_persistence_failure() {
        let mut store = store_with(&ScriptedTransport::new(), Arc::new(ReadOnlyStorage));
        let err = store.create_local_product(dto("A", "electronics")).unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)));
        assert_eq!(store.error(), Some("storage unavailable: read-only"));
        assert_eq!(ids(store.local_products()), vec![-1]);
    }

    #[test]
    fn id_space_exhaustion_is_an_error() {
        assert_eq!(next_local_id(&[]), Some(-1));
        let mut product = dto("A", "x").into_local_product(i64::MIN);
        assert_eq!(next_local_id(std::slice::from_ref(&product)), None);
        product.id = -4;
        assert_eq!(next_local_id(&[product]), Some(-5));
    }

    #[test]
    fn product_detail_resolves_local_and_remote() {
        let transport = ScriptedTransport::new();
        transport.respond(HttpMethod::Get, "/products/3", 200, &product_json(3, "Jacket", "men's clothing"));
        let mut store = store_with(&transport, Arc::new(MemoryStorage::new()));
        store.create_local_product(dto("A", "electronics")).unwrap();

        assert_eq!(store.product_detail(-1).unwrap().title, "A");
        assert_eq!(store.product_detail(3).unwrap().title, "Jacket");
        let err = store.product_detail(-42).unwrap_err();
        assert_eq!(err.message(), LOCAL_PRODUCT_NOT_FOUND);
        assert!(store.selected_product().is_none());
    }

    #[test]
    fn selectors_and_clear_error() {
        let transport = ScriptedTransport::new();
        let mut store = store_with(&transport, Arc::new(MemoryStorage::new()));
        let product = store.create_local_product(dto("A", "electronics")).unwrap();

        store.select_product(Some(product.clone()));
        assert_eq!(store.selected_product(), Some(&product));
        store.select_product(None);
        assert!(store.selected_product().is_none());

        store.select_category(Some("jewelery".to_string()));
        assert_eq!(store.selected_category(), Some("jewelery"));
        store.select_category(None);
        assert!(store.selected_category().is_none());

        store.fetch_categories();
        assert!(store.error().is_some());
        store.clear_error();
        store.clear_error();
        assert!(store.error().is_none());
    }
}
