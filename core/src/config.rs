//! Client configuration.

use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://fakestoreapi.com";

/// The demo API has no "current user" endpoint; this profile id stands in.
pub const DEFAULT_CURRENT_USER_ID: i64 = 1;

/// Storage key of the persisted session snapshot.
pub const AUTH_STORAGE_KEY: &str = "auth-storage";

/// Storage key of the persisted catalog snapshot.
pub const PRODUCTS_STORAGE_KEY: &str = "products-storage";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    pub base_url: String,
    /// Directory for persisted snapshots. `None` keeps them in memory.
    pub storage_dir: Option<PathBuf>,
    pub current_user_id: i64,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            storage_dir: None,
            current_user_id: DEFAULT_CURRENT_USER_ID,
        }
    }
}

impl StorefrontConfig {
    /// Defaults overridden by `STOREFRONT_API_URL`, `STOREFRONT_STORAGE_DIR`
    /// and `STOREFRONT_CURRENT_USER_ID`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            base_url: lookup("STOREFRONT_API_URL")
                .filter(|v| !v.is_empty())
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            storage_dir: lookup("STOREFRONT_STORAGE_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            current_user_id: lookup("STOREFRONT_CURRENT_USER_ID")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.current_user_id),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }
}
