//! Application-root context owning both stores.
//!
//! One `Storefront` per process. The UI layer holds it and borrows the
//! stores it needs; nothing in the core is a global.

use std::sync::Arc;

use tracing::info;

use crate::auth_actions::AuthActions;
use crate::catalog::CatalogStore;
use crate::config::StorefrontConfig;
use crate::gateway::{Gateway, SharedToken};
use crate::products_actions::ProductsActions;
use crate::session::SessionStore;
use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage};
use crate::transport::{Transport, UreqTransport};

#[derive(Debug)]
pub struct Storefront {
    pub session: SessionStore,
    pub catalog: CatalogStore,
}

impl Storefront {
    /// Wire both stores to one gateway and one storage medium.
    ///
    /// Both stores rehydrate from `storage` here; the session's token is
    /// installed into the gateway before any request can be made.
    pub fn new(
        config: &StorefrontConfig,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Self {
        let gateway = Gateway::new(&config.base_url, transport, SharedToken::new());
        let session = SessionStore::new(
            AuthActions::new(gateway.clone(), config.current_user_id),
            storage.clone(),
        );
        let catalog = CatalogStore::new(ProductsActions::new(gateway), storage);
        Self { session, catalog }
    }

    /// Production wiring: ureq transport, file storage when a directory is
    /// configured, memory storage otherwise.
    pub fn from_config(config: &StorefrontConfig) -> Self {
        let storage: Arc<dyn KeyValueStorage> = match &config.storage_dir {
            Some(dir) => Arc::new(FileStorage::new(dir)),
            None => Arc::new(MemoryStorage::new()),
        };
        info!(base_url = %config.base_url, persistent = config.storage_dir.is_some(), "storefront configured");
        Self::new(config, Arc::new(UreqTransport::new()), storage)
    }

    /// Process start: validate any persisted session.
    pub fn bootstrap(&mut self) {
        self.session.check_auth();
    }
}
