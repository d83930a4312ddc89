//! Client core for the storefront app.
//!
//! # Overview
//! Authenticates against the demo store REST API, lists remote products
//! merged with products created on-device, and persists a small subset of
//! state to device key-value storage. The UI is a separate host that drives
//! the two stores.
//!
//! # Design
//! - `Gateway` builds `HttpRequest` values and parses `HttpResponse` values;
//!   a `Transport` executes them. `UreqTransport` is the default; hosts may
//!   supply their own.
//! - `AuthActions` / `ProductsActions` wrap endpoints and normalize errors
//!   into `ApiError::Domain`.
//! - `SessionStore` / `CatalogStore` own their state and persisted snapshot.
//!   Both are plain values owned by `Storefront`; mutation takes `&mut self`.
//! - Everything is synchronous. The transport call is the only place an
//!   operation blocks.

pub mod auth_actions;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod http;
pub mod products_actions;
pub mod session;
pub mod storage;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use auth_actions::{AuthActions, AuthPayload};
pub use catalog::{Catalog, CatalogStore};
pub use config::StorefrontConfig;
pub use context::Storefront;
pub use error::{ApiError, ApiResult};
pub use gateway::{Gateway, SharedToken};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use products_actions::ProductsActions;
pub use session::{AuthStatus, Session, SessionStore};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{
    Address, AuthResponse, CreateProductDto, LoginCredentials, Product, Rating,
    RegisterCredentials, User, UserName,
};
