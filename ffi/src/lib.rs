//! C-ABI wrapper around `storefront-core`.
//!
//! # Overview
//! Exposes the application-root `Storefront` through `extern "C"` functions
//! so a mobile UI host can drive the session and catalog stores without
//! linking to Rust types directly.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - One function per store operation. Each returns an `FfiResult` whose
//!   `data` is a JSON snapshot of the affected store (or the product the
//!   operation produced).
//! - Networking is either the built-in ureq transport or a host callback;
//!   the callback answers through `storefront_respond*`.
//! - The C caller owns every returned pointer and must release it with the
//!   matching `storefront_free*` function.

pub mod types;

use std::ffi::c_void;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use storefront_core::{
    ApiError, AuthStatus, Catalog, CreateProductDto, FileStorage, HttpResponse, KeyValueStorage,
    MemoryStorage, Product, RegisterCredentials, Session, Storefront, StorefrontConfig,
    TransportError,
};
use tracing::{info, warn};

use types::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SessionView<'a> {
    status: AuthStatus,
    #[serde(flatten)]
    state: &'a Session,
}

fn ok_serialized<T: Serialize>(value: &T) -> *mut FfiResult {
    match serde_json::to_value(value) {
        Ok(v) => FfiResult::ok_json(&v),
        Err(e) => FfiResult::from_error(&ApiError::Serialization(e.to_string())),
    }
}

fn session_result(app: &Storefront) -> *mut FfiResult {
    ok_serialized(&SessionView {
        status: app.session.status(),
        state: app.session.state(),
    })
}

fn catalog_result(app: &Storefront) -> *mut FfiResult {
    let catalog: &Catalog = app.catalog.state();
    ok_serialized(catalog)
}

fn product_result(result: Result<Product, ApiError>) -> *mut FfiResult {
    match result {
        Ok(product) => ok_serialized(&product),
        Err(e) => FfiResult::from_error(&e),
    }
}

/// Run `f` against the handle behind `storefront`, catching panics.
fn with_storefront<F>(storefront: *mut FfiStorefront, f: F) -> *mut FfiResult
where
    F: FnOnce(&mut Storefront) -> *mut FfiResult,
{
    catch_unwind(AssertUnwindSafe(|| {
        if storefront.is_null() {
            return FfiResult::null_arg("storefront");
        }
        let handle = unsafe { &mut *storefront };
        f(&mut handle.inner)
    }))
    .unwrap_or_else(|_| {
        warn!("panic caught at the FFI boundary");
        FfiResult::panic("internal panic")
    })
}

/// Configuration from the arguments. A null `base_url` falls back to the
/// environment.
unsafe fn config_from(base_url: *const c_char, storage_dir: *const c_char) -> StorefrontConfig {
    let mut config = match read_str(base_url) {
        Some(url) => StorefrontConfig::default().with_base_url(url),
        None => StorefrontConfig::from_env(),
    };
    if let Some(dir) = read_str(storage_dir) {
        config = config.with_storage_dir(dir);
    }
    config
}

fn storage_for(config: &StorefrontConfig) -> Arc<dyn KeyValueStorage> {
    match &config.storage_dir {
        Some(dir) => Arc::new(FileStorage::new(dir)),
        None => Arc::new(MemoryStorage::new()),
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Create a `Storefront` using the built-in HTTP transport.
///
/// `base_url` may be null to read `STOREFRONT_*` environment variables.
/// `storage_dir` may be null for in-memory persistence.
/// Returns null if an internal panic occurs. Free with `storefront_free`.
#[unsafe(no_mangle)]
pub extern "C" fn storefront_new(
    base_url: *const c_char,
    storage_dir: *const c_char,
) -> *mut FfiStorefront {
    catch_unwind(|| {
        let config = unsafe { config_from(base_url, storage_dir) };
        let inner = Storefront::from_config(&config);
        Box::into_raw(Box::new(FfiStorefront { inner }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Create a `Storefront` whose requests are executed by `transport`.
///
/// `user_data` is passed back to every `transport` call untouched.
/// Returns null if `transport` is null or an internal panic occurs.
#[unsafe(no_mangle)]
pub extern "C" fn storefront_new_with_transport(
    base_url: *const c_char,
    storage_dir: *const c_char,
    transport: Option<FfiTransportFn>,
    user_data: *mut c_void,
) -> *mut FfiStorefront {
    let Some(callback) = transport else {
        return std::ptr::null_mut();
    };
    catch_unwind(AssertUnwindSafe(|| {
        let config = unsafe { config_from(base_url, storage_dir) };
        info!(base_url = %config.base_url, "storefront configured with host transport");
        let inner = Storefront::new(
            &config,
            Arc::new(CallbackTransport {
                callback,
                user_data,
            }),
            storage_for(&config),
        );
        Box::into_raw(Box::new(FfiStorefront { inner }))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Free a `Storefront` created by `storefront_new*`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn storefront_free(storefront: *mut FfiStorefront) {
    if !storefront.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(storefront) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Host transport responses
// ---------------------------------------------------------------------------

/// Report an HTTP response for the request currently being executed.
/// `body` may be null for an empty body.
#[unsafe(no_mangle)]
pub extern "C" fn storefront_respond(responder: *mut FfiResponder, status: u16, body: *const c_char) {
    if responder.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let body = unsafe { read_str(body) }.unwrap_or("").to_string();
        let responder = unsafe { &mut *responder };
        responder.outcome = Some(Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        }));
    }));
}

/// Report that no HTTP response could be obtained.
#[unsafe(no_mangle)]
pub extern "C" fn storefront_respond_error(responder: *mut FfiResponder, message: *const c_char) {
    if responder.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let message = unsafe { read_str(message) }.unwrap_or("transport failure");
        let responder = unsafe { &mut *responder };
        responder.outcome = Some(Err(TransportError::new(message)));
    }));
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Validate any persisted session, as at process start. Returns the session.
#[unsafe(no_mangle)]
pub extern "C" fn storefront_bootstrap(storefront: *mut FfiStorefront) -> *mut FfiResult {
    with_storefront(storefront, |app| {
        app.bootstrap();
        session_result(app)
    })
}

/// Current session snapshot.
#[unsafe(no_mangle)]
pub extern "C" fn storefront_session(storefront: *mut FfiStorefront) -> *mut FfiResult {
    with_storefront(storefront, |app| session_result(app))
}

/// Sign in. On success `data` is the session; on failure the error is also
/// recorded in the session.
#[unsafe(no_mangle)]
pub extern "C" fn storefront_login(
    storefront: *mut FfiStorefront,
    username: *const c_char,
    password: *const c_char,
) -> *mut FfiResult {
    with_storefront(storefront, |app| {
        let (Some(username), Some(password)) = (unsafe { read_str(username) }, unsafe { read_str(password) })
        else {
            return FfiResult::null_arg("username/password");
        };
        match app.session.login(username, password) {
            Ok(()) => session_result(app),
            Err(e) => FfiResult::from_error(&e),
        }
    })
}

/// Create an account and sign in. `credentials_json` is a
/// `RegisterCredentials` document.
#[unsafe(no_mangle)]
pub extern "C" fn storefront_register(
    storefront: *mut FfiStorefront,
    credentials_json: *const c_char,
) -> *mut FfiResult {
    with_storefront(storefront, |app| {
        let Some(raw) = (unsafe { read_str(credentials_json) }) else {
            return FfiResult::null_arg("credentials_json");
        };
        let credentials: RegisterCredentials = match serde_json::from_str(raw) {
            Ok(c) => c,
            Err(e) => return FfiResult::invalid_arg("credentials_json", &e.to_string()),
        };
        match app.session.register(&credentials) {
            Ok(()) => session_result(app),
            Err(e) => FfiResult::from_error(&e),
        }
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn storefront_logout(storefront: *mut FfiStorefront) -> *mut FfiResult {
    with_storefront(storefront, |app| {
        app.session.logout();
        session_result(app)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn storefront_clear_session_error(storefront: *mut FfiStorefront) -> *mut FfiResult {
    with_storefront(storefront, |app| {
        app.session.clear_error();
        session_result(app)
    })
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Current catalog snapshot.
#[unsafe(no_mangle)]
pub extern "C" fn storefront_catalog(storefront: *mut FfiStorefront) -> *mut FfiResult {
    with_storefront(storefront, |app| catalog_result(app))
}

/// Load the full product list. Failures are recorded in the catalog's
/// `error`; the result itself is always `Ok` with the catalog snapshot.
#[unsafe(no_mangle)]
pub extern "C" fn storefront_fetch_products(storefront: *mut FfiStorefront) -> *mut FfiResult {
    with_storefront(storefront, |app| {
        app.catalog.fetch_products();
        catalog_result(app)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn storefront_fetch_products_by_category(
    storefront: *mut FfiStorefront,
    category: *const c_char,
) -> *mut FfiResult {
    with_storefront(storefront, |app| {
        let Some(category) = (unsafe { read_str(category) }) else {
            return FfiResult::null_arg("category");
        };
        app.catalog.fetch_products_by_category(category);
        catalog_result(app)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn storefront_fetch_categories(storefront: *mut FfiStorefront) -> *mut FfiResult {
    with_storefront(storefront, |app| {
        app.catalog.fetch_categories();
        catalog_result(app)
    })
}

/// Create an on-device product from a `CreateProductDto` JSON document.
/// On success `data` is the created product.
#[unsafe(no_mangle)]
pub extern "C" fn storefront_create_local_product(
    storefront: *mut FfiStorefront,
    product_json: *const c_char,
) -> *mut FfiResult {
    with_storefront(storefront, |app| {
        let Some(raw) = (unsafe { read_str(product_json) }) else {
            return FfiResult::null_arg("product_json");
        };
        let dto: CreateProductDto = match serde_json::from_str(raw) {
            Ok(d) => d,
            Err(e) => return FfiResult::invalid_arg("product_json", &e.to_string()),
        };
        product_result(app.catalog.create_local_product(dto))
    })
}

/// Look up one product. Negative ids resolve against on-device products.
#[unsafe(no_mangle)]
pub extern "C" fn storefront_product_detail(storefront: *mut FfiStorefront, id: i64) -> *mut FfiResult {
    with_storefront(storefront, |app| product_result(app.catalog.product_detail(id)))
}

/// Set or clear (null) the selected product.
#[unsafe(no_mangle)]
pub extern "C" fn storefront_select_product(
    storefront: *mut FfiStorefront,
    product_json: *const c_char,
) -> *mut FfiResult {
    with_storefront(storefront, |app| {
        let product = match unsafe { read_str(product_json) } {
            None => None,
            Some(raw) => match serde_json::from_str::<Product>(raw) {
                Ok(p) => Some(p),
                Err(e) => return FfiResult::invalid_arg("product_json", &e.to_string()),
            },
        };
        app.catalog.select_product(product);
        catalog_result(app)
    })
}

/// Set or clear (null) the selected category. No fetch is issued.
#[unsafe(no_mangle)]
pub extern "C" fn storefront_select_category(
    storefront: *mut FfiStorefront,
    category: *const c_char,
) -> *mut FfiResult {
    with_storefront(storefront, |app| {
        let category = unsafe { read_str(category) }.map(str::to_string);
        app.catalog.select_category(category);
        catalog_result(app)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn storefront_clear_catalog_error(storefront: *mut FfiStorefront) -> *mut FfiResult {
    with_storefront(storefront, |app| {
        app.catalog.clear_error();
        catalog_result(app)
    })
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiResult` and the strings it owns. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn storefront_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        unsafe {
            if !result.error_message.is_null() {
                drop(std::ffi::CString::from_raw(result.error_message));
            }
            if !result.data.is_null() {
                drop(std::ffi::CString::from_raw(result.data));
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
