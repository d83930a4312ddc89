//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Requests handed to a host transport callback use C representations
//! (`*mut c_char` strings, header arrays, explicit enum discriminants).
//! Store state and payloads travel back to the host as JSON C strings inside
//! a single `FfiResult` envelope, so the C surface stays small while the
//! data model evolves on the Rust side.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

use storefront_core::{
    ApiError, HttpMethod, HttpRequest, HttpResponse, Storefront, Transport, TransportError,
};

/// Opaque handle to a `Storefront`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiStorefront {
    pub(crate) inner: Storefront,
}

/// Convert a Rust string into an owned C string, dropping interior NULs.
pub(crate) fn to_c_string(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Owned by the library. It is only valid for the duration of the
/// transport callback it is passed to.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    /// Absolute URL.
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    /// JSON body, or null.
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    pub(crate) fn from_core(req: &HttpRequest) -> Box<Self> {
        let headers: Box<[FfiHeader]> = req
            .headers
            .iter()
            .map(|(k, v)| FfiHeader {
                key: to_c_string(k),
                value: to_c_string(v),
            })
            .collect();
        let headers_len = headers.len() as u32;
        let headers = if headers.is_empty() {
            std::ptr::null_mut()
        } else {
            Box::into_raw(headers) as *mut FfiHeader
        };
        Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: to_c_string(&req.path),
            headers,
            headers_len,
            body: req.body.as_deref().map_or(std::ptr::null_mut(), to_c_string),
        })
    }
}

impl Drop for FfiHttpRequest {
    fn drop(&mut self) {
        unsafe {
            if !self.path.is_null() {
                drop(CString::from_raw(self.path));
            }
            if !self.body.is_null() {
                drop(CString::from_raw(self.body));
            }
            if !self.headers.is_null() && self.headers_len > 0 {
                let len = self.headers_len as usize;
                let headers = Box::from_raw(std::ptr::slice_from_raw_parts_mut(self.headers, len));
                for h in headers.iter() {
                    if !h.key.is_null() {
                        drop(CString::from_raw(h.key));
                    }
                    if !h.value.is_null() {
                        drop(CString::from_raw(h.value));
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Host transport
// ---------------------------------------------------------------------------

/// Collects the host's answer to one request. Filled through
/// `storefront_respond` or `storefront_respond_error`.
pub struct FfiResponder {
    pub(crate) outcome: Option<Result<HttpResponse, TransportError>>,
}

/// Host transport callback. It must execute `request` synchronously and
/// report the outcome through `responder` before returning.
pub type FfiTransportFn = extern "C" fn(
    user_data: *mut c_void,
    request: *const FfiHttpRequest,
    responder: *mut FfiResponder,
);

/// `Transport` that delegates to a host callback.
pub(crate) struct CallbackTransport {
    pub(crate) callback: FfiTransportFn,
    pub(crate) user_data: *mut c_void,
}

// The host promises `user_data` may be used from whichever thread calls
// into the library.
unsafe impl Send for CallbackTransport {}
unsafe impl Sync for CallbackTransport {}

impl Transport for CallbackTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let ffi_request = FfiHttpRequest::from_core(request);
        let mut responder = FfiResponder { outcome: None };
        (self.callback)(self.user_data, &*ffi_request, &mut responder);
        responder
            .outcome
            .unwrap_or_else(|| Err(TransportError::new("host transport did not respond")))
    }
}

/// Read a nullable C string. Null and invalid UTF-8 both yield `None`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Transport = 1,
    Http = 2,
    Domain = 3,
    Serialization = 4,
    Deserialization = 5,
    Storage = 6,
    Panic = 7,
    NullArg = 8,
    InvalidArg = 9,
}

/// Result envelope for every store operation.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data` is
/// a JSON document (or null when the operation has no payload).
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, and `data` is null.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data: *mut c_char,
}

impl FfiResult {
    fn boxed(
        error_code: FfiErrorCode,
        message: Option<&str>,
        http_status: u16,
        data: Option<&str>,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message: message.map_or(std::ptr::null_mut(), to_c_string),
            http_status,
            data: data.map_or(std::ptr::null_mut(), to_c_string),
        }))
    }

    /// Success carrying `value` serialized as JSON.
    pub(crate) fn ok_json(value: &serde_json::Value) -> *mut Self {
        Self::boxed(FfiErrorCode::Ok, None, 0, Some(&value.to_string()))
    }

    pub(crate) fn from_error(err: &ApiError) -> *mut Self {
        let code = match err {
            ApiError::Transport { .. } => FfiErrorCode::Transport,
            ApiError::HttpStatus { .. } => FfiErrorCode::Http,
            ApiError::Domain { .. } => FfiErrorCode::Domain,
            ApiError::Serialization(_) => FfiErrorCode::Serialization,
            ApiError::Deserialization(_) => FfiErrorCode::Deserialization,
            ApiError::Storage(_) => FfiErrorCode::Storage,
        };
        Self::boxed(code, Some(&err.message()), err.status().unwrap_or(0), None)
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::NullArg, Some(&format!("null argument: {name}")), 0, None)
    }

    pub(crate) fn invalid_arg(name: &str, reason: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::InvalidArg,
            Some(&format!("invalid argument {name}: {reason}")),
            0,
            None,
        )
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, Some(msg), 0, None)
    }
}
