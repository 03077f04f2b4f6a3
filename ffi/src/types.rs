//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Input types borrow caller memory (`*const`); the result envelope owns
//! everything it points to and is released with `gakido_free_result`.
//! Conversion functions live here to keep `lib.rs` focused on the
//! `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use gakido_core::{Error, ErrorKind, Response};

// ---------------------------------------------------------------------------
// Request input (caller-owned, borrowed for the duration of the call)
// ---------------------------------------------------------------------------

/// One request header as a pair of NUL-terminated strings.
///
/// Both pointers must be non-null; a null entry is rejected as a
/// validation error.
#[repr(C)]
pub struct GakidoHeader {
    pub name: *const c_char,
    pub value: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `GakidoResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GakidoErrorCode {
    Ok = 0,
    /// Malformed argument, detected before any I/O.
    Validation = 1,
    /// Text not representable as ASCII, detected before any I/O.
    Encoding = 2,
    /// Resolution, connect, send or receive failure (including timeouts).
    Connection = 3,
    /// The server reply had no header terminator or no usable status line.
    Parse = 4,
    Panic = 5,
}

impl From<ErrorKind> for GakidoErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => GakidoErrorCode::Validation,
            ErrorKind::Encoding => GakidoErrorCode::Encoding,
            ErrorKind::Connection => GakidoErrorCode::Connection,
            ErrorKind::Parse => GakidoErrorCode::Parse,
        }
    }
}

/// A response header owned by the result.
#[repr(C)]
pub struct GakidoResponseHeader {
    pub name: *mut c_char,
    pub value: *mut c_char,
}

/// Result envelope for `gakido_perform`.
///
/// On success `error_code` is `Ok` and `error_message` is null; `reason`,
/// `version` and header strings are UTF-8 (decoded from the Latin-1 wire
/// text) and `body` points to `body_len` raw bytes (null when empty).
/// On failure only `error_code` and `error_message` are set.
#[repr(C)]
pub struct GakidoResult {
    pub error_code: GakidoErrorCode,
    pub error_message: *mut c_char,
    pub status: u16,
    pub reason: *mut c_char,
    pub version: *mut c_char,
    pub headers: *mut GakidoResponseHeader,
    pub headers_len: usize,
    pub body: *mut u8,
    pub body_len: usize,
}

impl GakidoResult {
    fn empty(error_code: GakidoErrorCode, error_message: *mut c_char) -> Self {
        GakidoResult {
            error_code,
            error_message,
            status: 0,
            reason: std::ptr::null_mut(),
            version: std::ptr::null_mut(),
            headers: std::ptr::null_mut(),
            headers_len: 0,
            body: std::ptr::null_mut(),
            body_len: 0,
        }
    }

    /// Build a heap-allocated success result from a core `Response`.
    pub(crate) fn ok(resp: Response) -> *mut Self {
        let mut result = Self::empty(GakidoErrorCode::Ok, std::ptr::null_mut());
        result.status = resp.status;
        result.reason = c_string(resp.reason);
        result.version = c_string(resp.version);

        result.headers_len = resp.headers.len();
        if !resp.headers.is_empty() {
            let headers: Box<[GakidoResponseHeader]> = resp
                .headers
                .into_iter()
                .map(|(name, value)| GakidoResponseHeader {
                    name: c_string(name),
                    value: c_string(value),
                })
                .collect();
            result.headers = Box::into_raw(headers) as *mut GakidoResponseHeader;
        }

        result.body_len = resp.body.len();
        if !resp.body.is_empty() {
            result.body = Box::into_raw(resp.body.into_boxed_slice()) as *mut u8;
        }
        Box::into_raw(Box::new(result))
    }

    /// Build an error result from a core `Error`.
    pub(crate) fn from_error(err: Error) -> *mut Self {
        let code = GakidoErrorCode::from(err.kind());
        Box::into_raw(Box::new(Self::empty(code, c_string(err.to_string()))))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Box::into_raw(Box::new(Self::empty(
            GakidoErrorCode::Panic,
            c_string(msg.to_string()),
        )))
    }
}

/// Convert to a C string, cutting at the first NUL the way C readers would.
fn c_string(s: String) -> *mut c_char {
    let mut bytes = s.into_bytes();
    if let Some(nul) = bytes.iter().position(|&b| b == 0) {
        bytes.truncate(nul);
    }
    CString::new(bytes).unwrap_or_default().into_raw()
}
