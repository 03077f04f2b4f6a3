//! C-ABI wrapper around `gakido-core`.
//!
//! # Overview
//! Exposes the single `perform` exchange through `gakido_perform` so any
//! language with a C FFI can issue a raw HTTP/1.1 request without linking
//! to Rust directly.
//!
//! # Design
//! - This layer only translates: it checks pointers, copies C strings into a
//!   `Request`, calls `gakido_core::perform`, and flattens the outcome into a
//!   `GakidoResult`. All protocol behavior lives in the core.
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - The caller owns the returned pointer and must release it with
//!   `gakido_free_result`.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use gakido_core::{Error, Request};

use types::*;

/// Timeout in seconds that callers should pass when they have no preference.
pub const GAKIDO_DEFAULT_TIMEOUT: f64 = 10.0;

// ---------------------------------------------------------------------------
// Perform
// ---------------------------------------------------------------------------

/// Send one HTTP/1.1 request over a new TCP connection and read the reply.
///
/// `headers` points to `headers_len` entries (may be null when
/// `headers_len` is 0). `body` points to `body_len` bytes (may be null when
/// `body_len` is 0). `timeout` is in seconds and must be positive; use
/// `GAKIDO_DEFAULT_TIMEOUT` for the usual value.
///
/// Never returns null. The caller must free the result with
/// `gakido_free_result`.
///
/// # Safety
/// Every non-null pointer must be valid for the stated length, and every
/// string must be NUL-terminated, for the duration of the call.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gakido_perform(
    method: *const c_char,
    host: *const c_char,
    port: u16,
    path: *const c_char,
    headers: *const GakidoHeader,
    headers_len: usize,
    body: *const u8,
    body_len: usize,
    timeout: f64,
) -> *mut GakidoResult {
    catch_unwind(|| {
        let missing = [
            ("method", method.is_null()),
            ("host", host.is_null()),
            ("path", path.is_null()),
            ("headers", headers.is_null() && headers_len > 0),
            ("body", body.is_null() && body_len > 0),
        ];
        if let Some((name, _)) = missing.iter().find(|(_, null)| *null) {
            return GakidoResult::from_error(Error::Validation(format!("null argument: {name}")));
        }

        let req = match unsafe {
            build_request(method, host, port, path, headers, headers_len, body, body_len, timeout)
        } {
            Ok(req) => req,
            Err(err) => return GakidoResult::from_error(err),
        };

        match gakido_core::perform(&req) {
            Ok(resp) => GakidoResult::ok(resp),
            Err(err) => GakidoResult::from_error(err),
        }
    })
    .unwrap_or_else(|_| {
        tracing::error!("panic in gakido_perform");
        GakidoResult::panic("panic in gakido_perform")
    })
}

/// Copy the caller's arguments into a core `Request`.
///
/// Text that is not valid UTF-8 cannot be ASCII either, so it is reported
/// as an encoding error just as the core would for non-ASCII text.
#[allow(clippy::too_many_arguments)]
unsafe fn build_request(
    method: *const c_char,
    host: *const c_char,
    port: u16,
    path: *const c_char,
    headers: *const GakidoHeader,
    headers_len: usize,
    body: *const u8,
    body_len: usize,
    timeout: f64,
) -> Result<Request, Error> {
    let method = unsafe { text(method) }.ok_or_else(|| Error::Encoding { field: "method", index: None })?;
    let host = unsafe { text(host) }.ok_or_else(|| Error::Validation("host is not valid UTF-8".to_string()))?;
    let path = unsafe { text(path) }.ok_or_else(|| Error::Encoding { field: "path", index: None })?;

    let mut req = Request::new(method, host, port, path).timeout_secs(timeout)?;

    if headers_len > 0 {
        let entries = unsafe { std::slice::from_raw_parts(headers, headers_len) };
        for (index, entry) in entries.iter().enumerate() {
            if entry.name.is_null() || entry.value.is_null() {
                return Err(Error::Validation(format!(
                    "header {index} must be a (name, value) pair"
                )));
            }
            let name = unsafe { text(entry.name) }.ok_or(Error::Encoding {
                field: "header name",
                index: Some(index),
            })?;
            let value = unsafe { text(entry.value) }.ok_or(Error::Encoding {
                field: "header value",
                index: Some(index),
            })?;
            req = req.header(name, value);
        }
    }

    if body_len > 0 {
        req = req.body(unsafe { std::slice::from_raw_parts(body, body_len) });
    }
    Ok(req)
}

unsafe fn text<'a>(ptr: *const c_char) -> Option<&'a str> {
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a `GakidoResult` returned by `gakido_perform`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn gakido_free_result(result: *mut GakidoResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        for s in [result.error_message, result.reason, result.version] {
            free_c_string(s);
        }
        if !result.headers.is_null() && result.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    result.headers,
                    result.headers_len,
                ))
            };
            for h in headers.iter() {
                free_c_string(h.name);
                free_c_string(h.value);
            }
        }
        if !result.body.is_null() && result.body_len > 0 {
            drop(unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(result.body, result.body_len))
            });
        }
    });
}

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{Shutdown, TcpListener};
    use std::thread;

    fn cstr(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    fn read_str(ptr: *const c_char) -> String {
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string()
    }

    /// Serve one connection with a fixed reply and hand back the request bytes.
    fn one_shot_server(reply: &'static [u8]) -> (u16, thread::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut seen = Vec::new();
            let mut buf = [0u8; 1024];
            while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = conn.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                seen.extend_from_slice(&buf[..n]);
            }
            conn.write_all(reply).unwrap();
            // Half-close, then drain so unread request bytes never turn the
            // close into a reset.
            conn.shutdown(Shutdown::Write).unwrap();
            let _ = conn.read_to_end(&mut Vec::new());
            seen
        });
        (port, handle)
    }

    #[allow(clippy::too_many_arguments)]
    fn perform(
        method: &str,
        host: &str,
        port: u16,
        path: &str,
        headers: &[(&CString, &CString)],
        body: &[u8],
        timeout: f64,
    ) -> *mut GakidoResult {
        let method = cstr(method);
        let host = cstr(host);
        let path = cstr(path);
        let ffi_headers: Vec<GakidoHeader> = headers
            .iter()
            .map(|(k, v)| GakidoHeader {
                name: k.as_ptr(),
                value: v.as_ptr(),
            })
            .collect();
        unsafe {
            gakido_perform(
                method.as_ptr(),
                host.as_ptr(),
                port,
                path.as_ptr(),
                if ffi_headers.is_empty() { std::ptr::null() } else { ffi_headers.as_ptr() },
                ffi_headers.len(),
                if body.is_empty() { std::ptr::null() } else { body.as_ptr() },
                body.len(),
                timeout,
            )
        }
    }

    #[test]
    fn perform_returns_full_response() {
        let (port, server) = one_shot_server(
            b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nX-Raw: caf\xe9\r\n\r\nHELLO",
        );
        let (k, v) = (cstr("X-Test"), cstr("1"));
        let result = perform("POST", "127.0.0.1", port, "/", &[(&k, &v)], b"ping", GAKIDO_DEFAULT_TIMEOUT);
        assert!(!result.is_null());

        let r = unsafe { &*result };
        assert_eq!(r.error_code, GakidoErrorCode::Ok);
        assert!(r.error_message.is_null());
        assert_eq!(r.status, 200);
        assert_eq!(read_str(r.reason), "OK");
        assert_eq!(read_str(r.version), "1.1");

        assert_eq!(r.headers_len, 2);
        let headers = unsafe { std::slice::from_raw_parts(r.headers, r.headers_len) };
        assert_eq!(read_str(headers[0].name), "Content-Length");
        assert_eq!(read_str(headers[0].value), "5");
        assert_eq!(read_str(headers[1].value), "caf\u{e9}");

        let body = unsafe { std::slice::from_raw_parts(r.body, r.body_len) };
        assert_eq!(body, b"HELLO");

        let seen = server.join().unwrap();
        assert!(seen.starts_with(b"POST / HTTP/1.1\r\nX-Test: 1\r\nConnection: close\r\n\r\n"));
        gakido_free_result(result);
    }

    #[test]
    fn empty_response_body_is_null() {
        let (port, server) = one_shot_server(b"HTTP/1.1 204 No Content\r\n\r\n");
        let result = perform("GET", "127.0.0.1", port, "/", &[], b"", 5.0);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, GakidoErrorCode::Ok);
        assert_eq!(r.status, 204);
        assert!(r.body.is_null());
        assert_eq!(r.body_len, 0);
        assert!(r.headers.is_null());
        server.join().unwrap();
        gakido_free_result(result);
    }

    #[test]
    fn null_method_is_validation_error() {
        let host = cstr("127.0.0.1");
        let path = cstr("/");
        let result = unsafe {
            gakido_perform(
                std::ptr::null(),
                host.as_ptr(),
                80,
                path.as_ptr(),
                std::ptr::null(),
                0,
                std::ptr::null(),
                0,
                1.0,
            )
        };
        let r = unsafe { &*result };
        assert_eq!(r.error_code, GakidoErrorCode::Validation);
        assert_eq!(read_str(r.error_message), "invalid request: null argument: method");
        gakido_free_result(result);
    }

    #[test]
    fn null_header_entry_is_validation_error() {
        let method = cstr("GET");
        let host = cstr("127.0.0.1");
        let path = cstr("/");
        let name = cstr("X-Test");
        let headers = [GakidoHeader {
            name: name.as_ptr(),
            value: std::ptr::null(),
        }];
        let result = unsafe {
            gakido_perform(
                method.as_ptr(),
                host.as_ptr(),
                80,
                path.as_ptr(),
                headers.as_ptr(),
                1,
                std::ptr::null(),
                0,
                1.0,
            )
        };
        let r = unsafe { &*result };
        assert_eq!(r.error_code, GakidoErrorCode::Validation);
        assert_eq!(
            read_str(r.error_message),
            "invalid request: header 0 must be a (name, value) pair"
        );
        gakido_free_result(result);
    }

    #[test]
    fn null_headers_with_length_is_validation_error() {
        let method = cstr("GET");
        let host = cstr("127.0.0.1");
        let path = cstr("/");
        let result = unsafe {
            gakido_perform(
                method.as_ptr(),
                host.as_ptr(),
                80,
                path.as_ptr(),
                std::ptr::null(),
                3,
                std::ptr::null(),
                0,
                1.0,
            )
        };
        let r = unsafe { &*result };
        assert_eq!(r.error_code, GakidoErrorCode::Validation);
        assert_eq!(read_str(r.error_message), "invalid request: null argument: headers");
        gakido_free_result(result);
    }

    #[test]
    fn validation_messages_share_one_form() {
        // Argument checks and core request checks read the same to a caller.
        let null_body = unsafe {
            let (method, host, path) = (cstr("GET"), cstr("127.0.0.1"), cstr("/"));
            gakido_perform(
                method.as_ptr(),
                host.as_ptr(),
                80,
                path.as_ptr(),
                std::ptr::null(),
                0,
                std::ptr::null(),
                4,
                1.0,
            )
        };
        let bad_timeout = perform("GET", "127.0.0.1", 9, "/", &[], b"", 0.0);

        for result in [null_body, bad_timeout] {
            let r = unsafe { &*result };
            assert_eq!(r.error_code, GakidoErrorCode::Validation);
            let msg = read_str(r.error_message);
            assert!(msg.starts_with("invalid request: "), "{msg}");
            gakido_free_result(result);
        }
    }

    #[test]
    fn non_ascii_header_is_encoding_error() {
        let (k, v) = (cstr("X-Name"), cstr("\u{e9}t\u{e9}"));
        let result = perform("GET", "127.0.0.1", 9, "/", &[(&k, &v)], b"", 1.0);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, GakidoErrorCode::Encoding);
        assert!(read_str(r.error_message).contains("header 0"));
        gakido_free_result(result);
    }

    #[test]
    fn invalid_utf8_header_is_encoding_error() {
        let k = cstr("X-Name");
        let v = CString::new(vec![0xffu8, 0xfe]).unwrap();
        let result = perform("GET", "127.0.0.1", 9, "/", &[(&k, &v)], b"", 1.0);
        assert_eq!(unsafe { &*result }.error_code, GakidoErrorCode::Encoding);
        gakido_free_result(result);
    }

    #[test]
    fn bad_timeout_is_validation_error() {
        for timeout in [0.0, -2.5, f64::NAN] {
            let result = perform("GET", "127.0.0.1", 9, "/", &[], b"", timeout);
            assert_eq!(unsafe { &*result }.error_code, GakidoErrorCode::Validation, "{timeout}");
            gakido_free_result(result);
        }
    }

    #[test]
    fn refused_connection_is_connection_error() {
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let result = perform("GET", "127.0.0.1", port, "/", &[], b"", 2.0);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, GakidoErrorCode::Connection);
        assert!(!r.error_message.is_null());
        gakido_free_result(result);
    }

    #[test]
    fn malformed_reply_is_parse_error() {
        let (port, server) = one_shot_server(b"garbage");
        let result = perform("GET", "127.0.0.1", port, "/", &[], b"", 5.0);
        assert_eq!(unsafe { &*result }.error_code, GakidoErrorCode::Parse);
        server.join().unwrap();
        gakido_free_result(result);
    }

    #[test]
    fn perform_against_mock_server() {
        let std_listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = std_listener.local_addr().unwrap().port();
        std_listener.set_nonblocking(true).unwrap();
        thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                mock_server::run(listener).await
            })
            .unwrap();
        });

        let (k, v) = (cstr("Host"), cstr("localhost"));
        let result = perform("GET", "127.0.0.1", port, "/hello", &[(&k, &v)], b"", 5.0);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, GakidoErrorCode::Ok);
        assert_eq!(r.status, 200);
        let body = unsafe { std::slice::from_raw_parts(r.body, r.body_len) };
        assert_eq!(body, b"HELLO");
        gakido_free_result(result);
    }

    #[test]
    fn generated_header_declares_the_c_surface() {
        let header = include_str!(concat!(env!("OUT_DIR"), "/gakido.h"));
        for decl in [
            "GAKIDO_DEFAULT_TIMEOUT",
            "gakido_perform(",
            "gakido_free_result(",
            "GakidoResult",
            "uintptr_t headers_len;",
        ] {
            assert!(header.contains(decl), "missing {decl}");
        }
    }

    #[test]
    fn free_result_null_is_safe() {
        gakido_free_result(std::ptr::null_mut());
    }
}
