//! Request and response value types.
//!
//! # Design
//! Both types are plain data owned by a single `perform` call. `Request`
//! gains a consuming builder for convenience, but every field stays public
//! so the FFI layer can fill it in directly. Header lists are ordered
//! `Vec`s rather than maps: duplicates are legal and order is preserved on
//! the wire.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::parse::latin1;

/// Timeout applied when the caller does not pick one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// An HTTP/1.1 request to send over a fresh TCP connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub host: String,
    pub port: u16,
    /// Request-target as it appears on the request line.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// Bounds connect, every write and every read.
    pub timeout: Duration,
}

impl Request {
    pub fn new(method: &str, host: &str, port: u16, path: &str) -> Self {
        Self {
            method: method.to_string(),
            host: host.to_string(),
            port,
            path: path.to_string(),
            headers: Vec::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the timeout from fractional seconds.
    ///
    /// Rejects zero, negative, NaN and infinite values; a zero socket
    /// timeout is not representable and the others would panic in
    /// `Duration`.
    pub fn timeout_secs(self, secs: f64) -> Result<Self, Error> {
        Ok(self.timeout(timeout_from_secs(secs)?))
    }

    /// Check the fields that cannot be caught by the type system.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.method.is_empty() {
            return Err(Error::Validation("method must not be empty".to_string()));
        }
        if self.method.bytes().any(|b| b == b' ' || b.is_ascii_control()) {
            return Err(Error::Validation(format!("invalid method token {:?}", self.method)));
        }
        if self.path.is_empty() {
            return Err(Error::Validation("path must not be empty".to_string()));
        }
        if self.host.is_empty() {
            return Err(Error::Validation("host must not be empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(Error::Validation("timeout must be positive".to_string()));
        }
        Ok(())
    }
}

/// Convert caller-supplied seconds into a socket timeout.
pub fn timeout_from_secs(secs: f64) -> Result<Duration, Error> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(Error::Validation(format!("timeout must be a positive number of seconds, got {secs}")));
    }
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| Error::Validation(format!("timeout out of range: {secs}")))
}

/// A parsed HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub reason: String,
    /// Version token after `HTTP/`, e.g. `"1.1"`.
    pub version: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Case-insensitive header lookup. When a name repeats, the last one wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The `charset` parameter of `Content-Type`, if any, without quotes.
    pub fn charset(&self) -> Option<&str> {
        let content_type = self.header("content-type")?;
        content_type.split(';').skip(1).find_map(|param| {
            let (key, value) = param.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches('"'))
                .filter(|v| !v.is_empty())
        })
    }

    /// Body decoded with the declared charset.
    ///
    /// Latin-1 and ASCII bodies are decoded byte for byte. Every other
    /// charset, or none, is read as UTF-8 with invalid sequences replaced.
    pub fn text(&self) -> String {
        match self.charset().map(str::to_ascii_lowercase).as_deref() {
            Some("iso-8859-1" | "iso8859-1" | "latin-1" | "latin1" | "us-ascii" | "ascii") => {
                latin1(&self.body)
            }
            _ => String::from_utf8_lossy(&self.body).into_owned(),
        }
    }

    /// Deserialize the decoded body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.text())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
