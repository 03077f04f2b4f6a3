//! Error types for the request pipeline.
//!
//! # Design
//! Every failure falls into one of four categories, exposed through
//! `ErrorKind` so the C boundary can map them to stable codes: bad input
//! caught before any I/O (`Validation`, `Encoding`), network failures
//! (`Connection`), and unusable server output (`Parse`). Network and parse
//! failures carry their own enums so callers can tell resolution failures
//! apart from exhausted connection attempts.

use std::io;

use thiserror::Error;

/// Errors returned by `perform` and the individual pipeline stages.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller input is malformed (empty method, bad timeout, broken header pair).
    #[error("invalid request: {0}")]
    Validation(String),

    /// Request text cannot be represented in ASCII.
    #[error("{field} is not representable as ASCII{}", header_suffix(.index))]
    Encoding {
        field: &'static str,
        index: Option<usize>,
    },

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("failed to connect to {host}:{port} after {attempts} attempt(s): {source}")]
    Exhausted {
        host: String,
        port: u16,
        attempts: usize,
        #[source]
        source: io::Error,
    },

    #[error("incomplete send: wrote {written} of {expected} bytes")]
    IncompleteSend { written: usize, expected: usize },

    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),

    #[error("timed out during {0}")]
    Timeout(&'static str),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed HTTP response (no header terminator)")]
    MissingHeaderTerminator,

    #[error("malformed status line")]
    MalformedStatusLine,
}

fn header_suffix(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" (header {i})"),
        None => String::new(),
    }
}

/// Coarse error category, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Encoding,
    Connection,
    Parse,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Encoding { .. } => ErrorKind::Encoding,
            Error::Connection(_) => ErrorKind::Connection,
            Error::Parse(_) => ErrorKind::Parse,
        }
    }

    pub(crate) fn encoding(field: &'static str) -> Self {
        Error::Encoding { field, index: None }
    }

    pub(crate) fn header_encoding(field: &'static str, index: usize) -> Self {
        Error::Encoding {
            field,
            index: Some(index),
        }
    }
}

impl ConnectionError {
    /// Classify an I/O error raised while talking to the peer.
    ///
    /// Socket timeouts surface as `WouldBlock` on Unix and `TimedOut` on
    /// Windows, so both map to `Timeout`.
    pub(crate) fn from_io(stage: &'static str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ConnectionError::Timeout(stage),
            _ if stage == "send" => ConnectionError::Send(err),
            _ => ConnectionError::Receive(err),
        }
    }
}
