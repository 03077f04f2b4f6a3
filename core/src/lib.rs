//! Single-shot HTTP/1.1 exchange over a raw TCP socket.
//!
//! # Overview
//! `perform` serializes a `Request`, opens one TCP connection, writes the
//! request, reads until the peer closes, and parses what came back into a
//! `Response`. Nothing is pooled or reused between calls.
//!
//! # Design
//! - Each stage is a plain function so it can be tested without a socket:
//!   `encode_request`, `connect`, `send_request` / `receive_response`,
//!   `parse_response`.
//! - `Request` and `Response` use owned `String` / `Vec` fields so they map
//!   directly onto the C ABI in `gakido-ffi`.
//! - The response is read to EOF. There is no Content-Length or chunked
//!   framing, so the serializer asks for `Connection: close` unless the
//!   caller supplied their own Connection header. A peer that keeps the
//!   connection open surfaces as a timeout.

pub mod client;
pub mod connect;
pub mod error;
pub mod http;
pub mod parse;
pub mod serialize;
pub mod transport;

pub use client::perform;
pub use error::{ConnectionError, Error, ErrorKind, ParseError};
pub use http::{Request, Response, DEFAULT_TIMEOUT};
pub use parse::parse_response;
pub use serialize::encode_request;
