//! Request serialization.
//!
//! Produces the exact bytes written to the socket: request line, caller
//! headers in their original order, an injected `Connection: close` when the
//! caller did not provide a Connection header, the blank line, then the body
//! verbatim. No Content-Length is added; that is the caller's job.

use tracing::trace;

use crate::error::Error;
use crate::http::Request;

const CONNECTION_CLOSE: &[u8] = b"Connection: close\r\n";

/// Serialize `req` into HTTP/1.1 wire format.
///
/// Fails with `Error::Validation` or `Error::Encoding` before anything is
/// sent if the request cannot be written as ASCII text.
pub fn encode_request(req: &Request) -> Result<Vec<u8>, Error> {
    req.validate()?;
    if !req.method.is_ascii() {
        return Err(Error::encoding("method"));
    }
    if !req.path.is_ascii() {
        return Err(Error::encoding("path"));
    }

    let body = req.body.as_deref().unwrap_or_default();
    let mut buf = Vec::with_capacity(encoded_len(req) + body.len());

    buf.extend_from_slice(req.method.as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(req.path.as_bytes());
    buf.extend_from_slice(b" HTTP/1.1\r\n");

    let mut has_connection = false;
    for (index, (name, value)) in req.headers.iter().enumerate() {
        if !name.is_ascii() {
            return Err(Error::header_encoding("header name", index));
        }
        if !value.is_ascii() {
            return Err(Error::header_encoding("header value", index));
        }
        has_connection |= name.eq_ignore_ascii_case("connection");

        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(value.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    if !has_connection {
        buf.extend_from_slice(CONNECTION_CLOSE);
    }
    buf.extend_from_slice(b"\r\n");
    buf.extend_from_slice(body);

    trace!(len = buf.len(), has_connection, "encoded request");
    Ok(buf)
}

/// Upper bound on the head size, used to size the buffer once.
fn encoded_len(req: &Request) -> usize {
    let line = req.method.len() + 1 + req.path.len() + " HTTP/1.1\r\n".len();
    let headers: usize = req.headers.iter().map(|(k, v)| k.len() + v.len() + 4).sum();
    line + headers + CONNECTION_CLOSE.len() + 2
}
