//! The end-to-end exchange.
//!
//! # Design
//! `perform` is a free function with no state: every call encodes, opens
//! its own socket, and tears it down before returning. The `TcpStream` is
//! owned by the call, so it is closed on every exit path, including errors
//! half-way through sending or receiving.

use tracing::{debug, debug_span};

use crate::connect::connect;
use crate::error::Error;
use crate::http::{Request, Response};
use crate::parse::parse_response;
use crate::serialize::encode_request;
use crate::transport::{receive_response, send_request};

/// Send `req` over a fresh TCP connection and parse the reply.
///
/// Encoding problems are reported before any network activity. The reply is
/// read until the server closes the connection, so servers must honor
/// `Connection: close` (added automatically unless `req` carries its own
/// Connection header); otherwise the call ends with a timeout.
pub fn perform(req: &Request) -> Result<Response, Error> {
    let span = debug_span!("perform", method = %req.method, host = %req.host, port = req.port, path = %req.path);
    let _enter = span.enter();

    let wire = encode_request(req)?;

    let mut stream = connect(&req.host, req.port, req.timeout)?;
    send_request(&mut stream, &wire)?;
    let raw = receive_response(&mut stream)?;
    drop(stream);

    let response = parse_response(&raw)?;
    debug!(status = response.status, body = response.body.len(), "exchange complete");
    Ok(response)
}
