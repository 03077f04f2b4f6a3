//! Sending the request and reading the response to EOF.
//!
//! Both halves are generic over `Write` / `Read` so they can be driven by
//! in-memory fakes in tests as well as a `TcpStream`.

use std::io::{self, Read, Write};

use tracing::{debug, trace};

use crate::error::ConnectionError;

/// Size of each read from the socket.
pub const RECV_CHUNK_SIZE: usize = 4096;

/// Write the whole request with a single `write` call.
///
/// A short write is fatal; the remainder is never resent.
pub fn send_request<W: Write>(stream: &mut W, request: &[u8]) -> Result<(), ConnectionError> {
    let written = loop {
        match stream.write(request) {
            Ok(n) => break n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(ConnectionError::from_io("send", err)),
        }
    };
    if written < request.len() {
        return Err(ConnectionError::IncompleteSend {
            written,
            expected: request.len(),
        });
    }
    stream.flush().map_err(|err| ConnectionError::from_io("send", err))?;
    debug!(bytes = written, "request sent");
    Ok(())
}

/// Read until the peer closes the connection.
///
/// There is no framing here: Content-Length is ignored and a peer that keeps
/// the connection open makes this block until the read timeout fires, which
/// is reported as `ConnectionError::Timeout`. Bytes read before an error are
/// dropped.
pub fn receive_response<R: Read>(stream: &mut R) -> Result<Vec<u8>, ConnectionError> {
    let mut response = Vec::with_capacity(RECV_CHUNK_SIZE);
    let mut chunk = [0u8; RECV_CHUNK_SIZE];
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                trace!(bytes = n, "received chunk");
                response.extend_from_slice(&chunk[..n]);
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(ConnectionError::from_io("receive", err)),
        }
    }
    debug!(bytes = response.len(), "peer closed connection");
    Ok(response)
}
