//! TCP connection establishment.

use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ConnectionError;

/// Resolve `host:port` and connect to the first candidate that accepts.
///
/// Candidates are tried once each, in resolver order. `timeout` bounds each
/// connect attempt and is then installed as the read and write timeout of
/// the returned stream.
pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<TcpStream, ConnectionError> {
    let addrs = resolve(host, port)?;
    debug!(host, port, candidates = addrs.len(), "resolved");
    connect_any(host, port, &addrs, timeout)
}

fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>, ConnectionError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| ConnectionError::Resolve {
            host: host.to_string(),
            port,
            source,
        })?
        .collect();
    if addrs.is_empty() {
        return Err(ConnectionError::Resolve {
            host: host.to_string(),
            port,
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
        });
    }
    Ok(addrs)
}

pub(crate) fn connect_any(
    host: &str,
    port: u16,
    addrs: &[SocketAddr],
    timeout: Duration,
) -> Result<TcpStream, ConnectionError> {
    let mut last_err = None;
    for addr in addrs {
        match open(addr, timeout) {
            Ok(stream) => {
                debug!(%addr, "connected");
                return Ok(stream);
            }
            Err(err) => {
                warn!(%addr, error = %err, "connect attempt failed");
                last_err = Some(err);
            }
        }
    }
    Err(ConnectionError::Exhausted {
        host: host.to_string(),
        port,
        attempts: addrs.len(),
        source: last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no candidates")),
    })
}

fn open(addr: &SocketAddr, timeout: Duration) -> io::Result<TcpStream> {
    let stream = TcpStream::connect_timeout(addr, timeout)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn connects_and_applies_timeouts() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let stream = connect("127.0.0.1", port, Duration::from_millis(1500)).unwrap();
        assert_eq!(stream.read_timeout().unwrap(), Some(Duration::from_millis(1500)));
        assert_eq!(stream.write_timeout().unwrap(), Some(Duration::from_millis(1500)));
        assert_eq!(stream.peer_addr().unwrap(), listener.local_addr().unwrap());
    }

    #[test]
    fn skips_refused_candidates() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let good = listener.local_addr().unwrap();

        // Bind then drop to get a port that refuses connections.
        let refused = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();

        let stream = connect_any("test", good.port(), &[refused, good], Duration::from_secs(2)).unwrap();
        assert_eq!(stream.peer_addr().unwrap(), good);
    }

    #[test]
    fn all_candidates_refused_is_exhausted() {
        let refused = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let err = connect_any("test", refused.port(), &[refused], Duration::from_secs(2)).unwrap_err();
        assert!(matches!(err, ConnectionError::Exhausted { attempts: 1, .. }), "{err}");
    }

    #[test]
    fn no_candidates_is_exhausted() {
        let err = connect_any("test", 80, &[], Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ConnectionError::Exhausted { attempts: 0, .. }));
    }

    #[test]
    fn unresolvable_host_is_resolve_error() {
        let err = connect("example.invalid", 80, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ConnectionError::Resolve { .. }), "{err}");
    }
}
