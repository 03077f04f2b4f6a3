//! Response parsing.
//!
//! The parser is deliberately forgiving about server output: header text is
//! decoded as Latin-1 so every byte maps to a character, header lines
//! without a colon are skipped, and over-long version or reason tokens are
//! truncated. It only fails when the head/body boundary or a usable status
//! line is missing.

use tracing::trace;

use crate::error::ParseError;
use crate::http::Response;

/// Longest version token kept, in bytes.
pub const MAX_VERSION_LEN: usize = 15;
/// Longest reason phrase kept, in bytes.
pub const MAX_REASON_LEN: usize = 255;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Split a complete response into status line, headers and body.
///
/// The first `\r\n\r\n` ends the head; everything after it is returned as
/// the body unchanged, whatever Content-Length says.
pub fn parse_response(buf: &[u8]) -> Result<Response, ParseError> {
    let header_len = find(buf, HEADER_TERMINATOR).ok_or(ParseError::MissingHeaderTerminator)?;
    let body = buf[header_len + HEADER_TERMINATOR.len()..].to_vec();

    let line_end = buf
        .iter()
        .position(|&b| b == b'\n')
        .ok_or(ParseError::MalformedStatusLine)?;
    let (version, status, reason) = parse_status_line(trim_cr(&buf[..line_end]))?;

    let mut headers = Vec::new();
    let start = line_end + 1;
    if start < header_len {
        for line in buf[start..header_len].split(|&b| b == b'\n') {
            let line = trim_cr(line);
            let Some(colon) = line.iter().position(|&b| b == b':') else {
                continue;
            };
            let value = trim_leading_ws(&line[colon + 1..]);
            headers.push((latin1(&line[..colon]), latin1(value)));
        }
    }

    trace!(status, headers = headers.len(), body = body.len(), "parsed response");
    Ok(Response {
        status,
        reason,
        version,
        headers,
        body,
    })
}

/// Parse `HTTP/<version> <status> <reason>`.
fn parse_status_line(line: &[u8]) -> Result<(String, u16, String), ParseError> {
    let rest = line.strip_prefix(b"HTTP/").ok_or(ParseError::MalformedStatusLine)?;

    let version_end = rest.iter().position(|b| b.is_ascii_whitespace()).unwrap_or(rest.len());
    let version = &rest[..version_end];
    if version.is_empty() {
        return Err(ParseError::MalformedStatusLine);
    }

    let rest = trim_leading_ws(&rest[version_end..]);
    let digits_end = rest.iter().position(|b| !b.is_ascii_digit()).unwrap_or(rest.len());
    let status = std::str::from_utf8(&rest[..digits_end])
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or(ParseError::MalformedStatusLine)?;

    let reason = trim_leading_ws(&rest[digits_end..]);

    Ok((
        latin1(truncate(version, MAX_VERSION_LEN)),
        status,
        latin1(truncate(reason, MAX_REASON_LEN)),
    ))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn trim_leading_ws(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|&b| b != b' ' && b != b'\t')
        .unwrap_or(bytes.len());
    &bytes[start..]
}

fn truncate(bytes: &[u8], max: usize) -> &[u8] {
    &bytes[..bytes.len().min(max)]
}

/// Decode bytes as ISO-8859-1; never fails.
pub(crate) fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
