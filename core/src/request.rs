//! Raw HTTP/1.1 request encoding.
//!
//! The harness builds request bytes by hand rather than through an HTTP
//! library: request line, one `Key: Value` line per header, a blank line,
//! then the body as-is. Headers go out in sorted key order so the encoded
//! request is identical from run to run.

use std::collections::BTreeMap;

pub(crate) const CRLF: &str = "\r\n";

/// Serializes request fields into the bytes a server will read off the wire.
///
/// No `Content-Length` is synthesized; callers whose server needs body
/// framing set the header themselves.
pub(crate) fn encode(
    method: &str,
    path: &str,
    protocol: &str,
    headers: &BTreeMap<String, String>,
    body: &str,
) -> String {
    let mut raw = format!("{method} {path} {protocol}{CRLF}");
    for (name, value) in headers {
        raw.push_str(name);
        raw.push_str(": ");
        raw.push_str(value);
        raw.push_str(CRLF);
    }
    raw.push_str(CRLF);
    raw.push_str(body);
    raw
}
