//! Parsed HTTP response and the decode boundary around `httparse`.
//!
//! # Design
//! Status-line and header parsing belong to `httparse`; this module only
//! layers body framing on top of the head it reports. The parsed head is
//! re-expressed in `http` crate types so lookups get standard header
//! semantics (`HeaderMap` is case-insensitive) instead of whatever casing
//! the server happened to emit.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode, Version};

use crate::error::DecodeError;

const MAX_HEADERS: usize = 64;

/// A structured view of the bytes a server wrote back.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Decodes a captured byte buffer into a response.
    ///
    /// Body framing: a `Content-Length` header takes exactly that many bytes
    /// (fewer available is an error, trailing extras are ignored); without
    /// one, everything after the head is the body. Transfer encodings other
    /// than `identity` are rejected.
    pub(crate) fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        let mut scratch = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut parsed = httparse::Response::new(&mut scratch);
        let head_len = match parsed.parse(raw).map_err(DecodeError::Syntax)? {
            httparse::Status::Complete(n) => n,
            httparse::Status::Partial => return Err(DecodeError::Partial),
        };

        let code = parsed.code.ok_or(DecodeError::Partial)?;
        let status = StatusCode::from_u16(code).map_err(|_| DecodeError::BadStatus(code))?;
        let version = match parsed.version {
            Some(0) => Version::HTTP_10,
            _ => Version::HTTP_11,
        };

        let mut headers = HeaderMap::with_capacity(parsed.headers.len());
        for h in parsed.headers.iter() {
            let name = HeaderName::from_bytes(h.name.as_bytes())
                .map_err(|_| DecodeError::BadHeader(h.name.to_string()))?;
            let value = HeaderValue::from_bytes(h.value)
                .map_err(|_| DecodeError::BadHeader(h.name.to_string()))?;
            headers.append(name, value);
        }

        let mut body = &raw[head_len..];
        if let Some(encoding) = headers.get(header::TRANSFER_ENCODING) {
            let text = String::from_utf8_lossy(encoding.as_bytes());
            if !text.eq_ignore_ascii_case("identity") {
                return Err(DecodeError::UnsupportedEncoding(text.into_owned()));
            }
        }
        if let Some(value) = headers.get(header::CONTENT_LENGTH) {
            let text = String::from_utf8_lossy(value.as_bytes());
            let declared: usize = text
                .trim()
                .parse()
                .map_err(|_| DecodeError::BadContentLength(text.trim().to_string()))?;
            if body.len() < declared {
                return Err(DecodeError::BodyTooShort {
                    declared,
                    actual: body.len(),
                });
            }
            body = &body[..declared];
        }

        Ok(Self {
            status,
            version,
            headers,
            body: Bytes::copy_from_slice(body),
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Looks a header up by name, case-insensitively. Values that are not
    /// valid UTF-8 come back as `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_framed_response() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhello";
        let resp = Response::decode(raw).unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.version(), Version::HTTP_11);
        assert_eq!(resp.header("Content-Type"), Some("text/plain"));
        assert_eq!(resp.body(), b"hello");
        assert_eq!(resp.text(), "hello");
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 0\r\n\r\n";
        let resp = Response::decode(raw).unwrap();
        assert_eq!(resp.header("content-type"), Some("text/html"));
        assert_eq!(resp.header("CONTENT-TYPE"), Some("text/html"));
        assert_eq!(resp.header("X-Missing"), None);
    }

    #[test]
    fn missing_content_length_takes_rest_of_buffer() {
        let raw = b"HTTP/1.0 200 OK\r\n\r\neverything until the end";
        let resp = Response::decode(raw).unwrap();
        assert_eq!(resp.version(), Version::HTTP_10);
        assert_eq!(resp.text(), "everything until the end");
    }

    #[test]
    fn content_length_ignores_trailing_bytes() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nabcdef";
        let resp = Response::decode(raw).unwrap();
        assert_eq!(resp.body(), b"abc");
    }

    #[test]
    fn short_body_is_an_error() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nabc";
        let err = Response::decode(raw).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::BodyTooShort {
                declared: 10,
                actual: 3
            }
        ));
    }

    #[test]
    fn truncated_head_is_partial() {
        let err = Response::decode(b"HTTP/1.1 200 OK\r\nContent-").unwrap_err();
        assert!(matches!(err, DecodeError::Partial));
    }

    #[test]
    fn garbage_is_a_syntax_error() {
        let err = Response::decode(b"this is not http\r\n\r\n").unwrap_err();
        assert!(matches!(err, DecodeError::Syntax(_)));
    }

    #[test]
    fn out_of_range_status_is_rejected() {
        let err = Response::decode(b"HTTP/1.1 007 Shaken\r\n\r\n").unwrap_err();
        assert!(matches!(err, DecodeError::BadStatus(7)));
    }

    #[test]
    fn chunked_encoding_is_rejected() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n";
        let err = Response::decode(raw).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedEncoding(ref e) if e == "chunked"));
    }

    #[test]
    fn unparseable_content_length_is_rejected() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: many\r\n\r\n";
        let err = Response::decode(raw).unwrap_err();
        assert!(matches!(err, DecodeError::BadContentLength(ref v) if v == "many"));
    }

    #[test]
    fn repeated_headers_are_all_kept() {
        let raw = b"HTTP/1.1 200 OK\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2\r\nContent-Length: 0\r\n\r\n";
        let resp = Response::decode(raw).unwrap();
        let cookies: Vec<_> = resp.headers().get_all("set-cookie").iter().collect();
        assert_eq!(cookies.len(), 2);
    }
}
