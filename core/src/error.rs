//! Error types for the test harness.
//!
//! # Design
//! `Timeout` gets a dedicated variant because callers frequently distinguish
//! "the server never finished" from "the server answered and something about
//! the answer was wrong." Server errors and assertion failures are surfaced
//! verbatim; only decode failures are wrapped with context, since at that
//! point the raw bytes are gone and the message is all the caller gets.

use std::fmt;

/// Boxed error type accepted from servers and custom assertions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by [`TestCase::run`](crate::TestCase::run).
#[derive(Debug)]
pub enum TestError {
    /// The server's connection-handling call itself failed. Carried verbatim.
    Server(BoxError),

    /// The server did not finish within the configured timeout. The handling
    /// thread is abandoned and its eventual outcome discarded.
    Timeout,

    /// The captured output could not be decoded as an HTTP response.
    Decode(DecodeError),

    /// An expectation did not hold. Carries the failing predicate's error.
    Assertion(BoxError),
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestError::Server(err) => write!(f, "{err}"),
            TestError::Timeout => write!(f, "timeout"),
            TestError::Decode(err) => {
                write!(f, "unexpected error when reading response: {err}")
            }
            TestError::Assertion(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for TestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TestError::Server(err) | TestError::Assertion(err) => {
                Some(err.as_ref() as &(dyn std::error::Error + 'static))
            }
            TestError::Decode(err) => Some(err),
            TestError::Timeout => None,
        }
    }
}

/// Failures while decoding captured bytes into a [`Response`](crate::Response).
#[derive(Debug)]
pub enum DecodeError {
    /// The bytes are not a syntactically valid HTTP response head.
    Syntax(httparse::Error),

    /// The buffer ended before the response head was complete.
    Partial,

    /// The status line carried a code outside the valid range.
    BadStatus(u16),

    /// A header name or value was not representable.
    BadHeader(String),

    /// The `Content-Length` header was present but not a number.
    BadContentLength(String),

    /// The body ended before `Content-Length` bytes were captured.
    BodyTooShort { declared: usize, actual: usize },

    /// The response used a transfer encoding this decoder does not handle.
    UnsupportedEncoding(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Syntax(err) => write!(f, "{err}"),
            DecodeError::Partial => write!(f, "incomplete response head"),
            DecodeError::BadStatus(code) => write!(f, "invalid status code {code}"),
            DecodeError::BadHeader(name) => write!(f, "invalid header {name:?}"),
            DecodeError::BadContentLength(value) => {
                write!(f, "invalid content length {value:?}")
            }
            DecodeError::BodyTooShort { declared, actual } => {
                write!(f, "body ended after {actual} of {declared} declared bytes")
            }
            DecodeError::UnsupportedEncoding(encoding) => {
                write!(f, "unsupported transfer encoding {encoding:?}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}
