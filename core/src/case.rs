//! A single simulated request/response exchange and its expectations.
//!
//! # Design
//! The request side is plain public fields mutated directly, the response
//! side is the fluent [`Expect`] chain, and [`TestCase::run`] is the one
//! operation tying them together: encode the request into a fresh
//! [`MemConn`], hand the connection to the server on its own thread, wait
//! for it to finish or for the timeout to fire, then decode what it wrote
//! and evaluate the chain.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::conn::{MemConn, ServeConn};
use crate::error::TestError;
use crate::expect::Expect;
use crate::request;
use crate::response::Response;

/// How long [`TestCase::run`] waits for the server before giving up.
///
/// 200 microseconds, which assumes an in-memory exchange completes almost
/// instantly. Servers that do real work (or test environments under load)
/// should raise the `timeout` field.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_micros(200);

/// One simulated exchange against a server, plus the expectations to check
/// on whatever comes back.
///
/// Request fields are public and mutated directly; expectations accumulate
/// through [`expect`](TestCase::expect). [`run`](TestCase::run) performs the
/// exchange and returns the first thing that went wrong, or `Ok(())`.
pub struct TestCase<S> {
    server: Arc<S>,

    /// How long to wait for the server's handling call. See
    /// [`DEFAULT_TIMEOUT`].
    pub timeout: Duration,

    /// Request method. Default `"GET"`.
    pub method: String,
    /// Request target path. Default `"/"`.
    pub path: String,
    /// Protocol version on the request line. Default `"HTTP/1.1"`.
    pub protocol: String,
    /// Request headers, serialized in sorted key order.
    pub headers: BTreeMap<String, String>,
    /// Raw request body.
    pub body: String,

    expect: Expect,
}

impl<S> TestCase<S>
where
    S: ServeConn + Send + Sync + 'static,
{
    /// A test case with default request fields.
    pub fn new(server: S) -> Self {
        Self {
            server: Arc::new(server),
            timeout: DEFAULT_TIMEOUT,
            method: "GET".to_string(),
            path: "/".to_string(),
            protocol: "HTTP/1.1".to_string(),
            headers: BTreeMap::new(),
            body: String::new(),
            expect: Expect::default(),
        }
    }

    /// A test case with up to three request-line overrides, applied in
    /// fixed order: path, then method, then protocol. A slice of any other
    /// length leaves every default in place.
    pub fn with_request_line(server: S, parts: &[&str]) -> Self {
        let mut case = Self::new(server);
        match parts {
            [path] => {
                case.path = path.to_string();
            }
            [path, method] => {
                case.path = path.to_string();
                case.method = method.to_string();
            }
            [path, method, protocol] => {
                case.path = path.to_string();
                case.method = method.to_string();
                case.protocol = protocol.to_string();
            }
            _ => {}
        }
        case
    }

    /// The expectation chain for this case.
    pub fn expect(&mut self) -> &mut Expect {
        &mut self.expect
    }

    /// Performs the exchange: feeds the encoded request into an in-memory
    /// connection, runs the server's handling call on its own thread, and
    /// races it against [`timeout`](TestCase::timeout).
    ///
    /// Returns the server's error verbatim if the call fails,
    /// [`TestError::Timeout`] if it does not finish in time (the thread is
    /// abandoned, not cancelled), a [`TestError::Decode`] if the captured
    /// bytes do not parse as a response, or the first failing expectation.
    pub fn run(&self) -> Result<(), TestError> {
        let conn = MemConn::new();
        let raw = request::encode(
            &self.method,
            &self.path,
            &self.protocol,
            &self.headers,
            &self.body,
        );
        conn.feed(raw.as_bytes());

        let (tx, rx) = mpsc::channel();
        let server = Arc::clone(&self.server);
        let mut remote = conn.clone();
        thread::spawn(move || {
            let _ = tx.send(server.serve_conn(&mut remote));
        });

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(TestError::Server(err)),
            Err(RecvTimeoutError::Timeout) => return Err(TestError::Timeout),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(TestError::Server(
                    "server exited without reporting a result".into(),
                ))
            }
        }

        let captured = conn.take_output();
        let response = Response::decode(&captured).map_err(TestError::Decode)?;
        self.expect.check(&response)
    }
}
