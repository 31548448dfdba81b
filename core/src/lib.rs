//! Simulate HTTP requests against an in-process server and assert on what
//! comes back, without opening a network socket.
//!
//! # Overview
//! A [`TestCase`] serializes its request fields into raw HTTP/1.1 bytes,
//! feeds them into an in-memory connection ([`MemConn`]), runs the server's
//! [`ServeConn::serve_conn`] on its own thread racing a timeout, then parses
//! whatever the server wrote back and evaluates a fluent chain of
//! expectations ([`Expect`]) against it.
//!
//! # Design
//! - The server is a capability, not a type: anything implementing
//!   [`ServeConn`] (including closures via [`serve_fn`]) can be tested, and
//!   because `TcpStream` implements [`Conn`] too, the same server code can
//!   serve real sockets.
//! - Request fields are public and mutated directly; expectations accumulate
//!   through chained calls; [`TestCase::run`] does the exchange once and
//!   returns the first failure.
//! - Status-line and header parsing is `httparse`'s job; this crate only
//!   frames the body around the parsed head.
//!
//! # Example
//! ```
//! use std::io::{Read, Write};
//! use std::time::Duration;
//!
//! use servetest_core::{serve_fn, BoxError, Conn, TestCase};
//!
//! // A server that rejects everything with an HTML error page.
//! let server = serve_fn(|conn: &mut dyn Conn| -> Result<(), BoxError> {
//!     let mut request = Vec::new();
//!     conn.read_to_end(&mut request)?;
//!     conn.write_all(
//!         b"HTTP/1.1 400 Bad Request\r\n\
//!           Content-Type: text/html; charset=utf-8\r\n\
//!           Content-Length: 11\r\n\
//!           \r\n\
//!           Bad Request",
//!     )?;
//!     Ok(())
//! });
//!
//! let mut test = TestCase::new(server);
//! test.timeout = Duration::from_secs(1);
//! test.expect()
//!     .status(400)
//!     .header("Content-Type", "text/html; charset=utf-8")
//!     .body("Bad Request");
//!
//! assert!(test.run().is_ok());
//! ```

pub mod case;
pub mod conn;
pub mod error;
pub mod expect;
pub mod response;

mod request;

pub use case::{TestCase, DEFAULT_TIMEOUT};
pub use conn::{serve_fn, Conn, MemConn, ServeConn, ServeFn};
pub use error::{BoxError, DecodeError, TestError};
pub use expect::Expect;
pub use response::Response;
