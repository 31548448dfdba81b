//! Fixture HTTP/1.1 server for exercising the test harness.
//!
//! # Design
//! `App` implements `ServeConn` directly, so the same router answers both
//! the harness's in-memory connections and, through [`run`], real TCP
//! sockets. Routing is split from I/O: `route` maps a parsed request to a
//! `(status, content type, body)` triple and is unit-tested without a
//! connection in sight.
//!
//! Routes:
//! - `GET /`: `200`, `hello`
//! - `GET /json`: `200`, a JSON [`Greeting`]
//! - `POST /echo`: `200`, the request body back, same content type
//! - `GET /status/{code}`: the named status, its reason phrase as body
//! - anything else: `404`

use std::io::{self, Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use http::StatusCode;
use serde::{Deserialize, Serialize};

use servetest_core::{BoxError, Conn, ServeConn};

const CRLF: &str = "\r\n";
const MAX_HEADERS: usize = 32;

/// Payload served by `GET /json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Greeting {
    pub message: String,
    pub ok: bool,
}

/// The fixture router. Cheap to clone; clones share the hit counter.
#[derive(Clone, Default)]
pub struct App {
    hits: Arc<AtomicU64>,
}

pub fn app() -> App {
    App::default()
}

impl App {
    /// Number of connections this app has served so far.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    fn route(&self, head: &RequestHead, body: &[u8]) -> Result<Reply, BoxError> {
        let reply = match (head.method.as_str(), head.path.as_str()) {
            ("GET", "/") => Reply::text(StatusCode::OK, "hello"),
            ("GET", "/json") => {
                let payload = serde_json::to_vec(&Greeting {
                    message: "hello".to_string(),
                    ok: true,
                })?;
                Reply {
                    status: StatusCode::OK,
                    content_type: "application/json".to_string(),
                    body: payload,
                }
            }
            ("POST", "/echo") => Reply {
                status: StatusCode::OK,
                content_type: head
                    .content_type
                    .clone()
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                body: body.to_vec(),
            },
            ("GET", path) if path.starts_with("/status/") => {
                let code = path["/status/".len()..]
                    .parse::<u16>()
                    .ok()
                    .and_then(|c| StatusCode::from_u16(c).ok());
                match code {
                    Some(status) => Reply::text(
                        status,
                        status.canonical_reason().unwrap_or("Unknown"),
                    ),
                    None => Reply::text(StatusCode::BAD_REQUEST, "invalid status code"),
                }
            }
            _ => Reply::text(StatusCode::NOT_FOUND, "not found"),
        };
        Ok(reply)
    }
}

impl ServeConn for App {
    fn serve_conn(&self, conn: &mut dyn Conn) -> Result<(), BoxError> {
        self.hits.fetch_add(1, Ordering::Relaxed);

        let mut buf = Vec::with_capacity(1024);
        let mut chunk = [0u8; 1024];
        let head = loop {
            let n = conn.read(&mut chunk)?;
            if n == 0 {
                // input ended before the head did
                write_response(conn, &Reply::text(StatusCode::BAD_REQUEST, "bad request"))?;
                return Ok(());
            }
            buf.extend_from_slice(&chunk[..n]);
            match parse_head(&buf) {
                Ok(Some(head)) => break head,
                Ok(None) => continue,
                Err(_) => {
                    write_response(conn, &Reply::text(StatusCode::BAD_REQUEST, "bad request"))?;
                    return Ok(());
                }
            }
        };

        let mut body = buf[head.head_len..].to_vec();
        while body.len() < head.content_length {
            let n = conn.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        body.truncate(head.content_length);

        let reply = self.route(&head, &body)?;
        write_response(conn, &reply)?;
        Ok(())
    }
}

/// Serves real TCP connections with the fixture app, one thread each.
pub fn run(listener: TcpListener) -> io::Result<()> {
    let app = app();
    for stream in listener.incoming() {
        let mut stream = stream?;
        let app = app.clone();
        thread::spawn(move || {
            if let Err(err) = app.serve_conn(&mut stream) {
                eprintln!("error serving connection: {err}");
            }
        });
    }
    Ok(())
}

struct Reply {
    status: StatusCode,
    content_type: String,
    body: Vec<u8>,
}

impl Reply {
    fn text(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain".to_string(),
            body: body.as_bytes().to_vec(),
        }
    }
}

struct RequestHead {
    method: String,
    path: String,
    head_len: usize,
    content_length: usize,
    content_type: Option<String>,
}

/// Parses a request head out of the bytes read so far. `Ok(None)` means
/// more input is needed.
fn parse_head(buf: &[u8]) -> Result<Option<RequestHead>, httparse::Error> {
    let mut scratch = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut scratch);
    let head_len = match req.parse(buf)? {
        httparse::Status::Complete(n) => n,
        httparse::Status::Partial => return Ok(None),
    };

    let mut content_length = 0;
    let mut content_type = None;
    for h in req.headers.iter() {
        if h.name.eq_ignore_ascii_case("content-length") {
            content_length = std::str::from_utf8(h.value)
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0);
        } else if h.name.eq_ignore_ascii_case("content-type") {
            content_type = std::str::from_utf8(h.value).ok().map(str::to_string);
        }
    }

    Ok(Some(RequestHead {
        method: req.method.unwrap_or("").to_string(),
        path: req.path.unwrap_or("").to_string(),
        head_len,
        content_length,
        content_type,
    }))
}

fn write_response(conn: &mut dyn Conn, reply: &Reply) -> io::Result<()> {
    let reason = reply.status.canonical_reason().unwrap_or("Unknown");
    write!(conn, "HTTP/1.1 {} {reason}{CRLF}", reply.status.as_u16())?;
    write!(conn, "Content-Type: {}{CRLF}", reply.content_type)?;
    write!(conn, "Content-Length: {}{CRLF}", reply.body.len())?;
    write!(conn, "Connection: close{CRLF}{CRLF}")?;
    conn.write_all(&reply.body)?;
    conn.flush()
}
