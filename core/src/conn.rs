//! Connection capabilities and the in-memory connection they are tested over.
//!
//! # Design
//! A server under test only ever sees `&mut dyn Conn`, so anything with a
//! read/write surface can stand in for a live socket. [`MemConn`] is the fake
//! used by the harness: two independent byte buffers, one carrying request
//! bytes in, one carrying response bytes out. `TcpStream` also implements
//! [`Conn`], which lets the same server code serve real connections; the
//! mock-server binary relies on this.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::{Arc, Mutex};

use bytes::{Bytes, BytesMut};

use crate::error::BoxError;

/// The capability a server needs from a connection: blocking reads and
/// writes plus a little metadata. Reads return `Ok(0)` once the peer has
/// nothing more to send.
pub trait Conn: Read + Write + Send {
    /// Address of the remote end, when the connection has one.
    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }

    /// Address of the local end, when the connection has one.
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }

    /// Tear the connection down. Connections without a real resource behind
    /// them treat this as a no-op.
    fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A server that can drive one full request/response exchange over a
/// connection, reading the request until end of input and writing the
/// complete response before returning.
pub trait ServeConn {
    fn serve_conn(&self, conn: &mut dyn Conn) -> Result<(), BoxError>;
}

/// Adapts a plain function or closure into a [`ServeConn`] server.
pub fn serve_fn<F>(f: F) -> ServeFn<F>
where
    F: Fn(&mut dyn Conn) -> Result<(), BoxError>,
{
    ServeFn(f)
}

/// A [`ServeConn`] implementation backed by a closure. Built with
/// [`serve_fn`].
pub struct ServeFn<F>(F);

impl<F> ServeConn for ServeFn<F>
where
    F: Fn(&mut dyn Conn) -> Result<(), BoxError>,
{
    fn serve_conn(&self, conn: &mut dyn Conn) -> Result<(), BoxError> {
        (self.0)(conn)
    }
}

/// In-memory stand-in for a TCP connection.
///
/// Holds two independent growable buffers: an inbound buffer the harness
/// fills with request bytes and the server drains through [`Read`], and an
/// outbound buffer the server fills through [`Write`] and the harness drains
/// after the exchange. Reads report end of input (`Ok(0)`) once the inbound
/// buffer is empty; writes always succeed.
///
/// Clones share the same buffers. Each buffer sits behind its own lock, so a
/// handling thread that outlives its test run (after a timeout) can keep
/// writing without corrupting anything; its output is simply never read.
#[derive(Clone, Default)]
pub struct MemConn {
    inner: Arc<Buffers>,
}

#[derive(Default)]
struct Buffers {
    inbound: Mutex<BytesMut>,
    outbound: Mutex<BytesMut>,
}

impl MemConn {
    /// A fresh pipe with both buffers empty. One per test run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends request bytes to the inbound buffer.
    pub fn feed(&self, bytes: &[u8]) {
        self.inner
            .inbound
            .lock()
            .expect("lock poisoned")
            .extend_from_slice(bytes);
    }

    /// Drains everything the server has written so far.
    pub fn take_output(&self) -> Bytes {
        self.inner.outbound.lock().expect("lock poisoned").split().freeze()
    }
}

impl Read for MemConn {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inbound = self.inner.inbound.lock().expect("lock poisoned");
        let n = buf.len().min(inbound.len());
        buf[..n].copy_from_slice(&inbound.split_to(n));
        Ok(n)
    }
}

impl Write for MemConn {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .outbound
            .lock()
            .expect("lock poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Conn for MemConn {}

impl Conn for TcpStream {
    fn peer_addr(&self) -> Option<SocketAddr> {
        TcpStream::peer_addr(self).ok()
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        TcpStream::local_addr(self).ok()
    }

    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}
