use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};

/// A connected byte-stream endpoint — one TCP connection to the simulator.
///
/// Reads are unbounded and blocking; writes are dispatched promptly
/// (`TCP_NODELAY`). The endpoint guarantees complete reads and writes: a
/// stream socket may transfer fewer bytes than requested on any single
/// call, and [`read_exact`](TcpEndpoint::read_exact) /
/// [`write_exact`](TcpEndpoint::write_exact) loop until the full buffer has
/// been transferred or the connection faults.
pub struct TcpEndpoint {
    stream: Option<TcpStream>,
}

impl TcpEndpoint {
    /// Connect to `host:port` (blocking).
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port)).map_err(|e| TransportError::Connect {
            host: host.to_string(),
            port,
            source: e,
        })?;
        Self::from_stream(host, port, stream)
    }

    /// Connect to `host:port`, bounding each address attempt by `timeout`.
    ///
    /// Used by reconnect loops so that a concurrent close is observed within
    /// one attempt rather than after an arbitrarily long dial.
    pub fn connect_timeout(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let connect_err = |e: std::io::Error| TransportError::Connect {
            host: host.to_string(),
            port,
            source: e,
        };

        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(connect_err)?
            .collect();

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Self::from_stream(host, port, stream),
                Err(e) => last_err = Some(e),
            }
        }

        Err(connect_err(last_err.unwrap_or_else(|| {
            std::io::Error::new(ErrorKind::AddrNotAvailable, "host resolved to no addresses")
        })))
    }

    fn from_stream(host: &str, port: u16, stream: TcpStream) -> Result<Self> {
        // Each write must hit the wire promptly; request/response latency
        // dominates throughput for this protocol.
        stream.set_nodelay(true)?;
        stream.set_read_timeout(None)?;
        stream.set_write_timeout(None)?;
        debug!(host, port, "connected");
        Ok(Self {
            stream: Some(stream),
        })
    }

    fn stream(&self) -> Result<&TcpStream> {
        self.stream.as_ref().ok_or(TransportError::Closed)
    }

    /// Read exactly `buf.len()` bytes, issuing as many underlying reads as
    /// needed. Never returns a short result: end-of-stream before the buffer
    /// fills is an error.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut stream = self.stream()?;
        let mut filled = 0usize;
        while filled < buf.len() {
            match stream.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(TransportError::Io(std::io::Error::new(
                        ErrorKind::UnexpectedEof,
                        "connection closed before read completed",
                    )))
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        Ok(())
    }

    /// Write the entire buffer, blocking until every byte has been accepted
    /// by the transport.
    pub fn write_exact(&mut self, buf: &[u8]) -> Result<()> {
        let mut stream = self.stream()?;
        let mut offset = 0usize;
        while offset < buf.len() {
            match stream.write(&buf[offset..]) {
                Ok(0) => {
                    return Err(TransportError::Io(std::io::Error::new(
                        ErrorKind::WriteZero,
                        "connection closed before write completed",
                    )))
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        Ok(())
    }

    /// Shut down both directions of the connection without consuming the
    /// endpoint. Any thread blocked in a read or write observes the fault.
    pub fn shutdown(&self) -> Result<()> {
        match self.stream()?.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // Already torn down by the peer; nothing left to do.
            Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    /// Release the socket handle. Idempotent: closing an already-closed
    /// endpoint is a no-op. Subsequent reads and writes fail with
    /// [`TransportError::Closed`].
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            debug!("endpoint closed");
        }
    }

    /// Whether [`close`](TcpEndpoint::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Duplicate the endpoint handle (new file descriptor, same connection).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.stream()?.try_clone()?;
        Ok(Self {
            stream: Some(cloned),
        })
    }

    /// Address of the remote endpoint, for diagnostics.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.stream()?.peer_addr()?)
    }
}

impl Read for TcpEndpoint {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.stream {
            Some(stream) => stream.read(buf),
            None => Err(std::io::Error::new(ErrorKind::NotConnected, "endpoint closed")),
        }
    }
}

impl Write for TcpEndpoint {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.stream {
            Some(stream) => stream.write(buf),
            None => Err(std::io::Error::new(ErrorKind::NotConnected, "endpoint closed")),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.stream {
            Some(stream) => stream.flush(),
            None => Err(std::io::Error::new(ErrorKind::NotConnected, "endpoint closed")),
        }
    }
}

impl std::fmt::Debug for TcpEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpEndpoint")
            .field("peer", &self.stream.as_ref().and_then(|s| s.peer_addr().ok()))
            .finish()
    }
}

/// Accepts incoming TCP connections.
///
/// The client core only dials out; the acceptor exists for local echo
/// endpoints (CLI `listen`, tests, demos).
pub struct TcpAcceptor {
    listener: TcpListener,
}

impl TcpAcceptor {
    /// Bind and listen on `127.0.0.1:port`. Port 0 requests an ephemeral port.
    pub fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port))?;
        debug!(addr = ?listener.local_addr().ok(), "listening");
        Ok(Self { listener })
    }

    /// Accept the next incoming connection (blocking).
    pub fn accept(&self) -> Result<TcpEndpoint> {
        let (stream, addr) = self.listener.accept()?;
        stream.set_nodelay(true)?;
        debug!(%addr, "accepted connection");
        Ok(TcpEndpoint {
            stream: Some(stream),
        })
    }

    /// The locally bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}
