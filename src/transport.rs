//! TCP transport layer for EtherNet/IP communication.
//!
//! This module provides the [`Transport`] trait the session layer talks to,
//! and [`TcpTransport`], its implementation over a blocking TCP stream.
//! The transport layer only knows about sockets and bytes; it has no
//! knowledge of encapsulation frames or CIP.
//!
//! # Design
//!
//! - **Protocol agnostic** - Handles only byte transmission
//! - **Synchronous** - Blocking send/receive with configurable timeout
//! - **Simple** - One stream, one remote address, no connection pooling
//!
//! # Constants
//!
//! - [`DEFAULT_EIP_PORT`] - Default EtherNet/IP TCP port (44818)
//! - [`DEFAULT_TIMEOUT`] - Default timeout (5 seconds)

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use tracing::debug;

use crate::error::{EipError, Result};

/// Default EtherNet/IP explicit messaging TCP port.
pub const DEFAULT_EIP_PORT: u16 = 44818;

/// Default timeout for transport operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Byte-stream collaborator consumed by the session layer.
///
/// Implementations carry bytes to and from exactly one PLC over a reliable,
/// ordered connection. `receive` must either return exactly `len` bytes or
/// fail with [`EipError::Timeout`] once the configured wait has elapsed.
pub trait Transport {
    /// Opens the connection to the PLC.
    fn open(&mut self) -> Result<()>;

    /// Writes all bytes to the PLC.
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Reads exactly `len` bytes from the PLC.
    fn receive(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Closes the connection. Closing an already closed transport is a no-op.
    fn close(&mut self);

    /// Returns whether the connection is currently open.
    fn is_open(&self) -> bool;
}

/// TCP transport for EtherNet/IP communication.
///
/// The stream is created lazily by [`Transport::open`] so a client can be
/// built before the PLC is reachable.
pub struct TcpTransport {
    stream: Option<TcpStream>,
    remote_addr: SocketAddr,
    timeout: Duration,
}

impl TcpTransport {
    /// Creates a new, not yet connected, TCP transport.
    ///
    /// # Example
    ///
    /// ```
    /// use ab_eip::{TcpTransport, Transport};
    /// use std::time::Duration;
    ///
    /// let transport = TcpTransport::new(
    ///     "192.168.1.10:44818".parse().unwrap(),
    ///     Duration::from_secs(5),
    /// );
    /// assert!(!transport.is_open());
    /// ```
    pub fn new(remote_addr: SocketAddr, timeout: Duration) -> Self {
        Self {
            stream: None,
            remote_addr,
            timeout,
        }
    }

    /// Creates a new TCP transport with the default timeout.
    pub fn with_default_timeout(remote_addr: SocketAddr) -> Self {
        Self::new(remote_addr, DEFAULT_TIMEOUT)
    }

    /// Returns the remote PLC address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn stream(&mut self) -> Result<&mut TcpStream> {
        self.stream.as_mut().ok_or(EipError::NotConnected)
    }
}

fn map_io(e: std::io::Error) -> EipError {
    match e.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => EipError::Timeout,
        _ => EipError::Io(e),
    }
}

impl Transport for TcpTransport {
    fn open(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let stream = TcpStream::connect_timeout(&self.remote_addr, self.timeout).map_err(map_io)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;
        debug!(remote = %self.remote_addr, "TCP connection established");

        self.stream = Some(stream);
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        self.stream()?.write_all(data).map_err(map_io)
    }

    fn receive(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; len];
        self.stream()?.read_exact(&mut buffer).map_err(map_io)?;
        Ok(buffer)
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            // The peer may already have dropped the connection.
            let _ = stream.shutdown(Shutdown::Both);
            debug!(remote = %self.remote_addr, "TCP connection closed");
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("remote_addr", &self.remote_addr)
            .field(
                "local_addr",
                &self.stream.as_ref().and_then(|s| s.local_addr().ok()),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Scripted in-memory transport used by unit tests.
#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;

    use super::Transport;
    use crate::error::{EipError, Result};

    /// Replays queued reply frames and records every frame sent.
    #[derive(Debug, Default)]
    pub(crate) struct MockTransport {
        pub(crate) open: bool,
        pub(crate) fail_open: bool,
        pub(crate) sent: Vec<Vec<u8>>,
        pub(crate) replies: VecDeque<Vec<u8>>,
        pending: VecDeque<u8>,
    }

    impl MockTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn push_reply(&mut self, frame: Vec<u8>) {
            self.replies.push_back(frame);
        }
    }

    impl Transport for MockTransport {
        fn open(&mut self) -> Result<()> {
            if self.fail_open {
                return Err(EipError::Timeout);
            }
            self.open = true;
            Ok(())
        }

        fn send(&mut self, data: &[u8]) -> Result<()> {
            if !self.open {
                return Err(EipError::NotConnected);
            }
            self.sent.push(data.to_vec());
            Ok(())
        }

        fn receive(&mut self, len: usize) -> Result<Vec<u8>> {
            if self.pending.is_empty() {
                match self.replies.pop_front() {
                    Some(frame) => self.pending.extend(frame),
                    None => return Err(EipError::Timeout),
                }
            }
            if self.pending.len() < len {
                return Err(EipError::Timeout);
            }
            Ok(self.pending.drain(..len).collect())
        }

        fn close(&mut self) {
            self.open = false;
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }
}
