//! Frames over UDP.
//!
//! [`UdpTransport`] stands in for the IR modulation layer when the two peers
//! are processes rather than devices.  Each frame travels as one 5-byte
//! datagram:
//!
//! ```text
//!  0         1                               5
//! +---------+-------------------------------+
//! |  width  |      value (u32, big-endian)  |
//! +---------+-------------------------------+
//! ```
//!
//! The socket is non-blocking so [`IrTransport::poll_once`] never waits.
//! Arming with [`IrTransport::begin_listening`] throws away datagrams that
//! queued up while nobody was listening.
//! Datagrams from other addresses or with the wrong length are dropped the way
//! a garbled IR burst would be.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};

use crate::frame::RawFrame;
use crate::transport::{IrTransport, TransportError};

/// Byte length of one encoded frame.
pub const DATAGRAM_LEN: usize = 5;

/// Encode a frame into its datagram.
pub fn encode_datagram(frame: RawFrame) -> [u8; DATAGRAM_LEN] {
    let mut buf = [0u8; DATAGRAM_LEN];
    buf[0] = frame.bits;
    buf[1..].copy_from_slice(&frame.value.to_be_bytes());
    buf
}

/// Parse a datagram; `None` if it is not exactly [`DATAGRAM_LEN`] bytes.
pub fn decode_datagram(buf: &[u8]) -> Option<RawFrame> {
    let bytes: &[u8; DATAGRAM_LEN] = buf.try_into().ok()?;
    let value = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    Some(RawFrame::new(value, bytes[0]))
}

/// Returns true for errors a UDP peer that is not up yet can cause.
fn is_transient(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::WouldBlock
            | ErrorKind::Interrupted
            | ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
    )
}

/// A point-to-point frame link over a UDP socket.
#[derive(Debug)]
pub struct UdpTransport {
    /// Address this socket is bound to (filled in after the OS assigns a port).
    pub local_addr: SocketAddr,
    peer: SocketAddr,
    inner: UdpSocket,
}

impl UdpTransport {
    /// Bind to `local_addr` and talk to `peer` only.
    ///
    /// Passing port 0 lets the OS choose an ephemeral port.
    pub fn bind(local_addr: SocketAddr, peer: SocketAddr) -> Result<Self, TransportError> {
        let inner = UdpSocket::bind(local_addr)?;
        inner.set_nonblocking(true)?;
        let local_addr = inner.local_addr()?;
        Ok(Self {
            local_addr,
            peer,
            inner,
        })
    }

    /// Redirect outgoing frames (e.g. once the peer's ephemeral port is known).
    pub fn set_peer(&mut self, peer: SocketAddr) {
        self.peer = peer;
    }
}

impl IrTransport for UdpTransport {
    fn transmit(&mut self, frame: RawFrame) -> Result<(), TransportError> {
        match self.inner.send_to(&encode_datagram(frame), self.peer) {
            Ok(_) => Ok(()),
            // An unreachable peer is a lost frame, not a broken link.
            Err(e) if is_transient(&e) => {
                log::debug!("[udp] send to {} failed: {e}", self.peer);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn begin_listening(&mut self) -> Result<(), TransportError> {
        let mut buf = [0u8; 64];
        loop {
            match self.inner.recv_from(&mut buf) {
                Ok((n, from)) => log::trace!("[udp] discarding stale {n}-byte datagram from {from}"),
                Err(e) if is_transient(&e) => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn poll_once(&mut self) -> Result<Option<RawFrame>, TransportError> {
        let mut buf = [0u8; 64];
        let (n, from) = match self.inner.recv_from(&mut buf) {
            Ok(v) => v,
            Err(e) if is_transient(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if from != self.peer {
            log::debug!("[udp] ignoring datagram from {from}");
            return Ok(None);
        }
        let frame = decode_datagram(&buf[..n]);
        if frame.is_none() {
            log::debug!("[udp] dropping {n}-byte datagram from {from}");
        }
        Ok(frame)
    }
}
