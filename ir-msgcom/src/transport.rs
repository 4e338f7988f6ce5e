//! Transport adapter contract.
//!
//! The modulation layer (turning a width-tagged integer into an IR burst and
//! back) is an external collaborator.  The handshake engine only needs three
//! operations from it, captured by [`IrTransport`]:
//!
//! | operation          | device equivalent                        |
//! |--------------------|------------------------------------------|
//! | `transmit`         | send one value with a declared bit width |
//! | `begin_listening`  | arm the receiver hardware                |
//! | `poll_once`        | non-blocking check for a decoded value   |
//!
//! Implementations in this crate: [`crate::simulator::LinkEnd`] (in-memory,
//! fault injecting) and [`crate::socket::UdpTransport`] (frames over UDP).

use thiserror::Error;

use crate::frame::RawFrame;

/// Errors a transport adapter can report.
///
/// A transport error aborts the exchange in progress; lost or garbled frames
/// are *not* errors, they simply never show up in [`IrTransport::poll_once`].
#[derive(Error, Debug)]
pub enum TransportError {
    /// Underlying I/O error from the OS.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The other end of the link no longer exists.
    #[error("peer disconnected")]
    Disconnected,
}

/// Half-duplex, width-tagged, unreliable frame channel.
pub trait IrTransport {
    /// Emit one frame.  Delivery is not guaranteed.
    fn transmit(&mut self, frame: RawFrame) -> Result<(), TransportError>;

    /// Arm the receiver before a sequence of [`poll_once`](Self::poll_once)
    /// calls.
    ///
    /// Frames that arrived while the receiver was not armed are lost.  A
    /// peer therefore transmits only after the other side has had time to
    /// arm, which the handshake guarantees by answering a decoded frame no
    /// sooner than one `frame_delay` later.
    fn begin_listening(&mut self) -> Result<(), TransportError>;

    /// Return the next decoded frame if one is ready, without blocking.
    fn poll_once(&mut self) -> Result<Option<RawFrame>, TransportError>;
}

impl<T: IrTransport + ?Sized> IrTransport for &mut T {
    fn transmit(&mut self, frame: RawFrame) -> Result<(), TransportError> {
        (**self).transmit(frame)
    }

    fn begin_listening(&mut self) -> Result<(), TransportError> {
        (**self).begin_listening()
    }

    fn poll_once(&mut self) -> Result<Option<RawFrame>, TransportError> {
        (**self).poll_once()
    }
}

impl<T: IrTransport + ?Sized> IrTransport for Box<T> {
    fn transmit(&mut self, frame: RawFrame) -> Result<(), TransportError> {
        (**self).transmit(frame)
    }

    fn begin_listening(&mut self) -> Result<(), TransportError> {
        (**self).begin_listening()
    }

    fn poll_once(&mut self) -> Result<Option<RawFrame>, TransportError> {
        (**self).poll_once()
    }
}
