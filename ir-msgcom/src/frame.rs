//! Wire-format definitions for protocol frames.
//!
//! The infrared transport carries exactly one integer per transmission and
//! tags it with the number of bits it was modulated with.  There is no header
//! byte: the bit width *is* the frame type.  This module is responsible for:
//! - Binding each [`FrameKind`] to its width tag (and back).
//! - Validating that a value fits the width of its kind.
//! - Converting between the typed [`Frame`] and the transport's [`RawFrame`].
//!
//! No I/O happens here.
//!
//! # Wire table
//!
//! ```text
//!  kind         width  payload
//!  ----------   -----  ------------------------------------------
//!  Task          12    task identifier
//!  Ack           13    status bit (bit 12) + echoed task identifier
//!  Quantity      14    number of data words (1..=64)
//!  Terminator    15    fixed sentinel TERMINATOR
//!  Checksum      16    CRC over the preceding data word
//!  Data          32    one data word
//! ```

use thiserror::Error;

/// Sentinel carried by the Terminator frame.
pub const TERMINATOR: u32 = 0xE2D;

/// Echoed in a negative ack when the receiver does not know the task yet.
pub const BAD_TASK: u16 = 0xBAD;

/// Upper bound on the number of data words in one exchange.
pub const MAX_QUANTITY: u16 = 64;

/// Attempts per protocol step before the sender gives up.
pub const MAX_TRIES: u32 = 5;

/// Logical frame type, discriminated on the wire by bit width alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Task,
    Ack,
    Quantity,
    Terminator,
    Data,
    Checksum,
}

impl FrameKind {
    /// Every kind, in wire-table order.
    pub const ALL: [FrameKind; 6] = [
        FrameKind::Task,
        FrameKind::Ack,
        FrameKind::Quantity,
        FrameKind::Terminator,
        FrameKind::Data,
        FrameKind::Checksum,
    ];

    /// Width tag used on the wire for this kind.
    pub const fn bits(self) -> u8 {
        match self {
            FrameKind::Task => 12,
            FrameKind::Ack => 13,
            FrameKind::Quantity => 14,
            FrameKind::Terminator => 15,
            FrameKind::Data => 32,
            FrameKind::Checksum => 16,
        }
    }

    /// Reverse lookup of [`bits`](Self::bits).
    pub fn from_bits(bits: u8) -> Option<FrameKind> {
        Self::ALL.into_iter().find(|kind| kind.bits() == bits)
    }

    /// Largest value representable in this kind's width.
    pub const fn max_value(self) -> u32 {
        match self.bits() {
            32 => u32::MAX,
            n => (1u32 << n) - 1,
        }
    }
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FrameKind::Task => "TASK",
            FrameKind::Ack => "ACK",
            FrameKind::Quantity => "QUANTITY",
            FrameKind::Terminator => "TERM",
            FrameKind::Data => "DATA",
            FrameKind::Checksum => "CHECKSUM",
        };
        f.write_str(name)
    }
}

/// A value exactly as the transport sees it: an integer and its bit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    pub value: u32,
    pub bits: u8,
}

impl RawFrame {
    pub fn new(value: u32, bits: u8) -> Self {
        Self { value, bits }
    }
}

/// A typed protocol frame.
///
/// Construct through [`Frame::new`] so the value is guaranteed to fit the
/// kind's width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    kind: FrameKind,
    value: u32,
}

impl Frame {
    /// Build a frame, rejecting values wider than the kind allows.
    pub fn new(kind: FrameKind, value: u32) -> Result<Self, FrameError> {
        if value > kind.max_value() {
            return Err(FrameError::ValueOutOfRange { kind, value });
        }
        Ok(Self { kind, value })
    }

    /// Build a frame from a value the caller already bounded.
    pub(crate) fn fitted(kind: FrameKind, value: u32) -> Self {
        debug_assert!(value <= kind.max_value(), "{value:#x} overflows {kind}");
        Self {
            kind,
            value: value & kind.max_value(),
        }
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// Lower into the transport representation.
    pub fn to_raw(self) -> RawFrame {
        RawFrame::new(self.value, self.kind.bits())
    }

    /// Classify a received transport value.
    ///
    /// Returns [`Err`] if the width matches no kind or the value does not fit
    /// the width it claims.
    pub fn from_raw(raw: RawFrame) -> Result<Self, FrameError> {
        let kind = FrameKind::from_bits(raw.bits).ok_or(FrameError::UnknownWidth(raw.bits))?;
        Self::new(kind, raw.value)
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:#x}", self.kind, self.value)
    }
}

/// Errors that can arise when classifying or building a frame.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The transport reported a bit width no frame kind uses.
    #[error("no frame kind is {0} bits wide")]
    UnknownWidth(u8),
    /// The value needs more bits than the kind's width provides.
    #[error("value {value:#x} does not fit a {kind} frame")]
    ValueOutOfRange { kind: FrameKind, value: u32 },
}
