//! `ir-msgcom`: reliable word exchange over a bit-width-tagged infrared link.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────┐   TASK, QUANTITY,       ┌──────────┐
//!  │  Sender  │   DATA+CHECKSUM…, TERM  │ Receiver │
//!  │  role    │────────────────────────▶│  role    │
//!  └────┬─────┘                         └─────┬────┘
//!       │            ACK (status bit)         │
//!       │◀────────────────────────────────────┘
//!       │
//!  ┌────▼──────────────────────────────┐
//!  │            Connection             │
//!  │ (step table + bounded poll loop)  │
//!  └────┬──────────────────────────────┘
//!       │ (value, bit width)
//!  ┌────▼──────────┐
//!  │  IrTransport  │  (modulation layer: simulator, UDP, hardware)
//!  └───────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`frame`]: frame kinds, width tags, protocol constants
//! - [`ack`]: acknowledgment status-bit packing
//! - [`checksum`]: CRC-16/CCITT over one data word
//! - [`message`]: task identifier and message payload types
//! - [`state`]: step table and per-role state types
//! - [`connection`]: link endpoint, shared receive/ack primitives, errors
//! - [`sender`]: sender role with per-step retry
//! - [`receiver`]: receiver role, one attempt per step
//! - [`config`]: timing and limit parameters
//! - [`timer`]: injectable delays
//! - [`transport`]: transport adapter contract
//! - [`simulator`]: in-memory lossy link for testing
//! - [`socket`]: frames over UDP

pub mod ack;
pub mod checksum;
pub mod config;
pub mod connection;
pub mod frame;
pub mod message;
pub mod receiver;
pub mod sender;
pub mod simulator;
pub mod socket;
pub mod state;
pub mod timer;
pub mod transport;

pub use config::{ConfigError, ProtocolConfig};
pub use connection::{Connection, ExchangeError};
pub use frame::{Frame, FrameError, FrameKind, RawFrame};
pub use message::{Message, MessageError, TaskId};
pub use receiver::Received;
pub use transport::{IrTransport, TransportError};
