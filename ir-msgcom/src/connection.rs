//! One end of an infrared link and the primitives both roles share.
//!
//! A [`Connection`] owns three things and nothing else:
//! - the transport adapter (see [`crate::transport`]),
//! - the clock used for every delay (see [`crate::timer`]),
//! - an immutable [`ProtocolConfig`].
//!
//! It keeps no state between exchanges.  The sender role lives in
//! [`crate::sender`] (`Connection::send`), the receiver role in
//! [`crate::receiver`] (`Connection::receive`); both are built from the
//! primitives here:
//!
//! - [`Connection::recv_frame`]: the bounded sleep-and-poll receive loop.
//! - `send_ack`: emit a status-bearing acknowledgment.
//! - `receive_ack`: wait for one acknowledgment and check its echo.

use thiserror::Error;

use crate::ack::{encode_ack, validate_ack};
use crate::config::{ConfigError, ProtocolConfig};
use crate::frame::{Frame, FrameKind, RawFrame};
use crate::message::{MessageError, TaskId};
use crate::state::{ReceiverState, SenderState};
use crate::timer::{Clock, StdClock};
use crate::transport::{IrTransport, TransportError};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Reasons an exchange can fail.
///
/// Callers that only need the success/failure outcome can use `is_ok()` on
/// the result of `send`/`receive`; the variant says where it went wrong.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Sender: no valid acknowledgment for a step within the retry budget.
    #[error("no acknowledgment in {state} after {attempts} attempt(s)")]
    RetriesExhausted { state: SenderState, attempts: u32 },
    /// Receiver: nothing arrived within the listen window.
    #[error("nothing received in {state}")]
    NoFrame { state: ReceiverState },
    /// Receiver: a frame of the wrong kind (or an unknown width) arrived.
    #[error("unexpected {bits}-bit frame in {state}")]
    UnexpectedFrame { state: ReceiverState, bits: u8 },
    /// Receiver: a data word failed its integrity check.
    #[error("checksum mismatch on word {index}: computed {expected:#06x}, received {received:#06x}")]
    ChecksumMismatch {
        index: u16,
        expected: u16,
        received: u16,
    },
    /// Receiver: the terminator frame carried the wrong sentinel.
    #[error("terminator {0:#x} is not the end-of-message sentinel")]
    BadTerminator(u32),
    /// Receiver: the announced word count is zero or exceeds the limit.
    #[error("quantity {quantity} outside 1..={max}")]
    QuantityOutOfRange { quantity: u32, max: u16 },
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Outcome of waiting for one acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AckOutcome {
    /// Positive ack echoing the expected task.
    Accepted,
    /// An ack arrived but its status bit is clear or its echo is wrong.
    Rejected(u16),
    /// Nothing arrived, or the frame was not an ack.
    Missing,
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// An infrared link endpoint able to play either protocol role.
#[derive(Debug)]
pub struct Connection<T, C = StdClock> {
    pub(crate) transport: T,
    pub(crate) clock: C,
    pub(crate) config: ProtocolConfig,
}

impl<T: IrTransport> Connection<T, StdClock> {
    /// Create a connection that sleeps the calling thread for its delays.
    pub fn new(transport: T, config: ProtocolConfig) -> Result<Self, ConfigError> {
        Self::with_clock(transport, StdClock, config)
    }
}

impl<T: IrTransport, C: Clock> Connection<T, C> {
    /// Create a connection with an explicit clock.
    pub fn with_clock(transport: T, clock: C, config: ProtocolConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            transport,
            clock,
            config,
        })
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Give back the transport and clock.
    pub fn into_parts(self) -> (T, C) {
        (self.transport, self.clock)
    }

    /// Wait for the next frame from the peer.
    ///
    /// Arms the receiver once, then runs `listen_rounds` rounds of
    /// `poll_iterations` polls with `poll_pause` between polls and
    /// `frame_delay` between rounds.  Returns `Ok(None)` if nothing was
    /// decoded in any round.
    pub fn recv_frame(&mut self) -> Result<Option<RawFrame>, TransportError> {
        self.transport.begin_listening()?;
        for round in 0..self.config.listen_rounds {
            for _ in 0..self.config.poll_iterations {
                if let Some(raw) = self.transport.poll_once()? {
                    log::trace!("[ir] ← {}-bit {:#x} (round {round})", raw.bits, raw.value);
                    return Ok(Some(raw));
                }
                self.clock.delay(self.config.poll_pause);
            }
            self.clock.delay(self.config.frame_delay);
        }
        Ok(None)
    }

    /// Put one frame on the wire.
    pub(crate) fn transmit(&mut self, frame: Frame) -> Result<(), TransportError> {
        log::debug!("[ir] → {frame}");
        self.transport.transmit(frame.to_raw())
    }

    /// Inter-frame settle time.
    pub(crate) fn pause(&mut self) {
        self.clock.delay(self.config.frame_delay);
    }

    /// Acknowledge (or reject) the current step, echoing `task_value`.
    ///
    /// Waits one frame delay first so the sender is listening again; returns
    /// right after transmitting so the next step's frame finds us armed.
    pub(crate) fn send_ack(&mut self, task_value: u16, success: bool) -> Result<(), TransportError> {
        let ack = encode_ack(task_value & TaskId::MAX, success);
        self.pause();
        self.transmit(Frame::fitted(FrameKind::Ack, u32::from(ack)))
    }

    /// Wait for one frame and judge it as the acknowledgment of `task`.
    ///
    /// Exactly one receive attempt is made; whatever arrives first decides
    /// the outcome.
    pub(crate) fn receive_ack(&mut self, task: TaskId) -> Result<AckOutcome, TransportError> {
        let Some(raw) = self.recv_frame()? else {
            return Ok(AckOutcome::Missing);
        };
        match Frame::from_raw(raw) {
            Ok(frame) if frame.kind() == FrameKind::Ack => {
                // Ack frames are 13 bits wide, so the value fits a u16.
                let ack = frame.value() as u16;
                if validate_ack(ack, task.get()) {
                    log::debug!("[ir] ← ACK {ack:#x}");
                    Ok(AckOutcome::Accepted)
                } else {
                    Ok(AckOutcome::Rejected(ack))
                }
            }
            _ => {
                log::debug!(
                    "[ir] ← {}-bit {:#x} while awaiting ACK; ignored",
                    raw.bits,
                    raw.value
                );
                Ok(AckOutcome::Missing)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::time::Duration;

    use crate::timer::NoDelay;

    /// Transport fed from a fixed script; `None` entries are empty polls.
    #[derive(Default)]
    struct Script {
        polls: VecDeque<Option<RawFrame>>,
        sent: Vec<RawFrame>,
        armed: usize,
        polled: usize,
    }

    impl IrTransport for Script {
        fn transmit(&mut self, frame: RawFrame) -> Result<(), TransportError> {
            self.sent.push(frame);
            Ok(())
        }

        fn begin_listening(&mut self) -> Result<(), TransportError> {
            self.armed += 1;
            Ok(())
        }

        fn poll_once(&mut self) -> Result<Option<RawFrame>, TransportError> {
            self.polled += 1;
            Ok(self.polls.pop_front().flatten())
        }
    }

    #[derive(Default)]
    struct Recorded(Vec<Duration>);

    impl Clock for Recorded {
        fn delay(&mut self, d: Duration) {
            self.0.push(d);
        }
    }

    fn small_config() -> ProtocolConfig {
        ProtocolConfig::default()
            .with_poll_iterations(3)
            .with_listen_rounds(2)
            .with_poll_pause(Duration::from_millis(1))
            .with_frame_delay(Duration::from_millis(50))
    }

    fn task(v: u16) -> TaskId {
        TaskId::new(v).unwrap()
    }

    #[test]
    fn recv_frame_gives_up_after_all_rounds() {
        let mut conn =
            Connection::with_clock(Script::default(), Recorded::default(), small_config()).unwrap();
        assert_eq!(conn.recv_frame().unwrap(), None);

        let (transport, clock) = conn.into_parts();
        assert_eq!(transport.armed, 1);
        assert_eq!(transport.polled, 6);
        // 3 poll pauses + 1 round pause, twice.
        let ms = Duration::from_millis;
        assert_eq!(
            clock.0,
            vec![ms(1), ms(1), ms(1), ms(50), ms(1), ms(1), ms(1), ms(50)]
        );
    }

    #[test]
    fn recv_frame_returns_first_decoded_frame() {
        let mut script = Script::default();
        script.polls.extend([None, None, None, None, Some(RawFrame::new(7, 12))]);
        let mut conn = Connection::with_clock(script, NoDelay, small_config()).unwrap();

        assert_eq!(conn.recv_frame().unwrap(), Some(RawFrame::new(7, 12)));
        assert_eq!(conn.transport().polled, 5);
    }

    #[test]
    fn send_ack_waits_before_transmitting_only() {
        let mut conn =
            Connection::with_clock(Script::default(), Recorded::default(), small_config()).unwrap();
        conn.send_ack(7, true).unwrap();

        let (transport, clock) = conn.into_parts();
        assert_eq!(transport.sent.len(), 1);
        assert_eq!(clock.0, vec![Duration::from_millis(50)]);
    }

    #[test]
    fn send_ack_sets_status_bit() {
        let mut conn = Connection::with_clock(Script::default(), NoDelay, small_config()).unwrap();
        conn.send_ack(7, true).unwrap();
        conn.send_ack(7, false).unwrap();
        assert_eq!(
            conn.transport().sent,
            vec![RawFrame::new(0x1007, 13), RawFrame::new(0x0007, 13)]
        );
    }

    #[test]
    fn receive_ack_outcomes() {
        let mut script = Script::default();
        script.polls.extend([
            Some(RawFrame::new(0x1007, 13)), // positive, matching
            Some(RawFrame::new(0x0007, 13)), // negative
            Some(RawFrame::new(0x1008, 13)), // wrong echo
            Some(RawFrame::new(0x1007, 12)), // not an ack
        ]);
        let mut conn = Connection::with_clock(script, NoDelay, small_config()).unwrap();

        assert_eq!(conn.receive_ack(task(7)).unwrap(), AckOutcome::Accepted);
        assert_eq!(conn.receive_ack(task(7)).unwrap(), AckOutcome::Rejected(0x0007));
        assert_eq!(conn.receive_ack(task(7)).unwrap(), AckOutcome::Rejected(0x1008));
        assert_eq!(conn.receive_ack(task(7)).unwrap(), AckOutcome::Missing);
        assert_eq!(conn.receive_ack(task(7)).unwrap(), AckOutcome::Missing);
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = ProtocolConfig::default().with_max_tries(0);
        assert!(matches!(
            Connection::with_clock(Script::default(), NoDelay, cfg),
            Err(ConfigError::Zero("max_tries"))
        ));
    }
}
