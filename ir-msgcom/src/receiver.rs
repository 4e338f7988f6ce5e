//! Receiver role: one attempt per step, acknowledge or abort.
//!
//! [`Connection::receive_into`] mirrors the sender's step table but never
//! retries on its own:
//! - each step makes exactly one bounded receive attempt;
//! - a frame of the expected kind with a valid payload is acknowledged
//!   positively and the next step begins;
//! - anything else is answered with a negative acknowledgment and the call
//!   returns the error.  Before the task is known the negative ack echoes
//!   [`BAD_TASK`].
//!
//! Recovery is entirely the sender's job: its retry loop re-sends the step,
//! and the caller re-enters `receive` from `WaitTask`.
//!
//! A data step reads the word, computes its checksum locally, then reads the
//! Checksum frame as a nested step.  Only one acknowledgment covers the pair.
//! A word is written to the output buffer only after its checksum verifies.

use crate::checksum::checksum;
use crate::connection::{Connection, ExchangeError};
use crate::frame::{Frame, FrameKind, BAD_TASK, MAX_QUANTITY, TERMINATOR};
use crate::message::{Message, TaskId};
use crate::state::{ReceiverState, Step};
use crate::timer::Clock;
use crate::transport::IrTransport;

/// Header of a completed exchange written by [`Connection::receive_into`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Received {
    pub task: TaskId,
    /// Number of words written to the front of the caller's buffer.
    pub quantity: u16,
}

impl<T: IrTransport, C: Clock> Connection<T, C> {
    /// Receive one complete exchange.
    pub fn receive(&mut self) -> Result<Message, ExchangeError> {
        let mut buf = [0u32; MAX_QUANTITY as usize];
        let received = self.receive_into(&mut buf)?;
        let words = buf[..usize::from(received.quantity)].to_vec();
        Ok(Message::new(received.task, words)?)
    }

    /// Receive one exchange into a caller-supplied buffer.
    ///
    /// The announced quantity must not exceed `buf.len()` nor the configured
    /// `max_quantity`.  On error, `buf` holds only the words verified before
    /// the failing step.
    pub fn receive_into(&mut self, buf: &mut [u32]) -> Result<Received, ExchangeError> {
        // Task
        let value = self.expect(Step::Task.receiver_state(), FrameKind::Task, BAD_TASK)?;
        // Task frames are 12 bits wide.
        let task = match TaskId::new(value as u16) {
            Ok(task) => task,
            Err(e) => return Err(self.reject(BAD_TASK, e.into())),
        };
        log::debug!("[ir:recv] ← TASK {task}");
        self.send_ack(task.get(), true)?;
        let t = task.get();

        // Quantity
        let quantity = self.expect(Step::Quantity.receiver_state(), FrameKind::Quantity, t)?;
        let limit = usize::from(self.config.max_quantity).min(buf.len());
        if quantity == 0 || quantity as usize > limit {
            let err = ExchangeError::QuantityOutOfRange {
                quantity,
                max: limit as u16,
            };
            return Err(self.reject(t, err));
        }
        // Bounded by `limit`, which is at most MAX_QUANTITY.
        let quantity = quantity as u16;
        log::debug!("[ir:recv] ← QUANTITY {quantity}");
        self.send_ack(t, true)?;

        // Data words
        for i in 0..quantity {
            let word = self.expect(Step::Data(i).receiver_state(), FrameKind::Data, t)?;
            let expected = checksum(word);
            let received =
                self.expect(ReceiverState::WaitChecksum(i), FrameKind::Checksum, t)? as u16;
            if received != expected {
                let err = ExchangeError::ChecksumMismatch {
                    index: i,
                    expected,
                    received,
                };
                return Err(self.reject(t, err));
            }
            buf[usize::from(i)] = word;
            log::debug!("[ir:recv] ← DATA[{i}] {word:#010x}");
            self.send_ack(t, true)?;
        }

        // Terminator
        let term = self.expect(Step::Terminate.receiver_state(), FrameKind::Terminator, t)?;
        if term != TERMINATOR {
            return Err(self.reject(t, ExchangeError::BadTerminator(term)));
        }
        self.send_ack(t, true)?;

        log::debug!("[ir:recv] task {task} {}", ReceiverState::Done);
        Ok(Received { task, quantity })
    }

    /// Single receive attempt for a frame of `kind`.
    ///
    /// On silence or a foreign frame the peer gets a negative ack echoing
    /// `nack_value` and the step's error is returned.
    fn expect(
        &mut self,
        state: ReceiverState,
        kind: FrameKind,
        nack_value: u16,
    ) -> Result<u32, ExchangeError> {
        let Some(raw) = self.recv_frame()? else {
            return Err(self.reject(nack_value, ExchangeError::NoFrame { state }));
        };
        match Frame::from_raw(raw) {
            Ok(frame) if frame.kind() == kind => Ok(frame.value()),
            _ => {
                let err = ExchangeError::UnexpectedFrame {
                    state,
                    bits: raw.bits,
                };
                Err(self.reject(nack_value, err))
            }
        }
    }

    /// Send a negative ack and hand back the error that caused it.
    ///
    /// A transport failure while sending the ack takes precedence.
    fn reject(&mut self, nack_value: u16, err: ExchangeError) -> ExchangeError {
        log::warn!("[ir:recv] {err}; → NACK {nack_value:#x}");
        match self.send_ack(nack_value, false) {
            Ok(()) => err,
            Err(e) => e.into(),
        }
    }
}
