//! Sender role: stop-and-wait with a per-step retry budget.
//!
//! [`Connection::send`] walks the step table from [`crate::state`] and, for
//! each step, runs the same loop:
//!
//! 1. transmit the step's frames (a data step is word + checksum), each one
//!    preceded by a frame delay,
//! 2. start listening right after the last frame and wait for one
//!    acknowledgment,
//! 3. a positive ack echoing the task advances to the next step,
//! 4. anything else (silence, a foreign frame, a negative or mismatched ack)
//!    retransmits the same frames, up to `max_tries` attempts in total.
//!
//! Exhausting the budget aborts the whole exchange.  Earlier steps are never
//! revisited and later steps are never attempted.

use crate::connection::{AckOutcome, Connection, ExchangeError};
use crate::frame::Frame;
use crate::message::Message;
use crate::state::{SenderState, Step};
use crate::timer::Clock;
use crate::transport::IrTransport;

/// A step that has been transmitted but not yet acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub step: Step,
    /// Frames sent, in order, on every attempt.
    pub frames: Vec<Frame>,
    /// How many times the frames have been transmitted (1 = first send).
    pub tx_count: u32,
}

impl Outbound {
    pub fn new(step: Step, message: &Message) -> Self {
        Self {
            step,
            frames: step.frames(message),
            tx_count: 0,
        }
    }

    pub fn state(&self) -> SenderState {
        self.step.sender_state()
    }
}

impl<T: IrTransport, C: Clock> Connection<T, C> {
    /// Deliver `message` to the peer.
    ///
    /// Returns once the terminator has been acknowledged, or with the first
    /// step that could not be completed.
    pub fn send(&mut self, message: &Message) -> Result<(), ExchangeError> {
        log::debug!(
            "[ir:send] task {} with {} word(s)",
            message.task(),
            message.quantity()
        );
        for step in Step::sequence(message.quantity()) {
            let mut outbound = Outbound::new(step, message);
            self.deliver(&mut outbound, message)?;
        }
        log::debug!("[ir:send] task {} {}", message.task(), SenderState::Done);
        Ok(())
    }

    /// Retry loop for one step.
    fn deliver(&mut self, outbound: &mut Outbound, message: &Message) -> Result<(), ExchangeError> {
        let state = outbound.state();
        while outbound.tx_count < self.config.max_tries {
            outbound.tx_count += 1;
            for &frame in &outbound.frames {
                self.pause();
                self.transmit(frame)?;
            }

            match self.receive_ack(message.task())? {
                AckOutcome::Accepted => return Ok(()),
                AckOutcome::Rejected(ack) => log::debug!(
                    "[ir:send] {state}: ack {ack:#x} rejected (attempt {})",
                    outbound.tx_count
                ),
                AckOutcome::Missing => log::debug!(
                    "[ir:send] {state}: no ack (attempt {})",
                    outbound.tx_count
                ),
            }
        }

        log::warn!(
            "[ir:send] {state}: giving up after {} attempt(s)",
            outbound.tx_count
        );
        Err(ExchangeError::RetriesExhausted {
            state,
            attempts: outbound.tx_count,
        })
    }
}
