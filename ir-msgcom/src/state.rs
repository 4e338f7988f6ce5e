//! Exchange state machine types.
//!
//! Both roles walk the same linear sequence of [`Step`]s:
//!
//! ```text
//!  Task ──▶ Quantity ──▶ Data(0) ──▶ … ──▶ Data(n-1) ──▶ Terminate ──▶ Done
//! ```
//!
//! A sender names its position with [`SenderState`], a receiver with
//! [`ReceiverState`].  Neither side ever moves backwards; a failed step ends
//! the exchange.  The step table below is the single place that says which
//! frames make up a step and which frame kind announces it.

use crate::checksum::checksum;
use crate::frame::{Frame, FrameKind, TERMINATOR};
use crate::message::Message;

/// One protocol step, shared by both roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Task,
    Quantity,
    /// Data word at this index, sent together with its checksum.
    Data(u16),
    Terminate,
}

impl Step {
    /// All steps of an exchange carrying `quantity` words, in order.
    pub fn sequence(quantity: u16) -> impl Iterator<Item = Step> {
        [Step::Task, Step::Quantity]
            .into_iter()
            .chain((0..quantity).map(Step::Data))
            .chain(std::iter::once(Step::Terminate))
    }

    /// Frame kind that opens this step on the wire.
    pub fn kind(self) -> FrameKind {
        match self {
            Step::Task => FrameKind::Task,
            Step::Quantity => FrameKind::Quantity,
            Step::Data(_) => FrameKind::Data,
            Step::Terminate => FrameKind::Terminator,
        }
    }

    /// Frames a sender transmits, back to back, for one attempt at this step.
    ///
    /// A data step is the word followed by its checksum; every other step is
    /// a single frame.
    pub fn frames(self, message: &Message) -> Vec<Frame> {
        match self {
            Step::Task => vec![Frame::fitted(
                FrameKind::Task,
                u32::from(message.task().get()),
            )],
            Step::Quantity => vec![Frame::fitted(
                FrameKind::Quantity,
                u32::from(message.quantity()),
            )],
            Step::Data(i) => {
                let word = message.words()[usize::from(i)];
                vec![
                    Frame::fitted(FrameKind::Data, word),
                    Frame::fitted(FrameKind::Checksum, u32::from(checksum(word))),
                ]
            }
            Step::Terminate => vec![Frame::fitted(FrameKind::Terminator, TERMINATOR)],
        }
    }

    pub fn sender_state(self) -> SenderState {
        match self {
            Step::Task => SenderState::SendTask,
            Step::Quantity => SenderState::SendQuantity,
            Step::Data(i) => SenderState::SendData(i),
            Step::Terminate => SenderState::SendTerminate,
        }
    }

    pub fn receiver_state(self) -> ReceiverState {
        match self {
            Step::Task => ReceiverState::WaitTask,
            Step::Quantity => ReceiverState::WaitQuantity,
            Step::Data(i) => ReceiverState::WaitData(i),
            Step::Terminate => ReceiverState::WaitTerminate,
        }
    }
}

/// Position of a sender within an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SenderState {
    /// Transmitting the task identifier.
    #[default]
    SendTask,
    /// Transmitting the word count.
    SendQuantity,
    /// Transmitting data word `i` and its checksum.
    SendData(u16),
    /// Transmitting the terminator sentinel.
    SendTerminate,
    /// Every step acknowledged.
    Done,
}

/// Position of a receiver within an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiverState {
    #[default]
    WaitTask,
    WaitQuantity,
    WaitData(u16),
    /// Data word `i` read; its checksum frame is next.
    WaitChecksum(u16),
    WaitTerminate,
    Done,
}

impl std::fmt::Display for SenderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::fmt::Display for ReceiverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
