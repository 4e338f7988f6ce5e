//! Application-level payload of one exchange.
//!
//! A [`Message`] is a task identifier plus 1..=[`MAX_QUANTITY`] 32-bit words.
//! The caller builds it before `send`; `receive` produces one.  Both types
//! validate their bounds on construction so the handshake engine never has to
//! emit a frame that does not fit its width.

use thiserror::Error;

use crate::frame::{FrameKind, MAX_QUANTITY};

/// Correlation id of one exchange, echoed in every acknowledgment.
///
/// Must fit the 12-bit Task frame and be non-zero: a zero task is what a
/// receiver reports when nothing arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u16);

impl TaskId {
    /// Largest valid identifier.
    pub const MAX: u16 = FrameKind::Task.max_value() as u16;

    pub fn new(value: u16) -> Result<Self, MessageError> {
        if value == 0 || value > Self::MAX {
            return Err(MessageError::TaskOutOfRange(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for TaskId {
    type Error = MessageError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#05x}", self.0)
    }
}

/// One exchange: a task and the ordered data words that belong to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    task: TaskId,
    words: Vec<u32>,
}

impl Message {
    pub fn new(task: TaskId, words: impl Into<Vec<u32>>) -> Result<Self, MessageError> {
        let words = words.into();
        if words.is_empty() {
            return Err(MessageError::Empty);
        }
        if words.len() > usize::from(MAX_QUANTITY) {
            return Err(MessageError::TooManyWords {
                count: words.len(),
                max: MAX_QUANTITY,
            });
        }
        Ok(Self { task, words })
    }

    pub fn task(&self) -> TaskId {
        self.task
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Number of data words, as announced in the Quantity frame.
    pub fn quantity(&self) -> u16 {
        // Bounded by MAX_QUANTITY in `new`.
        self.words.len() as u16
    }
}

/// Errors raised while building a [`TaskId`] or [`Message`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("task id {0:#x} outside 1..={max:#x}", max = TaskId::MAX)]
    TaskOutOfRange(u16),
    #[error("a message needs at least one data word")]
    Empty,
    #[error("{count} data words exceed the limit of {max}")]
    TooManyWords { count: usize, max: u16 },
}
