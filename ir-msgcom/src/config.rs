//! Tunable protocol parameters.
//!
//! The defaults reproduce the reference device timing: 5 attempts per step,
//! 50 ms between frames, and a receive window of 5 listen rounds of 1000 polls
//! spaced 1 ms apart.  None of the timing values are correctness
//! requirements, but the frame delay must exceed the time the transport needs
//! to settle after modulating a frame.

use std::time::Duration;

use thiserror::Error;

use crate::frame::{MAX_QUANTITY, MAX_TRIES};

/// Timing and limit parameters shared by both roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Attempts per sender step, counting the first transmission.
    pub max_tries: u32,
    /// Pause around each transmitted frame and between attempts.
    pub frame_delay: Duration,
    /// `poll_once` calls per listen round.
    pub poll_iterations: u32,
    /// Pause between two polls.
    pub poll_pause: Duration,
    /// Listen rounds before a receive reports "nothing received".
    pub listen_rounds: u32,
    /// Largest quantity a receiver accepts (never above [`MAX_QUANTITY`]).
    pub max_quantity: u16,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_tries: MAX_TRIES,
            frame_delay: Duration::from_millis(50),
            poll_iterations: 1000,
            poll_pause: Duration::from_millis(1),
            listen_rounds: 5,
            max_quantity: MAX_QUANTITY,
        }
    }
}

impl ProtocolConfig {
    pub fn with_max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = max_tries;
        self
    }

    pub fn with_frame_delay(mut self, frame_delay: Duration) -> Self {
        self.frame_delay = frame_delay;
        self
    }

    pub fn with_poll_iterations(mut self, poll_iterations: u32) -> Self {
        self.poll_iterations = poll_iterations;
        self
    }

    pub fn with_poll_pause(mut self, poll_pause: Duration) -> Self {
        self.poll_pause = poll_pause;
        self
    }

    pub fn with_listen_rounds(mut self, listen_rounds: u32) -> Self {
        self.listen_rounds = listen_rounds;
        self
    }

    pub fn with_max_quantity(mut self, max_quantity: u16) -> Self {
        self.max_quantity = max_quantity;
        self
    }

    /// Reject settings under which no exchange could ever succeed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tries == 0 {
            return Err(ConfigError::Zero("max_tries"));
        }
        if self.poll_iterations == 0 {
            return Err(ConfigError::Zero("poll_iterations"));
        }
        if self.listen_rounds == 0 {
            return Err(ConfigError::Zero("listen_rounds"));
        }
        if self.max_quantity == 0 || self.max_quantity > MAX_QUANTITY {
            return Err(ConfigError::MaxQuantity(self.max_quantity));
        }
        Ok(())
    }

    /// Worst-case time one receive attempt listens before giving up.
    pub fn listen_window(&self) -> Duration {
        (self.poll_pause * self.poll_iterations + self.frame_delay) * self.listen_rounds
    }
}

/// Errors reported by [`ProtocolConfig::validate`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be at least 1")]
    Zero(&'static str),
    #[error("max_quantity must be in 1..={max}, got {0}", max = MAX_QUANTITY)]
    MaxQuantity(u16),
}
