//! Injectable waiting.
//!
//! The protocol has no events or callbacks: every wait is a bounded
//! sleep-and-poll loop.  All sleeping goes through a [`Clock`] so the same
//! loops run against wall-clock time on a device and instantly in tests.
//!
//! - [`StdClock`]: blocks the calling thread with [`std::thread::sleep`].
//! - [`NoDelay`]: returns immediately; polling loops spin through their
//!   full iteration budget without waiting.

use std::time::Duration;

/// Source of blocking delays for the handshake engine.
pub trait Clock {
    /// Block for `duration`.
    fn delay(&mut self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdClock;

impl Clock for StdClock {
    fn delay(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Never sleeps.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl Clock for NoDelay {
    fn delay(&mut self, _duration: Duration) {}
}

impl<C: Clock + ?Sized> Clock for &mut C {
    fn delay(&mut self, duration: Duration) {
        (**self).delay(duration);
    }
}
