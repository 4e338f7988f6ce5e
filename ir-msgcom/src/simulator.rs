//! In-memory infrared link for tests and demos.
//!
//! Real IR links lose and garble frames.  To exercise the handshake without
//! hardware, [`LoopbackLink::pair`] returns two [`LinkEnd`]s connected by
//! channels, one per direction, each applying a configurable fault model on
//! transmit:
//!
//! | Fault        | Description                                           |
//! |--------------|-------------------------------------------------------|
//! | Frame loss   | Drop a frame with probability `loss_rate`.            |
//! | Corruption   | Flip one random bit (within the frame's width) with   |
//! |              | probability `corrupt_rate`.                           |
//!
//! Faults are drawn from a seeded RNG so failures are reproducible.  The
//! default configuration is a lossless pass-through.
//!
//! An end only hears frames that arrive while it is armed.  Each call to
//! `begin_listening` discards whatever reached the end since it last
//! listened, the way an IR receiver that was disabled never saw those
//! bursts.  The two ends are meant to run on separate threads, one per role.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::frame::RawFrame;
use crate::transport::{IrTransport, TransportError};

/// Configuration for the fault-injection model.
///
/// Probabilities are in `[0.0, 1.0]`; values above 1 act as 1, anything else
/// outside the range as 0.
#[derive(Debug, Clone)]
pub struct FaultConfig {
    /// Probability that a transmitted frame never arrives.
    pub loss_rate: f64,
    /// Probability that a delivered frame has one bit flipped.
    pub corrupt_rate: f64,
    /// Seed for the fault RNG.  The two ends derive distinct streams from it.
    pub seed: u64,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            corrupt_rate: 0.0,
            seed: 0,
        }
    }
}

/// Counters kept by each [`LinkEnd`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkStats {
    pub sent: u64,
    pub dropped: u64,
    pub corrupted: u64,
    /// Frames that reached this end while it was not listening.
    pub missed: u64,
}

/// Constructor namespace for a connected pair of [`LinkEnd`]s.
pub struct LoopbackLink;

impl LoopbackLink {
    /// Create two connected ends sharing one fault model.
    pub fn pair(faults: FaultConfig) -> (LinkEnd, LinkEnd) {
        let (a_tx, b_rx) = mpsc::channel();
        let (b_tx, a_rx) = mpsc::channel();
        let a = LinkEnd::new(a_tx, a_rx, faults.clone(), faults.seed);
        let b = LinkEnd::new(b_tx, b_rx, faults.clone(), faults.seed.wrapping_add(1));
        (a, b)
    }
}

/// One side of a [`LoopbackLink`].
#[derive(Debug)]
pub struct LinkEnd {
    tx: Sender<RawFrame>,
    rx: Receiver<RawFrame>,
    faults: FaultConfig,
    rng: StdRng,
    listening: bool,
    history: Vec<RawFrame>,
    stats: LinkStats,
}

impl LinkEnd {
    fn new(tx: Sender<RawFrame>, rx: Receiver<RawFrame>, faults: FaultConfig, seed: u64) -> Self {
        Self {
            tx,
            rx,
            faults,
            rng: StdRng::seed_from_u64(seed),
            listening: false,
            history: Vec::new(),
            stats: LinkStats::default(),
        }
    }

    /// Every frame this end transmitted, as handed to the link (before
    /// faults were applied).
    pub fn history(&self) -> &[RawFrame] {
        &self.history
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    fn chance(&mut self, p: f64) -> bool {
        // `p > 0.0` is false for NaN.
        p > 0.0 && self.rng.random_bool(p.min(1.0))
    }
}

impl IrTransport for LinkEnd {
    fn transmit(&mut self, frame: RawFrame) -> Result<(), TransportError> {
        self.history.push(frame);
        self.stats.sent += 1;

        if self.chance(self.faults.loss_rate) {
            self.stats.dropped += 1;
            log::debug!("[sim] dropped {}-bit {:#x}", frame.bits, frame.value);
            return Ok(());
        }

        let mut delivered = frame;
        if self.chance(self.faults.corrupt_rate) && frame.bits > 0 {
            let bit = self.rng.random_range(0..u32::from(frame.bits.min(32)));
            delivered.value ^= 1 << bit;
            self.stats.corrupted += 1;
            log::debug!(
                "[sim] corrupted {}-bit {:#x} -> {:#x}",
                frame.bits,
                frame.value,
                delivered.value
            );
        }

        self.tx
            .send(delivered)
            .map_err(|_| TransportError::Disconnected)
    }

    fn begin_listening(&mut self) -> Result<(), TransportError> {
        // A disconnect is left for `poll_once` to report.
        while let Ok(stale) = self.rx.try_recv() {
            self.stats.missed += 1;
            log::trace!("[sim] missed {}-bit {:#x}", stale.bits, stale.value);
        }
        self.listening = true;
        Ok(())
    }

    fn poll_once(&mut self) -> Result<Option<RawFrame>, TransportError> {
        if !self.listening {
            return Ok(None);
        }
        match self.rx.try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Disconnected),
        }
    }
}
