//! Scripted peers shared by the integration tests.
//!
//! Both run in-process and synchronously: they react inside `transmit` and
//! hand their reply to the next `poll_once`, so a [`Connection`] driven with
//! [`NoDelay`] completes an exchange without threads or wall-clock waits.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use ir_msgcom::ack::encode_ack;
use ir_msgcom::checksum::checksum;
use ir_msgcom::frame::TERMINATOR;
use ir_msgcom::timer::NoDelay;
use ir_msgcom::{Connection, IrTransport, ProtocolConfig, RawFrame, TransportError};

/// Short listen window: 2 rounds of 3 polls.
pub fn fast_config() -> ProtocolConfig {
    ProtocolConfig::default()
        .with_poll_iterations(3)
        .with_listen_rounds(2)
}

pub fn connect<T: IrTransport>(transport: T) -> Connection<T, NoDelay> {
    Connection::with_clock(transport, NoDelay, fast_config()).expect("valid config")
}

// ---------------------------------------------------------------------------
// ScriptedPeer: a well-behaved receiver with fault hooks
// ---------------------------------------------------------------------------

/// Simulated receiver for exercising the sender role.
///
/// Acknowledges every step it can validate.  Steps are counted by delivered
/// acknowledgments: step 0 is the task, step 1 the quantity, steps
/// `2..2+n` the data words, then the terminator.
#[derive(Default)]
pub struct ScriptedPeer {
    /// Everything the sender transmitted, in order.
    pub heard: Vec<RawFrame>,
    pub task: Option<u16>,
    pub quantity: Option<u16>,
    pub words: Vec<u32>,
    pub terminated: bool,
    /// Number of acknowledgments that actually reached the sender.
    pub delivered: usize,
    /// Acks to swallow per step index.
    drops: HashMap<usize, u32>,
    /// Stop acknowledging once this many acks were delivered.
    silent_from: Option<usize>,
    pending_word: Option<u32>,
    reply: Option<RawFrame>,
}

impl ScriptedPeer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lose the first `times` acks of step `step`.
    pub fn drop_acks(mut self, step: usize, times: u32) -> Self {
        self.drops.insert(step, times);
        self
    }

    /// Acknowledge the first `steps` steps, then never again.
    pub fn silent_from(mut self, steps: usize) -> Self {
        self.silent_from = Some(steps);
        self
    }

    pub fn count_heard(&self, bits: u8) -> usize {
        self.heard.iter().filter(|f| f.bits == bits).count()
    }

    fn judge(&mut self, raw: RawFrame) -> Option<bool> {
        match raw.bits {
            12 => {
                self.task = Some(raw.value as u16);
                Some(true)
            }
            14 => {
                self.quantity = Some(raw.value as u16);
                Some(true)
            }
            32 => {
                self.pending_word = Some(raw.value);
                None
            }
            16 => {
                let word = self.pending_word.take()?;
                if u32::from(checksum(word)) != raw.value {
                    return Some(false);
                }
                // A retransmission after a lost ack overwrites the same slot.
                let index = self.delivered.saturating_sub(2);
                self.words.truncate(index);
                self.words.push(word);
                Some(true)
            }
            15 => {
                self.terminated = raw.value == TERMINATOR;
                Some(self.terminated)
            }
            _ => None,
        }
    }
}

impl IrTransport for ScriptedPeer {
    fn transmit(&mut self, frame: RawFrame) -> Result<(), TransportError> {
        self.heard.push(frame);
        let Some(ok) = self.judge(frame) else {
            return Ok(());
        };
        if self.silent_from.is_some_and(|n| self.delivered >= n) {
            return Ok(());
        }
        if let Some(left) = self.drops.get_mut(&self.delivered) {
            if *left > 0 {
                *left -= 1;
                return Ok(());
            }
        }
        let task = self.task.unwrap_or(0);
        self.reply = Some(RawFrame::new(u32::from(encode_ack(task, ok)), 13));
        if ok {
            self.delivered += 1;
        }
        Ok(())
    }

    fn begin_listening(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn poll_once(&mut self) -> Result<Option<RawFrame>, TransportError> {
        Ok(self.reply.take())
    }
}

// ---------------------------------------------------------------------------
// FrameFeed: a scripted sender for exercising the receiver role
// ---------------------------------------------------------------------------

/// Delivers a fixed list of frames, one per poll, and records every ack.
#[derive(Default)]
pub struct FrameFeed {
    inbound: VecDeque<RawFrame>,
    pub acks: Vec<RawFrame>,
}

impl FrameFeed {
    pub fn new(frames: impl IntoIterator<Item = RawFrame>) -> Self {
        Self {
            inbound: frames.into_iter().collect(),
            acks: Vec::new(),
        }
    }

    /// The frames a correct sender emits for `task` and `words`.
    pub fn exchange(task: u16, words: &[u32]) -> Vec<RawFrame> {
        let mut frames = vec![
            RawFrame::new(u32::from(task), 12),
            RawFrame::new(words.len() as u32, 14),
        ];
        for &w in words {
            frames.push(RawFrame::new(w, 32));
            frames.push(RawFrame::new(u32::from(checksum(w)), 16));
        }
        frames.push(RawFrame::new(TERMINATOR, 15));
        frames
    }

    pub fn remaining(&self) -> usize {
        self.inbound.len()
    }
}

impl IrTransport for FrameFeed {
    fn transmit(&mut self, frame: RawFrame) -> Result<(), TransportError> {
        self.acks.push(frame);
        Ok(())
    }

    fn begin_listening(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn poll_once(&mut self) -> Result<Option<RawFrame>, TransportError> {
        Ok(self.inbound.pop_front())
    }
}

pub fn ack(task: u16, ok: bool) -> RawFrame {
    RawFrame::new(u32::from(encode_ack(task, ok)), 13)
}
