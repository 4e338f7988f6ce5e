//! Acknowledgment value packing.
//!
//! An acknowledgment echoes the task identifier of the exchange and carries
//! one status bit above it:
//!
//! ```text
//!  12 11                     0
//! +--+------------------------+
//! |S |     task identifier    |
//! +--+------------------------+
//! ```
//!
//! `S = 1` acknowledges the step, `S = 0` rejects it.

/// Bit position of the status flag inside an ack value.
pub const STATUS_BIT: u32 = 12;

const STATUS_MASK: u16 = 1 << STATUS_BIT;

/// Set the status bit of `task_value` to `success`.
pub fn encode_ack(task_value: u16, success: bool) -> u16 {
    if success {
        task_value | STATUS_MASK
    } else {
        task_value & !STATUS_MASK
    }
}

/// Read the status bit.
pub fn ack_status(ack: u16) -> bool {
    ack & STATUS_MASK != 0
}

/// `true` only for a positive ack whose echoed value is exactly `expected`.
pub fn validate_ack(ack: u16, expected: u16) -> bool {
    ack_status(ack) && (ack & !STATUS_MASK) == expected
}
