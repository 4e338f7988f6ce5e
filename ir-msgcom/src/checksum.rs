//! Per-word integrity check.
//!
//! Every Data frame is followed by a Checksum frame carrying a CRC-16/CCITT of
//! the word.  The variant is the reflected one used by avr-libc's
//! `_crc_ccitt_update` (polynomial 0x8408, initial value 0xFFFF, no final
//! xor), catalogued as CRC-16/MCRF4XX.  Both peers compute it independently;
//! the receiver never trusts the transmitted value blindly.
//!
//! The four bytes of the word are folded most-significant first.  That byte
//! order is part of the wire contract.

use crc::{Crc, CRC_16_MCRF4XX};

const CRC_CCITT: Crc<u16> = Crc::<u16>::new(&CRC_16_MCRF4XX);

/// CRC of one data word, most-significant byte first.
pub fn checksum(word: u32) -> u16 {
    CRC_CCITT.checksum(&word.to_be_bytes())
}
