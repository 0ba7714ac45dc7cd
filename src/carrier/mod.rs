//! Carrier slot I/O shared by the image (C6) and video (C7) carriers, plus
//! the lossless writer (C8) and post-embed verification (C9).
//!
//! A carrier's pixel byte buffer is addressed as a flat stream of one-bit
//! "slots": at LSB density `lsb`, slot `s` lives in byte `s / lsb`, bit
//! offset `s % lsb` (0 = least significant bit). This module only knows
//! about that addressing and the sequential/permuted prelude-vs-body split;
//! [`image`] and [`video`] decide where the pixel bytes themselves come from.

pub mod image;
pub mod verify;
pub mod video;
pub mod writer;

use crate::error::{Error, Result};
use crate::payload::PRELUDE_BITS;

/// Reads one bit from `buf` at `slot`, density `lsb`.
pub fn read_slot(buf: &[u8], slot: usize, lsb: u8) -> u8 {
    let lsb = lsb as usize;
    let byte = buf[slot / lsb];
    let offset = slot % lsb;
    (byte >> offset) & 1
}

/// Writes `bit` (0 or 1) into `buf` at `slot`, density `lsb`, leaving every
/// other bit of the target byte untouched.
pub fn write_slot(buf: &mut [u8], slot: usize, lsb: u8, bit: u8) {
    let lsb = lsb as usize;
    let offset = slot % lsb;
    let byte = &mut buf[slot / lsb];
    *byte = (*byte & !(1 << offset)) | ((bit & 1) << offset);
}

/// Total addressable slots in a buffer of `byte_len` bytes at density `lsb`.
pub fn slot_count(byte_len: usize, lsb: u8) -> usize {
    byte_len * lsb as usize
}

/// Writes `payload`'s bits into `buf`'s slots: the first [`PRELUDE_BITS`]
/// bits sequentially from slot 0, the rest at `base + idxs[i]` per
/// `body_idxs` (as produced by [`crate::payload::body_indices`]).
///
/// # Errors
///
/// [`Error::Capacity`] if `buf` does not have enough slots at density `lsb`.
pub fn write_payload_bits(buf: &mut [u8], lsb: u8, payload: &[u8], body_idxs: &[usize]) -> Result<()> {
    let bits = crate::bits::bytes_to_bits(payload);
    let total_slots = slot_count(buf.len(), lsb);
    let needed = bits.len() as u64;
    if needed > total_slots as u64 {
        return Err(Error::Capacity {
            needed,
            available: total_slots as u64,
        });
    }

    let prelude_len = PRELUDE_BITS.min(bits.len());
    for (slot, &bit) in bits[..prelude_len].iter().enumerate() {
        write_slot(buf, slot, lsb, bit);
    }

    let base = PRELUDE_BITS;
    for (i, &bit) in bits[prelude_len..].iter().enumerate() {
        let slot = base + body_idxs[i];
        write_slot(buf, slot, lsb, bit);
    }

    Ok(())
}

/// Reads `count` sequential bits starting at slot 0, density `lsb`, and packs
/// them MSB-first into bytes.
pub fn read_sequential_bytes(buf: &[u8], lsb: u8, count: usize) -> Vec<u8> {
    let bits: Vec<u8> = (0..count).map(|slot| read_slot(buf, slot, lsb)).collect();
    crate::bits::bits_to_bytes(&bits)
}

/// LSB densities to try during auto-detect, `declared` first.
pub fn detect_order(declared: u8) -> [u8; 3] {
    let mut order = [declared, 0, 0];
    let mut i = 1;
    for candidate in [1u8, 2, 3] {
        if candidate != declared {
            order[i] = candidate;
            i += 1;
        }
    }
    order
}

/// Tries each density in [`detect_order`], reading [`PRELUDE_BITS`] header
/// bits at that density, and accepts the first whose leading 8 bytes equal
/// [`crate::payload::MAGIC`].
///
/// Returns `(lsb, header_and_salt_bytes)` on success.
pub fn autodetect_lsb(buf: &[u8], declared: u8) -> Result<(u8, Vec<u8>)> {
    for lsb in detect_order(declared) {
        if slot_count(buf.len(), lsb) < PRELUDE_BITS {
            continue;
        }
        let prelude = read_sequential_bytes(buf, lsb, PRELUDE_BITS);
        if prelude.len() >= 8 && &prelude[..8] == crate::payload::MAGIC.as_slice() {
            return Ok((lsb, prelude));
        }
    }
    Err(Error::BadMagic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips_at_each_density() {
        for lsb in [1u8, 2, 3] {
            let mut buf = vec![0u8; 64];
            let bits: Vec<u8> = (0..slot_count(buf.len(), lsb)).map(|i| (i % 2) as u8).collect();
            for (slot, &bit) in bits.iter().enumerate() {
                write_slot(&mut buf, slot, lsb, bit);
            }
            for (slot, &bit) in bits.iter().enumerate() {
                assert_eq!(read_slot(&buf, slot, lsb), bit);
            }
        }
    }

    #[test]
    fn write_slot_does_not_disturb_sibling_bits() {
        let mut buf = vec![0u8; 1];
        write_slot(&mut buf, 0, 3, 1);
        write_slot(&mut buf, 1, 3, 0);
        write_slot(&mut buf, 2, 3, 1);
        assert_eq!(buf[0] & 0b111, 0b101);
    }

    #[test]
    fn detect_order_tries_declared_first_then_remaining_candidates() {
        let order = detect_order(2);
        assert_eq!(order[0], 2);
        let mut rest = order[1..].to_vec();
        rest.sort();
        assert_eq!(rest, vec![1, 3]);
    }

    #[test]
    fn write_payload_bits_reports_capacity_error() {
        let mut buf = vec![0u8; 1];
        let payload = vec![0xAA; 100];
        let err = write_payload_bits(&mut buf, 1, &payload, &[]).unwrap_err();
        assert!(matches!(err, Error::Capacity { .. }));
    }
}
