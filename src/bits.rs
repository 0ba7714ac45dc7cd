//! Bit packing between byte buffers and bit sequences.
//!
//! Bits are MSB-first within each byte, matching the slot addressing used by
//! every carrier: slot `s` of a byte buffer maps to byte `s / 8` and bit
//! position `7 - (s % 8)` within that byte when treating the buffer as a
//! flat bitstream (carriers additionally interleave an LSB density, handled
//! in [`crate::carrier`]).

/// Unpacks `buf` into one `u8` (0 or 1) per bit, MSB first within each byte.
pub fn bytes_to_bits(buf: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(buf.len() * 8);
    for &byte in buf {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1);
        }
    }
    bits
}

/// Packs `bits` (each expected to be 0 or 1) into bytes, MSB first. If
/// `bits.len()` is not a multiple of 8, the final byte is right-padded with
/// zero bits.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bits.len().div_ceil(8));
    let mut chunks = bits.chunks(8).peekable();
    while let Some(chunk) = chunks.next() {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            if bit & 1 != 0 {
                byte |= 1 << (7 - i);
            }
        }
        out.push(byte);
    }
    out
}
