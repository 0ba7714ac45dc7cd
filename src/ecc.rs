//! Optional Reed-Solomon forward error correction over `GF(2^8)`.
//!
//! Reed-Solomon in `GF(2^8)` caps a single codeword at 255 symbols, so
//! buffers larger than `255 - nsym` data bytes are split into fixed-size
//! blocks and parity is appended per block — the "standard chunked manner"
//! the specification calls for. Encoding fills blocks of `255 - nsym` data
//! bytes until the remainder is shorter; decoding replays the identical
//! arithmetic from the encoded buffer's total length, so no block-boundary
//! metadata needs to travel with the data.
//!
//! Gated behind the `ecc` Cargo feature (default-on). With the feature
//! disabled, both functions return [`Error::EccUnavailable`].

use crate::error::{Error, Result};

/// Maximum Reed-Solomon codeword length over `GF(2^8)`.
const MAX_CODEWORD_LEN: usize = 255;

/// RS-encodes `data`, appending `nsym` parity bytes per block of `255 -
/// nsym` data bytes (the final block may be shorter).
///
/// # Errors
///
/// [`Error::EccUnavailable`] if built without the `ecc` feature, or if
/// `nsym` is 0 or `>= 255`.
#[cfg(feature = "ecc")]
pub fn encode(data: &[u8], nsym: u8) -> Result<Vec<u8>> {
    let block_data_len = block_data_len(nsym)?;
    let encoder = reed_solomon::Encoder::new(nsym as usize);

    let mut out = Vec::with_capacity(data.len() + data.len().div_ceil(block_data_len) * nsym as usize);
    for block in data.chunks(block_data_len) {
        let encoded = encoder.encode(block);
        out.extend_from_slice(&encoded);
    }
    // encode(&[]) with zero blocks must still be representable as empty output.
    Ok(out)
}

/// RS-decodes `data` (as produced by [`encode`]) back to the original bytes,
/// correcting up to `nsym / 2` byte errors per block.
///
/// # Errors
///
/// [`Error::EccUnavailable`] if built without the `ecc` feature or for an
/// invalid `nsym`. [`Error::EccDecode`] if any block has uncorrectable
/// errors, or the encoded length is inconsistent with `nsym`.
#[cfg(feature = "ecc")]
pub fn decode(data: &[u8], nsym: u8) -> Result<Vec<u8>> {
    let block_data_len = block_data_len(nsym)?;
    let block_encoded_len = block_data_len + nsym as usize;
    let decoder = reed_solomon::Decoder::new(nsym as usize);

    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data.len() <= nsym as usize {
        return Err(Error::EccDecode);
    }

    let mut out = Vec::with_capacity(data.len());
    let mut offset = 0;
    while offset < data.len() {
        let remaining = data.len() - offset;
        let take = remaining.min(block_encoded_len);
        if take <= nsym as usize {
            return Err(Error::EccDecode);
        }
        let block = &data[offset..offset + take];
        let corrected = decoder.correct(block, None).map_err(|_| Error::EccDecode)?;
        out.extend_from_slice(corrected.data());
        offset += take;
    }
    Ok(out)
}

#[cfg(feature = "ecc")]
fn block_data_len(nsym: u8) -> Result<usize> {
    if nsym == 0 || nsym as usize >= MAX_CODEWORD_LEN {
        return Err(Error::EccUnavailable);
    }
    Ok(MAX_CODEWORD_LEN - nsym as usize)
}

/// Stub used when the crate is built without the `ecc` feature: any request
/// for Reed-Solomon fails with [`Error::EccUnavailable`].
#[cfg(not(feature = "ecc"))]
pub fn encode(_data: &[u8], _nsym: u8) -> Result<Vec<u8>> {
    Err(Error::EccUnavailable)
}

/// See [`encode`]'s feature-gated stub.
#[cfg(not(feature = "ecc"))]
pub fn decode(_data: &[u8], _nsym: u8) -> Result<Vec<u8>> {
    Err(Error::EccUnavailable)
}
