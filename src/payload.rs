//! Transport envelope: build/parse the bytes that get written into carrier
//! slots.
//!
//! Layout, all integers big-endian:
//!
//! ```text
//! MAGIC(8="STEGVID3") | LEN(8) | RESERVED(8, zero) | ENCRYPTED_BLOB(LEN)
//! \_____________________ HEADER, 24 bytes ______________________/
//! ```
//!
//! `ENCRYPTED_BLOB` is [`crate::crypto::envelope::encrypt`]'s output: `salt(16)
//! || nonce(12) || ciphertext || tag(16)`. `LEN` is the blob's length, so the
//! first 16 bytes of the blob (the salt) double as the carrier's
//! sequentially-written salt region — header and salt together fill exactly
//! the 320-bit prelude every carrier writes before switching to the permuted
//! body region.
//!
//! `ENCRYPTED_BLOB`, once decrypted, yields an inner frame:
//!
//! ```text
//! FORMAT_TAG(4="SC01") | NAME_LEN(2) | NAME(NAME_LEN) | BODY
//! ```
//!
//! present only when an original filename was embedded; otherwise the
//! decrypted plaintext *is* `BODY` with no frame wrapper.

use crate::crypto::envelope;
use crate::error::{Error, Result};
use crate::{ecc, permute};

/// Literal magic identifying a valid transport payload.
pub const MAGIC: &[u8; 8] = b"STEGVID3";
/// Header length in bytes: `MAGIC(8) + LEN(8) + RESERVED(8)`.
pub const HEADER_LEN: usize = 24;
/// Salt length as embedded both in the header prelude and the blob.
pub const SALT_LEN: usize = envelope::SALT_LEN;
/// Number of bits in the sequential prelude (header + salt).
pub const PRELUDE_BITS: usize = (HEADER_LEN + SALT_LEN) * 8;

const FORMAT_TAG: &[u8; 4] = b"SC01";

/// Metadata recovered alongside the secret body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadMeta {
    /// Original filename, if one was embedded. `None` for a raw message.
    pub filename: Option<String>,
}

/// Builds the full transport payload: optionally RS-encodes `secret`, wraps
/// it (with `orig_name`, if given) in the inner frame, encrypts under
/// `password`, and prepends the transport header.
pub fn build(
    secret: &[u8],
    password: &[u8],
    use_ecc: bool,
    nsym: u8,
    orig_name: Option<&str>,
) -> Result<Vec<u8>> {
    let body = if use_ecc {
        ecc::encode(secret, nsym)?
    } else {
        secret.to_vec()
    };

    let inner = match orig_name {
        Some(name) => {
            let name_bytes = name.as_bytes();
            if name_bytes.len() > u16::MAX as usize {
                return Err(Error::Malformed(format!(
                    "filename is {} bytes, limit is {}",
                    name_bytes.len(),
                    u16::MAX
                )));
            }
            let mut frame = Vec::with_capacity(4 + 2 + name_bytes.len() + body.len());
            frame.extend_from_slice(FORMAT_TAG);
            frame.extend_from_slice(&(name_bytes.len() as u16).to_be_bytes());
            frame.extend_from_slice(name_bytes);
            frame.extend_from_slice(&body);
            frame
        }
        None => body,
    };

    let blob = envelope::encrypt(password, &inner);
    let len = blob.len() as u64;

    let mut payload = Vec::with_capacity(HEADER_LEN + blob.len());
    payload.extend_from_slice(MAGIC);
    payload.extend_from_slice(&len.to_be_bytes());
    payload.extend_from_slice(&[0u8; 8]);
    payload.extend_from_slice(&blob);
    Ok(payload)
}

/// Parses a full transport payload back into `(body, meta)`.
///
/// # Errors
///
/// [`Error::BadMagic`] if the first 8 bytes are not [`MAGIC`].
/// [`Error::Truncated`] if `payload_bytes` is shorter than `LEN` declares.
/// [`Error::BadAuth`] if the AES-GCM tag does not verify.
/// [`Error::EccDecode`] if `use_ecc` and the RS parity cannot correct the body.
pub fn parse(
    payload_bytes: &[u8],
    password: &[u8],
    use_ecc: bool,
    nsym: u8,
) -> Result<(Vec<u8>, PayloadMeta)> {
    if payload_bytes.len() < HEADER_LEN || &payload_bytes[..8] != MAGIC.as_slice() {
        return Err(Error::BadMagic);
    }

    let len = u64::from_be_bytes(payload_bytes[8..16].try_into().unwrap()) as usize;
    if payload_bytes.len() < HEADER_LEN + len {
        return Err(Error::Truncated);
    }
    let blob = &payload_bytes[HEADER_LEN..HEADER_LEN + len];

    let inner = envelope::decrypt(password, blob)?;

    let (mut body, filename) = if inner.len() >= 6 && &inner[..4] == FORMAT_TAG.as_slice() {
        let name_len = u16::from_be_bytes(inner[4..6].try_into().unwrap()) as usize;
        if inner.len() < 6 + name_len {
            return Err(Error::Malformed("inner frame NAME_LEN exceeds frame".into()));
        }
        let name = String::from_utf8_lossy(&inner[6..6 + name_len]).into_owned();
        (inner[6 + name_len..].to_vec(), Some(name))
    } else {
        (inner, None)
    };

    if use_ecc {
        body = ecc::decode(&body, nsym)?;
    }

    Ok((body, PayloadMeta { filename }))
}

/// Derives the seed used to permute the body region: `password-utf8 ||
/// salt-bytes`, where `salt` is the first [`SALT_LEN`] bytes of the blob
/// (equivalently, the bytes read sequentially at prelude slots
/// `[HEADER_LEN*8, PRELUDE_BITS)`).
pub fn body_permutation_seed(password: &[u8], salt: &[u8]) -> Vec<u8> {
    let mut seed = Vec::with_capacity(password.len() + salt.len());
    seed.extend_from_slice(password);
    seed.extend_from_slice(salt);
    seed
}

/// Computes the permuted body index selection for a carrier region of `total`
/// remaining slots, selecting `take` body bits. When `spread` is false the
/// selection is the identity `[0..take)`.
pub fn body_indices(total: usize, seed: &[u8], take: usize, spread: bool) -> Vec<usize> {
    if spread {
        permute::permute(total, seed, take)
    } else {
        (0..take).collect()
    }
}
