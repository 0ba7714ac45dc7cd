//! Password-based key derivation and AES-256-GCM authenticated encryption.
//!
//! Key derivation is PBKDF2-HMAC-SHA256 with [`PBKDF2_ITERATIONS`] rounds,
//! producing a 32-byte AES-256 key. [`encrypt`] returns `salt || nonce ||
//! ciphertext || tag`; [`decrypt`] parses that exact layout back out.
//! Associated data is always empty.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;

use crate::error::{Error, Result};

/// Salt length in bytes, used both for key derivation and embedded in the
/// transport layout.
pub const SALT_LEN: usize = 16;
/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// AES-GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;
/// PBKDF2-HMAC-SHA256 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 200_000;
/// Derived key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Minimum valid envelope length: salt + nonce + (zero-length ciphertext) + tag.
const MIN_ENVELOPE_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

/// Derives a 32-byte AES-256 key from `password` and `salt` via
/// PBKDF2-HMAC-SHA256 with [`PBKDF2_ITERATIONS`] rounds.
pub fn derive_key(password: &[u8], salt: &[u8; SALT_LEN]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ITERATIONS, &mut key);
    key
}

/// Encrypts `plaintext` under `password`, generating a fresh random salt and
/// nonce. Returns `salt || nonce || ciphertext || tag`.
pub fn encrypt(password: &[u8], plaintext: &[u8]) -> Vec<u8> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(password, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    let nonce = Nonce::from_slice(&nonce_bytes);
    // AES-256-GCM never fails to encrypt; the only failure mode is decrypt-time auth.
    let ciphertext_and_tag = cipher
        .encrypt(nonce, plaintext)
        .expect("AES-256-GCM encryption is infallible for valid keys/nonces");

    let mut out = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext_and_tag.len());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext_and_tag);
    out
}

/// Decrypts an envelope produced by [`encrypt`]. Fails with
/// [`Error::Malformed`] if `blob` is shorter than `salt + nonce + tag`
/// (44 bytes), or [`Error::BadAuth`] if the tag does not verify.
pub fn decrypt(password: &[u8], blob: &[u8]) -> Result<Vec<u8>> {
    if blob.len() < MIN_ENVELOPE_LEN {
        return Err(Error::Malformed(format!(
            "encrypted blob is {} bytes, need at least {MIN_ENVELOPE_LEN}",
            blob.len()
        )));
    }

    let salt: [u8; SALT_LEN] = blob[..SALT_LEN].try_into().unwrap();
    let nonce_bytes = &blob[SALT_LEN..SALT_LEN + NONCE_LEN];
    let ciphertext_and_tag = &blob[SALT_LEN + NONCE_LEN..];

    let key = derive_key(password, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext_and_tag)
        .map_err(|_| Error::BadAuth)
}
