//! Error types for embedding and extracting steganographic payloads.
//!
//! This module provides the [`Error`] enum covering every failure mode
//! described in the payload, carrier, and ECC layers, along with a
//! convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`:
//!
//! ```rust,no_run
//! use stegvid::{Error, Result};
//!
//! fn handle(err: Error) {
//!     match err {
//!         Error::Capacity { needed, available } => {
//!             eprintln!("payload needs {needed} bits, carrier has {available}");
//!         }
//!         Error::BadAuth => eprintln!("wrong password or tampered artifact"),
//!         Error::BadMagic => eprintln!("not a recognized stego artifact"),
//!         other => eprintln!("{other}"),
//!     }
//! }
//! ```
//!
//! Per the policy in the specification: [`Error::Capacity`] and
//! [`Error::EccUnavailable`] are raised before any side effects occur.
//! [`Error::BadAuth`], [`Error::BadMagic`], [`Error::Truncated`],
//! [`Error::Malformed`], and [`Error::EccDecode`] are terminal during
//! extraction — no partial output is ever returned. [`Error::VerifyFailed`]
//! is terminal at the end of an embed and means the output artifact must not
//! be trusted.

use std::io;

/// The result type returned by every fallible operation in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible failure modes when embedding or extracting a stego payload.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The payload does not fit in the carrier at the chosen LSB density.
    ///
    /// Raised before any bytes are written (on embed) or before any
    /// decryption is attempted (on extract, once the declared length is
    /// known to overrun the carrier).
    #[error("payload needs {needed} bit-slots but only {available} are available")]
    Capacity {
        /// Bit-slots required by the payload.
        needed: u64,
        /// Bit-slots actually available in the carrier.
        available: u64,
    },

    /// The transport `MAGIC` was not found during extraction.
    ///
    /// This means the carrier is not a stego artifact produced by this
    /// format, the wrong LSB density was forced, or the header bits were
    /// corrupted.
    #[error("magic bytes not found (wrong artifact, wrong LSB density, or corruption)")]
    BadMagic,

    /// AES-GCM authentication failed while decrypting the payload.
    ///
    /// Returned for a wrong password or a tampered ciphertext/tag/nonce —
    /// the two are indistinguishable by design.
    #[error("authentication failed: wrong password or tampered artifact")]
    BadAuth,

    /// The carrier ended before the declared payload length was satisfied.
    #[error("carrier ended before the declared payload length was fully read")]
    Truncated,

    /// Header, salt, or inner-frame lengths are internally inconsistent.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// The caller requested Reed-Solomon ECC but the codec is unavailable.
    ///
    /// Occurs when the crate is built without the `ecc` feature.
    #[error("Reed-Solomon ECC requested but the codec is not available in this build")]
    EccUnavailable,

    /// Reed-Solomon could not correct the errors observed in the body.
    #[error("Reed-Solomon decode failed: too many errors to correct")]
    EccDecode,

    /// Post-embed verification could not recover `MAGIC` from the freshly
    /// written video artifact.
    ///
    /// Signals that the encoder path (external binary or fallback writer)
    /// did not preserve per-pixel bytes; the output file must not be
    /// trusted and the caller may delete it.
    #[error("post-embed verification failed: magic not recoverable from written artifact")]
    VerifyFailed,

    /// An image or video decode/encode backend failed.
    #[error("carrier codec error: {0}")]
    Codec(String),

    /// An underlying I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns true for errors that mean "try a different password or a
    /// different carrier", as opposed to programmer/configuration errors.
    pub fn is_recoverable_by_retry(&self) -> bool {
        matches!(self, Error::BadAuth | Error::BadMagic)
    }
}
