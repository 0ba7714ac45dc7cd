//! Password handling and the AES-256-GCM payload envelope.
//!
//! This module covers component C3 of the design: a [`Password`] wrapper
//! that keeps key material out of `Debug` output and zeroes it on drop, and
//! [`envelope::encrypt`]/[`envelope::decrypt`], the PBKDF2 + AES-GCM
//! envelope that [`crate::payload`] wraps in the transport header.

pub mod envelope;
mod password;

pub use password::Password;
