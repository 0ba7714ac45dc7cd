//! # stegvid
//!
//! LSB steganography core: hide an AES-256-GCM encrypted secret (with
//! optional Reed-Solomon forward error correction) in the least-significant
//! bits of raster image pixels or uncompressed video frames.
//!
//! This crate covers the bit-level embed/extract pipeline only. Image
//! decode/encode is delegated to the `image` crate; video decode/encode to
//! an external `ffmpeg`/`ffprobe` pair behind the [`carrier::video::VideoSource`]
//! and [`carrier::writer::VideoWriter`] seams. A GUI or CLI front-end is
//! expected to call [`api::embed_image`]/[`api::embed_video_streaming`] and
//! their `extract_*` counterparts directly; none is built here.
//!
//! ## Quick Start
//!
//! ### Embedding a message in an image
//!
//! ```rust,no_run
//! use stegvid::{Password, EmbedOptions, Result};
//! use std::path::Path;
//!
//! fn main() -> Result<()> {
//!     let password = Password::new("correct horse battery staple");
//!     stegvid::embed_image(
//!         Path::new("cover.png"),
//!         Path::new("stego.png"),
//!         b"meet at the old pier, midnight",
//!         &password,
//!         &EmbedOptions::new().lsb(1).spread(true),
//!         None,
//!     )?;
//!     Ok(())
//! }
//! ```
//!
//! ### Recovering it
//!
//! ```rust,no_run
//! use stegvid::{Password, ExtractOptions, Result};
//! use std::path::Path;
//!
//! fn main() -> Result<()> {
//!     let password = Password::new("correct horse battery staple");
//!     let (secret, meta) = stegvid::extract_image(
//!         Path::new("stego.png"),
//!         &password,
//!         &ExtractOptions::new().lsb(1).spread(true),
//!         None,
//!     )?;
//!     println!("recovered {} bytes, filename = {:?}", secret.len(), meta.filename);
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming video
//!
//! Video embed/extract never holds more than one chunk of frames in memory
//! at a time; see [`EmbedOptions::chunk_frames`] to tune chunk size.
//!
//! ```rust,no_run
//! use stegvid::{Password, EmbedOptions, Result};
//! use std::path::Path;
//!
//! fn main() -> Result<()> {
//!     let password = Password::new("hunter2");
//!     stegvid::embed_video_streaming(
//!         Path::new("cover.mp4"),
//!         Path::new("stego.mkv"),
//!         b"the launch codes are in the usual place",
//!         &password,
//!         &EmbedOptions::new().chunk_frames(90).ecc(10),
//!         None,
//!     )?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`:
//!
//! ```rust,no_run
//! use stegvid::Error;
//!
//! fn report(err: Error) {
//!     match err {
//!         Error::BadAuth => eprintln!("wrong password or tampered artifact"),
//!         Error::Capacity { needed, available } => {
//!             eprintln!("payload needs {needed} bits, carrier has {available}")
//!         }
//!         other => eprintln!("{other}"),
//!     }
//! }
//! ```
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod api;
pub mod bits;
pub mod carrier;
pub mod crypto;
pub mod dispatch;
pub mod ecc;
pub mod error;
pub mod payload;
pub mod permute;
pub mod progress;

pub use api::{
    build_payload, embed_image, embed_video_streaming, extract_image, extract_video_streaming,
    parse_payload, EmbedOptions, ExtractOptions,
};
pub use crypto::Password;
pub use dispatch::{carrier_kind_for_path, CarrierKind};
pub use error::{Error, Result};
pub use payload::PayloadMeta;
pub use progress::ProgressFn;
