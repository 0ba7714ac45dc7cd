//! Frontend adapter (C10): the thin public API surface a GUI/CLI would call.
//!
//! Every knob the specification recognizes (`lsb`, `spread`, `use_ecc`,
//! `nsym`, `chunk_frames`, `codec`, an optional embedded filename) lives on
//! [`EmbedOptions`]/[`ExtractOptions`], builder structs in the style of
//! `zesven::streaming::StreamingConfig`, rather than as long positional
//! parameter lists. This keeps the surface stable as options grow.

use std::path::Path;

use crate::carrier::video::{FfmpegVideoSource, VideoSource, DEFAULT_CHUNK_FRAMES};
use crate::carrier::writer::{ffmpeg_available, Codec, FfmpegWriter, RawLosslessSource, RawLosslessWriter, VideoWriter};
use crate::carrier::{image, verify, video};
use crate::crypto::Password;
use crate::error::Result;
use crate::payload::{self, PayloadMeta};
use crate::progress::ProgressFn;

/// Options governing an embed operation. Defaults match the specification's
/// documented defaults: `lsb = 1`, `spread = true`, ECC disabled, `ffv1`
/// codec, `chunk_frames = 90`.
#[derive(Debug, Clone)]
pub struct EmbedOptions {
    lsb: u8,
    spread: bool,
    use_ecc: bool,
    nsym: u8,
    orig_name: Option<String>,
    chunk_frames: usize,
    codec: Codec,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            lsb: 1,
            spread: true,
            use_ecc: false,
            nsym: 0,
            orig_name: None,
            chunk_frames: DEFAULT_CHUNK_FRAMES,
            codec: Codec::Ffv1,
        }
    }
}

impl EmbedOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// LSB density in `{1, 2, 3}`.
    pub fn lsb(mut self, lsb: u8) -> Self {
        self.lsb = lsb;
        self
    }

    /// Whether the body region is written under the keyed permutation
    /// (`true`, the default) or sequentially (`false`).
    pub fn spread(mut self, spread: bool) -> Self {
        self.spread = spread;
        self
    }

    /// Enables Reed-Solomon protection of the secret body with `nsym` parity
    /// bytes per block.
    pub fn ecc(mut self, nsym: u8) -> Self {
        self.use_ecc = true;
        self.nsym = nsym;
        self
    }

    /// Embeds `name` as the inner frame's filename metadata.
    pub fn orig_name(mut self, name: impl Into<String>) -> Self {
        self.orig_name = Some(name.into());
        self
    }

    /// Frames processed per streaming video chunk (default 90).
    pub fn chunk_frames(mut self, chunk_frames: usize) -> Self {
        self.chunk_frames = chunk_frames.max(1);
        self
    }

    /// Lossless video codec to request from the `ffmpeg` backend.
    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }
}

/// Options governing an extract operation.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    lsb: u8,
    spread: bool,
    use_ecc: bool,
    nsym: u8,
    chunk_frames: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            lsb: 1,
            spread: true,
            use_ecc: false,
            nsym: 0,
            chunk_frames: DEFAULT_CHUNK_FRAMES,
        }
    }
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lsb(mut self, lsb: u8) -> Self {
        self.lsb = lsb;
        self
    }

    pub fn spread(mut self, spread: bool) -> Self {
        self.spread = spread;
        self
    }

    /// Declares that the embedded body was Reed-Solomon protected with
    /// `nsym` parity bytes per block.
    pub fn ecc(mut self, nsym: u8) -> Self {
        self.use_ecc = true;
        self.nsym = nsym;
        self
    }

    pub fn chunk_frames(mut self, chunk_frames: usize) -> Self {
        self.chunk_frames = chunk_frames.max(1);
        self
    }
}

/// Builds the transport payload, embeds it into the cover image at
/// `in_path`, and writes the result to `out_path` as PNG.
pub fn embed_image(
    in_path: &Path,
    out_path: &Path,
    secret: &[u8],
    password: &Password,
    opts: &EmbedOptions,
    progress: Option<ProgressFn<'_>>,
) -> Result<()> {
    let payload = payload::build(
        secret,
        password.as_bytes(),
        opts.use_ecc,
        opts.nsym,
        opts.orig_name.as_deref(),
    )?;
    image::embed_image(in_path, out_path, &payload, password.as_bytes(), opts.lsb, opts.spread, progress)
}

/// Extracts and parses a payload previously embedded by [`embed_image`].
pub fn extract_image(
    in_path: &Path,
    password: &Password,
    opts: &ExtractOptions,
    progress: Option<ProgressFn<'_>>,
) -> Result<(Vec<u8>, PayloadMeta)> {
    image::extract_image(
        in_path,
        password.as_bytes(),
        opts.use_ecc,
        opts.nsym,
        opts.lsb,
        opts.spread,
        progress,
    )
}

/// Builds the transport payload, embeds it into the source video at
/// `in_path` via the streaming state machine, and writes the result to
/// `out_path`. Runs the C9 post-embed verification before returning.
///
/// Uses `ffmpeg` to decode the source and mux the output when it is on
/// `PATH`; otherwise falls back to [`RawLosslessWriter`]/[`RawLosslessSource`]
/// for both output and verification.
pub fn embed_video_streaming(
    in_path: &Path,
    out_path: &Path,
    secret: &[u8],
    password: &Password,
    opts: &EmbedOptions,
    progress: Option<ProgressFn<'_>>,
) -> Result<()> {
    let payload = payload::build(
        secret,
        password.as_bytes(),
        opts.use_ecc,
        opts.nsym,
        opts.orig_name.as_deref(),
    )?;

    let mut source = FfmpegVideoSource::open(in_path)?;
    let (width, height, fps) = (source.width(), source.height(), source.fps());

    let use_ffmpeg_writer = ffmpeg_available();
    let writer: Box<dyn VideoWriter> = if use_ffmpeg_writer {
        Box::new(FfmpegWriter::new(out_path, fps, opts.codec)?)
    } else {
        log::warn!("ffmpeg not found on PATH; writing the raw lossless fallback container instead");
        Box::new(RawLosslessWriter::new(out_path, width, height, fps)?)
    };

    video::embed_video_streaming(
        &mut source,
        writer,
        &payload,
        password.as_bytes(),
        opts.lsb,
        opts.spread,
        opts.chunk_frames,
        progress,
    )?;
    drop(source);

    if use_ffmpeg_writer {
        let mut verify_source = FfmpegVideoSource::open(out_path)?;
        verify::verify_video_embed(&mut verify_source, opts.lsb)
    } else {
        let mut verify_source = RawLosslessSource::open(out_path)?;
        verify::verify_video_embed(&mut verify_source, opts.lsb)
    }
}

/// Extracts and parses a payload previously embedded by
/// [`embed_video_streaming`]. Opens `in_path` via `ffmpeg` if it decodes
/// successfully as a standard container, otherwise tries the raw lossless
/// fallback container format.
pub fn extract_video_streaming(
    in_path: &Path,
    password: &Password,
    opts: &ExtractOptions,
    progress: Option<ProgressFn<'_>>,
) -> Result<(Vec<u8>, PayloadMeta)> {
    let payload_bytes = match FfmpegVideoSource::open(in_path) {
        Ok(mut source) => video::extract_video_streaming(
            &mut source,
            password.as_bytes(),
            opts.lsb,
            opts.spread,
            opts.chunk_frames,
            progress,
        )?,
        Err(_) => {
            let mut source = RawLosslessSource::open(in_path)?;
            video::extract_video_streaming(
                &mut source,
                password.as_bytes(),
                opts.lsb,
                opts.spread,
                opts.chunk_frames,
                progress,
            )?
        }
    };

    payload::parse(&payload_bytes, password.as_bytes(), opts.use_ecc, opts.nsym)
}

/// Re-export of [`payload::build`] under the name the specification's
/// external-interface section uses.
pub fn build_payload(
    secret: &[u8],
    password: &[u8],
    use_ecc: bool,
    nsym: u8,
    orig_name: Option<&str>,
) -> Result<Vec<u8>> {
    payload::build(secret, password, use_ecc, nsym, orig_name)
}

/// Re-export of [`payload::parse`] under the name the specification's
/// external-interface section uses.
pub fn parse_payload(
    payload_bytes: &[u8],
    password: &[u8],
    use_ecc: bool,
    nsym: u8,
) -> Result<(Vec<u8>, PayloadMeta)> {
    payload::parse(payload_bytes, password, use_ecc, nsym)
}
