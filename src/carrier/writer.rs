//! Lossless writer (C8): accumulate RGB frames and emit a lossless video
//! file.
//!
//! The primary backend stages frames as PNGs in a temp directory and muxes
//! them with an external `ffmpeg` binary: FFV1 level 3 with `-slicecrc 1`,
//! `rgb24` pixel format, and keyframe cadence 1, or lossless RGB H.264 via
//! `libx264rgb` with the same pixel format and cadence — the same flags the
//! source material uses. `libx264rgb` output forces a `.mkv` extension
//! regardless of the caller's requested path, since most other containers
//! reject it. When `ffmpeg` is not on `PATH`, [`RawLosslessWriter`] falls back to a
//! small deflate-compressed raw-frame container of our own — unlike the
//! MJPEG fallback this design supersedes, this path is genuinely lossless,
//! since `MJPEG` re-quantizes every frame and would silently corrupt the
//! embedded bits.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use image::{ImageBuffer, Rgb};

use crate::error::{Error, Result};

/// Lossless codec choice for the `ffmpeg` backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// FFV1 level 3: large but robust across ffmpeg builds.
    Ffv1,
    /// Lossless RGB H.264 via `libx264rgb`; much smaller, needs that encoder.
    H264Rgb,
}

/// Magic identifying the raw fallback container.
const RAW_MAGIC: &[u8; 7] = b"STVRAW1";

/// Accepts RGB frames one at a time and assembles them into a video file on
/// [`finish`](VideoWriter::finish).
pub trait VideoWriter {
    /// Stages one `width * height * 3`-byte RGB frame.
    fn write_frame(&mut self, width: u32, height: u32, rgb: &[u8]) -> Result<()>;
    /// Finalizes the output file. Consumes `self` since most backends need
    /// to run an external process or flush a trailing compressed block.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Returns true if an `ffmpeg` binary is reachable on `PATH`.
pub fn ffmpeg_available() -> bool {
    which_ffmpeg().is_some()
}

fn which_ffmpeg() -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        let candidate = dir.join("ffmpeg");
        candidate.is_file().then_some(candidate)
    })
}

/// Stages PNG frames in a temp directory and muxes them with `ffmpeg` on
/// [`finish`](VideoWriter::finish).
pub struct FfmpegWriter {
    out_path: PathBuf,
    fps: f64,
    codec: Codec,
    staging_dir: tempfile::TempDir,
    frame_count: u64,
}

impl FfmpegWriter {
    pub fn new(out_path: &Path, fps: f64, codec: Codec) -> Result<Self> {
        let staging_dir = tempfile::Builder::new()
            .prefix("stegvid_frames_")
            .tempdir()
            .map_err(Error::Io)?;
        // libx264rgb cannot mux into most container formats a caller might
        // have named (e.g. .mp4); force .mkv, same as the original writer.
        let out_path = if codec == Codec::H264Rgb && out_path.extension().and_then(|e| e.to_str()) != Some("mkv") {
            out_path.with_extension("mkv")
        } else {
            out_path.to_path_buf()
        };
        Ok(Self {
            out_path,
            fps,
            codec,
            staging_dir,
            frame_count: 0,
        })
    }
}

impl VideoWriter for FfmpegWriter {
    fn write_frame(&mut self, width: u32, height: u32, rgb: &[u8]) -> Result<()> {
        let frame_path = self
            .staging_dir
            .path()
            .join(format!("frame_{:06}.png", self.frame_count));
        let buf: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, rgb.to_vec())
            .ok_or_else(|| Error::Codec("frame buffer size mismatch".into()))?;
        buf.save_with_format(&frame_path, image::ImageFormat::Png)
            .map_err(|e| Error::Codec(format!("failed to stage frame {}: {e}", self.frame_count)))?;
        self.frame_count += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let input_pattern = self.staging_dir.path().join("frame_%06d.png");
        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-y")
            .arg("-framerate")
            .arg(self.fps.to_string())
            .arg("-i")
            .arg(&input_pattern);
        match self.codec {
            Codec::H264Rgb => {
                cmd.args([
                    "-c:v", "libx264rgb", "-crf", "0", "-preset", "veryslow", "-pix_fmt", "rgb24", "-g", "1",
                ]);
            }
            Codec::Ffv1 => {
                cmd.args([
                    "-c:v", "ffv1", "-level", "3", "-slicecrc", "1", "-pix_fmt", "rgb24", "-g", "1",
                ]);
            }
        }
        cmd.arg(&self.out_path);

        let status = cmd
            .status()
            .map_err(|e| Error::Codec(format!("failed to spawn ffmpeg: {e}")))?;
        if !status.success() {
            return Err(Error::Codec(format!("ffmpeg exited with {status}")));
        }
        log::debug!(
            "muxed {} frames into {} via ffmpeg ({:?})",
            self.frame_count,
            self.out_path.display(),
            self.codec
        );
        Ok(())
    }
}

/// Fallback writer used when `ffmpeg` is unavailable: header fields followed
/// by a deflate-compressed stream of concatenated raw RGB frames.
///
/// Layout: `MAGIC(7) || VERSION(1) || WIDTH(4 BE) || HEIGHT(4 BE) ||
/// FPS_BITS(8 BE, f64::to_bits) || FRAME_COUNT(8 BE) ||
/// deflate(frame_0 || frame_1 || ...)`.
pub struct RawLosslessWriter {
    encoder: DeflateEncoder<BufWriter<File>>,
    width: u32,
    height: u32,
    frame_count: u64,
}

impl RawLosslessWriter {
    pub fn new(out_path: &Path, width: u32, height: u32, fps: f64) -> Result<Self> {
        let mut writer = BufWriter::new(File::create(out_path).map_err(Error::Io)?);
        writer.write_all(RAW_MAGIC).map_err(Error::Io)?;
        writer.write_all(&[1u8]).map_err(Error::Io)?;
        writer.write_all(&width.to_be_bytes()).map_err(Error::Io)?;
        writer.write_all(&height.to_be_bytes()).map_err(Error::Io)?;
        writer.write_all(&fps.to_bits().to_be_bytes()).map_err(Error::Io)?;
        // Frame count is unknown up front; reserved placeholder, patched nowhere
        // (the reader instead relies on the deflate stream's natural end).
        writer.write_all(&0u64.to_be_bytes()).map_err(Error::Io)?;

        Ok(Self {
            encoder: DeflateEncoder::new(writer, Compression::default()),
            width,
            height,
            frame_count: 0,
        })
    }
}

impl VideoWriter for RawLosslessWriter {
    fn write_frame(&mut self, width: u32, height: u32, rgb: &[u8]) -> Result<()> {
        if width != self.width || height != self.height {
            return Err(Error::Codec(format!(
                "frame {}x{} does not match stream dimensions {}x{}",
                width, height, self.width, self.height
            )));
        }
        self.encoder.write_all(rgb).map_err(Error::Io)?;
        self.frame_count += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        self.encoder.finish().map_err(Error::Io)?;
        log::debug!(
            "wrote {} raw lossless frames ({}x{}) via deflate fallback",
            self.frame_count,
            self.width,
            self.height
        );
        Ok(())
    }
}

/// Reads back a container produced by [`RawLosslessWriter`]. Used when
/// `ffmpeg` is unavailable for both [`super::verify`] and a later extract
/// pass over a fallback-written artifact.
pub struct RawLosslessReader {
    decoder: DeflateDecoder<BufReader<File>>,
    frame_len: usize,
}

impl RawLosslessReader {
    pub fn open(path: &Path) -> Result<(Self, u32, u32, f64)> {
        let mut reader = BufReader::new(File::open(path).map_err(Error::Io)?);
        let mut magic = [0u8; 7];
        reader.read_exact(&mut magic).map_err(Error::Io)?;
        if &magic != RAW_MAGIC {
            return Err(Error::Codec("not a raw lossless fallback container".into()));
        }
        let mut version = [0u8; 1];
        reader.read_exact(&mut version).map_err(Error::Io)?;

        let mut field = [0u8; 4];
        reader.read_exact(&mut field).map_err(Error::Io)?;
        let width = u32::from_be_bytes(field);
        reader.read_exact(&mut field).map_err(Error::Io)?;
        let height = u32::from_be_bytes(field);

        let mut field8 = [0u8; 8];
        reader.read_exact(&mut field8).map_err(Error::Io)?;
        let fps = f64::from_bits(u64::from_be_bytes(field8));
        reader.read_exact(&mut field8).map_err(Error::Io)?; // reserved frame count

        let frame_len = width as usize * height as usize * 3;
        Ok((
            Self {
                decoder: DeflateDecoder::new(reader),
                frame_len,
            },
            width,
            height,
            fps,
        ))
    }

    /// Reads the next frame, or `None` at end of stream.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let mut frame = vec![0u8; self.frame_len];
        match self.decoder.read_exact(&mut frame) {
            Ok(()) => Ok(Some(frame)),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// Adapts [`RawLosslessReader`] to the [`super::video::VideoSource`] seam so
/// [`super::verify::verify_video_embed`] can reopen a fallback-written
/// artifact the same way it reopens an `ffmpeg`-muxed one.
pub struct RawLosslessSource {
    reader: RawLosslessReader,
    width: u32,
    height: u32,
    fps: f64,
}

impl RawLosslessSource {
    pub fn open(path: &Path) -> Result<Self> {
        let (reader, width, height, fps) = RawLosslessReader::open(path)?;
        Ok(Self { reader, width, height, fps })
    }
}

impl super::video::VideoSource for RawLosslessSource {
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn fps(&self) -> f64 {
        self.fps
    }
    fn total_frames(&self) -> Option<u64> {
        None
    }
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        self.reader.next_frame()
    }
}
