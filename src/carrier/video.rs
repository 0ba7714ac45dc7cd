//! Video carrier (C7): streaming chunked embed/extract over sequential
//! frames.
//!
//! States per pass: `INIT -> PRELUDE -> BODY_CHUNK* -> CLOSE`. Frames never
//! accumulate beyond one chunk (`O(chunk_frames)` memory); the permutation
//! for body chunks is reseeded per chunk via [`crate::permute::chunk_seed`],
//! with `chunk_index` restarting at 0 on the first body chunk regardless of
//! how many frames the prelude consumed — mixing that up silently corrupts
//! payloads, per the specification's own warning.
//!
//! The state machine itself only depends on the [`VideoSource`] seam and
//! [`super::writer::VideoWriter`]; [`FfmpegVideoSource`] is the concrete
//! backend that decodes real video files via piped `ffmpeg`/`ffprobe`
//! processes.

use crate::error::{Error, Result};
use crate::payload::{self, PRELUDE_BITS};
use crate::permute;
use crate::progress::ProgressFn;

use super::writer::VideoWriter;

/// Default number of frames processed per body chunk.
pub const DEFAULT_CHUNK_FRAMES: usize = 90;

/// A source of decoded RGB video frames, read once in sequence.
///
/// Implementations own the decode process (e.g. a piped `ffmpeg` child);
/// `next_frame` returns `Ok(None)` at end of stream.
pub trait VideoSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn fps(&self) -> f64;
    /// Best-effort total frame count, when the source can report it upfront.
    fn total_frames(&self) -> Option<u64>;
    /// Reads and returns the next `width * height * 3`-byte RGB frame.
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>>;

    fn slots_per_frame(&self, lsb: u8) -> usize {
        self.width() as usize * self.height() as usize * 3 * lsb as usize
    }
}

/// Decodes a video file to raw RGB frames by piping `ffmpeg`'s `rawvideo`
/// output, with dimensions and frame rate probed via `ffprobe` up front.
pub struct FfmpegVideoSource {
    width: u32,
    height: u32,
    fps: f64,
    total_frames: Option<u64>,
    frame_len: usize,
    child: std::process::Child,
    stdout: std::io::BufReader<std::process::ChildStdout>,
}

impl FfmpegVideoSource {
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let probe = probe_stream(path)?;
        let frame_len = probe.width as usize * probe.height as usize * 3;

        let mut child = std::process::Command::new("ffmpeg")
            .arg("-i")
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| Error::Codec(format!("failed to spawn ffmpeg for decode: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Codec("ffmpeg decode process has no stdout pipe".into()))?;

        Ok(Self {
            width: probe.width,
            height: probe.height,
            fps: probe.fps,
            total_frames: probe.frame_count,
            frame_len,
            child,
            stdout: std::io::BufReader::new(stdout),
        })
    }
}

impl VideoSource for FfmpegVideoSource {
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
        self.total_frames
    }
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        use std::io::Read;
        let mut frame = vec![0u8; self.frame_len];
        match self.stdout.read_exact(&mut frame) {
            Ok(()) => Ok(Some(frame)),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

impl Drop for FfmpegVideoSource {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

struct StreamProbe {
    width: u32,
    height: u32,
    fps: f64,
    frame_count: Option<u64>,
}

fn probe_stream(path: &std::path::Path) -> Result<StreamProbe> {
    let output = std::process::Command::new("ffprobe")
        .args([
            "-v", "error",
            "-select_streams", "v:0",
            "-show_entries", "stream=width,height,r_frame_rate,nb_frames",
            "-of", "csv=p=0",
        ])
        .arg(path)
        .output()
        .map_err(|e| Error::Codec(format!("failed to spawn ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(Error::Codec(format!("ffprobe exited with {}", output.status)));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    let fields: Vec<&str> = text.trim().split(',').collect();
    if fields.len() < 3 {
        return Err(Error::Codec(format!("unexpected ffprobe output: {text}")));
    }

    let width: u32 = fields[0]
        .parse()
        .map_err(|_| Error::Codec(format!("could not parse stream width from {text}")))?;
    let height: u32 = fields[1]
        .parse()
        .map_err(|_| Error::Codec(format!("could not parse stream height from {text}")))?;
    let fps = parse_frame_rate(fields[2])?;
    let frame_count = fields.get(3).and_then(|s| s.trim().parse::<u64>().ok());

    Ok(StreamProbe { width, height, fps, frame_count })
}

fn parse_frame_rate(raw: &str) -> Result<f64> {
    if let Some((num, den)) = raw.split_once('/') {
        let num: f64 = num
            .parse()
            .map_err(|_| Error::Codec(format!("could not parse frame rate {raw}")))?;
        let den: f64 = den
            .parse()
            .map_err(|_| Error::Codec(format!("could not parse frame rate {raw}")))?;
        if den == 0.0 {
            return Ok(30.0);
        }
        Ok(num / den)
    } else {
        raw.parse()
            .map_err(|_| Error::Codec(format!("could not parse frame rate {raw}")))
    }
}

fn read_frames(source: &mut dyn VideoSource, n: usize) -> Result<Vec<Vec<u8>>> {
    let mut frames = Vec::with_capacity(n);
    for _ in 0..n {
        match source.next_frame()? {
            Some(frame) => frames.push(frame),
            None => break,
        }
    }
    Ok(frames)
}

fn slot_count_in(frames: &[Vec<u8>], lsb: u8) -> usize {
    frames.iter().map(|f| f.len() * lsb as usize).sum()
}

/// Reads a bit from a batch of stacked frames addressed as one flat slot
/// stream (frame 0's slots first, then frame 1's, ...).
fn read_batch_slot(frames: &[Vec<u8>], slot: usize, lsb: u8) -> u8 {
    let (frame, within_frame_slot) = locate(frames, slot, lsb);
    super::read_slot(&frames[frame], within_frame_slot, lsb)
}

fn write_batch_slot(frames: &mut [Vec<u8>], slot: usize, lsb: u8, bit: u8) {
    let (frame, within_frame_slot) = locate(frames, slot, lsb);
    super::write_slot(&mut frames[frame], within_frame_slot, lsb, bit);
}

/// Maps a flat slot index in a frame batch to `(frame_index,
/// slot_index_within_that_frame)`.
fn locate(frames: &[Vec<u8>], slot: usize, lsb: u8) -> (usize, usize) {
    let mut remaining = slot;
    for (i, frame) in frames.iter().enumerate() {
        let frame_slots = frame.len() * lsb as usize;
        if remaining < frame_slots {
            return (i, remaining);
        }
        remaining -= frame_slots;
    }
    panic!("slot {slot} out of range for frame batch");
}

/// Runs the full embed state machine against `source`, handing finished
/// frame batches to `writer`.
///
/// # Errors
///
/// [`Error::Capacity`] if the source does not have enough total slots.
/// Propagates whatever [`VideoWriter`] I/O errors occur.
#[allow(clippy::too_many_arguments)]
pub fn embed_video_streaming(
    source: &mut dyn VideoSource,
    mut writer: Box<dyn VideoWriter>,
    payload: &[u8],
    password: &[u8],
    lsb: u8,
    spread: bool,
    chunk_frames: usize,
    mut progress: Option<ProgressFn<'_>>,
) -> Result<()> {
    let width = source.width();
    let height = source.height();
    let slots_per_frame = source.slots_per_frame(lsb);
    let need_bits = payload.len() * 8;

    if let Some(total_frames) = source.total_frames() {
        let total_slots = total_frames as usize * slots_per_frame;
        if need_bits > total_slots {
            return Err(Error::Capacity {
                needed: need_bits as u64,
                available: total_slots as u64,
            });
        }
    }

    let bits = crate::bits::bytes_to_bits(payload);

    // PRELUDE
    let frames_for_prelude = PRELUDE_BITS.div_ceil(slots_per_frame).max(1);
    let mut batch = read_frames(source, frames_for_prelude)?;
    if batch.is_empty() {
        return Err(Error::Codec("source produced no frames".into()));
    }
    let batch_slots = slot_count_in(&batch, lsb);
    if batch_slots < PRELUDE_BITS {
        return Err(Error::Capacity {
            needed: PRELUDE_BITS as u64,
            available: batch_slots as u64,
        });
    }
    for (slot, &bit) in bits[..PRELUDE_BITS].iter().enumerate() {
        write_batch_slot(&mut batch, slot, lsb, bit);
    }
    for frame in &batch {
        writer.write_frame(width, height, frame)?;
    }
    let mut bit_idx = PRELUDE_BITS;
    if let Some(cb) = progress.as_mut() {
        cb(bit_idx as u64, need_bits as u64);
    }

    let salt = &payload[payload::HEADER_LEN..payload::HEADER_LEN + payload::SALT_LEN];
    let seed_base = payload::body_permutation_seed(password, salt);

    // BODY_CHUNK*
    let mut chunk_index: u64 = 0;
    while bit_idx < need_bits {
        let mut frames = read_frames(source, chunk_frames)?;
        if frames.is_empty() {
            break;
        }
        let chunk_slots = slot_count_in(&frames, lsb);
        let to_embed = chunk_slots.min(need_bits - bit_idx);

        if to_embed > 0 {
            let seed_c = permute::chunk_seed(&seed_base, chunk_index);
            let idxs = payload::body_indices(chunk_slots, &seed_c, to_embed, spread);
            for (i, &slot) in idxs.iter().enumerate() {
                write_batch_slot(&mut frames, slot, lsb, bits[bit_idx + i]);
            }
        }

        for frame in &frames {
            writer.write_frame(width, height, frame)?;
        }
        bit_idx += to_embed;
        chunk_index += 1;
        if let Some(cb) = progress.as_mut() {
            cb(bit_idx as u64, need_bits as u64);
        }
    }

    if bit_idx < need_bits {
        return Err(Error::Capacity {
            needed: need_bits as u64,
            available: bit_idx as u64,
        });
    }

    writer.finish()?;
    log::debug!("embedded {} payload bytes across {} chunk(s)", payload.len(), chunk_index);
    Ok(())
}

/// Runs the full extract state machine against `source`, returning the
/// reassembled transport payload bytes (header || salt || body), ready for
/// [`crate::payload::parse`].
///
/// `lsb` is only a hint: the prelude batch is run through the same LSB
/// auto-detect the image carrier uses, trying `lsb` first and then the
/// remaining candidates in `{1, 2, 3}`, and the detected density is locked
/// in for the salt and every body chunk that follows — mirroring the image
/// path and the original implementation's `tried = [lsb] + [...]` order.
pub fn extract_video_streaming(
    source: &mut dyn VideoSource,
    password: &[u8],
    lsb: u8,
    spread: bool,
    chunk_frames: usize,
    mut progress: Option<ProgressFn<'_>>,
) -> Result<Vec<u8>> {
    // Read enough frames to cover the prelude at the most conservative
    // density (lsb = 1, which packs the fewest bits per frame): this is an
    // upper bound on the frame count any candidate density could need, so
    // auto-detection below always has enough bytes regardless of which
    // density the embedder actually used.
    let worst_case_slots_per_frame = source.slots_per_frame(1).max(1);
    let max_frames_for_prelude = PRELUDE_BITS.div_ceil(worst_case_slots_per_frame).max(1);
    let batch = read_frames(source, max_frames_for_prelude)?;
    if batch.is_empty() {
        return Err(Error::Codec("source produced no frames".into()));
    }

    let flat: Vec<u8> = batch.iter().flat_map(|f| f.iter().copied()).collect();
    let (detected_lsb, header_and_salt) = super::autodetect_lsb(&flat, lsb)?;

    // The embedder only consumed as many prelude frames as its actual
    // density needed; any frames past that boundary already belong to the
    // first body chunk and must be carried forward, not discarded.
    let slots_per_frame = source.slots_per_frame(detected_lsb).max(1);
    let real_frames_for_prelude = PRELUDE_BITS.div_ceil(slots_per_frame).max(1);
    if real_frames_for_prelude > batch.len() {
        return Err(Error::Truncated);
    }

    let header = header_and_salt[..payload::HEADER_LEN].to_vec();
    let salt = header_and_salt[payload::HEADER_LEN..payload::HEADER_LEN + payload::SALT_LEN].to_vec();
    let len = u64::from_be_bytes(header[8..16].try_into().unwrap()) as usize;

    let mut remaining = 8 * len;
    if remaining < payload::SALT_LEN * 8 {
        return Err(Error::Malformed("declared length shorter than salt".into()));
    }
    remaining -= payload::SALT_LEN * 8;

    let total_bits = 8 * (payload::HEADER_LEN + len);
    let mut body_bits: Vec<u8> = Vec::with_capacity(remaining);

    let seed_base = payload::body_permutation_seed(password, &salt);
    let mut chunk_index: u64 = 0;
    if let Some(cb) = progress.as_mut() {
        cb(PRELUDE_BITS as u64, total_bits as u64);
    }

    let mut pending: Vec<Vec<u8>> = batch[real_frames_for_prelude..].to_vec();

    while remaining > 0 {
        while pending.len() < chunk_frames {
            match source.next_frame()? {
                Some(frame) => pending.push(frame),
                None => break,
            }
        }
        if pending.is_empty() {
            return Err(Error::Truncated);
        }
        let take_frames = pending.len().min(chunk_frames);
        let frames: Vec<Vec<u8>> = pending.drain(..take_frames).collect();

        let chunk_slots = slot_count_in(&frames, detected_lsb);
        let take = remaining.min(chunk_slots);

        let seed_c = permute::chunk_seed(&seed_base, chunk_index);
        let idxs = payload::body_indices(chunk_slots, &seed_c, take, spread);
        for &slot in &idxs {
            body_bits.push(read_batch_slot(&frames, slot, detected_lsb));
        }

        remaining -= take;
        chunk_index += 1;
        if let Some(cb) = progress.as_mut() {
            cb((total_bits - remaining) as u64, total_bits as u64);
        }
    }

    let mut payload_bytes = header;
    payload_bytes.extend_from_slice(&salt);
    payload_bytes.extend_from_slice(&crate::bits::bits_to_bytes(&body_bits));
    Ok(payload_bytes)
}
