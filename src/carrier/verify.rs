//! Post-embed verification (C9).
//!
//! After `embed_video_streaming` writes an artifact, reopen it, read just
//! enough frames to cover the 320-bit prelude, and confirm `MAGIC` is still
//! recoverable. A failure here means the encoder path did not preserve
//! per-pixel bytes and the output must not be trusted.

use crate::error::{Error, Result};
use crate::payload::PRELUDE_BITS;

use super::video::VideoSource;

/// Reopens a freshly embedded video via `source` and confirms the prelude
/// still decodes to a valid `MAGIC`.
///
/// # Errors
///
/// [`Error::VerifyFailed`] if the prelude frames do not contain a
/// recoverable `MAGIC` at any LSB density.
pub fn verify_video_embed(source: &mut dyn VideoSource, lsb: u8) -> Result<()> {
    let slots_per_frame = source.slots_per_frame(lsb).max(1);
    let frames_needed = PRELUDE_BITS.div_ceil(slots_per_frame).max(1);

    let mut buf = Vec::new();
    for _ in 0..frames_needed {
        match source.next_frame()? {
            Some(frame) => buf.extend_from_slice(&frame),
            None => break,
        }
    }

    match super::autodetect_lsb(&buf, lsb) {
        Ok(_) => {
            log::debug!("post-embed verification succeeded");
            Ok(())
        }
        Err(_) => Err(Error::VerifyFailed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload;
    use std::collections::VecDeque;

    struct FakeSource {
        width: u32,
        height: u32,
        frames: VecDeque<Vec<u8>>,
    }

    impl VideoSource for FakeSource {
        fn width(&self) -> u32 {
            self.width
        }
        fn height(&self) -> u32 {
            self.height
        }
        fn fps(&self) -> f64 {
            30.0
        }
        fn total_frames(&self) -> Option<u64> {
            None
        }
        fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
            Ok(self.frames.pop_front())
        }
    }

    #[test]
    fn verify_succeeds_when_magic_is_recoverable() {
        let width = 32;
        let height = 32;
        let mut frame = vec![0u8; width as usize * height as usize * 3];

        let payload = payload::build(b"hi", b"pw", false, 0, None).unwrap();
        let bits = crate::bits::bytes_to_bits(&payload[..payload::HEADER_LEN + payload::SALT_LEN]);
        for (slot, &bit) in bits.iter().enumerate() {
            super::super::write_slot(&mut frame, slot, 1, bit);
        }

        let mut source = FakeSource {
            width,
            height,
            frames: VecDeque::from([frame]),
        };
        assert!(verify_video_embed(&mut source, 1).is_ok());
    }

    #[test]
    fn verify_fails_when_prelude_is_corrupted() {
        let width = 32;
        let height = 32;
        let frame = vec![0u8; width as usize * height as usize * 3];
        let mut source = FakeSource {
            width,
            height,
            frames: VecDeque::from([frame]),
        };
        assert!(matches!(verify_video_embed(&mut source, 1), Err(Error::VerifyFailed)));
    }
}
