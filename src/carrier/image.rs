//! Image carrier (C6): embed/extract over a flat RGB pixel byte array.
//!
//! Cover images are decoded to a 3-channel RGB byte buffer via the `image`
//! crate; the buffer is then addressed through [`super::read_slot`] /
//! [`super::write_slot`] exactly like every other carrier. Output is always
//! re-encoded as PNG, since that is the only lossless format this crate asks
//! `image` to write — an input with a different extension is silently
//! upgraded to PNG on save, per the specification.

use std::path::Path;

use image::{ImageBuffer, Rgb};

use crate::error::{Error, Result};
use crate::payload::{self, PayloadMeta, PRELUDE_BITS};
use crate::progress::{Cadence, ProgressFn, IMAGE_PROGRESS_STRIDE_BITS};

use super::{autodetect_lsb, read_sequential_bytes, slot_count, write_payload_bits};

/// Embeds `payload` into the cover image at `in_path`, writing the result to
/// `out_path` as PNG.
///
/// `spread` selects the permuted-tail layout (§4.2) over the identity
/// layout; disabling it is mostly useful for tests and debugging, since it
/// concentrates all body bits in the first rows of the image.
///
/// # Errors
///
/// [`Error::Capacity`] if the payload does not fit at the chosen `lsb`.
/// [`Error::Codec`] if the cover cannot be decoded or the output cannot be
/// written.
pub fn embed_image(
    in_path: &Path,
    out_path: &Path,
    payload: &[u8],
    password: &[u8],
    lsb: u8,
    spread: bool,
    mut progress: Option<ProgressFn<'_>>,
) -> Result<()> {
    let img = image::open(in_path)
        .map_err(|e| Error::Codec(format!("failed to decode cover image: {e}")))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    let mut buf = img.into_raw();

    let total_slots = slot_count(buf.len(), lsb);
    let needed = (payload.len() * 8) as u64;
    if needed > total_slots as u64 {
        return Err(Error::Capacity {
            needed,
            available: total_slots as u64,
        });
    }

    let salt = &payload[payload::HEADER_LEN..payload::HEADER_LEN + payload::SALT_LEN];
    let seed = payload::body_permutation_seed(password, salt);
    let body_bits = needed as usize - PRELUDE_BITS;
    let region = total_slots - PRELUDE_BITS;
    let idxs = payload::body_indices(region, &seed, body_bits, spread);

    write_payload_bits(&mut buf, lsb, payload, &idxs)?;

    if let Some(cb) = progress.as_mut() {
        let mut cadence = Cadence::new(IMAGE_PROGRESS_STRIDE_BITS);
        cadence.report(needed, needed, cb);
    }

    let image_buf: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, buf)
        .ok_or_else(|| Error::Codec("stego pixel buffer size mismatch".into()))?;
    image_buf
        .save_with_format(out_path, image::ImageFormat::Png)
        .map_err(|e| Error::Codec(format!("failed to write stego PNG: {e}")))?;

    log::debug!(
        "embedded {} payload bytes into {} at lsb={lsb} spread={spread}",
        payload.len(),
        out_path.display()
    );
    Ok(())
}

/// Extracts and parses a payload previously embedded by [`embed_image`].
///
/// `lsb` is the declared density to try first; the remaining densities in
/// `{1, 2, 3}` are tried in order until one yields a valid `MAGIC`.
pub fn extract_image(
    in_path: &Path,
    password: &[u8],
    use_ecc: bool,
    nsym: u8,
    lsb: u8,
    spread: bool,
    mut progress: Option<ProgressFn<'_>>,
) -> Result<(Vec<u8>, PayloadMeta)> {
    let img = image::open(in_path)
        .map_err(|e| Error::Codec(format!("failed to decode stego image: {e}")))?
        .to_rgb8();
    let buf = img.into_raw();

    let (detected_lsb, header_and_salt) = autodetect_lsb(&buf, lsb)?;
    let total_slots = slot_count(buf.len(), detected_lsb);

    let len = u64::from_be_bytes(header_and_salt[8..16].try_into().unwrap()) as usize;
    let total_payload_bits = 8 * (payload::HEADER_LEN + len);
    if total_payload_bits as u64 > total_slots as u64 {
        return Err(Error::Capacity {
            needed: total_payload_bits as u64,
            available: total_slots as u64,
        });
    }
    let body_bits = total_payload_bits - PRELUDE_BITS;

    let salt = &header_and_salt[payload::HEADER_LEN..payload::HEADER_LEN + payload::SALT_LEN];
    let seed = payload::body_permutation_seed(password, salt);
    let region = total_slots - PRELUDE_BITS;
    let idxs = payload::body_indices(region, &seed, body_bits, spread);

    let body_bit_values: Vec<u8> = idxs
        .iter()
        .map(|&i| super::read_slot(&buf, PRELUDE_BITS + i, detected_lsb))
        .collect();
    let body_bytes = crate::bits::bits_to_bytes(&body_bit_values);

    let mut payload_bytes = header_and_salt.clone();
    payload_bytes.extend_from_slice(&body_bytes);

    if let Some(cb) = progress.as_mut() {
        let mut cadence = Cadence::new(IMAGE_PROGRESS_STRIDE_BITS);
        cadence.report(total_payload_bits as u64, total_payload_bits as u64, cb);
    }

    log::debug!(
        "extracted {len}-byte blob from {} at detected lsb={detected_lsb}",
        in_path.display()
    );
    payload::parse(&payload_bytes, password, use_ecc, nsym)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_cover(path: &Path, width: u32, height: u32) {
        let mut buf = vec![0u8; (width * height * 3) as usize];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = (i * 37 % 256) as u8;
        }
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, buf).unwrap();
        img.save_with_format(path, image::ImageFormat::Png).unwrap();
    }

    #[test]
    fn embed_then_extract_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cover = dir.path().join("cover.png");
        let stego = dir.path().join("stego.png");
        write_cover(&cover, 64, 64);

        let payload = payload::build(b"a small secret", b"correct horse", false, 0, None).unwrap();
        embed_image(&cover, &stego, &payload, b"correct horse", 1, true, None).unwrap();

        let (body, meta) = extract_image(&stego, b"correct horse", false, 0, 1, true, None).unwrap();
        assert_eq!(body, b"a small secret");
        assert_eq!(meta.filename, None);
    }

    #[test]
    fn extract_autodetects_lsb_when_declared_is_wrong() {
        let dir = tempfile::tempdir().unwrap();
        let cover = dir.path().join("cover.png");
        let stego = dir.path().join("stego.png");
        write_cover(&cover, 64, 64);

        let payload = payload::build(b"short", b"pw", false, 0, None).unwrap();
        embed_image(&cover, &stego, &payload, b"pw", 2, true, None).unwrap();

        // Declare lsb=1, the wrong density; autodetect should still find lsb=2.
        let (body, _) = extract_image(&stego, b"pw", false, 0, 1, true, None).unwrap();
        assert_eq!(body, b"short");
    }

    #[test]
    fn capacity_error_on_oversized_payload() {
        let dir = tempfile::tempdir().unwrap();
        let cover = dir.path().join("cover.png");
        let stego = dir.path().join("stego.png");
        write_cover(&cover, 8, 8);

        let huge_secret = vec![0xAB; 10_000];
        let payload = payload::build(&huge_secret, b"pw", false, 0, None).unwrap();
        let err = embed_image(&cover, &stego, &payload, b"pw", 1, true, None).unwrap_err();
        assert!(matches!(err, Error::Capacity { .. }));
    }

    #[test]
    fn wrong_password_fails_auth_on_extract() {
        let dir = tempfile::tempdir().unwrap();
        let cover = dir.path().join("cover.png");
        let stego = dir.path().join("stego.png");
        write_cover(&cover, 64, 64);

        let payload = payload::build(b"protect me", b"right", false, 0, None).unwrap();
        embed_image(&cover, &stego, &payload, b"right", 1, true, None).unwrap();

        let err = extract_image(&stego, b"wrong", false, 0, 1, true, None).unwrap_err();
        assert!(matches!(err, Error::BadAuth));
    }

    #[test]
    fn non_spread_layout_also_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cover = dir.path().join("cover.png");
        let stego = dir.path().join("stego.png");
        write_cover(&cover, 64, 64);

        let payload = payload::build(b"sequential body", b"pw", false, 0, None).unwrap();
        embed_image(&cover, &stego, &payload, b"pw", 1, false, None).unwrap();

        let (body, _) = extract_image(&stego, b"pw", false, 0, 1, false, None).unwrap();
        assert_eq!(body, b"sequential body");
    }

    #[test]
    fn embed_reports_progress_completion() {
        let dir = tempfile::tempdir().unwrap();
        let cover = dir.path().join("cover.png");
        let stego = dir.path().join("stego.png");
        write_cover(&cover, 32, 32);

        let payload = payload::build(b"progress check", b"pw", false, 0, None).unwrap();
        let mut seen = Vec::new();
        let cb: ProgressFn<'_> = Box::new(|d, t| seen.push((d, t)));
        embed_image(&cover, &stego, &payload, b"pw", 1, true, Some(cb)).unwrap();

        assert_eq!(seen.last().map(|&(d, t)| d == t), Some(true));
        let _ = std::io::stdout().flush();
    }
}
