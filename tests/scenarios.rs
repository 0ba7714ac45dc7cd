//! End-to-end embed/extract scenarios across the image and video carriers.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use image::{ImageBuffer, Rgb};
use stegvid::carrier::video::{embed_video_streaming, extract_video_streaming, VideoSource};
use stegvid::carrier::writer::VideoWriter;
use stegvid::error::Error;
use stegvid::payload;
use stegvid::{EmbedOptions, ExtractOptions, Password};

fn write_cover_png(path: &std::path::Path, width: u32, height: u32) {
    let buf: Vec<u8> = (0..(width as usize * height as usize * 3))
        .map(|i| ((i * 53 + 7) % 256) as u8)
        .collect();
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, buf).unwrap();
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

/// S1: 4x4 RGB cover, tiny secret, sequential layout, round-trips exactly.
#[test]
fn s1_small_image_sequential_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let cover = dir.path().join("cover.png");
    let stego = dir.path().join("stego.png");
    write_cover_png(&cover, 4, 4);

    let password = Password::new("pw");
    let opts = EmbedOptions::new().lsb(1).spread(false);
    stegvid::embed_image(&cover, &stego, b"hi", &password, &opts, None).unwrap();

    let extract_opts = ExtractOptions::new().lsb(1).spread(false);
    let (body, meta) = stegvid::extract_image(&stego, &password, &extract_opts, None).unwrap();
    assert_eq!(body, b"hi");
    assert_eq!(meta.filename, None);
}

/// S2: same tiny cover, a secret too large for its capacity at lsb=1 fails closed.
#[test]
fn s2_oversized_secret_is_capacity_error() {
    let dir = tempfile::tempdir().unwrap();
    let cover = dir.path().join("cover.png");
    let stego = dir.path().join("stego.png");
    write_cover_png(&cover, 4, 4);

    let password = Password::new("pw");
    let opts = EmbedOptions::new().lsb(1).spread(false);
    let err = stegvid::embed_image(&cover, &stego, b"hello world", &password, &opts, None).unwrap_err();
    assert!(matches!(err, Error::Capacity { .. }));
}

/// S3: larger cover, filename metadata, spread layout, ECC off.
#[test]
fn s3_large_secret_with_filename_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let cover = dir.path().join("cover.png");
    let stego = dir.path().join("stego.png");
    write_cover_png(&cover, 256, 256);

    let secret: Vec<u8> = (0..10_000u32).map(|i| (i * 31 % 256) as u8).collect();
    let password = Password::new("s3cret");
    let opts = EmbedOptions::new().lsb(2).spread(true).orig_name("x.bin");
    stegvid::embed_image(&cover, &stego, &secret, &password, &opts, None).unwrap();

    let extract_opts = ExtractOptions::new().lsb(2).spread(true);
    let (body, meta) = stegvid::extract_image(&stego, &password, &extract_opts, None).unwrap();
    assert_eq!(body, secret);
    assert_eq!(meta.filename.as_deref(), Some("x.bin"));
}

/// S4: tampering with an encrypted ciphertext byte after S3-style embed surfaces BadAuth.
#[test]
fn s4_tampered_ciphertext_is_bad_auth() {
    let dir = tempfile::tempdir().unwrap();
    let cover = dir.path().join("cover.png");
    let stego = dir.path().join("stego.png");
    write_cover_png(&cover, 256, 256);

    let secret = vec![0x42u8; 5_000];
    let password = Password::new("s3cret");
    let opts = EmbedOptions::new().lsb(2).spread(true);
    stegvid::embed_image(&cover, &stego, &secret, &password, &opts, None).unwrap();

    // Flip one LSB well past the prelude, in the permuted body region: this
    // lands inside the ciphertext with overwhelming probability and must
    // surface as an authentication failure, never a silent corruption.
    let img = image::open(&stego).unwrap().to_rgb8();
    let (width, height) = img.dimensions();
    let mut buf = img.into_raw();
    let flip_byte = buf.len() / 2;
    buf[flip_byte] ^= 0x01;
    let tampered: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, buf).unwrap();
    tampered.save_with_format(&stego, image::ImageFormat::Png).unwrap();

    let extract_opts = ExtractOptions::new().lsb(2).spread(true);
    let err = stegvid::extract_image(&stego, &password, &extract_opts, None).unwrap_err();
    assert!(matches!(err, Error::BadAuth | Error::BadMagic));
}

struct FakeVideoSource {
    width: u32,
    height: u32,
    frames: VecDeque<Vec<u8>>,
}

impl VideoSource for FakeVideoSource {
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
        Some(self.frames.len() as u64)
    }
    fn next_frame(&mut self) -> stegvid::Result<Option<Vec<u8>>> {
        Ok(self.frames.pop_front())
    }
}

struct SharedWriter(Rc<RefCell<Vec<Vec<u8>>>>);

impl VideoWriter for SharedWriter {
    fn write_frame(&mut self, _width: u32, _height: u32, rgb: &[u8]) -> stegvid::Result<()> {
        self.0.borrow_mut().push(rgb.to_vec());
        Ok(())
    }
    fn finish(self: Box<Self>) -> stegvid::Result<()> {
        Ok(())
    }
}

fn synthetic_frames(count: usize, width: u32, height: u32) -> VecDeque<Vec<u8>> {
    (0..count)
        .map(|f| {
            (0..(width as usize * height as usize * 3))
                .map(|i| ((f * 17 + i) % 256) as u8)
                .collect()
        })
        .collect()
}

/// S5: 64x48, 120-frame video, chunk_frames=30 on both embed and extract.
/// The per-chunk body permutation is sized over the actual batch of frames
/// read for that chunk, so embed and extract must agree on `chunk_frames`
/// for the index sets to line up; this is the faithful, matching-size case.
#[test]
fn s5_video_round_trip_with_matching_chunk_size() {
    let width = 64;
    let height = 48;
    let payload = payload::build(b"Meet at 10", b"pw", false, 0, None).unwrap();

    let sink = Rc::new(RefCell::new(Vec::new()));
    let mut embed_source = FakeVideoSource {
        width,
        height,
        frames: synthetic_frames(120, width, height),
    };
    embed_video_streaming(
        &mut embed_source,
        Box::new(SharedWriter(sink.clone())),
        &payload,
        b"pw",
        1,
        true,
        30,
        None,
    )
    .unwrap();

    let written: Vec<Vec<u8>> = sink.borrow().clone();

    let mut extract_source = FakeVideoSource {
        width,
        height,
        frames: written.into(),
    };
    let payload_bytes = extract_video_streaming(&mut extract_source, b"pw", 1, true, 30, None).unwrap();
    let (body, meta) = payload::parse(&payload_bytes, b"pw", false, 0).unwrap();
    assert_eq!(body, b"Meet at 10");
    assert_eq!(meta.filename, None);
}

/// S6: same video, ECC-protected body; corrupting a handful of bytes inside
/// the written frames (within the RS correction budget) must still decode.
#[test]
fn s6_ecc_protected_video_tolerates_corruption() {
    let width = 64;
    let height = 48;
    let nsym = 16u8;
    let payload = payload::build(b"Meet at 10", b"pw", true, nsym, None).unwrap();

    let sink = Rc::new(RefCell::new(Vec::new()));
    let mut embed_source = FakeVideoSource {
        width,
        height,
        frames: synthetic_frames(120, width, height),
    };
    embed_video_streaming(
        &mut embed_source,
        Box::new(SharedWriter(sink.clone())),
        &payload,
        b"pw",
        1,
        true,
        30,
        None,
    )
    .unwrap();

    let mut written: Vec<Vec<u8>> = sink.borrow().clone();

    // Recompute the exact body slots the first chunk wrote, then flip 8 of
    // them directly: a guaranteed hit inside the permuted region, well
    // within nsym/2 = 8 byte corrections per Reed-Solomon block.
    let salt = &payload[payload::HEADER_LEN..payload::HEADER_LEN + payload::SALT_LEN];
    let seed_base = payload::body_permutation_seed(b"pw", salt);
    let seed_c = stegvid::permute::chunk_seed(&seed_base, 0);
    let slots_per_frame = width as usize * height as usize * 3; // lsb = 1
    let chunk_slots = slots_per_frame * 30; // frames[1..31), the first body chunk
    let need_bits = payload.len() * 8;
    let to_embed = chunk_slots.min(need_bits - payload::PRELUDE_BITS);
    let idxs = payload::body_indices(chunk_slots, &seed_c, to_embed, true);

    for &slot in idxs.iter().take(8) {
        let frame_idx = 1 + slot / slots_per_frame;
        let within_frame = slot % slots_per_frame;
        written[frame_idx][within_frame] ^= 0x01;
    }

    let mut extract_source = FakeVideoSource {
        width,
        height,
        frames: written.into(),
    };
    let payload_bytes = extract_video_streaming(&mut extract_source, b"pw", 1, true, 30, None).unwrap();
    let (body, _) = payload::parse(&payload_bytes, b"pw", true, nsym).unwrap();
    assert_eq!(body, b"Meet at 10");
}
