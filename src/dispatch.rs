//! Extension-based carrier dispatch.
//!
//! A thin, UI-free helper for a front-end that needs to pick `embed_image`
//! vs. `embed_video_streaming` from a file path alone, grounded on the
//! original CLI's `is_image`/`is_video` extension tables.

use std::ffi::OsStr;
use std::path::Path;

/// Which carrier a path's extension identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierKind {
    /// A single raster image (`embed_image`/`extract_image`).
    Image,
    /// A video file (`embed_video_streaming`/`extract_video_streaming`).
    Video,
}

const IMAGE_EXTS: &[&str] = &["png", "bmp", "tif", "tiff"];
const VIDEO_EXTS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm"];

/// Classifies `path` by extension, case-insensitively. Returns `None` for an
/// unrecognized or missing extension.
pub fn carrier_kind_for_path(path: &Path) -> Option<CarrierKind> {
    let ext = path.extension().and_then(OsStr::to_str)?.to_ascii_lowercase();
    if IMAGE_EXTS.contains(&ext.as_str()) {
        Some(CarrierKind::Image)
    } else if VIDEO_EXTS.contains(&ext.as_str()) {
        Some(CarrierKind::Video)
    } else {
        None
    }
}
