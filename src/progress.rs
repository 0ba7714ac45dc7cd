//! Progress reporting for embed/extract operations.
//!
//! The specification calls for a plain synchronous callback —
//! `(done, total) -> void` — invoked at coarse intervals, never blocking
//! indefinitely and never ordered beyond `done <= total` with a final
//! `done == total` call on completion. This module wraps that contract in a
//! small [`ProgressFn`] type alias plus a [`Cadence`] helper that matches the
//! intervals the specification documents: every chunk for video, every
//! ~10,000 bits for image.
//!
//! # Example
//!
//! ```rust
//! use stegvid::progress::ProgressFn;
//!
//! let mut calls = Vec::new();
//! let mut on_progress: ProgressFn<'_> = Box::new(|done, total| calls.push((done, total)));
//! on_progress(5, 10);
//! on_progress(10, 10);
//! assert_eq!(calls, vec![(5, 10), (10, 10)]);
//! ```

/// A progress callback: `(done, total) -> ()`.
///
/// Invoked synchronously on the calling thread. Implementations must not
/// block indefinitely; there is no cancellation mechanism (callers abort by
/// interrupting I/O or the process).
pub type ProgressFn<'a> = Box<dyn FnMut(u64, u64) + 'a>;

/// Default reporting cadence for image embed/extract: every N body bits.
pub const IMAGE_PROGRESS_STRIDE_BITS: u64 = 10_000;

/// Rate-limits calls to a [`ProgressFn`] to a fixed stride, always letting
/// the final call through regardless of stride alignment.
///
/// Grounded on the cadence the specification documents for image operations
/// (every ~10,000 bits); the video state machine instead reports once per
/// chunk and does not need this helper.
pub struct Cadence {
    stride: u64,
    next_report_at: u64,
}

impl Cadence {
    /// Creates a cadence that reports on every multiple of `stride` and on
    /// the final `done == total` call.
    pub fn new(stride: u64) -> Self {
        Self {
            stride: stride.max(1),
            next_report_at: 0,
        }
    }

    /// Invokes `callback(done, total)` if `done` has crossed the next stride
    /// boundary, or if the operation has just completed.
    pub fn report(&mut self, done: u64, total: u64, callback: &mut ProgressFn<'_>) {
        if done >= self.next_report_at || done >= total {
            callback(done, total);
            self.next_report_at = done + self.stride;
        }
    }
}
