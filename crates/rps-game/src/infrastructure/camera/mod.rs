//! Camera infrastructure.
//!
//! The round controller never talks to a webcam API directly.  It sees two
//! traits:
//!
//! - [`CameraBackend`] opens a device by index (used both for real play and
//!   for the quick open/close probe in camera selection).
//! - [`CameraDevice`] is one opened device: read frames, then release it.
//!
//! # Implementations
//!
//! - [`mock::ScriptedCameraBackend`] replays a scripted sequence of frames and
//!   read failures, and counts opens and releases.  Tests use it to drive
//!   every state machine path; the binary's `--demo` mode uses it as a
//!   stand-in webcam.
//! - `webcam::NokhwaBackend` (behind the `nokhwa` cargo feature) captures
//!   from a real webcam.
//!
//! # Release discipline
//!
//! A device must be released exactly once.  The controller holds the open
//! device in an `Option` and releases it with `Option::take`, so a second
//! release attempt finds nothing to release.

use thiserror::Error;

pub mod mock;

#[cfg(feature = "nokhwa")]
pub mod webcam;

/// Error type for camera operations.  Any of these aborts the current round.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CameraError {
    /// The device at `index` could not be opened.
    #[error("failed to open camera {index}: {reason}")]
    OpenFailed { index: u32, reason: String },
    /// A frame could not be read from an open device.
    #[error("failed to read frame: {0}")]
    ReadFailed(String),
    /// A frame's pixel buffer does not match its dimensions.
    #[error("malformed frame: expected {expected} bytes, got {actual}")]
    MalformedFrame { expected: usize, actual: usize },
    /// The requested capability is not available in this build or platform.
    #[error("camera backend unsupported: {0}")]
    Unsupported(String),
}

/// One captured image: packed 8-bit RGB, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Bytes per pixel in the packed RGB layout.
    pub const CHANNELS: usize = 3;

    /// Wraps a packed RGB buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::MalformedFrame`] if `pixels.len()` is not
    /// `width * height * 3`.
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CameraError> {
        let expected = width as usize * height as usize * Self::CHANNELS;
        if pixels.len() != expected {
            return Err(CameraError::MalformedFrame {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A frame filled with a single colour.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * Self::CHANNELS);
        for _ in 0..count {
            pixels.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw packed RGB bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the RGB value at (x, y), or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * Self::CHANNELS;
        Some([
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
        ])
    }

    /// Returns a left-right mirrored copy (selfie view).
    pub fn mirror_horizontal(&self) -> Frame {
        let row_len = self.width as usize * Self::CHANNELS;
        let mut pixels = Vec::with_capacity(self.pixels.len());
        if row_len > 0 {
            for row in self.pixels.chunks_exact(row_len) {
                for px in row.chunks_exact(Self::CHANNELS).rev() {
                    pixels.extend_from_slice(px);
                }
            }
        }
        Frame {
            width: self.width,
            height: self.height,
            pixels,
        }
    }
}

/// Opens camera devices by index.
#[cfg_attr(test, mockall::automock)]
pub trait CameraBackend: Send + Sync {
    /// Opens the device at `index` for exclusive use.
    fn open(&self, index: u32) -> Result<Box<dyn CameraDevice>, CameraError>;
}

/// An opened camera device.
pub trait CameraDevice: Send {
    /// Blocks until the next frame is available.
    fn read_frame(&mut self) -> Result<Frame, CameraError>;

    /// Releases the device.  Called exactly once by the owner.
    fn release(&mut self);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
