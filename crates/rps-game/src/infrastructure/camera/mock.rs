//! Scripted camera backend for tests and demo mode.
//!
//! # Why a scripted camera?
//!
//! A real webcam cannot be told to "fail on the third read", and CI machines
//! usually have no camera at all.  The scripted backend replaces the device
//! with an in-memory queue:
//!
//! - Each read pops the next [`FrameStep`]: a frame to return, or an error.
//! - Once the script is exhausted, every read returns the fallback frame, so
//!   the device behaves like an endless live stream.
//! - [`CameraStats`] counts opens, reads, and releases so tests can assert
//!   the exactly-once release rule.
//!
//! # Usage in tests
//!
//! ```ignore
//! let backend = ScriptedCameraBackend::new([0])
//!     .with_script([FrameStep::Frame(frame), FrameStep::Fail("unplugged".into())]);
//! let stats = backend.stats();
//! // ... run a round ...
//! assert_eq!(stats.releases(), 1);
//! ```

use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, Mutex,
};

use tracing::debug;

use super::{CameraBackend, CameraDevice, CameraError, Frame};

/// One scripted read result.
#[derive(Debug, Clone)]
pub enum FrameStep {
    /// The read succeeds with this frame.
    Frame(Frame),
    /// The read fails with [`CameraError::ReadFailed`] carrying this reason.
    Fail(String),
}

/// Counters shared between the backend and every device it opens.
#[derive(Debug, Default)]
pub struct CameraStats {
    opens: AtomicU32,
    failed_opens: AtomicU32,
    reads: AtomicU32,
    releases: AtomicU32,
    probed: Mutex<Vec<u32>>,
}

impl CameraStats {
    /// Successful `open` calls.
    pub fn opens(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }

    /// `open` calls for an unavailable index.
    pub fn failed_opens(&self) -> u32 {
        self.failed_opens.load(Ordering::SeqCst)
    }

    /// `read_frame` calls on any device, successful or not.
    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }

    /// `release` calls on any device.
    pub fn releases(&self) -> u32 {
        self.releases.load(Ordering::SeqCst)
    }

    /// Every index passed to `open`, in call order.
    pub fn probed(&self) -> Vec<u32> {
        self.probed.lock().expect("lock poisoned").clone()
    }
}

/// A [`CameraBackend`] whose devices replay a script.
pub struct ScriptedCameraBackend {
    available: Vec<u32>,
    script: Arc<Mutex<VecDeque<FrameStep>>>,
    fallback: Frame,
    stats: Arc<CameraStats>,
}

impl ScriptedCameraBackend {
    /// Default size of the fallback frame.
    pub const FALLBACK_WIDTH: u32 = 64;
    pub const FALLBACK_HEIGHT: u32 = 48;

    /// Creates a backend on which only the given indices can be opened.
    pub fn new(available: impl IntoIterator<Item = u32>) -> Self {
        Self {
            available: available.into_iter().collect(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Frame::solid(Self::FALLBACK_WIDTH, Self::FALLBACK_HEIGHT, [32, 32, 32]),
            stats: Arc::new(CameraStats::default()),
        }
    }

    /// Appends read results to the shared script.
    pub fn with_script(self, steps: impl IntoIterator<Item = FrameStep>) -> Self {
        self.script.lock().expect("lock poisoned").extend(steps);
        self
    }

    /// Replaces the frame returned once the script runs out.
    pub fn with_fallback(mut self, frame: Frame) -> Self {
        self.fallback = frame;
        self
    }

    /// Shared counters; clone the `Arc` before moving the backend.
    pub fn stats(&self) -> Arc<CameraStats> {
        Arc::clone(&self.stats)
    }
}

impl CameraBackend for ScriptedCameraBackend {
    fn open(&self, index: u32) -> Result<Box<dyn CameraDevice>, CameraError> {
        self.stats.probed.lock().expect("lock poisoned").push(index);
        if !self.available.contains(&index) {
            self.stats.failed_opens.fetch_add(1, Ordering::SeqCst);
            return Err(CameraError::OpenFailed {
                index,
                reason: "no such device".to_string(),
            });
        }
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        debug!(index, "scripted camera opened");
        Ok(Box::new(ScriptedCamera {
            index,
            script: Arc::clone(&self.script),
            fallback: self.fallback.clone(),
            stats: Arc::clone(&self.stats),
            released: false,
        }))
    }
}

/// A device opened from [`ScriptedCameraBackend`].
struct ScriptedCamera {
    index: u32,
    script: Arc<Mutex<VecDeque<FrameStep>>>,
    fallback: Frame,
    stats: Arc<CameraStats>,
    released: bool,
}

impl CameraDevice for ScriptedCamera {
    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        self.stats.reads.fetch_add(1, Ordering::SeqCst);
        if self.released {
            return Err(CameraError::ReadFailed(format!(
                "camera {} already released",
                self.index
            )));
        }
        let step = self.script.lock().expect("lock poisoned").pop_front();
        match step {
            Some(FrameStep::Frame(frame)) => Ok(frame),
            Some(FrameStep::Fail(reason)) => Err(CameraError::ReadFailed(reason)),
            None => Ok(self.fallback.clone()),
        }
    }

    fn release(&mut self) {
        // Counted on every call so a double release shows up in the stats.
        self.stats.releases.fetch_add(1, Ordering::SeqCst);
        self.released = true;
        debug!(index = self.index, "scripted camera released");
    }
}
