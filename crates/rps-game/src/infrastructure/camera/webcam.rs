//! Real webcam capture through `nokhwa`.
//!
//! Compiled only with the `nokhwa` cargo feature:
//!
//! ```bash
//! cargo run --package rps-game --features nokhwa
//! ```
//!
//! # Capture thread
//!
//! A `nokhwa::Camera` is not guaranteed to be `Send` on every platform
//! backend, while [`CameraDevice`] must be, because the round controller is
//! moved onto its worker thread.  Each opened device therefore owns a small
//! capture thread that holds the `Camera`; reads and release are requests sent
//! over a channel.

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::JoinHandle;

use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraIndex, RequestedFormat, RequestedFormatType},
    Camera,
};
use tracing::{debug, info, warn};

use super::{CameraBackend, CameraDevice, CameraError, Frame};

/// Opens webcams through the platform's native capture API.
#[derive(Debug, Default)]
pub struct NokhwaBackend;

impl NokhwaBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CameraBackend for NokhwaBackend {
    fn open(&self, index: u32) -> Result<Box<dyn CameraDevice>, CameraError> {
        NokhwaDevice::open(index).map(|d| Box::new(d) as Box<dyn CameraDevice>)
    }
}

enum Request {
    Read,
    Stop,
}

/// A webcam held open by a dedicated capture thread.
struct NokhwaDevice {
    index: u32,
    requests: SyncSender<Request>,
    frames: Receiver<Result<Frame, CameraError>>,
    thread: Option<JoinHandle<()>>,
}

impl NokhwaDevice {
    fn open(index: u32) -> Result<Self, CameraError> {
        let (req_tx, req_rx) = mpsc::sync_channel::<Request>(1);
        let (frame_tx, frame_rx) = mpsc::sync_channel::<Result<Frame, CameraError>>(1);

        let thread = std::thread::Builder::new()
            .name(format!("rps-camera-{index}"))
            .spawn(move || capture_loop(index, req_rx, frame_tx))
            .map_err(|e| CameraError::OpenFailed {
                index,
                reason: format!("failed to spawn capture thread: {e}"),
            })?;

        // The first message reports whether the stream opened.
        match frame_rx.recv() {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(CameraError::OpenFailed {
                    index,
                    reason: "capture thread exited during open".to_string(),
                });
            }
        }

        Ok(Self {
            index,
            requests: req_tx,
            frames: frame_rx,
            thread: Some(thread),
        })
    }
}

impl CameraDevice for NokhwaDevice {
    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        self.requests
            .send(Request::Read)
            .map_err(|_| CameraError::ReadFailed("capture thread has stopped".to_string()))?;
        self.frames
            .recv()
            .map_err(|_| CameraError::ReadFailed("capture thread has stopped".to_string()))?
    }

    fn release(&mut self) {
        let _ = self.requests.send(Request::Stop);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(index = self.index, "camera capture thread panicked");
            }
        }
        info!(index = self.index, "webcam released");
    }
}

/// Owns the `Camera` for the lifetime of one opened device.
fn capture_loop(
    index: u32,
    requests: Receiver<Request>,
    frames: SyncSender<Result<Frame, CameraError>>,
) {
    let mut camera = match open_camera(index) {
        Ok(camera) => camera,
        Err(e) => {
            let _ = frames.send(Err(e));
            return;
        }
    };
    info!(index, name = %camera.info().human_name(), format = %camera.camera_format(), "webcam opened");

    // Handshake: an empty frame signals a successful open.
    if frames.send(Ok(Frame::solid(0, 0, [0, 0, 0]))).is_err() {
        let _ = camera.stop_stream();
        return;
    }

    while let Ok(Request::Read) = requests.recv() {
        if frames.send(capture_frame(&mut camera)).is_err() {
            break;
        }
    }

    if let Err(e) = camera.stop_stream() {
        debug!(index, "stop_stream failed: {e}");
    }
}

fn open_camera(index: u32) -> Result<Camera, CameraError> {
    let open_failed = |reason: String| CameraError::OpenFailed { index, reason };
    let requested =
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
    let mut camera =
        Camera::new(CameraIndex::Index(index), requested).map_err(|e| open_failed(e.to_string()))?;
    camera
        .open_stream()
        .map_err(|e| open_failed(e.to_string()))?;
    Ok(camera)
}

fn capture_frame(camera: &mut Camera) -> Result<Frame, CameraError> {
    let buffer = camera
        .frame()
        .map_err(|e| CameraError::ReadFailed(e.to_string()))?;
    let decoded = buffer
        .decode_image::<RgbFormat>()
        .map_err(|e| CameraError::ReadFailed(e.to_string()))?;
    let (width, height) = (decoded.width(), decoded.height());
    Frame::from_rgb(width, height, decoded.into_raw())
}
