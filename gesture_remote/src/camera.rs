//! Frame sources, both a real webcam and a synthetic backdrop.
//!
//! A [`FrameSource`] holds the device for as long as it lives; dropping
//! it releases the camera.  Sources are produced by a [`CameraFactory`]
//! inside the gesture thread, so the device is opened when the loop
//! starts and released on every exit path.

use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::frame::Frame;

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The device could not be opened; the loop never starts.
    #[error("camera unavailable: {0}")]
    Unavailable(String),

    /// A frame could not be read or decoded; the loop stops.
    #[error("frame read failed: {0}")]
    Read(String),
}

// ════════════════════════════════════════════════════════════════════════════
// Traits
// ════════════════════════════════════════════════════════════════════════════

/// An opened camera.
pub trait FrameSource {
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;
    fn name(&self) -> &str;
}

/// Opens a [`FrameSource`] each time the gesture loop starts.
pub trait CameraFactory: Send {
    fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError>;
    fn describe(&self) -> String;
}

impl<F> CameraFactory for F
where
    F: Fn() -> Result<Box<dyn FrameSource>, CaptureError> + Send,
{
    fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError> { self() }
    fn describe(&self) -> String { "custom camera".to_string() }
}

/// The cameras the application knows how to open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraChoice {
    Simulated { width: usize, height: usize },
    #[cfg(feature = "camera")]
    Device(u32),
}

impl CameraFactory for CameraChoice {
    fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError> {
        match *self {
            CameraChoice::Simulated { width, height } => Ok(Box::new(SimCamera::new(width, height))),
            #[cfg(feature = "camera")]
            CameraChoice::Device(index) => Ok(Box::new(NokhwaCamera::open(index)?)),
        }
    }

    fn describe(&self) -> String {
        match *self {
            CameraChoice::Simulated { width, height } => format!("simulated {}x{}", width, height),
            #[cfg(feature = "camera")]
            CameraChoice::Device(index) => format!("camera #{}", index),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimCamera — synthetic frames (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Dark vertical gradient with a slowly drifting highlight band, so the
/// window visibly updates while the loop runs.  Each read blocks for one
/// frame interval, like a real device.
pub struct SimCamera {
    width:    usize,
    height:   usize,
    interval: Duration,
    tick:     usize,
}

impl SimCamera {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(33);

    pub fn new(width: usize, height: usize) -> Self {
        SimCamera { width, height, interval: Self::DEFAULT_INTERVAL, tick: 0 }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl FrameSource for SimCamera {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        thread::sleep(self.interval);
        let (w, h) = (self.width, self.height);
        let band = if h == 0 { 0 } else { self.tick % h };
        let mut rgb = Vec::with_capacity(w * h * 3);
        for y in 0..h {
            let shade = (20 + y * 40 / h.max(1)) as u8;
            let lift = if y.abs_diff(band) < 6 { 18 } else { 0 };
            for _ in 0..w {
                rgb.extend_from_slice(&[shade, shade + lift, shade + 10 + lift]);
            }
        }
        self.tick = self.tick.wrapping_add(2);
        Ok(Frame { width: w, height: h, rgb })
    }

    fn name(&self) -> &str { "simulated" }
}

// ════════════════════════════════════════════════════════════════════════════
// NokhwaCamera — real webcam (feature = "camera")
// ════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "camera")]
pub struct NokhwaCamera {
    camera: nokhwa::Camera,
    name:   String,
}

#[cfg(feature = "camera")]
impl NokhwaCamera {
    pub fn open(index: u32) -> Result<Self, CaptureError> {
        use nokhwa::pixel_format::RgbFormat;
        use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};

        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = nokhwa::Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| CaptureError::Unavailable(format!("camera #{}: {}", index, e)))?;
        camera.open_stream()
            .map_err(|e| CaptureError::Unavailable(format!("camera #{}: {}", index, e)))?;

        let name = camera.info().human_name();
        log::info!("opened camera #{} ({}) at {}", index, name, camera.resolution());
        Ok(NokhwaCamera { camera, name })
    }
}

#[cfg(feature = "camera")]
impl FrameSource for NokhwaCamera {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        use nokhwa::pixel_format::RgbFormat;

        let buffer = self.camera.frame().map_err(|e| CaptureError::Read(e.to_string()))?;
        let image = buffer.decode_image::<RgbFormat>().map_err(|e| CaptureError::Read(e.to_string()))?;
        let (w, h) = (image.width() as usize, image.height() as usize);
        Frame::from_rgb(w, h, image.into_raw())
            .ok_or_else(|| CaptureError::Read(format!("short {}x{} frame", w, h)))
    }

    fn name(&self) -> &str { &self.name }
}

#[cfg(feature = "camera")]
impl Drop for NokhwaCamera {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("closing camera {}: {}", self.name, e);
        }
        log::info!("camera {} released", self.name);
    }
}
