use log::info;

use crate::error::SessionError;

use super::sampler::{sample_frame, SampledFrame};
use super::source::{CameraSource, PixelFrame, StreamConstraints, VideoStream};

/// Owns the session's media stream. Acquired once per session; release is
/// guaranteed on every exit path because `Drop` also stops the stream.
pub struct CaptureController {
    stream: Option<Box<dyn VideoStream>>,
}

impl CaptureController {
    pub fn new() -> Self {
        Self { stream: None }
    }

    /// Opens a stream and holds it. On failure nothing is held and the
    /// session stays idle.
    pub fn start(
        &mut self,
        source: &dyn CameraSource,
        constraints: &StreamConstraints,
    ) -> Result<(), SessionError> {
        self.stop();
        match source.open(constraints) {
            Ok(stream) => {
                let (width, height) = stream.dimensions();
                info!("camera stream opened at {width}x{height}");
                self.stream = Some(stream);
                Ok(())
            }
            Err(err) => Err(SessionError::Permission(err)),
        }
    }

    /// Stops every track and releases the stream. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            info!("camera stream released");
        }
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn current_frame(&mut self) -> Option<PixelFrame> {
        self.stream.as_mut()?.current_frame()
    }

    pub fn sample(&mut self, jpeg_quality: u8) -> Option<SampledFrame> {
        sample_frame(self.stream.as_deref_mut()?, jpeg_quality)
    }
}

impl Default for CaptureController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.stop();
    }
}
