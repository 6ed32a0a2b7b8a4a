//! Media acquisition seam. The engine never talks to camera hardware or a
//! browser API directly; the hosting layer supplies a [`CameraSource`] and
//! the engine owns the [`VideoStream`] it opens for the session's lifetime.

/// Which camera the session would prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    User,
    Environment,
}

/// Capture constraints passed to the source when a session starts.
#[derive(Debug, Clone)]
pub struct StreamConstraints {
    pub width: u32,
    pub height: u32,
    pub facing: Facing,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            facing: Facing::User,
        }
    }
}

/// One decoded frame of live video, RGBA8.
#[derive(Debug, Clone)]
pub struct PixelFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// A live, video-only media stream. Singly owned by the capture controller;
/// nothing else reads or writes it.
pub trait VideoStream: Send {
    /// Current pixels of the feed, or `None` before the first frame is
    /// available.
    fn current_frame(&mut self) -> Option<PixelFrame>;

    fn dimensions(&self) -> (u32, u32);

    /// Stop every track. No further frames may be produced afterwards.
    fn stop(&mut self);
}

/// Opens media streams. Errors map to the session's permission failure:
/// access denied or no device present.
pub trait CameraSource {
    fn open(&self, constraints: &StreamConstraints) -> anyhow::Result<Box<dyn VideoStream>>;
}
