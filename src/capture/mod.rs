pub mod controller;
pub mod sampler;
pub mod source;

pub use controller::CaptureController;
pub use sampler::{sample_frame, SampledFrame};
pub use source::{CameraSource, Facing, PixelFrame, StreamConstraints, VideoStream};
