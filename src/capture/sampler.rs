use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use log::warn;
use tokio::time::Instant;

use super::source::{PixelFrame, VideoStream};

/// A still captured from the live stream, packaged for the classifier.
/// Ephemeral: produced on a scheduler tick, consumed by one inference call,
/// never retained past it.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub captured_at: Instant,
}

/// Reads the stream's current pixels into a JPEG still. `None` means the
/// surface is not ready yet (no frame, or zero dimensions); the scheduler
/// treats that as a normal skip, not an error.
pub fn sample_frame(stream: &mut dyn VideoStream, jpeg_quality: u8) -> Option<SampledFrame> {
    let frame = stream.current_frame()?;
    if frame.width == 0 || frame.height == 0 {
        return None;
    }

    let jpeg = match encode_jpeg(&frame, jpeg_quality) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("sampled frame encode failed: {err}");
            return None;
        }
    };

    Some(SampledFrame {
        jpeg,
        width: frame.width,
        height: frame.height,
        captured_at: Instant::now(),
    })
}

fn encode_jpeg(frame: &PixelFrame, quality: u8) -> image::ImageResult<Vec<u8>> {
    // The encoder wants RGB; the feed is RGBA.
    let rgb: Vec<u8> = frame
        .rgba
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder.encode(&rgb, frame.width, frame.height, ExtendedColorType::Rgb8)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStream {
        width: u32,
        height: u32,
        has_frame: bool,
    }

    impl VideoStream for FixedStream {
        fn current_frame(&mut self) -> Option<PixelFrame> {
            self.has_frame.then(|| PixelFrame {
                rgba: vec![200; (self.width * self.height * 4) as usize],
                width: self.width,
                height: self.height,
            })
        }

        fn dimensions(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn stop(&mut self) {}
    }

    #[test]
    fn encodes_a_jpeg_still() {
        let mut stream = FixedStream {
            width: 32,
            height: 24,
            has_frame: true,
        };
        let sampled = sample_frame(&mut stream, 80).expect("frame should sample");
        assert_eq!(sampled.width, 32);
        assert_eq!(sampled.height, 24);
        // JPEG SOI marker.
        assert_eq!(&sampled.jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn not_ready_stream_yields_none() {
        let mut stream = FixedStream {
            width: 32,
            height: 24,
            has_frame: false,
        };
        assert!(sample_frame(&mut stream, 80).is_none());
    }

    #[test]
    fn zero_dimension_frame_yields_none() {
        let mut stream = FixedStream {
            width: 0,
            height: 24,
            has_frame: true,
        };
        assert!(sample_frame(&mut stream, 80).is_none());
    }
}
