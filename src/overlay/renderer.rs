//! Draws the detection annotation over the live frame. Stateless per call:
//! nothing accumulates across frames.

use crate::capture::PixelFrame;
use crate::models::detection::{DetectionResult, Keypoint};

use super::canvas::Canvas;

/// Fixed skeletal connection graph: index pairs into the keypoint sequence.
pub const SKELETON_CONNECTIONS: &[(usize, usize)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (1, 5),
    (5, 6),
    (6, 7),
    (1, 8),
    (8, 9),
    (9, 10),
    (1, 11),
    (11, 12),
    (11, 13),
    (13, 14),
    (14, 15),
    (12, 16),
    (16, 17),
    (17, 18),
];

const SKELETON_STROKE: [u8; 4] = [79, 70, 229, 255];
const MARKER_FILL: [u8; 4] = [199, 210, 254, 255];
const BADGE_BACKDROP: [u8; 4] = [79, 70, 229, 230];
const BADGE_TEXT: [u8; 4] = [255, 255, 255, 255];
const LINE_THICKNESS: i32 = 3;
const MARKER_RADIUS: i32 = 6;

/// Paints the current video frame, then either the skeleton (when the
/// result carries keypoints) or a label/score badge. The frame paint keeps
/// the overlay synchronized with the live feed even though the inference
/// result lags behind by one or more sampling periods.
pub fn render(canvas: &mut Canvas, frame: &PixelFrame, result: &DetectionResult) {
    canvas.paint_frame(frame);
    match &result.keypoints {
        Some(keypoints) if !keypoints.is_empty() => draw_skeleton(canvas, keypoints),
        _ => draw_badge(canvas, &result.pose_label, result.confidence_percent),
    }
}

fn draw_skeleton(canvas: &mut Canvas, keypoints: &[Option<Keypoint>]) {
    for &(a, b) in SKELETON_CONNECTIONS {
        let (Some(Some(start)), Some(Some(end))) = (keypoints.get(a), keypoints.get(b)) else {
            continue;
        };
        canvas.draw_line(
            (start.x as i32, start.y as i32),
            (end.x as i32, end.y as i32),
            SKELETON_STROKE,
            LINE_THICKNESS,
        );
    }

    for point in keypoints.iter().flatten() {
        let center = (point.x as i32, point.y as i32);
        canvas.fill_circle(center, MARKER_RADIUS, MARKER_FILL);
        canvas.stroke_circle(center, MARKER_RADIUS, SKELETON_STROKE);
    }
}

fn draw_badge(canvas: &mut Canvas, label: &str, confidence_percent: u8) {
    canvas.fill_rect(10, 10, 200, 60, BADGE_BACKDROP);
    canvas.draw_text(20, 22, label, BADGE_TEXT, 2);
    canvas.draw_text(20, 44, &format!("{confidence_percent}% accuracy"), BADGE_TEXT, 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frame(width: u32, height: u32) -> PixelFrame {
        PixelFrame {
            rgba: vec![40; (width * height * 4) as usize],
            width,
            height,
        }
    }

    fn result_with_keypoints(keypoints: Option<Vec<Option<Keypoint>>>) -> DetectionResult {
        DetectionResult {
            pose_label: "Tree".to_string(),
            confidence_percent: 91,
            feedback_lines: Vec::new(),
            keypoints,
        }
    }

    #[test]
    fn badge_is_drawn_when_keypoints_are_absent() {
        let mut canvas = Canvas::new(4, 4);
        render(&mut canvas, &test_frame(320, 240), &result_with_keypoints(None));
        assert_eq!((canvas.width(), canvas.height()), (320, 240));
        assert_eq!(canvas.pixel(15, 15), Some(BADGE_BACKDROP));
        // Outside the badge the frame shows through.
        assert_eq!(canvas.pixel(300, 200), Some([40, 40, 40, 40]));
    }

    #[test]
    fn skeleton_markers_land_on_keypoints() {
        let mut canvas = Canvas::new(4, 4);
        let keypoints = vec![
            Some(Keypoint { x: 50.0, y: 50.0, visibility: 1.0 }),
            Some(Keypoint { x: 100.0, y: 80.0, visibility: 1.0 }),
        ];
        render(
            &mut canvas,
            &test_frame(320, 240),
            &result_with_keypoints(Some(keypoints)),
        );
        assert_eq!(canvas.pixel(50, 50), Some(MARKER_FILL));
        assert_eq!(canvas.pixel(100, 80), Some(MARKER_FILL));
        // No badge in skeleton mode.
        assert_eq!(canvas.pixel(15, 15), Some([40, 40, 40, 40]));
    }

    #[test]
    fn undefined_keypoint_slots_are_skipped() {
        let mut canvas = Canvas::new(4, 4);
        let keypoints = vec![
            Some(Keypoint { x: 50.0, y: 50.0, visibility: 1.0 }),
            None,
            Some(Keypoint { x: 90.0, y: 90.0, visibility: 1.0 }),
        ];
        render(
            &mut canvas,
            &test_frame(320, 240),
            &result_with_keypoints(Some(keypoints)),
        );
        // Every connection through slot 1 is dropped, so the area between
        // the two live markers keeps the frame color.
        assert_eq!(canvas.pixel(70, 70), Some([40, 40, 40, 40]));
        assert_eq!(canvas.pixel(50, 50), Some(MARKER_FILL));
        assert_eq!(canvas.pixel(90, 90), Some(MARKER_FILL));
    }
}
