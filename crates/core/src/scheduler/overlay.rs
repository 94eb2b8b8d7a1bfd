//! Detection overlay rendering: rectangle strokes straight into the RGB
//! buffer, no drawing toolkit involved.

use crate::detection::domain::detection::DetectionResult;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

const FACE_COLOR: [u8; 3] = [0, 255, 0];
const FACE_STROKE: i32 = 3;
const EYE_STROKE: i32 = 1;

/// Returns a copy of `frame` with face and eye rectangles stroked in.
pub fn draw_detections(frame: &Frame, result: &DetectionResult) -> Frame {
    let mut annotated = frame.clone();
    for face in &result.faces {
        stroke_rect(&mut annotated, face, FACE_STROKE, FACE_COLOR);
    }
    for eye in &result.eyes {
        stroke_rect(&mut annotated, eye, EYE_STROKE, FACE_COLOR);
    }
    annotated
}

/// Strokes the rectangle border `thickness` pixels wide, growing inward,
/// clipped to the frame.
fn stroke_rect(frame: &mut Frame, rect: &Rect, thickness: i32, color: [u8; 3]) {
    let clamped = rect.clamp_to(frame.width(), frame.height());
    if clamped.is_empty() {
        return;
    }
    let mut px = frame.as_ndarray_mut();
    let x1 = clamped.x;
    let y1 = clamped.y;
    let x2 = clamped.x + clamped.width - 1;
    let y2 = clamped.y + clamped.height - 1;

    for y in y1..=y2 {
        for x in x1..=x2 {
            let on_border = x - x1 < thickness
                || x2 - x < thickness
                || y - y1 < thickness
                || y2 - y < thickness;
            if !on_border {
                continue;
            }
            for (c, value) in color.iter().enumerate() {
                px[[y as usize, x as usize, c]] = *value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::rect::Rect;

    fn black_frame(size: u32) -> Frame {
        Frame::new(vec![0u8; (size * size * 3) as usize], size, size, 3, 0)
    }

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 3] {
        let arr = frame.as_ndarray();
        [arr[[y, x, 0]], arr[[y, x, 1]], arr[[y, x, 2]]]
    }

    #[test]
    fn test_face_border_is_stroked_green() {
        let frame = black_frame(20);
        let result = DetectionResult::from_rects(vec![Rect::new(4, 4, 10, 10)], Vec::new());
        let annotated = draw_detections(&frame, &result);

        assert_eq!(pixel(&annotated, 4, 4), FACE_COLOR); // corner
        assert_eq!(pixel(&annotated, 6, 4), FACE_COLOR); // inside 3px band
        assert_eq!(pixel(&annotated, 9, 9), [0, 0, 0]); // interior untouched
        assert_eq!(pixel(&annotated, 0, 0), [0, 0, 0]); // outside untouched
    }

    #[test]
    fn test_eye_stroke_is_one_pixel() {
        let frame = black_frame(20);
        let result =
            DetectionResult::from_rects(vec![], vec![Rect::new(5, 5, 6, 6)]);
        let annotated = draw_detections(&frame, &result);

        assert_eq!(pixel(&annotated, 5, 5), FACE_COLOR);
        assert_eq!(pixel(&annotated, 6, 6), [0, 0, 0]); // second ring untouched
    }

    #[test]
    fn test_out_of_bounds_rect_is_clipped_not_panicking() {
        let frame = black_frame(10);
        let result =
            DetectionResult::from_rects(vec![Rect::new(-5, -5, 100, 100)], Vec::new());
        let annotated = draw_detections(&frame, &result);
        assert_eq!(pixel(&annotated, 0, 0), FACE_COLOR);
    }

    #[test]
    fn test_source_frame_is_untouched() {
        let frame = black_frame(10);
        let result = DetectionResult::from_rects(vec![Rect::new(1, 1, 5, 5)], Vec::new());
        let _ = draw_detections(&frame, &result);
        assert_eq!(pixel(&frame, 1, 1), [0, 0, 0]);
    }
}
