/// An axis-aligned integer bounding box in frame pixel coordinates.
///
/// Used for both face and eye regions. Eye rectangles come out of the
/// classifier relative to their parent face's cropped region and are
/// translated into frame coordinates with [`Rect::offset`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Translates the rectangle by `(dx, dy)` without changing its size.
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// The rectangle clipped to a `frame_width` x `frame_height` canvas.
    ///
    /// Degenerate results (fully outside the canvas) come back with zero
    /// width or height rather than negative extents.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Self {
        let x1 = self.x.clamp(0, frame_width as i32);
        let y1 = self.y.clamp(0, frame_height as i32);
        let x2 = (self.x + self.width).clamp(0, frame_width as i32);
        let y2 = (self.y + self.height).clamp(0, frame_height as i32);
        Self {
            x: x1,
            y: y1,
            width: (x2 - x1).max(0),
            height: (y2 - y1).max(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_offset_translates_origin_only() {
        let eye = Rect::new(10, 10, 20, 20);
        let translated = eye.offset(50, 50);
        assert_eq!(translated, Rect::new(60, 60, 20, 20));
    }

    #[test]
    fn test_offset_negative() {
        let r = Rect::new(5, 5, 10, 10);
        assert_eq!(r.offset(-5, -3), Rect::new(0, 2, 10, 10));
    }

    #[rstest]
    #[case::inside(Rect::new(10, 10, 20, 20), Rect::new(10, 10, 20, 20))]
    #[case::over_right(Rect::new(90, 10, 20, 20), Rect::new(90, 10, 10, 20))]
    #[case::over_bottom(Rect::new(10, 95, 20, 20), Rect::new(10, 95, 20, 5))]
    #[case::negative_origin(Rect::new(-5, -5, 20, 20), Rect::new(0, 0, 15, 15))]
    #[case::fully_outside(Rect::new(200, 200, 20, 20), Rect::new(100, 100, 0, 0))]
    fn test_clamp_to_frame(#[case] input: Rect, #[case] expected: Rect) {
        assert_eq!(input.clamp_to(100, 100), expected);
    }

    #[test]
    fn test_is_empty() {
        assert!(Rect::new(0, 0, 0, 10).is_empty());
        assert!(Rect::new(0, 0, 10, 0).is_empty());
        assert!(!Rect::new(0, 0, 1, 1).is_empty());
    }
}
