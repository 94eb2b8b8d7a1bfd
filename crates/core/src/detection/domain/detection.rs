use crate::detection::domain::attributes::FaceAttributes;
use crate::shared::rect::Rect;

/// The outcome of one detection pass over one frame.
///
/// `faces` is always populated (possibly empty). `eyes` only comes from the
/// local cascade strategy, already translated into frame coordinates.
/// `attributes` only comes from the remote strategy; when present it is
/// index-aligned with `faces` (`attributes[i]` describes `faces[i]`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionResult {
    pub faces: Vec<Rect>,
    pub eyes: Vec<Rect>,
    pub attributes: Option<Vec<FaceAttributes>>,
}

impl DetectionResult {
    /// A result with no faces; what a failed or empty cycle degrades to.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Local-strategy result: face and eye rectangles, no attributes.
    pub fn from_rects(faces: Vec<Rect>, eyes: Vec<Rect>) -> Self {
        Self {
            faces,
            eyes,
            attributes: None,
        }
    }

    /// Remote-strategy result; callers must keep `attributes` index-aligned
    /// with `faces`.
    pub fn with_attributes(faces: Vec<Rect>, attributes: Vec<FaceAttributes>) -> Self {
        debug_assert_eq!(
            faces.len(),
            attributes.len(),
            "attributes must be index-aligned with faces"
        );
        Self {
            faces,
            eyes: Vec::new(),
            attributes: Some(attributes),
        }
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::attributes::{EmotionScores, Eyewear, Gender};

    fn attrs() -> FaceAttributes {
        FaceAttributes {
            age: 30.0,
            gender: Gender::Female,
            smile: 0.0,
            beard: 0.0,
            moustache: 0.0,
            eyewear: Eyewear::NoGlasses,
            accessories: Vec::new(),
            emotions: EmotionScores::default(),
        }
    }

    #[test]
    fn test_empty_has_no_faces_or_attributes() {
        let r = DetectionResult::empty();
        assert!(r.is_empty());
        assert_eq!(r.face_count(), 0);
        assert!(r.attributes.is_none());
    }

    #[test]
    fn test_from_rects_never_has_attributes() {
        let r = DetectionResult::from_rects(vec![Rect::new(0, 0, 10, 10)], Vec::new());
        assert_eq!(r.face_count(), 1);
        assert!(r.attributes.is_none());
    }

    #[test]
    fn test_with_attributes_keeps_alignment() {
        let r = DetectionResult::with_attributes(vec![Rect::new(0, 0, 10, 10)], vec![attrs()]);
        assert_eq!(r.faces.len(), r.attributes.as_ref().unwrap().len());
    }

    #[test]
    #[should_panic(expected = "index-aligned")]
    fn test_with_attributes_misalignment_panics_in_debug() {
        DetectionResult::with_attributes(vec![Rect::new(0, 0, 10, 10)], vec![]);
    }
}
