//! Crowd-level reduction of per-face detection output.

use crate::detection::domain::attributes::{Emotion, Eyewear, Gender};
use crate::detection::domain::detection::DetectionResult;
use crate::shared::constants::{FACIAL_HAIR_THRESHOLD, SMILE_THRESHOLD};

/// Dominant-emotion counts, one bucket per category.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmotionTally {
    counts: [usize; Emotion::ALL.len()],
}

impl EmotionTally {
    pub fn count(&self, emotion: Emotion) -> usize {
        self.counts[Self::index(emotion)]
    }

    fn increment(&mut self, emotion: Emotion) {
        self.counts[Self::index(emotion)] += 1;
    }

    fn index(emotion: Emotion) -> usize {
        Emotion::ALL
            .iter()
            .position(|e| *e == emotion)
            .expect("Emotion::ALL covers every variant")
    }
}

/// Crowd statistics for one detection cycle.
///
/// Derived exclusively by [`aggregate`]; the all-zero `Default` is the
/// legitimate "nobody in view" value and needs no special-casing downstream.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregateStats {
    pub person_count: usize,
    pub male_count: usize,
    pub female_count: usize,
    pub age_average: f64,
    pub smile_count: usize,
    pub hairy_count: usize,
    pub sunglasses_count: usize,
    pub reading_glasses_count: usize,
    pub emotions: EmotionTally,
    /// Percentage of faces whose dominant emotion is happiness, rounded to
    /// two decimals; 0 when nobody is in view.
    pub happy_ratio: f64,
}

/// Reduces one detection result to crowd statistics. Pure function: same
/// input, same output, no side effects.
///
/// Without attributes (local-strategy results) only `person_count` is
/// populated; every attribute-derived field keeps its zero default.
pub fn aggregate(result: &DetectionResult) -> AggregateStats {
    let mut stats = AggregateStats {
        person_count: result.faces.len(),
        ..AggregateStats::default()
    };

    let Some(attributes) = result.attributes.as_deref() else {
        return stats;
    };
    if attributes.is_empty() {
        return stats;
    }

    for attrs in attributes {
        match attrs.gender {
            Gender::Male => stats.male_count += 1,
            Gender::Female => stats.female_count += 1,
        }
        if attrs.smile >= SMILE_THRESHOLD {
            stats.smile_count += 1;
        }
        if attrs.beard > FACIAL_HAIR_THRESHOLD || attrs.moustache > FACIAL_HAIR_THRESHOLD {
            stats.hairy_count += 1;
        }
        match attrs.eyewear {
            Eyewear::Sunglasses => stats.sunglasses_count += 1,
            Eyewear::ReadingGlasses => stats.reading_glasses_count += 1,
            Eyewear::NoGlasses | Eyewear::SwimmingGoggles => {}
        }
        stats.emotions.increment(attrs.emotions.dominant());
    }

    stats.age_average =
        attributes.iter().map(|a| a.age).sum::<f64>() / attributes.len() as f64;

    if stats.person_count > 0 {
        let happy = stats.emotions.count(Emotion::Happiness);
        stats.happy_ratio = round2(happy as f64 / stats.person_count as f64 * 100.0);
    }

    stats
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
