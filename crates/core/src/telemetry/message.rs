use serde::{Deserialize, Serialize};

use crate::analytics::aggregator::AggregateStats;
use crate::detection::domain::attributes::Emotion;

/// The flat device-to-cloud record.
///
/// Field names are a stable external contract consumed downstream; they must
/// survive byte-for-byte, including the historical `hearypersons` spelling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryMessage {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    pub persons: usize,
    pub males: usize,
    pub females: usize,
    pub smiles: usize,
    /// Average age across detected faces.
    pub age: f64,
    pub sunglasses: usize,
    #[serde(rename = "readingglasses")]
    pub reading_glasses: usize,
    #[serde(rename = "happypersons")]
    pub happy_persons: usize,
    #[serde(rename = "neutralpersons")]
    pub neutral_persons: usize,
    #[serde(rename = "disgustpersons")]
    pub disgust_persons: usize,
    #[serde(rename = "angerpersons")]
    pub anger_persons: usize,
    #[serde(rename = "happyratio")]
    pub happy_ratio: f64,
    #[serde(rename = "hearypersons")]
    pub heary_persons: usize,
}

impl TelemetryMessage {
    pub fn new(device_id: &str, stats: &AggregateStats) -> Self {
        Self {
            device_id: device_id.to_string(),
            persons: stats.person_count,
            males: stats.male_count,
            females: stats.female_count,
            smiles: stats.smile_count,
            age: stats.age_average,
            sunglasses: stats.sunglasses_count,
            reading_glasses: stats.reading_glasses_count,
            happy_persons: stats.emotions.count(Emotion::Happiness),
            neutral_persons: stats.emotions.count(Emotion::Neutral),
            disgust_persons: stats.emotions.count(Emotion::Disgust),
            anger_persons: stats.emotions.count(Emotion::Anger),
            happy_ratio: stats.happy_ratio,
            heary_persons: stats.hairy_count,
        }
    }
}
