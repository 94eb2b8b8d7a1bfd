use serde::Deserialize;

/// Categorical gender as reported by the vision service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Eyewear category as reported by the vision service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum Eyewear {
    NoGlasses,
    ReadingGlasses,
    Sunglasses,
    SwimmingGoggles,
}

/// Emotion labels in dominant-selection priority order.
///
/// The order matters: dominant-emotion selection scans it first to last and
/// a later label only wins on a strictly greater score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Emotion {
    Anger,
    Contempt,
    Disgust,
    Fear,
    Happiness,
    Neutral,
    Sadness,
    Surprise,
}

impl Emotion {
    pub const ALL: [Emotion; 8] = [
        Emotion::Anger,
        Emotion::Contempt,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happiness,
        Emotion::Neutral,
        Emotion::Sadness,
        Emotion::Surprise,
    ];
}

/// Per-face emotion score vector, each component in `[0, 1]`.
///
/// Scores are independent confidences; they are not required to sum to 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct EmotionScores {
    #[serde(default)]
    pub anger: f64,
    #[serde(default)]
    pub contempt: f64,
    #[serde(default)]
    pub disgust: f64,
    #[serde(default)]
    pub fear: f64,
    #[serde(default)]
    pub happiness: f64,
    #[serde(default)]
    pub neutral: f64,
    #[serde(default)]
    pub sadness: f64,
    #[serde(default)]
    pub surprise: f64,
}

impl EmotionScores {
    pub fn score(&self, emotion: Emotion) -> f64 {
        match emotion {
            Emotion::Anger => self.anger,
            Emotion::Contempt => self.contempt,
            Emotion::Disgust => self.disgust,
            Emotion::Fear => self.fear,
            Emotion::Happiness => self.happiness,
            Emotion::Neutral => self.neutral,
            Emotion::Sadness => self.sadness,
            Emotion::Surprise => self.surprise,
        }
    }

    /// The single highest-scoring emotion.
    ///
    /// Ties resolve first-checked-wins in [`Emotion::ALL`] order: a later
    /// label must be strictly greater to take over. With an all-zero vector
    /// no label beats the initial zero, so the first label (anger) wins.
    pub fn dominant(&self) -> Emotion {
        let mut best = Emotion::Anger;
        let mut best_score = 0.0;
        for emotion in Emotion::ALL {
            let score = self.score(emotion);
            if score > best_score {
                best_score = score;
                best = emotion;
            }
        }
        best
    }
}

/// The attribute record the remote vision service returns per face.
///
/// The local cascade strategy never produces these. `accessories` is carried
/// through best-effort and never aggregated.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceAttributes {
    pub age: f64,
    pub gender: Gender,
    pub smile: f64,
    pub beard: f64,
    pub moustache: f64,
    pub eyewear: Eyewear,
    pub accessories: Vec<String>,
    pub emotions: EmotionScores,
}
