pub const FACE_CASCADE_FILENAME: &str = "haarcascade_frontalface_default.xml";
pub const EYE_CASCADE_FILENAME: &str = "haarcascade_eye.xml";

/// Multi-scale cascade sweep: window growth per pass.
pub const CASCADE_SCALE_FACTOR: f64 = 1.1;
/// Neighbor votes required to accept a candidate window.
pub const CASCADE_MIN_NEIGHBORS: i32 = 10;
/// Smallest detectable object, in pixels (applies to faces and eyes).
pub const CASCADE_MIN_SIZE: i32 = 20;

/// Smile score at or above this counts as a smile.
pub const SMILE_THRESHOLD: f64 = 0.5;
/// Beard or moustache score strictly above this counts toward the facial-hair tally.
pub const FACIAL_HAIR_THRESHOLD: f64 = 0.3;

/// JPEG quality for frames shipped to the remote vision service.
pub const REMOTE_JPEG_QUALITY: u8 = 90;

/// Minimum supported detection interval.
pub const MIN_DETECTION_INTERVAL_SECS: u64 = 1;
