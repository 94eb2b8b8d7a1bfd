use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use standwatch_core::detection::domain::detector::DetectorKind;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Pipeline configuration persisted as JSON.
///
/// Secrets (the vision-service key and the telemetry access key) are never
/// stored here; they come from flags or environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Camera index: 0 is the built-in or first USB camera.
    pub camera_id: i32,
    /// Seconds between detection cycles.
    pub interval_secs: u64,
    pub detector: DetectorKind,
    /// Directory holding the face and eye cascade model files.
    pub cascade_dir: PathBuf,
    pub remote_endpoint: String,
    pub telemetry_endpoint: String,
    pub device_id: String,
    pub show_camera_preview: bool,
    pub show_detection_preview: bool,
    pub publish_telemetry: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera_id: 0,
            interval_secs: 5,
            detector: DetectorKind::Local,
            cascade_dir: PathBuf::from("assets/cascades"),
            remote_endpoint: "https://westus.api.cognitive.microsoft.com/face/v1.0".to_string(),
            telemetry_endpoint: String::new(),
            device_id: "stand-01".to_string(),
            show_camera_preview: false,
            show_detection_preview: true,
            publish_telemetry: false,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Standwatch").join("settings.json"))
    }

    /// Loads settings from `path` when given (errors are fatal: a named
    /// file must be valid), otherwise from the platform config location
    /// falling back to defaults when absent.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load_file(path),
            None => Ok(Self::config_path()
                .filter(|p| p.exists())
                .and_then(|p| Self::load_file(&p).ok())
                .unwrap_or_default()),
        }
    }

    fn load_file(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, json)
    }

    pub fn face_cascade_path(&self) -> PathBuf {
        self.cascade_dir
            .join(standwatch_core::shared::constants::FACE_CASCADE_FILENAME)
    }

    pub fn eye_cascade_path(&self) -> PathBuf {
        self.cascade_dir
            .join(standwatch_core::shared::constants::EYE_CASCADE_FILENAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_local_strategy() {
        let settings = Settings::default();
        assert_eq!(settings.detector, DetectorKind::Local);
        assert_eq!(settings.camera_id, 0);
        assert!(!settings.publish_telemetry);
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.detector = DetectorKind::Remote;
        settings.interval_secs = 10;
        settings.device_id = "stand-42".to_string();
        settings.save_to(&path).unwrap();

        let reloaded = Settings::load(Some(&path)).unwrap();
        assert_eq!(reloaded.detector, DetectorKind::Remote);
        assert_eq!(reloaded.interval_secs, 10);
        assert_eq!(reloaded.device_id, "stand-42");
    }

    #[test]
    fn test_named_missing_file_is_an_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/settings.json"))).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn test_named_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{broken").unwrap();
        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"interval_secs": 3}"#).unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.interval_secs, 3);
        assert_eq!(settings.detector, DetectorKind::Local);
    }

    #[test]
    fn test_cascade_paths_join_the_configured_directory() {
        let mut settings = Settings::default();
        settings.cascade_dir = PathBuf::from("/opt/models");
        assert_eq!(
            settings.face_cascade_path(),
            PathBuf::from("/opt/models/haarcascade_frontalface_default.xml")
        );
        assert_eq!(
            settings.eye_cascade_path(),
            PathBuf::from("/opt/models/haarcascade_eye.xml")
        );
    }
}
