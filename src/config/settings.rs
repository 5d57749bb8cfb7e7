//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every field has a default, so a partial `settings.toml` is valid.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// RecorderConfig
// ---------------------------------------------------------------------------

/// Where and how recordings are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Directory for new recordings — `None` means the platform temp dir.
    pub output_dir: Option<PathBuf>,
    /// File name of the recording inside `output_dir`.
    pub file_name: String,
    /// Integer PCM width stored in the file (8, 16, 24 or 32).
    pub bits_per_sample: u16,
    /// Stop automatically after this many seconds — `None` records until
    /// interrupted.
    pub max_recording_secs: Option<f32>,
    /// Identifier attached to every captured frame (shown in level logs).
    pub source_id: Option<String>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            file_name: "recording.wav".into(),
            bits_per_sample: 16,
            max_recording_secs: None,
            source_id: None,
        }
    }
}

impl RecorderConfig {
    /// Full destination path, falling back to `paths.recordings_dir`.
    pub fn output_path(&self, paths: &AppPaths) -> PathBuf {
        self.output_dir
            .as_deref()
            .unwrap_or(&paths.recordings_dir)
            .join(&self.file_name)
    }
}

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// Settings for the audio input device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Audio input device name — `None` means the system default.
    pub device: Option<String>,
    /// Log the input level every N captured buffers (`0` disables).
    pub level_report_every: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: None,
            level_report_every: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use wav_recorder::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Output file settings.
    pub recorder: RecorderConfig,
    /// Input device settings.
    pub capture: CaptureConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(original, loaded);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.recorder.file_name, "recording.wav");
        assert_eq!(cfg.recorder.bits_per_sample, 16);
        assert!(cfg.recorder.output_dir.is_none());
        assert!(cfg.recorder.max_recording_secs.is_none());
        assert!(cfg.capture.device.is_none());
        assert_eq!(cfg.capture.level_report_every, 50);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[recorder]\nbits_per_sample = 24\n").unwrap();

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.recorder.bits_per_sample, 24);
        assert_eq!(cfg.recorder.file_name, "recording.wav");
        assert_eq!(cfg.capture, CaptureConfig::default());
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "recorder = 5").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.toml"));
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.recorder.output_dir = Some(PathBuf::from("/srv/takes"));
        cfg.recorder.file_name = "session-7.wav".into();
        cfg.recorder.bits_per_sample = 32;
        cfg.recorder.max_recording_secs = Some(90.0);
        cfg.recorder.source_id = Some("booth-2".into());
        cfg.capture.device = Some("USB Audio".into());
        cfg.capture.level_report_every = 25;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn output_path_prefers_configured_dir() {
        let paths = AppPaths::new();
        let mut rec = RecorderConfig::default();
        assert_eq!(
            rec.output_path(&paths),
            paths.recordings_dir.join("recording.wav")
        );

        rec.output_dir = Some(PathBuf::from("/data"));
        assert_eq!(rec.output_path(&paths), PathBuf::from("/data/recording.wav"));
    }
}
