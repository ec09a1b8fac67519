use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cw::dit_unit;
use crate::error::{Result, TrainerError};
use crate::playback::PlaybackTiming;
use crate::trainer::RoundTiming;

/// Durations of the feedback animations, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackTiming {
    pub correct_flash_ms: u64,
    pub correct_settle_ms: u64,
    pub reveal_ms: u64,
    pub replay_hold_ms: u64,
    pub settle_ms: u64,
    pub learned_flash_ms: u64,
}

impl Default for FeedbackTiming {
    fn default() -> Self {
        Self {
            correct_flash_ms: 500,
            correct_settle_ms: 1000,
            reveal_ms: 2000,
            replay_hold_ms: 1000,
            settle_ms: 1000,
            learned_flash_ms: 500,
        }
    }
}

/// Trainer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Keying speed
    pub wpm: f32,

    // Tone settings
    pub tone_frequency: f32,
    pub tone_volume: f32,
    pub output_device: Option<String>,
    pub mute: bool,

    // Round settings
    pub time_to_guess_secs: f32,
    pub start_delay_ms: u64,
    pub resume_delay_ms: u64,
    pub feedback: FeedbackTiming,

    /// Fixed seed for the symbol order; random when unset
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wpm: 15.0,
            tone_frequency: 600.0,
            tone_volume: 0.5,
            output_device: None,
            mute: false,
            time_to_guess_secs: 1.0,
            start_delay_ms: 500,
            resume_delay_ms: 1000,
            feedback: FeedbackTiming::default(),
            seed: None,
        }
    }
}

impl Settings {
    /// Get the path to the settings file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("morse-drill");
            path.push("settings.json");
            path
        })
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::warn!(target: "settings", "Could not determine config path");
                Self::default()
            }
        }
    }

    /// Load from a specific file; any failure falls back to defaults
    pub fn load_from(path: &Path) -> Self {
        tracing::debug!(target: "settings", "Config path: {:?}", path);

        if !path.exists() {
            tracing::info!(target: "settings", "Config file does not exist, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(target: "settings", "Failed to read config file: {}", e);
                return Self::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(settings) => {
                tracing::info!(target: "settings", "Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                tracing::warn!(target: "settings", "Failed to parse config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path().ok_or_else(|| {
            TrainerError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        use std::io::Write;

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let mut file = fs::File::create(path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        tracing::info!(target: "settings", "Saved settings to {:?}", path);
        Ok(())
    }

    pub fn playback_timing(&self) -> PlaybackTiming {
        let fb = &self.feedback;
        PlaybackTiming {
            dit: dit_unit(self.wpm),
            correct_flash: Duration::from_millis(fb.correct_flash_ms),
            correct_settle: Duration::from_millis(fb.correct_settle_ms),
            reveal_hold: Duration::from_millis(fb.reveal_ms),
            replay_hold: Duration::from_millis(fb.replay_hold_ms),
            settle: Duration::from_millis(fb.settle_ms),
            learned_flash: Duration::from_millis(fb.learned_flash_ms),
        }
    }

    pub fn round_timing(&self) -> RoundTiming {
        RoundTiming {
            time_to_guess: Duration::from_secs_f32(self.time_to_guess_secs.max(0.0)),
            start_delay: Duration::from_millis(self.start_delay_ms),
            resume_delay: Duration::from_millis(self.resume_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("morse-drill-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_defaults_match_classic_trainer() {
        let settings = Settings::default();
        let playback = settings.playback_timing();
        let round = settings.round_timing();

        assert_eq!(playback.dit, Duration::from_millis(80));
        assert_eq!(playback.reveal_hold, Duration::from_secs(2));
        assert_eq!(round.time_to_guess, Duration::from_secs(1));
        assert_eq!(round.start_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("settings.json");
        let settings = Settings {
            wpm: 20.0,
            seed: Some(4),
            ..Settings::default()
        };

        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = temp_path("partial.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "wpm": 12.0, "feedback": { "reveal_ms": 100 } }"#).unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.wpm, 12.0);
        assert_eq!(settings.feedback.reveal_ms, 100);
        assert_eq!(settings.feedback.settle_ms, 1000);
        assert_eq!(settings.tone_frequency, 600.0);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_or_broken_file_uses_defaults() {
        assert_eq!(Settings::load_from(&temp_path("absent.json")), Settings::default());

        let path = temp_path("broken.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());

        let _ = fs::remove_file(&path);
    }
}
