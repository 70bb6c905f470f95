//! Application Configuration
//!
//! Monitor settings stored in TOML format. Missing keys fall back to their
//! defaults so a partial config file is always usable; the run loop re-reads
//! the file periodically and applies the runtime-mutable fields (reader
//! threshold, notification flags) without a restart.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Monitor settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Reading intake settings
    pub reader: ReaderConfig,
    /// Consensus engine thresholds
    pub consensus: ConsensusConfig,
    /// Notification settings
    pub notify: NotifyConfig,
    /// Periodic task intervals
    pub timing: TimingConfig,
}

/// Settings for the reading intake filter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Minimum recognition confidence for a line to be considered
    pub min_confidence: f64,
    /// Minimum line length in characters; shorter fragments are noise
    pub min_line_length: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.25,
            min_line_length: 3,
        }
    }
}

/// Thresholds for the consensus engine.
///
/// The similarity and Jaccard thresholds are empirically chosen values
/// carried over from field use; tune against real captures before changing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Rolling buffer capacity of the confidence aggregator
    pub buffer_size: usize,
    /// Minimum similarity for clustering lines across readings
    pub similarity_threshold: f64,
    /// Minimum similarity for an old/new line pair to count as an edit
    pub edit_threshold: f64,
    /// Jaccard similarity below which an unexplained change is a scene change
    pub camera_moved_threshold: f64,
    /// How long a detection state must persist before it is confirmed
    pub debounce_seconds: f64,
    /// Majority-vote window over per-frame detection, in frames
    pub smoothing_window: usize,
    /// How many recent history records a consensus query considers
    pub history_window: usize,
    /// How many top texts a history consensus query reports
    pub history_top_k: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            buffer_size: 10,
            similarity_threshold: 0.6,
            edit_threshold: 0.6,
            camera_moved_threshold: 0.3,
            debounce_seconds: 2.0,
            smoothing_window: 5,
            history_window: 10,
            history_top_k: 5,
        }
    }
}

/// Notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Emit change notifications at all
    pub enabled: bool,
    /// Suppress cleared-board notifications, only announce new text
    pub quiet: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            quiet: false,
        }
    }
}

/// Intervals for periodic side tasks in the run loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Seconds between status file refreshes
    pub status_interval_secs: u64,
    /// Seconds between config file re-reads
    pub config_check_interval_secs: u64,
    /// Minimum seconds between quality feedback messages
    pub feedback_interval_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            status_interval_secs: 10,
            config_check_interval_secs: 2,
            feedback_interval_secs: 30,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert!((config.reader.min_confidence - 0.25).abs() < 1e-9);
        assert_eq!(config.reader.min_line_length, 3);

        assert_eq!(config.consensus.buffer_size, 10);
        assert!((config.consensus.similarity_threshold - 0.6).abs() < 1e-9);
        assert!((config.consensus.edit_threshold - 0.6).abs() < 1e-9);
        assert!((config.consensus.camera_moved_threshold - 0.3).abs() < 1e-9);
        assert!((config.consensus.debounce_seconds - 2.0).abs() < 1e-9);
        assert_eq!(config.consensus.smoothing_window, 5);
        assert_eq!(config.consensus.history_window, 10);
        assert_eq!(config.consensus.history_top_k, 5);

        assert!(config.notify.enabled);
        assert!(!config.notify.quiet);

        assert_eq!(config.timing.status_interval_secs, 10);
        assert_eq!(config.timing.config_check_interval_secs, 2);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AppConfig::default();

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.consensus.buffer_size, parsed.consensus.buffer_size);
        assert_eq!(config.notify.enabled, parsed.notify.enabled);
        assert!((config.reader.min_confidence - parsed.reader.min_confidence).abs() < 1e-9);
    }

    #[test]
    fn test_partial_config_gets_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [reader]
            min_confidence = 0.5
            "#,
        )
        .unwrap();

        assert!((parsed.reader.min_confidence - 0.5).abs() < 1e-9);
        // Everything unspecified falls back to defaults
        assert_eq!(parsed.reader.min_line_length, 3);
        assert_eq!(parsed.consensus.buffer_size, 10);
        assert!(parsed.notify.enabled);
    }

    #[test]
    fn test_save_and_load_config() {
        let mut config = AppConfig::default();
        config.reader.min_confidence = 0.4;
        config.notify.quiet = true;

        let temp_file = NamedTempFile::new().unwrap();
        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert!((loaded.reader.min_confidence - 0.4).abs() < 1e-9);
        assert!(loaded.notify.quiet);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
