//! Capture configuration model.
//!
//! A [`CaptureConfig`] is handed to a capture session at construction time.
//! There is no process-wide snaplen: independent sessions carry independent
//! configurations.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_SNAPLEN, MAX_SNAPLEN};
use crate::error::{Result, ScapError};

/// Configuration for a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Maximum number of bytes captured for any single buffer parameter.
    pub snaplen: usize,
    /// Bound of the queue between the interception probe and the encoder.
    pub channel_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            snaplen: DEFAULT_SNAPLEN,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl CaptureConfig {
    /// Returns a default configuration with the given snaplen.
    #[must_use]
    pub fn with_snaplen(snaplen: usize) -> Self {
        Self {
            snaplen,
            ..Self::default()
        }
    }

    /// Checks that every field is within its allowed range.
    ///
    /// # Errors
    ///
    /// Returns `ScapError::Config` if the snaplen is zero or does not fit the
    /// wire size field, or if the channel capacity is zero.
    pub fn validate(&self) -> Result<()> {
        if self.snaplen == 0 {
            return Err(ScapError::Config {
                message: "snaplen must be greater than zero".into(),
            });
        }
        if self.snaplen > MAX_SNAPLEN {
            return Err(ScapError::Config {
                message: format!("snaplen {} exceeds maximum {MAX_SNAPLEN}", self.snaplen),
            });
        }
        if self.channel_capacity == 0 {
            return Err(ScapError::Config {
                message: "channel_capacity must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Loads and validates a configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// holds out-of-range values.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading capture configuration");
        let content = std::fs::read_to_string(path).map_err(|e| ScapError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CaptureConfig::default();
        assert_eq!(config.snaplen, DEFAULT_SNAPLEN);
        config.validate().expect("default must validate");
    }

    #[test]
    fn zero_snaplen_is_rejected() {
        let err = CaptureConfig::with_snaplen(0).validate().unwrap_err();
        assert!(err.to_string().contains("snaplen"));
    }

    #[test]
    fn zero_channel_capacity_is_rejected() {
        let config = CaptureConfig {
            channel_capacity: 0,
            ..CaptureConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("capture.json");
        std::fs::write(&path, r#"{ "snaplen": 4096 }"#).expect("write");

        let config = CaptureConfig::load(&path).expect("load");
        assert_eq!(config.snaplen, 4096);
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn load_missing_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        let err = CaptureConfig::load(&path).unwrap_err();
        assert!(matches!(err, ScapError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn load_rejects_malformed_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ snaplen: ").expect("write");
        assert!(matches!(
            CaptureConfig::load(&path),
            Err(ScapError::Serialization { .. })
        ));
    }
}
