//! Config: settings file loading.
//!
//! Priority: command-line flags > config file > defaults. The file is
//! optional unless its path was given explicitly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use unitscope_logs::LogPalette;
use unitscope_types::SeverityThreshold;

/// Longest look-back accepted, ten years
pub const MAX_SINCE_HOURS: u64 = 10 * 365 * 24;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Log color palette: "terminal" or "ice"
    pub theme: String,

    /// Hours of history replayed before following
    pub since_hours: u64,

    /// Lines buffered between a reader and its pump
    pub channel_capacity: usize,

    pub pump_interval_ms: u64,

    /// Lines kept in the main log view
    pub buffer_size: usize,

    /// Initial severity threshold (0-7)
    pub threshold: u8,

    /// Start with inactive units hidden
    pub active_only: bool,

    /// Diagnostic log destination (stderr when unset)
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "terminal".to_string(),
            since_hours: 24,
            channel_capacity: 1024,
            pump_interval_ms: 50,
            buffer_size: 10_000,
            threshold: SeverityThreshold::default().level(),
            active_only: false,
            log_file: None,
        }
    }
}

impl Config {
    /// Load from `path`, or from the per-user default location.
    ///
    /// A missing default file yields the defaults; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// `<config_dir>/unitscope/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join("unitscope").join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<()> {
        if LogPalette::by_name(&self.theme).is_none() {
            bail!("unknown theme '{}' (expected 'terminal' or 'ice')", self.theme);
        }
        if self.threshold > SeverityThreshold::MAX {
            bail!("threshold must be between 0 and {}", SeverityThreshold::MAX);
        }
        if self.since_hours > MAX_SINCE_HOURS {
            bail!("since_hours must be at most {}", MAX_SINCE_HOURS);
        }
        if self.channel_capacity == 0 {
            bail!("channel_capacity must be > 0");
        }
        if self.buffer_size == 0 {
            bail!("buffer_size must be > 0");
        }
        if self.pump_interval_ms == 0 {
            bail!("pump_interval_ms must be > 0");
        }
        Ok(())
    }

    pub fn palette(&self) -> LogPalette {
        LogPalette::by_name(&self.theme).unwrap_or_default()
    }

    pub fn since(&self) -> Duration {
        Duration::from_secs(self.since_hours.saturating_mul(60 * 60))
    }

    pub fn pump_interval(&self) -> Duration {
        Duration::from_millis(self.pump_interval_ms)
    }

    pub fn threshold(&self) -> SeverityThreshold {
        SeverityThreshold::new(self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file() {
        let config = Config::parse(
            r#"
            theme = "ice"
            since_hours = 2
            active_only = true
            log_file = "/tmp/unitscope.log"
            "#,
        )
        .unwrap();

        assert_eq!(config.palette(), LogPalette::ice());
        assert_eq!(config.since(), Duration::from_secs(7200));
        assert!(config.active_only);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/unitscope.log")));
        assert_eq!(config.channel_capacity, 1024);
        assert_eq!(config.pump_interval(), Duration::from_millis(50));
        assert_eq!(config.threshold().level(), 6);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::parse("colour = \"red\"").is_err());
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let bad_theme = Config {
            theme: "solarized".to_string(),
            ..Default::default()
        };
        assert!(bad_theme.validate().is_err());

        let bad_threshold = Config {
            threshold: 8,
            ..Default::default()
        };
        assert!(bad_threshold.validate().is_err());

        let no_capacity = Config {
            channel_capacity: 0,
            ..Default::default()
        };
        assert!(no_capacity.validate().is_err());

        let far_back = Config {
            since_hours: MAX_SINCE_HOURS + 1,
            ..Default::default()
        };
        assert!(far_back.validate().is_err());
    }

    #[test]
    fn test_since_does_not_overflow() {
        let config = Config {
            since_hours: u64::MAX,
            ..Default::default()
        };
        assert_eq!(config.since(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_missing_explicit_file_errors() {
        let path = Path::new("/nonexistent/unitscope/config.toml");
        assert!(Config::load(Some(path)).is_err());
    }
}
