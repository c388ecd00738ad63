//! # Terminal Configuration
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (lowest to highest priority)
//! 1. Defaults (this file, paths under the platform data directory)
//! 2. JSON config file (`--config`, `TILL_CONFIG`, or `<data dir>/config.json`)
//! 3. Environment variables (`TILL_*`)
//! 4. Command line flags
//!
//! Shop details printed on bills are not here: they live in the database
//! (`shop_info`) so every terminal sharing a database prints the same header.
//!
//! ## Thread Safety
//! Read-only after initialization, so no lock is needed.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use till_core::ScannerTimings;
use tracing::debug;

use crate::error::{TerminalError, TerminalResult};

/// Terminal configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// SQLite database file.
    pub db_path: PathBuf,

    /// Directory that receives one PDF per bill.
    pub bills_dir: PathBuf,

    /// Name recorded on each bill as the operator.
    pub operator: String,

    /// Maximum gap between characters of one scanner burst, in ms.
    pub burst_gap_ms: u64,

    /// Silence after which an unterminated burst is accepted, in ms.
    pub idle_timeout_ms: u64,

    /// Shortest unterminated burst accepted on idle.
    pub min_burst_len: usize,
}

/// Values given on the command line. `None` keeps the lower layers.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db_path: Option<PathBuf>,
    pub bills_dir: Option<PathBuf>,
    pub operator: Option<String>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        let data_dir = data_dir();
        let timings = ScannerTimings::default();
        TerminalConfig {
            db_path: data_dir.join("till.db"),
            bills_dir: data_dir.join("bills"),
            operator: "staff".to_string(),
            burst_gap_ms: timings.burst_gap.as_millis() as u64,
            idle_timeout_ms: timings.idle_timeout.as_millis() as u64,
            min_burst_len: timings.min_burst_len,
        }
    }
}

impl TerminalConfig {
    /// Builds the configuration from every layer.
    pub fn load(file: Option<&Path>, overrides: &ConfigOverrides) -> TerminalResult<Self> {
        let default_file = data_dir().join("config.json");
        let mut config = match file {
            Some(path) => TerminalConfig::from_file(path)?,
            None if default_file.exists() => TerminalConfig::from_file(&default_file)?,
            None => TerminalConfig::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.apply_overrides(overrides);

        debug!(
            db_path = %config.db_path.display(),
            bills_dir = %config.bills_dir.display(),
            operator = %config.operator,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Reads a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> TerminalResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TerminalError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| TerminalError::config(format!("invalid {}: {}", path.display(), e)))
    }

    /// Applies `TILL_*` variables read through `lookup`.
    ///
    /// ## Variables
    /// - `TILL_DB_PATH`, `TILL_BILLS_DIR`, `TILL_OPERATOR`
    /// - `TILL_BURST_GAP_MS`, `TILL_IDLE_TIMEOUT_MS` (ignored unless numeric)
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("TILL_DB_PATH") {
            self.db_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("TILL_BILLS_DIR") {
            self.bills_dir = PathBuf::from(dir);
        }
        if let Some(operator) = lookup("TILL_OPERATOR") {
            self.operator = operator;
        }
        if let Some(ms) = lookup("TILL_BURST_GAP_MS").and_then(|v| v.parse().ok()) {
            self.burst_gap_ms = ms;
        }
        if let Some(ms) = lookup("TILL_IDLE_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.idle_timeout_ms = ms;
        }
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(path) = &overrides.db_path {
            self.db_path = path.clone();
        }
        if let Some(dir) = &overrides.bills_dir {
            self.bills_dir = dir.clone();
        }
        if let Some(operator) = &overrides.operator {
            self.operator = operator.clone();
        }
    }

    /// Decoder thresholds from the millisecond settings.
    pub fn scanner_timings(&self) -> ScannerTimings {
        ScannerTimings {
            burst_gap: Duration::from_millis(self.burst_gap_ms),
            idle_timeout: Duration::from_millis(self.idle_timeout_ms),
            min_burst_len: self.min_burst_len,
        }
    }
}

/// Platform data directory.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.till.till`
/// - **Windows**: `%APPDATA%\till\till\data`
/// - **Linux**: `~/.local/share/till`
///
/// Falls back to the working directory when no home directory is known.
pub fn data_dir() -> PathBuf {
    ProjectDirs::from("com", "till", "till")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_decoder_defaults() {
        let config = TerminalConfig::default();
        assert_eq!(config.scanner_timings(), ScannerTimings::default());
        assert_eq!(config.operator, "staff");
        assert!(config.db_path.ends_with("till.db"));
    }

    #[test]
    fn test_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "operator": "anu", "burst_gap_ms": 30 }"#).unwrap();

        let config = TerminalConfig::from_file(&path).unwrap();
        assert_eq!(config.operator, "anu");
        assert_eq!(config.burst_gap_ms, 30);
        assert_eq!(config.idle_timeout_ms, 150);
    }

    #[test]
    fn test_bad_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = TerminalConfig::from_file(&path).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ConfigError);
    }

    #[test]
    fn test_layers_in_priority_order() {
        let mut config = TerminalConfig::default();
        let env: HashMap<&str, &str> = [
            ("TILL_OPERATOR", "env-op"),
            ("TILL_DB_PATH", "/env/till.db"),
            ("TILL_IDLE_TIMEOUT_MS", "soon"),
        ]
        .into_iter()
        .collect();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.operator, "env-op");
        assert_eq!(config.db_path, PathBuf::from("/env/till.db"));
        assert_eq!(config.idle_timeout_ms, 150);

        config.apply_overrides(&ConfigOverrides {
            operator: Some("flag-op".to_string()),
            ..ConfigOverrides::default()
        });
        assert_eq!(config.operator, "flag-op");
        assert_eq!(config.db_path, PathBuf::from("/env/till.db"));
    }
}
