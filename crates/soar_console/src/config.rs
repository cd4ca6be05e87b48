//! Console configuration
//!
//! Resolution order: built-in defaults, then `<home>/config.toml` (or the
//! `--config` path), then command-line overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use soar_api::DEFAULT_BASE_URL;
pub use soar_protocol::paths::{default_config_path, default_logs_dir, soar_home};

const MIN_REFRESH_SECS: u64 = 1;

fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_refresh_interval_secs() -> u64 { 5 }
fn default_advisor_enabled() -> bool { true }
fn default_notification_secs() -> u64 { 8 }
fn default_scan_history_limit() -> usize { 10 }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Backend root, e.g. `http://127.0.0.1:8000`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Poll period for stats, cases and mode
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Let the mode advisor change the backend mode after each refresh
    #[serde(default = "default_advisor_enabled")]
    pub advisor_enabled: bool,
    /// Lifetime of the advisor's auto-dismissing notification
    #[serde(default = "default_notification_secs")]
    pub notification_secs: u64,
    #[serde(default = "default_scan_history_limit")]
    pub scan_history_limit: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            refresh_interval_secs: default_refresh_interval_secs(),
            advisor_enabled: default_advisor_enabled(),
            notification_secs: default_notification_secs(),
            scan_history_limit: default_scan_history_limit(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub refresh_interval_secs: Option<u64>,
    pub disable_advisor: bool,
}

impl ConsoleConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(MIN_REFRESH_SECS))
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_secs)
    }

    pub fn apply(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(url) = &overrides.base_url {
            self.base_url = url.clone();
        }
        if let Some(secs) = overrides.refresh_interval_secs {
            self.refresh_interval_secs = secs;
        }
        if overrides.disable_advisor {
            self.advisor_enabled = false;
        }
        self.refresh_interval_secs = self.refresh_interval_secs.max(MIN_REFRESH_SECS);
        self
    }
}

/// Load configuration from `path`. A missing file yields defaults; a
/// malformed one is an error.
pub fn load_config(path: &Path) -> Result<ConsoleConfig> {
    if !path.exists() {
        return Ok(ConsoleConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: ConsoleConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

/// Load from `explicit` or the default location, then apply overrides.
pub fn resolve(
    explicit: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<(ConsoleConfig, PathBuf)> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path);
    let config = load_config(&path)?.apply(overrides);
    Ok((config, path))
}

/// `soar-console config`
pub fn run_config_command(config: &ConsoleConfig, config_path: &Path, json: bool) -> Result<()> {
    if json {
        let payload = serde_json::json!({
            "home": soar_home(),
            "config_path": config_path,
            "config_file_exists": config_path.exists(),
            "logs_dir": default_logs_dir(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("SOAR console configuration");
    println!();
    println!("Home:        {}", soar_home().display());
    println!(
        "Config file: {}{}",
        config_path.display(),
        if config_path.exists() { "" } else { " (not present, using defaults)" }
    );
    println!("Logs:        {}", default_logs_dir().display());
    println!();
    println!("base_url              = {}", config.base_url);
    println!("refresh_interval_secs = {}", config.refresh_interval_secs);
    println!("advisor_enabled       = {}", config.advisor_enabled);
    println!("notification_secs     = {}", config.notification_secs);
    println!("scan_history_limit    = {}", config.scan_history_limit);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ConsoleConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.refresh_interval(), Duration::from_secs(5));
        assert!(config.advisor_enabled);
        assert_eq!(config.notification_ttl(), Duration::from_secs(8));
        assert_eq!(config.scan_history_limit, 10);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_config(&temp.path().join("config.toml")).unwrap();
        assert_eq!(config, ConsoleConfig::default());
    }

    #[test]
    fn test_load_partial_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "base_url = \"http://soar.internal:9000\"\nadvisor_enabled = false\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.base_url, "http://soar.internal:9000");
        assert!(!config.advisor_enabled);
        assert_eq!(config.refresh_interval_secs, 5);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "refresh_interval_secs = \"soon\"\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn test_overrides_win_and_interval_is_clamped() {
        let overrides = ConfigOverrides {
            base_url: Some("http://10.1.1.1:8000".to_string()),
            refresh_interval_secs: Some(0),
            disable_advisor: true,
        };
        let config = ConsoleConfig::default().apply(&overrides);
        assert_eq!(config.base_url, "http://10.1.1.1:8000");
        assert_eq!(config.refresh_interval_secs, 1);
        assert!(!config.advisor_enabled);
    }

    #[test]
    fn test_resolve_reads_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(&path, "scan_history_limit = 3\n").unwrap();

        let (config, resolved) = resolve(Some(&path), &ConfigOverrides::default()).unwrap();
        assert_eq!(resolved, path);
        assert_eq!(config.scan_history_limit, 3);
    }
}
