use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Environment variable holding the Met Office DataHub API key.
pub const API_KEY_ENV: &str = "MET_OFFICE_API_KEY";
pub const BASE_URL_ENV: &str = "MET_OFFICE_BASE_URL";
pub const TIMEOUT_SECS_ENV: &str = "MET_OFFICE_TIMEOUT_SECS";

/// Site-specific point forecast endpoint family.
pub const DEFAULT_BASE_URL: &str = "https://data.hub.api.metoffice.gov.uk/sitespecific/v0/point";

/// Upper bound on the single upstream call, connect and body read included.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// DataHub API key. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<ApiKey>,

    /// Overrides [`DEFAULT_BASE_URL`], mostly useful against a local stub.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load the config file and apply environment overrides on top.
    pub fn resolve() -> Result<Self> {
        Ok(Self::load()?.with_env_overrides(std::env::vars()))
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("uk", "ukweather", "ukweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply `MET_OFFICE_*` variables from `pairs`. Blank values are ignored,
    /// as is a timeout that is not a positive integer.
    pub fn with_env_overrides<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let non_blank = |name: &str| {
            env.get(name)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        };

        if let Some(key) = non_blank(API_KEY_ENV) {
            self.api_key = Some(ApiKey::new(key));
        }
        if let Some(url) = non_blank(BASE_URL_ENV) {
            self.base_url = Some(url);
        }
        if let Some(secs) = non_blank(TIMEOUT_SECS_ENV)
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
        {
            self.timeout_secs = Some(secs);
        }

        self
    }

    /// Set or replace the stored API key.
    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(ApiKey::new(api_key));
    }

    pub fn api_key(&self) -> Option<&ApiKey> {
        self.api_key.as_ref()
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_datahub_with_ten_second_timeout() {
        let cfg = Config::default();

        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        assert!(cfg.api_key().is_none());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        let cfg = cfg.with_env_overrides([
            (API_KEY_ENV, "ENV_KEY"),
            (BASE_URL_ENV, "http://localhost:9999/point/"),
            (TIMEOUT_SECS_ENV, "3"),
        ]);

        assert_eq!(cfg.api_key().map(ApiKey::expose), Some("ENV_KEY"));
        assert_eq!(cfg.base_url(), "http://localhost:9999/point");
        assert_eq!(cfg.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn blank_and_invalid_env_values_are_ignored() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        let cfg = cfg.with_env_overrides([
            (API_KEY_ENV, "   "),
            (TIMEOUT_SECS_ENV, "0"),
        ]);
        assert_eq!(cfg.api_key().map(ApiKey::expose), Some("FILE_KEY"));
        assert_eq!(cfg.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let cfg = cfg.with_env_overrides([(TIMEOUT_SECS_ENV, "soon")]);
        assert_eq!(cfg.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret");
        let rendered = format!("{key:?}");

        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn save_and_load_roundtrip_through_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.timeout_secs = Some(5);
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_file_loads_empty_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = Config::load_from(&dir.path().join("absent.toml")).expect("load");

        assert_eq!(loaded, Config::default());
    }
}
