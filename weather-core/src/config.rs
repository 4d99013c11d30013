use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::provider::ProviderId;

/// Timezone used for local times and dates when none is configured.
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

/// Per-call timeout for outbound requests when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Environment variables that override the config file.
pub const GEOCODING_API_KEY_ENV: &str = "GEOCODING_API_KEY";
pub const WEATHER_API_KEY_ENV: &str = "WEATHER_API_KEY";
pub const TIMEZONE_ENV: &str = "WEATHER_TIMEZONE";

/// Dotenv file read from the working directory by [`Config::load_with_env`].
pub const DOTENV_FILE: &str = ".env";

/// Configuration for a single provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    pub api_key: String,

    /// Overrides the provider's public endpoint, e.g. for a proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// IANA timezone name, e.g. "Asia/Kolkata".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load from disk, then apply overrides from the process environment and
    /// from `./.env`. Process variables take precedence over the file.
    pub fn load_with_env() -> Result<Self> {
        let mut cfg = Self::load()?;
        let dotenv = read_dotenv(Path::new(DOTENV_FILE))?;
        cfg.apply_env_overrides(layered(|name| env::var(name).ok(), &dotenv));
        Ok(cfg)
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup(GEOCODING_API_KEY_ENV) {
            self.upsert_provider_api_key(ProviderId::OpenCage, key);
        }
        if let Some(key) = lookup(WEATHER_API_KEY_ENV) {
            self.upsert_provider_api_key(ProviderId::OpenWeather, key);
        }
        if let Some(tz) = lookup(TIMEZONE_ENV) {
            self.timezone = Some(tz);
        }
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "city-weather", "weather-web")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set or replace a provider API key, keeping any base URL override.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers
            .entry(provider_id.as_str().to_string())
            .and_modify(|cfg| cfg.api_key = api_key.clone())
            .or_insert(ProviderConfig { api_key, base_url: None });
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id).map(|cfg| cfg.api_key.as_str())
    }

    pub fn provider_base_url(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id).and_then(|cfg| cfg.base_url.as_deref())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    /// API key for a provider, or an error telling the operator how to set it.
    pub fn require_api_key(&self, id: ProviderId) -> Result<&str> {
        self.provider_api_key(id).ok_or_else(|| {
            anyhow!(
                "No API key configured for provider '{id}'.\n\
                 Hint: set {} or run `weather-web configure {id}`.",
                id.env_var()
            )
        })
    }

    pub fn timezone(&self) -> Result<Tz> {
        let name = self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE);
        name.parse::<Tz>()
            .map_err(|e| anyhow!("Invalid timezone '{name}': {e}"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }
}

/// Variables from a dotenv file. A missing file yields no variables.
pub fn read_dotenv(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    dotenvy::from_path_iter(path)
        .with_context(|| format!("Failed to open env file: {}", path.display()))?
        .map(|item| item.with_context(|| format!("Failed to parse env file: {}", path.display())))
        .collect()
}

/// Look a name up in `primary`, falling back to `dotenv` when unset or blank.
fn layered<'a, P>(primary: P, dotenv: &'a HashMap<String, String>) -> impl Fn(&str) -> Option<String> + 'a
where
    P: Fn(&str) -> Option<String> + 'a,
{
    move |name| {
        primary(name)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| dotenv.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn require_api_key_errors_when_missing() {
        let cfg = Config::default();
        let err = cfg.require_api_key(ProviderId::OpenCage).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No API key configured for provider 'opencage'"));
        assert!(msg.contains("GEOCODING_API_KEY"));
    }

    #[test]
    fn env_overrides_set_both_keys() {
        let mut cfg = Config::default();
        cfg.apply_env_overrides(env_of(&[
            ("GEOCODING_API_KEY", "GEO"),
            ("WEATHER_API_KEY", "OWM"),
        ]));

        assert_eq!(cfg.provider_api_key(ProviderId::OpenCage), Some("GEO"));
        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeather), Some("OWM"));
        assert!(cfg.timezone.is_none());
    }

    #[test]
    fn env_override_keeps_base_url_and_ignores_blank_values() {
        let mut cfg = Config::from_toml(
            r#"
            [providers.openweather]
            api_key = "FILE_KEY"
            base_url = "http://localhost:9999"
            "#,
        )
        .unwrap();

        cfg.apply_env_overrides(env_of(&[("WEATHER_API_KEY", "ENV_KEY"), ("GEOCODING_API_KEY", "  ")]));

        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeather), Some("ENV_KEY"));
        assert_eq!(
            cfg.provider_base_url(ProviderId::OpenWeather),
            Some("http://localhost:9999")
        );
        assert!(!cfg.is_provider_configured(ProviderId::OpenCage));
    }

    #[test]
    fn dotenv_file_supplies_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(
            &path,
            "# deployment secrets\nGEOCODING_API_KEY=geo-from-file\nWEATHER_API_KEY=\"owm-from-file\"\n",
        )
        .unwrap();

        let vars = read_dotenv(&path).unwrap();
        let mut cfg = Config::default();
        cfg.apply_env_overrides(layered(|_| None, &vars));

        assert_eq!(cfg.provider_api_key(ProviderId::OpenCage), Some("geo-from-file"));
        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeather), Some("owm-from-file"));
    }

    #[test]
    fn process_env_wins_over_dotenv_file() {
        let vars = HashMap::from([
            ("GEOCODING_API_KEY".to_string(), "geo-from-file".to_string()),
            ("WEATHER_API_KEY".to_string(), "owm-from-file".to_string()),
        ]);

        let mut cfg = Config::default();
        cfg.apply_env_overrides(layered(
            env_of(&[("GEOCODING_API_KEY", "geo-from-env"), ("WEATHER_API_KEY", "")]),
            &vars,
        ));

        assert_eq!(cfg.provider_api_key(ProviderId::OpenCage), Some("geo-from-env"));
        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeather), Some("owm-from-file"));
    }

    #[test]
    fn missing_dotenv_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let vars = read_dotenv(&dir.path().join(".env")).unwrap();
        assert!(vars.is_empty());
    }

    #[test]
    fn timezone_defaults_to_kolkata() {
        let cfg = Config::default();
        assert_eq!(cfg.timezone().unwrap(), chrono_tz::Asia::Kolkata);
    }

    #[test]
    fn invalid_timezone_is_an_error() {
        let cfg = Config {
            timezone: Some("Mars/Olympus_Mons".into()),
            ..Config::default()
        };
        let err = cfg.timezone().unwrap_err();
        assert!(err.to_string().contains("Invalid timezone 'Mars/Olympus_Mons'"));
    }

    #[test]
    fn request_timeout_default_and_override() {
        let mut cfg = Config::default();
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));

        cfg.request_timeout_secs = Some(3);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn toml_roundtrip_preserves_fields() {
        let mut cfg = Config {
            timezone: Some("Europe/London".into()),
            ..Config::default()
        };
        cfg.upsert_provider_api_key(ProviderId::OpenCage, "GEO".into());

        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed, cfg);
    }
}
