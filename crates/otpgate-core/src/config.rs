//! Configuration management for otpgate.
//!
//! Loads configuration from ${OTPGATE_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Environment variable that overrides `api.base_url`.
pub const BASE_URL_ENV: &str = "OTPGATE_API_BASE_URL";

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for otpgate configuration and data.
    //!
    //! OTPGATE_HOME resolution order:
    //! 1. OTPGATE_HOME environment variable (if set)
    //! 2. ~/.config/otpgate (default)

    use std::path::PathBuf;

    /// Environment variable that relocates every otpgate file.
    pub const HOME_ENV: &str = "OTPGATE_HOME";

    /// Returns the otpgate home directory.
    ///
    /// Checks OTPGATE_HOME first, falls back to ~/.config/otpgate and finally
    /// to a relative `.otpgate` directory when no home directory is known.
    pub fn otpgate_home() -> PathBuf {
        if let Ok(home) = std::env::var(HOME_ENV)
            && !home.trim().is_empty()
        {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".otpgate"),
            |h| h.join(".config").join("otpgate"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        otpgate_home().join("config.toml")
    }

    /// Returns the path to the persisted session file.
    pub fn session_path() -> PathBuf {
        otpgate_home().join("session.json")
    }

    /// Returns the directory that holds rolling log files.
    pub fn logs_dir() -> PathBuf {
        otpgate_home().join("logs")
    }
}

/// Remote OTP service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_otp_path: String,
    pub verify_otp_path: String,
    #[serde(deserialize_with = "string_or_number")]
    pub workshop_id: String,
    /// Zero disables the timeout.
    pub timeout_secs: u64,
}

impl ApiConfig {
    const DEFAULT_BASE_URL: &str = "https://d3631n9ke34438.cloudfront.net/api/v1/web_end_user";
    const DEFAULT_REQUEST_OTP_PATH: &str = "/auth/getotpend";
    const DEFAULT_VERIFY_OTP_PATH: &str = "/auth/verify_otp_end";
    const DEFAULT_WORKSHOP_ID: &str = "4317";

    /// Returns the base URL, preferring `OTPGATE_API_BASE_URL` when set.
    pub fn effective_base_url(&self) -> String {
        resolve_base_url(std::env::var(BASE_URL_ENV).ok(), &self.base_url)
    }

    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            request_otp_path: Self::DEFAULT_REQUEST_OTP_PATH.to_string(),
            verify_otp_path: Self::DEFAULT_VERIFY_OTP_PATH.to_string(),
            workshop_id: Self::DEFAULT_WORKSHOP_ID.to_string(),
            timeout_secs: 0,
        }
    }
}

fn resolve_base_url(env_value: Option<String>, configured: &str) -> String {
    env_value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| configured.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Accepts `workshop_id = 4317` as well as `workshop_id = "4317"`.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Calling code shown in front of the mobile number.
    pub country_code: String,
    /// Registered numbers; empty allows any valid number.
    pub allowed_mobiles: Vec<String>,
    /// Log filter used when OTPGATE_LOG is unset.
    pub log_level: String,
    pub api: ApiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            country_code: Self::DEFAULT_COUNTRY_CODE.to_string(),
            allowed_mobiles: Vec::new(),
            log_level: Self::DEFAULT_LOG_LEVEL.to_string(),
            api: ApiConfig::default(),
        }
    }
}

impl Config {
    const DEFAULT_COUNTRY_CODE: &str = "+91";
    const DEFAULT_LOG_LEVEL: &str = "info";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    ///
    /// # Errors
    /// Returns an error if the file exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Sets a single dotted key (e.g. `api.base_url`) in the config file.
    ///
    /// Only keys present in the default template are accepted, and the raw value
    /// is coerced to the template's type. Comments and unrelated keys survive.
    /// Creates the file from the template if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error for unknown keys, values of the wrong type, or I/O failures.
    pub fn set_value(path: &Path, key: &str, raw: &str) -> Result<()> {
        use toml_edit::{DocumentMut, Item};

        let template: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;
        let segments: Vec<&str> = key.split('.').collect();
        let template_value = segments
            .iter()
            .try_fold(template.as_item(), |item, segment| item.get(*segment))
            .and_then(Item::as_value)
            .with_context(|| format!("Unknown config key '{key}'"))?;
        let new_value = coerce_value(template_value, raw)
            .with_context(|| format!("Invalid value for '{key}'"))?;

        let contents = if path.exists() {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?
        } else {
            default_config_template().to_string()
        };
        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        let Some((last, parents)) = segments.split_last() else {
            anyhow::bail!("Empty config key");
        };
        let mut table = doc.as_table_mut();
        for segment in parents {
            table = table
                .entry(segment)
                .or_insert(toml_edit::table())
                .as_table_mut()
                .with_context(|| format!("'{segment}' is not a table in {}", path.display()))?;
        }
        table[*last] = Item::Value(new_value);

        let rendered = doc.to_string();
        toml::from_str::<Config>(&rendered)
            .with_context(|| format!("Invalid value for '{key}'"))?;

        Self::write_config(path, &rendered)
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

fn coerce_value(template: &toml_edit::Value, raw: &str) -> Result<toml_edit::Value> {
    use toml_edit::Value;

    let value = match template {
        Value::String(_) => Value::from(raw),
        Value::Integer(_) => {
            let n: i64 = raw
                .trim()
                .parse()
                .with_context(|| format!("'{raw}' is not an integer"))?;
            Value::from(n)
        }
        Value::Boolean(_) => {
            let b: bool = raw
                .trim()
                .parse()
                .with_context(|| format!("'{raw}' is not true or false"))?;
            Value::from(b)
        }
        Value::Array(_) => {
            let mut array = toml_edit::Array::new();
            for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                array.push(item);
            }
            Value::Array(array)
        }
        _ => anyhow::bail!("Unsupported config value type"),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.country_code, "+91");
        assert!(config.allowed_mobiles.is_empty());
        assert_eq!(config.api.request_otp_path, "/auth/getotpend");
        assert_eq!(config.api.workshop_id, "4317");
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(
            &config_path,
            "[api]\nbase_url = \"http://localhost:9000\"\n",
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:9000");
        assert_eq!(config.api.verify_otp_path, "/auth/verify_otp_end");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_numeric_workshop_id_is_accepted() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[api]\nworkshop_id = 99\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.api.workshop_id, "99");
    }

    #[test]
    fn test_default_template_parses_to_defaults() {
        let config: Config = toml::from_str(default_config_template()).unwrap();
        assert_eq!(config.api, ApiConfig::default());
        assert_eq!(config.country_code, "+91");
    }

    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        assert!(config_path.exists());
        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("workshop_id = \"4317\""));
        assert!(contents.contains("# Registered mobile numbers"));
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "").unwrap();

        assert!(Config::init(&config_path).is_err());
    }

    #[test]
    fn test_set_value_updates_nested_string_and_keeps_comments() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        Config::set_value(&config_path, "api.base_url", "http://127.0.0.1:8080").unwrap();

        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("# Base URL of the OTP service"));
        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_set_value_coerces_integers_and_lists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        Config::set_value(&config_path, "api.timeout_secs", "15").unwrap();
        Config::set_value(&config_path, "allowed_mobiles", "9876543210, 9028610795").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(
            config.allowed_mobiles,
            vec!["9876543210".to_string(), "9028610795".to_string()]
        );
    }

    #[test]
    fn test_set_value_rejects_unknown_key() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        let err = Config::set_value(&config_path, "api.nope", "x").unwrap_err();
        assert!(err.to_string().contains("Unknown config key"));
        assert!(!config_path.exists());
    }

    #[test]
    fn test_set_value_rejects_non_integer() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        assert!(Config::set_value(&config_path, "api.timeout_secs", "soon").is_err());
    }

    #[test]
    fn test_timeout_zero_disables() {
        let api = ApiConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(api.timeout(), None);

        let api = ApiConfig {
            timeout_secs: 5,
            ..Default::default()
        };
        assert_eq!(api.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_base_url_env_override_wins_and_trims_slash() {
        assert_eq!(
            resolve_base_url(Some("http://mock:1234/".to_string()), "https://prod"),
            "http://mock:1234"
        );
        assert_eq!(
            resolve_base_url(Some("  ".to_string()), "https://prod/"),
            "https://prod"
        );
        assert_eq!(resolve_base_url(None, "https://prod"), "https://prod");
    }
}
