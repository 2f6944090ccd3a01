use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::PathBuf, time::Duration};

use crate::{error::ConfigError, transform::CompassPolicy};

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// One of the three secrets the bot needs before it may serve requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Secret {
    WeatherApiKey,
    GeocodingApiKey,
    BotToken,
}

impl Secret {
    pub fn as_str(&self) -> &'static str {
        match self {
            Secret::WeatherApiKey => "weather_api_key",
            Secret::GeocodingApiKey => "geocoding_api_key",
            Secret::BotToken => "bot_token",
        }
    }

    /// Environment variable that overrides the value from the config file.
    pub fn env_var(&self) -> &'static str {
        match self {
            Secret::WeatherApiKey => "WEATHER_API_KEY",
            Secret::GeocodingApiKey => "GEOCODING_API_KEY",
            Secret::BotToken => "BOT_TOKEN",
        }
    }

    pub const fn all() -> &'static [Secret] {
        &[Secret::WeatherApiKey, Secret::GeocodingApiKey, Secret::BotToken]
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secrets as stored on disk; any of them may still be missing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CredentialsConfig {
    pub weather_api_key: Option<String>,
    pub geocoding_api_key: Option<String>,
    pub bot_token: Option<String>,
}

/// Optional base URL overrides for the upstream services.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Endpoints {
    pub geocoding_url: Option<String>,
    pub weather_url: Option<String>,
    pub telegram_url: Option<String>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// http_timeout_secs = 10
/// wind_compass = "sixteen"
///
/// [credentials]
/// weather_api_key = "..."
/// geocoding_api_key = "..."
/// bot_token = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub http_timeout_secs: Option<u64>,

    #[serde(default)]
    pub wind_compass: CompassPolicy,

    #[serde(default)]
    pub credentials: CredentialsConfig,

    #[serde(default)]
    pub endpoints: Endpoints,
}

/// Validated secrets, loaded once at startup and only read afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    weather_api_key: String,
    geocoding_api_key: String,
    bot_token: String,
}

impl Credentials {
    pub fn weather_api_key(&self) -> &str {
        &self.weather_api_key
    }

    pub fn geocoding_api_key(&self) -> &str {
        &self.geocoding_api_key
    }

    pub fn bot_token(&self) -> &str {
        &self.bot_token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("weather_api_key", &"<redacted>")
            .field("geocoding_api_key", &"<redacted>")
            .field("bot_token", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .map_err(|source| ConfigError::Read { path: path.clone(), source })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::Write { path: parent.to_path_buf(), source })?;
        }

        let toml = toml::to_string_pretty(self)?;

        fs::write(&path, toml).map_err(|source| ConfigError::Write { path, source })
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("dev", "weather-bot", "weather-bot")
            .ok_or(ConfigError::NoConfigDir)?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Replace file values with non-empty values returned by `lookup`, keyed by
    /// [`Secret::env_var`].
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for secret in Secret::all() {
            if let Some(value) = lookup(secret.env_var()).filter(|v| !v.trim().is_empty()) {
                self.set_credential(*secret, value);
            }
        }
    }

    pub fn set_credential(&mut self, secret: Secret, value: String) {
        let slot = match secret {
            Secret::WeatherApiKey => &mut self.credentials.weather_api_key,
            Secret::GeocodingApiKey => &mut self.credentials.geocoding_api_key,
            Secret::BotToken => &mut self.credentials.bot_token,
        };
        *slot = Some(value);
    }

    pub fn credential(&self, secret: Secret) -> Option<&str> {
        let value = match secret {
            Secret::WeatherApiKey => &self.credentials.weather_api_key,
            Secret::GeocodingApiKey => &self.credentials.geocoding_api_key,
            Secret::BotToken => &self.credentials.bot_token,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// All three secrets, or the first one that is missing.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let require = |secret: Secret| {
            self.credential(secret)
                .map(str::to_owned)
                .ok_or(ConfigError::MissingCredential(secret.as_str()))
        };

        Ok(Credentials {
            weather_api_key: require(Secret::WeatherApiKey)?,
            geocoding_api_key: require(Secret::GeocodingApiKey)?,
            bot_token: require(Secret::BotToken)?,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }
}
