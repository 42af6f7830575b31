//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `webthing.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Which things are served and how they are addressed.
    pub things: ThingsConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Path prefix every thing href is mounted under (empty for the root).
    pub base_path: String,
}

/// Addressing mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Serve the lamp alone at the root.
    #[default]
    Single,
    /// Serve every virtual thing under `/things/{index}`.
    Multiple,
}

impl std::str::FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "multiple" => Ok(Self::Multiple),
            other => Err(ConfigError::Validation(format!(
                "unknown things mode `{other}`"
            ))),
        }
    }
}

/// Served things.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ThingsConfig {
    pub mode: Mode,
    /// Period of simulated humidity readings, in milliseconds.
    pub sensor_interval_ms: u64,
    /// Web UI advertised as a `text/html` alternate link on every thing.
    pub ui_href: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `webthing.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if an
    /// override or the merged result is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("webthing.toml")?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = var("WEBTHING_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("WEBTHING_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("WEBTHING_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("WEBTHING_BASE_PATH") {
            self.server.base_path = val;
        }
        if let Some(val) = var("WEBTHING_MODE") {
            self.things.mode = val.parse()?;
        }
        if let Some(val) = var("WEBTHING_UI_HREF") {
            self.things.ui_href = Some(val).filter(|href| !href.is_empty());
        }
        if let Some(val) = var("WEBTHING_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if !self.server.base_path.is_empty() && !self.server.base_path.starts_with('/') {
            return Err(ConfigError::Validation(
                "base_path must be empty or start with `/`".to_string(),
            ));
        }
        if self.things.sensor_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "sensor_interval_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn sensor_interval(&self) -> Duration {
        Duration::from_millis(self.things.sensor_interval_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8888,
            base_path: String::new(),
        }
    }
}

impl Default for ThingsConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Single,
            sensor_interval_ms: 3000,
            ui_href: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "webthingd=info,webthing=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
