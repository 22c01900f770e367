//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `farmhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

use farmhub_adapter_mqtt::MqttConfig;
use farmhub_domain::device::DeviceName;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// MQTT broker settings.
    pub mqtt: MqttConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Actuators the hub accepts commands for.
    pub devices: DevicesConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Registered actuators.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DevicesConfig {
    /// Device names addressable through `/control/{target}`.
    pub names: Vec<String>,
}

impl Config {
    /// Load configuration from `farmhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, if an
    /// environment override is unparseable, or if a configured value fails
    /// validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("farmhub.toml")?;
        config.apply_env_overrides()?;
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

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("FARMHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("FARMHUB_PORT") {
            self.server.port = parse_port("FARMHUB_PORT", &val)?;
        }
        if let Ok(val) = std::env::var("FARMHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                self.server.port = parse_port("FARMHUB_BIND", port)?;
            }
        }
        if let Ok(val) = std::env::var("FARMHUB_MQTT_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Ok(val) = std::env::var("FARMHUB_MQTT_PORT") {
            self.mqtt.broker_port = parse_port("FARMHUB_MQTT_PORT", &val)?;
        }
        if let Ok(val) = std::env::var("FARMHUB_DEVICES") {
            self.devices.names = val.split(',').map(str::to_string).collect();
        }
        if let Ok(val) = std::env::var("FARMHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.devices.names.is_empty() {
            return Err(ConfigError::Validation(
                "at least one device must be configured".to_string(),
            ));
        }
        for name in &self.devices.names {
            if name.parse::<DeviceName>().is_err() {
                return Err(ConfigError::Validation(format!(
                    "invalid device name: {name}"
                )));
            }
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the configured device names as validated domain values.
    ///
    /// # Errors
    ///
    /// Returns an error if a name slipped past validation (e.g. when
    /// constructed directly rather than through [`Config::load`]).
    pub fn device_names(&self) -> Result<Vec<DeviceName>, ConfigError> {
        self.devices
            .names
            .iter()
            .map(|name| {
                name.parse::<DeviceName>()
                    .map_err(|err| ConfigError::Validation(err.to_string()))
            })
            .collect()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "farmhubd=info,farmhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            names: ["cooling_fan", "water_pump", "misting", "light"]
                .map(str::to_string)
                .to_vec(),
        }
    }
}

fn parse_port(var: &str, val: &str) -> Result<u16, ConfigError> {
    val.parse().map_err(|_| {
        ConfigError::Validation(format!("{var} must be a port number, got '{val}'"))
    })
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
