use crate::error::{BridgeError, Result};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Poll period used when none (or zero) is configured.
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 60_000;

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    let Ok(content) = fs::read_to_string(env_path) else {
        return;
    };

    for (key, value) in parse_dotenv(&content) {
        // Only set if not already set (env vars take precedence)
        if std::env::var(key).is_err() {
            // SAFETY: We're single-threaded at this point (called before any async runtime)
            unsafe { std::env::set_var(key, value) };
        }
    }
}

fn parse_dotenv(content: &str) -> Vec<(&str, &str)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            let mut value = value.trim();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = &value[1..value.len() - 1];
            }
            Some((key.trim(), value))
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub accessory: AccessoryConfig,
    pub poller: PollerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessoryConfig {
    pub name: String,
}

/// Poller configuration as injected by the host.
///
/// Keys follow the host's camelCase convention (`url`, `updateInterval`).
/// Deserializing never fails on a bad `updateInterval`; it falls back to the
/// default with a warning.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", from = "PollerFile")]
pub struct PollerConfig {
    /// Endpoint to poll. Missing URL only surfaces when a fetch runs.
    pub url: Option<String>,
    /// Poll period in milliseconds.
    pub update_interval: Option<u64>,
    pub fields: FieldNames,
}

/// Keys present in a host config document. Absent keys leave the target untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PollerFile {
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient_interval")]
    update_interval: Option<u64>,
    #[serde(default)]
    fields: FieldOverrides,
}

#[derive(Debug, Default, Deserialize)]
struct FieldOverrides {
    temperature: Option<String>,
    humidity: Option<String>,
    light: Option<String>,
}

impl From<PollerFile> for PollerConfig {
    fn from(file: PollerFile) -> Self {
        let mut config = Self::default();
        config.apply(file);
        config
    }
}

/// Accept an integer or a numeric string; anything else means "use the default".
fn lenient_interval<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let ms = match &value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if ms.is_none() {
        warn!(
            "Ignoring invalid updateInterval {}, using {} ms",
            value, DEFAULT_UPDATE_INTERVAL_MS
        );
    }
    Ok(ms)
}

/// JSON keys holding the three readings in the response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FieldNames {
    pub temperature: String,
    pub humidity: String,
    pub light: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            // Sic: this is the key the sensor firmware publishes.
            temperature: "temperature_celcius".to_string(),
            humidity: "humidity_percent".to_string(),
            light: "lux".to_string(),
        }
    }
}

impl PollerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_update_interval_ms(mut self, ms: u64) -> Self {
        self.update_interval = Some(ms);
        self
    }

    /// Parse the JSON object the host hands to the accessory.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config = Self::default();
        config.merge_json(json)?;
        Ok(config)
    }

    /// Overwrite only the keys present in `json`.
    pub fn merge_json(&mut self, json: &str) -> Result<()> {
        let file: PollerFile = serde_json::from_str(json)?;
        self.apply(file);
        Ok(())
    }

    fn apply(&mut self, file: PollerFile) {
        if let Some(url) = file.url {
            self.url = Some(url);
        }
        if let Some(ms) = file.update_interval {
            self.update_interval = Some(ms);
        }
        if let Some(field) = file.fields.temperature {
            self.fields.temperature = field;
        }
        if let Some(field) = file.fields.humidity {
            self.fields.humidity = field;
        }
        if let Some(field) = file.fields.light {
            self.fields.light = field;
        }
    }

    /// Effective poll period. Zero falls back to the default like an unset value.
    pub fn poll_interval(&self) -> Duration {
        let ms = match self.update_interval {
            Some(ms) if ms > 0 => ms,
            _ => DEFAULT_UPDATE_INTERVAL_MS,
        };
        Duration::from_millis(ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            accessory: AccessoryConfig {
                name: "HTTP Sensor".to_string(),
            },
            poller: PollerConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from defaults plus whatever `lookup` returns for the known keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(name) = lookup("ACCESSORY_NAME") {
            config.accessory.name = name;
        }
        if let Some(url) = lookup("SENSOR_URL") {
            config.poller.url = Some(url);
        }
        if let Some(interval) = lookup("SENSOR_UPDATE_INTERVAL_MS")
            && let Ok(ms) = interval.parse()
        {
            config.poller.update_interval = Some(ms);
        }

        // Response field names
        if let Some(field) = lookup("SENSOR_FIELD_TEMPERATURE") {
            config.poller.fields.temperature = field;
        }
        if let Some(field) = lookup("SENSOR_FIELD_HUMIDITY") {
            config.poller.fields.humidity = field;
        }
        if let Some(field) = lookup("SENSOR_FIELD_LIGHT") {
            config.poller.fields.light = field;
        }

        config
    }

    /// Layer a host-style JSON file over the poller section.
    ///
    /// Keys in the file win; keys it leaves out keep their environment values.
    pub fn with_poller_file(mut self, path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        self.poller.merge_json(&content)?;
        Ok(self)
    }

    /// Check that the configuration is usable for a long-running bridge.
    pub fn validate(&self) -> Result<()> {
        if self.accessory.name.trim().is_empty() {
            return Err(BridgeError::InvalidConfig(
                "accessory name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
