//! Area and alert tier configuration, loaded once at startup.
//!
//! ```toml
//! [areas."Menlo Park"]
//! sensors = ["66025", 19391]
//! link = "https://www.purpleair.com/map?opt=1/i/mAQI/a10/cC1&select={sensor}"
//!
//! [[tiers]]
//! threshold = 50
//! key = "last-notified-good"
//! badge = "💚"
//! template = "AQI at {area} is now {aqi}"
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::tier::{AlertTier, AlertTiers};

/// Placeholder in an area link template replaced with a sensor id.
pub const SENSOR_PLACEHOLDER: &str = "{sensor}";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    pub name: String,

    pub sensors: Vec<String>,

    pub link: String,
}

impl Area {
    /// The sensor the map link points at: the first one configured.
    pub fn representative_sensor(&self) -> &str {
        self.sensors.first().map(String::as_str).unwrap_or_default()
    }

    pub fn map_link(&self) -> String {
        self.link
            .replace(SENSOR_PLACEHOLDER, self.representative_sensor())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Areas in the order they are polled.
    pub areas: IndexMap<String, Area>,

    /// Tiers from the config file, if it defines any.
    pub tiers: Option<AlertTiers>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    areas: IndexMap<String, RawArea>,

    #[serde(default)]
    tiers: Vec<AlertTier>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawArea {
    sensors: Vec<RawSensorId>,
    link: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSensorId {
    Text(String),
    Number(u64),
}

impl RawSensorId {
    fn into_string(self) -> String {
        match self {
            RawSensorId::Text(s) => s.trim().to_string(),
            RawSensorId::Number(n) => n.to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(s)?;

        if raw.areas.is_empty() {
            return Err(ConfigError::Invalid("no areas configured".to_string()));
        }

        let mut areas = IndexMap::with_capacity(raw.areas.len());
        for (name, area) in raw.areas {
            let area = validate_area(name.trim(), area)?;
            if areas.contains_key(&area.name) {
                return Err(ConfigError::Invalid(format!("duplicate area {}", area.name)));
            }
            areas.insert(area.name.clone(), area);
        }

        let tiers = if raw.tiers.is_empty() {
            None
        } else {
            Some(AlertTiers::new(raw.tiers)?)
        };

        Ok(Self { areas, tiers })
    }

    /// Tiers from the config file, or the two default tiers built from
    /// the given thresholds.
    pub fn resolve_tiers(
        &self,
        good_aqi: u32,
        acceptable_aqi: u32,
    ) -> Result<AlertTiers, ConfigError> {
        match &self.tiers {
            Some(tiers) => Ok(tiers.clone()),
            None => AlertTiers::defaults(good_aqi, acceptable_aqi),
        }
    }

    pub fn area(&self, name: &str) -> Option<&Area> {
        self.areas.get(name)
    }
}

fn validate_area(name: &str, raw: RawArea) -> Result<Area, ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Invalid("area name is empty".to_string()));
    }

    let sensors: Vec<String> = raw.sensors.into_iter().map(RawSensorId::into_string).collect();

    if sensors.is_empty() {
        return Err(ConfigError::Invalid(format!("area {name} has no sensors")));
    }
    if sensors.iter().any(String::is_empty) {
        return Err(ConfigError::Invalid(format!("area {name} has an empty sensor id")));
    }
    if !raw.link.contains(SENSOR_PLACEHOLDER) {
        return Err(ConfigError::Invalid(format!(
            "link for area {name} has no {SENSOR_PLACEHOLDER} placeholder"
        )));
    }

    Ok(Area {
        name: name.to_string(),
        sensors,
        link: raw.link,
    })
}
