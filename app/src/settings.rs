use std::collections::HashSet;

use config::{Config, Environment, File};
use derive_more::derive::{Display, Error};
use infrastructure::{HttpServerConfig, MonitoringConfig};
use serde::Deserialize;

use crate::{
    adapter::{homeassistant::HomeAssistant, weather::Weather},
    core::{time::Duration, unit::TemperatureUnit},
    thermostat::slugify,
};

const CONFIG_PATH_ENV: &str = "HVAC_CONFIG";

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub monitoring: MonitoringConfig,
    pub http_server: HttpServerConfig,
    pub homeassistant: HomeAssistant,
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub weather: Weather,
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,
    #[serde(default)]
    pub thermostats: Vec<ThermostatSettings>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PollingSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_prune_interval_hours")]
    pub prune_interval_hours: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ThermostatSettings {
    #[serde(default = "default_name")]
    pub name: String,
    pub climate_entity: String,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_energy_rate")]
    pub energy_rate: f64,
    pub weather_api_key: Option<String>,
    pub location: Option<String>,
}

fn default_interval_secs() -> u64 {
    60
}

fn default_prune_interval_hours() -> u64 {
    24
}

fn default_name() -> String {
    "Ecobee AC Runtime".to_string()
}

fn default_db_path() -> String {
    "hvac_learning.db".to_string()
}

fn default_energy_rate() -> f64 {
    0.12
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            prune_interval_hours: default_prune_interval_hours(),
        }
    }
}

impl PollingSettings {
    pub fn interval(&self) -> Duration {
        Duration::seconds(self.interval_secs as i64)
    }

    pub fn prune_interval(&self) -> Duration {
        Duration::hours(self.prune_interval_hours as i64)
    }
}

impl ThermostatSettings {
    /// API key and location, present only when both are configured.
    pub fn weather_credentials(&self) -> Option<(&str, &str)> {
        match (non_blank(&self.weather_api_key), non_blank(&self.location)) {
            (Some(key), Some(location)) => Some((key, location)),
            _ => None,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Display, Error, PartialEq)]
pub enum ConfigError {
    #[display("No thermostats configured")]
    NoThermostats,

    #[display("Thermostat {name} has no climate entity")]
    MissingClimateEntity { name: String },

    #[display("Energy rate of {climate_entity} must be positive, got {rate}")]
    InvalidEnergyRate { climate_entity: String, rate: f64 },

    #[display("Weather API key and location of {climate_entity} must be configured together")]
    IncompleteWeatherConfig { climate_entity: String },

    #[display("Climate entity {climate_entity} is configured more than once")]
    DuplicateClimateEntity { climate_entity: String },

    #[display("Thermostat name {name} is not unique")]
    DuplicateName { name: String },

    #[display("Polling and prune intervals must be positive")]
    InvalidInterval,
}

impl Settings {
    pub fn new() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());

        let builder = Config::builder()
            .add_source(File::with_name(&path))
            .add_source(Environment::with_prefix("HVAC").separator("__").list_separator(","));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thermostats.is_empty() {
            return Err(ConfigError::NoThermostats);
        }

        if self.polling.interval_secs == 0 || self.polling.prune_interval_hours == 0 {
            return Err(ConfigError::InvalidInterval);
        }

        let mut entities = HashSet::new();
        let mut names = HashSet::new();

        for thermostat in &self.thermostats {
            thermostat.validate()?;

            if !entities.insert(thermostat.climate_entity.as_str()) {
                return Err(ConfigError::DuplicateClimateEntity {
                    climate_entity: thermostat.climate_entity.clone(),
                });
            }

            if !names.insert(slugify(&thermostat.name)) {
                return Err(ConfigError::DuplicateName {
                    name: thermostat.name.clone(),
                });
            }
        }

        Ok(())
    }
}

impl ThermostatSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.climate_entity.trim().is_empty() {
            return Err(ConfigError::MissingClimateEntity { name: self.name.clone() });
        }

        if !(self.energy_rate.is_finite() && self.energy_rate > 0.0) {
            return Err(ConfigError::InvalidEnergyRate {
                climate_entity: self.climate_entity.clone(),
                rate: self.energy_rate,
            });
        }

        let has_key = non_blank(&self.weather_api_key).is_some();
        let has_location = non_blank(&self.location).is_some();
        if has_key != has_location {
            return Err(ConfigError::IncompleteWeatherConfig {
                climate_entity: self.climate_entity.clone(),
            });
        }

        Ok(())
    }
}
