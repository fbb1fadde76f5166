#![allow(async_fn_in_trait)]

use anyhow::Result;

use crate::thermostat::Observation;

pub trait ObservationSource {
    async fn current_observation(&self, climate_entity: &str) -> Result<Observation>;
}

//never fails, falls back to the last known value or None
pub trait OutdoorTemperatureSource {
    async fn outdoor_temperature(&self) -> Option<f64>;
}

impl<T: OutdoorTemperatureSource> OutdoorTemperatureSource for Option<T> {
    async fn outdoor_temperature(&self) -> Option<f64> {
        match self {
            Some(source) => source.outdoor_temperature().await,
            None => None,
        }
    }
}
