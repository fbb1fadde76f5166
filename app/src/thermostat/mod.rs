pub mod adapter;
mod domain;
mod metrics;
mod service;
mod snapshot;
mod tracker;

pub use domain::{HvacAction, Observation};
pub use metrics::CostModel;
pub use service::ThermostatService;
pub use snapshot::{MetricKey, SensorValue, ThermostatSnapshot};

use std::{collections::BTreeMap, sync::Arc};

use infrastructure::meter;
use tokio::{sync::RwLock, time::MissedTickBehavior};

use crate::{
    core::time::Duration,
    port::{ObservationSource, OutdoorTemperatureSource},
};

/// Identity of a configured thermostat plus read access to its latest snapshot.
#[derive(Debug, Clone)]
pub struct ThermostatHandle {
    id: String,
    name: String,
    climate_entity: String,
    snapshot: Arc<RwLock<ThermostatSnapshot>>,
}

impl ThermostatHandle {
    pub fn new(name: impl Into<String>, climate_entity: impl Into<String>) -> Self {
        let name = name.into();

        Self {
            id: slugify(&name),
            name,
            climate_entity: climate_entity.into(),
            snapshot: Arc::new(RwLock::new(ThermostatSnapshot::default())),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn climate_entity(&self) -> &str {
        &self.climate_entity
    }

    pub async fn snapshot(&self) -> ThermostatSnapshot {
        self.snapshot.read().await.clone()
    }

    pub(crate) async fn replace_snapshot(&self, snapshot: ThermostatSnapshot) {
        *self.snapshot.write().await = snapshot;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ThermostatRegistry {
    thermostats: BTreeMap<String, ThermostatHandle>,
}

impl ThermostatRegistry {
    pub fn new(handles: impl IntoIterator<Item = ThermostatHandle>) -> Self {
        Self {
            thermostats: handles.into_iter().map(|h| (h.id.clone(), h)).collect(),
        }
    }

    /// Looks up a thermostat by id or by climate entity.
    pub fn get(&self, key: &str) -> Option<&ThermostatHandle> {
        self.thermostats
            .get(key)
            .or_else(|| self.thermostats.values().find(|h| h.climate_entity == key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThermostatHandle> {
        self.thermostats.values()
    }
}

pub struct ThermostatRunner<S, W> {
    service: ThermostatService<S, W>,
    poll_interval: Duration,
    prune_interval: Duration,
}

impl<S, W> ThermostatRunner<S, W>
where
    S: ObservationSource,
    W: OutdoorTemperatureSource,
{
    pub fn new(service: ThermostatService<S, W>, poll_interval: Duration, prune_interval: Duration) -> Self {
        Self {
            service,
            poll_interval,
            prune_interval,
        }
    }

    pub fn handle(&self) -> &ThermostatHandle {
        self.service.handle()
    }

    //first ticks fire immediately: initial poll and startup prune
    pub async fn run(mut self) {
        let mut poll_timer = tokio::time::interval(self.poll_interval.into());
        poll_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut prune_timer = tokio::time::interval(self.prune_interval.into());
        prune_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Start polling thermostat {} every {}s",
            self.service.handle().climate_entity(),
            self.poll_interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = poll_timer.tick() => {
                    self.service.poll().await;
                    record_gauges(self.service.handle()).await;
                },
                _ = prune_timer.tick() => self.service.prune().await,
            }
        }
    }
}

async fn record_gauges(handle: &ThermostatHandle) {
    let snapshot = handle.snapshot().await;

    for key in MetricKey::ALL {
        if let Some(SensorValue::Number(value)) = snapshot.value(key) {
            meter::set(
                "hvac_sensor_value",
                value,
                &[("thermostat", handle.id()), ("sensor", key.as_str())],
            );
        }
    }
}

/// Lowercase ascii alphanumerics separated by single underscores.
pub fn slugify(value: &str) -> String {
    value
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_of_display_name() {
        assert_eq!(slugify("Ecobee AC Runtime"), "ecobee_ac_runtime");
        assert_eq!(slugify("  Living-Room  AC #2 "), "living_room_ac_2");
        assert_eq!(slugify("Ecobee AC Runtime Alert"), "ecobee_ac_runtime_alert");
    }

    #[test]
    fn registry_lookup_by_id_and_entity() {
        let registry = ThermostatRegistry::new([
            ThermostatHandle::new("Living Room", "climate.living_room"),
            ThermostatHandle::new("Bedroom", "climate.ecobee_bedroom"),
        ]);

        assert_eq!(registry.get("bedroom").map(|h| h.name()), Some("Bedroom"));
        assert_eq!(
            registry.get("climate.ecobee_bedroom").map(|h| h.id()),
            Some("bedroom")
        );
        assert!(registry.get("kitchen").is_none());
        assert_eq!(
            registry.iter().map(|h| h.id()).collect::<Vec<_>>(),
            vec!["bedroom", "living_room"]
        );
    }

    #[tokio::test]
    async fn snapshot_is_shared_between_clones() {
        let handle = ThermostatHandle::new("Living Room", "climate.living_room");
        let reader = handle.clone();

        let snapshot = ThermostatSnapshot {
            current_temp: Some(74.0),
            ..Default::default()
        };
        handle.replace_snapshot(snapshot.clone()).await;

        assert_eq!(reader.snapshot().await, snapshot);
    }
}
