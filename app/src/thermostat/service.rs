use infrastructure::meter::increment;

use crate::{
    core::unit::TemperatureUnit,
    port::{ObservationSource, OutdoorTemperatureSource},
};

use super::{
    ThermostatHandle,
    adapter::db::SampleStore,
    domain::Observation,
    metrics::{self, CostModel, MetricsInput},
    snapshot::ThermostatSnapshot,
    tracker::{CycleTracker, CycleTransition},
};

/// Handles the poll ticks of a single thermostat. Owns the cycle tracker, so polls of one
/// thermostat are serialized by construction.
pub struct ThermostatService<S, W> {
    handle: ThermostatHandle,
    source: S,
    weather: W,
    store: SampleStore,
    tracker: CycleTracker,
    cost_model: CostModel,
    unit: TemperatureUnit,
    source_failures: u32,
}

impl<S, W> ThermostatService<S, W>
where
    S: ObservationSource,
    W: OutdoorTemperatureSource,
{
    pub fn new(
        handle: ThermostatHandle,
        source: S,
        weather: W,
        store: SampleStore,
        cost_model: CostModel,
        unit: TemperatureUnit,
    ) -> Self {
        Self {
            handle,
            source,
            weather,
            store,
            tracker: CycleTracker::new(),
            cost_model,
            unit,
            source_failures: 0,
        }
    }

    pub fn handle(&self) -> &ThermostatHandle {
        &self.handle
    }

    #[tracing::instrument(skip_all, fields(thermostat = %self.handle.id()))]
    pub async fn poll(&mut self) {
        let Some(observation) = self.read_observation().await else {
            return;
        };

        match self.tracker.observe(&observation) {
            CycleTransition::Started(start) => {
                tracing::info!("Cooling cycle started at {:.1}", start.temperature);
            }
            CycleTransition::Completed(cycle) => {
                let outdoor_temperature = self.weather.outdoor_temperature().await;
                let sample = cycle.into_sample(outdoor_temperature);

                tracing::info!(
                    "Cooling cycle completed after {:.2} min, temperature change {:.2}",
                    sample.runtime_minutes,
                    sample.temperature_delta
                );
                increment("hvac_cycles_completed", &[("thermostat", self.handle.id())]);

                if let Err(e) = self.store.append(&sample).await {
                    tracing::error!("Error storing cycle sample, sample is lost: {:?}", e);
                }
            }
            CycleTransition::Discarded { runtime_minutes } => {
                tracing::debug!("Discarding cooling cycle with runtime {:.4} min", runtime_minutes);
            }
            CycleTransition::Unchanged => {}
        }

        let snapshot = self.compute_snapshot(&observation).await;
        if snapshot.metrics.alert {
            tracing::warn!(
                "Anomalous runtime detected! Current: {:.2} min, average: {:.2} min",
                snapshot.metrics.current_runtime,
                snapshot.metrics.average_runtime.unwrap_or_default()
            );
        }

        self.handle.replace_snapshot(snapshot).await;
    }

    /// Removes samples past the retention period. Failures are logged only.
    pub async fn prune(&self) {
        if let Err(e) = self.store.prune(metrics::retention()).await {
            tracing::error!("Error pruning samples of {}: {:?}", self.handle.id(), e);
        }
    }

    async fn read_observation(&mut self) -> Option<Observation> {
        match self.source.current_observation(self.handle.climate_entity()).await {
            Ok(observation) => {
                if self.source_failures > 0 {
                    tracing::info!(
                        "Thermostat {} available again after {} failed polls",
                        self.handle.climate_entity(),
                        self.source_failures
                    );
                    self.source_failures = 0;
                }
                Some(observation)
            }
            Err(e) => {
                if self.source_failures == 0 {
                    tracing::warn!(
                        "Thermostat {} unavailable, keeping last values: {:?}",
                        self.handle.climate_entity(),
                        e
                    );
                } else {
                    tracing::debug!("Thermostat {} still unavailable: {:?}", self.handle.climate_entity(), e);
                }
                self.source_failures += 1;
                None
            }
        }
    }

    async fn compute_snapshot(&self, observation: &Observation) -> ThermostatSnapshot {
        let window = metrics::averaging_window();

        let average_runtime = self.store.average_runtime(window).await.unwrap_or_else(|e| {
            tracing::error!("Error reading average runtime: {:?}", e);
            None
        });
        let average_rate = self.store.average_rate(window).await.unwrap_or_else(|e| {
            tracing::error!("Error reading average rate: {:?}", e);
            None
        });
        let outdoor_temperature = self.weather.outdoor_temperature().await;

        let input = MetricsInput {
            current_runtime: self.tracker.elapsed_minutes(observation.timestamp),
            average_runtime,
            average_rate,
            outdoor_temperature,
        };

        let derived = metrics::derive(&input, &self.cost_model, self.unit);

        ThermostatSnapshot::new(observation, outdoor_temperature, derived)
    }
}
