use std::collections::HashMap;

use adapter::homeassistant::HaObservationSource;
use adapter::weather::OutdoorTemperatureProvider;
use infrastructure::DatabaseConfig;
use settings::{Settings, ThermostatSettings};
use sqlx::SqlitePool;
use thermostat::{
    CostModel, ThermostatHandle, ThermostatRegistry, ThermostatRunner, ThermostatService, adapter::db::SampleStore,
};

mod adapter;
mod core;
pub mod port;
mod settings;
mod thermostat;

type Runner = ThermostatRunner<HaObservationSource, Option<OutdoorTemperatureProvider>>;

struct Infrastructure {
    db_pools: HashMap<String, SqlitePool>,
    weather_providers: HashMap<(String, String), OutdoorTemperatureProvider>,
}

#[tokio::main(flavor = "multi_thread")]
pub async fn main() {
    let settings = Settings::new().expect("Error reading configuration");

    let mut infrastructure = Infrastructure::init(&settings).await.expect("Error initializing infrastructure");

    let observation_source = settings
        .homeassistant
        .new_observation_source()
        .expect("Error creating Home Assistant client");

    let mut runners: Vec<Runner> = Vec::with_capacity(settings.thermostats.len());
    for thermostat in &settings.thermostats {
        let runner = new_runner(&settings, thermostat, observation_source.clone(), &mut infrastructure)
            .await
            .expect("Error initializing thermostat");
        runners.push(runner);
    }

    let registry = ThermostatRegistry::new(runners.iter().map(|r| r.handle().clone()));

    let http_server_exec = {
        let http_server = settings.http_server.clone();
        let unit = settings.temperature_unit;

        async move {
            http_server
                .run_server(move || vec![adapter::sensor::new_routes(registry.clone(), unit)])
                .await
                .expect("HTTP server execution failed");
        }
    };

    tracing::info!("Starting main loop with {} thermostats", runners.len());

    tokio::select!(
        _ = futures::future::join_all(runners.into_iter().map(|r| r.run())) => {},
        _ = http_server_exec => {},
    );
}

async fn new_runner(
    settings: &Settings,
    thermostat: &ThermostatSettings,
    observation_source: HaObservationSource,
    infrastructure: &mut Infrastructure,
) -> anyhow::Result<Runner> {
    let pool = infrastructure.db_pool(&thermostat.db_path).await?;
    let store = SampleStore::new(pool, &thermostat.climate_entity);
    store.create_schema().await?;

    let weather = match thermostat.weather_credentials() {
        Some((api_key, location)) => Some(infrastructure.weather_provider(settings, api_key, location)?),
        None => {
            tracing::info!("No weather API configured for {}", thermostat.climate_entity);
            None
        }
    };

    let service = ThermostatService::new(
        ThermostatHandle::new(&thermostat.name, &thermostat.climate_entity),
        observation_source,
        weather,
        store,
        CostModel::new(thermostat.energy_rate),
        settings.temperature_unit,
    );

    Ok(ThermostatRunner::new(
        service,
        settings.polling.interval(),
        settings.polling.prune_interval(),
    ))
}

impl Infrastructure {
    pub async fn init(settings: &Settings) -> anyhow::Result<Self> {
        settings.monitoring.init().expect("Error initializing monitoring");

        Ok(Self {
            db_pools: HashMap::new(),
            weather_providers: HashMap::new(),
        })
    }

    //thermostats configured with the same database share one pool
    async fn db_pool(&mut self, path: &str) -> anyhow::Result<SqlitePool> {
        if let Some(pool) = self.db_pools.get(path) {
            return Ok(pool.clone());
        }

        let pool = DatabaseConfig::new(path).new_pool().await?;
        tracing::info!("Opened sample database {}", path);

        self.db_pools.insert(path.to_owned(), pool.clone());
        Ok(pool)
    }

    //same key and location share one provider and thus one cache
    fn weather_provider(
        &mut self,
        settings: &Settings,
        api_key: &str,
        location: &str,
    ) -> anyhow::Result<OutdoorTemperatureProvider> {
        let cache_key = (api_key.to_owned(), location.to_owned());
        if let Some(provider) = self.weather_providers.get(&cache_key) {
            return Ok(provider.clone());
        }

        let provider = settings
            .weather
            .new_provider(api_key, location, settings.temperature_unit)?;

        self.weather_providers.insert(cache_key, provider.clone());
        Ok(provider)
    }
}
