mod client;

use anyhow::{Context as _, bail};
use serde::Deserialize;

use crate::{
    core::time::DateTime,
    port::ObservationSource,
    thermostat::{HvacAction, Observation},
};

use client::{HaHttpClient, StateResponse};

#[derive(Debug, Deserialize, Clone)]
pub struct HomeAssistant {
    pub url: String,
    pub token: String,
}

impl HomeAssistant {
    pub fn new_observation_source(&self) -> anyhow::Result<HaObservationSource> {
        let client = HaHttpClient::new(&self.url, &self.token).context("Error creating HA HTTP client")?;
        Ok(HaObservationSource { client })
    }
}

/// Reads thermostat observations from climate entities via the Home Assistant REST API.
#[derive(Debug, Clone)]
pub struct HaObservationSource {
    client: HaHttpClient,
}

impl ObservationSource for HaObservationSource {
    async fn current_observation(&self, climate_entity: &str) -> anyhow::Result<Observation> {
        let state = self.client.get_state(climate_entity).await?;
        to_observation(state, DateTime::now())
    }
}

fn to_observation(state: StateResponse, timestamp: DateTime) -> anyhow::Result<Observation> {
    if state.state == "unavailable" || state.state == "unknown" {
        bail!("Climate entity {} is {}", state.entity_id, state.state);
    }

    let attributes = state.attributes;
    let Some(current_temperature) = attributes.current_temperature else {
        bail!("Climate entity {} reports no current temperature", state.entity_id);
    };

    Ok(Observation {
        timestamp,
        current_temperature,
        target_temperature: attributes.temperature,
        hvac_action: attributes.hvac_action.as_deref().map(HvacAction::from),
        equipment_running: attributes.equipment_running.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use mockito::Server;

    use super::*;
    use crate::core::time::FIXED_NOW;

    fn state(json: &str) -> StateResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn cooling_state_becomes_observation() {
        let now = DateTime::from_iso("2024-07-15T12:00:00Z").unwrap();
        let observation = to_observation(
            state(
                r#"{"entity_id":"climate.ecobee","state":"cool","attributes":{
                    "current_temperature":75,"temperature":72,"hvac_action":"cooling","equipment_running":"compCool1,fan"}}"#,
            ),
            now,
        )
        .unwrap();

        assert_eq!(observation.timestamp, now);
        assert_eq!(observation.current_temperature, 75.0);
        assert_eq!(observation.target_temperature, Some(72.0));
        assert_eq!(observation.hvac_action, Some(HvacAction::Cooling));
        assert!(observation.is_cooling());
    }

    #[test]
    fn missing_equipment_defaults_to_empty() {
        let observation = to_observation(
            state(r#"{"entity_id":"climate.ecobee","state":"off","attributes":{"current_temperature":70.5}}"#),
            DateTime::now(),
        )
        .unwrap();

        assert_eq!(observation.equipment_running, "");
        assert_eq!(observation.hvac_action, None);
        assert_eq!(observation.target_temperature, None);
        assert!(!observation.is_cooling());
    }

    #[test]
    fn unavailable_entity_is_rejected() {
        let unavailable = state(r#"{"entity_id":"climate.ecobee","state":"unavailable","attributes":{}}"#);
        let without_temperature = state(r#"{"entity_id":"climate.ecobee","state":"cool","attributes":{"temperature":72}}"#);

        assert!(to_observation(unavailable, DateTime::now()).is_err());
        assert!(to_observation(without_temperature, DateTime::now()).is_err());
    }

    #[tokio::test]
    async fn observation_uses_current_time() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/states/climate.ecobee")
            .with_status(200)
            .with_body(r#"{"entity_id":"climate.ecobee","state":"cool","attributes":{"current_temperature":74}}"#)
            .create_async()
            .await;

        let source = HomeAssistant {
            url: server.url(),
            token: "abc123".to_string(),
        }
        .new_observation_source()
        .unwrap();

        let now = DateTime::from_iso("2024-07-15T12:00:00Z").unwrap();
        let observation = FIXED_NOW
            .scope(now, source.current_observation("climate.ecobee"))
            .await
            .unwrap();

        assert_eq!(observation.timestamp, now);
        assert_eq!(observation.current_temperature, 74.0);
    }
}
