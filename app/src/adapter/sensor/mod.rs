mod api;
mod descriptor;

pub use api::new_routes;

use serde::Serialize;

use crate::{
    core::{time::DateTime, unit::TemperatureUnit},
    thermostat::{MetricKey, SensorValue, ThermostatHandle, ThermostatSnapshot, slugify},
};

use descriptor::{DESCRIPTORS, SensorDescriptor};

/// Externally visible state of one metric of one thermostat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub unique_id: String,
    pub name: String,
    pub thermostat: String,
    pub key: &'static str,
    pub state: Option<SensorValue>,
    pub available: bool,
    pub unit_of_measurement: Option<&'static str>,
    pub device_class: Option<&'static str>,
    pub state_class: Option<&'static str>,
    pub suggested_display_precision: Option<u8>,
    #[serde(skip_serializing_if = "no_options")]
    pub options: &'static [&'static str],
    pub last_updated: Option<DateTime>,
}

impl SensorState {
    fn render(
        descriptor: &SensorDescriptor,
        handle: &ThermostatHandle,
        snapshot: &ThermostatSnapshot,
        unit: TemperatureUnit,
    ) -> Self {
        let name = format!("{} {}", handle.name(), descriptor.suffix);

        let state = snapshot.value(descriptor.key).map(|value| match value {
            SensorValue::Number(n) => SensorValue::Number(round(n, descriptor.precision)),
            SensorValue::Flag(flag) if descriptor.key == MetricKey::Alert => {
                SensorValue::Text(if flag { "True" } else { "False" }.to_string())
            }
            other => other,
        });

        Self {
            unique_id: format!("hvac_learning_{}", slugify(&name)),
            name,
            thermostat: handle.id().to_string(),
            key: descriptor.key.as_str(),
            state,
            available: snapshot.is_available(),
            unit_of_measurement: descriptor.unit.map(|u| u.symbol(unit)),
            device_class: descriptor.device_class,
            state_class: descriptor.state_class,
            suggested_display_precision: descriptor.precision,
            options: descriptor.options,
            last_updated: snapshot.updated_at,
        }
    }
}

pub async fn sensor_states(handle: &ThermostatHandle, unit: TemperatureUnit) -> Vec<SensorState> {
    let snapshot = handle.snapshot().await;

    DESCRIPTORS
        .iter()
        .map(|descriptor| SensorState::render(descriptor, handle, &snapshot, unit))
        .collect()
}

fn no_options(options: &&[&str]) -> bool {
    options.is_empty()
}

fn round(value: f64, precision: Option<u8>) -> f64 {
    match precision {
        Some(digits) => {
            let factor = 10f64.powi(digits as i32);
            (value * factor).round() / factor
        }
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use assert_json_diff::assert_json_include;
    use serde_json::json;

    use super::*;
    use crate::thermostat::{HvacAction, Observation};

    fn observation() -> Observation {
        Observation {
            timestamp: DateTime::from_iso("2024-07-15T12:00:00Z").unwrap(),
            current_temperature: 74.5,
            target_temperature: Some(72.0),
            hvac_action: Some(HvacAction::Cooling),
            equipment_running: "compCool1,fan".to_string(),
        }
    }

    fn find<'a>(states: &'a [SensorState], key: &str) -> &'a SensorState {
        states.iter().find(|s| s.key == key).unwrap()
    }

    #[tokio::test]
    async fn unpolled_thermostat_is_unavailable() {
        let handle = ThermostatHandle::new("Ecobee AC Runtime", "climate.ecobee");

        let states = sensor_states(&handle, TemperatureUnit::Fahrenheit).await;

        assert_eq!(states.len(), 11);
        assert!(states.iter().all(|s| !s.available && s.state.is_none()));
    }

    #[tokio::test]
    async fn sensor_identity_and_metadata() {
        let handle = ThermostatHandle::new("Ecobee AC Runtime", "climate.ecobee");
        let mut snapshot = ThermostatSnapshot::new(&observation(), Some(95.0), Default::default());
        snapshot.metrics.current_runtime = 4.5;
        snapshot.metrics.average_runtime = Some(12.346);
        handle.replace_snapshot(snapshot).await;

        let states = sensor_states(&handle, TemperatureUnit::Fahrenheit).await;

        assert_json_include!(
            actual: serde_json::to_value(find(&states, "average_runtime")).unwrap(),
            expected: json!({
                "unique_id": "hvac_learning_ecobee_ac_runtime_average_runtime",
                "name": "Ecobee AC Runtime Average Runtime",
                "thermostat": "ecobee_ac_runtime",
                "key": "average_runtime",
                "state": 12.35,
                "available": true,
                "unit_of_measurement": "min",
                "device_class": "duration",
                "state_class": "measurement",
                "suggested_display_precision": 2
            })
        );
        assert!(find(&states, "average_runtime").last_updated.is_some());
        assert!(!serde_json::to_value(find(&states, "average_runtime")).unwrap()["options"].is_array());

        assert_json_include!(
            actual: serde_json::to_value(find(&states, "hvac_action")).unwrap(),
            expected: json!({
                "name": "Ecobee AC Runtime HVAC Action",
                "state": "cooling",
                "device_class": "enum",
                "options": ["idle", "cooling", "heating"]
            })
        );

        assert_json_include!(
            actual: serde_json::to_value(find(&states, "outdoor_temp")).unwrap(),
            expected: json!({ "state": 95.0, "unit_of_measurement": "°F" })
        );
    }

    #[tokio::test]
    async fn alert_is_rendered_as_text() {
        let handle = ThermostatHandle::new("Living Room", "climate.living_room");
        let mut snapshot = ThermostatSnapshot::new(&observation(), None, Default::default());
        snapshot.metrics.alert = true;
        handle.replace_snapshot(snapshot).await;

        let states = sensor_states(&handle, TemperatureUnit::Celsius).await;

        let alert = find(&states, "alert");
        assert_eq!(alert.state, Some(SensorValue::Text("True".to_string())));
        assert_eq!(alert.options, &["True", "False"]);

        let outdoor = find(&states, "outdoor_temp");
        assert!(outdoor.available);
        assert_eq!(outdoor.state, None);
        assert_eq!(outdoor.unit_of_measurement, Some("°C"));
    }

    #[tokio::test]
    async fn hvac_action_stays_within_options() {
        let handle = ThermostatHandle::new("Living Room", "climate.living_room");
        let observation = Observation {
            hvac_action: Some(HvacAction::from("drying")),
            ..observation()
        };
        handle
            .replace_snapshot(ThermostatSnapshot::new(&observation, None, Default::default()))
            .await;

        let states = sensor_states(&handle, TemperatureUnit::Fahrenheit).await;

        let hvac_action = find(&states, "hvac_action");
        assert!(hvac_action.available);
        assert_eq!(hvac_action.state, None);
        assert_eq!(hvac_action.options, &["idle", "cooling", "heating"]);
    }
}
