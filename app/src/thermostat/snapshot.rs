use serde::Serialize;

use crate::core::time::DateTime;

use super::{
    domain::{HvacAction, Observation},
    metrics::DerivedMetrics,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKey {
    CurrentRuntime,
    AverageRuntime,
    CurrentTemp,
    TargetTemp,
    HvacAction,
    EquipmentRunning,
    Alert,
    AvgTimePerDegree,
    EfficiencyScore,
    EstimatedDailyCost,
    OutdoorTemp,
}

impl MetricKey {
    pub const ALL: [MetricKey; 11] = [
        MetricKey::CurrentRuntime,
        MetricKey::AverageRuntime,
        MetricKey::CurrentTemp,
        MetricKey::TargetTemp,
        MetricKey::HvacAction,
        MetricKey::EquipmentRunning,
        MetricKey::Alert,
        MetricKey::AvgTimePerDegree,
        MetricKey::EfficiencyScore,
        MetricKey::EstimatedDailyCost,
        MetricKey::OutdoorTemp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::CurrentRuntime => "current_runtime",
            MetricKey::AverageRuntime => "average_runtime",
            MetricKey::CurrentTemp => "current_temp",
            MetricKey::TargetTemp => "target_temp",
            MetricKey::HvacAction => "hvac_action",
            MetricKey::EquipmentRunning => "equipment_running",
            MetricKey::Alert => "alert",
            MetricKey::AvgTimePerDegree => "avg_time_per_degree",
            MetricKey::EfficiencyScore => "efficiency_score",
            MetricKey::EstimatedDailyCost => "estimated_daily_cost",
            MetricKey::OutdoorTemp => "outdoor_temp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    Number(f64),
    Text(String),
    Flag(bool),
}

/// Last displayed values of one thermostat. Replaced as a whole after every successful poll, kept
/// as is when a poll fails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThermostatSnapshot {
    pub updated_at: Option<DateTime>,
    pub current_temp: Option<f64>,
    pub target_temp: Option<f64>,
    pub hvac_action: Option<HvacAction>,
    pub equipment_running: Option<String>,
    pub outdoor_temp: Option<f64>,
    pub metrics: DerivedMetrics,
}

impl ThermostatSnapshot {
    pub fn new(observation: &Observation, outdoor_temp: Option<f64>, metrics: DerivedMetrics) -> Self {
        Self {
            updated_at: Some(observation.timestamp),
            current_temp: Some(observation.current_temperature),
            target_temp: observation.target_temperature,
            hvac_action: observation.hvac_action.clone(),
            equipment_running: Some(observation.equipment_running.clone()),
            outdoor_temp,
            metrics,
        }
    }

    pub fn is_available(&self) -> bool {
        self.updated_at.is_some()
    }

    pub fn value(&self, key: MetricKey) -> Option<SensorValue> {
        if !self.is_available() {
            return None;
        }

        let number = |v: Option<f64>| v.map(SensorValue::Number);

        match key {
            MetricKey::CurrentRuntime => Some(SensorValue::Number(self.metrics.current_runtime)),
            MetricKey::AverageRuntime => number(self.metrics.average_runtime),
            MetricKey::CurrentTemp => number(self.current_temp),
            MetricKey::TargetTemp => number(self.target_temp),
            //only the actions the sensor declares as options are displayed
            MetricKey::HvacAction => self
                .hvac_action
                .as_ref()
                .filter(|a| !matches!(a, HvacAction::Other(_)))
                .map(|a| SensorValue::Text(a.to_string())),
            MetricKey::EquipmentRunning => self.equipment_running.clone().map(SensorValue::Text),
            MetricKey::Alert => Some(SensorValue::Flag(self.metrics.alert)),
            MetricKey::AvgTimePerDegree => number(self.metrics.avg_time_per_degree),
            MetricKey::EfficiencyScore => number(self.metrics.efficiency_score),
            MetricKey::EstimatedDailyCost => number(self.metrics.estimated_daily_cost),
            MetricKey::OutdoorTemp => number(self.outdoor_temp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::t;

    #[test]
    fn empty_snapshot_has_no_values() {
        let snapshot = ThermostatSnapshot::default();

        assert!(!snapshot.is_available());
        assert_eq!(snapshot.value(MetricKey::Alert), None);
        assert_eq!(snapshot.value(MetricKey::CurrentRuntime), None);
    }

    #[test]
    fn values_from_observation_and_metrics() {
        let observation = Observation {
            timestamp: t!(now),
            current_temperature: 74.5,
            target_temperature: None,
            hvac_action: Some(HvacAction::Cooling),
            equipment_running: "compCool1".to_string(),
        };
        let metrics = DerivedMetrics {
            current_runtime: 4.0,
            alert: true,
            ..Default::default()
        };

        let snapshot = ThermostatSnapshot::new(&observation, Some(91.0), metrics);

        assert_eq!(snapshot.value(MetricKey::CurrentTemp), Some(SensorValue::Number(74.5)));
        assert_eq!(snapshot.value(MetricKey::TargetTemp), None);
        assert_eq!(
            snapshot.value(MetricKey::HvacAction),
            Some(SensorValue::Text("cooling".to_string()))
        );
        assert_eq!(snapshot.value(MetricKey::Alert), Some(SensorValue::Flag(true)));
        assert_eq!(snapshot.value(MetricKey::OutdoorTemp), Some(SensorValue::Number(91.0)));
        assert_eq!(snapshot.value(MetricKey::AverageRuntime), None);
    }

    #[test]
    fn other_hvac_action_has_no_value() {
        let observation = Observation {
            timestamp: t!(now),
            current_temperature: 74.5,
            target_temperature: Some(72.0),
            hvac_action: Some(HvacAction::from("fan")),
            equipment_running: "fan".to_string(),
        };

        let snapshot = ThermostatSnapshot::new(&observation, None, DerivedMetrics::default());

        assert_eq!(snapshot.hvac_action, Some(HvacAction::Other("fan".to_string())));
        assert_eq!(snapshot.value(MetricKey::HvacAction), None);
        assert_eq!(
            snapshot.value(MetricKey::EquipmentRunning),
            Some(SensorValue::Text("fan".to_string()))
        );
    }
}
