use std::fmt::Display;

use crate::core::time::DateTime;

//token reported in equipment_running while the cooling compressor is active
pub const COOLING_COMPRESSOR_MARKER: &str = "compCool";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HvacAction {
    Idle,
    Cooling,
    Heating,
    Other(String),
}

impl HvacAction {
    pub fn as_str(&self) -> &str {
        match self {
            HvacAction::Idle => "idle",
            HvacAction::Cooling => "cooling",
            HvacAction::Heating => "heating",
            HvacAction::Other(other) => other.as_str(),
        }
    }
}

impl From<&str> for HvacAction {
    fn from(value: &str) -> Self {
        match value {
            "idle" => HvacAction::Idle,
            "cooling" => HvacAction::Cooling,
            "heating" => HvacAction::Heating,
            other => HvacAction::Other(other.to_string()),
        }
    }
}

impl Display for HvacAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One reading of the thermostat, taken on a poll tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: DateTime,
    pub current_temperature: f64,
    pub target_temperature: Option<f64>,
    pub hvac_action: Option<HvacAction>,
    pub equipment_running: String,
}

impl Observation {
    pub fn is_cooling(&self) -> bool {
        self.equipment_running.contains(COOLING_COMPRESSOR_MARKER)
    }
}

/// A completed cooling cycle as persisted in the sample store.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime,
    pub runtime_minutes: f64,
    //start minus end temperature, positive when the room cooled down
    pub temperature_delta: f64,
    pub end_temperature: f64,
    pub outdoor_temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateSample {
    pub timestamp: DateTime,
    pub rate_minutes_per_degree: f64,
}

impl Sample {
    /// Minutes of runtime needed per degree of temperature change. Cycles without a measurable
    /// temperature change have no rate.
    pub fn rate(&self) -> Option<RateSample> {
        if self.temperature_delta == 0.0 {
            return None;
        }

        Some(RateSample {
            timestamp: self.timestamp,
            rate_minutes_per_degree: (self.runtime_minutes / self.temperature_delta).abs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::t;

    fn sample(runtime_minutes: f64, temperature_delta: f64) -> Sample {
        Sample {
            timestamp: t!(now),
            runtime_minutes,
            temperature_delta,
            end_temperature: 72.0,
            outdoor_temperature: None,
        }
    }

    #[test]
    fn rate_is_minutes_per_degree() {
        let rate = sample(10.0, 3.0).rate().unwrap();

        assert!((rate.rate_minutes_per_degree - 3.333).abs() < 0.001);
    }

    #[test]
    fn rate_is_absolute_for_warming_cycles() {
        let rate = sample(12.0, -2.0).rate().unwrap();

        assert_eq!(rate.rate_minutes_per_degree, 6.0);
    }

    #[test]
    fn no_rate_without_temperature_change() {
        assert_eq!(sample(10.0, 0.0).rate(), None);
    }

    #[test]
    fn cooling_detected_from_equipment_marker() {
        let mut observation = Observation {
            timestamp: t!(now),
            current_temperature: 75.0,
            target_temperature: Some(72.0),
            hvac_action: Some(HvacAction::Cooling),
            equipment_running: "compCool1,fan".to_string(),
        };
        assert!(observation.is_cooling());

        observation.equipment_running = "fan".to_string();
        assert!(!observation.is_cooling());

        observation.equipment_running = String::new();
        assert!(!observation.is_cooling());
    }

    #[test]
    fn hvac_action_keeps_unknown_values() {
        assert_eq!(HvacAction::from("cooling"), HvacAction::Cooling);
        assert_eq!(HvacAction::from("fan").as_str(), "fan");
    }
}
