use crate::{core::unit::TemperatureUnit, thermostat::MetricKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorUnit {
    Minutes,
    Temperature,
    Percent,
    Currency(&'static str),
}

impl SensorUnit {
    pub fn symbol(&self, temperature_unit: TemperatureUnit) -> &'static str {
        match self {
            SensorUnit::Minutes => "min",
            SensorUnit::Temperature => temperature_unit.symbol(),
            SensorUnit::Percent => "%",
            SensorUnit::Currency(code) => code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorDescriptor {
    pub key: MetricKey,
    pub suffix: &'static str,
    pub unit: Option<SensorUnit>,
    pub device_class: Option<&'static str>,
    pub state_class: Option<&'static str>,
    pub precision: Option<u8>,
    pub options: &'static [&'static str],
}

const MEASUREMENT: Option<&str> = Some("measurement");

pub const DESCRIPTORS: [SensorDescriptor; 11] = [
    SensorDescriptor {
        key: MetricKey::CurrentRuntime,
        suffix: "Current Runtime",
        unit: Some(SensorUnit::Minutes),
        device_class: Some("duration"),
        state_class: MEASUREMENT,
        precision: Some(2),
        options: &[],
    },
    SensorDescriptor {
        key: MetricKey::AverageRuntime,
        suffix: "Average Runtime",
        unit: Some(SensorUnit::Minutes),
        device_class: Some("duration"),
        state_class: MEASUREMENT,
        precision: Some(2),
        options: &[],
    },
    SensorDescriptor {
        key: MetricKey::CurrentTemp,
        suffix: "Current Temperature",
        unit: Some(SensorUnit::Temperature),
        device_class: Some("temperature"),
        state_class: MEASUREMENT,
        precision: None,
        options: &[],
    },
    SensorDescriptor {
        key: MetricKey::TargetTemp,
        suffix: "Target Temperature",
        unit: Some(SensorUnit::Temperature),
        device_class: Some("temperature"),
        state_class: MEASUREMENT,
        precision: None,
        options: &[],
    },
    SensorDescriptor {
        key: MetricKey::HvacAction,
        suffix: "HVAC Action",
        unit: None,
        device_class: Some("enum"),
        state_class: None,
        precision: None,
        options: &["idle", "cooling", "heating"],
    },
    SensorDescriptor {
        key: MetricKey::EquipmentRunning,
        suffix: "Equipment Running",
        unit: None,
        device_class: None,
        state_class: None,
        precision: None,
        options: &[],
    },
    SensorDescriptor {
        key: MetricKey::Alert,
        suffix: "Alert",
        unit: None,
        device_class: Some("enum"),
        state_class: None,
        precision: None,
        options: &["True", "False"],
    },
    SensorDescriptor {
        key: MetricKey::AvgTimePerDegree,
        suffix: "Avg Time per Degree",
        unit: Some(SensorUnit::Minutes),
        device_class: Some("duration"),
        state_class: MEASUREMENT,
        precision: Some(2),
        options: &[],
    },
    SensorDescriptor {
        key: MetricKey::EfficiencyScore,
        suffix: "Energy Efficiency Score",
        unit: Some(SensorUnit::Percent),
        device_class: Some("power_factor"),
        state_class: MEASUREMENT,
        precision: Some(2),
        options: &[],
    },
    SensorDescriptor {
        key: MetricKey::EstimatedDailyCost,
        suffix: "Estimated Daily Cost",
        unit: Some(SensorUnit::Currency("USD")),
        device_class: Some("monetary"),
        state_class: Some("total"),
        precision: Some(2),
        options: &[],
    },
    SensorDescriptor {
        key: MetricKey::OutdoorTemp,
        suffix: "Outdoor Temperature",
        unit: Some(SensorUnit::Temperature),
        device_class: Some("temperature"),
        state_class: MEASUREMENT,
        precision: None,
        options: &[],
    },
];
