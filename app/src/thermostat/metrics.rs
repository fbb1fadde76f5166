use crate::core::{
    time::Duration,
    unit::{KiloWatt, KiloWattHours, TemperatureUnit},
};

//current runtime above this multiple of the average runtime is reported as anomaly
pub const ALERT_THRESHOLD: f64 = 1.5;

pub fn averaging_window() -> Duration {
    Duration::days(7)
}

pub fn retention() -> Duration {
    Duration::days(30)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostModel {
    pub energy_rate: f64,
    pub power_draw: KiloWatt,
    //scales the average cycle runtime to a daily runtime
    pub daily_cycles_factor: f64,
}

impl CostModel {
    pub fn new(energy_rate: f64) -> Self {
        Self {
            energy_rate,
            power_draw: KiloWatt(3.5),
            daily_cycles_factor: 24.0,
        }
    }
}

/// Aggregates read from the sample store plus the state of the running cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsInput {
    pub current_runtime: f64,
    pub average_runtime: Option<f64>,
    pub average_rate: Option<f64>,
    pub outdoor_temperature: Option<f64>,
}

/// Derived values, rounded for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedMetrics {
    pub current_runtime: f64,
    pub average_runtime: Option<f64>,
    pub alert: bool,
    pub avg_time_per_degree: Option<f64>,
    pub efficiency_score: Option<f64>,
    pub estimated_daily_cost: Option<f64>,
}

pub fn derive(input: &MetricsInput, cost_model: &CostModel, unit: TemperatureUnit) -> DerivedMetrics {
    DerivedMetrics {
        current_runtime: round2(input.current_runtime),
        average_runtime: input.average_runtime.map(round2),
        alert: is_anomalous(input.current_runtime, input.average_runtime),
        avg_time_per_degree: input.average_rate.map(round2),
        efficiency_score: efficiency_score(input.average_rate, input.outdoor_temperature, unit).map(round2),
        estimated_daily_cost: estimated_daily_cost(input.average_runtime, cost_model),
    }
}

pub fn is_anomalous(current_runtime: f64, average_runtime: Option<f64>) -> bool {
    match average_runtime {
        Some(average) => current_runtime > average * ALERT_THRESHOLD,
        None => false,
    }
}

/// Score between 0 and 100, lower when more minutes are needed per degree.
///
/// The penalty grows in bands: 1 point per minute/degree above 10, another 2 above 20 and another 4
/// above 30. Hot weather earns an allowance as cooling gets intrinsically harder. For a given
/// outdoor temperature the score never increases with the rate.
pub fn efficiency_score(average_rate: Option<f64>, outdoor_temperature: Option<f64>, unit: TemperatureUnit) -> Option<f64> {
    let rate = average_rate?;

    let penalty = (rate - 10.0).max(0.0) + (rate - 20.0).max(0.0) * 2.0 + (rate - 30.0).max(0.0) * 4.0;

    let (hot, very_hot) = unit.heat_thresholds();
    let allowance = match outdoor_temperature {
        Some(t) if t > very_hot => 10.0,
        Some(t) if t > hot => 5.0,
        _ => 0.0,
    };

    Some((100.0 - penalty + allowance).clamp(0.0, 100.0))
}

pub fn estimated_daily_cost(average_runtime: Option<f64>, cost_model: &CostModel) -> Option<f64> {
    let energy = daily_energy(average_runtime?, cost_model);

    Some(round2(energy.cost(cost_model.energy_rate)))
}

fn daily_energy(average_runtime: f64, cost_model: &CostModel) -> KiloWattHours {
    let daily_hours = average_runtime * cost_model.daily_cycles_factor / 60.0;
    cost_model.power_draw.over_hours(daily_hours)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
