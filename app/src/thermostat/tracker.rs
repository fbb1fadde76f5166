use crate::core::time::DateTime;

use super::domain::{Observation, Sample};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleStart {
    pub time: DateTime,
    pub temperature: f64,
}

/// Cooling cycle that just ended. Becomes a [`Sample`] once the outdoor temperature is known.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedCycle {
    pub ended_at: DateTime,
    pub runtime_minutes: f64,
    pub temperature_delta: f64,
    pub end_temperature: f64,
}

impl CompletedCycle {
    pub fn into_sample(self, outdoor_temperature: Option<f64>) -> Sample {
        Sample {
            timestamp: self.ended_at,
            runtime_minutes: self.runtime_minutes,
            temperature_delta: self.temperature_delta,
            end_temperature: self.end_temperature,
            outdoor_temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleTransition {
    Unchanged,
    Started(CycleStart),
    Completed(CompletedCycle),
    //cycle ended without positive runtime, e.g. after a clock jump
    Discarded { runtime_minutes: f64 },
}

/// Edge detector on the cooling state of one thermostat.
///
/// Idle until an observation reports the compressor cooling, then Cooling until an observation
/// reports it stopped. Start time and start temperature are kept together, so there is never a
/// start time without a start temperature.
#[derive(Debug, Default)]
pub struct CycleTracker {
    active: Option<CycleStart>,
}

impl CycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, observation: &Observation) -> CycleTransition {
        match (self.active, observation.is_cooling()) {
            (None, true) => {
                let start = CycleStart {
                    time: observation.timestamp,
                    temperature: observation.current_temperature,
                };
                self.active = Some(start);
                CycleTransition::Started(start)
            }

            (Some(start), false) => {
                self.active = None;

                let runtime_minutes = observation.timestamp.elapsed_since(start.time).as_minutes_f64();
                if runtime_minutes <= 0.0 {
                    return CycleTransition::Discarded { runtime_minutes };
                }

                CycleTransition::Completed(CompletedCycle {
                    ended_at: observation.timestamp,
                    runtime_minutes,
                    temperature_delta: start.temperature - observation.current_temperature,
                    end_temperature: observation.current_temperature,
                })
            }

            _ => CycleTransition::Unchanged,
        }
    }

    /// Runtime of the cycle in progress, 0 when idle.
    pub fn elapsed_minutes(&self, now: DateTime) -> f64 {
        match self.active {
            Some(start) => now.elapsed_since(start.time).as_minutes_f64().max(0.0),
            None => 0.0,
        }
    }
}

#[cfg(test)]
impl CycleTracker {
    pub fn is_cooling(&self) -> bool {
        self.active.is_some()
    }

    pub fn cooling_start_time(&self) -> Option<DateTime> {
        self.active.map(|start| start.time)
    }

    pub fn cooling_start_temperature(&self) -> Option<f64> {
        self.active.map(|start| start.temperature)
    }
}
