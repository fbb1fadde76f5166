#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct KiloWatt(pub f64);

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct KiloWattHours(pub f64);

impl KiloWatt {
    pub fn over_hours(&self, hours: f64) -> KiloWattHours {
        KiloWattHours(self.0 * hours)
    }
}

impl KiloWattHours {
    //price per kWh in the configured currency
    pub fn cost(&self, energy_rate: f64) -> f64 {
        self.0 * energy_rate
    }
}
