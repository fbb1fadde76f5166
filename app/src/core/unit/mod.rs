mod energy;
mod temperature;

pub use energy::{KiloWatt, KiloWattHours};
pub use temperature::TemperatureUnit;
