use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Fahrenheit,
    Celsius,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Celsius => "°C",
        }
    }

    //outdoor temperatures above which cooling is considered hard and very hard
    pub fn heat_thresholds(&self) -> (f64, f64) {
        match self {
            TemperatureUnit::Fahrenheit => (90.0, 100.0),
            TemperatureUnit::Celsius => (32.0, 38.0),
        }
    }
}
