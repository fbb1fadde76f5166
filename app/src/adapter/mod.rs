pub mod homeassistant;
pub mod sensor;
pub mod weather;
