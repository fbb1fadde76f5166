use anyhow::Context as _;
use infrastructure::HttpClientConfig;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;

use crate::core::unit::TemperatureUnit;

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Temperature(f64),
    RateLimited,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    current: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temp_f: f64,
    temp_c: f64,
}

/// Client of the weatherapi.com current conditions endpoint for one location.
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    location: String,
    unit: TemperatureUnit,
}

impl WeatherApiClient {
    pub fn new(base_url: &str, api_key: &str, location: &str, unit: TemperatureUnit) -> anyhow::Result<Self> {
        let client = HttpClientConfig::new(None).new_tracing_client()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            location: location.to_owned(),
            unit,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    #[tracing::instrument(skip(self), fields(location = %self.location))]
    pub async fn fetch_current(&self) -> anyhow::Result<FetchOutcome> {
        let response = self
            .client
            .get(format!("{}/v1/current.json", self.base_url))
            .query(&[("key", self.api_key.as_str()), ("q", self.location.as_str())])
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Ok(FetchOutcome::RateLimited);
        }

        response.error_for_status_ref()?;

        let body = response
            .json::<CurrentWeatherResponse>()
            .await
            .context("Error parsing current weather response")?;

        let temperature = match self.unit {
            TemperatureUnit::Fahrenheit => body.current.temp_f,
            TemperatureUnit::Celsius => body.current.temp_c,
        };

        Ok(FetchOutcome::Temperature(temperature))
    }
}
