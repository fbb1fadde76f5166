mod client;

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{
    core::{
        time::{DateTime, Duration},
        unit::TemperatureUnit,
    },
    port::OutdoorTemperatureSource,
};

pub use client::{FetchOutcome, WeatherApiClient};

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Weather {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_base_url() -> String {
    "http://api.weatherapi.com".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for Weather {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Weather {
    pub fn new_provider(
        &self,
        api_key: &str,
        location: &str,
        unit: TemperatureUnit,
    ) -> anyhow::Result<OutdoorTemperatureProvider> {
        let client = WeatherApiClient::new(&self.base_url, api_key, location, unit)?;

        Ok(OutdoorTemperatureProvider::new(
            client,
            Duration::seconds(self.cache_ttl_secs as i64),
            self.max_attempts,
            Duration::millis(self.retry_delay_ms as i64),
        ))
    }
}

/// Single cached reading. Expiry only affects [`WeatherCache::fresh`], the last temperature is kept
/// as fallback for rate-limited and failed fetches.
#[derive(Debug, Default)]
struct WeatherCache {
    temperature: Option<f64>,
    fetched_at: Option<DateTime>,
}

impl WeatherCache {
    fn fresh(&self, ttl: Duration) -> Option<f64> {
        match (self.temperature, self.fetched_at) {
            (Some(temperature), Some(fetched_at)) if DateTime::now().elapsed_since(fetched_at) < ttl => {
                Some(temperature)
            }
            _ => None,
        }
    }

    fn store(&mut self, temperature: f64) {
        self.temperature = Some(temperature);
        self.fetched_at = Some(DateTime::now());
    }
}

/// Outdoor temperature with a time-based cache and a bounded number of fetch attempts.
///
/// Clones share the cache. Lookups never fail: when no fresh value can be fetched, the last cached
/// value is returned, or `None` if there never was one. The cache lock is held while fetching, so
/// concurrent lookups wait for a single fetch instead of hitting the API in parallel.
#[derive(Debug, Clone)]
pub struct OutdoorTemperatureProvider {
    client: WeatherApiClient,
    cache: Arc<Mutex<WeatherCache>>,
    ttl: Duration,
    max_attempts: u32,
    retry_delay: Duration,
}

impl OutdoorTemperatureProvider {
    pub fn new(client: WeatherApiClient, ttl: Duration, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            client,
            cache: Arc::new(Mutex::new(WeatherCache::default())),
            ttl,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }
}

impl OutdoorTemperatureSource for OutdoorTemperatureProvider {
    async fn outdoor_temperature(&self) -> Option<f64> {
        let mut cache = self.cache.lock().await;

        if let Some(temperature) = cache.fresh(self.ttl) {
            return Some(temperature);
        }

        for attempt in 1..=self.max_attempts {
            match self.client.fetch_current().await {
                Ok(FetchOutcome::Temperature(temperature)) => {
                    tracing::debug!("Outdoor temperature at {} is {}", self.client.location(), temperature);
                    cache.store(temperature);
                    return Some(temperature);
                }
                Ok(FetchOutcome::RateLimited) => {
                    tracing::warn!("Weather API rate limit reached, using last known outdoor temperature");
                    return cache.temperature;
                }
                Err(e) => {
                    tracing::error!(
                        "Error fetching outdoor temperature (attempt {}/{}): {:?}",
                        attempt,
                        self.max_attempts,
                        e
                    );

                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.retry_delay.into()).await;
                    }
                }
            }
        }

        cache.temperature
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server, ServerGuard};

    use super::*;
    use crate::core::time::FIXED_NOW;

    fn body(temp_f: f64) -> String {
        format!(r#"{{"current":{{"temp_c":0.0,"temp_f":{}}}}}"#, temp_f)
    }

    fn provider(server: &ServerGuard) -> OutdoorTemperatureProvider {
        let client = WeatherApiClient::new(&server.url(), "secret", "78701", TemperatureUnit::Fahrenheit).unwrap();
        OutdoorTemperatureProvider::new(client, Duration::minutes(5), 3, Duration::millis(1))
    }

    fn at(time: &str) -> DateTime {
        DateTime::from_iso(time).unwrap()
    }

    #[tokio::test]
    async fn lookups_within_ttl_use_cache() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/current.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body(91.0))
            .expect(1)
            .create_async()
            .await;

        let provider = provider(&server);
        let shared = provider.clone();

        let first = FIXED_NOW
            .scope(at("2024-07-15T12:00:00Z"), provider.outdoor_temperature())
            .await;
        let second = FIXED_NOW
            .scope(at("2024-07-15T12:04:59Z"), shared.outdoor_temperature())
            .await;

        assert_eq!(first, Some(91.0));
        assert_eq!(second, Some(91.0));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn expired_cache_is_refreshed() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/current.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body(91.0))
            .expect(2)
            .create_async()
            .await;

        let provider = provider(&server);

        FIXED_NOW
            .scope(at("2024-07-15T12:00:00Z"), provider.outdoor_temperature())
            .await;
        FIXED_NOW
            .scope(at("2024-07-15T12:05:00Z"), provider.outdoor_temperature())
            .await;

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rate_limit_returns_stale_value_without_retry() {
        let mut server = Server::new_async().await;
        let ok = server
            .mock("GET", "/v1/current.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body(88.0))
            .expect(1)
            .create_async()
            .await;

        let provider = provider(&server);
        FIXED_NOW
            .scope(at("2024-07-15T12:00:00Z"), provider.outdoor_temperature())
            .await;
        ok.assert_async().await;
        ok.remove_async().await;

        let limited = server
            .mock("GET", "/v1/current.json")
            .match_query(Matcher::Any)
            .with_status(429)
            .expect(1)
            .create_async()
            .await;

        let stale = FIXED_NOW
            .scope(at("2024-07-15T13:00:00Z"), provider.outdoor_temperature())
            .await;

        assert_eq!(stale, Some(88.0));
        limited.assert_async().await;
    }

    #[tokio::test]
    async fn failing_api_is_retried_then_gives_up() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/current.json")
            .match_query(Matcher::Any)
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let provider = provider(&server);

        assert_eq!(provider.outdoor_temperature().await, None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn recovers_on_later_attempt() {
        let mut server = Server::new_async().await;
        let failing = server
            .mock("GET", "/v1/current.json")
            .match_query(Matcher::Any)
            .with_status(502)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/v1/current.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body(79.5))
            .expect(1)
            .create_async()
            .await;

        let provider = provider(&server);

        assert_eq!(provider.outdoor_temperature().await, Some(79.5));
        failing.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn expired_reading_is_kept() {
        let mut cache = WeatherCache::default();

        FIXED_NOW.scope(at("2024-07-01T14:00:00Z"), async { cache.store(93.0) }).await;
        let (fresh, expired) = FIXED_NOW
            .scope(at("2024-07-01T14:05:00Z"), async {
                (cache.fresh(Duration::minutes(6)), cache.fresh(Duration::minutes(5)))
            })
            .await;

        assert_eq!(fresh, Some(93.0));
        assert_eq!(expired, None);
        assert_eq!(cache.temperature, Some(93.0));
    }

    #[tokio::test]
    async fn missing_provider_has_no_value() {
        let provider: Option<OutdoorTemperatureProvider> = None;

        assert_eq!(provider.outdoor_temperature().await, None);
    }
}
