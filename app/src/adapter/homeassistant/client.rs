use anyhow::{Context, bail};
use infrastructure::HttpClientConfig;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct StateResponse {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: ClimateAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClimateAttributes {
    pub current_temperature: Option<f64>,
    pub temperature: Option<f64>,
    pub hvac_action: Option<String>,
    pub equipment_running: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HaHttpClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl HaHttpClient {
    pub fn new(url: &str, token: &str) -> anyhow::Result<Self> {
        let client = HttpClientConfig::new(Some(token.to_owned())).new_tracing_client()?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_owned(),
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_state(&self, entity_id: &str) -> anyhow::Result<StateResponse> {
        let response = self
            .client
            .get(format!("{}/api/states/{}", self.base_url, entity_id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            bail!("Entity {} not found", entity_id);
        }

        response.error_for_status_ref()?;

        response
            .json::<StateResponse>()
            .await
            .with_context(|| format!("Error parsing state of {}", entity_id))
    }
}
