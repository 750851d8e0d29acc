pub mod error;
pub mod types;

pub use error::{IbgeError, Result};
pub use types::{Municipality, State};

use serde::de::DeserializeOwned;
use std::time::Duration;

const BASE_URL: &str = "https://servicodados.ibge.gov.br/api/v1/localidades";

pub struct IbgeClient {
    client: reqwest::Client,
    base_url: String,
}

impl IbgeClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// All municipalities of one state, in IBGE order.
    pub async fn municipalities(&self, uf: &str) -> Result<Vec<Municipality>> {
        let url = format!("{}/estados/{}/municipios", self.base_url, uf);
        let municipalities: Vec<Municipality> = self.get_json(&url).await?;
        tracing::debug!(uf, count = municipalities.len(), "Fetched IBGE municipalities");
        Ok(municipalities)
    }

    /// All 27 federative units.
    pub async fn states(&self) -> Result<Vec<State>> {
        let url = format!("{}/estados", self.base_url);
        self.get_json(&url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(IbgeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
