use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, header};
use tracing::{debug, instrument};

use crate::{
    Config, Coordinate, ForecastDocument, Granularity,
    config::ApiKey,
    error::FetchError,
};

use super::ForecastSource;

/// Client for the DataHub site-specific point endpoints.
///
/// The underlying `reqwest::Client` pools connections and is shared by all
/// concurrent calls; cloning is cheap.
#[derive(Debug, Clone)]
pub struct MetOfficeClient {
    api_key: Option<ApiKey>,
    base_url: String,
    http: Client,
}

impl MetOfficeClient {
    /// A missing API key is not an error here; [`fetch`](ForecastSource::fetch)
    /// reports it per call so every operation answers with the same message.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client for Met Office API")?;

        Ok(Self {
            api_key: config.api_key().cloned(),
            base_url: config.base_url().to_string(),
            http,
        })
    }

    fn endpoint_url(&self, granularity: Granularity) -> String {
        format!("{}/{}", self.base_url, granularity.endpoint())
    }
}

#[async_trait]
impl ForecastSource for MetOfficeClient {
    #[instrument(
        skip(self, coordinate),
        fields(lat = coordinate.latitude(), lon = coordinate.longitude())
    )]
    async fn fetch(
        &self,
        coordinate: Coordinate,
        granularity: Granularity,
    ) -> Result<ForecastDocument, FetchError> {
        let api_key = self.api_key.as_ref().ok_or(FetchError::MissingCredential)?;
        let url = self.endpoint_url(granularity);

        debug!(url = %url, "Fetching Met Office forecast");

        let res = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .header("apikey", api_key.expose())
            .query(&[
                ("latitude", coordinate.latitude().to_string()),
                ("longitude", coordinate.longitude().to_string()),
                ("includeLocationName", "true".to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let document: ForecastDocument =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        if document.is_empty() {
            return Err(FetchError::NoData);
        }

        debug!(steps = document.total_steps(), "Met Office forecast received");
        Ok(document)
    }
}
