//! REST client for the per-metric statistics API.
//!
//! Each endpoint returns one pre-aggregated statistic; the body is passed through as JSON.

use crate::domain::{DomainError, StatMetric};
use crate::ports::StatisticsPort;
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::{debug, warn};

pub struct StatsApiClient {
    client: Client,
    base_url: String,
}

impl StatsApiClient {
    /// # Arguments
    /// * `base_url` - API root, e.g. "https://stats.example.org/api" (trailing slash optional)
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, metric: &StatMetric) -> String {
        format!("{}{}", self.base_url, metric.path())
    }
}

#[async_trait::async_trait]
impl StatisticsPort for StatsApiClient {
    async fn fetch_metric(&self, metric: &StatMetric) -> Result<serde_json::Value, DomainError> {
        let url = self.url_for(metric);
        debug!(url = %url, "fetching statistic");

        let res = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| DomainError::StatsApi(format!("Request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            warn!(status = %status, url = %url, "statistics API returned error");
            return Err(DomainError::StatsApi(format!(
                "API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        res.json()
            .await
            .map_err(|e| DomainError::StatsApi(format!("Failed to parse response: {}", e)))
    }
}
