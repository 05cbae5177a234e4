//! Where the controller gets aggregates from.

use async_trait::async_trait;
use heatmap_core::{DeviceFilter, HeatmapResponse};
use reqwest::{header, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::FetchError;
use crate::filters::Filters;

/// One aggregation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapQuery {
    pub page_path: String,
    pub days: u32,
    pub grid: u32,
    pub device: DeviceFilter,
}

impl HeatmapQuery {
    pub fn new(page_path: impl Into<String>, filters: &Filters) -> Self {
        Self {
            page_path: page_path.into(),
            days: filters.days.days(),
            grid: filters.grid.size(),
            device: filters.device,
        }
    }

    /// `{base}/heatmap/{page_path}?days=&grid=&device=` with the page path
    /// encoded as a single path segment.
    pub fn url(&self, base: &Url) -> Result<Url, FetchError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidRequest(format!("{} cannot be a base URL", base)))?
            .pop_if_empty()
            .push("heatmap")
            .push(&self.page_path);
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("days", &self.days.to_string())
            .append_pair("grid", &self.grid.to_string())
            .append_pair("device", self.device.as_str());
        Ok(url)
    }
}

/// Anything that can answer a heatmap query.
#[async_trait]
pub trait HeatmapSource: Send + Sync {
    async fn fetch(&self, query: &HeatmapQuery) -> Result<HeatmapResponse, FetchError>;
}

/// Aggregator API over HTTP with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpHeatmapSource {
    base_url: Url,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpHeatmapSource {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.set_token(Some(token.into()));
        self
    }

    /// Replace the session token; `None` or an empty token signs out.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token.filter(|t| !t.trim().is_empty());
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

#[async_trait]
impl HeatmapSource for HttpHeatmapSource {
    async fn fetch(&self, query: &HeatmapQuery) -> Result<HeatmapResponse, FetchError> {
        let Some(token) = self.token.as_deref() else {
            return Err(FetchError::AuthRequired);
        };
        let url = query.url(&self.base_url)?;

        debug!(url = %url, "Fetching heatmap");
        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Unauthorized(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
