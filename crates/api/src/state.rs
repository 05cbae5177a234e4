//! Application state shared across handlers.

use clickhouse_client::ClickEventStore;
use heatmap_core::{
    error::AuthErrorCode,
    limits::{CLICK_PAGE_SIZE, DEFAULT_DAYS, DEFAULT_GRID_SIZE, MAX_BINS},
    AuthRequest, AuthResponse, BearerToken, Error, RequestDefaults,
};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cache TTL for auth responses (30 seconds).
const AUTH_CACHE_TTL: Duration = Duration::from_secs(30);

/// Maximum cache entries.
const AUTH_CACHE_MAX_CAPACITY: u64 = 10_000;

/// Auth service client.
///
/// Calls the auth service's `/internal/auth/validate` endpoint and caches
/// successful validations for 30 seconds.
#[derive(Clone)]
pub struct AuthClient {
    /// Auth service URL (e.g., "http://auth-service:8080")
    base_url: String,
    http_client: reqwest::Client,
    /// Bearer token -> successful AuthResponse
    cache: Cache<String, AuthResponse>,
    /// Accept any well-formed token (development and tests)
    mock_mode: bool,
}

impl AuthClient {
    /// Creates a new auth client. An empty URL or `"mock"` enables mock mode.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let mock_mode = base_url.is_empty() || base_url == "mock";

        Self {
            base_url,
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
            cache: Cache::builder()
                .max_capacity(AUTH_CACHE_MAX_CAPACITY)
                .time_to_live(AUTH_CACHE_TTL)
                .build(),
            mock_mode,
        }
    }

    pub fn is_mock(&self) -> bool {
        self.mock_mode
    }

    /// Validate a bearer token with the auth service.
    pub async fn validate(&self, token: &BearerToken) -> Result<AuthResponse, Error> {
        let cache_key = token.as_str().to_string();

        if let Some(cached) = self.cache.get(&cache_key).await {
            debug!("Auth cache hit");
            return Ok(cached);
        }

        let response = if self.mock_mode {
            self.mock_validate(token)
        } else {
            self.remote_validate(token).await?
        };

        // Rejections are not cached so a freshly issued token works at once.
        if response.valid {
            self.cache.insert(cache_key, response.clone()).await;
        }

        Ok(response)
    }

    /// Call the remote auth service.
    async fn remote_validate(&self, token: &BearerToken) -> Result<AuthResponse, Error> {
        let url = format!("{}/internal/auth/validate", self.base_url);
        let request = AuthRequest::read(token.as_str());

        debug!(url = %url, "Calling auth service");

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Auth service request failed");
                Error::internal(format!("Auth service unavailable: {}", e))
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::auth(AuthErrorCode::InvalidToken, "Token rejected by auth service"));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Auth service returned error");
            return Err(Error::internal(format!(
                "Auth service returned {}: {}",
                status, body
            )));
        }

        response.json::<AuthResponse>().await.map_err(|e| {
            warn!(error = %e, "Failed to parse auth response");
            Error::internal(format!("Invalid auth response: {}", e))
        })
    }

    /// Mock validation for testing/development.
    fn mock_validate(&self, token: &BearerToken) -> AuthResponse {
        debug!("Using mock auth validation");
        AuthResponse {
            valid: true,
            user_id: Some(mock_user_id(token)),
            permissions: Some(vec!["read".into()]),
            error: None,
        }
    }

    /// Drop a cached validation (e.g. after sign-out).
    pub async fn invalidate(&self, token: &BearerToken) {
        self.cache.invalidate(token.as_str()).await;
    }
}

/// Deterministic mock user ID derived from the token.
fn mock_user_id(token: &BearerToken) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    token.as_str().hash(&mut hasher);
    format!("user-{:016x}", hasher.finish())
}

/// Tunables for the heatmap endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HeatmapSettings {
    /// Rows per store page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Distinct-cell cap per aggregate.
    #[serde(default = "default_max_bins")]
    pub max_bins: usize,
    /// Window used when `days` is omitted.
    #[serde(default = "default_days")]
    pub default_days: u32,
    /// Resolution used when `grid` is omitted.
    #[serde(default = "default_grid")]
    pub default_grid: u32,
}

impl HeatmapSettings {
    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            days: self.default_days,
            grid: self.default_grid,
        }
    }
}

fn default_page_size() -> u64 {
    CLICK_PAGE_SIZE
}

fn default_max_bins() -> usize {
    MAX_BINS
}

fn default_days() -> u32 {
    DEFAULT_DAYS
}

fn default_grid() -> u32 {
    DEFAULT_GRID_SIZE
}

impl Default for HeatmapSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_bins: default_max_bins(),
            default_days: default_days(),
            default_grid: default_grid(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Click event store (ClickHouse in production, in-memory in tests)
    pub store: Arc<dyn ClickEventStore>,
    pub auth_client: AuthClient,
    pub heatmap: HeatmapSettings,
}

impl AppState {
    pub fn new(store: Arc<dyn ClickEventStore>, auth_url: impl Into<String>) -> Self {
        Self::with_settings(store, auth_url, HeatmapSettings::default())
    }

    pub fn with_settings(
        store: Arc<dyn ClickEventStore>,
        auth_url: impl Into<String>,
        heatmap: HeatmapSettings,
    ) -> Self {
        Self {
            store,
            auth_client: AuthClient::new(auth_url),
            heatmap,
        }
    }
}
