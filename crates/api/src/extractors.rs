//! Request extractors.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use heatmap_core::{extract_bearer_token, BearerToken};
use telemetry::metrics;
use tracing::debug;

use crate::response::ApiError;
use crate::state::AppState;

/// Authenticated caller.
///
/// Built from the `Authorization: Bearer` header after the auth service
/// confirmed the token grants `read`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub token: BearerToken,
    pub user_id: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let result = async {
            let token = extract_bearer_token(auth_header)?;
            let auth_response = state.auth_client.validate(&token).await?;
            let user_id = auth_response.user_id()?.to_string();
            Ok::<_, heatmap_core::Error>(AuthContext { token, user_id })
        }
        .await;

        result.map_err(|e| {
            metrics().auth_failures.inc();
            debug!(error = %e, "Rejected heatmap request");
            ApiError::from(e)
        })
    }
}
