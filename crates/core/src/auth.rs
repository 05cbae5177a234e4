//! Bearer token parsing and auth service types.
//!
//! Heatmap reads are restricted to signed-in admins. The token itself is
//! issued and verified by the auth service; this module only checks its
//! shape and models the validation round trip.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{AuthErrorCode, Error, Result};
use crate::limits::BEARER_TOKEN_PATTERN;

/// Compiled bearer token regex (lazy initialization).
static BEARER_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(BEARER_TOKEN_PATTERN).expect("invalid bearer token pattern"));

/// Permission required to read heatmap aggregates.
pub const READ_PERMISSION: &str = "read";

/// Parsed and shape-checked bearer token from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken {
    raw: String,
}

impl BearerToken {
    /// Parse and validate a bearer token.
    pub fn parse(token: &str) -> Result<Self> {
        if token.is_empty() {
            return Err(Error::auth(
                AuthErrorCode::MissingToken,
                "Bearer token is required",
            ));
        }

        if !BEARER_TOKEN_REGEX.is_match(token) {
            return Err(Error::auth(
                AuthErrorCode::InvalidFormat,
                "Invalid bearer token format",
            ));
        }

        Ok(Self {
            raw: token.to_string(),
        })
    }

    /// Get the raw token string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the token looks like a JWT (three dot-separated segments).
    pub fn is_jwt(&self) -> bool {
        self.raw.split('.').count() == 3
    }
}

/// Request to auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    /// The bearer token to validate.
    pub token: String,
    /// Required permission.
    pub required_permission: String,
}

impl AuthRequest {
    /// Create a new auth request for read permission.
    pub fn read(token: &str) -> Self {
        Self {
            token: token.to_string(),
            required_permission: READ_PERMISSION.to_string(),
        }
    }
}

/// Auth response from the auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Whether the token is valid.
    pub valid: bool,
    /// Subject the token was issued to.
    pub user_id: Option<String>,
    /// Granted permissions.
    pub permissions: Option<Vec<String>>,
    /// Error details if invalid.
    pub error: Option<AuthResponseError>,
}

/// Auth error in response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponseError {
    pub code: String,
    pub message: String,
}

impl AuthResponse {
    /// Check that auth succeeded with read access and extract the subject.
    pub fn user_id(&self) -> Result<&str> {
        if !self.valid {
            let err = self.error.as_ref();
            let code = err.map(|e| e.code.as_str()).unwrap_or("AUTH_003");
            let msg = err
                .map(|e| e.message.as_str())
                .unwrap_or("Invalid bearer token");

            return Err(match code {
                "AUTH_001" => Error::auth(AuthErrorCode::MissingToken, msg),
                "AUTH_002" => Error::auth(AuthErrorCode::InvalidFormat, msg),
                "AUTH_004" => Error::auth(AuthErrorCode::Revoked, msg),
                "AUTH_005" => Error::auth(AuthErrorCode::InsufficientPermissions, msg),
                _ => Error::auth(AuthErrorCode::InvalidToken, msg),
            });
        }

        if !self.has_permission(READ_PERMISSION) {
            return Err(Error::auth(
                AuthErrorCode::InsufficientPermissions,
                "Read permission required",
            ));
        }

        self.user_id
            .as_deref()
            .ok_or_else(|| Error::auth(AuthErrorCode::InvalidToken, "Missing user ID in response"))
    }

    /// Whether the response grants the given permission.
    ///
    /// A missing permission list means the auth service does not scope
    /// tokens, so every permission is granted.
    pub fn has_permission(&self, permission: &str) -> bool {
        match &self.permissions {
            Some(perms) => perms.iter().any(|p| p == permission),
            None => true,
        }
    }
}

/// Extract a bearer token from the `Authorization` header.
pub fn extract_bearer_token(auth_header: Option<&str>) -> Result<BearerToken> {
    match auth_header {
        Some(auth) => match auth.strip_prefix("Bearer ") {
            Some(token) => BearerToken::parse(token.trim()),
            None => Err(Error::auth(
                AuthErrorCode::InvalidFormat,
                "Authorization header must use the Bearer scheme",
            )),
        },
        None => Err(Error::auth(
            AuthErrorCode::MissingToken,
            "Bearer token is required",
        )),
    }
}
