//! OAuth token exchange and refresh
//!
//! Handles the two token endpoint interactions:
//! 1. Authorization code exchange (completing the consent round-trip)
//! 2. Refresh token grant (renewing an expired access token)
//!
//! Both POST a form body to `ClientConfig::token_url` and authenticate the
//! client with HTTP Basic `base64(client_id:client_secret)`. A single attempt
//! is made; there is no retry.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::constants::DEFAULT_EXPIRES_IN_SECS;
use crate::credentials::TokenRecord;
use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpTransport};

/// Response body from the token endpoint for both grants.
///
/// eBay omits `refresh_token` on refresh responses; `expires_in` is a delta
/// in seconds and defaults to two hours when absent or zero.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl TokenResponse {
    /// Lifetime in seconds with the default applied.
    pub fn lifetime_secs(&self) -> u64 {
        self.expires_in
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_EXPIRES_IN_SECS)
    }

    /// Convert to a record whose expiry is `now_millis + lifetime`.
    pub fn into_record(self, now_millis: u64) -> TokenRecord {
        let lifetime_millis = self.lifetime_secs().saturating_mul(1000);
        let expires_at_millis = now_millis.saturating_add(lifetime_millis);
        TokenRecord {
            access_token: self.access_token,
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            expires_at_millis,
        }
    }
}

/// Exchange an authorization code for an access/refresh token pair.
pub async fn exchange_code(
    transport: &dyn HttpTransport,
    config: &ClientConfig,
    code: &str,
) -> Result<TokenRecord> {
    let request = token_request(config)
        .form_param("grant_type", "authorization_code")
        .form_param("code", code)
        .form_param("redirect_uri", config.redirect_uri.as_str());

    let response = request_token(transport, &request, "authorization_code").await?;
    info!("authorization code exchanged for tokens");
    Ok(response.into_record(now_millis()))
}

/// Obtain a new access token with a refresh token.
///
/// The returned record carries a refresh token only if the endpoint rotated
/// it; callers keep the old one otherwise.
pub async fn refresh_token(
    transport: &dyn HttpTransport,
    config: &ClientConfig,
    refresh: &str,
) -> Result<TokenRecord> {
    let request = token_request(config)
        .form_param("grant_type", "refresh_token")
        .form_param("refresh_token", refresh);

    let response = request_token(transport, &request, "refresh_token").await?;
    info!("access token refreshed");
    Ok(response.into_record(now_millis()))
}

/// `Basic` credential for the token endpoint.
pub fn basic_credentials(config: &ClientConfig) -> String {
    let raw = format!("{}:{}", config.client_id, config.client_secret.expose());
    format!("Basic {}", STANDARD.encode(raw))
}

fn token_request(config: &ClientConfig) -> HttpRequest {
    HttpRequest::post(config.token_url.as_str())
        .header("Authorization", basic_credentials(config))
        .header("Content-Type", "application/x-www-form-urlencoded")
}

async fn request_token(
    transport: &dyn HttpTransport,
    request: &HttpRequest,
    grant: &str,
) -> Result<TokenResponse> {
    debug!(grant, token_url = %request.url, "requesting token");
    let response = transport.fetch(request).await?;

    if response.status != 200 {
        warn!(grant, status = response.status, "token endpoint rejected request");
        return Err(Error::Protocol(format!(
            "{grant} grant: token endpoint returned {}: {}",
            response.status, response.body
        )));
    }

    serde_json::from_str::<TokenResponse>(&response.body)
        .map_err(|e| Error::Protocol(format!("{grant} grant: invalid token response: {e}")))
}

/// Current unix time in milliseconds.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
