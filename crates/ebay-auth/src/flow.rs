//! Authorization code flow orchestration
//!
//! `AuthFlow::execute` decides, from whatever is already stored, how much
//! work is needed to end up holding a usable access token:
//! 1. Stored token still valid → done, no network call
//! 2. Refresh token present → refresh grant; on failure fall through
//! 3. Build the consent URL, fetch it without following redirects, take the
//!    code from the 302 `Location`, and exchange it
//!
//! When consent needs a real browser, the same round-trip is split in two:
//! `authorization_url()` hands the URL to the user, and
//! `complete_from_redirect()` takes the URL they were sent back to.
//!
//! Config is resolved once when the flow is built. Failures never erase
//! stored tokens; only a successful exchange or refresh overwrites them.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::authorize::{build_auth_url, extract_code, extract_error};
use crate::config::{ClientConfig, resolve_config};
use crate::credentials::{TokenRecord, TokenStore};
use crate::error::{Error, Result};
use crate::properties::PropertyStore;
use crate::token;
use crate::transport::{HttpRequest, HttpTransport};

/// How `execute` ended up with a valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowOutcome {
    /// The stored token was still valid
    AlreadyValid,
    /// A refresh grant issued a new access token
    Refreshed,
    /// A full consent round-trip and code exchange completed
    Authorized,
}

/// Snapshot of what is stored, for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthStatus {
    pub has_access_token: bool,
    pub has_refresh_token: bool,
    pub is_token_valid: bool,
    /// Unix timestamp in milliseconds
    pub expires_at: Option<u64>,
}

impl AuthStatus {
    /// Read the status straight from a token store; needs no client config.
    pub fn read(tokens: &TokenStore) -> Self {
        Self {
            has_access_token: tokens.access_token().is_some(),
            has_refresh_token: tokens.refresh_token().is_some(),
            is_token_valid: tokens.is_valid(),
            expires_at: tokens.expires_at(),
        }
    }
}

/// Drives the authorization code flow for one client configuration.
pub struct AuthFlow {
    config: ClientConfig,
    tokens: TokenStore,
    transport: Arc<dyn HttpTransport>,
}

impl AuthFlow {
    pub fn new(
        config: ClientConfig,
        properties: Arc<dyn PropertyStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            config,
            tokens: TokenStore::new(properties),
            transport,
        }
    }

    /// Build a flow whose client config comes from the property store.
    pub fn from_properties(
        properties: Arc<dyn PropertyStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        let config = resolve_config(properties.as_ref()).ok_or_else(|| {
            Error::Configuration(
                "CLIENT_ID, CLIENT_SECRET, REDIRECT_URI and SCOPE must all be set".into(),
            )
        })?;
        Ok(Self::new(config, properties, transport))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Make sure a valid access token is stored, doing as little as possible.
    pub async fn execute(&self) -> Result<FlowOutcome> {
        if self.tokens.is_valid() {
            info!("stored access token is still valid");
            return Ok(FlowOutcome::AlreadyValid);
        }

        if let Some(refresh) = self.tokens.refresh_token() {
            info!("access token expired, refreshing");
            match self.refresh_with(&refresh).await {
                Ok(_) => return Ok(FlowOutcome::Refreshed),
                Err(e) => {
                    warn!(error = %e, "refresh failed, falling back to full authorization");
                }
            }
        }

        let url = self.authorization_url(None)?;
        self.authenticate_with_url(&url).await?;
        Ok(FlowOutcome::Authorized)
    }

    /// Consent URL for the configured client.
    pub fn authorization_url(&self, state: Option<&str>) -> Result<String> {
        build_auth_url(&self.config, state)
    }

    /// Fetch a consent URL directly and exchange the code from its redirect.
    ///
    /// Only works when the authorization server redirects without an
    /// interactive login (an existing session). Anything other than a 302
    /// carrying a `code` is `Error::Protocol`.
    pub async fn authenticate_with_url(&self, url: &str) -> Result<TokenRecord> {
        if !targets_endpoint(url, &self.config.auth_url) {
            return Err(Error::Configuration(format!(
                "not an authorization URL for {}",
                self.config.auth_url
            )));
        }

        let response = self.transport.fetch(&HttpRequest::get(url)).await?;
        if response.status != 302 {
            return Err(Error::Protocol(format!(
                "authorization endpoint returned {}, expected a 302 redirect",
                response.status
            )));
        }

        let location = response.header("location").ok_or_else(|| {
            Error::Protocol("authorization redirect has no Location header".into())
        })?;
        let code = code_from_redirect(location)?;
        self.redeem_code(&code).await
    }

    /// Finish the flow from the URL the browser was redirected to.
    ///
    /// A redirect without a code fails before anything is written.
    pub async fn complete_from_redirect(&self, redirect_url: &str) -> Result<TokenRecord> {
        let code = code_from_redirect(redirect_url)?;
        let record = self.redeem_code(&code).await?;
        info!(
            has_refresh_token = record.refresh_token.is_some(),
            "authorization completed from redirect"
        );
        Ok(record)
    }

    /// A currently valid access token, refreshing first if needed.
    ///
    /// `Error::State` when nothing valid is stored and no refresh succeeds;
    /// the caller has to run the consent flow again.
    pub async fn access_token(&self) -> Result<String> {
        if self.tokens.is_valid() {
            if let Some(access) = self.tokens.access_token() {
                return Ok(access);
            }
        }

        let refresh = self.tokens.refresh_token().ok_or_else(|| {
            Error::State("no valid access token and no refresh token stored".into())
        })?;

        match self.refresh_with(&refresh).await {
            Ok(record) => Ok(record.access_token),
            Err(e) => {
                warn!(error = %e, "refresh failed while fetching access token");
                Err(Error::State(format!("access token expired and refresh failed: {e}")))
            }
        }
    }

    /// Headers for calling eBay REST APIs with the current access token.
    pub async fn api_headers(&self) -> Result<HeaderMap> {
        let access = self.access_token().await?;

        let mut bearer = HeaderValue::from_str(&format!("Bearer {access}")).map_err(|e| {
            Error::Protocol(format!("stored access token is not a valid header value: {e}"))
        })?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub fn status(&self) -> AuthStatus {
        AuthStatus::read(&self.tokens)
    }

    /// Forget every stored token and the last authorization code.
    pub fn clear(&self) -> Result<()> {
        self.tokens.clear()
    }

    async fn redeem_code(&self, code: &str) -> Result<TokenRecord> {
        self.tokens.store_auth_code(code)?;
        let record = token::exchange_code(self.transport.as_ref(), &self.config, code).await?;
        self.tokens.write(&record)?;
        Ok(record)
    }

    async fn refresh_with(&self, refresh: &str) -> Result<TokenRecord> {
        let record = token::refresh_token(self.transport.as_ref(), &self.config, refresh).await?;
        self.tokens.write(&record)?;
        debug!(expires_at = record.expires_at_millis, "refreshed token stored");
        Ok(record)
    }
}

/// `url` points at `endpoint`: same scheme, host, effective port and path,
/// compared after `Url` normalization so host case and default ports don't
/// matter.
fn targets_endpoint(url: &str, endpoint: &str) -> bool {
    match (Url::parse(url), Url::parse(endpoint)) {
        (Ok(url), Ok(endpoint)) => {
            url.scheme() == endpoint.scheme()
                && url.host_str() == endpoint.host_str()
                && url.port_or_known_default() == endpoint.port_or_known_default()
                && url.path() == endpoint.path()
        }
        _ => false,
    }
}

fn code_from_redirect(url: &str) -> Result<String> {
    extract_code(url).ok_or_else(|| match extract_error(url) {
        Some(reason) => Error::Protocol(format!("authorization was not granted: {reason}")),
        None => Error::Protocol("redirect URL carries no authorization code".into()),
    })
}

/// Run the whole flow with config and tokens from `properties`.
pub async fn execute_authorization_code_flow(
    properties: Arc<dyn PropertyStore>,
    transport: Arc<dyn HttpTransport>,
) -> Result<FlowOutcome> {
    let flow = AuthFlow::from_properties(properties, transport).inspect_err(|e| {
        warn!(error = %e, "authorization code flow cannot start");
    })?;
    flow.execute().await
}
