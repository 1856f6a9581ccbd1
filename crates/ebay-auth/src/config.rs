//! OAuth client configuration
//!
//! A `ClientConfig` is either built explicitly by the embedding application or
//! assembled from the property store with `resolve_config`. Both paths feed
//! the same flow; nothing downstream knows where the values came from.

use tracing::warn;

use crate::constants::{DEFAULT_AUTH_URL, DEFAULT_RESPONSE_TYPE, DEFAULT_TOKEN_URL, keys};
use crate::error::{Error, Result};
use crate::properties::PropertyStore;
use crate::secret::ClientSecret;

/// Client credentials and endpoints for one flow invocation.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: ClientSecret,
    /// eBay calls this the RuName; it must match the app's registered value
    pub redirect_uri: String,
    /// Space-separated scope URLs
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub response_type: String,
}

impl ClientConfig {
    /// Config with the production eBay endpoints and `response_type=code`.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<ClientSecret>,
        redirect_uri: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scope: scope.into(),
            auth_url: DEFAULT_AUTH_URL.to_owned(),
            token_url: DEFAULT_TOKEN_URL.to_owned(),
            response_type: DEFAULT_RESPONSE_TYPE.to_owned(),
        }
    }

    pub fn with_auth_url(mut self, auth_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    pub fn with_response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = response_type.into();
        self
    }

    /// Check the fields the consent URL cannot be built without.
    pub fn validate_for_authorization(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("client_id", &self.client_id),
            ("redirect_uri", &self.redirect_uri),
            ("scope", &self.scope),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Configuration(format!(
                "missing required parameters: {}",
                missing.join(", ")
            )))
        }
    }
}

/// Assemble a `ClientConfig` from the property store.
///
/// Returns `None` when any of `CLIENT_ID`, `CLIENT_SECRET`, `REDIRECT_URI`,
/// or `SCOPE` is missing or empty. Endpoint and response type properties are
/// optional and fall back to the production defaults.
pub fn resolve_config(store: &dyn PropertyStore) -> Option<ClientConfig> {
    let required = |key: &str| non_empty(store, key);

    let (Some(client_id), Some(client_secret), Some(redirect_uri), Some(scope)) = (
        required(keys::CLIENT_ID),
        required(keys::CLIENT_SECRET),
        required(keys::REDIRECT_URI),
        required(keys::SCOPE),
    ) else {
        warn!(
            required = ?[keys::CLIENT_ID, keys::CLIENT_SECRET, keys::REDIRECT_URI, keys::SCOPE],
            "client configuration incomplete in property store"
        );
        return None;
    };

    let mut config = ClientConfig::new(client_id, client_secret, redirect_uri, scope);
    if let Some(auth_url) = non_empty(store, keys::AUTH_URL) {
        config.auth_url = auth_url;
    }
    if let Some(token_url) = non_empty(store, keys::TOKEN_URL) {
        config.token_url = token_url;
    }
    if let Some(response_type) = non_empty(store, keys::RESPONSE_TYPE) {
        config.response_type = response_type;
    }
    Some(config)
}

fn non_empty(store: &dyn PropertyStore, key: &str) -> Option<String> {
    store.get(key).filter(|v| !v.is_empty())
}
