//! Authorization request URL and redirect parsing
//!
//! The consent URL sends the user to eBay's authorize endpoint. After consent
//! eBay redirects to the app's accepted URL with `?code=...&state=...`; the
//! helpers here pull those parameters back out of whatever URL the user (or
//! the 302 `Location` header) hands us.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Generate an opaque `state` value for the authorization request.
///
/// 16 random bytes, URL-safe base64 without padding (22 characters). The flow
/// does not verify it on the way back; it only has to be unguessable enough
/// to bind a redirect to the request that produced it.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Build the consent URL for `config`.
///
/// Uses `state` when given, otherwise a fresh `generate_state()`. Fails with
/// `Error::Configuration` when client id, redirect URI, or scope is empty or
/// when `auth_url` is not a valid absolute URL.
pub fn build_auth_url(config: &ClientConfig, state: Option<&str>) -> Result<String> {
    config.validate_for_authorization()?;

    let state = match state {
        Some(s) => s.to_owned(),
        None => generate_state(),
    };

    let url = Url::parse_with_params(
        &config.auth_url,
        &[
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("scope", config.scope.as_str()),
            ("response_type", config.response_type.as_str()),
            ("state", state.as_str()),
        ],
    )
    .map_err(|e| Error::Configuration(format!("invalid auth_url {:?}: {e}", config.auth_url)))?;

    debug!(auth_url = %config.auth_url, state, "built authorization URL");
    Ok(url.to_string())
}

/// Extract the authorization `code` from a redirect URL.
///
/// Accepts absolute or relative URLs; anything after `#` is ignored. Returns
/// `None` when there is no query string or no non-empty `code` parameter.
pub fn extract_code(url: &str) -> Option<String> {
    query_param(url, "code")
}

/// Extract the `error` parameter eBay sends when the user declines consent.
pub fn extract_error(url: &str) -> Option<String> {
    query_param(url, "error")
}

fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new(
            "Acme-Tool-PRD-1a2b",
            "PRD-secret",
            "Acme-Acme-Tool-PRD-abcdef",
            "https://api.ebay.com/oauth/api_scope https://api.ebay.com/oauth/api_scope/sell.inventory",
        )
    }

    /// What eBay's consent page redirects the browser to.
    fn build_redirect_url(code: &str) -> String {
        Url::parse_with_params(
            "https://acme.example/ebay/accepted",
            &[("state", "s-1"), ("code", code), ("expires_in", "299")],
        )
        .unwrap()
        .to_string()
    }

    #[test]
    fn auth_url_contains_encoded_params() {
        let url = build_auth_url(&config(), Some("state-123")).unwrap();

        assert!(url.starts_with("https://auth.ebay.com/oauth2/authorize?"));
        assert!(url.contains("client_id=Acme-Tool-PRD-1a2b"));
        assert!(url.contains("redirect_uri=Acme-Acme-Tool-PRD-abcdef"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state=state-123"));
        assert!(
            url.contains(
                "scope=https%3A%2F%2Fapi.ebay.com%2Foauth%2Fapi_scope+https%3A%2F%2Fapi.ebay.com%2Foauth%2Fapi_scope%2Fsell.inventory"
            ),
            "scope must be form-encoded: {url}"
        );
    }

    #[test]
    fn auth_url_params_come_back_out() {
        let url = build_auth_url(&config(), Some("a b&c")).unwrap();
        let parsed = Url::parse(&url).unwrap();
        let state = parsed
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned());
        assert_eq!(state.as_deref(), Some("a b&c"));
    }

    #[test]
    fn auth_url_generates_state_when_absent() {
        let url = build_auth_url(&config(), None).unwrap();
        let parsed = Url::parse(&url).unwrap();
        let state = parsed
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(state.len(), 22);
    }

    #[test]
    fn auth_url_honours_custom_endpoint_and_response_type() {
        let config = config()
            .with_auth_url("https://auth.sandbox.ebay.com/oauth2/authorize")
            .with_response_type("code id_token");
        let url = build_auth_url(&config, Some("s")).unwrap();
        assert!(url.starts_with("https://auth.sandbox.ebay.com/oauth2/authorize?"));
        assert!(url.contains("response_type=code+id_token"));
    }

    #[test]
    fn missing_required_fields_fail() {
        let mut no_client = config();
        no_client.client_id.clear();
        let mut no_redirect = config();
        no_redirect.redirect_uri.clear();
        let mut no_scope = config();
        no_scope.scope.clear();

        for config in [no_client, no_redirect, no_scope] {
            let err = build_auth_url(&config, Some("s")).unwrap_err();
            assert!(matches!(err, Error::Configuration(_)), "got: {err:?}");
        }
    }

    #[test]
    fn invalid_auth_url_is_configuration_error() {
        let config = config().with_auth_url("not a url");
        let err = build_auth_url(&config, None).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "got: {err:?}");
    }

    #[test]
    fn states_are_unique_and_url_safe() {
        let a = generate_state();
        let b = generate_state();
        assert_ne!(a, b);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "state must be URL-safe: {a}"
        );
    }

    #[test]
    fn extract_code_roundtrips_url_safe_codes() {
        for code in ["abc", "v^1.1#i^1#p^3#r^1#I^3#f^0#t^Ul4xMF8", "A-Z_a.z~09"] {
            assert_eq!(extract_code(&build_redirect_url(code)).as_deref(), Some(code));
        }
    }

    #[test]
    fn extract_code_handles_relative_and_fragment() {
        assert_eq!(extract_code("/accepted?code=xyz#done").as_deref(), Some("xyz"));
        assert_eq!(extract_code("?state=1&code=q%20r").as_deref(), Some("q r"));
    }

    #[test]
    fn extract_code_missing_or_malformed_is_none() {
        assert!(extract_code("https://acme.example/accepted").is_none());
        assert!(extract_code("https://acme.example/accepted?state=1").is_none());
        assert!(extract_code("https://acme.example/accepted?code=").is_none());
        assert!(extract_code("").is_none());
    }

    #[test]
    fn extract_error_reads_declined_consent() {
        let url = "https://acme.example/declined?error=access_denied&state=s";
        assert_eq!(extract_error(url).as_deref(), Some("access_denied"));
        assert!(extract_code(url).is_none());
    }
}
