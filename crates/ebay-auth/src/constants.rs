//! eBay OAuth endpoints, property keys, and token lifetime constants
//!
//! The endpoint defaults target eBay production. Sandbox deployments override
//! them through the `AUTH_URL` / `TOKEN_URL` properties or the explicit
//! client config.

/// Consent page the user is sent to
pub const DEFAULT_AUTH_URL: &str = "https://auth.ebay.com/oauth2/authorize";

/// Token endpoint for code exchange and refresh
pub const DEFAULT_TOKEN_URL: &str = "https://api.ebay.com/identity/v1/oauth2/token";

pub const DEFAULT_RESPONSE_TYPE: &str = "code";

/// Lifetime assumed when the token endpoint omits `expires_in` (2 hours)
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 7200;

/// A token is treated as expired this long before its real expiry (5 minutes)
pub const EXPIRY_MARGIN_MILLIS: u64 = 300_000;

/// Property store keys. All values are strings; a missing key means
/// "not configured" or "not yet authenticated".
pub mod keys {
    pub const ACCESS_TOKEN: &str = "ACCESS_TOKEN";
    pub const REFRESH_TOKEN: &str = "REFRESH_TOKEN";
    /// Absolute expiry as decimal epoch milliseconds
    pub const TOKEN_EXPIRES_AT: &str = "TOKEN_EXPIRES_AT";
    pub const AUTH_CODE: &str = "AUTH_CODE";

    pub const CLIENT_ID: &str = "CLIENT_ID";
    pub const CLIENT_SECRET: &str = "CLIENT_SECRET";
    pub const REDIRECT_URI: &str = "REDIRECT_URI";
    pub const SCOPE: &str = "SCOPE";
    pub const AUTH_URL: &str = "AUTH_URL";
    pub const TOKEN_URL: &str = "TOKEN_URL";
    pub const RESPONSE_TYPE: &str = "RESPONSE_TYPE";

    /// Every key `clear` removes
    pub const AUTH_DATA: [&str; 4] = [ACCESS_TOKEN, REFRESH_TOKEN, TOKEN_EXPIRES_AT, AUTH_CODE];
}
