//! eBay OAuth2 authorization code flow
//!
//! Obtains and maintains user access tokens for eBay REST APIs. The library
//! owns no global state: the property store and the HTTP transport are
//! injected, so the same flow runs against a JSON file and reqwest in the CLI
//! and against in-memory fakes in tests.
//!
//! Credential flow:
//! 1. Client config resolved from properties (`config::resolve_config`) or
//!    built explicitly (`ClientConfig::new`)
//! 2. User consents at `authorize::build_auth_url()`
//! 3. Redirect URL handed to `AuthFlow::complete_from_redirect()`, which
//!    calls `token::exchange_code()`
//! 4. Tokens stored via `credentials::TokenStore::write()`
//! 5. Later calls to `AuthFlow::execute()` / `AuthFlow::api_headers()` refresh
//!    through `token::refresh_token()` once the access token is within five
//!    minutes of expiry

pub mod authorize;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod flow;
pub mod properties;
pub mod secret;
pub mod token;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use authorize::{build_auth_url, extract_code, generate_state};
pub use config::{ClientConfig, resolve_config};
pub use constants::*;
pub use credentials::{TokenRecord, TokenStore};
pub use error::{Error, Result};
pub use flow::{AuthFlow, AuthStatus, FlowOutcome, execute_authorization_code_flow};
pub use properties::{FileStore, MemoryStore, PropertyStore};
pub use secret::ClientSecret;
pub use token::{TokenResponse, exchange_code, refresh_token};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
