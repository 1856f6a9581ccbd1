//! Token persistence on top of the property store
//!
//! Tokens live as four flat string properties rather than one serialized
//! blob, so operators can inspect or hand-edit them. `TOKEN_EXPIRES_AT` is an
//! absolute unix timestamp in milliseconds, computed when the token response
//! arrives.
//!
//! Last writer wins: nothing serializes concurrent flows sharing a store.

use std::sync::Arc;

use tracing::{debug, info};

use crate::constants::{EXPIRY_MARGIN_MILLIS, keys};
use crate::error::Result;
use crate::properties::PropertyStore;
use crate::token::now_millis;

/// Tokens issued by one exchange or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Expiration as unix timestamp in milliseconds
    pub expires_at_millis: u64,
}

impl TokenRecord {
    pub fn is_valid_at(&self, now_millis: u64) -> bool {
        !self.access_token.is_empty() && is_live(self.expires_at_millis, now_millis)
    }
}

/// `now` is strictly before the expiry minus the five minute margin.
pub fn is_live(expires_at_millis: u64, now_millis: u64) -> bool {
    now_millis < expires_at_millis.saturating_sub(EXPIRY_MARGIN_MILLIS)
}

/// Reads and writes `TokenRecord`s through a `PropertyStore`.
#[derive(Clone)]
pub struct TokenStore {
    properties: Arc<dyn PropertyStore>,
}

impl TokenStore {
    pub fn new(properties: Arc<dyn PropertyStore>) -> Self {
        Self { properties }
    }

    /// The stored record, if both an access token and a parseable expiry exist.
    pub fn read(&self) -> Option<TokenRecord> {
        Some(TokenRecord {
            access_token: self.access_token()?,
            refresh_token: self.refresh_token(),
            expires_at_millis: self.expires_at()?,
        })
    }

    /// Persist a freshly issued record.
    ///
    /// A record without a refresh token leaves the stored one in place; eBay
    /// refresh responses never carry a new one.
    pub fn write(&self, record: &TokenRecord) -> Result<()> {
        self.properties.set(keys::ACCESS_TOKEN, &record.access_token)?;
        if let Some(refresh) = &record.refresh_token {
            self.properties.set(keys::REFRESH_TOKEN, refresh)?;
        }
        self.properties
            .set(keys::TOKEN_EXPIRES_AT, &record.expires_at_millis.to_string())?;
        debug!(
            expires_at = record.expires_at_millis,
            refresh_rotated = record.refresh_token.is_some(),
            "stored tokens"
        );
        Ok(())
    }

    /// Remove access token, refresh token, expiry, and authorization code.
    pub fn clear(&self) -> Result<()> {
        for key in keys::AUTH_DATA {
            self.properties.delete(key)?;
        }
        info!("cleared stored auth data");
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(now_millis())
    }

    /// Checks only the access token and expiry properties; the refresh token
    /// plays no part in validity.
    pub fn is_valid_at(&self, now_millis: u64) -> bool {
        match (self.access_token(), self.expires_at()) {
            (Some(_), Some(expires_at)) => is_live(expires_at, now_millis),
            _ => false,
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.non_empty(keys::ACCESS_TOKEN)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.non_empty(keys::REFRESH_TOKEN)
    }

    /// Stored expiry; an unparseable value counts as absent.
    pub fn expires_at(&self) -> Option<u64> {
        self.non_empty(keys::TOKEN_EXPIRES_AT)?.trim().parse().ok()
    }

    pub fn auth_code(&self) -> Option<String> {
        self.non_empty(keys::AUTH_CODE)
    }

    pub fn store_auth_code(&self, code: &str) -> Result<()> {
        self.properties.set(keys::AUTH_CODE, code)
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.properties.get(key).filter(|v| !v.is_empty())
    }
}
