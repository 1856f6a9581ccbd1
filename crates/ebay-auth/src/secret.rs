//! The keyset's client secret

use std::fmt;

use zeroize::Zeroizing;

/// Client secret issued with an eBay application keyset.
///
/// Formats as `[REDACTED]` so a `ClientConfig` can go into `?config` log
/// fields. The buffer is wiped on drop.
#[derive(Clone)]
pub struct ClientSecret(Zeroizing<String>);

impl ClientSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// The raw secret, for the Basic authorization header only.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for ClientSecret {
    fn from(secret: String) -> Self {
        Self::new(secret)
    }
}

impl From<&str> for ClientSecret {
    fn from(secret: &str) -> Self {
        Self::new(secret)
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret([REDACTED])")
    }
}

impl fmt::Display for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_formats_the_secret() {
        let secret = ClientSecret::new("PRD-0123abcd-secret");
        assert_eq!(secret.to_string(), "[REDACTED]");
        assert_eq!(format!("{secret:?}"), "ClientSecret([REDACTED])");
        assert_eq!(format!("{:?}", Some(secret.clone())), "Some(ClientSecret([REDACTED]))");
    }

    #[test]
    fn expose_and_clone_keep_the_value() {
        let secret = ClientSecret::from(String::from("PRD-0123abcd-secret"));
        let copy = secret.clone();
        drop(secret);
        assert_eq!(copy.expose(), "PRD-0123abcd-secret");
        assert!(!copy.is_empty());
        assert!(ClientSecret::from("").is_empty());
    }
}
