use std::fmt;

use subtle::ConstantTimeEq;

/// The only accepted authorization scheme. Matching is case-sensitive.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Shared secret guarding the machine API.
#[derive(Clone)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn is_configured(&self) -> bool {
        !self.0.trim().is_empty()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against the configured secret. An
    /// unconfigured token matches nothing.
    pub fn matches(&self, candidate: &str) -> bool {
        if !self.is_configured() {
            return false;
        }
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }

    /// Checks a raw `Authorization` header value.
    pub fn verify_authorization(&self, header: Option<&str>) -> bool {
        match header.and_then(|value| value.strip_prefix(BEARER_PREFIX)) {
            Some(candidate) => self.matches(candidate),
            None => false,
        }
    }

    pub fn authorization_value(&self) -> String {
        format!("{BEARER_PREFIX}{}", self.0)
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exact_bearer_credential() {
        let token = ApiToken::new("s3cret");
        assert!(token.verify_authorization(Some("Bearer s3cret")));
    }

    #[test]
    fn rejects_wrong_scheme_or_secret() {
        let token = ApiToken::new("s3cret");
        assert!(!token.verify_authorization(None));
        assert!(!token.verify_authorization(Some("bearer s3cret")));
        assert!(!token.verify_authorization(Some("Basic s3cret")));
        assert!(!token.verify_authorization(Some("Bearer s3cret ")));
        assert!(!token.verify_authorization(Some("Bearer s3cre")));
        assert!(!token.verify_authorization(Some("s3cret")));
    }

    #[test]
    fn unconfigured_token_matches_nothing() {
        let token = ApiToken::new("");
        assert!(!token.verify_authorization(Some("Bearer ")));
        assert!(!token.matches(""));
    }

    #[test]
    fn debug_output_is_redacted() {
        let token = ApiToken::new("s3cret");
        assert_eq!(format!("{token:?}"), "ApiToken(***)");
    }
}
