use std::sync::Arc;

use labgear_client::{MachineClient, MachineClientConfig};
use labgear_store::ApiToken;

use crate::api::MachineApi;
use crate::error::ReconcileError;

pub const ENDPOINT_ENV: &str = "LAB_ENDPOINT";
pub const TOKEN_ENV: &str = "LAB_API_KEY";

/// Connection settings as declared by the caller. Explicit non-blank values
/// win over the environment; blank values count as unset.
#[derive(Clone, Debug, Default)]
pub struct ProviderConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<ApiToken>,
    pub timeout_ms: Option<u64>,
}

impl ProviderConfig {
    pub fn resolve(&self) -> Result<MachineClientConfig, ReconcileError> {
        self.resolve_with(|var| std::env::var(var).ok())
    }

    pub fn resolve_with<F>(&self, lookup: F) -> Result<MachineClientConfig, ReconcileError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = pick(self.endpoint.as_deref(), lookup(ENDPOINT_ENV)).ok_or_else(|| {
            ReconcileError::Config(format!("endpoint is required (set it or {ENDPOINT_ENV})"))
        })?;
        let token = pick(self.api_key.as_ref().map(ApiToken::expose), lookup(TOKEN_ENV))
            .ok_or_else(|| {
                ReconcileError::Config(format!("api key is required (set it or {TOKEN_ENV})"))
            })?;

        let mut config = MachineClientConfig {
            endpoint,
            token: ApiToken::new(token),
            ..MachineClientConfig::default()
        };
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        Ok(config)
    }

    /// Builds the shared client handed to every resource and inventory.
    pub fn connect(&self) -> Result<Arc<dyn MachineApi>, ReconcileError> {
        let client = MachineClient::new(self.resolve()?)?;
        Ok(Arc::new(client))
    }
}

fn pick(explicit: Option<&str>, env: Option<String>) -> Option<String> {
    explicit
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| {
            env.map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(endpoint: &'static str, key: &'static str) -> impl Fn(&str) -> Option<String> {
        move |var| match var {
            ENDPOINT_ENV => Some(endpoint.to_string()),
            TOKEN_ENV => Some(key.to_string()),
            _ => None,
        }
    }

    #[test]
    fn explicit_values_override_environment() {
        let config = ProviderConfig {
            endpoint: Some("http://explicit:8080".to_string()),
            api_key: Some(ApiToken::new("explicit-key")),
            timeout_ms: Some(500),
        };
        let resolved = config
            .resolve_with(env("http://env:8080", "env-key"))
            .expect("resolved");
        assert_eq!(resolved.endpoint, "http://explicit:8080");
        assert_eq!(resolved.token.expose(), "explicit-key");
        assert_eq!(resolved.timeout_ms, 500);
    }

    #[test]
    fn blank_explicit_values_fall_back_to_environment() {
        let config = ProviderConfig {
            endpoint: Some("  ".to_string()),
            api_key: Some(ApiToken::new("")),
            timeout_ms: None,
        };
        let resolved = config
            .resolve_with(env(" http://env:8080 ", "env-key"))
            .expect("resolved");
        assert_eq!(resolved.endpoint, "http://env:8080");
        assert_eq!(resolved.token.expose(), "env-key");
    }

    #[test]
    fn missing_values_are_errors() {
        let err = ProviderConfig::default()
            .resolve_with(|_| None)
            .expect_err("missing endpoint");
        assert!(err.to_string().contains(ENDPOINT_ENV));

        let config = ProviderConfig {
            endpoint: Some("http://lab:8080".to_string()),
            ..ProviderConfig::default()
        };
        let err = config.resolve_with(|_| None).expect_err("missing key");
        assert!(err.to_string().contains(TOKEN_ENV));
    }
}
