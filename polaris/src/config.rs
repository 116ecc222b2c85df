//! Provider configuration resolution
//!
//! Values set in the provider block win; anything unset or empty falls back to
//! the environment.

use secrecy::SecretString;
use thiserror::Error;
use tfplug::types::{AttributePath, DynamicValue};
use url::Url;

use crate::api::{ApiError, Client};

pub const BASE_URL_ENV: &str = "POLARIS_BASE_URL";
pub const API_KEY_ENV: &str = "POLARIS_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{attribute} is required (set in provider config or {env} env var)")]
    Missing {
        attribute: &'static str,
        env: &'static str,
    },

    #[error("{attribute} must be a string")]
    NotAString { attribute: &'static str },

    #[error("Invalid base_url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ConfigError {
    pub fn attribute(&self) -> &'static str {
        match self {
            ConfigError::Missing { attribute, .. } | ConfigError::NotAString { attribute } => {
                attribute
            }
            ConfigError::InvalidBaseUrl { .. } => "base_url",
        }
    }
}

/// Resolved, immutable provider settings
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: SecretString,
}

impl ProviderConfig {
    pub fn from_config(config: &DynamicValue) -> Result<Self, ConfigError> {
        let base_url = resolve(config, "base_url", BASE_URL_ENV)?;
        let api_key = resolve(config, "api_key", API_KEY_ENV)?;

        Ok(Self {
            base_url: normalize_base_url(&base_url)?,
            api_key: SecretString::from(api_key),
        })
    }

    pub fn client(&self) -> Result<Client, ApiError> {
        Client::new(&self.base_url, self.api_key.clone())
    }
}

fn resolve(
    config: &DynamicValue,
    attribute: &'static str,
    env: &'static str,
) -> Result<String, ConfigError> {
    let configured = config
        .get_optional_string(&AttributePath::new(attribute))
        .map_err(|_| ConfigError::NotAString { attribute })?
        .filter(|v| !v.is_empty());

    if let Some(value) = configured {
        return Ok(value);
    }

    match std::env::var(env) {
        Ok(value) if !value.is_empty() => {
            tracing::debug!("Using {} from {}", attribute, env);
            Ok(value)
        }
        _ => Err(ConfigError::Missing { attribute, env }),
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let parsed = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {:?}", other))),
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use tfplug::types::Dynamic;

    fn config_with(pairs: &[(&str, &str)]) -> DynamicValue {
        let mut config = DynamicValue::object();
        for (key, value) in pairs {
            config
                .set_string(&AttributePath::new(key), *value)
                .unwrap();
        }
        config
    }

    fn clear_env() {
        std::env::remove_var(BASE_URL_ENV);
        std::env::remove_var(API_KEY_ENV);
    }

    #[test]
    #[serial]
    fn explicit_values_win_over_env() {
        std::env::set_var(BASE_URL_ENV, "https://env.example.com");
        std::env::set_var(API_KEY_ENV, "env-key");

        let config = ProviderConfig::from_config(&config_with(&[
            ("base_url", "https://api.example.com/"),
            ("api_key", "cfg-key"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.api_key.expose_secret(), "cfg-key");
        clear_env();
    }

    #[test]
    #[serial]
    fn falls_back_to_env_when_unset_or_empty() {
        std::env::set_var(BASE_URL_ENV, "https://env.example.com");
        std::env::set_var(API_KEY_ENV, "env-key");

        let config =
            ProviderConfig::from_config(&config_with(&[("base_url", "")])).unwrap();

        assert_eq!(config.base_url, "https://env.example.com");
        assert_eq!(config.api_key.expose_secret(), "env-key");
        clear_env();
    }

    #[test]
    #[serial]
    fn missing_api_key_names_env_var() {
        clear_env();

        let err = ProviderConfig::from_config(&config_with(&[(
            "base_url",
            "https://api.example.com",
        )]))
        .unwrap_err();

        assert_eq!(err.attribute(), "api_key");
        assert_eq!(
            err.to_string(),
            "api_key is required (set in provider config or POLARIS_API_KEY env var)"
        );
    }

    #[test]
    #[serial]
    fn null_config_uses_env() {
        std::env::set_var(BASE_URL_ENV, "http://localhost:8080");
        std::env::set_var(API_KEY_ENV, "k");

        let config = ProviderConfig::from_config(&DynamicValue::null()).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        clear_env();
    }

    #[test]
    #[serial]
    fn rejects_non_http_urls() {
        clear_env();

        for url in ["ftp://api.example.com", "not a url", "api.example.com"] {
            let err = ProviderConfig::from_config(&config_with(&[
                ("base_url", url),
                ("api_key", "k"),
            ]))
            .unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidBaseUrl { .. }),
                "{url} should be rejected, got {err}"
            );
        }
    }

    #[test]
    #[serial]
    fn rejects_non_string_values() {
        clear_env();

        let mut config = config_with(&[("base_url", "https://api.example.com")]);
        config
            .set_value(&AttributePath::new("api_key"), Dynamic::Number(42.0))
            .unwrap();

        let err = ProviderConfig::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::NotAString { attribute: "api_key" }));
    }

    #[test]
    fn debug_hides_api_key() {
        let config = ProviderConfig {
            base_url: "https://api.example.com".to_string(),
            api_key: SecretString::from("super-secret".to_string()),
        };
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
