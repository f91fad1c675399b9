//! Centralized configuration for the Token Exchange Service.
//!
//! All configuration is loaded from environment variables and validated
//! at startup.

use crate::grant::{TOKEN_TYPE_ACCESS_TOKEN, TOKEN_TYPE_JWT};
use crate::observability::TracingConfig;
use base64::Engine;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },

    /// Invalid TTL value
    #[error("Invalid TTL: must be greater than 0")]
    InvalidTtl,

    /// Signing or verification secret too short
    #[error("{name} must be at least {min} bytes, got {actual}")]
    WeakSecret {
        /// Variable name
        name: String,
        /// Minimum length in bytes
        min: usize,
        /// Supplied length in bytes
        actual: usize,
    },
}

/// Minimum HMAC secret length (HS256 key size)
pub const MIN_SECRET_BYTES: usize = 32;

/// Admission and response settings of the exchange grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Value of `issued_token_type` in successful responses
    pub issued_token_type: String,
    /// `subject_token_type` values accepted when supplied
    pub accepted_subject_token_types: Vec<String>,
    /// Reject requests without `subject_token_type`
    pub require_subject_token_type: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            issued_token_type: TOKEN_TYPE_JWT.to_string(),
            accepted_subject_token_types: vec![TOKEN_TYPE_ACCESS_TOKEN.to_string()],
            require_subject_token_type: false,
        }
    }
}

impl ExchangeConfig {
    /// Check whether a supplied subject token type is acceptable
    pub fn accepts_subject_token_type(&self, token_type: &str) -> bool {
        self.accepted_subject_token_types
            .iter()
            .any(|accepted| accepted == token_type)
    }
}

/// How incoming self-contained subject tokens are verified.
#[derive(Debug, Clone)]
pub struct SubjectTokenConfig {
    /// Expected `iss`, if enforced
    pub issuer: Option<String>,
    /// Expected `aud`, if enforced
    pub audience: Option<String>,
    /// HS256 verification secret
    pub secret: Vec<u8>,
    /// Clock skew tolerance
    pub leeway: Duration,
}

/// How exchanged tokens are minted.
#[derive(Debug, Clone)]
pub struct IssuanceConfig {
    /// `iss` of issued tokens
    pub issuer: String,
    /// `aud` of issued tokens
    pub audience: Option<String>,
    /// HS256 signing secret
    pub signing_secret: Vec<u8>,
    /// Lifetime of issued tokens
    pub access_token_ttl: Duration,
}

/// Token Exchange Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Logging setup
    pub tracing: TracingConfig,
    /// Grant behaviour
    pub exchange: ExchangeConfig,
    /// Subject token verification
    pub subject_token: SubjectTokenConfig,
    /// Token issuance
    pub issuance: IssuanceConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut tracing = TracingConfig::default()
            .with_service_name(
                env::var("SERVICE_NAME").unwrap_or_else(|_| "token-exchange-service".to_string()),
            )
            .with_log_level(env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));
        if parse_env("LOG_JSON", false)? {
            tracing = tracing.with_json_output();
        }

        let defaults = ExchangeConfig::default();
        let accepted = parse_list_env("ACCEPTED_SUBJECT_TOKEN_TYPES");
        let exchange = ExchangeConfig {
            issued_token_type: env::var("ISSUED_TOKEN_TYPE")
                .unwrap_or(defaults.issued_token_type),
            accepted_subject_token_types: if accepted.is_empty() {
                defaults.accepted_subject_token_types
            } else {
                accepted
            },
            require_subject_token_type: parse_env("REQUIRE_SUBJECT_TOKEN_TYPE", false)?,
        };

        let subject_token = SubjectTokenConfig {
            issuer: env::var("SUBJECT_TOKEN_ISSUER").ok(),
            audience: env::var("SUBJECT_TOKEN_AUDIENCE").ok(),
            secret: parse_secret_env("SUBJECT_TOKEN_SECRET")?,
            leeway: Duration::from_secs(parse_env("LEEWAY", 60)?),
        };

        let issuance = IssuanceConfig {
            issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "auth-platform".to_string()),
            audience: env::var("JWT_AUDIENCE").ok(),
            signing_secret: parse_secret_env("JWT_SIGNING_SECRET")?,
            access_token_ttl: Duration::from_secs(parse_env("ACCESS_TOKEN_TTL", 900)?),
        };

        let config = Self {
            tracing,
            exchange,
            subject_token,
            issuance,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.issuance.access_token_ttl.is_zero() {
            return Err(ConfigError::InvalidTtl);
        }
        if self.exchange.issued_token_type.trim().is_empty() {
            return Err(ConfigError::MissingRequired("ISSUED_TOKEN_TYPE".to_string()));
        }
        if self.exchange.accepted_subject_token_types.is_empty() {
            return Err(ConfigError::MissingRequired(
                "ACCEPTED_SUBJECT_TOKEN_TYPES".to_string(),
            ));
        }
        check_secret("SUBJECT_TOKEN_SECRET", &self.subject_token.secret)?;
        check_secret("JWT_SIGNING_SECRET", &self.issuance.signing_secret)?;
        Ok(())
    }
}

fn check_secret(name: &str, secret: &[u8]) -> Result<(), ConfigError> {
    if secret.len() < MIN_SECRET_BYTES {
        return Err(ConfigError::WeakSecret {
            name: name.to_string(),
            min: MIN_SECRET_BYTES,
            actual: secret.len(),
        });
    }
    Ok(())
}

/// Parse environment variable with default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Parse a comma-separated list environment variable.
fn parse_list_env(name: &str) -> Vec<String> {
    env::var(name)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a required base64-encoded secret.
fn parse_secret_env(name: &str) -> Result<Vec<u8>, ConfigError> {
    let encoded = env::var(name).map_err(|_| ConfigError::MissingRequired(name.to_string()))?;
    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        })
}
