//! Issuance of the exchanged token.
//!
//! The exchange itself only decides *what* to issue; this module turns an
//! [`ExchangeGrant`] into a signed JWT and the token endpoint response.

use crate::config::IssuanceConfig;
use crate::grant::ExchangeGrant;
use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Issuance errors.
#[derive(Error, Debug)]
pub enum IssuerError {
    /// The issuer could not be used as configured
    #[error("Issuer misconfigured: {0}")]
    Configuration(String),

    /// JWT encoding failed
    #[error("JWT encoding error: {0}")]
    JwtEncoding(#[from] jsonwebtoken::errors::Error),
}

/// Claims of an exchanged access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedClaims {
    /// Issuer
    pub iss: String,
    /// Audience
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Client the token is attributed to
    pub client_id: String,
    /// Granted scopes
    pub scope: Vec<String>,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
    /// Unique token id
    pub jti: String,
}

/// Successful token endpoint response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenResponse {
    /// The issued token
    pub access_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: u64,
    /// Space-delimited granted scopes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// `issued_token_type`, `reference_token_expires_in`, ...
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

/// Mints tokens for accepted exchanges.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Issue a token for `grant`.
    ///
    /// # Errors
    ///
    /// Returns [`IssuerError`] when the token cannot be produced.
    async fn issue(&self, grant: &ExchangeGrant) -> Result<TokenResponse, IssuerError>;
}

/// HS256 JWT issuer.
pub struct JwtTokenIssuer {
    issuer: String,
    audience: Option<String>,
    ttl_seconds: u64,
    encoding_key: EncodingKey,
}

impl JwtTokenIssuer {
    /// Build an issuer from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IssuerError::Configuration`] for an empty secret or zero TTL.
    pub fn new(config: &IssuanceConfig) -> Result<Self, IssuerError> {
        if config.signing_secret.is_empty() {
            return Err(IssuerError::Configuration("signing secret is empty".to_string()));
        }
        let ttl_seconds = config.access_token_ttl.as_secs();
        if ttl_seconds == 0 {
            return Err(IssuerError::Configuration("access token TTL is zero".to_string()));
        }

        Ok(Self {
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl_seconds,
            encoding_key: EncodingKey::from_secret(&config.signing_secret),
        })
    }

    fn claims_for(&self, grant: &ExchangeGrant) -> IssuedClaims {
        let now = chrono::Utc::now().timestamp();
        IssuedClaims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            client_id: grant.effective_client_id.clone(),
            scope: grant.effective_scopes.raw_values(),
            iat: now,
            exp: now.saturating_add_unsigned(self.ttl_seconds),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }
}

#[async_trait]
impl TokenIssuer for JwtTokenIssuer {
    async fn issue(&self, grant: &ExchangeGrant) -> Result<TokenResponse, IssuerError> {
        let claims = self.claims_for(grant);
        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.ttl_seconds,
            scope: (!grant.effective_scopes.is_empty())
                .then(|| grant.effective_scopes.to_scope_string()),
            custom: grant.custom_response_fields.clone(),
        })
    }
}
