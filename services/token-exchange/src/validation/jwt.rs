//! Validator for self-contained (JWT) subject tokens.

use super::claims::{Claim, CLAIM_SCOPE, TokenValidationResult};
use super::{TokenValidator, ValidatorError};
use crate::config::SubjectTokenConfig;
use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use tracing::debug;

/// Verifies HS256-signed subject tokens and flattens their claims.
pub struct JwtTokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenValidator {
    /// Build a validator from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::Configuration`] when no secret is configured.
    pub fn new(config: &SubjectTokenConfig) -> Result<Self, ValidatorError> {
        if config.secret.is_empty() {
            return Err(ValidatorError::Configuration(
                "subject token secret is empty".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway.as_secs();
        validation.set_required_spec_claims(&["exp"]);
        if let Some(ref issuer) = config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match config.audience {
            Some(ref audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key: DecodingKey::from_secret(&config.secret),
            validation,
        })
    }
}

#[async_trait]
impl TokenValidator for JwtTokenValidator {
    async fn validate_access_token(
        &self,
        token: &str,
    ) -> Result<Option<TokenValidationResult>, ValidatorError> {
        match decode::<Map<String, Value>>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(Some(TokenValidationResult::success(flatten_claims(
                &data.claims,
            )))),
            Err(err) => rejection(err.kind()).map(Some),
        }
    }
}

/// Map a decoding failure either to a rejected token or to a validator fault.
fn rejection(kind: &ErrorKind) -> Result<TokenValidationResult, ValidatorError> {
    let description = match kind {
        ErrorKind::ExpiredSignature => "token expired",
        ErrorKind::ImmatureSignature => "token not yet valid",
        ErrorKind::InvalidSignature => "signature invalid",
        ErrorKind::InvalidIssuer => "issuer mismatch",
        ErrorKind::InvalidAudience => "audience mismatch",
        ErrorKind::InvalidSubject => "subject mismatch",
        ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => "algorithm not allowed",
        ErrorKind::MissingRequiredClaim(_) => "required claim missing",
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => "token malformed",
        _ => {
            return Err(ValidatorError::Configuration(format!(
                "jwt verification failed: {kind:?}"
            )));
        }
    };
    debug!(reason = description, "Subject token rejected");
    Ok(TokenValidationResult::error("invalid_token", description))
}

/// Flatten a JSON claim set into typed claim pairs.
///
/// Arrays become one claim per element and a space-delimited `scope` string
/// becomes one claim per scope. Nulls are dropped.
pub fn flatten_claims(claims: &Map<String, Value>) -> Vec<Claim> {
    let mut flattened = Vec::new();
    for (claim_type, value) in claims {
        match value {
            Value::Array(items) => {
                for item in items {
                    push_value(&mut flattened, claim_type, item);
                }
            }
            Value::String(scopes) if claim_type == CLAIM_SCOPE => {
                flattened.extend(
                    scopes
                        .split_whitespace()
                        .map(|scope| Claim::new(claim_type.as_str(), scope)),
                );
            }
            other => push_value(&mut flattened, claim_type, other),
        }
    }
    flattened
}

fn push_value(claims: &mut Vec<Claim>, claim_type: &str, value: &Value) {
    let value = match value {
        Value::Null => return,
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => value.to_string(),
    };
    claims.push(Claim::new(claim_type, value));
}
