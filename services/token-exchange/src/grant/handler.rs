//! Token exchange grant handler.
//!
//! Validates the subject token, extracts `client_id`, `scope` and `exp`
//! claims, and describes the token to issue. The handler is stateless apart
//! from its injected validator and may be shared across concurrent requests.

use super::outcome::{ExchangeGrant, ExchangeOutcome, ExchangeStage};
use super::request::GrantRequest;
use super::{FIELD_ISSUED_TOKEN_TYPE, FIELD_REFERENCE_TOKEN_EXPIRES_IN, GRANT_TYPE_TOKEN_EXCHANGE};
use crate::config::ExchangeConfig;
use crate::error::ExchangeError;
use crate::scope::{dedup_scopes, ParsedScopes};
use crate::validation::claims::{CLAIM_CLIENT_ID, CLAIM_EXPIRATION, CLAIM_SCOPE};
use crate::validation::{AmbiguousClaim, TokenValidationResult, TokenValidator};
use futures::FutureExt;
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Handles `urn:ietf:params:oauth:grant-type:token-exchange` requests.
pub struct TokenExchangeHandler {
    validator: Arc<dyn TokenValidator>,
    config: ExchangeConfig,
}

impl TokenExchangeHandler {
    /// Create a handler around a subject token validator
    pub fn new(validator: Arc<dyn TokenValidator>, config: ExchangeConfig) -> Self {
        Self { validator, config }
    }

    /// Grant type this handler serves
    pub const fn grant_type(&self) -> &'static str {
        GRANT_TYPE_TOKEN_EXCHANGE
    }

    /// Run the exchange without touching the request.
    ///
    /// Never panics and never returns early without an outcome: every
    /// failure, including validator faults, becomes
    /// [`ExchangeOutcome::Failure`].
    #[instrument(skip_all, fields(client_id = %request.client_id))]
    pub async fn handle(&self, request: &GrantRequest) -> ExchangeOutcome {
        info!(grant_type = GRANT_TYPE_TOKEN_EXCHANGE, "Client using token exchange grant");

        let mut stage = ExchangeStage::Start;
        match self.exchange(request, &mut stage).await {
            Ok(grant) => {
                debug!(
                    effective_client_id = %grant.effective_client_id,
                    scopes = grant.effective_scopes.len(),
                    "Token exchange accepted"
                );
                ExchangeOutcome::Success(grant)
            }
            Err(err) => {
                if let ExchangeError::InternalFault(ref message) = err {
                    error!(%stage, error = %message, "Token exchange fault");
                } else {
                    warn!(%stage, kind = err.kind(), "Token exchange rejected");
                }
                err.into()
            }
        }
    }

    /// Run the exchange and apply a successful outcome to `request`.
    pub async fn handle_and_apply(&self, request: &mut GrantRequest) -> ExchangeOutcome {
        let outcome = self.handle(request).await;
        outcome.apply_to(request);
        outcome
    }

    async fn exchange(
        &self,
        request: &GrantRequest,
        stage: &mut ExchangeStage,
    ) -> Result<ExchangeGrant, ExchangeError> {
        let subject_token = request
            .subject_token()
            .ok_or(ExchangeError::MissingSubjectToken)?;
        self.admit_subject_token_type(request.subject_token_type())?;
        *stage = ExchangeStage::ParamsRead;

        let validated = self.validate_subject_token(subject_token).await?;
        *stage = ExchangeStage::SubjectValidated;

        let client_id = validated
            .single_claim(CLAIM_CLIENT_ID)
            .map_err(malformed)?
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ExchangeError::MalformedClaims {
                claims: vec![CLAIM_CLIENT_ID.to_string()],
            })?
            .to_string();

        // A scope claim may itself be space-delimited
        let requested_scopes = dedup_scopes(
            validated
                .claim_values(CLAIM_SCOPE)
                .flat_map(str::split_whitespace),
        );
        let effective_scopes = ParsedScopes::from_values(&requested_scopes);

        let expiration = validated.single_claim(CLAIM_EXPIRATION).map_err(malformed)?;
        *stage = ExchangeStage::ClaimsExtracted;

        let mut custom_response_fields = Map::new();
        custom_response_fields.insert(
            FIELD_ISSUED_TOKEN_TYPE.to_string(),
            Value::String(self.config.issued_token_type.clone()),
        );
        if let Some(expiration) = expiration {
            custom_response_fields.insert(
                FIELD_REFERENCE_TOKEN_EXPIRES_IN.to_string(),
                expiration_value(expiration),
            );
        }
        *stage = ExchangeStage::ResponseBuilt;

        Ok(ExchangeGrant {
            custom_response_fields,
            effective_client_id: client_id,
            effective_scopes,
            requested_scopes,
        })
    }

    /// Only access tokens (or whatever is configured) may be exchanged.
    fn admit_subject_token_type(&self, token_type: Option<&str>) -> Result<(), ExchangeError> {
        match token_type {
            Some(token_type) if self.config.accepts_subject_token_type(token_type) => Ok(()),
            Some(token_type) => Err(ExchangeError::UnsupportedSubjectTokenType {
                token_type: token_type.to_string(),
            }),
            None if self.config.require_subject_token_type => {
                Err(ExchangeError::UnsupportedSubjectTokenType {
                    token_type: String::new(),
                })
            }
            None => Ok(()),
        }
    }

    async fn validate_subject_token(
        &self,
        subject_token: &str,
    ) -> Result<TokenValidationResult, ExchangeError> {
        let validation = AssertUnwindSafe(self.validator.validate_access_token(subject_token))
            .catch_unwind()
            .await;

        match validation {
            Ok(Ok(Some(result))) if !result.is_error => Ok(result),
            Ok(Ok(Some(result))) => {
                debug!(error = ?result.error, "Subject token rejected by validator");
                Err(ExchangeError::SubjectTokenInvalid)
            }
            Ok(Ok(None)) => Err(ExchangeError::SubjectTokenInvalid),
            Ok(Err(err)) => Err(ExchangeError::InternalFault(err.to_string())),
            Err(panic) => Err(ExchangeError::InternalFault(panic_message(panic.as_ref()))),
        }
    }
}

fn malformed(err: AmbiguousClaim) -> ExchangeError {
    ExchangeError::MalformedClaims {
        claims: vec![err.claim_type],
    }
}

/// Integer expirations stay numeric in the response.
fn expiration_value(raw: &str) -> Value {
    raw.trim()
        .parse::<i64>()
        .map_or_else(|_| Value::String(raw.to_string()), Value::from)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "subject token validator panicked".to_string())
}
