//! Result of a token exchange.

use super::request::GrantRequest;
use crate::error::{ErrorCode, ExchangeError, TokenErrorResponse};
use crate::scope::ParsedScopes;
use serde_json::{Map, Value};
use std::fmt;

/// Parameters for issuing the exchanged token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeGrant {
    /// Extra fields merged into the token response
    pub custom_response_fields: Map<String, Value>,
    /// Client the new token is attributed to (the subject token's client)
    pub effective_client_id: String,
    /// Scopes of the new token, taken only from the subject token
    pub effective_scopes: ParsedScopes,
    /// Subject token scopes in claim order, without duplicates
    pub requested_scopes: Vec<String>,
}

/// Rejection of a token exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeFailure {
    /// Why the exchange failed
    pub error_kind: ExchangeError,
    /// Description for the caller, only set for internal faults
    pub error_description: Option<String>,
}

impl ExchangeFailure {
    /// OAuth error code of this failure
    pub const fn error_code(&self) -> ErrorCode {
        self.error_kind.code()
    }

    /// Error body returned by the token endpoint
    pub fn to_response(&self) -> TokenErrorResponse {
        TokenErrorResponse::new(self.error_code(), self.error_description.as_deref())
    }
}

impl From<ExchangeError> for ExchangeFailure {
    fn from(error_kind: ExchangeError) -> Self {
        Self {
            error_description: error_kind.description(),
            error_kind,
        }
    }
}

/// Exactly one of success or failure; consumed once by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// The subject token was accepted
    Success(ExchangeGrant),
    /// The exchange was rejected
    Failure(ExchangeFailure),
}

impl ExchangeOutcome {
    /// True for [`ExchangeOutcome::Success`]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Apply a successful outcome to the request.
    ///
    /// Overwrites the requested scopes, the parsed scopes and the client id
    /// together. A failure leaves the request untouched.
    pub fn apply_to(&self, request: &mut GrantRequest) {
        if let Self::Success(grant) = self {
            request.requested_scopes.clone_from(&grant.requested_scopes);
            request
                .validated_resources
                .parsed_scopes
                .clone_from(&grant.effective_scopes);
            request.client_id.clone_from(&grant.effective_client_id);
        }
    }
}

impl From<ExchangeError> for ExchangeOutcome {
    fn from(error: ExchangeError) -> Self {
        Self::Failure(error.into())
    }
}

/// Pipeline stages of an exchange, used to locate failures in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeStage {
    /// Nothing read yet
    Start,
    /// Subject token parameters read and admitted
    ParamsRead,
    /// Validator accepted the subject token
    SubjectValidated,
    /// Client id, scopes and expiration extracted
    ClaimsExtracted,
    /// Custom response fields assembled
    ResponseBuilt,
}

impl fmt::Display for ExchangeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::ParamsRead => "params_read",
            Self::SubjectValidated => "subject_validated",
            Self::ClaimsExtracted => "claims_extracted",
            Self::ResponseBuilt => "response_built",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn grant() -> ExchangeGrant {
        ExchangeGrant {
            custom_response_fields: Map::new(),
            effective_client_id: "abc".to_string(),
            effective_scopes: ParsedScopes::from_values(["s1", "s2"]),
            requested_scopes: vec!["s2".to_string(), "s1".to_string()],
        }
    }

    fn request() -> GrantRequest {
        let mut raw = HashMap::new();
        raw.insert("scope".to_string(), "admin".to_string());
        GrantRequest::new("gateway", raw)
    }

    #[test]
    fn test_success_applies_all_overrides() {
        let mut request = request();
        ExchangeOutcome::Success(grant()).apply_to(&mut request);

        assert_eq!(request.client_id, "abc");
        assert_eq!(request.requested_scopes, vec!["s2", "s1"]);
        assert_eq!(
            request.validated_resources.parsed_scopes,
            ParsedScopes::from_values(["s1", "s2"])
        );
    }

    #[test]
    fn test_failure_leaves_request_untouched() {
        let mut request = request();
        let before = request.clone();
        ExchangeOutcome::from(ExchangeError::SubjectTokenInvalid).apply_to(&mut request);
        assert_eq!(request, before);
    }

    #[test]
    fn test_rejections_carry_no_description() {
        let ExchangeOutcome::Failure(failure) = ExchangeOutcome::from(ExchangeError::MissingSubjectToken)
        else {
            panic!("a rejection must be a failure");
        };
        assert_eq!(failure.error_code(), ErrorCode::InvalidRequest);
        assert_eq!(failure.error_description, None);
    }

    #[test]
    fn test_failure_from_internal_fault_keeps_message() {
        let failure = ExchangeFailure::from(ExchangeError::InternalFault("boom".to_string()));
        assert_eq!(failure.error_description.as_deref(), Some("boom"));
        assert_eq!(failure.to_response().error, "invalid_request");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(ExchangeStage::SubjectValidated.to_string(), "subject_validated");
    }
}
