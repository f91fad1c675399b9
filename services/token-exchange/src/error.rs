//! Error handling for the token exchange grant.
//!
//! Every internal failure kind is kept distinct for logging, but the
//! OAuth-facing error code is deliberately coarse: a caller cannot tell a
//! missing subject token from a rejected one or from a server fault.

use serde::Serialize;
use thiserror::Error;

/// Sensitive patterns that should be sanitized from error descriptions
const SENSITIVE_PATTERNS: &[&str] = &[
    "password",
    "secret",
    "key",
    "credential",
    "bearer",
    "authorization",
    "private",
    "eyj",
];

/// Reasons a token exchange request is rejected.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// No usable `subject_token` was supplied
    #[error("Subject token missing from request")]
    MissingSubjectToken,

    /// `subject_token_type` is not one this grant accepts
    #[error("Unsupported subject token type: {token_type}")]
    UnsupportedSubjectTokenType {
        /// The type identifier that was supplied (empty when absent)
        token_type: String,
    },

    /// The validator rejected the subject token or returned no result
    #[error("Subject token invalid")]
    SubjectTokenInvalid,

    /// Required claims are missing or ambiguous in a valid token
    #[error("Required claims invalid: {claims:?}")]
    MalformedClaims {
        /// Claim types that were missing or repeated
        claims: Vec<String>,
    },

    /// `grant_type` is not the token exchange grant
    #[error("Unsupported grant type: {grant_type}")]
    UnsupportedGrantType {
        /// The grant type that was supplied
        grant_type: String,
    },

    /// A protocol parameter was included more than once
    #[error("Parameter repeated: {name}")]
    DuplicateParameter {
        /// Name of the repeated parameter
        name: String,
    },

    /// Unexpected fault while processing (details only in server logs)
    #[error("Internal fault: {0}")]
    InternalFault(String),
}

impl ExchangeError {
    /// Get the OAuth error code reported to the caller
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedGrantType { .. } => ErrorCode::UnsupportedGrantType,
            Self::MissingSubjectToken
            | Self::UnsupportedSubjectTokenType { .. }
            | Self::SubjectTokenInvalid
            | Self::MalformedClaims { .. }
            | Self::DuplicateParameter { .. }
            | Self::InternalFault(_) => ErrorCode::InvalidRequest,
        }
    }

    /// Short label used as a structured log field
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingSubjectToken => "missing_subject_token",
            Self::UnsupportedSubjectTokenType { .. } => "unsupported_subject_token_type",
            Self::SubjectTokenInvalid => "subject_token_invalid",
            Self::MalformedClaims { .. } => "malformed_claims",
            Self::UnsupportedGrantType { .. } => "unsupported_grant_type",
            Self::DuplicateParameter { .. } => "duplicate_parameter",
            Self::InternalFault(_) => "internal_fault",
        }
    }

    /// Description attached to a failure outcome.
    ///
    /// Only internal faults carry one; every other kind stays silent so the
    /// response cannot be used as an oracle.
    pub fn description(&self) -> Option<String> {
        match self {
            Self::InternalFault(message) => Some(message.clone()),
            _ => None,
        }
    }
}

/// OAuth 2.0 error codes (RFC 6749 section 5.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed or unacceptable request
    InvalidRequest,
    /// Grant type not supported by this endpoint
    UnsupportedGrantType,
    /// Token issuance failed after a successful exchange
    ServerError,
}

impl ErrorCode {
    /// Get the string representation of the error code
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::ServerError => "server_error",
        }
    }

    /// HTTP status the token endpoint answers with
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest | Self::UnsupportedGrantType => 400,
            Self::ServerError => 500,
        }
    }
}

/// Standard OAuth error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenErrorResponse {
    #[serde(skip)]
    code: ErrorCode,
    /// OAuth error code
    pub error: String,
    /// Optional human-readable description (sanitized)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl TokenErrorResponse {
    /// Build an error body from a code and an optional raw description
    pub fn new(code: ErrorCode, description: Option<&str>) -> Self {
        Self {
            code,
            error: code.as_str().to_string(),
            error_description: description.map(sanitize_message),
        }
    }

    /// OAuth error code of this body
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// HTTP status the token endpoint answers with
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Build an error body for a rejected exchange
    pub fn from_error(error: &ExchangeError) -> Self {
        Self::new(error.code(), error.description().as_deref())
    }
}

/// Sanitize a message by removing sensitive information
fn sanitize_message(message: &str) -> String {
    if contains_sensitive_info(message) {
        return "Token exchange failed".to_string();
    }
    message.to_string()
}

/// Check if a string contains sensitive information
pub fn contains_sensitive_info(text: &str) -> bool {
    let lower = text.to_lowercase();
    SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exchange_kinds_collapse_to_invalid_request() {
        let errors = [
            ExchangeError::MissingSubjectToken,
            ExchangeError::UnsupportedSubjectTokenType {
                token_type: "urn:ietf:params:oauth:token-type:saml2".to_string(),
            },
            ExchangeError::SubjectTokenInvalid,
            ExchangeError::MalformedClaims {
                claims: vec!["client_id".to_string()],
            },
            ExchangeError::InternalFault("boom".to_string()),
        ];

        for error in errors {
            assert_eq!(error.code(), ErrorCode::InvalidRequest, "{error:?}");
        }
    }

    #[test]
    fn test_grant_type_error_code() {
        let error = ExchangeError::UnsupportedGrantType {
            grant_type: "password".to_string(),
        };
        assert_eq!(error.code().as_str(), "unsupported_grant_type");
    }

    #[test]
    fn test_only_internal_fault_has_description() {
        assert_eq!(ExchangeError::MissingSubjectToken.description(), None);
        assert_eq!(ExchangeError::SubjectTokenInvalid.description(), None);
        assert_eq!(
            ExchangeError::InternalFault("decoder crashed".to_string()).description(),
            Some("decoder crashed".to_string())
        );
    }

    #[test]
    fn test_error_response_sanitizes_description() {
        let response = TokenErrorResponse::from_error(&ExchangeError::InternalFault(
            "invalid signing key".to_string(),
        ));
        assert_eq!(response.error, "invalid_request");
        assert_eq!(
            response.error_description.as_deref(),
            Some("Token exchange failed")
        );
    }

    #[test]
    fn test_error_response_serialization_skips_missing_description() {
        let response = TokenErrorResponse::from_error(&ExchangeError::SubjectTokenInvalid);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "invalid_request" }));
    }

    #[test]
    fn test_error_response_keeps_code_out_of_body() {
        let response = TokenErrorResponse::new(ErrorCode::ServerError, None);
        assert_eq!(response.code(), ErrorCode::ServerError);
        assert_eq!(response.http_status(), 500);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "server_error" }));
    }

    #[test]
    fn test_error_response_status_follows_code() {
        let grant_type = TokenErrorResponse::from_error(&ExchangeError::UnsupportedGrantType {
            grant_type: "password".to_string(),
        });
        let fault = TokenErrorResponse::from_error(&ExchangeError::InternalFault("boom".into()));

        assert_eq!(grant_type.code(), ErrorCode::UnsupportedGrantType);
        assert_eq!(grant_type.http_status(), 400);
        assert_eq!(fault.code(), ErrorCode::InvalidRequest);
        assert_eq!(fault.http_status(), 400);
    }

    #[test]
    fn test_contains_sensitive_info() {
        assert!(contains_sensitive_info("client SECRET mismatch"));
        assert!(contains_sensitive_info("eyJhbGciOiJIUzI1NiJ9"));
        assert!(!contains_sensitive_info("connection reset"));
    }
}
