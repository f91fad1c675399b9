//! The token exchange grant (RFC 8693).

pub mod handler;
pub mod outcome;
pub mod request;

pub use handler::TokenExchangeHandler;
pub use outcome::{ExchangeFailure, ExchangeGrant, ExchangeOutcome, ExchangeStage};
pub use request::{GrantRequest, ValidatedResources};

/// Token exchange grant type.
pub const GRANT_TYPE_TOKEN_EXCHANGE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";

/// Form parameter names.
pub const PARAM_GRANT_TYPE: &str = "grant_type";
/// Subject token parameter.
pub const PARAM_SUBJECT_TOKEN: &str = "subject_token";
/// Subject token type parameter.
pub const PARAM_SUBJECT_TOKEN_TYPE: &str = "subject_token_type";
/// Client identifier parameter.
pub const PARAM_CLIENT_ID: &str = "client_id";
/// Requested scope parameter.
pub const PARAM_SCOPE: &str = "scope";

/// Token type identifiers.
pub const TOKEN_TYPE_ACCESS_TOKEN: &str = "urn:ietf:params:oauth:token-type:access_token";
/// Self-contained JWT.
pub const TOKEN_TYPE_JWT: &str = "urn:ietf:params:oauth:token-type:jwt";

/// Custom response field naming the format of the issued token.
pub const FIELD_ISSUED_TOKEN_TYPE: &str = "issued_token_type";
/// Custom response field carrying the subject token's expiration.
pub const FIELD_REFERENCE_TOKEN_EXPIRES_IN: &str = "reference_token_expires_in";
