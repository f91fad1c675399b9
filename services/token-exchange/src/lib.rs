//! Token Exchange Service library.
//!
//! Implements the RFC 8693 token exchange grant: subject token validation,
//! claim extraction, scope re-parsing, and issuance of a self-contained JWT
//! attributed to the subject token's original client.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod endpoint;
pub mod error;
pub mod grant;
pub mod issuer;
pub mod observability;
pub mod scope;
pub mod validation;

// Re-exports for convenience
pub use config::Config;
pub use endpoint::{process_token_request, TokenEndpointResponse};
pub use error::{ErrorCode, ExchangeError, TokenErrorResponse};
pub use grant::{ExchangeGrant, ExchangeOutcome, GrantRequest, TokenExchangeHandler};
pub use issuer::{JwtTokenIssuer, TokenIssuer, TokenResponse};
pub use scope::{ParsedScope, ParsedScopes};
pub use validation::{Claim, TokenValidationResult, TokenValidator, ValidatorError};
