//! Subject token validation.
//!
//! The handler treats validation as a black box behind [`TokenValidator`].
//! Two implementations ship with the crate: [`JwtTokenValidator`] for
//! self-contained tokens and [`ReferenceTokenStore`] for opaque handles.

pub mod claims;
pub mod jwt;
pub mod reference;

pub use claims::{AmbiguousClaim, Claim, TokenValidationResult};
pub use jwt::JwtTokenValidator;
pub use reference::ReferenceTokenStore;

use async_trait::async_trait;
use thiserror::Error;

/// Faults raised while validating, as opposed to a token that is simply
/// invalid (which is reported through [`TokenValidationResult::is_error`]).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ValidatorError {
    /// The validator could not be used as configured
    #[error("Validator misconfigured: {0}")]
    Configuration(String),

    /// Backing store or key source is unavailable
    #[error("Validator unavailable: {0}")]
    Unavailable(String),

    /// Validation was cancelled before it completed
    #[error("Validation cancelled")]
    Cancelled,

    /// Any other fault
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Validates access tokens presented as subject tokens.
///
/// Implementations must be safe for concurrent use; one instance is shared by
/// every in-flight exchange.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Validate `token` and return its claims.
    ///
    /// `Ok(None)` means the token is unknown. A token that is known but
    /// unacceptable yields `Ok(Some(result))` with `is_error` set.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError`] when validation itself could not run.
    async fn validate_access_token(
        &self,
        token: &str,
    ) -> Result<Option<TokenValidationResult>, ValidatorError>;
}
