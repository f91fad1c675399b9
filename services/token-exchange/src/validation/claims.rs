//! Claims produced by subject token validation.

use thiserror::Error;

/// Claim type for the client identifier
pub const CLAIM_CLIENT_ID: &str = "client_id";
/// Claim type for a granted scope (one claim per scope)
pub const CLAIM_SCOPE: &str = "scope";
/// Claim type for the expiration timestamp
pub const CLAIM_EXPIRATION: &str = "exp";

/// A typed assertion bound to a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// Claim type, e.g. `scope`
    pub claim_type: String,
    /// Claim value
    pub value: String,
}

impl Claim {
    /// Create a claim
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// A claim type expected once appeared several times.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Claim '{claim_type}' appears {count} times")]
pub struct AmbiguousClaim {
    /// The repeated claim type
    pub claim_type: String,
    /// How many times it appeared
    pub count: usize,
}

/// Outcome of validating a token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenValidationResult {
    /// True when the token was rejected
    pub is_error: bool,
    /// Error code when rejected, e.g. `invalid_token`
    pub error: Option<String>,
    /// Error detail when rejected
    pub error_description: Option<String>,
    /// Claims of the token. Types are not unique.
    pub claims: Vec<Claim>,
}

impl TokenValidationResult {
    /// A successful validation carrying `claims`
    pub fn success(claims: Vec<Claim>) -> Self {
        Self {
            claims,
            ..Self::default()
        }
    }

    /// A rejected token
    pub fn error(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            is_error: true,
            error: Some(error.into()),
            error_description: Some(description.into()),
            claims: Vec::new(),
        }
    }

    /// All values of `claim_type`, in claim order
    pub fn claim_values<'a>(&'a self, claim_type: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.claims
            .iter()
            .filter(move |c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }

    /// Look up a single-valued claim.
    ///
    /// # Errors
    ///
    /// Returns [`AmbiguousClaim`] if the type appears more than once.
    pub fn single_claim(&self, claim_type: &str) -> Result<Option<&str>, AmbiguousClaim> {
        let mut values = self
            .claims
            .iter()
            .filter(|c| c.claim_type == claim_type)
            .map(|c| c.value.as_str());
        let first = values.next();
        let rest = values.count();
        if rest > 0 {
            return Err(AmbiguousClaim {
                claim_type: claim_type.to_string(),
                count: rest + 1,
            });
        }
        Ok(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TokenValidationResult {
        TokenValidationResult::success(vec![
            Claim::new(CLAIM_CLIENT_ID, "abc"),
            Claim::new(CLAIM_SCOPE, "s1"),
            Claim::new(CLAIM_SCOPE, "s2"),
        ])
    }

    #[test]
    fn test_claim_values_preserves_order() {
        let result = sample();
        let scopes: Vec<&str> = result.claim_values(CLAIM_SCOPE).collect();
        assert_eq!(scopes, vec!["s1", "s2"]);
    }

    #[test]
    fn test_single_claim_present() {
        assert_eq!(sample().single_claim(CLAIM_CLIENT_ID), Ok(Some("abc")));
    }

    #[test]
    fn test_single_claim_absent() {
        assert_eq!(sample().single_claim(CLAIM_EXPIRATION), Ok(None));
    }

    #[test]
    fn test_single_claim_repeated() {
        let err = sample().single_claim(CLAIM_SCOPE).unwrap_err();
        assert_eq!(err.claim_type, "scope");
        assert_eq!(err.count, 2);
    }

    #[test]
    fn test_error_result_has_no_claims() {
        let result = TokenValidationResult::error("invalid_token", "expired");
        assert!(result.is_error);
        assert!(result.claims.is_empty());
    }
}
