//! In-memory store for opaque reference tokens.
//!
//! A reference token is a random handle; its claims live server side. The
//! store doubles as a [`TokenValidator`], which is what lets a reference
//! token be exchanged for a self-contained JWT.

use super::claims::{Claim, CLAIM_EXPIRATION, TokenValidationResult};
use super::{TokenValidator, ValidatorError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct ReferenceToken {
    claims: Vec<Claim>,
    expires_at: DateTime<Utc>,
    revoked: bool,
}

/// Reference token store keyed by handle.
#[derive(Debug, Default)]
pub struct ReferenceTokenStore {
    tokens: RwLock<HashMap<String, ReferenceToken>>,
}

impl ReferenceTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `claims` under a fresh handle valid for `lifetime`.
    ///
    /// An `exp` claim is added unless one is already present. Expired handles
    /// are pruned on every call.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::Configuration`] if `lifetime` is out of range.
    pub async fn issue(
        &self,
        mut claims: Vec<Claim>,
        lifetime: Duration,
    ) -> Result<String, ValidatorError> {
        let lifetime = chrono::Duration::from_std(lifetime)
            .map_err(|e| ValidatorError::Configuration(format!("invalid lifetime: {e}")))?;
        let expires_at = Utc::now() + lifetime;

        if !claims.iter().any(|c| c.claim_type == CLAIM_EXPIRATION) {
            claims.push(Claim::new(CLAIM_EXPIRATION, expires_at.timestamp().to_string()));
        }

        let handle = uuid::Uuid::new_v4().simple().to_string();
        let mut tokens = self.tokens.write().await;
        let pruned = prune_expired(&mut tokens, Utc::now());
        if pruned > 0 {
            debug!(pruned, "Expired reference tokens removed");
        }
        tokens.insert(
            handle.clone(),
            ReferenceToken {
                claims,
                expires_at,
                revoked: false,
            },
        );
        Ok(handle)
    }

    /// Revoke a handle. Returns false if it is unknown.
    pub async fn revoke(&self, handle: &str) -> bool {
        match self.tokens.write().await.get_mut(handle) {
            Some(token) => {
                token.revoked = true;
                true
            }
            None => false,
        }
    }

    /// Drop expired entries, returning how many were removed
    pub async fn remove_expired(&self) -> usize {
        prune_expired(&mut *self.tokens.write().await, Utc::now())
    }

    /// Number of stored handles
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    /// True when nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

fn prune_expired(tokens: &mut HashMap<String, ReferenceToken>, now: DateTime<Utc>) -> usize {
    let before = tokens.len();
    tokens.retain(|_, token| token.expires_at > now);
    before - tokens.len()
}

#[async_trait]
impl TokenValidator for ReferenceTokenStore {
    async fn validate_access_token(
        &self,
        token: &str,
    ) -> Result<Option<TokenValidationResult>, ValidatorError> {
        let tokens = self.tokens.read().await;
        let Some(entry) = tokens.get(token) else {
            return Ok(None);
        };

        if entry.revoked {
            debug!("Reference token revoked");
            return Ok(Some(TokenValidationResult::error(
                "invalid_token",
                "token revoked",
            )));
        }
        if entry.expires_at <= Utc::now() {
            debug!("Reference token expired");
            return Ok(Some(TokenValidationResult::error(
                "invalid_token",
                "token expired",
            )));
        }

        Ok(Some(TokenValidationResult::success(entry.claims.clone())))
    }
}
