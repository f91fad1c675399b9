//! Shared test doubles for token exchange integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use token_exchange::grant::{GrantRequest, GRANT_TYPE_TOKEN_EXCHANGE};
use token_exchange::validation::{Claim, TokenValidationResult, TokenValidator, ValidatorError};

/// What the scripted validator answers.
#[derive(Debug, Clone)]
pub enum Script {
    /// Valid token with these claims
    Valid(Vec<Claim>),
    /// Known but rejected token
    Rejected,
    /// Unknown token
    Unknown,
    /// Validator fault with this message
    Fault(String),
    /// Validator cancelled
    Cancelled,
    /// Validator panics with this message
    Panic(String),
}

/// Validator returning a fixed answer and counting calls.
pub struct ScriptedValidator {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedValidator {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenValidator for ScriptedValidator {
    async fn validate_access_token(
        &self,
        _token: &str,
    ) -> Result<Option<TokenValidationResult>, ValidatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Valid(claims) => Ok(Some(TokenValidationResult::success(claims.clone()))),
            Script::Rejected => Ok(Some(TokenValidationResult::error(
                "invalid_token",
                "revoked",
            ))),
            Script::Unknown => Ok(None),
            Script::Fault(message) => Err(ValidatorError::Unavailable(message.clone())),
            Script::Cancelled => Err(ValidatorError::Cancelled),
            Script::Panic(message) => panic!("{}", message),
        }
    }
}

/// Validator whose answer depends on the presented token.
pub struct TokenKeyedValidator {
    pub tokens: HashMap<String, Vec<Claim>>,
}

#[async_trait]
impl TokenValidator for TokenKeyedValidator {
    async fn validate_access_token(
        &self,
        token: &str,
    ) -> Result<Option<TokenValidationResult>, ValidatorError> {
        tokio::task::yield_now().await;
        Ok(self
            .tokens
            .get(token)
            .cloned()
            .map(TokenValidationResult::success))
    }
}

pub fn claims(client_id: &str, scopes: &[&str], exp: Option<&str>) -> Vec<Claim> {
    let mut claims = vec![Claim::new("client_id", client_id)];
    claims.extend(scopes.iter().map(|s| Claim::new("scope", *s)));
    if let Some(exp) = exp {
        claims.push(Claim::new("exp", exp));
    }
    claims
}

pub fn request_with(params: &[(&str, &str)]) -> GrantRequest {
    let mut raw: HashMap<String, String> = params
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    raw.entry("grant_type".to_string())
        .or_insert_with(|| GRANT_TYPE_TOKEN_EXCHANGE.to_string());
    GrantRequest::new("gateway-client", raw)
}

pub fn request_with_token(token: &str) -> GrantRequest {
    request_with(&[("subject_token", token), ("scope", "admin")])
}
