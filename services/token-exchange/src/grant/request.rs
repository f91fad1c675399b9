//! Inbound grant request.

use super::{
    GRANT_TYPE_TOKEN_EXCHANGE, PARAM_CLIENT_ID, PARAM_GRANT_TYPE, PARAM_SCOPE,
    PARAM_SUBJECT_TOKEN, PARAM_SUBJECT_TOKEN_TYPE,
};
use crate::error::ExchangeError;
use crate::scope::ParsedScopes;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Resources and scopes downstream authorization operates on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedResources {
    /// Parsed scopes of the request
    pub parsed_scopes: ParsedScopes,
}

/// A token endpoint request as seen by the grant handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantRequest {
    /// Authenticated client making the request
    pub client_id: String,
    /// Raw protocol parameters (keys are case-sensitive)
    pub raw: HashMap<String, String>,
    /// Scopes the issued token will carry
    pub requested_scopes: Vec<String>,
    /// Resource validation context
    pub validated_resources: ValidatedResources,
}

impl GrantRequest {
    /// Build a request from already-split parameters.
    ///
    /// `requested_scopes` is seeded from the `scope` parameter; a successful
    /// exchange replaces it with the subject token's scopes.
    pub fn new(client_id: impl Into<String>, raw: HashMap<String, String>) -> Self {
        let requested_scopes: Vec<String> = raw
            .get(PARAM_SCOPE)
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let validated_resources = ValidatedResources {
            parsed_scopes: ParsedScopes::from_values(&requested_scopes),
        };

        Self {
            client_id: client_id.into(),
            raw,
            requested_scopes,
            validated_resources,
        }
    }

    /// Parse an `application/x-www-form-urlencoded` token request body.
    ///
    /// # Errors
    ///
    /// Fails on repeated parameters or a grant type other than token exchange.
    pub fn from_form(body: &[u8]) -> Result<Self, ExchangeError> {
        let mut raw = HashMap::new();
        for (name, value) in url::form_urlencoded::parse(body) {
            match raw.entry(name.into_owned()) {
                Entry::Occupied(entry) => {
                    return Err(ExchangeError::DuplicateParameter {
                        name: entry.key().clone(),
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(value.into_owned());
                }
            }
        }

        let grant_type = raw.get(PARAM_GRANT_TYPE).map(String::as_str).unwrap_or("");
        if grant_type != GRANT_TYPE_TOKEN_EXCHANGE {
            return Err(ExchangeError::UnsupportedGrantType {
                grant_type: grant_type.to_string(),
            });
        }

        let client_id = raw.get(PARAM_CLIENT_ID).cloned().unwrap_or_default();
        Ok(Self::new(client_id, raw))
    }

    /// A parameter value, treating blank values as absent
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.raw
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// The subject token, if a non-blank one was supplied
    pub fn subject_token(&self) -> Option<&str> {
        self.parameter(PARAM_SUBJECT_TOKEN)
    }

    /// The subject token type, if supplied
    pub fn subject_token_type(&self) -> Option<&str> {
        self.parameter(PARAM_SUBJECT_TOKEN_TYPE)
    }
}
