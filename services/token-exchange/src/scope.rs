//! Parsed scope values handed to resource validation.

use std::collections::BTreeSet;

/// A single scope value as consumed by resource/scope validation.
///
/// Ordering and equality start with `raw_value`, so a set of parsed scopes
/// is unique by raw value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParsedScope {
    raw_value: String,
    parsed_name: String,
    parsed_parameter: Option<String>,
}

impl ParsedScope {
    /// Wrap a raw scope string. The name is the raw value and there is no
    /// parameter.
    pub fn new(raw_value: impl Into<String>) -> Self {
        let raw_value = raw_value.into();
        Self {
            parsed_name: raw_value.clone(),
            raw_value,
            parsed_parameter: None,
        }
    }

    /// A parameterized scope, e.g. `transaction:123` named `transaction`
    pub fn with_parameter(
        raw_value: impl Into<String>,
        parsed_name: impl Into<String>,
        parsed_parameter: impl Into<String>,
    ) -> Self {
        Self {
            raw_value: raw_value.into(),
            parsed_name: parsed_name.into(),
            parsed_parameter: Some(parsed_parameter.into()),
        }
    }

    /// The scope exactly as it appeared in the token
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    /// Scope name used for resource lookup
    pub fn parsed_name(&self) -> &str {
        &self.parsed_name
    }

    /// Parameter part of a parameterized scope
    pub fn parsed_parameter(&self) -> Option<&str> {
        self.parsed_parameter.as_deref()
    }
}

/// Set of parsed scopes, unique by raw value.
///
/// Equality is by membership, so the order and multiplicity of the source
/// claims never matter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedScopes {
    scopes: BTreeSet<ParsedScope>,
}

impl ParsedScopes {
    /// Build the set from scope claim values. Blank values are dropped.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let scopes = values
            .into_iter()
            .filter_map(|value| {
                let value = value.as_ref().trim();
                (!value.is_empty()).then(|| ParsedScope::new(value))
            })
            .collect();
        Self { scopes }
    }

    /// Number of distinct scopes
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// True when no scope was granted
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Membership check by raw value
    pub fn contains(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s.raw_value() == scope)
    }

    /// Iterate in lexical order
    pub fn iter(&self) -> impl Iterator<Item = &ParsedScope> {
        self.scopes.iter()
    }

    /// Raw values in lexical order
    pub fn raw_values(&self) -> Vec<String> {
        self.scopes.iter().map(|s| s.raw_value.clone()).collect()
    }

    /// Space-delimited form used by the `scope` response parameter
    pub fn to_scope_string(&self) -> String {
        self.raw_values().join(" ")
    }
}

/// Remove duplicate and blank scope values, keeping first-occurrence order.
pub fn dedup_scopes<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = BTreeSet::new();
    values
        .into_iter()
        .filter_map(|value| {
            let value = value.as_ref().trim();
            (!value.is_empty() && seen.insert(value.to_string())).then(|| value.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_collapse() {
        let scopes = ParsedScopes::from_values(["read", "write", "read"]);
        assert_eq!(scopes.len(), 2);
        assert!(scopes.contains("read"));
        assert!(scopes.contains("write"));
    }

    #[test]
    fn test_order_does_not_affect_equality() {
        let a = ParsedScopes::from_values(["b", "a", "c"]);
        let b = ParsedScopes::from_values(["c", "a", "b", "a"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_blank_values_dropped() {
        let scopes = ParsedScopes::from_values(["", "  ", "api1"]);
        assert_eq!(scopes.raw_values(), vec!["api1".to_string()]);
    }

    #[test]
    fn test_scope_string_is_sorted() {
        let scopes = ParsedScopes::from_values(["write", "openid", "read"]);
        assert_eq!(scopes.to_scope_string(), "openid read write");
    }

    #[test]
    fn test_dedup_scopes_keeps_first_occurrence_order() {
        let scopes = dedup_scopes(["write", "read", "write", " ", "admin"]);
        assert_eq!(scopes, vec!["write", "read", "admin"]);
    }

    #[test]
    fn test_parsed_scope_defaults_name_to_raw_value() {
        let scope = ParsedScope::new("api1.read");
        assert_eq!(scope.raw_value(), "api1.read");
        assert_eq!(scope.parsed_name(), "api1.read");
        assert_eq!(scope.parsed_parameter(), None);
    }

    #[test]
    fn test_parsed_scope_with_parameter() {
        let scope = ParsedScope::with_parameter("transaction:123", "transaction", "123");
        assert_eq!(scope.raw_value(), "transaction:123");
        assert_eq!(scope.parsed_name(), "transaction");
        assert_eq!(scope.parsed_parameter(), Some("123"));
    }

    #[test]
    fn test_parsed_scopes_carry_default_names() {
        let scopes = ParsedScopes::from_values(["openid", "api1"]);
        assert!(scopes
            .iter()
            .all(|s| s.parsed_name() == s.raw_value() && s.parsed_parameter().is_none()));
    }

    #[test]
    fn test_empty_set() {
        let scopes = ParsedScopes::default();
        assert!(scopes.is_empty());
        assert_eq!(scopes.to_scope_string(), "");
    }
}
