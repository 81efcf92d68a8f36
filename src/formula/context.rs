//! Caller-supplied planning context: declared domain, variable values and
//! condition flags used to test formula applicability.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key under which the caller's declared domain is stored.
pub const DOMAIN_KEY: &str = "domain";

/// A single context entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Flag(bool),
    Number(f64),
    Text(String),
    /// Any other JSON value (null, array, object). Carried through untouched
    /// and ignored by the typed accessors.
    Other(serde_json::Value),
}

impl From<bool> for ContextValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl From<f64> for ContextValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for ContextValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Map of context keys to values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    entries: BTreeMap<String, ContextValue>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(self, domain: impl Into<String>) -> Self {
        self.with(DOMAIN_KEY, ContextValue::Text(domain.into()))
    }

    pub fn with_value(self, key: impl Into<String>, value: f64) -> Self {
        self.with(key, ContextValue::Number(value))
    }

    pub fn with_flag(self, key: impl Into<String>, flag: bool) -> Self {
        self.with(key, ContextValue::Flag(flag))
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries.get(key)
    }

    /// The declared domain, if the context carries a textual `domain` entry.
    pub fn domain(&self) -> Option<&str> {
        match self.entries.get(DOMAIN_KEY) {
            Some(ContextValue::Text(d)) => Some(d.as_str()),
            _ => None,
        }
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.entries.get(key) {
            Some(ContextValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.entries.get(key) {
            Some(ContextValue::Flag(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors_only_match_their_kind() {
        let ctx = Context::new()
            .with_domain("mechanics")
            .with_value("v", 0.5)
            .with_flag("non-relativistic", true);
        assert_eq!(ctx.domain(), Some("mechanics"));
        assert_eq!(ctx.number("v"), Some(0.5));
        assert_eq!(ctx.flag("non-relativistic"), Some(true));
        assert_eq!(ctx.number("non-relativistic"), None);
        assert_eq!(ctx.flag("v"), None);
    }

    #[test]
    fn context_deserializes_from_plain_json_object() {
        let ctx: Context =
            serde_json::from_str(r#"{"domain":"optics","n":1.33,"paraxial":true}"#).unwrap();
        assert_eq!(ctx.domain(), Some("optics"));
        assert_eq!(ctx.number("n"), Some(1.33));
        assert_eq!(ctx.flag("paraxial"), Some(true));
    }

    #[test]
    fn structured_values_are_kept_but_not_typed() {
        let json = r#"{"domain":null,"bounds":[0.0,1.0],"medium":{"name":"water"},"n":1.33}"#;
        let ctx: Context = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.domain(), None);
        assert_eq!(ctx.number("bounds"), None);
        assert_eq!(ctx.flag("medium"), None);
        assert_eq!(ctx.number("n"), Some(1.33));
        assert_eq!(
            ctx.get("medium"),
            Some(&ContextValue::Other(serde_json::json!({"name": "water"})))
        );

        let back = serde_json::to_value(&ctx).unwrap();
        assert_eq!(back, serde_json::from_str::<serde_json::Value>(json).unwrap());
    }
}
