//! Logical identity of an outbound request.

use std::collections::BTreeSet;
use std::fmt;

/// Deterministic key built from an operation name and its parameters.
///
/// Parameters are sorted and deduplicated, so insertion order never matters.
/// The encoding is a JSON array, which keeps keys with separator characters in
/// their values from colliding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey(String);

impl RequestKey {
    /// Starts a key for the given operation.
    #[must_use]
    pub fn builder(operation: impl Into<String>) -> RequestKeyBuilder {
        RequestKeyBuilder {
            operation: operation.into(),
            params: BTreeSet::new(),
        }
    }

    /// Key for an operation without parameters.
    #[must_use]
    pub fn for_operation(operation: impl Into<String>) -> Self {
        Self::builder(operation).build()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accumulates parameters for a [`RequestKey`].
#[derive(Debug, Clone)]
pub struct RequestKeyBuilder {
    operation: String,
    params: BTreeSet<(String, String)>,
}

impl RequestKeyBuilder {
    /// Adds a parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.params.insert((name.into(), value.to_string()));
        self
    }

    /// Adds a parameter when a value is present.
    #[must_use]
    pub fn param_opt<V: fmt::Display>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    /// Adds every pair from an iterator.
    #[must_use]
    pub fn params<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: fmt::Display,
    {
        for (name, value) in pairs {
            self = self.param(name, value);
        }
        self
    }

    #[must_use]
    pub fn build(self) -> RequestKey {
        let params: Vec<serde_json::Value> = self
            .params
            .into_iter()
            .map(|(name, value)| serde_json::json!([name, value]))
            .collect();

        RequestKey(serde_json::json!([self.operation, params]).to_string())
    }
}
