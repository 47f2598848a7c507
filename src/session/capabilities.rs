//! # Capability descriptions.
//!
//! [`Capabilities`] is a flat JSON object describing the session a caller wants
//! (`{"browserName": "firefox", "platformName": "linux"}`). The scheduler never
//! interprets it; distributors and factories do.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

const BROWSER_NAME: &str = "browserName";

/// Key/value description of a requested (or offered) session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(BTreeMap<String, Value>);

impl Capabilities {
    /// Empty capabilities (matches anything under [`Capabilities::satisfies`]).
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for `{"browserName": name}`.
    pub fn browser(name: &str) -> Self {
        Self::new().with(BROWSER_NAME, name)
    }

    /// Parses a JSON object.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Returns a copy with `key` set to `value`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The `browserName` entry, if it is a string.
    pub fn browser_name(&self) -> Option<&str> {
        self.get(BROWSER_NAME).and_then(Value::as_str)
    }

    /// True if every entry of `required` is present here with an equal value.
    pub fn satisfies(&self, required: &Capabilities) -> bool {
        required.0.iter().all(|(k, v)| self.0.get(k) == Some(v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}
