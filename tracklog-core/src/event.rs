//! Event payload contract
//!
//! Anything that can be tracked implements [`Event`]: a `kind` label plus a
//! flat map of parameters. Parameter values are restricted to strings and
//! integers; untyped values coming from elsewhere go through
//! [`parameters_from_json`], which drops anything else with a diagnostic.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single parameter value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Integer(i64),
}

/// Parameters attached to an event
pub type Parameters = HashMap<String, ParamValue>;

impl ParamValue {
    /// Convert an untyped JSON value, if it is a string or fits in an `i64`
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(ParamValue::String(s.clone())),
            serde_json::Value::Number(n) => n.as_i64().map(ParamValue::Integer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            ParamValue::Integer(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(i) => Some(*i),
            ParamValue::String(_) => None,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::String(s) => write!(f, "{}", s),
            ParamValue::Integer(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ParamValue {
                fn from(value: $t) -> Self {
                    ParamValue::Integer(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

/// Convert an untyped JSON object into [`Parameters`]
///
/// Keys whose values are neither strings nor `i64` integers are skipped.
pub fn parameters_from_json(map: &serde_json::Map<String, serde_json::Value>) -> Parameters {
    let mut result = Parameters::with_capacity(map.len());

    for (key, value) in map {
        match ParamValue::from_json(value) {
            Some(v) => {
                result.insert(key.clone(), v);
            }
            None => {
                tracing::warn!(key = %key, value = %value, "Parameter value is not encodable, skipping");
            }
        }
    }

    result
}

/// A trackable event
pub trait Event {
    /// Event type label; defaults to the implementing type's name
    fn kind(&self) -> String {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base).to_string()
    }

    /// Event parameters; empty by default
    fn parameters(&self) -> Parameters {
        Parameters::new()
    }
}

/// Ready-made event with an explicit kind and parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleEvent {
    pub kind: String,
    pub parameters: Parameters,
}

impl SimpleEvent {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            parameters: Parameters::new(),
        }
    }

    /// Add a parameter, replacing any previous value for the key
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

impl Event for SimpleEvent {
    fn kind(&self) -> String {
        self.kind.clone()
    }

    fn parameters(&self) -> Parameters {
        self.parameters.clone()
    }
}
