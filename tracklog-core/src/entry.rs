//! Buffered event record
//!
//! An [`Entry`] is what the collector keeps in memory, mirrors to disk and
//! ships to the endpoint. Field names are shortened on the wire:
//!
//! | Field        | Key | Notes                                   |
//! |--------------|-----|-----------------------------------------|
//! | `source_id`  | `i` | dotted path of the emitting tracker     |
//! | `kind`       | `t` | event type label                        |
//! | `timestamp`  | `d` | RFC 3339, full sub-second precision     |
//! | `parameters` | `p` | omitted entirely when empty             |

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::event::{Event, ParamValue, Parameters};

/// Source identifier of the synthetic overflow marker
pub const MARKER_SOURCE: &str = "stats";

/// Kind of the synthetic overflow marker
pub const MARKER_KIND: &str = "fool-proof";

/// One recorded event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Hierarchical dotted path of the event source
    #[serde(rename = "i")]
    pub source_id: String,

    /// Event type label
    #[serde(rename = "t")]
    pub kind: String,

    /// When the event was collected
    #[serde(rename = "d")]
    pub timestamp: DateTime<Utc>,

    /// Event parameters
    #[serde(
        rename = "p",
        default,
        skip_serializing_if = "HashMap::is_empty",
        deserialize_with = "deserialize_parameters"
    )]
    pub parameters: Parameters,
}

impl Entry {
    pub fn new(
        source_id: impl Into<String>,
        kind: impl Into<String>,
        timestamp: DateTime<Utc>,
        parameters: Parameters,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            kind: kind.into(),
            timestamp,
            parameters,
        }
    }

    /// Capture an event as collected right now
    pub fn from_event<E: Event + ?Sized>(source_id: impl Into<String>, event: &E) -> Self {
        Self::new(source_id, event.kind(), Utc::now(), event.parameters())
    }

    /// Marker recording that older entries were dropped on overflow
    pub fn overflow_marker() -> Self {
        Self::new(MARKER_SOURCE, MARKER_KIND, Utc::now(), Parameters::new())
    }

    pub fn is_overflow_marker(&self) -> bool {
        self.source_id == MARKER_SOURCE && self.kind == MARKER_KIND
    }
}

/// Decode parameters, skipping keys whose value is neither a string nor an integer
fn deserialize_parameters<'de, D>(deserializer: D) -> Result<Parameters, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
    let mut result = Parameters::with_capacity(raw.len());

    for (key, value) in raw {
        match ParamValue::from_json(&value) {
            Some(v) => {
                result.insert(key, v);
            }
            None => {
                tracing::warn!(key = %key, "Parameter value is not decodable, skipping");
            }
        }
    }

    Ok(result)
}
