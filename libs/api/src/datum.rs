use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::decimal::Decimal;

/// One sample property value: an exact decimal or a status string.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Decimal(Decimal),
    Text(String),
}

impl Serialize for SampleValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SampleValue::Decimal(d) => serializer.collect_str(d),
            SampleValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Named property → value mapping. Insertion order is not significant.
pub type SampleSet = BTreeMap<String, SampleValue>;

/// One timestamped telemetry reading reported by a node.
///
/// `node_id` comes from the subscription topic, everything else from the
/// payload. Immutable once built; constructed fresh per inbound message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDatum {
    pub node_id: i64,
    pub source_id: String,
    /// Millisecond-precision instant.
    pub created: DateTime<Utc>,
    pub instantaneous: SampleSet,
    pub accumulating: SampleSet,
    pub status: SampleSet,
    pub tags: Vec<String>,
}

/// Identical shape to [`NodeDatum`], keyed by a location identifier
/// carried in the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationDatum {
    pub location_id: i64,
    pub source_id: String,
    pub created: DateTime<Utc>,
    pub instantaneous: SampleSet,
    pub accumulating: SampleSet,
    pub status: SampleSet,
    pub tags: Vec<String>,
}

/// Positionally-encoded datum. Array slots are meaningful only together
/// with stream metadata registered out of band; lengths are not validated
/// here against that metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamDatum {
    pub stream_id: String,
    pub created: DateTime<Utc>,
    pub instantaneous: Vec<Option<Decimal>>,
    pub accumulating: Vec<Option<Decimal>>,
    pub status: Vec<Option<String>>,
    pub tags: Vec<String>,
}
