use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::value::Value;

/// Wire encoding of inbound payloads. Fixed per pipeline instance at
/// deployment time, never inferred per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PayloadEncoding {
    #[default]
    Json,
    Cbor,
}

impl std::fmt::Display for PayloadEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadEncoding::Json => write!(f, "json"),
            PayloadEncoding::Cbor => write!(f, "cbor"),
        }
    }
}

/// Payload codec: raw bytes ↔ generic [`Value`] tree for exactly one
/// wire encoding.
///
/// Implementations are stateless and shared read-only across concurrent
/// pipeline invocations. Malformed bytes are an `ErrorKind::Decode`
/// failure and are never retried.
pub trait PayloadCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Value, IngestError>;

    fn encode(&self, value: &Value) -> Result<Vec<u8>, IngestError>;

    /// The single encoding this codec handles.
    fn encoding(&self) -> PayloadEncoding;
}
