//! Decode-normalize-deliver pipeline for field-device telemetry.
//!
//! Receives raw `(topic, payload)` pairs from a pub/sub transport adapter,
//! decodes them with a fixed wire codec, reconciles the two coexisting
//! protocol generations, maps them to canonical records and forwards the
//! result to the persistence tier with bounded retry on transient failure.

pub mod classify;
pub mod config;
pub mod counters;
pub mod deliver;
pub mod dispatch;
pub mod map;
pub mod normalize;
pub mod pipeline;

pub use classify::{MessageKind, classify};
pub use config::{MalformedPolicy, PipelineConfig};
pub use counters::{CounterSnapshot, PipelineCounters};
pub use deliver::{DatumBatch, MAX_DELIVERY_ATTEMPTS, deliver};
pub use dispatch::dispatch_instruction;
pub use normalize::{Generation, V2_TAG, normalize_datum};
pub use pipeline::{Disposition, Pipeline};
