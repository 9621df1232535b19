use std::sync::Arc;

use ingest_api::{
    DatumRepository, ErrorKind, IngestError, InstructionStore, PayloadCodec, Value, topic,
};

use crate::classify::{MessageKind, classify};
use crate::config::MalformedPolicy;
use crate::counters::{CounterSnapshot, PipelineCounters};
use crate::deliver::{DatumBatch, deliver};
use crate::dispatch::dispatch_instruction;
use crate::map::{map_instruction_status, map_location_datum, map_node_datum, map_stream_datum};
use crate::normalize::normalize_datum;

/// Outcome of one handled message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Datum batch persisted; count of records delivered.
    Stored(usize),
    /// Instruction status forwarded; whether the store changed anything.
    InstructionUpdated(bool),
    /// Payload could never decode and the policy says acknowledge-and-drop.
    MalformedDropped,
}

/// The decode-normalize-deliver pipeline.
///
/// One instance per subscription, fixed to one wire encoding. Invoked once
/// per inbound message on whatever thread the transport adapter dispatches
/// from; each message is processed to completion, including all retry
/// attempts, before the call returns. Holds no shared mutable state beyond
/// atomic counters, so concurrent invocation from independent adapter
/// threads is safe.
pub struct Pipeline {
    codec: Arc<dyn PayloadCodec>,
    datum_repo: Arc<dyn DatumRepository>,
    instruction_store: Arc<dyn InstructionStore>,
    malformed: MalformedPolicy,
    counters: PipelineCounters,
}

impl Pipeline {
    pub fn new(
        codec: Arc<dyn PayloadCodec>,
        datum_repo: Arc<dyn DatumRepository>,
        instruction_store: Arc<dyn InstructionStore>,
    ) -> Self {
        Self {
            codec,
            datum_repo,
            instruction_store,
            malformed: MalformedPolicy::default(),
            counters: PipelineCounters::default(),
        }
    }

    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.malformed = policy;
        self
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Handle one `(topic, payload)` pair from the transport adapter.
    ///
    /// An `Err` return means the message was not processed and the adapter
    /// should leave it unacknowledged; `Ok` means it is done with, even
    /// when the outcome was a policy-sanctioned drop.
    pub fn handle(&self, msg_topic: &str, payload: &[u8]) -> Result<Disposition, IngestError> {
        PipelineCounters::incr(&self.counters.received);
        match self.process(msg_topic, payload) {
            Ok(disposition) => Ok(disposition),
            Err(e) if e.kind() == ErrorKind::Decode => {
                PipelineCounters::incr(&self.counters.malformed);
                tracing::warn!(topic = %msg_topic, error = %e, "malformed message");
                match self.malformed {
                    MalformedPolicy::Acknowledge => Ok(Disposition::MalformedDropped),
                    MalformedPolicy::Requeue => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    fn process(&self, msg_topic: &str, payload: &[u8]) -> Result<Disposition, IngestError> {
        let node_id = topic::node_id_from_topic(msg_topic)?;
        let tree = self.codec.decode(payload)?;

        // A top-level array is a batch; every element must be the same kind.
        let elements = match tree {
            Value::Array(items) => items,
            single => vec![single],
        };
        let Some(first) = elements.first() else {
            return Ok(Disposition::Stored(0));
        };
        let kind = classify(first);
        if let Some(other) = elements.iter().map(classify).find(|k| *k != kind) {
            return Err(IngestError::decode(format!(
                "mixed message kinds in one payload: {kind} and {other}"
            )));
        }

        match kind {
            MessageKind::NodeDatum => {
                let mut datums = Vec::with_capacity(elements.len());
                for mut element in elements {
                    normalize_datum(&mut element);
                    datums.push(map_node_datum(node_id, &element)?);
                }
                self.store(DatumBatch::Node(datums))
            }
            MessageKind::LocationDatum => {
                let mut datums = Vec::with_capacity(elements.len());
                for mut element in elements {
                    normalize_datum(&mut element);
                    datums.push(map_location_datum(&element)?);
                }
                self.store(DatumBatch::Location(datums))
            }
            MessageKind::StreamDatum => {
                let mut datums = Vec::with_capacity(elements.len());
                for mut element in elements {
                    normalize_datum(&mut element);
                    datums.push(map_stream_datum(&element)?);
                }
                self.store(DatumBatch::Stream(datums))
            }
            MessageKind::InstructionStatus => {
                let mut updated = false;
                for element in &elements {
                    let update = map_instruction_status(node_id, element)?;
                    updated |= dispatch_instruction(&*self.instruction_store, &update)?;
                    PipelineCounters::incr(&self.counters.instruction_updates);
                }
                Ok(Disposition::InstructionUpdated(updated))
            }
        }
    }

    fn store(&self, batch: DatumBatch) -> Result<Disposition, IngestError> {
        deliver(&*self.datum_repo, &batch, &self.counters)?;
        let count = batch.len();
        PipelineCounters::add(&self.counters.stored, count as u64);
        tracing::debug!(records = count, "batch delivered");
        Ok(Disposition::Stored(count))
    }
}
