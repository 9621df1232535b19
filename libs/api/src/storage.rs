use crate::datum::{LocationDatum, NodeDatum, StreamDatum};
use crate::error::IngestError;
use crate::instruction::InstructionStatusUpdate;

/// Persistence tier for decoded datum batches.
///
/// The pipeline doesn't enumerate or know concrete implementations; for
/// the pipeline, storage is just this trait. Every method may fail with
/// `ErrorKind::Transient` (no partial write occurred, safe to retry the
/// identical call) or any other kind (fatal, propagated immediately).
pub trait DatumRepository: Send + Sync {
    fn post_node_datum(&self, datums: &[NodeDatum]) -> Result<(), IngestError>;

    fn post_location_datum(&self, datums: &[LocationDatum]) -> Result<(), IngestError>;

    fn post_stream_datum(&self, datums: &[StreamDatum]) -> Result<(), IngestError>;
}

/// Instruction store: applies instruction state updates.
///
/// Returns whether a matching instruction was actually updated — an
/// unknown instruction id is a no-op, not an error. No transient-retry
/// contract: broker redelivery is the recovery mechanism, and repeated
/// delivery of the same update must be idempotent at the store.
pub trait InstructionStore: Send + Sync {
    fn update_instruction_state(&self, update: &InstructionStatusUpdate)
        -> Result<bool, IngestError>;
}
