use ingest_api::{IngestError, InstructionStore, InstructionStatusUpdate};

/// Forward one instruction status update to the store. Exactly one call,
/// no local retry: the store is idempotent under broker redelivery, so an
/// unacknowledged failure is recovered by the broker, not by this layer.
pub fn dispatch_instruction(
    store: &dyn InstructionStore,
    update: &InstructionStatusUpdate,
) -> Result<bool, IngestError> {
    match store.update_instruction_state(update) {
        Ok(updated) => {
            if !updated {
                tracing::debug!(
                    instruction = update.instruction_id,
                    node = update.node_id,
                    "no matching instruction, update ignored"
                );
            }
            Ok(updated)
        }
        Err(e) => {
            tracing::warn!(
                instruction = update.instruction_id,
                node = update.node_id,
                state = %update.state,
                error = %e,
                "instruction state update failed"
            );
            Err(e)
        }
    }
}
