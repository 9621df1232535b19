//! In-memory implementations of the persistence collaborators. Used by
//! the replay tool and by tests that don't need failure injection.

use std::collections::HashMap;
use std::sync::Mutex;

use ingest_api::{
    DatumRepository, IngestError, InstructionState, InstructionStatusUpdate, InstructionStore,
    LocationDatum, NodeDatum, StreamDatum,
};

// ═══════════════════════════════════════════════════════════════
//  MemoryDatumRepository
// ═══════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct MemoryDatumRepository {
    node: Mutex<Vec<NodeDatum>>,
    location: Mutex<Vec<LocationDatum>>,
    stream: Mutex<Vec<StreamDatum>>,
}

impl MemoryDatumRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_datum(&self) -> Vec<NodeDatum> {
        lock(&self.node).clone()
    }

    pub fn location_datum(&self) -> Vec<LocationDatum> {
        lock(&self.location).clone()
    }

    pub fn stream_datum(&self) -> Vec<StreamDatum> {
        lock(&self.stream).clone()
    }

    /// `(node, location, stream)` record counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        (lock(&self.node).len(), lock(&self.location).len(), lock(&self.stream).len())
    }
}

impl DatumRepository for MemoryDatumRepository {
    fn post_node_datum(&self, datums: &[NodeDatum]) -> Result<(), IngestError> {
        lock(&self.node).extend_from_slice(datums);
        Ok(())
    }

    fn post_location_datum(&self, datums: &[LocationDatum]) -> Result<(), IngestError> {
        lock(&self.location).extend_from_slice(datums);
        Ok(())
    }

    fn post_stream_datum(&self, datums: &[StreamDatum]) -> Result<(), IngestError> {
        lock(&self.stream).extend_from_slice(datums);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryInstructionStore
// ═══════════════════════════════════════════════════════════════

/// Keeps the latest state per instruction id. Updates to unknown ids are
/// a no-op (`false`) unless the store is permissive, in which case they
/// auto-register — handy for replaying captures without the dispatch
/// history that created the instructions.
pub struct MemoryInstructionStore {
    states: Mutex<HashMap<i64, InstructionState>>,
    permissive: bool,
}

impl MemoryInstructionStore {
    pub fn new() -> Self {
        Self { states: Mutex::new(HashMap::new()), permissive: false }
    }

    pub fn permissive() -> Self {
        Self { states: Mutex::new(HashMap::new()), permissive: true }
    }

    /// Register an instruction id so later updates match.
    pub fn register(&self, instruction_id: i64, state: InstructionState) {
        lock(&self.states).insert(instruction_id, state);
    }

    pub fn state_of(&self, instruction_id: i64) -> Option<InstructionState> {
        lock(&self.states).get(&instruction_id).copied()
    }

    pub fn len(&self) -> usize {
        lock(&self.states).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.states).is_empty()
    }
}

impl Default for MemoryInstructionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionStore for MemoryInstructionStore {
    fn update_instruction_state(
        &self,
        update: &InstructionStatusUpdate,
    ) -> Result<bool, IngestError> {
        let mut states = lock(&self.states);
        if states.contains_key(&update.instruction_id) || self.permissive {
            states.insert(update.instruction_id, update.state);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
