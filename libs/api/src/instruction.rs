use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;

use crate::error::IngestError;
use crate::value::Value;

/// Execution state of a previously dispatched remote instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InstructionState {
    Queued,
    Received,
    Executing,
    Declined,
    Completed,
}

impl FromStr for InstructionState {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Queued" => Ok(Self::Queued),
            "Received" => Ok(Self::Received),
            "Executing" => Ok(Self::Executing),
            "Declined" => Ok(Self::Declined),
            "Completed" => Ok(Self::Completed),
            other => Err(IngestError::decode(format!("unknown instruction state `{other}`"))),
        }
    }
}

impl std::fmt::Display for InstructionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Queued => "Queued",
            Self::Received => "Received",
            Self::Executing => "Executing",
            Self::Declined => "Declined",
            Self::Completed => "Completed",
        };
        f.write_str(s)
    }
}

/// Asynchronous report of an instruction's execution state.
///
/// `instruction_id` is the correlation identifier, never the device-local
/// id some producers also include. `node_id` is taken from the topic,
/// never from the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructionStatusUpdate {
    pub instruction_id: i64,
    pub node_id: i64,
    pub state: InstructionState,
    pub result_parameters: BTreeMap<String, Value>,
}
