pub mod codec;
pub mod datum;
pub mod decimal;
pub mod error;
pub mod instruction;
pub mod storage;
pub mod topic;
pub mod value;

pub use codec::{PayloadCodec, PayloadEncoding};
pub use datum::{LocationDatum, NodeDatum, SampleSet, SampleValue, StreamDatum};
pub use decimal::Decimal;
pub use error::{ErrorKind, IngestError};
pub use instruction::{InstructionState, InstructionStatusUpdate};
pub use storage::{DatumRepository, InstructionStore};
pub use value::Value;
