use ingest_api::{DatumRepository, ErrorKind, IngestError, LocationDatum, NodeDatum, StreamDatum};

use crate::counters::PipelineCounters;

/// Total attempts per batch, including the first. Transient failures are
/// retried in place with no delay; anything else propagates immediately.
pub const MAX_DELIVERY_ATTEMPTS: u32 = 3;

/// One decoded batch: same-kind records extracted from a single message.
#[derive(Debug, Clone, PartialEq)]
pub enum DatumBatch {
    Node(Vec<NodeDatum>),
    Location(Vec<LocationDatum>),
    Stream(Vec<StreamDatum>),
}

impl DatumBatch {
    pub fn len(&self) -> usize {
        match self {
            DatumBatch::Node(d) => d.len(),
            DatumBatch::Location(d) => d.len(),
            DatumBatch::Stream(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Forward one batch to the matching repository call, retrying the
/// identical call on transient failure.
///
/// The retry is an explicit bounded loop — no recursion — so the attempt
/// ceiling is visible here and nowhere else. Retries run synchronously on
/// the calling thread with no backoff; a transient error means no partial
/// write occurred, so the same batch is posted verbatim.
pub fn deliver(
    repo: &dyn DatumRepository,
    batch: &DatumBatch,
    counters: &PipelineCounters,
) -> Result<(), IngestError> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let result = match batch {
            DatumBatch::Node(datums) => repo.post_node_datum(datums),
            DatumBatch::Location(datums) => repo.post_location_datum(datums),
            DatumBatch::Stream(datums) => repo.post_stream_datum(datums),
        };
        match result {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == ErrorKind::Transient && attempt < MAX_DELIVERY_ATTEMPTS => {
                PipelineCounters::incr(&counters.delivery_retries);
                tracing::warn!(
                    attempt,
                    max = MAX_DELIVERY_ATTEMPTS,
                    error = %e,
                    "transient storage failure, retrying"
                );
            }
            Err(e) => {
                if e.kind() == ErrorKind::Transient {
                    tracing::error!(attempts = attempt, error = %e, "delivery attempts exhausted");
                }
                return Err(e);
            }
        }
    }
}
