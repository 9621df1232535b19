//! Replay captured `(topic, payload)` pairs through a pipeline instance.
//!
//! Capture format: one message per line, `topic <space> base64(payload)`.
//! Blank lines and `#` comments are skipped. Stands in for the broker
//! transport during development and when diagnosing captured traffic.

mod error;

use std::io::{BufRead, BufReader};
use std::sync::Arc;

use base64::Engine;
use clap::Parser;

use codec_cbor::CborCodec;
use codec_json::JsonCodec;
use error::ReplayError;
use ingest_api::{ErrorKind, PayloadCodec, PayloadEncoding};
use ingest_pipeline::{Disposition, Pipeline, PipelineConfig};
use storage_memory::{MemoryDatumRepository, MemoryInstructionStore};

#[derive(Parser)]
#[command(name = "ingest-replay", about = "Replay captured telemetry through the ingest pipeline")]
struct Cli {
    /// Capture file, `-` for stdin
    #[arg(long, default_value = "-")]
    input: String,

    /// Optional TOML pipeline config (encoding, malformed policy)
    #[arg(long, env = "INGEST_CONFIG")]
    config: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), ReplayError> {
    let config = load_config(cli.config.as_deref())?;
    let codec: Arc<dyn PayloadCodec> = match config.encoding {
        PayloadEncoding::Json => Arc::new(JsonCodec),
        PayloadEncoding::Cbor => Arc::new(CborCodec),
    };
    tracing::info!(encoding = %config.encoding, malformed = ?config.malformed, "pipeline configured");

    let repo = Arc::new(MemoryDatumRepository::new());
    let instructions = Arc::new(MemoryInstructionStore::permissive());
    let pipeline = Pipeline::new(codec, repo.clone(), instructions.clone())
        .with_malformed_policy(config.malformed);

    for (index, line) in reader(&cli.input)?.lines().enumerate() {
        let line = line.map_err(|e| ReplayError::Io { path: cli.input.clone(), source: e })?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let number = index + 1;
        let (topic, payload) = parse_capture_line(line, number)?;

        match pipeline.handle(topic, &payload) {
            Ok(Disposition::Stored(count)) => {
                tracing::debug!(line = number, %topic, records = count, "stored");
            }
            Ok(Disposition::InstructionUpdated(updated)) => {
                tracing::debug!(line = number, %topic, updated, "instruction update");
            }
            Ok(Disposition::MalformedDropped) => {
                tracing::debug!(line = number, %topic, "malformed, dropped");
            }
            // A requeue-policy decode error: the broker would redeliver,
            // the replay just moves on.
            Err(e) if e.kind() == ErrorKind::Decode => {
                tracing::warn!(line = number, %topic, error = %e, "left unacknowledged");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let counters = pipeline.counters();
    let (node, location, stream) = repo.counts();
    tracing::info!(
        received = counters.received,
        stored = counters.stored,
        malformed = counters.malformed,
        delivery_retries = counters.delivery_retries,
        instruction_updates = counters.instruction_updates,
        node_records = node,
        location_records = location,
        stream_records = stream,
        instructions = instructions.len(),
        "replay finished"
    );
    Ok(())
}

fn load_config(path: Option<&str>) -> Result<PipelineConfig, ReplayError> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| ReplayError::Io { path: path.to_string(), source: e })?;
    toml::from_str(&text).map_err(|e| ReplayError::Config { path: path.to_string(), source: e })
}

fn reader(input: &str) -> Result<Box<dyn BufRead>, ReplayError> {
    if input == "-" {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }
    let file = std::fs::File::open(input)
        .map_err(|e| ReplayError::Io { path: input.to_string(), source: e })?;
    Ok(Box::new(BufReader::new(file)))
}

fn parse_capture_line(line: &str, number: usize) -> Result<(&str, Vec<u8>), ReplayError> {
    let (topic, encoded) = line.split_once(' ').ok_or_else(|| ReplayError::Capture {
        line: number,
        message: "expected `topic <space> base64(payload)`".into(),
    })?;
    let payload = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| ReplayError::Capture { line: number, message: format!("bad base64: {e}") })?;
    Ok((topic, payload))
}
