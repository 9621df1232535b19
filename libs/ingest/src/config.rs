use serde::{Deserialize, Serialize};

use ingest_api::PayloadEncoding;

/// What to do with a payload that can never decode. "At least once"
/// delivery leaves this genuinely open: acknowledging drops the message
/// permanently, requeueing makes the broker redeliver it forever. It is a
/// deployment decision, so it is configuration rather than an assumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Log, count, report success to the adapter so the message is
    /// acknowledged and dropped. The default: retrying a syntactically
    /// invalid payload can never succeed and would stall the pipeline.
    #[default]
    Acknowledge,
    /// Propagate the decode error so the adapter leaves the message
    /// unacknowledged and the broker redelivers it.
    Requeue,
}

/// Pipeline construction config, loadable from TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct PipelineConfig {
    /// Wire encoding, fixed for the lifetime of the pipeline instance.
    #[serde(default)]
    pub encoding: PayloadEncoding,
    #[serde(default)]
    pub malformed: MalformedPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config: PipelineConfig = toml::from_str("").unwrap();
        assert_eq!(config.encoding, PayloadEncoding::Json);
        assert_eq!(config.malformed, MalformedPolicy::Acknowledge);
    }

    #[test]
    fn parses_full_config() {
        let config: PipelineConfig =
            toml::from_str("encoding = \"cbor\"\nmalformed = \"requeue\"\n").unwrap();
        assert_eq!(config.encoding, PayloadEncoding::Cbor);
        assert_eq!(config.malformed, MalformedPolicy::Requeue);
    }
}
