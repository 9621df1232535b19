use ingest_api::Value;

/// The four wire message kinds. Closed set: both protocol generations are
/// already deployed, and exhaustive matching makes additions a
/// compile-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    NodeDatum,
    LocationDatum,
    StreamDatum,
    InstructionStatus,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::NodeDatum => f.write_str("node datum"),
            MessageKind::LocationDatum => f.write_str("location datum"),
            MessageKind::StreamDatum => f.write_str("stream datum"),
            MessageKind::InstructionStatus => f.write_str("instruction status"),
        }
    }
}

/// Classify one decoded tree by shape. Rules are evaluated in order; node
/// datum is the fallback, so a malformed tree surfaces as a mapping error
/// rather than a classification error.
///
/// The instruction-status rule accepts both the legacy explicitly-tagged
/// envelope (`__type__`) and the current implicit one: older producers
/// tagged the type, newer ones rely on shape alone. Both must decode
/// identically.
pub fn classify(tree: &Value) -> MessageKind {
    if tree.get("streamId").is_some() && has_positional_samples(tree) {
        return MessageKind::StreamDatum;
    }

    let tagged = tree.get("__type__").and_then(Value::as_str) == Some("InstructionStatus");
    let implicit = (tree.get("sourceId").is_none() || tree.get("created").is_none())
        && tree.get("instructionId").is_some()
        && tree.get("status").is_some();
    if tagged || implicit {
        return MessageKind::InstructionStatus;
    }

    if tree.get("locationId").is_some() {
        return MessageKind::LocationDatum;
    }

    MessageKind::NodeDatum
}

/// Parallel positional arrays rather than named sample maps: at least one
/// of the sample fields is an array, and none is a map.
fn has_positional_samples(tree: &Value) -> bool {
    let sections = ["i", "a", "s", "t"];
    let any_array = sections
        .iter()
        .any(|k| tree.get(k).is_some_and(Value::is_array));
    let any_map = ["i", "a", "s"]
        .iter()
        .any(|k| tree.get(k).is_some_and(Value::is_map));
    any_array && !any_map
}
