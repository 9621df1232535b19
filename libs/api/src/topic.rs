use crate::error::IngestError;

/// Subscription filter: one wildcard level for the node identifier.
pub const DATUM_TOPIC_FILTER: &str = "node/+/datum";

/// Concrete datum topic for one node.
pub fn datum_topic(node_id: i64) -> String {
    format!("node/{node_id}/datum")
}

/// Extract the node id from an inbound `node/{nodeId}/datum` topic.
pub fn node_id_from_topic(topic: &str) -> Result<i64, IngestError> {
    let mut parts = topic.split('/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("node"), Some(id), Some("datum"), None) => id
            .parse()
            .map_err(|_| IngestError::decode(format!("non-numeric node id in topic `{topic}`"))),
        _ => Err(IngestError::decode(format!("unrecognized topic `{topic}`"))),
    }
}
