//! Pure construction of canonical records from normalized trees.
//!
//! Any required field missing or mistyped is an `ErrorKind::Decode`
//! failure; a record is never partially populated.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};

use ingest_api::{
    Decimal, IngestError, InstructionStatusUpdate, LocationDatum, NodeDatum, SampleSet,
    SampleValue, StreamDatum, Value,
};

pub fn map_node_datum(node_id: i64, tree: &Value) -> Result<NodeDatum, IngestError> {
    Ok(NodeDatum {
        node_id,
        source_id: required_str(tree, "sourceId")?.to_string(),
        created: parse_created(required(tree, "created")?)?,
        instantaneous: sample_set(tree, "i")?,
        accumulating: sample_set(tree, "a")?,
        status: sample_set(tree, "s")?,
        tags: tag_list(tree)?,
    })
}

pub fn map_location_datum(tree: &Value) -> Result<LocationDatum, IngestError> {
    let location_id = required(tree, "locationId")?
        .as_i64()
        .ok_or_else(|| IngestError::decode("`locationId` is not an integer"))?;
    Ok(LocationDatum {
        location_id,
        source_id: required_str(tree, "sourceId")?.to_string(),
        created: parse_created(required(tree, "created")?)?,
        instantaneous: sample_set(tree, "i")?,
        accumulating: sample_set(tree, "a")?,
        status: sample_set(tree, "s")?,
        tags: tag_list(tree)?,
    })
}

pub fn map_stream_datum(tree: &Value) -> Result<StreamDatum, IngestError> {
    Ok(StreamDatum {
        stream_id: required_str(tree, "streamId")?.to_string(),
        created: parse_created(required(tree, "created")?)?,
        instantaneous: decimal_array(tree, "i")?,
        accumulating: decimal_array(tree, "a")?,
        status: status_array(tree)?,
        tags: tag_list(tree)?,
    })
}

/// `node_id` comes from the topic; the payload's own `id`/`topic` fields
/// are device-local and ignored.
pub fn map_instruction_status(
    node_id: i64,
    tree: &Value,
) -> Result<InstructionStatusUpdate, IngestError> {
    let instruction_id = match required(tree, "instructionId")? {
        Value::Int(i) => *i,
        Value::Decimal(d) => d
            .to_i64()
            .ok_or_else(|| IngestError::decode("`instructionId` is not an integer"))?,
        Value::String(s) => s
            .parse()
            .map_err(|_| IngestError::decode("`instructionId` is not an integer"))?,
        _ => return Err(IngestError::decode("`instructionId` is not an integer")),
    };

    let state = required_str(tree, "status")?.parse()?;

    let result_parameters: BTreeMap<String, Value> = match tree.get("resultParameters") {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(Value::Map(entries)) => entries.iter().cloned().collect(),
        Some(_) => return Err(IngestError::decode("`resultParameters` is not a map")),
    };

    Ok(InstructionStatusUpdate { instruction_id, node_id, state, result_parameters })
}

fn required<'a>(tree: &'a Value, field: &str) -> Result<&'a Value, IngestError> {
    tree.get(field)
        .ok_or_else(|| IngestError::decode(format!("missing required field `{field}`")))
}

fn required_str<'a>(tree: &'a Value, field: &str) -> Result<&'a str, IngestError> {
    required(tree, field)?
        .as_str()
        .ok_or_else(|| IngestError::decode(format!("`{field}` is not a string")))
}

/// Timestamps arrive as epoch-millis integers (legacy), exact decimals, or
/// ISO-8601 strings (current).
fn parse_created(value: &Value) -> Result<DateTime<Utc>, IngestError> {
    let millis = |ms: i64| {
        Utc.timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| IngestError::decode(format!("epoch millis out of range: {ms}")))
    };
    match value {
        Value::Int(ms) => millis(*ms),
        Value::Decimal(d) => {
            let ms = d
                .to_i64()
                .ok_or_else(|| IngestError::decode("fractional epoch millis timestamp"))?;
            millis(ms)
        }
        Value::String(s) => parse_iso_timestamp(s),
        _ => Err(IngestError::decode("`created` is neither epoch millis nor a timestamp string")),
    }
}

fn parse_iso_timestamp(s: &str) -> Result<DateTime<Utc>, IngestError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Some producers use a space separator and an implied UTC offset.
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| IngestError::decode(format!("unparseable timestamp `{s}`")))
}

/// A named sample section (`i`/`a`/`s`). Absent sections map to an empty
/// set; null-valued properties are skipped.
fn sample_set(tree: &Value, section: &str) -> Result<SampleSet, IngestError> {
    let mut set = SampleSet::new();
    let Some(value) = tree.get(section) else {
        return Ok(set);
    };
    let entries = value
        .as_map()
        .ok_or_else(|| IngestError::decode(format!("sample section `{section}` is not a map")))?;
    for (name, v) in entries {
        let sample = match v {
            Value::Decimal(d) => SampleValue::Decimal(*d),
            Value::Int(i) => SampleValue::Decimal(Decimal::from_int(*i)),
            Value::String(s) => SampleValue::Text(s.clone()),
            Value::Bool(b) => SampleValue::Text(b.to_string()),
            Value::Null => continue,
            _ => {
                return Err(IngestError::decode(format!(
                    "unsupported sample value for `{name}` in `{section}`"
                )));
            }
        };
        set.insert(name.clone(), sample);
    }
    Ok(set)
}

fn decimal_array(tree: &Value, section: &str) -> Result<Vec<Option<Decimal>>, IngestError> {
    let Some(value) = tree.get(section) else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| IngestError::decode(format!("stream section `{section}` is not an array")))?;
    items
        .iter()
        .map(|v| match v {
            Value::Null => Ok(None),
            Value::Decimal(d) => Ok(Some(*d)),
            Value::Int(i) => Ok(Some(Decimal::from_int(*i))),
            _ => Err(IngestError::decode(format!(
                "non-numeric value in stream section `{section}`"
            ))),
        })
        .collect()
}

fn status_array(tree: &Value) -> Result<Vec<Option<String>>, IngestError> {
    let Some(value) = tree.get("s") else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| IngestError::decode("stream section `s` is not an array"))?;
    items
        .iter()
        .map(|v| match v {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            Value::Int(i) => Ok(Some(i.to_string())),
            Value::Decimal(d) => Ok(Some(d.to_string())),
            _ => Err(IngestError::decode("unsupported value in stream section `s`")),
        })
        .collect()
}

fn tag_list(tree: &Value) -> Result<Vec<String>, IngestError> {
    let Some(value) = tree.get("t") else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| IngestError::decode("tag list `t` is not an array"))?;
    items
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| IngestError::decode("non-string tag"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_api::ErrorKind;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    fn base_node() -> Value {
        map(vec![
            ("created", Value::Int(1_714_764_000_000)),
            ("sourceId", Value::String("meter/1".into())),
            (
                "i",
                map(vec![
                    ("watts", Value::Decimal(Decimal::new(282683, -3))),
                    ("amps", Value::Int(3)),
                ]),
            ),
            ("s", map(vec![("state", Value::String("on".into()))])),
            (
                "t",
                Value::Array(vec![Value::String("bar".into()), Value::String("baz".into())]),
            ),
        ])
    }

    #[test]
    fn maps_full_node_datum() {
        let datum = map_node_datum(99, &base_node()).unwrap();
        assert_eq!(datum.node_id, 99);
        assert_eq!(datum.source_id, "meter/1");
        assert_eq!(datum.created.timestamp_millis(), 1_714_764_000_000);
        assert_eq!(
            datum.instantaneous.get("watts"),
            Some(&SampleValue::Decimal(Decimal::new(282683, -3)))
        );
        assert_eq!(
            datum.instantaneous.get("amps"),
            Some(&SampleValue::Decimal(Decimal::from_int(3)))
        );
        assert_eq!(datum.status.get("state"), Some(&SampleValue::Text("on".into())));
        assert_eq!(datum.tags, vec!["bar".to_string(), "baz".to_string()]);
        assert!(datum.accumulating.is_empty());
    }

    #[test]
    fn missing_required_fields_are_decode_errors() {
        let mut no_source = base_node();
        no_source.remove("sourceId");
        assert_eq!(map_node_datum(1, &no_source).unwrap_err().kind(), ErrorKind::Decode);

        let mut no_created = base_node();
        no_created.remove("created");
        assert_eq!(map_node_datum(1, &no_created).unwrap_err().kind(), ErrorKind::Decode);
    }

    #[test]
    fn created_accepts_all_three_wire_forms() {
        let from_int = parse_created(&Value::Int(1_714_764_000_000)).unwrap();
        let from_dec = parse_created(&Value::Decimal(Decimal::new(1_714_764_000, 3))).unwrap();
        let from_iso = parse_created(&Value::String("2024-05-03T19:20:00Z".into())).unwrap();
        let from_spaced = parse_created(&Value::String("2024-05-03 19:20:00.000".into())).unwrap();
        assert_eq!(from_int, from_dec);
        assert_eq!(from_int, from_iso);
        assert_eq!(from_int, from_spaced);
    }

    #[test]
    fn location_datum_requires_location_id() {
        let mut tree = base_node();
        assert!(map_location_datum(&tree).is_err());
        if let Value::Map(entries) = &mut tree {
            entries.push(("locationId".into(), Value::Int(12)));
        }
        let datum = map_location_datum(&tree).unwrap();
        assert_eq!(datum.location_id, 12);
        assert_eq!(datum.source_id, "meter/1");
    }

    #[test]
    fn maps_stream_datum_with_nulls() {
        let tree = map(vec![
            ("streamId", Value::String("7f0c".into())),
            ("created", Value::Int(1000)),
            (
                "i",
                Value::Array(vec![
                    Value::Decimal(Decimal::new(15, -1)),
                    Value::Null,
                    Value::Int(3),
                ]),
            ),
            ("s", Value::Array(vec![Value::String("ok".into()), Value::Null])),
        ]);
        let datum = map_stream_datum(&tree).unwrap();
        assert_eq!(datum.stream_id, "7f0c");
        assert_eq!(
            datum.instantaneous,
            vec![Some(Decimal::new(15, -1)), None, Some(Decimal::from_int(3))]
        );
        assert_eq!(datum.status, vec![Some("ok".to_string()), None]);
        assert!(datum.accumulating.is_empty());
    }

    #[test]
    fn instruction_node_id_comes_from_caller_not_payload() {
        let tree = map(vec![
            ("__type__", Value::String("InstructionStatus".into())),
            ("id", Value::Int(555)),
            ("nodeId", Value::Int(1)),
            ("instructionId", Value::Int(42)),
            ("topic", Value::String("node/1/datum".into())),
            ("status", Value::String("Declined".into())),
        ]);
        let update = map_instruction_status(9, &tree).unwrap();
        assert_eq!(update.node_id, 9);
        assert_eq!(update.instruction_id, 42);
        assert_eq!(update.state, ingest_api::InstructionState::Declined);
        assert!(update.result_parameters.is_empty());
    }

    #[test]
    fn unknown_instruction_state_is_rejected() {
        let tree = map(vec![
            ("instructionId", Value::Int(42)),
            ("status", Value::String("Vaporized".into())),
        ]);
        assert_eq!(map_instruction_status(1, &tree).unwrap_err().kind(), ErrorKind::Decode);
    }
}
