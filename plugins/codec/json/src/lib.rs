//! Textual (JSON) payload codec.
//!
//! serde_json runs with `arbitrary_precision`, so number literals arrive
//! as text and convert straight to exact decimals — a value like
//! `282.683` never passes through an `f64`.

use std::str::FromStr;

use ingest_api::{Decimal, IngestError, PayloadCodec, PayloadEncoding, Value};

pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Value, IngestError> {
        let json: serde_json::Value = serde_json::from_slice(bytes)?;
        json_to_value(&json)
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, IngestError> {
        Ok(serde_json::to_vec(&value_to_json(value)?)?)
    }

    fn encoding(&self) -> PayloadEncoding {
        PayloadEncoding::Json
    }
}

fn json_to_value(json: &serde_json::Value) -> Result<Value, IngestError> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => number_to_value(n)?,
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => {
            Value::Array(items.iter().map(json_to_value).collect::<Result<_, _>>()?)
        }
        serde_json::Value::Object(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), json_to_value(v)?)))
                .collect::<Result<_, IngestError>>()?,
        ),
    })
}

/// Integer literals become `Int`; anything with a fraction or exponent
/// becomes an exact `Decimal` parsed from the literal text.
fn number_to_value(n: &serde_json::Number) -> Result<Value, IngestError> {
    let literal = n.to_string();
    if literal.contains(['.', 'e', 'E']) {
        return Ok(Value::Decimal(Decimal::parse_str(&literal)?));
    }
    match literal.parse::<i64>() {
        Ok(i) => Ok(Value::Int(i)),
        Err(_) => Ok(Value::Decimal(Decimal::parse_str(&literal)?)),
    }
}

fn value_to_json(value: &Value) -> Result<serde_json::Value, IngestError> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Decimal(d) => {
            let n = serde_json::Number::from_str(&d.to_string())
                .map_err(|e| IngestError::decode(format!("unencodable decimal: {e}")))?;
            serde_json::Value::Number(n)
        }
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Array(items) => serde_json::Value::Array(
            items.iter().map(value_to_json).collect::<Result<_, _>>()?,
        ),
        Value::Map(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), value_to_json(v)?)))
                .collect::<Result<_, IngestError>>()?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_api::ErrorKind;

    #[test]
    fn decodes_number_literals_exactly() {
        let tree = JsonCodec.decode(br#"{"i":{"watts":282.683,"amps":3}}"#).unwrap();
        let section = tree.get("i").unwrap();
        assert_eq!(
            section.get("watts"),
            Some(&Value::Decimal(Decimal::new(282683, -3)))
        );
        assert_eq!(section.get("amps"), Some(&Value::Int(3)));
    }

    #[test]
    fn decodes_scientific_and_oversized_literals_as_decimals() {
        let tree = JsonCodec.decode(br#"[1e-7, 99999999999999999999]"#).unwrap();
        let items = tree.as_array().unwrap();
        assert_eq!(items[0], Value::Decimal(Decimal::new(1, -7)));
        assert_eq!(
            items[1],
            Value::Decimal(Decimal::new(99_999_999_999_999_999_999, 0))
        );
    }

    #[test]
    fn malformed_bytes_are_decode_errors() {
        let err = JsonCodec.decode(b"{not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn round_trips_a_datum_tree() {
        let bytes = br#"{"created":1000,"sourceId":"m","i":{"w":1.5},"t":["a","b"]}"#;
        let tree = JsonCodec.decode(bytes).unwrap();
        let encoded = JsonCodec.encode(&tree).unwrap();
        assert_eq!(JsonCodec.decode(&encoded).unwrap(), tree);
    }
}
