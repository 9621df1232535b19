//! Compact binary (CBOR) payload codec.
//!
//! Decimals travel as tag-4 `[exponent, mantissa]` pairs, never as binary
//! floats, so telemetry values keep exact precision. The exponent is
//! decoded exactly as encoded here; the legacy sign defect is a protocol
//! concern and is corrected by the version normalizer.

use ciborium::value::{Integer, Value as Cbor};

use ingest_api::{Decimal, IngestError, PayloadCodec, PayloadEncoding, Value};

/// CBOR tag for a decimal fraction (RFC 8949 §3.4.4).
const TAG_DECIMAL_FRACTION: u64 = 4;
/// Standard date/time tags; the inner value carries the timestamp.
const TAG_DATETIME_STRING: u64 = 0;
const TAG_DATETIME_EPOCH: u64 = 1;

pub struct CborCodec;

impl PayloadCodec for CborCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Value, IngestError> {
        let cbor: Cbor = ciborium::de::from_reader(bytes)
            .map_err(|e| IngestError::decode(format!("cbor: {e}")))?;
        cbor_to_value(&cbor)
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, IngestError> {
        let cbor = value_to_cbor(value)?;
        let mut buf = Vec::new();
        ciborium::ser::into_writer(&cbor, &mut buf)
            .map_err(|e| IngestError::decode(format!("cbor: {e}")))?;
        Ok(buf)
    }

    fn encoding(&self) -> PayloadEncoding {
        PayloadEncoding::Cbor
    }
}

fn cbor_to_value(cbor: &Cbor) -> Result<Value, IngestError> {
    Ok(match cbor {
        Cbor::Null => Value::Null,
        Cbor::Bool(b) => Value::Bool(*b),
        Cbor::Integer(n) => integer_to_value(i128::from(*n)),
        Cbor::Float(f) => decimal_from_float(*f)?,
        Cbor::Text(s) => Value::String(s.clone()),
        Cbor::Array(items) => {
            Value::Array(items.iter().map(cbor_to_value).collect::<Result<_, _>>()?)
        }
        Cbor::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| {
                    let key = match k {
                        Cbor::Text(s) => s.clone(),
                        other => {
                            return Err(IngestError::decode(format!(
                                "non-text map key: {other:?}"
                            )));
                        }
                    };
                    Ok((key, cbor_to_value(v)?))
                })
                .collect::<Result<_, IngestError>>()?,
        ),
        Cbor::Tag(TAG_DECIMAL_FRACTION, inner) => decimal_fraction(inner)?,
        // Date/time and unknown tags: the inner value carries the data.
        Cbor::Tag(TAG_DATETIME_STRING | TAG_DATETIME_EPOCH, inner) => cbor_to_value(inner)?,
        Cbor::Tag(_, inner) => cbor_to_value(inner)?,
        Cbor::Bytes(_) => {
            return Err(IngestError::decode("byte-string fields are not supported"));
        }
        other => return Err(IngestError::decode(format!("unsupported cbor item: {other:?}"))),
    })
}

fn integer_to_value(n: i128) -> Value {
    match i64::try_from(n) {
        Ok(i) => Value::Int(i),
        Err(_) => Value::Decimal(Decimal::new(n, 0)),
    }
}

/// Tag-4 payload: a two-element array `[exponent, mantissa]`.
fn decimal_fraction(inner: &Cbor) -> Result<Value, IngestError> {
    let parts = match inner {
        Cbor::Array(parts) if parts.len() == 2 => parts,
        _ => return Err(IngestError::decode("decimal fraction is not a pair")),
    };
    let exponent = match &parts[0] {
        Cbor::Integer(n) => i32::try_from(i128::from(*n))
            .map_err(|_| IngestError::decode("decimal exponent out of range"))?,
        _ => return Err(IngestError::decode("decimal exponent is not an integer")),
    };
    let mantissa = match &parts[1] {
        Cbor::Integer(n) => i128::from(*n),
        _ => return Err(IngestError::decode("decimal mantissa is not an integer")),
    };
    Ok(Value::Decimal(Decimal::new(mantissa, exponent)))
}

/// Floats only appear when a producer skipped the decimal encoding; go
/// through the shortest round-trip literal rather than binary digits.
fn decimal_from_float(f: f64) -> Result<Value, IngestError> {
    if !f.is_finite() {
        return Err(IngestError::decode(format!("non-finite number: {f}")));
    }
    Ok(Value::Decimal(Decimal::parse_str(&format!("{f}"))?))
}

fn value_to_cbor(value: &Value) -> Result<Cbor, IngestError> {
    Ok(match value {
        Value::Null => Cbor::Null,
        Value::Bool(b) => Cbor::Bool(*b),
        Value::Int(i) => Cbor::Integer((*i).into()),
        Value::Decimal(d) => Cbor::Tag(
            TAG_DECIMAL_FRACTION,
            Box::new(Cbor::Array(vec![
                Cbor::Integer(d.exponent.into()),
                Cbor::Integer(
                    Integer::try_from(d.mantissa)
                        .map_err(|_| IngestError::decode("decimal mantissa out of cbor range"))?,
                ),
            ])),
        ),
        Value::String(s) => Cbor::Text(s.clone()),
        Value::Array(items) => {
            Cbor::Array(items.iter().map(value_to_cbor).collect::<Result<_, _>>()?)
        }
        Value::Map(entries) => Cbor::Map(
            entries
                .iter()
                .map(|(k, v)| Ok((Cbor::Text(k.clone()), value_to_cbor(v)?)))
                .collect::<Result<_, IngestError>>()?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_api::ErrorKind;

    fn bytes_of(cbor: &Cbor) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(cbor, &mut buf).unwrap();
        buf
    }

    #[test]
    fn decodes_decimal_fraction_exactly() {
        let wire = bytes_of(&Cbor::Tag(
            4,
            Box::new(Cbor::Array(vec![
                Cbor::Integer((-3).into()),
                Cbor::Integer(282683.into()),
            ])),
        ));
        let value = CborCodec.decode(&wire).unwrap();
        assert_eq!(value, Value::Decimal(Decimal::new(282683, -3)));
    }

    #[test]
    fn rejects_malformed_decimal_fraction() {
        let wire = bytes_of(&Cbor::Tag(4, Box::new(Cbor::Array(vec![Cbor::Integer(1.into())]))));
        assert_eq!(CborCodec.decode(&wire).unwrap_err().kind(), ErrorKind::Decode);
    }

    #[test]
    fn truncated_input_is_a_decode_error() {
        let mut wire = bytes_of(&Cbor::Text("hello".into()));
        wire.truncate(wire.len() - 2);
        assert_eq!(CborCodec.decode(&wire).unwrap_err().kind(), ErrorKind::Decode);
    }

    #[test]
    fn round_trips_a_datum_tree() {
        let tree = Value::Map(vec![
            ("created".into(), Value::Int(1000)),
            ("sourceId".into(), Value::String("m".into())),
            (
                "i".into(),
                Value::Map(vec![("w".into(), Value::Decimal(Decimal::new(15, -1)))]),
            ),
            (
                "t".into(),
                Value::Array(vec![Value::String("_v2".into()), Value::String("b".into())]),
            ),
        ]);
        let wire = CborCodec.encode(&tree).unwrap();
        assert_eq!(CborCodec.decode(&wire).unwrap(), tree);
    }
}
