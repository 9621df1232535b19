use crate::decimal::Decimal;

/// Generic decoded payload tree, independent of the wire encoding.
///
/// Both codecs produce this shape; the classifier, normalizer and mapper
/// only ever see `Value`, never codec-native types. Numbers keep exact
/// precision: integers as `Int`, everything else as [`Decimal`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    String(String),
    Array(Vec<Value>),
    /// Entries in wire order. Key lookup is linear; trees are small.
    Map(Vec<(String, Value)>),
}

impl Value {
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self {
            Value::Map(entries) => entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Remove and return a map entry.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        match self {
            Value::Map(entries) => entries
                .iter()
                .position(|(k, _)| k == key)
                .map(|pos| entries.remove(pos).1),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Exact integer view: `Int` directly, `Decimal` when it converts
    /// without loss.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Decimal(d) => d.to_i64(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Decimal(d) => serializer.collect_str(d),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => items.serialize(serializer),
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Value {
        Value::Map(vec![
            ("sourceId".into(), Value::String("m1".into())),
            ("created".into(), Value::Int(1000)),
        ])
    }

    #[test]
    fn map_accessors() {
        let mut v = tree();
        assert_eq!(v.get("sourceId").and_then(Value::as_str), Some("m1"));
        assert_eq!(v.get("created").and_then(Value::as_i64), Some(1000));
        assert!(v.get("missing").is_none());

        assert_eq!(v.remove("created"), Some(Value::Int(1000)));
        assert!(v.get("created").is_none());
    }

    #[test]
    fn decimal_as_i64_is_exact_only() {
        assert_eq!(Value::Decimal(Decimal::new(15, 2)).as_i64(), Some(1500));
        assert_eq!(Value::Decimal(Decimal::new(15, -1)).as_i64(), None);
    }
}
