use ingest_api::Value;

/// Reserved tag appended by current-generation producers. In-band version
/// flag: legacy devices cannot be changed, so the protocol generation is
/// carried inside the tag list rather than a dedicated envelope field.
pub const V2_TAG: &str = "_v2";

/// Protocol generation of one message. Detected per message, never per
/// connection: device fleets upgrade independently and a single pipeline
/// instance receives both generations interleaved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    Legacy,
    Current,
}

/// Normalize a classified datum tree in place:
///
/// 1. flatten the legacy `samples: { i, a, s, t }` wrapper to the top level;
/// 2. detect the generation via the sentinel tag and strip the sentinel,
///    preserving all other tags in their original relative order;
/// 3. for legacy messages, reinterpret every sample decimal's exponent as
///    `-|exponent|` — legacy producers encode the exponent's magnitude
///    only, and the true exponent is always non-positive.
///
/// Works on both named sample maps (node/location datum) and positional
/// arrays (stream datum).
pub fn normalize_datum(tree: &mut Value) -> Generation {
    flatten_samples(tree);
    let generation = strip_version_marker(tree);
    if generation == Generation::Legacy {
        force_negative_exponents(tree);
    }
    generation
}

/// Merge the legacy nesting wrapper into the top level. Current-generation
/// messages have no `samples` field and pass through untouched.
fn flatten_samples(tree: &mut Value) {
    let Value::Map(entries) = tree else { return };

    let Some(pos) = entries.iter().position(|(k, v)| k == "samples" && v.is_map()) else {
        return;
    };
    let (_, wrapper) = entries.remove(pos);
    if let Value::Map(inner) = wrapper {
        entries.extend(inner);
    }
}

/// Remove the sentinel from the tag list and report the generation.
fn strip_version_marker(tree: &mut Value) -> Generation {
    let Some(Value::Array(tags)) = tree.get_mut("t") else {
        return Generation::Legacy;
    };
    let before = tags.len();
    tags.retain(|tag| tag.as_str() != Some(V2_TAG));
    if tags.len() == before {
        Generation::Legacy
    } else {
        Generation::Current
    }
}

fn force_negative_exponents(tree: &mut Value) {
    for section in ["i", "a", "s"] {
        match tree.get_mut(section) {
            Some(Value::Map(entries)) => {
                for (_, v) in entries.iter_mut() {
                    fix_exponent(v);
                }
            }
            Some(Value::Array(items)) => {
                for v in items.iter_mut() {
                    fix_exponent(v);
                }
            }
            _ => {}
        }
    }
}

fn fix_exponent(v: &mut Value) {
    if let Value::Decimal(d) = v {
        d.exponent = -d.exponent.abs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_api::Decimal;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    fn tags(items: &[&str]) -> Value {
        Value::Array(items.iter().map(|s| Value::String(s.to_string())).collect())
    }

    #[test]
    fn flattens_legacy_wrapper() {
        let mut tree = map(vec![
            ("created", Value::Int(1)),
            ("sourceId", Value::String("s".into())),
            (
                "samples",
                map(vec![
                    ("i", map(vec![("watts", Value::Int(5))])),
                    ("t", tags(&["bar"])),
                ]),
            ),
        ]);
        normalize_datum(&mut tree);
        assert!(tree.get("samples").is_none());
        assert_eq!(tree.get("i").and_then(|i| i.get("watts")), Some(&Value::Int(5)));
        assert_eq!(tree.get("t"), Some(&tags(&["bar"])));
    }

    #[test]
    fn sentinel_detected_and_stripped_others_preserved() {
        let mut tree = map(vec![("t", tags(&["_v2", "bar", "baz"]))]);
        assert_eq!(normalize_datum(&mut tree), Generation::Current);
        assert_eq!(tree.get("t"), Some(&tags(&["bar", "baz"])));
    }

    #[test]
    fn missing_or_plain_tags_mean_legacy() {
        let mut no_tags = map(vec![("created", Value::Int(1))]);
        assert_eq!(normalize_datum(&mut no_tags), Generation::Legacy);

        let mut plain = map(vec![("t", tags(&["bar"]))]);
        assert_eq!(normalize_datum(&mut plain), Generation::Legacy);
        assert_eq!(plain.get("t"), Some(&tags(&["bar"])));
    }

    #[test]
    fn legacy_exponent_magnitude_becomes_negative() {
        let mut tree = map(vec![(
            "i",
            map(vec![
                ("a", Value::Decimal(Decimal::new(282683, 3))),
                ("b", Value::Decimal(Decimal::new(5, -2))),
            ]),
        )]);
        assert_eq!(normalize_datum(&mut tree), Generation::Legacy);
        assert_eq!(tree.get("i").and_then(|i| i.get("a")), Some(&Value::Decimal(Decimal::new(282683, -3))));
        // Already-negative exponents are left as negative.
        assert_eq!(tree.get("i").and_then(|i| i.get("b")), Some(&Value::Decimal(Decimal::new(5, -2))));
    }

    #[test]
    fn current_exponents_used_as_encoded() {
        let mut tree = map(vec![
            ("i", map(vec![("a", Value::Decimal(Decimal::new(15, 2)))])),
            ("t", tags(&["_v2"])),
        ]);
        assert_eq!(normalize_datum(&mut tree), Generation::Current);
        assert_eq!(tree.get("i").and_then(|i| i.get("a")), Some(&Value::Decimal(Decimal::new(15, 2))));
    }

    #[test]
    fn stream_arrays_get_the_same_exponent_rule() {
        let mut tree = map(vec![(
            "i",
            Value::Array(vec![Value::Decimal(Decimal::new(282683, 3)), Value::Null]),
        )]);
        normalize_datum(&mut tree);
        assert_eq!(
            tree.get("i").and_then(Value::as_array).map(|a| a[0].clone()),
            Some(Value::Decimal(Decimal::new(282683, -3)))
        );
    }
}
