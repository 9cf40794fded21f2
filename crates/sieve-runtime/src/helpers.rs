//! Value helpers used by compiled routines: type checks, copies of
//! unknown properties and output slot writes.

use serde_json::{Map, Value};

pub fn exists(value: Option<&Value>) -> bool {
    value.is_some_and(|v| !v.is_null())
}

pub fn is_object(value: Option<&Value>) -> bool {
    value.is_some_and(Value::is_object)
}

pub fn is_array(value: Option<&Value>) -> bool {
    value.is_some_and(Value::is_array)
}

/// Deep copy of `source` without the keys in `ignore`.
pub fn copy_properties(source: &Map<String, Value>, ignore: &[String]) -> Map<String, Value> {
    source
        .iter()
        .filter(|(key, _)| !ignore.iter().any(|name| name == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

pub fn copy_elements(source: &[Value]) -> Vec<Value> {
    source.to_vec()
}

/// Where a field's output goes inside its parent's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'k> {
    Root,
    Key(&'k str),
    Index(usize),
}

/// Write `value` into `out` at `slot`.
///
/// Array writes past the end pad with `null`. Writes into an output that
/// is not the matching container kind are ignored.
pub fn write_output(out: &mut Option<Value>, slot: Slot<'_>, value: Value) {
    match slot {
        Slot::Root => *out = Some(value),
        Slot::Key(key) => {
            if let Some(Value::Object(map)) = out {
                map.insert(key.to_string(), value);
            }
        }
        Slot::Index(index) => {
            if let Some(Value::Array(items)) = out {
                if index < items.len() {
                    items[index] = value;
                } else {
                    items.resize(index, Value::Null);
                    items.push(value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_guards() {
        assert!(!exists(None));
        assert!(!exists(Some(&Value::Null)));
        assert!(exists(Some(&json!(0))));
        assert!(is_object(Some(&json!({}))));
        assert!(!is_object(Some(&json!([]))));
        assert!(is_array(Some(&json!([]))));
        assert!(!is_array(None));
    }

    #[test]
    fn test_copy_properties_skips_declared() {
        let source = json!({ "a": 1, "b": { "c": 2 }, "d": 3 });
        let copy = copy_properties(source.as_object().unwrap(), &["a".to_string(), "d".to_string()]);
        assert_eq!(Value::Object(copy), json!({ "b": { "c": 2 } }));
    }

    #[test]
    fn test_write_output_pads_arrays() {
        let mut out = Some(json!([]));
        write_output(&mut out, Slot::Index(2), json!("c"));
        write_output(&mut out, Slot::Index(0), json!("a"));
        assert_eq!(out, Some(json!(["a", null, "c"])));
    }

    #[test]
    fn test_write_output_keys_and_root() {
        let mut out = Some(json!({}));
        write_output(&mut out, Slot::Key("name"), json!("virk"));
        assert_eq!(out, Some(json!({ "name": "virk" })));

        let mut root = None;
        write_output(&mut root, Slot::Root, json!(1));
        assert_eq!(root, Some(json!(1)));

        let mut scalar = Some(json!(1));
        write_output(&mut scalar, Slot::Key("x"), json!(2));
        assert_eq!(scalar, Some(json!(1)));
    }
}
