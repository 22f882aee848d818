//! Update-document evaluation for the in-memory backend.
//!
//! Follows the document database's rules: every top-level key must be an
//! operator, each operator takes an object of `field: argument` pairs, and
//! the whole update is validated and applied to a copy so a refused update
//! never leaves a half-modified document behind. Dotted field names address
//! nested objects.
//!
//! Supported operators: `$set`, `$unset`, `$inc`, `$push`, `$rename`.

use serde_json::{Map, Number, Value};

use crate::error::StoreError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Op {
    Set,
    Unset,
    Inc,
    Push,
    Rename,
}

impl Op {
    fn parse(key: &str) -> Result<Self, StoreError> {
        match key {
            "$set"    => Ok(Self::Set),
            "$unset"  => Ok(Self::Unset),
            "$inc"    => Ok(Self::Inc),
            "$push"   => Ok(Self::Push),
            "$rename" => Ok(Self::Rename),
            _ => Err(reject(format!(
                "Unknown modifier: {key}. Expected a valid update modifier or pipeline-style update specified as an array"
            ))),
        }
    }
}

fn reject(msg: impl Into<String>) -> StoreError {
    StoreError::UpdateRejected(msg.into())
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Applies `update` to `doc` and returns the new document.
pub(crate) fn apply(doc: &Map<String, Value>, update: &Map<String, Value>) -> Result<Map<String, Value>, StoreError> {
    if update.is_empty() {
        return Err(reject("update document must have at least one element"));
    }

    let mut ops = Vec::with_capacity(update.len());
    for (key, args) in update {
        if !key.starts_with('$') {
            return Err(reject("update document must contain key beginning with '$'"));
        }
        let op = Op::parse(key)?;
        let Value::Object(args) = args else {
            return Err(reject(format!(
                "Modifiers operate on fields but we found type {} instead. For example: {{$mod: {{<field>: ...}}}} not {{{key}: ...}}",
                type_name(args)
            )));
        };
        ops.push((op, args));
    }

    check_conflicts(&ops)?;

    let mut out = doc.clone();
    for (op, args) in ops {
        for (field, arg) in args {
            match op {
                Op::Set => set(&mut out, field, arg.clone())?,
                Op::Unset => {
                    unset(&mut out, field);
                }
                Op::Inc => inc(&mut out, field, arg)?,
                Op::Push => push(&mut out, field, arg.clone())?,
                Op::Rename => rename(&mut out, field, arg)?,
            }
        }
    }
    Ok(out)
}

/// Two operators may not touch the same field, or a field and its parent.
fn check_conflicts(ops: &[(Op, &Map<String, Value>)]) -> Result<(), StoreError> {
    let mut targets: Vec<&str> = Vec::new();
    for (op, args) in ops {
        for (field, arg) in args.iter() {
            targets.push(field);
            if *op == Op::Rename {
                if let Some(to) = arg.as_str() {
                    targets.push(to);
                }
            }
        }
    }
    for (i, a) in targets.iter().enumerate() {
        for b in &targets[i + 1..] {
            if overlaps(a, b) {
                return Err(reject(format!("Updating the path '{b}' would create a conflict at '{a}'")));
            }
        }
    }
    Ok(())
}

fn overlaps(a: &str, b: &str) -> bool {
    let prefix_of = |short: &str, long: &str| long.len() > short.len() && long.starts_with(short) && long.as_bytes()[short.len()] == b'.';
    a == b || prefix_of(a, b) || prefix_of(b, a)
}

/// Walks to the object holding the last segment of `field`, creating
/// intermediate objects on the way.
fn parent_mut<'a>(doc: &'a mut Map<String, Value>, field: &'a str) -> Result<(&'a mut Map<String, Value>, &'a str), StoreError> {
    if field.is_empty() || field.split('.').any(str::is_empty) {
        return Err(reject(format!("An empty update path is not valid: '{field}'")));
    }
    let mut segments = field.split('.');
    let mut last = segments.next().unwrap_or(field);
    let mut cur = doc;
    for next in segments {
        let slot = cur.entry(last.to_owned()).or_insert_with(|| Value::Object(Map::new()));
        cur = match slot {
            Value::Object(m) => m,
            other => {
                return Err(reject(format!(
                    "Cannot create field '{next}' in element {{{last}: {other}}}"
                )));
            }
        };
        last = next;
    }
    Ok((cur, last))
}

fn lookup<'a>(doc: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    let mut segments = field.split('.');
    let mut cur = doc.get(segments.next()?)?;
    for seg in segments {
        cur = cur.as_object()?.get(seg)?;
    }
    Some(cur)
}

fn set(doc: &mut Map<String, Value>, field: &str, value: Value) -> Result<(), StoreError> {
    let (parent, key) = parent_mut(doc, field)?;
    parent.insert(key.to_owned(), value);
    Ok(())
}

fn unset(doc: &mut Map<String, Value>, field: &str) -> Option<Value> {
    match field.rsplit_once('.') {
        None => doc.remove(field),
        Some((head, key)) => {
            let mut cur = doc;
            for seg in head.split('.') {
                cur = cur.get_mut(seg)?.as_object_mut()?;
            }
            cur.remove(key)
        }
    }
}

fn inc(doc: &mut Map<String, Value>, field: &str, by: &Value) -> Result<(), StoreError> {
    let Value::Number(by) = by else {
        return Err(reject(format!("Cannot increment with non-numeric argument: {{{field}: {by}}}")));
    };
    let (parent, key) = parent_mut(doc, field)?;
    let next = match parent.get(key) {
        None => Value::Number(by.clone()),
        Some(Value::Number(cur)) => Value::Number(add(cur, by).ok_or_else(|| {
            reject(format!("Failed to apply $inc operations to current value ({cur}) for field '{field}': result out of range"))
        })?),
        Some(other) => {
            return Err(reject(format!(
                "Cannot apply $inc to a value of non-numeric type. The field '{field}' is of non-numeric type {}",
                type_name(other)
            )));
        }
    };
    parent.insert(key.to_owned(), next);
    Ok(())
}

fn add(a: &Number, b: &Number) -> Option<Number> {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x.checked_add(y).map(Number::from),
        _ => Number::from_f64(a.as_f64()? + b.as_f64()?),
    }
}

fn push(doc: &mut Map<String, Value>, field: &str, value: Value) -> Result<(), StoreError> {
    let (parent, key) = parent_mut(doc, field)?;
    match parent.get_mut(key) {
        None => {
            parent.insert(key.to_owned(), Value::Array(vec![value]));
            Ok(())
        }
        Some(Value::Array(items)) => {
            items.push(value);
            Ok(())
        }
        Some(other) => Err(reject(format!(
            "The field '{field}' must be an array but is of type {}",
            type_name(other)
        ))),
    }
}

fn rename(doc: &mut Map<String, Value>, field: &str, to: &Value) -> Result<(), StoreError> {
    let Value::String(to) = to else {
        return Err(reject(format!("The 'to' field for $rename must be a string: {field}: {to}")));
    };
    if lookup(doc, field).is_none() {
        return Ok(());
    }
    if let Some(value) = unset(doc, field) {
        set(doc, to, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    fn run(doc: Value, update: Value) -> Result<Value, StoreError> {
        apply(&obj(doc), &obj(update)).map(Value::Object)
    }

    fn rejected(doc: Value, update: Value) -> String {
        match run(doc, update) {
            Err(StoreError::UpdateRejected(msg)) => msg,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn set_merges_fields() {
        let out = run(json!({"a": 1, "b": 2}), json!({"$set": {"b": 3, "c": 4}})).unwrap();
        assert_eq!(out, json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn set_dotted_creates_nested_objects() {
        let out = run(json!({}), json!({"$set": {"x.y.z": true}})).unwrap();
        assert_eq!(out, json!({"x": {"y": {"z": true}}}));
    }

    #[test]
    fn unset_and_inc_and_push() {
        let out = run(
            json!({"gone": 1, "n": 1, "tags": ["a"]}),
            json!({"$unset": {"gone": "", "missing": ""}, "$inc": {"n": 2, "fresh": 1.5}, "$push": {"tags": "b"}}),
        )
        .unwrap();
        assert_eq!(out, json!({"n": 3, "fresh": 1.5, "tags": ["a", "b"]}));
    }

    #[test]
    fn rename_moves_value() {
        let out = run(json!({"old": 7}), json!({"$rename": {"old": "new", "absent": "x"}})).unwrap();
        assert_eq!(out, json!({"new": 7}));
    }

    #[test]
    fn plain_field_document_is_rejected() {
        let msg = rejected(json!({"a": 1}), json!({"a": 2}));
        assert_eq!(msg, "update document must contain key beginning with '$'");
    }

    #[test]
    fn empty_update_is_rejected() {
        assert!(rejected(json!({}), json!({})).contains("at least one element"));
    }

    #[test]
    fn unknown_operator_is_rejected() {
        assert!(rejected(json!({}), json!({"$frobnicate": {"a": 1}})).starts_with("Unknown modifier: $frobnicate"));
    }

    #[test]
    fn operator_argument_must_be_object() {
        assert!(rejected(json!({}), json!({"$set": 5})).contains("found type number"));
    }

    #[test]
    fn inc_on_string_is_rejected() {
        assert!(rejected(json!({"s": "x"}), json!({"$inc": {"s": 1}})).contains("non-numeric type string"));
        assert!(rejected(json!({"n": 1}), json!({"$inc": {"n": "1"}})).contains("non-numeric argument"));
    }

    #[test]
    fn inc_overflow_is_rejected() {
        assert!(rejected(json!({"n": i64::MAX}), json!({"$inc": {"n": 1}})).contains("out of range"));
    }

    #[test]
    fn conflicting_paths_are_rejected() {
        let msg = rejected(json!({}), json!({"$set": {"a": 1}, "$unset": {"a.b": ""}}));
        assert!(msg.contains("would create a conflict"));
    }

    #[test]
    fn failed_update_leaves_input_untouched() {
        let doc = obj(json!({"a": 1, "s": "x"}));
        let update = obj(json!({"$set": {"a": 99}, "$inc": {"s": 1}}));
        assert!(apply(&doc, &update).is_err());
        assert_eq!(Value::Object(doc), json!({"a": 1, "s": "x"}));
    }

    #[test]
    fn cannot_descend_into_scalar() {
        assert!(rejected(json!({"a": 1}), json!({"$set": {"a.b": 2}})).starts_with("Cannot create field 'b'"));
    }
}
