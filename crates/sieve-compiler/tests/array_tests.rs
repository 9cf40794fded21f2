//! Array, tuple and record nodes: positional and dynamic children, unknown
//! elements, runtime field paths and wildcard paths.

use serde_json::{json, Value};
use sieve_compiler::{compile, CompiledSchema, CompilerOptions};
use sieve_runtime::{RefsBuilder, RefsTable, RunError};
use sieve_types::{
    ArrayNode, FieldAttrs, LiteralNode, Node, ObjectNode, RecordNode, RefId, TupleNode, Validation,
};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn compiled(node: impl Into<Node>) -> CompiledSchema {
    compile(&node.into(), CompilerOptions::default()).unwrap()
}

fn item() -> LiteralNode {
    LiteralNode::new(FieldAttrs::default())
}

/// Fails anything that is not a string, naming the runtime and wildcard
/// paths in the message.
fn string_rule(refs: &mut RefsBuilder) -> RefId {
    refs.rule(|value, _, field| {
        if !value.is_some_and(Value::is_string) {
            let message = format!("{} ({})", field.field_path(), field.wildcard_path);
            field.report(&message, "string", None);
        }
        Ok(())
    })
}

fn string_item(rule: &RefId) -> LiteralNode {
    LiteralNode::new(FieldAttrs::default().validate(Validation::sync(rule.clone())))
}

fn messages(err: RunError) -> Vec<String> {
    err.as_validation()
        .expect("expected a validation error")
        .messages
        .iter()
        .map(|m| m.message.clone())
        .collect()
}

// ══════════════════════════════════════════════════════════════════════════════
// Array
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn array_each_copies_elements() {
    let schema = compiled(ArrayNode::new(FieldAttrs::default()).each(item()));
    let mut input = json!(["a", "b"]);
    let output = schema.validate(Some(&input), &RefsTable::new()).unwrap();
    input[0] = json!("changed");
    input.as_array_mut().unwrap().push(json!("c"));
    assert_eq!(output, Some(json!(["a", "b"])));
}

#[test]
fn array_each_reports_element_paths() {
    let mut refs = RefsBuilder::new();
    let rule = string_rule(&mut refs);
    let refs = refs.build();
    let schema = compiled(
        ObjectNode::new(FieldAttrs::default())
            .child(ArrayNode::new(FieldAttrs::named("tags")).each(string_item(&rule))),
    );
    let err = schema
        .validate(Some(&json!({ "tags": ["ok", 1, "ok", false] })), &refs)
        .unwrap_err();
    let validation = err.as_validation().unwrap();
    assert_eq!(
        validation.texts(),
        vec!["tags.1 (tags.*)", "tags.3 (tags.*)"]
    );
    assert_eq!(validation.messages[0].index, Some(1));
    assert_eq!(validation.messages[1].field, "tags.3");
}

#[test]
fn nested_arrays_compose_paths() {
    let mut refs = RefsBuilder::new();
    let rule = string_rule(&mut refs);
    let refs = refs.build();
    let schema = compiled(
        ArrayNode::new(FieldAttrs::default()).each(
            ObjectNode::new(FieldAttrs::default())
                .child(ArrayNode::new(FieldAttrs::named("names")).each(string_item(&rule))),
        ),
    );
    let input = json!([{ "names": ["a"] }, { "names": ["b", 2] }]);
    let err = schema.validate(Some(&input), &refs).unwrap_err();
    assert_eq!(messages(err), vec!["1.names.1 (*.names.*)"]);
}

#[test]
fn array_fixed_children_then_each() {
    let mut refs = RefsBuilder::new();
    let rule = string_rule(&mut refs);
    let number = refs.rule(|value, _, field| {
        if !value.is_some_and(Value::is_number) {
            field.report("not a number", "number", None);
        }
        Ok(())
    });
    let refs = refs.build();
    let schema = compiled(
        ArrayNode::new(FieldAttrs::default())
            .child(LiteralNode::new(FieldAttrs::default().validate(Validation::sync(number))))
            .each(string_item(&rule)),
    );
    assert_eq!(
        schema.validate(Some(&json!([1, "a", "b"])), &refs).unwrap(),
        Some(json!([1, "a", "b"]))
    );

    let err = schema.validate(Some(&json!(["x", "a", 3])), &refs).unwrap_err();
    assert_eq!(messages(err), vec!["not a number", "2 (*)"]);
}

#[test]
fn array_without_each_keeps_fixed_positions_only() {
    let schema = compiled(ArrayNode::new(FieldAttrs::default()).child(item()));
    assert_eq!(
        schema.validate(Some(&json!(["a", "b"])), &RefsTable::new()).unwrap(),
        Some(json!(["a"]))
    );
}

#[test]
fn array_allow_unknown_keeps_uncovered_elements() {
    let schema = compiled(ArrayNode::new(FieldAttrs::default()).allow_unknown().child(item()));
    assert_eq!(
        schema.validate(Some(&json!(["a", { "b": 1 }])), &RefsTable::new()).unwrap(),
        Some(json!(["a", { "b": 1 }]))
    );
}

#[test]
fn non_array_reports_array_rule() {
    let schema = compiled(ArrayNode::new(FieldAttrs::default()).each(item()));
    let err = schema.validate(Some(&json!({ "0": "a" })), &RefsTable::new()).unwrap_err();
    let validation = err.as_validation().unwrap();
    assert_eq!(validation.texts(), vec!["value is not a valid array"]);
    assert_eq!(validation.messages[0].rule, "array");
}

#[test]
fn nullable_array_outputs_null() {
    let schema = compiled(ArrayNode::new(FieldAttrs::default().nullable()).each(item()));
    assert_eq!(
        schema.validate(Some(&Value::Null), &RefsTable::new()).unwrap(),
        Some(Value::Null)
    );
}

#[test]
fn empty_array_is_valid() {
    let schema = compiled(ArrayNode::new(FieldAttrs::default()).each(item()));
    assert_eq!(
        schema.validate(Some(&json!([])), &RefsTable::new()).unwrap(),
        Some(json!([]))
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Tuple
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn tuple_drops_undeclared_positions() {
    let schema = compiled(TupleNode::new(FieldAttrs::default()).property(item()));
    assert_eq!(
        schema.validate(Some(&json!(["a", "b"])), &RefsTable::new()).unwrap(),
        Some(json!(["a"]))
    );
}

#[test]
fn tuple_allow_unknown_keeps_extra_positions() {
    let schema = compiled(TupleNode::new(FieldAttrs::default()).allow_unknown().property(item()));
    assert_eq!(
        schema.validate(Some(&json!(["a", "b"])), &RefsTable::new()).unwrap(),
        Some(json!(["a", "b"]))
    );
}

#[test]
fn tuple_missing_position_is_required() {
    let schema = compiled(
        TupleNode::new(FieldAttrs::default())
            .property(item())
            .property(item()),
    );
    let err = schema.validate(Some(&json!(["a"])), &RefsTable::new()).unwrap_err();
    let validation = err.as_validation().unwrap();
    assert_eq!(validation.texts(), vec!["value is required"]);
    assert_eq!(validation.messages[0].field, "1");
    assert_eq!(validation.messages[0].index, Some(1));
}

#[test]
fn tuple_skipped_position_pads_with_null() {
    let schema = compiled(
        TupleNode::new(FieldAttrs::default())
            .property(LiteralNode::new(FieldAttrs::default().optional()))
            .property(item()),
    );
    assert_eq!(
        schema.validate(Some(&json!([null, "b"])), &RefsTable::new()).unwrap(),
        Some(json!([null, "b"]))
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Record
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn record_applies_each_to_every_key() {
    let mut refs = RefsBuilder::new();
    let rule = string_rule(&mut refs);
    let refs = refs.build();
    let schema = compiled(
        ObjectNode::new(FieldAttrs::default())
            .child(RecordNode::new(FieldAttrs::named("labels"), string_item(&rule))),
    );
    let input = json!({ "labels": { "en": "Hello", "fr": "Bonjour" } });
    assert_eq!(schema.validate(Some(&input), &refs).unwrap(), Some(input.clone()));

    let bad = json!({ "labels": { "en": "Hello", "de": 7 } });
    let err = schema.validate(Some(&bad), &refs).unwrap_err();
    let validation = err.as_validation().unwrap();
    assert_eq!(validation.texts(), vec!["labels.de (labels.*)"]);
    assert_eq!(validation.messages[0].index, None);
}

#[test]
fn record_drops_invalid_nothing_else() {
    let schema = compiled(RecordNode::new(
        FieldAttrs::default(),
        LiteralNode::new(FieldAttrs::default().optional()),
    ));
    let output = schema
        .validate(Some(&json!({ "a": 1, "b": null, "c": 3 })), &RefsTable::new())
        .unwrap();
    assert_eq!(output, Some(json!({ "a": 1, "c": 3 })));
}

#[test]
fn record_requires_object() {
    let schema = compiled(RecordNode::new(FieldAttrs::default(), item()));
    let err = schema.validate(Some(&json!(["a"])), &RefsTable::new()).unwrap_err();
    assert_eq!(messages(err), vec!["value is not a valid object"]);
}
