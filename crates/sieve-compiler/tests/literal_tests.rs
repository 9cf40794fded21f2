//! Literal node behaviour: existence guards, validations, bail, parse and
//! transform functions, null output.

use serde_json::{json, Value};
use sieve_compiler::{compile, CompiledSchema, CompilerOptions};
use sieve_runtime::{RefsBuilder, RefsTable, RunError};
use sieve_types::{FieldAttrs, LiteralNode, Node, Validation};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn compiled(node: LiteralNode) -> CompiledSchema {
    let schema: Node = node.into();
    compile(&schema, CompilerOptions::default()).unwrap()
}

fn texts(err: RunError) -> Vec<String> {
    err.as_validation()
        .expect("expected a validation error")
        .messages
        .iter()
        .map(|m| m.message.clone())
        .collect()
}

/// A rule that fails with `message` whenever it runs.
fn failing(refs: &mut RefsBuilder, message: &'static str) -> sieve_types::RefId {
    refs.rule(move |_, _, field| {
        field.report(message, "failing", None);
        Ok(())
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Existence
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn required_literal_passes_value_through() {
    let schema = compiled(LiteralNode::new(FieldAttrs::default()));
    let refs = RefsTable::new();
    assert_eq!(schema.validate(Some(&json!("virk")), &refs).unwrap(), Some(json!("virk")));
}

#[test]
fn required_literal_rejects_undefined() {
    let schema = compiled(LiteralNode::new(FieldAttrs::default()));
    let err = schema.validate(None, &RefsTable::new()).unwrap_err();
    assert_eq!(texts(err), vec!["value is required"]);
}

#[test]
fn required_literal_rejects_null_as_required() {
    let schema = compiled(LiteralNode::new(FieldAttrs::default()));
    let err = schema.validate(Some(&Value::Null), &RefsTable::new()).unwrap_err();
    let validation = err.as_validation().unwrap();
    assert_eq!(validation.messages[0].message, "value is required");
    assert_eq!(validation.messages[0].rule, "required");
}

#[test]
fn nullable_literal_requires_definition() {
    let schema = compiled(LiteralNode::new(FieldAttrs::default().nullable()));
    let err = schema.validate(None, &RefsTable::new()).unwrap_err();
    assert_eq!(texts(err), vec!["value must be defined"]);
}

#[test]
fn nullable_literal_outputs_null_and_skips_rules() {
    let mut refs = RefsBuilder::new();
    let rule = failing(&mut refs, "should not run");
    let refs = refs.build();
    let schema = compiled(LiteralNode::new(
        FieldAttrs::default().nullable().validate(Validation::sync(rule)),
    ));
    assert_eq!(schema.validate(Some(&Value::Null), &refs).unwrap(), Some(Value::Null));
}

#[test]
fn nullable_literal_transforms_null() {
    let mut refs = RefsBuilder::new();
    let transform = refs.transform(|value, _| match value {
        Value::Null => json!("none"),
        other => other.clone(),
    });
    let refs = refs.build();
    let schema = compiled(LiteralNode::new(FieldAttrs::default().nullable()).transform(transform));
    assert_eq!(schema.validate(Some(&Value::Null), &refs).unwrap(), Some(json!("none")));
}

#[test]
fn optional_literal_produces_no_output() {
    let mut refs = RefsBuilder::new();
    let rule = failing(&mut refs, "should not run");
    let refs = refs.build();
    let schema = compiled(LiteralNode::new(
        FieldAttrs::default().optional().validate(Validation::sync(rule)),
    ));
    assert_eq!(schema.validate(None, &refs).unwrap(), None);
    assert_eq!(schema.validate(Some(&Value::Null), &refs).unwrap(), None);
}

#[test]
fn implicit_rules_run_on_undefined() {
    let mut refs = RefsBuilder::new();
    let rule = failing(&mut refs, "implicit ran");
    let refs = refs.build();
    let schema = compiled(LiteralNode::new(
        FieldAttrs::default().optional().validate(Validation::sync(rule).implicit()),
    ));
    let err = schema.validate(None, &refs).unwrap_err();
    assert_eq!(texts(err), vec!["implicit ran"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Validations & bail
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn bail_stops_after_first_failure() {
    let mut refs = RefsBuilder::new();
    let first = failing(&mut refs, "first");
    let second = failing(&mut refs, "second");
    let refs = refs.build();
    let schema = compiled(LiteralNode::new(
        FieldAttrs::default()
            .validate(Validation::sync(first))
            .validate(Validation::sync(second)),
    ));
    let err = schema.validate(Some(&json!(1)), &refs).unwrap_err();
    assert_eq!(texts(err), vec!["first"]);
}

#[test]
fn without_bail_every_rule_reports() {
    let mut refs = RefsBuilder::new();
    let first = failing(&mut refs, "first");
    let second = failing(&mut refs, "second");
    let refs = refs.build();
    let schema = compiled(LiteralNode::new(
        FieldAttrs::default()
            .bail(false)
            .validate(Validation::sync(first))
            .validate(Validation::sync(second)),
    ));
    let err = schema.validate(Some(&json!(1)), &refs).unwrap_err();
    assert_eq!(texts(err), vec!["first", "second"]);
}

#[test]
fn rule_receives_options() {
    let mut refs = RefsBuilder::new();
    let min_length = refs.rule_with_options(
        |value, options, field| {
            let min = options.and_then(|o| o["min"].as_u64()).unwrap_or(0) as usize;
            let len = value.and_then(Value::as_str).map_or(0, str::len);
            if len < min {
                field.report("too short", "minLength", options);
            }
            Ok(())
        },
        Some(json!({ "min": 3 })),
    );
    let refs = refs.build();
    let schema = compiled(LiteralNode::new(
        FieldAttrs::default().validate(Validation::sync(min_length)),
    ));
    assert!(schema.validate(Some(&json!("abcd")), &refs).is_ok());

    let err = schema.validate(Some(&json!("ab")), &refs).unwrap_err();
    let reported = &err.as_validation().unwrap().messages[0];
    assert_eq!(reported.rule, "minLength");
    assert_eq!(reported.args, Some(json!({ "min": 3 })));
}

#[test]
fn rule_can_mutate_value() {
    let mut refs = RefsBuilder::new();
    let upper = refs.rule(|value, _, field| {
        let upper = value.and_then(Value::as_str).map(str::to_uppercase);
        field.mutate(upper.map(Value::from));
        Ok(())
    });
    let refs = refs.build();
    let schema = compiled(LiteralNode::new(FieldAttrs::default().validate(Validation::sync(upper))));
    assert_eq!(schema.validate(Some(&json!("virk")), &refs).unwrap(), Some(json!("VIRK")));
}

#[test]
fn failing_rule_aborts_run() {
    let mut refs = RefsBuilder::new();
    let boom = refs.rule(|_, _, _| Err("boom".into()));
    let refs = refs.build();
    let schema = compiled(LiteralNode::new(FieldAttrs::default().validate(Validation::sync(boom))));
    let err = schema.validate(Some(&json!(1)), &refs).unwrap_err();
    assert!(matches!(err, RunError::Rule { .. }));
    assert_eq!(err.to_string(), "rule 'ref://1' failed: boom");
}

#[test]
fn missing_rule_is_unresolved() {
    let schema = compiled(LiteralNode::new(
        FieldAttrs::default().validate(Validation::sync("ref://99")),
    ));
    let err = schema.validate(Some(&json!(1)), &RefsTable::new()).unwrap_err();
    assert!(matches!(err, RunError::UnresolvedRef { expected: "rule", .. }));
}

// ══════════════════════════════════════════════════════════════════════════════
// Parse & transform
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn parse_runs_before_existence_check() {
    let mut refs = RefsBuilder::new();
    let default = refs.parse(|value, _| value.or_else(|| Some(json!("guest"))));
    let refs = refs.build();
    let schema = compiled(LiteralNode::new(FieldAttrs::default().parse(default)));
    assert_eq!(schema.validate(None, &refs).unwrap(), Some(json!("guest")));
    assert_eq!(schema.validate(Some(&json!("virk")), &refs).unwrap(), Some(json!("virk")));
}

#[test]
fn parse_can_clear_value() {
    let mut refs = RefsBuilder::new();
    let clear = refs.parse(|_, _| None);
    let refs = refs.build();
    let schema = compiled(LiteralNode::new(FieldAttrs::default().parse(clear)));
    let err = schema.validate(Some(&json!("virk")), &refs).unwrap_err();
    assert_eq!(texts(err), vec!["value is required"]);
}

#[test]
fn transform_rewrites_output_only() {
    let mut refs = RefsBuilder::new();
    let seen = refs.rule(|value, _, field| {
        if value != Some(&json!(2)) {
            field.report("rule saw the transformed value", "seen", None);
        }
        Ok(())
    });
    let double = refs.transform(|value, _| json!(value.as_i64().unwrap_or(0) * 2));
    let refs = refs.build();
    let schema = compiled(
        LiteralNode::new(FieldAttrs::default().validate(Validation::sync(seen))).transform(double),
    );
    assert_eq!(schema.validate(Some(&json!(2)), &refs).unwrap(), Some(json!(4)));
}

#[test]
fn invalid_value_is_not_transformed() {
    let mut refs = RefsBuilder::new();
    let fail = failing(&mut refs, "bad");
    let transform = refs.transform(|_, field| {
        field.report("transform ran", "transform", None);
        Value::Null
    });
    let refs = refs.build();
    let schema = compiled(
        LiteralNode::new(FieldAttrs::default().validate(Validation::sync(fail))).transform(transform),
    );
    let err = schema.validate(Some(&json!(1)), &refs).unwrap_err();
    assert_eq!(texts(err), vec!["bad"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Options
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn empty_strings_convert_to_null() {
    let options = CompilerOptions {
        convert_empty_strings_to_null: true,
    };
    let nullable: Node = LiteralNode::new(FieldAttrs::default().nullable()).into();
    let schema = compile(&nullable, options).unwrap();
    assert_eq!(schema.validate(Some(&json!("")), &RefsTable::new()).unwrap(), Some(Value::Null));

    let required: Node = LiteralNode::new(FieldAttrs::default()).into();
    let schema = compile(&required, options).unwrap();
    let err = schema.validate(Some(&json!("")), &RefsTable::new()).unwrap_err();
    assert_eq!(texts(err), vec!["value is required"]);
}

#[test]
fn empty_strings_kept_by_default() {
    let schema = compiled(LiteralNode::new(FieldAttrs::default()));
    assert_eq!(schema.validate(Some(&json!("")), &RefsTable::new()).unwrap(), Some(json!("")));
}
