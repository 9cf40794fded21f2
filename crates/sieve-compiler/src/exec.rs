//! Executor for compiled field blocks.
//!
//! Fields are activated recursively. A child field borrows its value from
//! the parent field for as long as its own block runs, so nothing is
//! copied until a value is written to the output. Every step is a boxed
//! future; only asynchronous rules actually suspend.

use std::borrow::Cow;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{Map, Value};
use sieve_runtime::helpers::{self, Slot};
use sieve_runtime::{
    Field, FieldName, FieldPath, RunError, RunResult, Session, Validate, ValidateAsync, Validator,
};
use tracing::trace;

use crate::binding::{Access, FieldPathExpr};
use crate::instr::{FieldBlock, Instr, ValidationCall};

/// Where a field sits inside the field that activates it.
pub(crate) struct Activation<'f> {
    pub value: Option<&'f Value>,
    pub parent: Option<&'f Value>,
    pub name: FieldName,
    pub parent_path: Option<&'f FieldPath<'f>>,
}

impl<'f> Activation<'f> {
    pub fn root(input: Option<&'f Value>) -> Self {
        Self {
            value: input,
            parent: None,
            name: FieldName::Root,
            parent_path: None,
        }
    }
}

/// Run one field block and return the output it produced, if any.
pub(crate) fn run_field<'f, 's: 'f>(
    block: &'f FieldBlock,
    at: Activation<'f>,
    session: &'f mut Session<'s>,
) -> BoxFuture<'f, RunResult<Option<Value>>> {
    async move {
        let binding = &block.binding;
        let path = match &binding.field_path {
            FieldPathExpr::Static(path) => FieldPath::fixed(path),
            FieldPathExpr::Dynamic => FieldPath::deferred(at.parent_path, at.name.clone()),
        };
        let mut field = Field::new(
            at.name,
            &binding.wildcard_path,
            path,
            at.parent,
            binding.is_array_member,
        );
        field.define(
            at.value.map(Cow::Borrowed),
            session.options.convert_empty_strings_to_null,
        );

        let mut out = None;
        run_instrs(&block.body, &mut field, &mut out, session).await?;
        Ok(out)
    }
    .boxed()
}

fn run_instrs<'f, 'a: 'f, 's: 'f>(
    instrs: &'f [Instr],
    field: &'f mut Field<'a>,
    out: &'f mut Option<Value>,
    session: &'f mut Session<'s>,
) -> BoxFuture<'f, RunResult<()>> {
    async move {
        let refs = session.refs;
        let empty_to_null = session.options.convert_empty_strings_to_null;

        for instr in instrs {
            match instr {
                Instr::Field(child) => {
                    let parent = field.value();
                    let (value, name) = match &child.binding.value_access {
                        Access::Key(key) => (parent.and_then(|v| v.get(key.as_str())), FieldName::Key(key.clone())),
                        Access::Index(index) => (parent.and_then(|v| v.get(*index)), FieldName::Index(*index)),
                        Access::Root | Access::Element | Access::Entry => (parent, FieldName::Root),
                    };
                    let at = Activation {
                        value,
                        parent,
                        name,
                        parent_path: Some(&field.path),
                    };
                    if let Some(written) = run_field(child, at, session).await? {
                        helpers::write_output(out, slot(&child.binding.output_access), written);
                    }
                }

                Instr::Parse(id) => {
                    let parse = refs.parse(id)?;
                    let raw = field.take_value();
                    let parsed = {
                        let mut ctx = session.parse_context(field.parent);
                        parse(raw, &mut ctx)
                    };
                    field.define(parsed.map(Cow::Owned), empty_to_null);
                }

                Instr::EnsureExists => {
                    session.ensure_exists(field);
                }
                Instr::EnsureIsDefined => {
                    session.ensure_is_defined(field);
                }

                Instr::Validate(call) => run_validation(call, field, session).await?,

                Instr::IfValid(body) => {
                    if field.is_valid {
                        run_instrs(body, field, out, session).await?;
                    }
                }

                Instr::IfObject { body, null_output } => {
                    if session.ensure_is_object(field) {
                        run_instrs(body, field, out, session).await?;
                    } else if *null_output && field.is_null() {
                        *out = Some(Value::Null);
                    }
                }
                Instr::IfArray { body, null_output } => {
                    if session.ensure_is_array(field) {
                        run_instrs(body, field, out, session).await?;
                    } else if *null_output && field.is_null() {
                        *out = Some(Value::Null);
                    }
                }

                Instr::SeedObject { keep_unknown } => {
                    let seeded = match (keep_unknown, field.value()) {
                        (Some(declared), Some(Value::Object(source))) => {
                            helpers::copy_properties(source, declared)
                        }
                        _ => Map::new(),
                    };
                    *out = Some(Value::Object(seeded));
                }
                Instr::SeedArray { keep_unknown } => {
                    let seeded = match (*keep_unknown, field.value()) {
                        (true, Some(Value::Array(source))) => helpers::copy_elements(source),
                        _ => Vec::new(),
                    };
                    *out = Some(Value::Array(seeded));
                }

                Instr::EachElement { from, item } => {
                    let Some(Value::Array(elements)) = field.value() else {
                        continue;
                    };
                    for (index, value) in elements.iter().enumerate().skip(*from) {
                        let at = Activation {
                            value: Some(value),
                            parent: field.value(),
                            name: FieldName::Index(index),
                            parent_path: Some(&field.path),
                        };
                        if let Some(written) = run_field(item, at, session).await? {
                            helpers::write_output(out, Slot::Index(index), written);
                        }
                    }
                }
                Instr::EachEntry { item } => {
                    let Some(Value::Object(entries)) = field.value() else {
                        continue;
                    };
                    for (key, value) in entries {
                        let at = Activation {
                            value: Some(value),
                            parent: field.value(),
                            name: FieldName::Key(key.clone()),
                            parent_path: Some(&field.path),
                        };
                        if let Some(written) = run_field(item, at, session).await? {
                            helpers::write_output(out, Slot::Key(key), written);
                        }
                    }
                }

                Instr::Branches { arms, otherwise } => {
                    let mut selected = None;
                    for arm in arms {
                        let predicate = refs.predicate(&arm.predicate)?;
                        let (matched, outcome) = {
                            let mut ctx = session.context(field);
                            let matched = predicate(field.value(), &mut ctx);
                            (matched, ctx.finish())
                        };
                        field.apply(outcome, empty_to_null);
                        if matched {
                            selected = Some(arm);
                            break;
                        }
                    }
                    match selected {
                        Some(arm) => {
                            trace!(field = %field.path.get(), predicate = %arm.predicate, "branch selected");
                            run_instrs(&arm.body, field, out, session).await?;
                        }
                        None => {
                            trace!(field = %field.path.get(), "no branch matched");
                            if let Some(id) = otherwise {
                                let handler = refs.otherwise(id)?;
                                let outcome = {
                                    let mut ctx = session.context(field);
                                    handler(field.value(), &mut ctx);
                                    ctx.finish()
                                };
                                field.apply(outcome, empty_to_null);
                            }
                        }
                    }
                }

                Instr::Output { transform, null_output } => {
                    if field.is_defined && field.is_valid {
                        let written = match transform {
                            Some(id) => {
                                let transform = refs.transform(id)?;
                                let mut ctx = session.context(field);
                                match field.value() {
                                    Some(value) => transform(value, &mut ctx),
                                    None => continue,
                                }
                            }
                            None => match field.take_value() {
                                Some(value) => value,
                                None => continue,
                            },
                        };
                        *out = Some(written);
                    } else if *null_output && field.is_null() {
                        let written = match transform {
                            Some(id) => {
                                let transform = refs.transform(id)?;
                                let mut ctx = session.context(field);
                                transform(&Value::Null, &mut ctx)
                            }
                            None => Value::Null,
                        };
                        *out = Some(written);
                    }
                }
            }
        }
        Ok(())
    }
    .boxed()
}

async fn run_validation(
    call: &ValidationCall,
    field: &mut Field<'_>,
    session: &mut Session<'_>,
) -> RunResult<()> {
    if call.bail_guard && !field.is_valid {
        return Ok(());
    }
    if call.defined_guard && !field.is_defined {
        return Ok(());
    }

    let refs = session.refs;
    let rule = refs.rule(&call.rule)?;
    let options = rule.options.as_ref();
    let empty_to_null = session.options.convert_empty_strings_to_null;

    let (result, outcome) = {
        let mut ctx = session.context(field);
        let result = match &rule.validator {
            Validator::Sync(validator) => {
                Validate::validate(validator.as_ref(), field.value(), options, &mut ctx)
            }
            Validator::Async(validator) if call.is_async => {
                ValidateAsync::validate(validator.as_ref(), field.value(), options, &mut ctx).await
            }
            Validator::Async(_) => {
                return Err(RunError::UnresolvedRef {
                    id: call.rule.clone(),
                    expected: "synchronous rule",
                });
            }
        };
        (result, ctx.finish())
    };
    field.apply(outcome, empty_to_null);
    result.map_err(|source| RunError::Rule {
        rule: call.rule.clone(),
        source,
    })
}

fn slot(access: &Access) -> Slot<'_> {
    match access {
        Access::Key(key) => Slot::Key(key),
        Access::Index(index) => Slot::Index(*index),
        Access::Root | Access::Element | Access::Entry => Slot::Root,
    }
}
