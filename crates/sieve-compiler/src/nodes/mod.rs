//! Per-kind emitters.
//!
//! Every value-carrying node kind goes through the same skeleton:
//!
//! 1. bind (done by the engine, or reused for union branches)
//! 2. parse function, then the existence guard from `is_optional` / `allow_null`
//! 3. own validations and children, guarded per `bail`
//! 4. output write
//!
//! Kinds differ only in steps 3 and 4, which [`Emitter::emit_body`] covers.

mod array;
mod literal;
mod object;
mod record;
mod union;

pub(crate) use union::emit_union;

use sieve_types::{CompileResult, FieldAttrs};

use crate::binding::Binding;
use crate::buffer::Fragment;
use crate::compiler::Compiler;
use crate::instr::{Instr, ValidationCall};

pub(crate) trait Emitter {
    fn attrs(&self) -> &FieldAttrs;

    /// Own validations, children and output.
    fn emit_body(
        &self,
        compiler: &mut Compiler,
        binding: &Binding,
        buf: &mut Fragment,
    ) -> CompileResult<()>;
}

/// Run the shared skeleton for one node.
pub(crate) fn emit_field(
    node: &dyn Emitter,
    compiler: &mut Compiler,
    binding: &Binding,
    buf: &mut Fragment,
) -> CompileResult<()> {
    let attrs = node.attrs();
    if let Some(parse) = &attrs.parse_fn_id {
        buf.push(Instr::Parse(parse.clone()));
    }
    emit_existence_guard(attrs, buf);
    node.emit_body(compiler, binding, buf)
}

fn emit_existence_guard(attrs: &FieldAttrs, buf: &mut Fragment) {
    if attrs.is_optional {
        return;
    }
    if attrs.allow_null {
        buf.push(Instr::EnsureIsDefined);
    } else {
        buf.push(Instr::EnsureExists);
    }
}

/// Emit the node's own validation list.
///
/// Containers pass `drop_missing_check` once their type guard has proven
/// the value defined.
pub(crate) fn emit_validations(attrs: &FieldAttrs, drop_missing_check: bool, buf: &mut Fragment) {
    for validation in &attrs.validations {
        buf.push(Instr::Validate(ValidationCall {
            rule: validation.rule.clone(),
            is_async: validation.is_async,
            bail_guard: attrs.bail,
            defined_guard: !validation.implicit && !drop_missing_check,
        }));
    }
}

/// Splice container content into `buf`, behind an `is_valid` guard when
/// the node bails.
pub(crate) fn emit_guarded(attrs: &FieldAttrs, content: Fragment, buf: &mut Fragment) {
    if attrs.bail {
        buf.push(Instr::IfValid(content.into_instrs()));
    } else {
        buf.embed(content);
    }
}
