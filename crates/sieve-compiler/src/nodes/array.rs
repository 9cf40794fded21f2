//! Array and tuple emitters. Both read positions out of a JSON array; an
//! array may add an `each` schema for the positions after its fixed ones.

use sieve_types::{ArrayNode, CompileResult, FieldAttrs, Node, TupleNode};

use super::{emit_guarded, emit_validations, Emitter};
use crate::binding::{Binding, Parent};
use crate::buffer::Fragment;
use crate::compiler::Compiler;
use crate::instr::Instr;

impl Emitter for ArrayNode {
    fn attrs(&self) -> &FieldAttrs {
        &self.attrs
    }

    fn emit_body(
        &self,
        compiler: &mut Compiler,
        binding: &Binding,
        buf: &mut Fragment,
    ) -> CompileResult<()> {
        emit_positional(
            &self.attrs,
            self.allow_unknown_properties,
            &self.children,
            self.each.as_deref(),
            compiler,
            binding,
            buf,
        )
    }
}

impl Emitter for TupleNode {
    fn attrs(&self) -> &FieldAttrs {
        &self.attrs
    }

    fn emit_body(
        &self,
        compiler: &mut Compiler,
        binding: &Binding,
        buf: &mut Fragment,
    ) -> CompileResult<()> {
        emit_positional(
            &self.attrs,
            self.allow_unknown_properties,
            &self.properties,
            None,
            compiler,
            binding,
            buf,
        )
    }
}

fn emit_positional(
    attrs: &FieldAttrs,
    allow_unknown: bool,
    fixed: &[Node],
    each: Option<&Node>,
    compiler: &mut Compiler,
    binding: &Binding,
    buf: &mut Fragment,
) -> CompileResult<()> {
    let mut guarded = buf.child();
    emit_validations(attrs, true, &mut guarded);

    let mut content = guarded.child();
    content.push(Instr::SeedArray {
        keep_unknown: allow_unknown,
    });
    for (index, child) in fixed.iter().enumerate() {
        let block = compiler.field_block(child, Parent::Tuple { parent: binding, index })?;
        content.push(Instr::Field(Box::new(block)));
    }
    if let Some(each) = each {
        let item = compiler.field_block(each, Parent::Array(binding))?;
        content.push(Instr::EachElement {
            from: fixed.len(),
            item: Box::new(item),
        });
    }
    emit_guarded(attrs, content, &mut guarded);

    buf.push(Instr::IfArray {
        body: guarded.into_instrs(),
        null_output: attrs.allow_null,
    });
    Ok(())
}
