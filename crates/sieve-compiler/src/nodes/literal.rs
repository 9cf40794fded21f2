use sieve_types::{CompileResult, FieldAttrs, LiteralNode};

use super::{emit_validations, Emitter};
use crate::binding::Binding;
use crate::buffer::Fragment;
use crate::compiler::Compiler;
use crate::instr::Instr;

impl Emitter for LiteralNode {
    fn attrs(&self) -> &FieldAttrs {
        &self.attrs
    }

    fn emit_body(&self, _: &mut Compiler, _: &Binding, buf: &mut Fragment) -> CompileResult<()> {
        emit_validations(&self.attrs, false, buf);
        buf.push(Instr::Output {
            transform: self.transform_fn_id.clone(),
            null_output: self.attrs.allow_null,
        });
        Ok(())
    }
}
