use sieve_types::{CompileResult, FieldAttrs, RecordNode};

use super::{emit_guarded, emit_validations, Emitter};
use crate::binding::{Binding, Parent};
use crate::buffer::Fragment;
use crate::compiler::Compiler;
use crate::instr::Instr;

impl Emitter for RecordNode {
    fn attrs(&self) -> &FieldAttrs {
        &self.attrs
    }

    fn emit_body(
        &self,
        compiler: &mut Compiler,
        binding: &Binding,
        buf: &mut Fragment,
    ) -> CompileResult<()> {
        let mut guarded = buf.child();
        emit_validations(&self.attrs, true, &mut guarded);

        let mut content = guarded.child();
        content.push(Instr::SeedObject { keep_unknown: None });
        let item = compiler.field_block(&self.each, Parent::Record(binding))?;
        content.push(Instr::EachEntry {
            item: Box::new(item),
        });
        emit_guarded(&self.attrs, content, &mut guarded);

        buf.push(Instr::IfObject {
            body: guarded.into_instrs(),
            null_output: self.attrs.allow_null,
        });
        Ok(())
    }
}
