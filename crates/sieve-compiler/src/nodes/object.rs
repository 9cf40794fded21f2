use sieve_types::{CompileResult, FieldAttrs, Node, ObjectNode};

use super::union::emit_group;
use super::{emit_guarded, emit_validations, Emitter};
use crate::binding::{Binding, Parent};
use crate::buffer::Fragment;
use crate::compiler::Compiler;
use crate::instr::Instr;

impl Emitter for ObjectNode {
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
        content.push(Instr::SeedObject {
            keep_unknown: self.allow_unknown_properties.then(|| declared_names(self)),
        });
        for child in &self.children {
            let instr = match child {
                Node::Group(group) => emit_group(group, compiler, binding)?,
                other => Instr::Field(Box::new(compiler.field_block(other, Parent::Object(binding))?)),
            };
            content.push(instr);
        }
        for group in &self.groups {
            content.push(emit_group(group, compiler, binding)?);
        }
        emit_guarded(&self.attrs, content, &mut guarded);

        buf.push(Instr::IfObject {
            body: guarded.into_instrs(),
            null_output: self.attrs.allow_null,
        });
        Ok(())
    }
}

/// Source keys the object consumes, including keys only a group declares.
fn declared_names(node: &ObjectNode) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let groups = node.children.iter().filter_map(|child| match child {
        Node::Group(group) => Some(group),
        _ => None,
    });
    for group in groups.chain(&node.groups) {
        names.extend(group.declared_field_names().into_iter().map(str::to_string));
    }
    names.extend(
        node.children
            .iter()
            .filter(|child| !matches!(child, Node::Group(_)))
            .map(|child| child.field_name().to_string()),
    );
    names.sort();
    names.dedup();
    names
}
