//! Predicate chains: unions pick one schema for a field, groups pick extra
//! properties for an object.

use sieve_types::{CompileResult, GroupBranch, GroupNode, Node, UnionNode};

use crate::binding::{Binding, Parent};
use crate::buffer::Fragment;
use crate::compiler::Compiler;
use crate::instr::{Arm, Instr};

/// Every arm compiles against the union's own binding.
pub(crate) fn emit_union(
    node: &UnionNode,
    compiler: &mut Compiler,
    binding: &Binding,
    buf: &mut Fragment,
) -> CompileResult<()> {
    let mut arms = Vec::with_capacity(node.conditions.len());
    for condition in &node.conditions {
        let mut arm = buf.child();
        compiler.compile_node(&condition.schema, binding, &mut arm)?;
        arms.push(Arm {
            predicate: condition.predicate.clone(),
            body: arm.into_instrs(),
        });
    }
    buf.push(Instr::Branches {
        arms,
        otherwise: node.otherwise.clone(),
    });
    Ok(())
}

/// Arms run against the enclosing object; their children write straight
/// into its output.
pub(crate) fn emit_group(
    group: &GroupNode,
    compiler: &mut Compiler,
    object: &Binding,
) -> CompileResult<Instr> {
    let mut arms = Vec::with_capacity(group.conditions.len());
    for condition in &group.conditions {
        let body = match &condition.schema {
            GroupBranch::SubObject { children } => {
                let mut body = Vec::with_capacity(children.len());
                for child in children {
                    body.push(match child {
                        Node::Group(nested) => emit_group(nested, compiler, object)?,
                        other => Instr::Field(Box::new(compiler.field_block(other, Parent::Object(object))?)),
                    });
                }
                body
            }
            GroupBranch::Group(nested) => vec![emit_group(nested, compiler, object)?],
        };
        arms.push(Arm {
            predicate: condition.predicate.clone(),
            body,
        });
    }
    Ok(Instr::Branches {
        arms,
        otherwise: group.otherwise.clone(),
    })
}
