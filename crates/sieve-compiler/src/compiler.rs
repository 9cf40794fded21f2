//! Compilation engine.
//!
//! Walks a schema tree root to leaf, binds every node, dispatches it to
//! its emitter and assembles the resulting [`FieldBlock`] tree into a
//! [`CompiledSchema`].

use sieve_types::{CompileError, CompileResult, CompilerOptions, Node};
use tracing::{debug, trace};

use crate::binding::{self, Binding, Parent};
use crate::buffer::Fragment;
use crate::instr::FieldBlock;
use crate::nodes::{emit_field, emit_union};
use crate::program::CompiledSchema;

// ══════════════════════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════════════════════

/// Compile `schema` with a throwaway [`Compiler`].
pub fn compile(schema: &Node, options: CompilerOptions) -> CompileResult<CompiledSchema> {
    Compiler::new(options).compile(schema)
}

/// Load a schema from JSON and compile it.
pub fn compile_json(schema: &str, options: CompilerOptions) -> CompileResult<CompiledSchema> {
    compile(&Node::from_json(schema)?, options)
}

// ══════════════════════════════════════════════════════════════════════════════
// Compiler
// ══════════════════════════════════════════════════════════════════════════════

/// Reusable compiler. Holds no state between compiles apart from its
/// options.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilerOptions,
    /// Suffix of the next fixed-position binding name.
    counter: usize,
}

impl Compiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            counter: 0,
        }
    }

    pub fn compile(&mut self, schema: &Node) -> CompileResult<CompiledSchema> {
        self.counter = 0;
        debug!(kind = %schema.kind(), "compiling schema");
        let root = self.field_block(schema, Parent::Root);
        self.counter = 0;

        let compiled = CompiledSchema::new(schema.clone(), self.options, root?);
        debug!(
            bindings = compiled.bindings().len(),
            instructions = compiled.instruction_count(),
            "compiled schema"
        );
        Ok(compiled)
    }

    /// Bind `node` at `parent` and compile it into its own field block.
    pub(crate) fn field_block(&mut self, node: &Node, parent: Parent<'_>) -> CompileResult<FieldBlock> {
        if let Node::Group(_) = node {
            return Err(CompileError::UnexpectedGroup {
                path: parent_wildcard(parent),
            });
        }
        let binding = self.bind(node, parent);
        let mut buf = Fragment::new();
        self.compile_node(node, &binding, &mut buf)?;
        Ok(FieldBlock {
            binding,
            body: buf.into_instrs(),
        })
    }

    /// Emit `node` against an existing binding. Union branches come through
    /// here directly, reusing the union's binding.
    pub(crate) fn compile_node(
        &mut self,
        node: &Node,
        binding: &Binding,
        buf: &mut Fragment,
    ) -> CompileResult<()> {
        trace!(
            kind = %node.kind(),
            binding = %binding.name,
            wildcard = %binding.wildcard_path,
            "emit node"
        );
        match node {
            Node::Literal(n) => emit_field(n, self, binding, buf),
            Node::Object(n) => emit_field(n, self, binding, buf),
            Node::Array(n) => emit_field(n, self, binding, buf),
            Node::Record(n) => emit_field(n, self, binding, buf),
            Node::Tuple(n) => emit_field(n, self, binding, buf),
            Node::Union(n) => emit_union(n, self, binding, buf),
            Node::Group(_) => Err(CompileError::UnexpectedGroup {
                path: binding.wildcard_path.clone(),
            }),
        }
    }

    fn bind(&mut self, node: &Node, parent: Parent<'_>) -> Binding {
        let binding = binding::resolve(node, parent, self.counter);
        if matches!(parent, Parent::Object(_) | Parent::Tuple { .. }) {
            self.counter += 1;
        }
        binding
    }
}

fn parent_wildcard(parent: Parent<'_>) -> String {
    match parent {
        Parent::Root => String::new(),
        Parent::Object(p) => p.wildcard_path.clone(),
        Parent::Tuple { parent: p, index } => binding::join(&p.wildcard_path, &index.to_string()),
        Parent::Array(p) | Parent::Record(p) => binding::join(&p.wildcard_path, binding::WILDCARD),
    }
}
