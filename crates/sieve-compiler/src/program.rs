//! The compiled, reusable routine.

use std::fmt;

use serde_json::Value;
use sha2::{Digest, Sha256};
use sieve_runtime::{
    ErrorReporter, Meta, MessagesProvider, RefsTable, RunError, RunResult, Session,
    SimpleErrorReporter, SimpleMessagesProvider,
};
use sieve_types::{CompileResult, CompilerOptions, Node};
use tracing::debug;

use crate::exec::{self, Activation};
use crate::instr::{self, FieldBlock};

/// A schema compiled into an instruction tree.
///
/// Immutable once built. One value can serve any number of concurrent
/// runs as long as each run brings its own meta bag and reporter.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    schema: Node,
    options: CompilerOptions,
    root: FieldBlock,
}

impl CompiledSchema {
    pub(crate) fn new(schema: Node, options: CompilerOptions, root: FieldBlock) -> Self {
        Self {
            schema,
            options,
            root,
        }
    }

    pub fn schema(&self) -> &Node {
        &self.schema
    }

    pub fn options(&self) -> CompilerOptions {
        self.options
    }

    pub fn root(&self) -> &FieldBlock {
        &self.root
    }

    /// Every binding name, in emission order.
    pub fn bindings(&self) -> Vec<&str> {
        let mut names = vec![self.root.binding.name.as_str()];
        instr::collect_bindings(&self.root.body, &mut names);
        names
    }

    pub fn instruction_count(&self) -> usize {
        instr::count_all(&self.root.body)
    }

    /// Hex SHA-256 of the schema and options, stable across compiles.
    pub fn fingerprint(&self) -> CompileResult<String> {
        let canonical = serde_json::to_vec(&(&self.schema, &self.options))?;
        Ok(format!("{:x}", Sha256::digest(&canonical)))
    }

    // ── Running ──

    /// Validate and transform `input`.
    ///
    /// Returns `Ok(None)` when the schema produced no output (for example an
    /// optional root with undefined input). Reported errors surface once, at
    /// the end, as [`RunError::Validation`]; a failing rule aborts at once.
    pub async fn run(
        &self,
        input: Option<&Value>,
        meta: &mut Meta,
        refs: &RefsTable,
        messages: Option<&dyn MessagesProvider>,
        reporter: &mut dyn ErrorReporter,
    ) -> RunResult<Option<Value>> {
        let defaults = SimpleMessagesProvider::new();
        let messages = messages.unwrap_or(&defaults);
        let mut session = Session::new(input, meta, refs, messages, reporter, self.options);

        let output = exec::run_field(&self.root, Activation::root(input), &mut session).await?;

        if session.has_errors() {
            let error = session.create_error();
            debug!(errors = error.messages.len(), "run failed validation");
            return Err(RunError::Validation(error));
        }
        debug!(has_output = output.is_some(), "run finished");
        Ok(output)
    }

    /// [`run`](Self::run), driven to completion on the current thread.
    pub fn run_blocking(
        &self,
        input: Option<&Value>,
        meta: &mut Meta,
        refs: &RefsTable,
        messages: Option<&dyn MessagesProvider>,
        reporter: &mut dyn ErrorReporter,
    ) -> RunResult<Option<Value>> {
        futures::executor::block_on(self.run(input, meta, refs, messages, reporter))
    }

    /// Run with a fresh meta bag, default messages and a
    /// [`SimpleErrorReporter`].
    pub fn validate(&self, input: Option<&Value>, refs: &RefsTable) -> RunResult<Option<Value>> {
        let mut meta = Meta::new();
        let mut reporter = SimpleErrorReporter::new();
        self.run_blocking(input, &mut meta, refs, None, &mut reporter)
    }
}

impl fmt::Display for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        instr::write_block(f, &self.root, 0)
    }
}
