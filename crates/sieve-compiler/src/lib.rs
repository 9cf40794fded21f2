//! Sieve schema compiler: turns a schema node tree into one reusable
//! validate-and-transform routine.
//!
//! # Architecture
//!
//! Compilation walks the schema once. Each node is bound to a
//! [`binding::Binding`] (unique name, value access, output access, field
//! path, wildcard path), then handed to its per-kind emitter, which writes
//! instructions into a [`buffer::Fragment`]. Container emitters stage their
//! children in child fragments before wrapping them in type and validity
//! guards.
//!
//! The result is a [`CompiledSchema`]: a tree of [`instr::FieldBlock`]s.
//! Running it activates one field per block, borrowing values from the
//! input and only copying what ends up in the output.
//!
//! ## Running
//! - [`CompiledSchema::run`]: async; awaits asynchronous rules in place
//! - [`CompiledSchema::run_blocking`]: the same, on the current thread
//! - [`CompiledSchema::validate`]: default collaborators, fresh meta bag
//!
//! External functions are looked up by [`sieve_types::RefId`] in a
//! [`sieve_runtime::RefsTable`] on every call; nothing is captured at
//! compile time.

pub mod binding;
pub mod buffer;
pub mod compiler;
mod exec;
pub mod instr;
mod nodes;
pub mod program;

pub use compiler::{compile, compile_json, Compiler};
pub use program::CompiledSchema;
pub use sieve_types::{CompileError, CompileResult, CompilerOptions};
