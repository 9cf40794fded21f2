//! Shared types for the sieve schema compiler.
//!
//! This crate defines the schema node tree, reference identifiers,
//! compiler options and compile-time error types used by the compiler
//! and the runtime crates.

mod error;
mod options;
pub mod schema;

pub use error::{CompileError, CompileResult};
pub use options::CompilerOptions;
pub use schema::{
    ArrayNode, FieldAttrs, GroupBranch, GroupCondition, GroupNode, LiteralNode, Node, NodeKind,
    ObjectNode, RecordNode, RefId, TupleNode, UnionCondition, UnionNode, Validation,
};
