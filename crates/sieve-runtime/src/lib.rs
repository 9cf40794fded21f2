//! Runtime support for compiled sieve routines.
//!
//! Everything a compiled routine calls while it walks input data lives
//! here: field state and the context handed to external functions, the
//! reference table those functions are looked up in, the error reporter
//! and messages provider contracts (with default implementations), and
//! the small helper routines for existence checks, type guards and
//! copying unknown properties.

mod error;
mod field;
pub mod helpers;
mod refs;
mod reporter;
mod session;

pub use error::{RunError, RunResult};
pub use field::{Field, FieldContext, FieldName, FieldPath, Outcome, ParseContext};
pub use refs::{
    OtherwiseFn, ParseFn, PredicateFn, RefEntry, RefsBuilder, RefsTable, RuleError, RuleResult,
    TransformFn, Validate, ValidateAsync, ValidationRule, Validator,
};
pub use reporter::{
    ErrorMessage, ErrorReporter, FieldInfo, MessagesProvider, SimpleErrorReporter,
    SimpleMessagesProvider, ValidationError,
};
pub use session::{Session, MUST_BE_DEFINED, NOT_AN_ARRAY, NOT_AN_OBJECT, REQUIRED};

/// Metadata bag shared by reference with every external function of one run.
pub type Meta = serde_json::Map<String, serde_json::Value>;
