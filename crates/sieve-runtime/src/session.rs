//! Per-run state shared by every field of one invocation.

use serde_json::Value;
use sieve_types::CompilerOptions;
use tracing::trace;

use crate::field::{Field, FieldContext, ParseContext};
use crate::helpers;
use crate::refs::RefsTable;
use crate::reporter::{ErrorReporter, MessagesProvider, ValidationError};
use crate::Meta;

pub const REQUIRED: &str = "value is required";
pub const MUST_BE_DEFINED: &str = "value must be defined";
pub const NOT_AN_OBJECT: &str = "value is not a valid object";
pub const NOT_AN_ARRAY: &str = "value is not a valid array";

/// Everything one invocation of a compiled routine shares across fields:
/// the root input, the meta bag, the reference table and the error
/// collaborators.
pub struct Session<'s> {
    pub data: Option<&'s Value>,
    pub refs: &'s RefsTable,
    pub options: CompilerOptions,
    meta: &'s mut Meta,
    messages: &'s dyn MessagesProvider,
    reporter: &'s mut dyn ErrorReporter,
}

impl<'s> Session<'s> {
    pub fn new(
        data: Option<&'s Value>,
        meta: &'s mut Meta,
        refs: &'s RefsTable,
        messages: &'s dyn MessagesProvider,
        reporter: &'s mut dyn ErrorReporter,
        options: CompilerOptions,
    ) -> Self {
        Self {
            data,
            refs,
            options,
            meta,
            messages,
            reporter,
        }
    }

    /// Context for a rule, transform, predicate or otherwise handler.
    pub fn context<'c>(&'c mut self, field: &'c Field<'_>) -> FieldContext<'c> {
        FieldContext::new(
            self.data,
            &mut *self.meta,
            field,
            &mut *self.reporter,
            self.messages,
        )
    }

    pub fn parse_context<'c>(&'c mut self, parent: Option<&'c Value>) -> ParseContext<'c> {
        ParseContext {
            data: self.data,
            meta: &mut *self.meta,
            parent,
        }
    }

    pub fn meta(&self) -> &Meta {
        &*self.meta
    }

    pub fn has_errors(&self) -> bool {
        self.reporter.has_errors()
    }

    pub fn create_error(&mut self) -> ValidationError {
        self.reporter.create_error()
    }

    /// Report an error against `field` and mark it invalid.
    pub fn report(&mut self, field: &mut Field<'_>, message: &str, rule: &str, args: Option<&Value>) {
        field.is_valid = false;
        let info = field.info();
        trace!(field = info.field_path, rule, "field failed");
        let message = self.messages.get_message(message, rule, &info, args);
        self.reporter.report(message, rule, &info, args);
    }

    // ── Existence guards ──

    /// Fails on undefined and null.
    pub fn ensure_exists(&mut self, field: &mut Field<'_>) -> bool {
        if helpers::exists(field.value()) {
            return true;
        }
        self.report(field, REQUIRED, "required", None);
        false
    }

    /// Fails on undefined only.
    pub fn ensure_is_defined(&mut self, field: &mut Field<'_>) -> bool {
        if field.value.is_some() {
            return true;
        }
        self.report(field, MUST_BE_DEFINED, "required", None);
        false
    }

    // ── Type guards ──
    //
    // Undefined and null fail silently: the existence guard already spoke.

    pub fn ensure_is_object(&mut self, field: &mut Field<'_>) -> bool {
        if !helpers::exists(field.value()) {
            return false;
        }
        if helpers::is_object(field.value()) {
            return true;
        }
        self.report(field, NOT_AN_OBJECT, "object", None);
        false
    }

    pub fn ensure_is_array(&mut self, field: &mut Field<'_>) -> bool {
        if !helpers::exists(field.value()) {
            return false;
        }
        if helpers::is_array(field.value()) {
            return true;
        }
        self.report(field, NOT_AN_ARRAY, "array", None);
        false
    }
}
