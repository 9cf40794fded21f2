//! Field state and the context handed to external functions.

use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;

use serde_json::Value;
use tracing::trace;

use crate::reporter::{ErrorReporter, FieldInfo, MessagesProvider};
use crate::Meta;

// ══════════════════════════════════════════════════════════════════════════════
// Field names & paths
// ══════════════════════════════════════════════════════════════════════════════

/// Runtime name of a field inside its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldName {
    Root,
    Key(String),
    Index(usize),
}

impl FieldName {
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => Ok(()),
            Self::Key(key) => f.write_str(key),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Dotted runtime path of a field.
///
/// Paths known at compile time are borrowed as-is. Paths below an array
/// element or record entry depend on the live index/key and are built
/// from the parent path on first use, then memoized for the lifetime of
/// the field.
#[derive(Debug)]
pub struct FieldPath<'a> {
    fixed: Option<&'a str>,
    parent: Option<&'a FieldPath<'a>>,
    segment: FieldName,
    resolved: OnceLock<String>,
}

impl<'a> FieldPath<'a> {
    pub fn fixed(path: &'a str) -> Self {
        Self {
            fixed: Some(path),
            parent: None,
            segment: FieldName::Root,
            resolved: OnceLock::new(),
        }
    }

    pub fn deferred(parent: Option<&'a FieldPath<'a>>, segment: FieldName) -> Self {
        Self {
            fixed: None,
            parent,
            segment,
            resolved: OnceLock::new(),
        }
    }

    pub fn get(&self) -> &str {
        if let Some(fixed) = self.fixed {
            return fixed;
        }
        self.resolved.get_or_init(|| {
            let parent = self.parent.map_or("", FieldPath::get);
            if parent.is_empty() {
                self.segment.to_string()
            } else {
                format!("{parent}.{}", self.segment)
            }
        })
    }

    /// Whether a deferred path has been computed yet.
    pub fn is_resolved(&self) -> bool {
        self.fixed.is_some() || self.resolved.get().is_some()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Field
// ══════════════════════════════════════════════════════════════════════════════

/// Live state of one field while its compiled body runs.
///
/// `None` stands for "undefined": an absent key or a position past the end
/// of an array. The value stays borrowed from the parent until a parse
/// function or a `mutate` call replaces it.
#[derive(Debug)]
pub struct Field<'a> {
    pub value: Option<Cow<'a, Value>>,
    /// Neither undefined nor null.
    pub is_defined: bool,
    pub is_valid: bool,
    pub name: FieldName,
    pub wildcard_path: &'a str,
    pub path: FieldPath<'a>,
    /// Value of the enclosing container, if any.
    pub parent: Option<&'a Value>,
    pub is_array_member: bool,
}

impl<'a> Field<'a> {
    pub fn new(
        name: FieldName,
        wildcard_path: &'a str,
        path: FieldPath<'a>,
        parent: Option<&'a Value>,
        is_array_member: bool,
    ) -> Self {
        Self {
            value: None,
            is_defined: false,
            is_valid: true,
            name,
            wildcard_path,
            path,
            parent,
            is_array_member,
        }
    }

    /// Replace the value and recompute `is_defined`.
    pub fn define(&mut self, value: Option<Cow<'a, Value>>, empty_strings_to_null: bool) {
        let value = match value {
            Some(v) if empty_strings_to_null && matches!(v.as_ref(), Value::String(s) if s.is_empty()) => {
                Some(Cow::Owned(Value::Null))
            }
            other => other,
        };
        self.is_defined = value.as_deref().is_some_and(|v| !v.is_null());
        self.value = value;
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_deref()
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value(), Some(Value::Null))
    }

    /// Move the value out, cloning it only if it is still borrowed.
    pub fn take_value(&mut self) -> Option<Value> {
        self.is_defined = false;
        self.value.take().map(Cow::into_owned)
    }

    /// Fold what an external function did through its context back in.
    pub fn apply(&mut self, outcome: Outcome, empty_strings_to_null: bool) {
        self.is_valid = outcome.is_valid;
        if let Some(value) = outcome.mutation {
            self.define(value.map(Cow::Owned), empty_strings_to_null);
        }
    }

    pub fn info(&self) -> FieldInfo<'_> {
        FieldInfo {
            name: &self.name,
            field_path: self.path.get(),
            wildcard_path: self.wildcard_path,
            is_array_member: self.is_array_member,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// FieldContext
// ══════════════════════════════════════════════════════════════════════════════

/// What an external function leaves behind on its field.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub is_valid: bool,
    /// `Some(v)` when the function called [`FieldContext::mutate`].
    pub mutation: Option<Option<Value>>,
}

/// Context passed to rules, transforms, predicates and otherwise handlers.
///
/// The field value itself is passed alongside as a separate argument.
pub struct FieldContext<'c> {
    /// The root input of the run.
    pub data: Option<&'c Value>,
    pub meta: &'c mut Meta,
    pub name: &'c FieldName,
    pub wildcard_path: &'c str,
    pub parent: Option<&'c Value>,
    pub is_array_member: bool,
    pub is_defined: bool,
    is_valid: bool,
    path: &'c FieldPath<'c>,
    reporter: &'c mut dyn ErrorReporter,
    messages: &'c dyn MessagesProvider,
    mutation: Option<Option<Value>>,
}

impl<'c> FieldContext<'c> {
    pub(crate) fn new(
        data: Option<&'c Value>,
        meta: &'c mut Meta,
        field: &'c Field<'_>,
        reporter: &'c mut dyn ErrorReporter,
        messages: &'c dyn MessagesProvider,
    ) -> Self {
        Self {
            data,
            meta,
            name: &field.name,
            wildcard_path: field.wildcard_path,
            parent: field.parent,
            is_array_member: field.is_array_member,
            is_defined: field.is_defined,
            is_valid: field.is_valid,
            path: &field.path,
            reporter,
            messages,
            mutation: None,
        }
    }

    /// Runtime path of the field, computed on first call.
    pub fn field_path(&self) -> &str {
        self.path.get()
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Record an error against this field and mark it invalid.
    pub fn report(&mut self, message: &str, rule: &str, args: Option<&Value>) {
        self.is_valid = false;
        let path = self.path;
        let info = FieldInfo {
            name: self.name,
            field_path: path.get(),
            wildcard_path: self.wildcard_path,
            is_array_member: self.is_array_member,
        };
        trace!(field = info.field_path, rule, "rule reported");
        let message = self.messages.get_message(message, rule, &info, args);
        self.reporter.report(message, rule, &info, args);
    }

    /// Replace the field value for the rest of the pipeline.
    pub fn mutate(&mut self, value: Option<Value>) {
        self.is_defined = value.as_ref().is_some_and(|v| !v.is_null());
        self.mutation = Some(value);
    }

    pub fn finish(self) -> Outcome {
        Outcome {
            is_valid: self.is_valid,
            mutation: self.mutation,
        }
    }
}

impl fmt::Debug for FieldContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldContext")
            .field("name", self.name)
            .field("wildcard_path", &self.wildcard_path)
            .field("is_valid", &self.is_valid)
            .field("is_defined", &self.is_defined)
            .field("is_array_member", &self.is_array_member)
            .finish_non_exhaustive()
    }
}

/// Context passed to parse functions.
pub struct ParseContext<'c> {
    pub data: Option<&'c Value>,
    pub meta: &'c mut Meta,
    pub parent: Option<&'c Value>,
}
