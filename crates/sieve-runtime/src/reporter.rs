//! Error reporter and messages provider contracts, with their defaults.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::field::FieldName;

/// Read-only view of the field an error is reported against.
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo<'c> {
    pub name: &'c FieldName,
    pub field_path: &'c str,
    pub wildcard_path: &'c str,
    pub is_array_member: bool,
}

// ══════════════════════════════════════════════════════════════════════════════
// Contracts
// ══════════════════════════════════════════════════════════════════════════════

/// Collects reported errors for one run.
pub trait ErrorReporter: Send {
    fn has_errors(&self) -> bool;

    fn report(&mut self, message: String, rule: &str, field: &FieldInfo<'_>, args: Option<&Value>);

    /// Build the aggregate error from everything reported so far.
    fn create_error(&mut self) -> ValidationError;
}

/// Resolves the final text of a reported message.
pub trait MessagesProvider: Send + Sync {
    fn get_message(
        &self,
        default_message: &str,
        rule: &str,
        field: &FieldInfo<'_>,
        args: Option<&Value>,
    ) -> String;
}

// ══════════════════════════════════════════════════════════════════════════════
// ValidationError
// ══════════════════════════════════════════════════════════════════════════════

/// One reported error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorMessage {
    pub message: String,
    pub rule: String,
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

/// Every error reported during a run, in report order.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("validation failed with {} error(s)", .messages.len())]
pub struct ValidationError {
    pub messages: Vec<ErrorMessage>,
}

impl ValidationError {
    /// Just the message texts.
    pub fn texts(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.message.as_str()).collect()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Defaults
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct SimpleErrorReporter {
    messages: Vec<ErrorMessage>,
}

impl SimpleErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ErrorMessage] {
        &self.messages
    }
}

impl ErrorReporter for SimpleErrorReporter {
    fn has_errors(&self) -> bool {
        !self.messages.is_empty()
    }

    fn report(&mut self, message: String, rule: &str, field: &FieldInfo<'_>, args: Option<&Value>) {
        let index = if field.is_array_member {
            field.name.index()
        } else {
            None
        };
        self.messages.push(ErrorMessage {
            message,
            rule: rule.to_string(),
            field: field.field_path.to_string(),
            index,
            args: args.cloned(),
        });
    }

    fn create_error(&mut self) -> ValidationError {
        ValidationError {
            messages: self.messages.clone(),
        }
    }
}

/// Returns default messages unless overridden.
///
/// Overrides are looked up by `"{field_path}.{rule}"` first, then by rule.
#[derive(Debug, Default, Clone)]
pub struct SimpleMessagesProvider {
    overrides: HashMap<String, String>,
}

impl SimpleMessagesProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), message.into());
        self
    }
}

impl MessagesProvider for SimpleMessagesProvider {
    fn get_message(
        &self,
        default_message: &str,
        rule: &str,
        field: &FieldInfo<'_>,
        _args: Option<&Value>,
    ) -> String {
        let scoped = format!("{}.{rule}", field.field_path);
        self.overrides
            .get(&scoped)
            .or_else(|| self.overrides.get(rule))
            .cloned()
            .unwrap_or_else(|| default_message.to_string())
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{} ({})", self.message, self.rule)
        } else {
            write!(f, "{}: {} ({})", self.field, self.message, self.rule)
        }
    }
}
