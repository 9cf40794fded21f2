//! Reference table: externally supplied functions looked up by id.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sieve_types::RefId;

use crate::error::{RunError, RunResult};
use crate::field::{FieldContext, ParseContext};

/// Error a rule returns to abort the whole run.
pub type RuleError = Box<dyn std::error::Error + Send + Sync>;

/// Validation failures are reported through the context; `Err` is fatal.
pub type RuleResult = Result<(), RuleError>;

// ══════════════════════════════════════════════════════════════════════════════
// Rules
// ══════════════════════════════════════════════════════════════════════════════

/// A synchronous validation rule.
pub trait Validate: Send + Sync {
    fn validate(
        &self,
        value: Option<&Value>,
        options: Option<&Value>,
        field: &mut FieldContext<'_>,
    ) -> RuleResult;
}

impl<F> Validate for F
where
    F: Fn(Option<&Value>, Option<&Value>, &mut FieldContext<'_>) -> RuleResult + Send + Sync,
{
    fn validate(
        &self,
        value: Option<&Value>,
        options: Option<&Value>,
        field: &mut FieldContext<'_>,
    ) -> RuleResult {
        self(value, options, field)
    }
}

/// A validation rule the routine awaits.
#[async_trait]
pub trait ValidateAsync: Send + Sync {
    async fn validate(
        &self,
        value: Option<&Value>,
        options: Option<&Value>,
        field: &mut FieldContext<'_>,
    ) -> RuleResult;
}

#[derive(Clone)]
pub enum Validator {
    Sync(Arc<dyn Validate>),
    Async(Arc<dyn ValidateAsync>),
}

/// A rule plus the options it is called with.
#[derive(Clone)]
pub struct ValidationRule {
    pub validator: Validator,
    pub options: Option<Value>,
}

// ══════════════════════════════════════════════════════════════════════════════
// Other function kinds
// ══════════════════════════════════════════════════════════════════════════════

/// Rewrites a raw value before a field is checked. Always called, even for
/// undefined and null.
pub type ParseFn = Arc<dyn Fn(Option<Value>, &mut ParseContext<'_>) -> Option<Value> + Send + Sync>;

/// Rewrites a value as it is written to the output.
pub type TransformFn = Arc<dyn Fn(&Value, &mut FieldContext<'_>) -> Value + Send + Sync>;

/// Selects a union or group arm.
pub type PredicateFn = Arc<dyn Fn(Option<&Value>, &mut FieldContext<'_>) -> bool + Send + Sync>;

/// Runs when no union or group arm matched.
pub type OtherwiseFn = Arc<dyn Fn(Option<&Value>, &mut FieldContext<'_>) + Send + Sync>;

#[derive(Clone)]
pub enum RefEntry {
    Rule(ValidationRule),
    Parse(ParseFn),
    Transform(TransformFn),
    Predicate(PredicateFn),
    Otherwise(OtherwiseFn),
}

impl RefEntry {
    fn kind(&self) -> &'static str {
        match self {
            Self::Rule(_) => "rule",
            Self::Parse(_) => "parse function",
            Self::Transform(_) => "transform function",
            Self::Predicate(_) => "predicate",
            Self::Otherwise(_) => "otherwise handler",
        }
    }
}

impl fmt::Debug for RefEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// RefsTable
// ══════════════════════════════════════════════════════════════════════════════

/// Read-only table consulted by compiled routines at call time.
#[derive(Debug, Clone, Default)]
pub struct RefsTable {
    entries: HashMap<RefId, RefEntry>,
}

macro_rules! lookup {
    ($name:ident, $variant:ident, $ty:ty, $expected:literal) => {
        pub fn $name(&self, id: &RefId) -> RunResult<&$ty> {
            match self.entries.get(id) {
                Some(RefEntry::$variant(entry)) => Ok(entry),
                _ => Err(RunError::UnresolvedRef {
                    id: id.clone(),
                    expected: $expected,
                }),
            }
        }
    };
}

impl RefsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<RefId>, entry: RefEntry) {
        self.entries.insert(id.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    lookup!(rule, Rule, ValidationRule, "rule");
    lookup!(parse, Parse, ParseFn, "parse function");
    lookup!(transform, Transform, TransformFn, "transform function");
    lookup!(predicate, Predicate, PredicateFn, "predicate");
    lookup!(otherwise, Otherwise, OtherwiseFn, "otherwise handler");
}

// ══════════════════════════════════════════════════════════════════════════════
// RefsBuilder
// ══════════════════════════════════════════════════════════════════════════════

/// Registers functions under sequential ids (`ref://1`, `ref://2`, …).
#[derive(Debug, Default)]
pub struct RefsBuilder {
    counter: usize,
    table: RefsTable,
}

impl RefsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn track(&mut self, entry: RefEntry) -> RefId {
        self.counter += 1;
        let id = RefId(format!("ref://{}", self.counter));
        self.table.insert(id.clone(), entry);
        id
    }

    pub fn rule<F>(&mut self, rule: F) -> RefId
    where
        F: Fn(Option<&Value>, Option<&Value>, &mut FieldContext<'_>) -> RuleResult + Send + Sync + 'static,
    {
        self.rule_with_options(rule, None)
    }

    pub fn rule_with_options<F>(&mut self, rule: F, options: Option<Value>) -> RefId
    where
        F: Fn(Option<&Value>, Option<&Value>, &mut FieldContext<'_>) -> RuleResult + Send + Sync + 'static,
    {
        self.track(RefEntry::Rule(ValidationRule {
            validator: Validator::Sync(Arc::new(rule)),
            options,
        }))
    }

    pub fn async_rule<V>(&mut self, rule: V, options: Option<Value>) -> RefId
    where
        V: ValidateAsync + 'static,
    {
        self.track(RefEntry::Rule(ValidationRule {
            validator: Validator::Async(Arc::new(rule)),
            options,
        }))
    }

    pub fn parse<F>(&mut self, parse: F) -> RefId
    where
        F: Fn(Option<Value>, &mut ParseContext<'_>) -> Option<Value> + Send + Sync + 'static,
    {
        self.track(RefEntry::Parse(Arc::new(parse)))
    }

    pub fn transform<F>(&mut self, transform: F) -> RefId
    where
        F: Fn(&Value, &mut FieldContext<'_>) -> Value + Send + Sync + 'static,
    {
        self.track(RefEntry::Transform(Arc::new(transform)))
    }

    pub fn predicate<F>(&mut self, predicate: F) -> RefId
    where
        F: Fn(Option<&Value>, &mut FieldContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.track(RefEntry::Predicate(Arc::new(predicate)))
    }

    pub fn otherwise<F>(&mut self, otherwise: F) -> RefId
    where
        F: Fn(Option<&Value>, &mut FieldContext<'_>) + Send + Sync + 'static,
    {
        self.track(RefEntry::Otherwise(Arc::new(otherwise)))
    }

    pub fn build(self) -> RefsTable {
        self.table
    }
}
