//! Schema node tree.
//!
//! A schema is a tree of [`Node`]s. Every value-carrying node kind shares a
//! [`FieldAttrs`] record; `union` and `group` do not, since they only
//! select which other node applies to a value.
//!
//! External functions (rules, parse/transform functions, predicates) are
//! never stored in the tree. Nodes refer to them through opaque [`RefId`]s
//! that are resolved against a reference table when a compiled routine runs.
//!
//! The tree serializes to JSON with a `"type"` tag and camelCase keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CompileResult;

// ══════════════════════════════════════════════════════════════════════════════
// Reference identifiers
// ══════════════════════════════════════════════════════════════════════════════

/// Opaque identifier of an externally supplied function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefId(pub String);

impl RefId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RefId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RefId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Nodes
// ══════════════════════════════════════════════════════════════════════════════

/// One node of a schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Literal(LiteralNode),
    Object(ObjectNode),
    Array(ArrayNode),
    Record(RecordNode),
    Tuple(TupleNode),
    Union(UnionNode),
    /// Only meaningful among an object's children; see [`ObjectNode::groups`].
    Group(GroupNode),
}

/// Discriminant of a [`Node`], used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Literal,
    Object,
    Array,
    Record,
    Tuple,
    Union,
    Group,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Literal => "literal",
            Self::Object => "object",
            Self::Array => "array",
            Self::Record => "record",
            Self::Tuple => "tuple",
            Self::Union => "union",
            Self::Group => "group",
        };
        f.write_str(name)
    }
}

impl Node {
    /// Load a schema tree from JSON.
    pub fn from_json(json: &str) -> CompileResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> CompileResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Literal(_) => NodeKind::Literal,
            Self::Object(_) => NodeKind::Object,
            Self::Array(_) => NodeKind::Array,
            Self::Record(_) => NodeKind::Record,
            Self::Tuple(_) => NodeKind::Tuple,
            Self::Union(_) => NodeKind::Union,
            Self::Group(_) => NodeKind::Group,
        }
    }

    /// The shared field record, absent for `union` and `group`.
    pub fn attrs(&self) -> Option<&FieldAttrs> {
        match self {
            Self::Literal(n) => Some(&n.attrs),
            Self::Object(n) => Some(&n.attrs),
            Self::Array(n) => Some(&n.attrs),
            Self::Record(n) => Some(&n.attrs),
            Self::Tuple(n) => Some(&n.attrs),
            Self::Union(_) | Self::Group(_) => None,
        }
    }

    /// Source key of this node; empty for groups.
    pub fn field_name(&self) -> &str {
        match self {
            Self::Union(n) => &n.field_name,
            Self::Group(_) => "",
            other => other.attrs().map_or("", |a| a.field_name.as_str()),
        }
    }

    /// Output key of this node; empty for groups.
    pub fn property_name(&self) -> &str {
        match self {
            Self::Union(n) => &n.property_name,
            Self::Group(_) => "",
            other => other.attrs().map_or("", |a| a.property_name.as_str()),
        }
    }
}

// ── Shared field record ──────────────────────────────────────────────────────

/// Attributes shared by every value-carrying node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAttrs {
    /// Stop this node's own validations after the first failure.
    #[serde(default = "default_bail")]
    pub bail: bool,
    /// Key the value is read from.
    #[serde(default)]
    pub field_name: String,
    /// Key the value is written to.
    #[serde(default)]
    pub property_name: String,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default)]
    pub allow_null: bool,
    /// Rewrites the raw value before existence checks and validations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_fn_id: Option<RefId>,
    #[serde(default)]
    pub validations: Vec<Validation>,
}

fn default_bail() -> bool {
    true
}

impl FieldAttrs {
    /// Required, non-nullable field read from and written to `name`.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            bail: true,
            field_name: name.clone(),
            property_name: name,
            is_optional: false,
            allow_null: false,
            parse_fn_id: None,
            validations: Vec::new(),
        }
    }

    /// Write the output under a different key than the source key.
    pub fn renamed(mut self, property_name: impl Into<String>) -> Self {
        self.property_name = property_name.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.allow_null = true;
        self
    }

    pub fn bail(mut self, bail: bool) -> Self {
        self.bail = bail;
        self
    }

    pub fn parse(mut self, parse_fn_id: impl Into<RefId>) -> Self {
        self.parse_fn_id = Some(parse_fn_id.into());
        self
    }

    pub fn validate(mut self, validation: Validation) -> Self {
        self.validations.push(validation);
        self
    }
}

impl Default for FieldAttrs {
    fn default() -> Self {
        Self::named("")
    }
}

/// One entry of a node's validation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub rule: RefId,
    #[serde(default)]
    pub is_async: bool,
    /// Implicit rules also run when the value is missing.
    #[serde(default)]
    pub implicit: bool,
}

impl Validation {
    pub fn sync(rule: impl Into<RefId>) -> Self {
        Self {
            rule: rule.into(),
            is_async: false,
            implicit: false,
        }
    }

    pub fn asynchronous(rule: impl Into<RefId>) -> Self {
        Self {
            rule: rule.into(),
            is_async: true,
            implicit: false,
        }
    }

    pub fn implicit(mut self) -> Self {
        self.implicit = true;
        self
    }
}

// ── Literal ──────────────────────────────────────────────────────────────────

/// A scalar (or opaque) value validated and copied as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiteralNode {
    #[serde(flatten)]
    pub attrs: FieldAttrs,
    /// Rewrites the value when it is written to the output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_fn_id: Option<RefId>,
}

impl LiteralNode {
    pub fn new(attrs: FieldAttrs) -> Self {
        Self {
            attrs,
            transform_fn_id: None,
        }
    }

    pub fn transform(mut self, transform_fn_id: impl Into<RefId>) -> Self {
        self.transform_fn_id = Some(transform_fn_id.into());
        self
    }
}

// ── Object ───────────────────────────────────────────────────────────────────

/// A record with a fixed set of named children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectNode {
    #[serde(flatten)]
    pub attrs: FieldAttrs,
    #[serde(default)]
    pub allow_unknown_properties: bool,
    #[serde(default)]
    pub children: Vec<Node>,
    /// Conditional property sets merged into this object's output.
    #[serde(default)]
    pub groups: Vec<GroupNode>,
}

impl ObjectNode {
    pub fn new(attrs: FieldAttrs) -> Self {
        Self {
            attrs,
            allow_unknown_properties: false,
            children: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn group(mut self, group: GroupNode) -> Self {
        self.groups.push(group);
        self
    }

    pub fn allow_unknown(mut self) -> Self {
        self.allow_unknown_properties = true;
        self
    }
}

// ── Array ────────────────────────────────────────────────────────────────────

/// A list: optional fixed leading positions followed by a homogeneous rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayNode {
    #[serde(flatten)]
    pub attrs: FieldAttrs,
    #[serde(default)]
    pub allow_unknown_properties: bool,
    /// Schema for every element from `children.len()` onwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub each: Option<Box<Node>>,
    /// Schemas for the leading positions, in order.
    #[serde(default)]
    pub children: Vec<Node>,
}

impl ArrayNode {
    pub fn new(attrs: FieldAttrs) -> Self {
        Self {
            attrs,
            allow_unknown_properties: false,
            each: None,
            children: Vec::new(),
        }
    }

    pub fn each(mut self, node: impl Into<Node>) -> Self {
        self.each = Some(Box::new(node.into()));
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn allow_unknown(mut self) -> Self {
        self.allow_unknown_properties = true;
        self
    }
}

// ── Tuple ────────────────────────────────────────────────────────────────────

/// A strictly positional list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TupleNode {
    #[serde(flatten)]
    pub attrs: FieldAttrs,
    #[serde(default)]
    pub allow_unknown_properties: bool,
    #[serde(default)]
    pub properties: Vec<Node>,
}

impl TupleNode {
    pub fn new(attrs: FieldAttrs) -> Self {
        Self {
            attrs,
            allow_unknown_properties: false,
            properties: Vec::new(),
        }
    }

    pub fn property(mut self, node: impl Into<Node>) -> Self {
        self.properties.push(node.into());
        self
    }

    pub fn allow_unknown(mut self) -> Self {
        self.allow_unknown_properties = true;
        self
    }
}

// ── Record ───────────────────────────────────────────────────────────────────

/// A map with dynamic keys; `each` applies to every value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordNode {
    #[serde(flatten)]
    pub attrs: FieldAttrs,
    pub each: Box<Node>,
}

impl RecordNode {
    pub fn new(attrs: FieldAttrs, each: impl Into<Node>) -> Self {
        Self {
            attrs,
            each: Box::new(each.into()),
        }
    }
}

// ── Union ────────────────────────────────────────────────────────────────────

/// Picks the first branch whose predicate accepts the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnionNode {
    #[serde(default)]
    pub field_name: String,
    #[serde(default)]
    pub property_name: String,
    #[serde(default)]
    pub conditions: Vec<UnionCondition>,
    /// Called with the value when no predicate matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otherwise: Option<RefId>,
}

/// One `predicate → schema` arm of a union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnionCondition {
    pub predicate: RefId,
    pub schema: Node,
}

impl UnionNode {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            field_name: name.clone(),
            property_name: name,
            conditions: Vec::new(),
            otherwise: None,
        }
    }

    pub fn renamed(mut self, property_name: impl Into<String>) -> Self {
        self.property_name = property_name.into();
        self
    }

    pub fn when(mut self, predicate: impl Into<RefId>, schema: impl Into<Node>) -> Self {
        self.conditions.push(UnionCondition {
            predicate: predicate.into(),
            schema: schema.into(),
        });
        self
    }

    pub fn otherwise(mut self, otherwise: impl Into<RefId>) -> Self {
        self.otherwise = Some(otherwise.into());
        self
    }
}

// ── Group ────────────────────────────────────────────────────────────────────

/// Conditional set of extra object properties.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNode {
    #[serde(default)]
    pub conditions: Vec<GroupCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otherwise: Option<RefId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCondition {
    pub predicate: RefId,
    pub schema: GroupBranch,
}

/// What a matching group arm contributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GroupBranch {
    /// Properties merged flat into the enclosing object.
    SubObject { children: Vec<Node> },
    /// A nested predicate chain.
    Group(GroupNode),
}

impl GroupNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn when(mut self, predicate: impl Into<RefId>, children: Vec<Node>) -> Self {
        self.conditions.push(GroupCondition {
            predicate: predicate.into(),
            schema: GroupBranch::SubObject { children },
        });
        self
    }

    pub fn when_group(mut self, predicate: impl Into<RefId>, group: GroupNode) -> Self {
        self.conditions.push(GroupCondition {
            predicate: predicate.into(),
            schema: GroupBranch::Group(group),
        });
        self
    }

    pub fn otherwise(mut self, otherwise: impl Into<RefId>) -> Self {
        self.otherwise = Some(otherwise.into());
        self
    }

    /// Every source key any arm of this group may declare, recursively.
    pub fn declared_field_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for condition in &self.conditions {
            match &condition.schema {
                GroupBranch::SubObject { children } => {
                    for child in children {
                        match child {
                            Node::Group(nested) => names.extend(nested.declared_field_names()),
                            other => names.push(other.field_name()),
                        }
                    }
                }
                GroupBranch::Group(nested) => names.extend(nested.declared_field_names()),
            }
        }
        names
    }
}

// ── Conversions ──────────────────────────────────────────────────────────────

macro_rules! into_node {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Node {
                fn from(node: $ty) -> Self {
                    Node::$variant(node)
                }
            }
        )*
    };
}

into_node! {
    LiteralNode => Literal,
    ObjectNode => Object,
    ArrayNode => Array,
    RecordNode => Record,
    TupleNode => Tuple,
    UnionNode => Union,
    GroupNode => Group,
}
