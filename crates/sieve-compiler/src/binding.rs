//! Field binding resolver.
//!
//! Every compiled node gets one [`Binding`]: a unique name plus the recipe
//! for reading its value out of the parent, writing its output into the
//! parent's output, and naming its position for error messages. Union
//! branches reuse the binding of the union itself.

use std::fmt;

use sieve_types::Node;

/// Placeholder for dynamic segments in wildcard paths.
pub const WILDCARD: &str = "*";

/// Structural position of a node being bound.
#[derive(Debug, Clone, Copy)]
pub enum Parent<'b> {
    Root,
    Object(&'b Binding),
    /// A fixed position: tuple properties and leading array children.
    Tuple { parent: &'b Binding, index: usize },
    /// The `each` schema of an array.
    Array(&'b Binding),
    /// The `each` schema of a record.
    Record(&'b Binding),
}

/// How a value is read from its parent, or written into the parent output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Root,
    Key(String),
    Index(usize),
    /// The live index of the enclosing element loop.
    Element,
    /// The live key of the enclosing entry loop.
    Entry,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::Key(key) => write!(f, "[{key:?}]"),
            Self::Index(i) => write!(f, "[{i}]"),
            Self::Element => f.write_str("[index]"),
            Self::Entry => f.write_str("[key]"),
        }
    }
}

/// Runtime field path of a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPathExpr {
    /// Known at compile time.
    Static(String),
    /// Parent path plus the live segment, computed lazily per field.
    Dynamic,
}

impl fmt::Display for FieldPathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(path) => write!(f, "{path:?}"),
            Self::Dynamic => f.write_str("<dynamic>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub value_access: Access,
    pub output_access: Access,
    pub field_path: FieldPathExpr,
    pub wildcard_path: String,
    /// Name of the enclosing binding.
    pub parent: Option<String>,
    pub is_array_member: bool,
}

/// Derive the binding for `node` at `parent`.
///
/// `counter` is the engine's current counter value; it is only consumed
/// for fixed positions. Loop items derive their name from the parent.
pub fn resolve(node: &Node, parent: Parent<'_>, counter: usize) -> Binding {
    match parent {
        Parent::Root => Binding {
            name: "root_item".to_string(),
            value_access: Access::Root,
            output_access: Access::Root,
            field_path: FieldPathExpr::Static(String::new()),
            wildcard_path: String::new(),
            parent: None,
            is_array_member: false,
        },
        Parent::Object(p) => {
            let field_name = node.field_name();
            Binding {
                name: numbered(node.property_name(), counter),
                value_access: Access::Key(field_name.to_string()),
                output_access: Access::Key(node.property_name().to_string()),
                field_path: child_path(&p.field_path, field_name),
                wildcard_path: join(&p.wildcard_path, field_name),
                parent: Some(p.name.clone()),
                is_array_member: false,
            }
        }
        Parent::Tuple { parent: p, index } => {
            let segment = index.to_string();
            let label = match node.property_name() {
                "" => segment.as_str(),
                name => name,
            };
            Binding {
                name: numbered(label, counter),
                value_access: Access::Index(index),
                output_access: Access::Index(index),
                field_path: child_path(&p.field_path, &segment),
                wildcard_path: join(&p.wildcard_path, &segment),
                parent: Some(p.name.clone()),
                is_array_member: true,
            }
        }
        Parent::Array(p) => item(p, Access::Element, true),
        Parent::Record(p) => item(p, Access::Entry, false),
    }
}

fn item(parent: &Binding, access: Access, is_array_member: bool) -> Binding {
    Binding {
        name: format!("{}_item", parent.name),
        value_access: access.clone(),
        output_access: access,
        field_path: FieldPathExpr::Dynamic,
        wildcard_path: join(&parent.wildcard_path, WILDCARD),
        parent: Some(parent.name.clone()),
        is_array_member,
    }
}

fn numbered(label: &str, counter: usize) -> String {
    let mut name: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() {
        name.push_str("field");
    }
    format!("{name}_{counter}")
}

fn child_path(parent: &FieldPathExpr, segment: &str) -> FieldPathExpr {
    match parent {
        FieldPathExpr::Static(path) => FieldPathExpr::Static(join(path, segment)),
        FieldPathExpr::Dynamic => FieldPathExpr::Dynamic,
    }
}

pub(crate) fn join(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}.{segment}")
    }
}
