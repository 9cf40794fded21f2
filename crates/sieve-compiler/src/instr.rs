//! The instruction tree a compiled schema is made of.
//!
//! Each [`FieldBlock`] is one field activation: the executor defines the
//! field from its parent using the block's [`Binding`], runs the body, then
//! writes whatever output the body produced into the parent output.

use std::fmt;

use sieve_types::RefId;

use crate::binding::Binding;

#[derive(Debug, Clone)]
pub struct FieldBlock {
    pub binding: Binding,
    pub body: Vec<Instr>,
}

#[derive(Debug, Clone)]
pub struct ValidationCall {
    pub rule: RefId,
    pub is_async: bool,
    /// Skip when the field is already invalid.
    pub bail_guard: bool,
    /// Skip when the field is undefined or null.
    pub defined_guard: bool,
}

/// One `predicate → body` arm of a union or group.
#[derive(Debug, Clone)]
pub struct Arm {
    pub predicate: RefId,
    pub body: Vec<Instr>,
}

#[derive(Debug, Clone)]
pub enum Instr {
    /// Activate a child field at a fixed position.
    Field(Box<FieldBlock>),
    /// Rewrite the field value through a parse function.
    Parse(RefId),
    /// Report `required` on undefined or null.
    EnsureExists,
    /// Report `required` (must be defined) on undefined.
    EnsureIsDefined,
    Validate(ValidationCall),
    IfValid(Vec<Instr>),
    /// Run `body` when the value is an object, else write `null` output
    /// when the value is null and `null_output` is set.
    IfObject { body: Vec<Instr>, null_output: bool },
    IfArray { body: Vec<Instr>, null_output: bool },
    /// Start the output as an object. `keep_unknown` lists declared keys to
    /// leave out of a deep copy of the source; `None` starts empty.
    SeedObject { keep_unknown: Option<Vec<String>> },
    SeedArray { keep_unknown: bool },
    /// Activate `item` for every element from index `from` onwards.
    EachElement { from: usize, item: Box<FieldBlock> },
    /// Activate `item` for every entry of an object.
    EachEntry { item: Box<FieldBlock> },
    /// First matching arm wins; `otherwise` runs when none matched.
    Branches { arms: Vec<Arm>, otherwise: Option<RefId> },
    /// Write a literal value, or `null` when allowed.
    Output { transform: Option<RefId>, null_output: bool },
}

impl Instr {
    /// Number of instructions in this subtree, nested blocks included.
    pub fn count(&self) -> usize {
        1 + match self {
            Self::Field(block) | Self::EachElement { item: block, .. } | Self::EachEntry { item: block } => {
                count_all(&block.body)
            }
            Self::IfValid(body) | Self::IfObject { body, .. } | Self::IfArray { body, .. } => count_all(body),
            Self::Branches { arms, .. } => arms.iter().map(|arm| count_all(&arm.body)).sum(),
            _ => 0,
        }
    }
}

pub fn count_all(instrs: &[Instr]) -> usize {
    instrs.iter().map(Instr::count).sum()
}

/// Binding names of every field block under `instrs`, in emission order.
pub(crate) fn collect_bindings<'a>(instrs: &'a [Instr], names: &mut Vec<&'a str>) {
    for instr in instrs {
        match instr {
            Instr::Field(block) | Instr::EachElement { item: block, .. } | Instr::EachEntry { item: block } => {
                names.push(&block.binding.name);
                collect_bindings(&block.body, names);
            }
            Instr::IfValid(body) | Instr::IfObject { body, .. } | Instr::IfArray { body, .. } => {
                collect_bindings(body, names);
            }
            Instr::Branches { arms, .. } => {
                for arm in arms {
                    collect_bindings(&arm.body, names);
                }
            }
            _ => {}
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Listing
// ══════════════════════════════════════════════════════════════════════════════

const INDENT: &str = "  ";

pub(crate) fn write_block(f: &mut fmt::Formatter<'_>, block: &FieldBlock, depth: usize) -> fmt::Result {
    let b = &block.binding;
    writeln!(
        f,
        "{}field {} = {} -> {} path={} wildcard={:?}{}",
        INDENT.repeat(depth),
        b.name,
        b.value_access,
        b.output_access,
        b.field_path,
        b.wildcard_path,
        if b.is_array_member { " array_member" } else { "" },
    )?;
    write_instrs(f, &block.body, depth + 1)
}

fn write_instrs(f: &mut fmt::Formatter<'_>, instrs: &[Instr], depth: usize) -> fmt::Result {
    let pad = INDENT.repeat(depth);
    for instr in instrs {
        match instr {
            Instr::Field(block) => write_block(f, block, depth)?,
            Instr::Parse(id) => writeln!(f, "{pad}parse {id}")?,
            Instr::EnsureExists => writeln!(f, "{pad}ensure_exists")?,
            Instr::EnsureIsDefined => writeln!(f, "{pad}ensure_is_defined")?,
            Instr::Validate(call) => {
                write!(f, "{pad}validate {}", call.rule)?;
                if call.is_async {
                    f.write_str(" async")?;
                }
                if call.bail_guard {
                    f.write_str(" if_valid")?;
                }
                if call.defined_guard {
                    f.write_str(" if_defined")?;
                }
                writeln!(f)?;
            }
            Instr::IfValid(body) => {
                writeln!(f, "{pad}if_valid")?;
                write_instrs(f, body, depth + 1)?;
            }
            Instr::IfObject { body, null_output } | Instr::IfArray { body, null_output } => {
                let kind = if matches!(instr, Instr::IfObject { .. }) { "object" } else { "array" };
                writeln!(f, "{pad}if_{kind}{}", if *null_output { " else_null" } else { "" })?;
                write_instrs(f, body, depth + 1)?;
            }
            Instr::SeedObject { keep_unknown: None } => writeln!(f, "{pad}seed_object")?,
            Instr::SeedObject { keep_unknown: Some(declared) } => {
                writeln!(f, "{pad}seed_object copy_unknown except {declared:?}")?
            }
            Instr::SeedArray { keep_unknown } => {
                writeln!(f, "{pad}seed_array{}", if *keep_unknown { " copy" } else { "" })?
            }
            Instr::EachElement { from, item } => {
                writeln!(f, "{pad}each_element from {from}")?;
                write_block(f, item, depth + 1)?;
            }
            Instr::EachEntry { item } => {
                writeln!(f, "{pad}each_entry")?;
                write_block(f, item, depth + 1)?;
            }
            Instr::Branches { arms, otherwise } => {
                for (i, arm) in arms.iter().enumerate() {
                    let keyword = if i == 0 { "if" } else { "else_if" };
                    writeln!(f, "{pad}{keyword} {}", arm.predicate)?;
                    write_instrs(f, &arm.body, depth + 1)?;
                }
                if let Some(id) = otherwise {
                    writeln!(f, "{pad}otherwise {id}")?;
                }
            }
            Instr::Output { transform, null_output } => {
                write!(f, "{pad}output")?;
                if let Some(id) = transform {
                    write!(f, " transform {id}")?;
                }
                if *null_output {
                    f.write_str(" else_null")?;
                }
                writeln!(f)?;
            }
        }
    }
    Ok(())
}
