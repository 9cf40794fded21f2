//! Scoped fragment buffer.
//!
//! Emitters stage a block of instructions in a child scope, then decide
//! whether to splice it into the parent as-is or wrap it in a guard first.

use crate::instr::Instr;

#[derive(Debug, Default)]
pub struct Fragment {
    instrs: Vec<Instr>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instr: Instr) {
        self.instrs.push(instr);
    }

    /// An empty scope, spliced back with [`embed`](Self::embed) or
    /// wrapped by the caller.
    pub fn child(&self) -> Self {
        Self::new()
    }

    /// Append everything `child` accumulated.
    pub fn embed(&mut self, child: Fragment) {
        self.instrs.extend(child.instrs);
    }

    pub fn into_instrs(self) -> Vec<Instr> {
        self.instrs
    }
}
