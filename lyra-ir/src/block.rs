//! Basic Blocks
//!
//! A block owns an ordered instruction list and exactly one terminator.
//! The `new_*` append helpers living beside each instruction family are
//! the canonical build API; they keep the list invariants by construction.
//! A block without a terminator is incomplete and cannot be serialized.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::inst::Inst;
use crate::term::Terminator;
use lyra_common::LocalIdent;

/// A basic block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Block label; unnamed labels take part in local numbering.
    pub ident: Rc<LocalIdent>,
    pub insts: Vec<Inst>,
    pub term: Option<Terminator>,
}

impl Block {
    /// Create a named block.
    pub fn new(name: impl Into<String>) -> Self {
        Block {
            ident: Rc::new(LocalIdent::named(name)),
            insts: Vec::new(),
            term: None,
        }
    }

    /// Create an unnamed block; its label is numbered at serialization.
    pub fn unnamed() -> Self {
        Block {
            ident: Rc::new(LocalIdent::unnamed()),
            insts: Vec::new(),
            term: None,
        }
    }

    /// The label identifier, for use as a branch target or phi
    /// predecessor. Label references are non-owning.
    pub fn label(&self) -> Rc<LocalIdent> {
        self.ident.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    pub fn has_terminator(&self) -> bool {
        self.term.is_some()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ident.name() {
            Some(name) => writeln!(f, "{}:", lyra_common::ident::quote(name))?,
            // Unnamed labels print their assigned number.
            None => {
                let label = self.ident.to_string();
                writeln!(f, "{}:", &label[1..])?;
            }
        }
        for inst in &self.insts {
            writeln!(f, "\t{inst}")?;
        }
        let term = self
            .term
            .as_ref()
            .unwrap_or_else(|| panic!("block {} has no terminator", self.ident));
        write!(f, "\t{term}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::Constant;
    use crate::enums::IPred;
    use crate::types::Type;
    use crate::value::Value;

    #[test]
    fn test_block_build_and_print() {
        let mut block = Block::new("entry");
        assert!(block.is_empty());
        assert!(!block.has_terminator());

        let a = Value::local(Rc::new(LocalIdent::named("a")), Type::i32());
        let b = Value::local(Rc::new(LocalIdent::named("b")), Type::i32());
        let sum = block.new_add(a, b);
        sum.ident = Rc::new(LocalIdent::named("sum"));
        let sum = sum.result();
        let cmp = block.new_icmp(IPred::Sgt, sum.clone(), Value::from(Constant::i32(0)));
        cmp.ident = Rc::new(LocalIdent::named("pos"));
        block.new_ret(Some(sum));

        assert!(!block.is_empty());
        assert!(block.has_terminator());
        assert_eq!(
            block.to_string(),
            "entry:\n\t%sum = add i32 %a, %b\n\t%pos = icmp sgt i32 %sum, 0\n\tret i32 %sum"
        );
    }

    #[test]
    #[should_panic(expected = "has no terminator")]
    fn test_unterminated_block_rejected() {
        let block = Block::new("open");
        let _ = block.to_string();
    }
}
