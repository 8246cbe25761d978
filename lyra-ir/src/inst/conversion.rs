//! Conversion instructions
//!
//! The twelve casts plus `addrspacecast`, all sharing one shape:
//! `<op> <from> to <type>`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::block::Block;
use crate::enums::CastOp;
use crate::inst::{fmt_attachments, Inst};
use crate::metadata::MdAttachment;
use crate::types::Type;
use crate::value::Value;
use lyra_common::LocalIdent;

/// A conversion instruction; the result type is the target type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstCast {
    pub ident: Rc<LocalIdent>,
    pub op: CastOp,
    pub from: Value,
    pub to: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstCast {
    pub fn new(op: CastOp, from: Value, to: Type) -> Self {
        InstCast {
            ident: Rc::new(LocalIdent::unnamed()),
            op,
            from,
            to,
            metadata: Vec::new(),
        }
    }

    pub fn ty(&self) -> Type {
        self.to.clone()
    }

    pub fn result(&self) -> Value {
        Value::local(self.ident.clone(), self.to.clone())
    }
}

impl fmt::Display for InstCast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} {} to {}", self.ident, self.op, self.from, self.to)?;
        fmt_attachments(f, &self.metadata)
    }
}

/// Append helpers for the conversion family.
impl Block {
    pub fn new_cast(&mut self, op: CastOp, from: Value, to: Type) -> &mut InstCast {
        self.insts.push(Inst::Cast(InstCast::new(op, from, to)));
        match self.insts.last_mut() {
            Some(Inst::Cast(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_trunc(&mut self, from: Value, to: Type) -> &mut InstCast {
        self.new_cast(CastOp::Trunc, from, to)
    }

    pub fn new_zext(&mut self, from: Value, to: Type) -> &mut InstCast {
        self.new_cast(CastOp::ZExt, from, to)
    }

    pub fn new_sext(&mut self, from: Value, to: Type) -> &mut InstCast {
        self.new_cast(CastOp::SExt, from, to)
    }

    pub fn new_fptrunc(&mut self, from: Value, to: Type) -> &mut InstCast {
        self.new_cast(CastOp::FPTrunc, from, to)
    }

    pub fn new_fpext(&mut self, from: Value, to: Type) -> &mut InstCast {
        self.new_cast(CastOp::FPExt, from, to)
    }

    pub fn new_fptoui(&mut self, from: Value, to: Type) -> &mut InstCast {
        self.new_cast(CastOp::FPToUI, from, to)
    }

    pub fn new_fptosi(&mut self, from: Value, to: Type) -> &mut InstCast {
        self.new_cast(CastOp::FPToSI, from, to)
    }

    pub fn new_uitofp(&mut self, from: Value, to: Type) -> &mut InstCast {
        self.new_cast(CastOp::UIToFP, from, to)
    }

    pub fn new_sitofp(&mut self, from: Value, to: Type) -> &mut InstCast {
        self.new_cast(CastOp::SIToFP, from, to)
    }

    pub fn new_ptrtoint(&mut self, from: Value, to: Type) -> &mut InstCast {
        self.new_cast(CastOp::PtrToInt, from, to)
    }

    pub fn new_inttoptr(&mut self, from: Value, to: Type) -> &mut InstCast {
        self.new_cast(CastOp::IntToPtr, from, to)
    }

    pub fn new_bitcast(&mut self, from: Value, to: Type) -> &mut InstCast {
        self.new_cast(CastOp::BitCast, from, to)
    }

    pub fn new_addrspacecast(&mut self, from: Value, to: Type) -> &mut InstCast {
        self.new_cast(CastOp::AddrSpaceCast, from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_display() {
        let x = Value::local(Rc::new(LocalIdent::named("x")), Type::i32());
        let mut inst = InstCast::new(CastOp::Trunc, x, Type::i8());
        inst.ident = Rc::new(LocalIdent::named("t"));
        assert_eq!(inst.to_string(), "%t = trunc i32 %x to i8");
        assert_eq!(inst.ty(), Type::i8());
    }

    #[test]
    fn test_bitcast_display() {
        let p = Value::local(Rc::new(LocalIdent::named("p")), Type::ptr(Type::i8()));
        let mut inst = InstCast::new(CastOp::BitCast, p, Type::ptr(Type::i32()));
        inst.ident = Rc::new(LocalIdent::named("q"));
        assert_eq!(inst.to_string(), "%q = bitcast i8* %p to i32*");
    }
}
