//! Binary and unary instructions
//!
//! Integer arithmetic, bitwise and shift instructions with their wrap and
//! exactness flags, the floating-point arithmetic instructions with
//! fast-math flags, and `fneg`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::block::Block;
use crate::enums::{FBinOp, FastMathFlag, IBinOp};
use crate::inst::{fmt_attachments, Inst};
use crate::metadata::MdAttachment;
use crate::types::Type;
use crate::value::Value;
use lyra_common::LocalIdent;

/// Integer binary instruction: `add`, `sub`, `mul`, the divisions and
/// remainders, the shifts, `and`, `or`, `xor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstBinary {
    pub ident: Rc<LocalIdent>,
    pub op: IBinOp,
    pub x: Value,
    pub y: Value,
    /// `nuw` on add/sub/mul/shl.
    pub nuw: bool,
    /// `nsw` on add/sub/mul/shl.
    pub nsw: bool,
    /// `exact` on udiv/sdiv/lshr/ashr.
    pub exact: bool,
    /// Result type, the type of the operands.
    pub ty: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstBinary {
    pub fn new(op: IBinOp, x: Value, y: Value) -> Self {
        let ty = x.ty();
        InstBinary {
            ident: Rc::new(LocalIdent::unnamed()),
            op,
            x,
            y,
            nuw: false,
            nsw: false,
            exact: false,
            ty,
            metadata: Vec::new(),
        }
    }

    pub fn ty(&self) -> Type {
        self.ty.clone()
    }

    pub fn result(&self) -> Value {
        Value::local(self.ident.clone(), self.ty.clone())
    }
}

impl fmt::Display for InstBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.ident, self.op)?;
        if self.nuw {
            f.write_str(" nuw")?;
        }
        if self.nsw {
            f.write_str(" nsw")?;
        }
        if self.exact {
            f.write_str(" exact")?;
        }
        write!(f, " {}, {}", self.x, self.y.ident())?;
        fmt_attachments(f, &self.metadata)
    }
}

/// Floating-point binary instruction: `fadd`, `fsub`, `fmul`, `fdiv`,
/// `frem`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstFBinary {
    pub ident: Rc<LocalIdent>,
    pub op: FBinOp,
    pub x: Value,
    pub y: Value,
    pub fast_math: Vec<FastMathFlag>,
    pub ty: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstFBinary {
    pub fn new(op: FBinOp, x: Value, y: Value) -> Self {
        let ty = x.ty();
        InstFBinary {
            ident: Rc::new(LocalIdent::unnamed()),
            op,
            x,
            y,
            fast_math: Vec::new(),
            ty,
            metadata: Vec::new(),
        }
    }

    pub fn ty(&self) -> Type {
        self.ty.clone()
    }

    pub fn result(&self) -> Value {
        Value::local(self.ident.clone(), self.ty.clone())
    }
}

impl fmt::Display for InstFBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.ident, self.op)?;
        for flag in &self.fast_math {
            write!(f, " {flag}")?;
        }
        write!(f, " {}, {}", self.x, self.y.ident())?;
        fmt_attachments(f, &self.metadata)
    }
}

/// `fneg` instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstFNeg {
    pub ident: Rc<LocalIdent>,
    pub x: Value,
    pub fast_math: Vec<FastMathFlag>,
    pub ty: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstFNeg {
    pub fn new(x: Value) -> Self {
        let ty = x.ty();
        InstFNeg {
            ident: Rc::new(LocalIdent::unnamed()),
            x,
            fast_math: Vec::new(),
            ty,
            metadata: Vec::new(),
        }
    }

    pub fn ty(&self) -> Type {
        self.ty.clone()
    }

    pub fn result(&self) -> Value {
        Value::local(self.ident.clone(), self.ty.clone())
    }
}

impl fmt::Display for InstFNeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = fneg", self.ident)?;
        for flag in &self.fast_math {
            write!(f, " {flag}")?;
        }
        write!(f, " {}", self.x)?;
        fmt_attachments(f, &self.metadata)
    }
}

/// Append helpers for the binary family.
impl Block {
    pub fn new_binary(&mut self, op: IBinOp, x: Value, y: Value) -> &mut InstBinary {
        self.insts.push(Inst::Binary(InstBinary::new(op, x, y)));
        match self.insts.last_mut() {
            Some(Inst::Binary(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_add(&mut self, x: Value, y: Value) -> &mut InstBinary {
        self.new_binary(IBinOp::Add, x, y)
    }

    pub fn new_sub(&mut self, x: Value, y: Value) -> &mut InstBinary {
        self.new_binary(IBinOp::Sub, x, y)
    }

    pub fn new_mul(&mut self, x: Value, y: Value) -> &mut InstBinary {
        self.new_binary(IBinOp::Mul, x, y)
    }

    pub fn new_udiv(&mut self, x: Value, y: Value) -> &mut InstBinary {
        self.new_binary(IBinOp::UDiv, x, y)
    }

    pub fn new_sdiv(&mut self, x: Value, y: Value) -> &mut InstBinary {
        self.new_binary(IBinOp::SDiv, x, y)
    }

    pub fn new_urem(&mut self, x: Value, y: Value) -> &mut InstBinary {
        self.new_binary(IBinOp::URem, x, y)
    }

    pub fn new_srem(&mut self, x: Value, y: Value) -> &mut InstBinary {
        self.new_binary(IBinOp::SRem, x, y)
    }

    pub fn new_shl(&mut self, x: Value, y: Value) -> &mut InstBinary {
        self.new_binary(IBinOp::Shl, x, y)
    }

    pub fn new_lshr(&mut self, x: Value, y: Value) -> &mut InstBinary {
        self.new_binary(IBinOp::LShr, x, y)
    }

    pub fn new_ashr(&mut self, x: Value, y: Value) -> &mut InstBinary {
        self.new_binary(IBinOp::AShr, x, y)
    }

    pub fn new_and(&mut self, x: Value, y: Value) -> &mut InstBinary {
        self.new_binary(IBinOp::And, x, y)
    }

    pub fn new_or(&mut self, x: Value, y: Value) -> &mut InstBinary {
        self.new_binary(IBinOp::Or, x, y)
    }

    pub fn new_xor(&mut self, x: Value, y: Value) -> &mut InstBinary {
        self.new_binary(IBinOp::Xor, x, y)
    }

    pub fn new_fbinary(&mut self, op: FBinOp, x: Value, y: Value) -> &mut InstFBinary {
        self.insts.push(Inst::FBinary(InstFBinary::new(op, x, y)));
        match self.insts.last_mut() {
            Some(Inst::FBinary(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_fadd(&mut self, x: Value, y: Value) -> &mut InstFBinary {
        self.new_fbinary(FBinOp::FAdd, x, y)
    }

    pub fn new_fsub(&mut self, x: Value, y: Value) -> &mut InstFBinary {
        self.new_fbinary(FBinOp::FSub, x, y)
    }

    pub fn new_fmul(&mut self, x: Value, y: Value) -> &mut InstFBinary {
        self.new_fbinary(FBinOp::FMul, x, y)
    }

    pub fn new_fdiv(&mut self, x: Value, y: Value) -> &mut InstFBinary {
        self.new_fbinary(FBinOp::FDiv, x, y)
    }

    pub fn new_frem(&mut self, x: Value, y: Value) -> &mut InstFBinary {
        self.new_fbinary(FBinOp::FRem, x, y)
    }

    pub fn new_fneg(&mut self, x: Value) -> &mut InstFNeg {
        self.insts.push(Inst::FNeg(InstFNeg::new(x)));
        match self.insts.last_mut() {
            Some(Inst::FNeg(inst)) => inst,
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(name: &str, ty: Type) -> Value {
        Value::local(Rc::new(LocalIdent::named(name)), ty)
    }

    #[test]
    fn test_add_display() {
        let mut inst = InstBinary::new(
            IBinOp::Add,
            local("a", Type::i32()),
            local("b", Type::i32()),
        );
        inst.ident = Rc::new(LocalIdent::named("sum"));
        assert_eq!(inst.to_string(), "%sum = add i32 %a, %b");
        assert_eq!(inst.ty(), Type::i32());

        inst.nuw = true;
        inst.nsw = true;
        assert_eq!(inst.to_string(), "%sum = add nuw nsw i32 %a, %b");
    }

    #[test]
    fn test_exact_division() {
        let mut inst = InstBinary::new(
            IBinOp::SDiv,
            local("a", Type::i64()),
            Value::from(crate::constant::Constant::i64(4)),
        );
        inst.ident = Rc::new(LocalIdent::named("q"));
        inst.exact = true;
        assert_eq!(inst.to_string(), "%q = sdiv exact i64 %a, 4");
    }

    #[test]
    fn test_fadd_fast_math() {
        let mut inst = InstFBinary::new(
            FBinOp::FAdd,
            local("x", Type::double()),
            local("y", Type::double()),
        );
        inst.ident = Rc::new(LocalIdent::named("r"));
        inst.fast_math = vec![FastMathFlag::Fast];
        assert_eq!(inst.to_string(), "%r = fadd fast double %x, %y");
    }

    #[test]
    fn test_fneg() {
        let mut inst = InstFNeg::new(local("x", Type::float()));
        inst.ident = Rc::new(LocalIdent::named("n"));
        assert_eq!(inst.to_string(), "%n = fneg float %x");
        assert_eq!(inst.ty(), Type::float());
    }
}
