//! IR Instructions
//!
//! One struct per opcode, grouped by family:
//! - `binary` - integer and floating-point arithmetic, `fneg`
//! - `memory` - `alloca`, `load`, `store`, `fence`, atomics, `getelementptr`
//! - `conversion` - the twelve casts
//! - `vector` - `extractelement`, `insertelement`, `shufflevector`
//! - `aggregate` - `extractvalue`, `insertvalue`
//! - `other` - comparisons, `phi`, `select`, `freeze`, `call`, `va_arg`,
//!   and the exception-handling pads
//!
//! Each family file also carries the `Block` append helpers for its
//! opcodes, the canonical way to build IR programmatically.
//!
//! Result types are derived once, in the constructor, and cached in the
//! struct; mutating operands afterwards without rebuilding the instruction
//! leaves the cached type stale.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::metadata::MdAttachment;
use crate::types::Type;
use crate::value::Value;
use lyra_common::LocalIdent;

mod aggregate;
mod binary;
mod conversion;
mod memory;
mod other;
mod vector;

pub use self::aggregate::{InstExtractValue, InstInsertValue};
pub use self::binary::{InstBinary, InstFBinary, InstFNeg};
pub use self::conversion::InstCast;
pub use self::memory::{
    InstAlloca, InstAtomicRMW, InstCmpXchg, InstFence, InstGep, InstLoad, InstStore,
};
pub use self::other::{
    Clause, Incoming, InstCall, InstCatchPad, InstCleanupPad, InstFCmp, InstFreeze, InstICmp,
    InstLandingPad, InstPhi, InstSelect, InstVAArg,
};
pub use self::vector::{InstExtractElement, InstInsertElement, InstShuffleVector};

pub(crate) use self::other::callee_sig;

/// An instruction. Every variant wraps its dedicated struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inst {
    Binary(InstBinary),
    FBinary(InstFBinary),
    FNeg(InstFNeg),
    Alloca(InstAlloca),
    Load(InstLoad),
    Store(InstStore),
    Fence(InstFence),
    CmpXchg(InstCmpXchg),
    AtomicRMW(InstAtomicRMW),
    Gep(InstGep),
    Cast(InstCast),
    ExtractElement(InstExtractElement),
    InsertElement(InstInsertElement),
    ShuffleVector(InstShuffleVector),
    ExtractValue(InstExtractValue),
    InsertValue(InstInsertValue),
    ICmp(InstICmp),
    FCmp(InstFCmp),
    Phi(InstPhi),
    Select(InstSelect),
    Freeze(InstFreeze),
    Call(InstCall),
    VAArg(InstVAArg),
    LandingPad(InstLandingPad),
    CatchPad(InstCatchPad),
    CleanupPad(InstCleanupPad),
}

macro_rules! for_each_inst {
    ($self:ident, $inst:ident => $body:expr) => {
        match $self {
            Inst::Binary($inst) => $body,
            Inst::FBinary($inst) => $body,
            Inst::FNeg($inst) => $body,
            Inst::Alloca($inst) => $body,
            Inst::Load($inst) => $body,
            Inst::Store($inst) => $body,
            Inst::Fence($inst) => $body,
            Inst::CmpXchg($inst) => $body,
            Inst::AtomicRMW($inst) => $body,
            Inst::Gep($inst) => $body,
            Inst::Cast($inst) => $body,
            Inst::ExtractElement($inst) => $body,
            Inst::InsertElement($inst) => $body,
            Inst::ShuffleVector($inst) => $body,
            Inst::ExtractValue($inst) => $body,
            Inst::InsertValue($inst) => $body,
            Inst::ICmp($inst) => $body,
            Inst::FCmp($inst) => $body,
            Inst::Phi($inst) => $body,
            Inst::Select($inst) => $body,
            Inst::Freeze($inst) => $body,
            Inst::Call($inst) => $body,
            Inst::VAArg($inst) => $body,
            Inst::LandingPad($inst) => $body,
            Inst::CatchPad($inst) => $body,
            Inst::CleanupPad($inst) => $body,
        }
    };
}

impl Inst {
    /// The result identifier, for instructions that have one.
    pub fn ident(&self) -> Option<&Rc<LocalIdent>> {
        match self {
            Inst::Store(_) | Inst::Fence(_) => None,
            Inst::Binary(i) => Some(&i.ident),
            Inst::FBinary(i) => Some(&i.ident),
            Inst::FNeg(i) => Some(&i.ident),
            Inst::Alloca(i) => Some(&i.ident),
            Inst::Load(i) => Some(&i.ident),
            Inst::CmpXchg(i) => Some(&i.ident),
            Inst::AtomicRMW(i) => Some(&i.ident),
            Inst::Gep(i) => Some(&i.ident),
            Inst::Cast(i) => Some(&i.ident),
            Inst::ExtractElement(i) => Some(&i.ident),
            Inst::InsertElement(i) => Some(&i.ident),
            Inst::ShuffleVector(i) => Some(&i.ident),
            Inst::ExtractValue(i) => Some(&i.ident),
            Inst::InsertValue(i) => Some(&i.ident),
            Inst::ICmp(i) => Some(&i.ident),
            Inst::FCmp(i) => Some(&i.ident),
            Inst::Phi(i) => Some(&i.ident),
            Inst::Select(i) => Some(&i.ident),
            Inst::Freeze(i) => Some(&i.ident),
            Inst::Call(i) => Some(&i.ident),
            Inst::VAArg(i) => Some(&i.ident),
            Inst::LandingPad(i) => Some(&i.ident),
            Inst::CatchPad(i) => Some(&i.ident),
            Inst::CleanupPad(i) => Some(&i.ident),
        }
    }

    /// The result type. Void for `store` and `fence`, and for calls of
    /// void-returning callees.
    pub fn ty(&self) -> Type {
        for_each_inst!(self, i => i.ty())
    }

    /// Whether the instruction defines a local (a non-void result).
    pub fn produces_value(&self) -> bool {
        self.ident().is_some() && !self.ty().is_void()
    }

    /// The result as an operand value, for result-producing instructions.
    pub fn result(&self) -> Option<Value> {
        let ident = self.ident()?;
        let ty = self.ty();
        if ty.is_void() {
            return None;
        }
        Some(Value::local(ident.clone(), ty))
    }

    /// The operand values of the instruction, in syntactic order.
    pub fn operands(&self) -> Vec<&Value> {
        match self {
            Inst::Binary(i) => vec![&i.x, &i.y],
            Inst::FBinary(i) => vec![&i.x, &i.y],
            Inst::FNeg(i) => vec![&i.x],
            Inst::Alloca(i) => i.nelems.iter().collect(),
            Inst::Load(i) => vec![&i.src],
            Inst::Store(i) => vec![&i.src, &i.dst],
            Inst::Fence(_) => vec![],
            Inst::CmpXchg(i) => vec![&i.ptr, &i.cmp, &i.new],
            Inst::AtomicRMW(i) => vec![&i.dst, &i.x],
            Inst::Gep(i) => {
                let mut ops = vec![&i.src];
                ops.extend(i.indices.iter());
                ops
            }
            Inst::Cast(i) => vec![&i.from],
            Inst::ExtractElement(i) => vec![&i.x, &i.index],
            Inst::InsertElement(i) => vec![&i.x, &i.elem, &i.index],
            Inst::ShuffleVector(i) => vec![&i.x, &i.y, &i.mask],
            Inst::ExtractValue(i) => vec![&i.x],
            Inst::InsertValue(i) => vec![&i.x, &i.elem],
            Inst::ICmp(i) => vec![&i.x, &i.y],
            Inst::FCmp(i) => vec![&i.x, &i.y],
            Inst::Phi(i) => i.incs.iter().map(|inc| &inc.value).collect(),
            Inst::Select(i) => vec![&i.cond, &i.x, &i.y],
            Inst::Freeze(i) => vec![&i.x],
            Inst::Call(i) => {
                let mut ops = vec![&i.callee];
                ops.extend(i.args.iter().map(|arg| &arg.value));
                ops
            }
            Inst::VAArg(i) => vec![&i.arg_list],
            Inst::LandingPad(i) => i.clauses.iter().map(|c| &c.x).collect(),
            Inst::CatchPad(i) => {
                let mut ops = vec![&i.scope];
                ops.extend(i.args.iter());
                ops
            }
            Inst::CleanupPad(i) => i.args.iter().collect(),
        }
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for_each_inst!(self, i => i.fmt(f))
    }
}

/// Write the metadata attachments of an instruction, each preceded by a
/// comma; attachments always come last.
pub(crate) fn fmt_attachments(
    f: &mut fmt::Formatter<'_>,
    metadata: &[MdAttachment],
) -> fmt::Result {
    for md in metadata {
        write!(f, ", {md}")?;
    }
    Ok(())
}
