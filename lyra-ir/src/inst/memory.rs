//! Memory instructions
//!
//! `alloca`, `load`, `store`, `fence`, `cmpxchg`, `atomicrmw` and
//! `getelementptr`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::block::Block;
use crate::constant::gep_inst_type;
use crate::enums::{AtomicOp, AtomicOrdering};
use crate::inst::{fmt_attachments, Inst};
use crate::metadata::MdAttachment;
use crate::types::Type;
use crate::value::Value;
use lyra_common::LocalIdent;

/// `alloca` instruction. The result is a pointer to the allocated type in
/// the instruction's address space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstAlloca {
    pub ident: Rc<LocalIdent>,
    pub elem_ty: Type,
    /// Number of elements; one if absent.
    pub nelems: Option<Value>,
    pub in_alloca: bool,
    pub swift_error: bool,
    pub align: Option<u64>,
    pub addr_space: u32,
    pub metadata: Vec<MdAttachment>,
}

impl InstAlloca {
    pub fn new(elem_ty: Type) -> Self {
        InstAlloca {
            ident: Rc::new(LocalIdent::unnamed()),
            elem_ty,
            nelems: None,
            in_alloca: false,
            swift_error: false,
            align: None,
            addr_space: 0,
            metadata: Vec::new(),
        }
    }

    pub fn ty(&self) -> Type {
        Type::ptr_in(self.elem_ty.clone(), self.addr_space)
    }

    pub fn result(&self) -> Value {
        Value::local(self.ident.clone(), self.ty())
    }
}

impl fmt::Display for InstAlloca {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = alloca", self.ident)?;
        if self.in_alloca {
            f.write_str(" inalloca")?;
        }
        if self.swift_error {
            f.write_str(" swifterror")?;
        }
        write!(f, " {}", self.elem_ty)?;
        if let Some(nelems) = &self.nelems {
            write!(f, ", {nelems}")?;
        }
        if let Some(align) = self.align {
            write!(f, ", align {align}")?;
        }
        if self.addr_space != 0 {
            write!(f, ", addrspace({})", self.addr_space)?;
        }
        fmt_attachments(f, &self.metadata)
    }
}

/// `load` instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstLoad {
    pub ident: Rc<LocalIdent>,
    /// Loaded type, stated explicitly in the syntax.
    pub ty: Type,
    pub src: Value,
    pub atomic: bool,
    pub volatile: bool,
    pub sync_scope: Option<String>,
    pub ordering: Option<AtomicOrdering>,
    pub align: Option<u64>,
    pub metadata: Vec<MdAttachment>,
}

impl InstLoad {
    pub fn new(ty: Type, src: Value) -> Self {
        InstLoad {
            ident: Rc::new(LocalIdent::unnamed()),
            ty,
            src,
            atomic: false,
            volatile: false,
            sync_scope: None,
            ordering: None,
            align: None,
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

impl fmt::Display for InstLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = load", self.ident)?;
        if self.atomic {
            f.write_str(" atomic")?;
        }
        if self.volatile {
            f.write_str(" volatile")?;
        }
        write!(f, " {}, {}", self.ty, self.src)?;
        fmt_sync(f, &self.sync_scope, self.ordering)?;
        if let Some(align) = self.align {
            write!(f, ", align {align}")?;
        }
        fmt_attachments(f, &self.metadata)
    }
}

/// `store` instruction. Produces no result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstStore {
    pub src: Value,
    pub dst: Value,
    pub atomic: bool,
    pub volatile: bool,
    pub sync_scope: Option<String>,
    pub ordering: Option<AtomicOrdering>,
    pub align: Option<u64>,
    pub metadata: Vec<MdAttachment>,
}

impl InstStore {
    pub fn new(src: Value, dst: Value) -> Self {
        InstStore {
            src,
            dst,
            atomic: false,
            volatile: false,
            sync_scope: None,
            ordering: None,
            align: None,
            metadata: Vec::new(),
        }
    }

    pub fn ty(&self) -> Type {
        Type::Void
    }
}

impl fmt::Display for InstStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("store")?;
        if self.atomic {
            f.write_str(" atomic")?;
        }
        if self.volatile {
            f.write_str(" volatile")?;
        }
        write!(f, " {}, {}", self.src, self.dst)?;
        fmt_sync(f, &self.sync_scope, self.ordering)?;
        if let Some(align) = self.align {
            write!(f, ", align {align}")?;
        }
        fmt_attachments(f, &self.metadata)
    }
}

/// `fence` instruction. Produces no result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstFence {
    pub ordering: AtomicOrdering,
    pub sync_scope: Option<String>,
    pub metadata: Vec<MdAttachment>,
}

impl InstFence {
    pub fn new(ordering: AtomicOrdering) -> Self {
        InstFence {
            ordering,
            sync_scope: None,
            metadata: Vec::new(),
        }
    }

    pub fn ty(&self) -> Type {
        Type::Void
    }
}

impl fmt::Display for InstFence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("fence")?;
        fmt_sync(f, &self.sync_scope, Some(self.ordering))?;
        fmt_attachments(f, &self.metadata)
    }
}

/// `cmpxchg` instruction. The result is a `{ <ty>, i1 }` pair of the
/// loaded value and the success bit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstCmpXchg {
    pub ident: Rc<LocalIdent>,
    pub ptr: Value,
    pub cmp: Value,
    pub new: Value,
    pub weak: bool,
    pub volatile: bool,
    pub sync_scope: Option<String>,
    pub success: AtomicOrdering,
    pub failure: AtomicOrdering,
    pub ty: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstCmpXchg {
    pub fn new(
        ptr: Value,
        cmp: Value,
        new: Value,
        success: AtomicOrdering,
        failure: AtomicOrdering,
    ) -> Self {
        let ty = Type::struct_of(vec![new.ty(), Type::i1()], false);
        InstCmpXchg {
            ident: Rc::new(LocalIdent::unnamed()),
            ptr,
            cmp,
            new,
            weak: false,
            volatile: false,
            sync_scope: None,
            success,
            failure,
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

impl fmt::Display for InstCmpXchg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = cmpxchg", self.ident)?;
        if self.weak {
            f.write_str(" weak")?;
        }
        if self.volatile {
            f.write_str(" volatile")?;
        }
        write!(f, " {}, {}, {}", self.ptr, self.cmp, self.new)?;
        if let Some(scope) = &self.sync_scope {
            write!(f, " syncscope(\"{scope}\")")?;
        }
        write!(f, " {} {}", self.success, self.failure)?;
        fmt_attachments(f, &self.metadata)
    }
}

/// `atomicrmw` instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstAtomicRMW {
    pub ident: Rc<LocalIdent>,
    pub op: AtomicOp,
    pub dst: Value,
    pub x: Value,
    pub volatile: bool,
    pub sync_scope: Option<String>,
    pub ordering: AtomicOrdering,
    pub ty: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstAtomicRMW {
    pub fn new(op: AtomicOp, dst: Value, x: Value, ordering: AtomicOrdering) -> Self {
        let ty = x.ty();
        InstAtomicRMW {
            ident: Rc::new(LocalIdent::unnamed()),
            op,
            dst,
            x,
            volatile: false,
            sync_scope: None,
            ordering,
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

impl fmt::Display for InstAtomicRMW {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = atomicrmw", self.ident)?;
        if self.volatile {
            f.write_str(" volatile")?;
        }
        write!(f, " {} {}, {}", self.op, self.dst, self.x)?;
        fmt_sync(f, &self.sync_scope, Some(self.ordering))?;
        fmt_attachments(f, &self.metadata)
    }
}

/// `getelementptr` instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstGep {
    pub ident: Rc<LocalIdent>,
    pub in_bounds: bool,
    pub elem_ty: Type,
    pub src: Value,
    pub indices: Vec<Value>,
    /// Result type: pointer to the indexed element, or a vector of such
    /// pointers when the source or any index is a vector.
    pub ty: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstGep {
    pub fn new(elem_ty: Type, src: Value, indices: Vec<Value>) -> Self {
        let ty = gep_inst_type(&elem_ty, &src, &indices);
        InstGep {
            ident: Rc::new(LocalIdent::unnamed()),
            in_bounds: false,
            elem_ty,
            src,
            indices,
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

impl fmt::Display for InstGep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = getelementptr", self.ident)?;
        if self.in_bounds {
            f.write_str(" inbounds")?;
        }
        write!(f, " {}, {}", self.elem_ty, self.src)?;
        for index in &self.indices {
            write!(f, ", {index}")?;
        }
        fmt_attachments(f, &self.metadata)
    }
}

/// ` syncscope("<scope>")` and ordering suffix shared by the atomic
/// instructions.
fn fmt_sync(
    f: &mut fmt::Formatter<'_>,
    sync_scope: &Option<String>,
    ordering: Option<AtomicOrdering>,
) -> fmt::Result {
    if let Some(scope) = sync_scope {
        write!(f, " syncscope(\"{scope}\")")?;
    }
    if let Some(ordering) = ordering {
        write!(f, " {ordering}")?;
    }
    Ok(())
}

/// Append helpers for the memory family.
impl Block {
    pub fn new_alloca(&mut self, elem_ty: Type) -> &mut InstAlloca {
        self.insts.push(Inst::Alloca(InstAlloca::new(elem_ty)));
        match self.insts.last_mut() {
            Some(Inst::Alloca(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_load(&mut self, ty: Type, src: Value) -> &mut InstLoad {
        self.insts.push(Inst::Load(InstLoad::new(ty, src)));
        match self.insts.last_mut() {
            Some(Inst::Load(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_store(&mut self, src: Value, dst: Value) -> &mut InstStore {
        self.insts.push(Inst::Store(InstStore::new(src, dst)));
        match self.insts.last_mut() {
            Some(Inst::Store(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_fence(&mut self, ordering: AtomicOrdering) -> &mut InstFence {
        self.insts.push(Inst::Fence(InstFence::new(ordering)));
        match self.insts.last_mut() {
            Some(Inst::Fence(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_cmpxchg(
        &mut self,
        ptr: Value,
        cmp: Value,
        new: Value,
        success: AtomicOrdering,
        failure: AtomicOrdering,
    ) -> &mut InstCmpXchg {
        self.insts
            .push(Inst::CmpXchg(InstCmpXchg::new(ptr, cmp, new, success, failure)));
        match self.insts.last_mut() {
            Some(Inst::CmpXchg(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_atomicrmw(
        &mut self,
        op: AtomicOp,
        dst: Value,
        x: Value,
        ordering: AtomicOrdering,
    ) -> &mut InstAtomicRMW {
        self.insts
            .push(Inst::AtomicRMW(InstAtomicRMW::new(op, dst, x, ordering)));
        match self.insts.last_mut() {
            Some(Inst::AtomicRMW(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_gep(&mut self, elem_ty: Type, src: Value, indices: Vec<Value>) -> &mut InstGep {
        self.insts.push(Inst::Gep(InstGep::new(elem_ty, src, indices)));
        match self.insts.last_mut() {
            Some(Inst::Gep(inst)) => inst,
            _ => unreachable!(),
        }
    }
}
