//! Aggregate instructions
//!
//! `extractvalue` and `insertvalue` over struct and array values, with
//! compile-time index lists.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::block::Block;
use crate::constant::aggregate_elem_type;
use crate::inst::{fmt_attachments, Inst};
use crate::metadata::MdAttachment;
use crate::types::Type;
use crate::value::Value;
use lyra_common::LocalIdent;

/// `extractvalue` instruction; the result is the indexed element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstExtractValue {
    pub ident: Rc<LocalIdent>,
    pub x: Value,
    pub indices: Vec<u64>,
    pub ty: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstExtractValue {
    pub fn new(x: Value, indices: Vec<u64>) -> Self {
        let ty = aggregate_elem_type(&x.ty(), &indices);
        InstExtractValue {
            ident: Rc::new(LocalIdent::unnamed()),
            x,
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

impl fmt::Display for InstExtractValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = extractvalue {}", self.ident, self.x)?;
        for index in &self.indices {
            write!(f, ", {index}")?;
        }
        fmt_attachments(f, &self.metadata)
    }
}

/// `insertvalue` instruction; the result keeps the aggregate type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstInsertValue {
    pub ident: Rc<LocalIdent>,
    pub x: Value,
    pub elem: Value,
    pub indices: Vec<u64>,
    pub ty: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstInsertValue {
    pub fn new(x: Value, elem: Value, indices: Vec<u64>) -> Self {
        let ty = x.ty();
        InstInsertValue {
            ident: Rc::new(LocalIdent::unnamed()),
            x,
            elem,
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

impl fmt::Display for InstInsertValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = insertvalue {}, {}", self.ident, self.x, self.elem)?;
        for index in &self.indices {
            write!(f, ", {index}")?;
        }
        fmt_attachments(f, &self.metadata)
    }
}

/// Append helpers for the aggregate family.
impl Block {
    pub fn new_extractvalue(&mut self, x: Value, indices: Vec<u64>) -> &mut InstExtractValue {
        self.insts
            .push(Inst::ExtractValue(InstExtractValue::new(x, indices)));
        match self.insts.last_mut() {
            Some(Inst::ExtractValue(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_insertvalue(
        &mut self,
        x: Value,
        elem: Value,
        indices: Vec<u64>,
    ) -> &mut InstInsertValue {
        self.insts
            .push(Inst::InsertValue(InstInsertValue::new(x, elem, indices)));
        match self.insts.last_mut() {
            Some(Inst::InsertValue(inst)) => inst,
            _ => unreachable!(),
        }
    }
}
