//! Vector instructions
//!
//! `extractelement`, `insertelement` and `shufflevector`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::block::Block;
use crate::constant::{shuffle_result_type, Constant};
use crate::inst::{fmt_attachments, Inst};
use crate::metadata::MdAttachment;
use crate::types::Type;
use crate::value::Value;
use lyra_common::LocalIdent;

/// `extractelement` instruction; the result is the vector's element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstExtractElement {
    pub ident: Rc<LocalIdent>,
    pub x: Value,
    pub index: Value,
    pub ty: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstExtractElement {
    pub fn new(x: Value, index: Value) -> Self {
        let ty = match x.ty() {
            Type::Vector { elem, .. } => *elem,
            ty => panic!("extractelement of non-vector type `{ty}`"),
        };
        InstExtractElement {
            ident: Rc::new(LocalIdent::unnamed()),
            x,
            index,
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

impl fmt::Display for InstExtractElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = extractelement {}, {}", self.ident, self.x, self.index)?;
        fmt_attachments(f, &self.metadata)
    }
}

/// `insertelement` instruction; the result keeps the vector type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstInsertElement {
    pub ident: Rc<LocalIdent>,
    pub x: Value,
    pub elem: Value,
    pub index: Value,
    pub ty: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstInsertElement {
    pub fn new(x: Value, elem: Value, index: Value) -> Self {
        let ty = x.ty();
        InstInsertElement {
            ident: Rc::new(LocalIdent::unnamed()),
            x,
            elem,
            index,
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

impl fmt::Display for InstInsertElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = insertelement {}, {}, {}",
            self.ident, self.x, self.elem, self.index
        )?;
        fmt_attachments(f, &self.metadata)
    }
}

/// `shufflevector` instruction; the result has the mask's length over the
/// operands' element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstShuffleVector {
    pub ident: Rc<LocalIdent>,
    pub x: Value,
    pub y: Value,
    pub mask: Value,
    pub ty: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstShuffleVector {
    pub fn new(x: Value, y: Value, mask: Constant) -> Self {
        let ty = shuffle_result_type(&x.ty(), &mask.ty());
        InstShuffleVector {
            ident: Rc::new(LocalIdent::unnamed()),
            x,
            y,
            mask: Value::Const(mask),
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

impl fmt::Display for InstShuffleVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = shufflevector {}, {}, {}",
            self.ident, self.x, self.y, self.mask
        )?;
        fmt_attachments(f, &self.metadata)
    }
}

/// Append helpers for the vector family.
impl Block {
    pub fn new_extractelement(&mut self, x: Value, index: Value) -> &mut InstExtractElement {
        self.insts
            .push(Inst::ExtractElement(InstExtractElement::new(x, index)));
        match self.insts.last_mut() {
            Some(Inst::ExtractElement(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_insertelement(
        &mut self,
        x: Value,
        elem: Value,
        index: Value,
    ) -> &mut InstInsertElement {
        self.insts
            .push(Inst::InsertElement(InstInsertElement::new(x, elem, index)));
        match self.insts.last_mut() {
            Some(Inst::InsertElement(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_shufflevector(&mut self, x: Value, y: Value, mask: Constant) -> &mut InstShuffleVector {
        self.insts
            .push(Inst::ShuffleVector(InstShuffleVector::new(x, y, mask)));
        match self.insts.last_mut() {
            Some(Inst::ShuffleVector(inst)) => inst,
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec4(name: &str) -> Value {
        Value::local(
            Rc::new(LocalIdent::named(name)),
            Type::vector(4, Type::i32()),
        )
    }

    #[test]
    fn test_extractelement() {
        let mut inst = InstExtractElement::new(vec4("v"), Value::from(Constant::i32(2)));
        inst.ident = Rc::new(LocalIdent::named("e"));
        assert_eq!(inst.to_string(), "%e = extractelement <4 x i32> %v, i32 2");
        assert_eq!(inst.ty(), Type::i32());
    }

    #[test]
    fn test_insertelement() {
        let mut inst = InstInsertElement::new(
            vec4("v"),
            Value::from(Constant::i32(7)),
            Value::from(Constant::i32(0)),
        );
        inst.ident = Rc::new(LocalIdent::named("w"));
        assert_eq!(
            inst.to_string(),
            "%w = insertelement <4 x i32> %v, i32 7, i32 0"
        );
        assert_eq!(inst.ty().to_string(), "<4 x i32>");
    }

    #[test]
    fn test_shufflevector_narrows() {
        let mask = Constant::vector(vec![Constant::i32(0), Constant::i32(4)]);
        let mut inst = InstShuffleVector::new(vec4("a"), vec4("b"), mask);
        inst.ident = Rc::new(LocalIdent::named("s"));
        assert_eq!(
            inst.to_string(),
            "%s = shufflevector <4 x i32> %a, <4 x i32> %b, <2 x i32> <i32 0, i32 4>"
        );
        assert_eq!(inst.ty().to_string(), "<2 x i32>");
    }
}
