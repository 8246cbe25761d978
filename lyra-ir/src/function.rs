//! Functions
//!
//! A function owns its parameters, attributes and ordered block list.
//! Declarations (no blocks) print `declare`; definitions print `define`.
//!
//! Unnamed locals receive dense numeric ids lazily, at serialization:
//! parameters first, then per block in layout order the block label and
//! each instruction or terminator with a non-void result. Assignment is
//! recomputed from scratch on every serialization, so two serializations
//! of an unmodified function are byte-identical.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::attrs::{quoted, FuncAttr, ParamAttr, ReturnAttr};
use crate::block::Block;
use crate::constant::Constant;
use crate::enums::{CallingConv, DllStorage, Linkage, Preemption, UnnamedAddr, Visibility};
use crate::metadata::MdAttachment;
use crate::types::Type;
use crate::value::Value;
use lyra_common::{GlobalIdent, LocalIdent};

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub ident: Rc<LocalIdent>,
    pub ty: Type,
    pub attrs: Vec<ParamAttr>,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Param {
            ident: Rc::new(LocalIdent::named(name)),
            ty,
            attrs: Vec::new(),
        }
    }

    /// Unnamed parameter; numbered in definitions, bare in declarations.
    pub fn unnamed(ty: Type) -> Self {
        Param {
            ident: Rc::new(LocalIdent::unnamed()),
            ty,
            attrs: Vec::new(),
        }
    }

    /// The parameter as an operand value.
    pub fn value(&self) -> Value {
        Value::local(self.ident.clone(), self.ty.clone())
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ty)?;
        for attr in &self.attrs {
            write!(f, " {attr}")?;
        }
        if self.ident.is_named() || self.ident.is_assigned() {
            write!(f, " {}", self.ident)?;
        }
        Ok(())
    }
}

/// A function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub ident: Rc<GlobalIdent>,
    pub ret_ty: Type,
    pub params: Vec<Param>,
    pub variadic: bool,
    pub linkage: Option<Linkage>,
    pub preemption: Option<Preemption>,
    pub visibility: Option<Visibility>,
    pub dll_storage: Option<DllStorage>,
    pub calling_conv: Option<CallingConv>,
    pub return_attrs: Vec<ReturnAttr>,
    pub unnamed_addr: Option<UnnamedAddr>,
    pub addr_space: u32,
    pub func_attrs: Vec<FuncAttr>,
    pub section: Option<String>,
    pub comdat: Option<String>,
    pub align: Option<u64>,
    pub gc: Option<String>,
    pub prefix: Option<Constant>,
    pub prologue: Option<Constant>,
    pub personality: Option<Constant>,
    pub metadata: Vec<MdAttachment>,
    pub blocks: Vec<Block>,
}

impl Function {
    pub fn new(name: impl Into<String>, ret_ty: Type, params: Vec<Param>) -> Self {
        Function {
            ident: Rc::new(GlobalIdent::named(name)),
            ret_ty,
            params,
            variadic: false,
            linkage: None,
            preemption: None,
            visibility: None,
            dll_storage: None,
            calling_conv: None,
            return_attrs: Vec::new(),
            unnamed_addr: None,
            addr_space: 0,
            func_attrs: Vec::new(),
            section: None,
            comdat: None,
            align: None,
            gc: None,
            prefix: None,
            prologue: None,
            personality: None,
            metadata: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// The function signature type.
    pub fn sig(&self) -> Type {
        let params = self.params.iter().map(|p| p.ty.clone()).collect();
        Type::Func {
            ret: Box::new(self.ret_ty.clone()),
            params,
            variadic: self.variadic,
        }
    }

    /// The function as an operand value: a pointer to its signature.
    pub fn value(&self) -> Value {
        Value::global(self.ident.clone(), Type::ptr_in(self.sig(), self.addr_space))
    }

    /// The function as a constant, for initializers and personality slots.
    pub fn const_ref(&self) -> Constant {
        Constant::global_ref(self.ident.clone(), Type::ptr_in(self.sig(), self.addr_space))
    }

    /// Append a named block and return it for building.
    pub fn new_block(&mut self, name: impl Into<String>) -> &mut Block {
        self.blocks.push(Block::new(name));
        self.blocks.last_mut().unwrap_or_else(|| unreachable!())
    }

    pub fn push_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Assign dense numeric ids to the unnamed locals of the function:
    /// parameters, then per block the label and every non-void result.
    pub fn assign_ids(&self) {
        let mut next = 0u64;
        let mut assign = |ident: &Rc<LocalIdent>| {
            if !ident.is_named() {
                ident.set_num(next);
                next += 1;
            }
        };
        for param in &self.params {
            assign(&param.ident);
        }
        for block in &self.blocks {
            assign(&block.ident);
            for inst in &block.insts {
                if inst.produces_value() {
                    if let Some(ident) = inst.ident() {
                        assign(ident);
                    }
                }
            }
            if let Some(term) = &block.term {
                if term.produces_value() {
                    if let Some(ident) = term.ident() {
                        assign(ident);
                    }
                }
            }
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let declaration = self.is_declaration();
        if !declaration {
            self.assign_ids();
        }
        f.write_str(if declaration { "declare" } else { "define" })?;
        if let Some(linkage) = self.linkage {
            write!(f, " {linkage}")?;
        }
        if let Some(preemption) = self.preemption {
            write!(f, " {preemption}")?;
        }
        if let Some(visibility) = self.visibility {
            write!(f, " {visibility}")?;
        }
        if let Some(dll_storage) = self.dll_storage {
            write!(f, " {dll_storage}")?;
        }
        if let Some(cc) = self.calling_conv {
            write!(f, " {cc}")?;
        }
        for attr in &self.return_attrs {
            write!(f, " {attr}")?;
        }
        write!(f, " {} {}(", self.ret_ty, self.ident)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        if self.variadic {
            if !self.params.is_empty() {
                f.write_str(", ")?;
            }
            f.write_str("...")?;
        }
        f.write_str(")")?;
        if let Some(unnamed_addr) = self.unnamed_addr {
            write!(f, " {unnamed_addr}")?;
        }
        if self.addr_space != 0 {
            write!(f, " addrspace({})", self.addr_space)?;
        }
        for attr in &self.func_attrs {
            write!(f, " {attr}")?;
        }
        if let Some(section) = &self.section {
            write!(f, " section {}", quoted(section))?;
        }
        if let Some(comdat) = &self.comdat {
            write!(f, " comdat(${comdat})")?;
        }
        if let Some(align) = self.align {
            write!(f, " align {align}")?;
        }
        if let Some(gc) = &self.gc {
            write!(f, " gc {}", quoted(gc))?;
        }
        if let Some(prefix) = &self.prefix {
            write!(f, " prefix {}", prefix.typed())?;
        }
        if let Some(prologue) = &self.prologue {
            write!(f, " prologue {}", prologue.typed())?;
        }
        if let Some(personality) = &self.personality {
            write!(f, " personality {}", personality.typed())?;
        }
        for md in &self.metadata {
            write!(f, " {md}")?;
        }
        if declaration {
            return Ok(());
        }
        f.write_str(" {\n")?;
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            write!(f, "{block}")?;
        }
        f.write_str("\n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::IPred;

    #[test]
    fn test_simple_definition() {
        let mut f = Function::new(
            "add",
            Type::i32(),
            vec![Param::new("a", Type::i32()), Param::new("b", Type::i32())],
        );
        let a = f.params[0].value();
        let b = f.params[1].value();
        let entry = f.new_block("entry");
        let sum = entry.new_add(a, b).result();
        entry.new_ret(Some(sum));
        assert_eq!(
            f.to_string(),
            "define i32 @add(i32 %a, i32 %b) {\nentry:\n\t%0 = add i32 %a, %b\n\tret i32 %0\n}"
        );
    }

    #[test]
    fn test_dense_numbering_order() {
        // Unnamed params, block label and results share one counter, in
        // definition order.
        let mut f = Function::new(
            "f",
            Type::i32(),
            vec![Param::unnamed(Type::i32()), Param::unnamed(Type::i32())],
        );
        let a = f.params[0].value();
        let b = f.params[1].value();
        f.push_block(Block::unnamed());
        let entry = f.blocks.last_mut().unwrap();
        let sum = entry.new_add(a, b).result();
        entry.new_icmp(IPred::Sgt, sum.clone(), Value::from(Constant::i32(0)));
        entry.new_ret(Some(sum));
        assert_eq!(
            f.to_string(),
            "define i32 @f(i32 %0, i32 %1) {\n2:\n\t%3 = add i32 %0, %1\n\t%4 = icmp sgt i32 %3, 0\n\tret i32 %3\n}"
        );
    }

    #[test]
    fn test_void_call_not_numbered() {
        let mut callee = Function::new("sink", Type::Void, vec![Param::unnamed(Type::i32())]);
        callee.push_block(Block::new("entry"));
        let sink = callee.value();

        let mut f = Function::new("g", Type::Void, vec![]);
        let entry = f.new_block("entry");
        entry.new_call(sink.clone(), vec![Value::from(Constant::i32(1)).into()]);
        let loaded = entry.new_alloca(Type::i32()).result();
        entry.new_call(sink, vec![loaded.clone().into()]);
        entry.new_ret(None);
        // The void calls consume no ids; the alloca takes %0.
        assert_eq!(
            f.to_string(),
            "define void @g() {\nentry:\n\tcall void @sink(i32 1)\n\t%0 = alloca i32\n\tcall void @sink(i32* %0)\n\tret void\n}"
        );
    }

    #[test]
    fn test_serialize_twice_identical() {
        let mut f = Function::new("h", Type::i32(), vec![Param::unnamed(Type::i32())]);
        let x = f.params[0].value();
        let entry = f.new_block("entry");
        let doubled = entry.new_add(x.clone(), x).result();
        entry.new_ret(Some(doubled));
        let first = f.to_string();
        let second = f.to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn test_declaration_header() {
        let mut printf = Function::new(
            "printf",
            Type::i32(),
            vec![Param::unnamed(Type::ptr(Type::i8()))],
        );
        printf.variadic = true;
        assert_eq!(printf.to_string(), "declare i32 @printf(i8*, ...)");
        assert_eq!(printf.sig().to_string(), "i32 (i8*, ...)");
    }

    #[test]
    fn test_adorned_header() {
        let mut f = Function::new("init", Type::Void, vec![]);
        f.linkage = Some(Linkage::Internal);
        f.preemption = Some(Preemption::DsoLocal);
        f.unnamed_addr = Some(UnnamedAddr::UnnamedAddr);
        f.func_attrs = vec![FuncAttr::Group(0), FuncAttr::NoUnwind];
        f.section = Some(".init".to_string());
        f.align = Some(16);
        let entry = f.new_block("entry");
        entry.new_ret(None);
        assert_eq!(
            f.to_string(),
            "define internal dso_local void @init() unnamed_addr #0 nounwind section \".init\" align 16 {\nentry:\n\tret void\n}"
        );
    }
}
