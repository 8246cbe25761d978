//! Globals, aliases, ifuncs and comdats
//!
//! Module-level symbol definitions other than functions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::attrs::quoted;
use crate::constant::Constant;
use crate::enums::{
    DllStorage, Linkage, Preemption, SelectionKind, ThreadLocal, UnnamedAddr, Visibility,
};
use crate::metadata::MdAttachment;
use crate::types::Type;
use crate::value::Value;
use lyra_common::GlobalIdent;

/// A global variable or constant definition/declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Global {
    pub ident: Rc<GlobalIdent>,
    pub linkage: Option<Linkage>,
    pub preemption: Option<Preemption>,
    pub visibility: Option<Visibility>,
    pub dll_storage: Option<DllStorage>,
    pub thread_local: Option<ThreadLocal>,
    pub unnamed_addr: Option<UnnamedAddr>,
    pub addr_space: u32,
    pub externally_initialized: bool,
    /// `constant` when set, `global` otherwise.
    pub immutable: bool,
    pub content_ty: Type,
    /// Missing for declarations.
    pub init: Option<Constant>,
    pub section: Option<String>,
    pub comdat: Option<String>,
    pub align: Option<u64>,
    pub metadata: Vec<MdAttachment>,
}

impl Global {
    pub fn new(name: impl Into<String>, content_ty: Type, init: Constant) -> Self {
        Global {
            ident: Rc::new(GlobalIdent::named(name)),
            linkage: None,
            preemption: None,
            visibility: None,
            dll_storage: None,
            thread_local: None,
            unnamed_addr: None,
            addr_space: 0,
            externally_initialized: false,
            immutable: false,
            content_ty,
            init: Some(init),
            section: None,
            comdat: None,
            align: None,
            metadata: Vec::new(),
        }
    }

    /// External global declaration, no initializer.
    pub fn declaration(name: impl Into<String>, content_ty: Type) -> Self {
        let mut global = Global::new(name, content_ty, Constant::NoneToken);
        global.init = None;
        global.linkage = Some(Linkage::External);
        global
    }

    /// The pointer type of the global.
    pub fn ty(&self) -> Type {
        Type::ptr_in(self.content_ty.clone(), self.addr_space)
    }

    /// The global as an operand value.
    pub fn value(&self) -> Value {
        Value::global(self.ident.clone(), self.ty())
    }

    /// The global as a constant, for initializers of other globals.
    pub fn const_ref(&self) -> Constant {
        Constant::global_ref(self.ident.clone(), self.ty())
    }
}

impl fmt::Display for Global {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} =", self.ident)?;
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
        if let Some(thread_local) = self.thread_local {
            write!(f, " {thread_local}")?;
        }
        if let Some(unnamed_addr) = self.unnamed_addr {
            write!(f, " {unnamed_addr}")?;
        }
        if self.addr_space != 0 {
            write!(f, " addrspace({})", self.addr_space)?;
        }
        if self.externally_initialized {
            f.write_str(" externally_initialized")?;
        }
        f.write_str(if self.immutable { " constant" } else { " global" })?;
        write!(f, " {}", self.content_ty)?;
        if let Some(init) = &self.init {
            write!(f, " {init}")?;
        }
        if let Some(section) = &self.section {
            write!(f, ", section {}", quoted(section))?;
        }
        if let Some(comdat) = &self.comdat {
            write!(f, ", comdat(${comdat})")?;
        }
        if let Some(align) = self.align {
            write!(f, ", align {align}")?;
        }
        for md in &self.metadata {
            write!(f, ", {md}")?;
        }
        Ok(())
    }
}

/// An alias to another global value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub ident: Rc<GlobalIdent>,
    pub linkage: Option<Linkage>,
    pub preemption: Option<Preemption>,
    pub visibility: Option<Visibility>,
    pub dll_storage: Option<DllStorage>,
    pub thread_local: Option<ThreadLocal>,
    pub unnamed_addr: Option<UnnamedAddr>,
    pub content_ty: Type,
    pub aliasee: Constant,
}

impl Alias {
    pub fn new(name: impl Into<String>, content_ty: Type, aliasee: Constant) -> Self {
        Alias {
            ident: Rc::new(GlobalIdent::named(name)),
            linkage: None,
            preemption: None,
            visibility: None,
            dll_storage: None,
            thread_local: None,
            unnamed_addr: None,
            content_ty,
            aliasee,
        }
    }

    pub fn value(&self) -> Value {
        Value::global(self.ident.clone(), self.aliasee.ty())
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} =", self.ident)?;
        fmt_symbol_attrs(
            f,
            self.linkage,
            self.preemption,
            self.visibility,
            self.dll_storage,
            self.thread_local,
            self.unnamed_addr,
        )?;
        write!(f, " alias {}, {}", self.content_ty, self.aliasee.typed())
    }
}

/// An ifunc: a global whose address is computed by a resolver at load
/// time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IFunc {
    pub ident: Rc<GlobalIdent>,
    pub linkage: Option<Linkage>,
    pub preemption: Option<Preemption>,
    pub visibility: Option<Visibility>,
    pub dll_storage: Option<DllStorage>,
    pub thread_local: Option<ThreadLocal>,
    pub unnamed_addr: Option<UnnamedAddr>,
    pub content_ty: Type,
    pub resolver: Constant,
}

impl IFunc {
    pub fn new(name: impl Into<String>, content_ty: Type, resolver: Constant) -> Self {
        IFunc {
            ident: Rc::new(GlobalIdent::named(name)),
            linkage: None,
            preemption: None,
            visibility: None,
            dll_storage: None,
            thread_local: None,
            unnamed_addr: None,
            content_ty,
            resolver,
        }
    }

    pub fn value(&self) -> Value {
        Value::global(self.ident.clone(), Type::ptr(self.content_ty.clone()))
    }
}

impl fmt::Display for IFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} =", self.ident)?;
        fmt_symbol_attrs(
            f,
            self.linkage,
            self.preemption,
            self.visibility,
            self.dll_storage,
            self.thread_local,
            self.unnamed_addr,
        )?;
        write!(f, " ifunc {}, {}", self.content_ty, self.resolver.typed())
    }
}

/// A comdat definition, `$name = comdat any`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComdatDef {
    pub name: String,
    pub kind: SelectionKind,
}

impl ComdatDef {
    pub fn new(name: impl Into<String>, kind: SelectionKind) -> Self {
        ComdatDef {
            name: name.into(),
            kind,
        }
    }
}

impl fmt::Display for ComdatDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${} = comdat {}", self.name, self.kind)
    }
}

fn fmt_symbol_attrs(
    f: &mut fmt::Formatter<'_>,
    linkage: Option<Linkage>,
    preemption: Option<Preemption>,
    visibility: Option<Visibility>,
    dll_storage: Option<DllStorage>,
    thread_local: Option<ThreadLocal>,
    unnamed_addr: Option<UnnamedAddr>,
) -> fmt::Result {
    if let Some(linkage) = linkage {
        write!(f, " {linkage}")?;
    }
    if let Some(preemption) = preemption {
        write!(f, " {preemption}")?;
    }
    if let Some(visibility) = visibility {
        write!(f, " {visibility}")?;
    }
    if let Some(dll_storage) = dll_storage {
        write!(f, " {dll_storage}")?;
    }
    if let Some(thread_local) = thread_local {
        write!(f, " {thread_local}")?;
    }
    if let Some(unnamed_addr) = unnamed_addr {
        write!(f, " {unnamed_addr}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_constant_global() {
        let mut g = Global::new(
            "msg",
            Type::array(6, Type::i8()),
            Constant::char_array(b"hello\x00".to_vec()),
        );
        g.linkage = Some(Linkage::Private);
        g.unnamed_addr = Some(UnnamedAddr::UnnamedAddr);
        g.immutable = true;
        g.align = Some(1);
        assert_eq!(
            g.to_string(),
            "@msg = private unnamed_addr constant [6 x i8] c\"hello\\00\", align 1"
        );
        assert_eq!(g.ty().to_string(), "[6 x i8]*");
    }

    #[test]
    fn test_global_declaration() {
        let g = Global::declaration("stdout", Type::ptr(Type::i8()));
        assert_eq!(g.to_string(), "@stdout = external global i8*");
    }

    #[test]
    fn test_thread_local_global() {
        let mut g = Global::new("counter", Type::i64(), Constant::i64(0));
        g.thread_local = Some(ThreadLocal::InitialExec);
        assert_eq!(
            g.to_string(),
            "@counter = thread_local(initialexec) global i64 0"
        );
    }

    #[test]
    fn test_alias_display() {
        let target = Global::new("impl", Type::i32(), Constant::i32(0));
        let mut a = Alias::new("name", Type::i32(), target.const_ref());
        a.linkage = Some(Linkage::Weak);
        assert_eq!(a.to_string(), "@name = weak alias i32, i32* @impl");
    }

    #[test]
    fn test_ifunc_and_comdat() {
        let resolver_sig = Type::func(Type::ptr(Type::i8()), vec![]);
        let resolver = Constant::global_ref(
            Rc::new(GlobalIdent::named("resolve")),
            Type::ptr(resolver_sig.clone()),
        );
        let i = IFunc::new("dispatch", Type::i8(), resolver);
        assert_eq!(
            i.to_string(),
            "@dispatch = ifunc i8, i8* ()* @resolve"
        );
        assert_eq!(
            ComdatDef::new("shared", SelectionKind::Any).to_string(),
            "$shared = comdat any"
        );
    }
}
