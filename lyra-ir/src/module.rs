//! Modules
//!
//! The top-level compilation unit: type definitions, comdats, globals,
//! aliases, ifuncs, functions, attribute groups and metadata, printed in
//! the canonical section order.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::attrs::AttrGroupDef;
use crate::function::Function;
use crate::global::{Alias, ComdatDef, Global, IFunc};
use crate::metadata::{MdDef, NamedMd};
use crate::types::{StructType, Type};
use crate::value::Value;
use lyra_common::ident::quote;
use lyra_common::IrError;

/// An IR module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    pub source_filename: Option<String>,
    pub data_layout: Option<String>,
    pub target_triple: Option<String>,
    /// Named type definitions, in insertion order.
    pub types: Vec<Rc<StructType>>,
    /// Module-level inline assembly lines.
    pub module_asm: Vec<String>,
    pub comdats: Vec<ComdatDef>,
    pub globals: Vec<Global>,
    pub aliases: Vec<Alias>,
    pub ifuncs: Vec<IFunc>,
    pub funcs: Vec<Function>,
    pub attr_groups: Vec<AttrGroupDef>,
    pub named_md: Vec<NamedMd>,
    pub md_defs: Vec<MdDef>,
}

impl Module {
    pub fn new() -> Self {
        Module::default()
    }

    /// Register a new identified struct type, opaque until its body is
    /// assigned. The returned handle is shared with every use site.
    pub fn new_named_type(&mut self, name: impl Into<String>) -> Rc<StructType> {
        let st = Rc::new(StructType::named(name));
        debug!("registered named type %{}", st.name().unwrap_or_default());
        self.types.push(st.clone());
        st
    }

    pub fn add_global(&mut self, global: Global) -> &mut Global {
        self.globals.push(global);
        self.globals.last_mut().unwrap_or_else(|| unreachable!())
    }

    pub fn add_func(&mut self, func: Function) -> &mut Function {
        self.funcs.push(func);
        self.funcs.last_mut().unwrap_or_else(|| unreachable!())
    }

    pub fn get_func(&self, name: &str) -> Option<&Function> {
        self.funcs.iter().find(|f| f.ident.name() == Some(name))
    }

    pub fn get_global(&self, name: &str) -> Option<&Global> {
        self.globals.iter().find(|g| g.ident.name() == Some(name))
    }

    /// Assign numeric ids to unnamed globals and functions, in definition
    /// order.
    pub fn assign_global_ids(&self) {
        let mut next = 0u64;
        for global in &self.globals {
            if !global.ident.is_named() {
                global.ident.set_num(next);
                next += 1;
            }
        }
        for func in &self.funcs {
            if !func.ident.is_named() {
                func.ident.set_num(next);
                next += 1;
            }
        }
    }

    /// Verify that every named struct type referenced from the module is
    /// registered. A reference to an unregistered name is a format error:
    /// the parser resolves forward references before handing the module
    /// over, so a dangling name means the module was assembled wrong.
    pub fn check_types(&self) -> Result<(), IrError> {
        let defined: HashSet<&str> = self.types.iter().filter_map(|st| st.name()).collect();
        let mut visited = HashSet::new();
        let mut check = |ty: Type| check_type(&ty, &defined, &mut visited);

        for st in &self.types {
            for i in 0..st.num_fields() {
                check(st.field(i))?;
            }
        }
        for global in &self.globals {
            check(global.content_ty.clone())?;
            if let Some(init) = &global.init {
                check(init.ty())?;
            }
        }
        for alias in &self.aliases {
            check(alias.content_ty.clone())?;
        }
        for ifunc in &self.ifuncs {
            check(ifunc.content_ty.clone())?;
        }
        for func in &self.funcs {
            check(func.sig())?;
            for block in &func.blocks {
                for inst in &block.insts {
                    check(inst.ty())?;
                    for operand in inst.operands() {
                        check(operand.ty())?;
                    }
                }
                if let Some(term) = &block.term {
                    for operand in term.operands() {
                        check(operand.ty())?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn check_type(
    ty: &Type,
    defined: &HashSet<&str>,
    visited: &mut HashSet<String>,
) -> Result<(), IrError> {
    match ty {
        Type::Pointer { elem, .. } | Type::Vector { elem, .. } | Type::Array { elem, .. } => {
            check_type(elem, defined, visited)
        }
        Type::Func { ret, params, .. } => {
            check_type(ret, defined, visited)?;
            for param in params {
                check_type(param, defined, visited)?;
            }
            Ok(())
        }
        Type::Struct(st) => {
            if let Some(name) = st.name() {
                if !defined.contains(name) {
                    return Err(IrError::UnresolvedType {
                        name: name.to_string(),
                    });
                }
                // Identified structs may be self-referential.
                if !visited.insert(name.to_string()) {
                    return Ok(());
                }
            }
            for i in 0..st.num_fields() {
                check_type(&st.field(i), defined, visited)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.assign_global_ids();

        let mut sections: Vec<String> = Vec::new();
        let mut header = Vec::new();
        if let Some(name) = &self.source_filename {
            header.push(format!("source_filename = \"{name}\""));
        }
        if let Some(layout) = &self.data_layout {
            header.push(format!("target datalayout = \"{layout}\""));
        }
        if let Some(triple) = &self.target_triple {
            header.push(format!("target triple = \"{triple}\""));
        }
        if !header.is_empty() {
            sections.push(header.join("\n"));
        }
        if !self.types.is_empty() {
            let defs = self
                .types
                .iter()
                .map(|st| {
                    let name = st.name().unwrap_or_default();
                    format!("%{} = type {}", quote(name), st.body_string())
                })
                .collect::<Vec<_>>();
            sections.push(defs.join("\n"));
        }
        if !self.module_asm.is_empty() {
            let lines = self
                .module_asm
                .iter()
                .map(|asm| format!("module asm \"{asm}\""))
                .collect::<Vec<_>>();
            sections.push(lines.join("\n"));
        }
        if !self.comdats.is_empty() {
            let defs = self
                .comdats
                .iter()
                .map(ComdatDef::to_string)
                .collect::<Vec<_>>();
            sections.push(defs.join("\n"));
        }
        if !self.globals.is_empty() {
            let defs = self
                .globals
                .iter()
                .map(Global::to_string)
                .collect::<Vec<_>>();
            sections.push(defs.join("\n"));
        }
        if !self.aliases.is_empty() {
            let defs = self
                .aliases
                .iter()
                .map(Alias::to_string)
                .collect::<Vec<_>>();
            sections.push(defs.join("\n"));
        }
        if !self.ifuncs.is_empty() {
            let defs = self.ifuncs.iter().map(IFunc::to_string).collect::<Vec<_>>();
            sections.push(defs.join("\n"));
        }
        for func in &self.funcs {
            sections.push(func.to_string());
        }
        if !self.attr_groups.is_empty() {
            let defs = self
                .attr_groups
                .iter()
                .map(AttrGroupDef::to_string)
                .collect::<Vec<_>>();
            sections.push(defs.join("\n"));
        }
        if !self.named_md.is_empty() {
            let defs = self
                .named_md
                .iter()
                .map(NamedMd::to_string)
                .collect::<Vec<_>>();
            sections.push(defs.join("\n"));
        }
        if !self.md_defs.is_empty() {
            let defs = self
                .md_defs
                .iter()
                .map(MdDef::to_string)
                .collect::<Vec<_>>();
            sections.push(defs.join("\n"));
        }

        for (i, section) in sections.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(section)?;
            f.write_str("\n")?;
        }
        Ok(())
    }
}

/// Convenience: declare a function in the module and return its callee
/// value.
impl Module {
    pub fn declare_func(
        &mut self,
        name: impl Into<String>,
        ret_ty: Type,
        param_tys: Vec<Type>,
        variadic: bool,
    ) -> Value {
        let mut func = Function::new(
            name,
            ret_ty,
            param_tys
                .into_iter()
                .map(crate::function::Param::unnamed)
                .collect(),
        );
        func.variadic = variadic;
        let value = func.value();
        self.funcs.push(func);
        value
    }
}
