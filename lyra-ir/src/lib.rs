//! Lyra - LLVM IR model and textual serializer
//!
//! This crate defines an in-memory model of LLVM IR modules and the rules
//! that turn the model into its canonical assembly (`.ll`) form.
//!
//! ## Architecture
//!
//! The crate is structured leaves-first:
//! - `types` - the IR type system
//! - `enums` - keyword enum families (predicates, linkage, orderings, ...)
//! - `attrs` - function, parameter and return attributes
//! - `value` - the operand sum type and inline assembly
//! - `constant` - constants and the constant-expression algebra
//! - `inst` - instructions, grouped by family, with block append helpers
//! - `term` - terminators
//! - `block` - basic blocks
//! - `function` - functions and parameters
//! - `global` - global variables, aliases, ifuncs, comdats
//! - `metadata` - metadata attachments and module-level definitions
//! - `module` - the top-level compilation unit
//!
//! Modules are built programmatically through the `new_*` helpers on
//! [`Block`], [`Function`] and [`Module`], or delivered fully formed by a
//! textual parser. Serialization is `Display`: `module.to_string()` yields
//! the assembly form, byte-identical across repeated calls.

pub mod attrs;
pub mod block;
pub mod constant;
pub mod enums;
pub mod function;
pub mod global;
pub mod inst;
pub mod metadata;
pub mod module;
pub mod term;
pub mod types;
pub mod value;

pub use self::attrs::{AttrGroupDef, FuncAttr, ParamAttr, ReturnAttr};
pub use self::block::Block;
pub use self::constant::{ConstExpr, Constant, GepIndex};
pub use self::function::{Function, Param};
pub use self::global::{Alias, ComdatDef, Global, IFunc};
pub use self::inst::Inst;
pub use self::metadata::{MdAttachment, MdDef, MdField, MdNode, MdRef, NamedMd};
pub use self::module::Module;
pub use self::term::{Case, ExceptionScope, Terminator, UnwindTarget};
pub use self::types::{FloatKind, StructType, Type};
pub use self::value::{Arg, InlineAsm, OperandBundle, Value};

pub use lyra_common::{GlobalIdent, IrError, LocalIdent};
