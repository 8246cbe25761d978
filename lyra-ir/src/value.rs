//! IR Value Representations
//!
//! The operand sum type: every operand slot of an instruction, terminator
//! or constant expression holds a [`Value`]. A value knows its type and its
//! identifier rendering; `Display` prints the type-value pair used in
//! operand position (`i32 %x`).

use lyra_common::{GlobalIdent, LocalIdent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::attrs::ParamAttr;
use crate::constant::Constant;
use crate::types::Type;

/// An operand value.
///
/// `Local` and `Global` share their identifier with the defining node, so
/// lazy numeric id assignment at serialization time is visible at every
/// use site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Function parameter or instruction result.
    Local { ident: Rc<LocalIdent>, ty: Type },
    /// Global variable, function, alias or ifunc reference. The type is
    /// the pointer-to-content type.
    Global { ident: Rc<GlobalIdent>, ty: Type },
    /// Immediate constant, printed inline.
    Const(Constant),
    /// Inline assembly, usable only in callee position.
    Asm(InlineAsm),
}

impl Value {
    pub fn local(ident: Rc<LocalIdent>, ty: Type) -> Value {
        Value::Local { ident, ty }
    }

    pub fn global(ident: Rc<GlobalIdent>, ty: Type) -> Value {
        Value::Global { ident, ty }
    }

    /// The type of the value.
    pub fn ty(&self) -> Type {
        match self {
            Value::Local { ty, .. } | Value::Global { ty, .. } => ty.clone(),
            Value::Const(c) => c.ty(),
            Value::Asm(asm) => asm.ty.clone(),
        }
    }

    /// The identifier form of the value: `%x`, `@g`, or the inline text of
    /// a constant.
    pub fn ident(&self) -> String {
        match self {
            Value::Local { ident, .. } => ident.to_string(),
            Value::Global { ident, .. } => ident.to_string(),
            Value::Const(c) => c.to_string(),
            Value::Asm(asm) => asm.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty(), self.ident())
    }
}

impl From<Constant> for Value {
    fn from(c: Constant) -> Value {
        Value::Const(c)
    }
}

/// A call-site argument: a value with optional parameter attributes,
/// printed `<type> <attrs> <ident>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arg {
    pub attrs: Vec<ParamAttr>,
    pub value: Value,
}

impl Arg {
    pub fn new(value: Value) -> Arg {
        Arg {
            attrs: Vec::new(),
            value,
        }
    }

    pub fn with_attrs(value: Value, attrs: Vec<ParamAttr>) -> Arg {
        Arg { attrs, value }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Arg {
        Arg::new(value)
    }
}

impl From<Constant> for Arg {
    fn from(c: Constant) -> Arg {
        Arg::new(Value::Const(c))
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value.ty())?;
        for attr in &self.attrs {
            write!(f, " {attr}")?;
        }
        write!(f, " {}", self.value.ident())
    }
}

/// Inline assembly. Only valid as the callee of `call` and `invoke`; the
/// type is the function signature of the asm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineAsm {
    pub ty: Type,
    pub asm: String,
    pub constraints: String,
    pub side_effect: bool,
    pub align_stack: bool,
    pub intel_dialect: bool,
}

impl InlineAsm {
    pub fn new(ty: Type, asm: impl Into<String>, constraints: impl Into<String>) -> InlineAsm {
        InlineAsm {
            ty,
            asm: asm.into(),
            constraints: constraints.into(),
            side_effect: false,
            align_stack: false,
            intel_dialect: false,
        }
    }
}

impl fmt::Display for InlineAsm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("asm")?;
        if self.side_effect {
            f.write_str(" sideeffect")?;
        }
        if self.align_stack {
            f.write_str(" alignstack")?;
        }
        if self.intel_dialect {
            f.write_str(" inteldialect")?;
        }
        write!(f, " \"{}\", \"{}\"", self.asm, self.constraints)
    }
}

/// An operand bundle on a call site, e.g. `"deopt"(i32 %x)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperandBundle {
    pub tag: String,
    pub inputs: Vec<Value>,
}

impl OperandBundle {
    pub fn new(tag: impl Into<String>, inputs: Vec<Value>) -> OperandBundle {
        OperandBundle {
            tag: tag.into(),
            inputs,
        }
    }
}

impl fmt::Display for OperandBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"(", self.tag)?;
        for (i, input) in self.inputs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{input}")?;
        }
        f.write_str(")")
    }
}
