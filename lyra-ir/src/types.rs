//! IR Type System
//!
//! Defines the closed algebra of IR types: void, integers, floating-point
//! kinds, pointers, vectors, arrays, structs, function signatures, and the
//! special label/token/metadata types.
//!
//! Equality is structural for every variant except named (identified)
//! structs, which compare by name. Named struct types live behind `Rc` so
//! a module-scoped definition and all its use sites share one body; the
//! body may be assigned after registration (opaque, then resolved), which
//! is what makes forward references work.

use lyra_common::ident::quote;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Floating-point kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatKind {
    Half,
    BFloat,
    Float,
    Double,
    Fp128,
    X86Fp80,
    PpcFp128,
}

impl FloatKind {
    /// Width of the storage format in bits.
    pub fn bits(&self) -> u32 {
        match self {
            FloatKind::Half | FloatKind::BFloat => 16,
            FloatKind::Float => 32,
            FloatKind::Double => 64,
            FloatKind::X86Fp80 => 80,
            FloatKind::Fp128 | FloatKind::PpcFp128 => 128,
        }
    }
}

impl fmt::Display for FloatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FloatKind::Half => "half",
            FloatKind::BFloat => "bfloat",
            FloatKind::Float => "float",
            FloatKind::Double => "double",
            FloatKind::Fp128 => "fp128",
            FloatKind::X86Fp80 => "x86_fp80",
            FloatKind::PpcFp128 => "ppc_fp128",
        };
        f.write_str(name)
    }
}

/// IR type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Type {
    Void,
    /// Arbitrary-width integer type (`i1`, `i8`, ..., `i1942652`).
    Int { bits: u32 },
    Float(FloatKind),
    Pointer { elem: Box<Type>, addr_space: u32 },
    Vector {
        len: u64,
        scalable: bool,
        elem: Box<Type>,
    },
    Array { len: u64, elem: Box<Type> },
    /// Literal or identified struct type. Identified structs are shared;
    /// see [`StructType`].
    Struct(Rc<StructType>),
    Func {
        ret: Box<Type>,
        params: Vec<Type>,
        variadic: bool,
    },
    Label,
    Token,
    Metadata,
}

impl Type {
    pub fn int(bits: u32) -> Type {
        Type::Int { bits }
    }

    pub fn i1() -> Type {
        Type::Int { bits: 1 }
    }

    pub fn i8() -> Type {
        Type::Int { bits: 8 }
    }

    pub fn i16() -> Type {
        Type::Int { bits: 16 }
    }

    pub fn i32() -> Type {
        Type::Int { bits: 32 }
    }

    pub fn i64() -> Type {
        Type::Int { bits: 64 }
    }

    pub fn float() -> Type {
        Type::Float(FloatKind::Float)
    }

    pub fn double() -> Type {
        Type::Float(FloatKind::Double)
    }

    /// Pointer in address space 0.
    pub fn ptr(elem: Type) -> Type {
        Type::Pointer {
            elem: Box::new(elem),
            addr_space: 0,
        }
    }

    pub fn ptr_in(elem: Type, addr_space: u32) -> Type {
        Type::Pointer {
            elem: Box::new(elem),
            addr_space,
        }
    }

    pub fn vector(len: u64, elem: Type) -> Type {
        Type::Vector {
            len,
            scalable: false,
            elem: Box::new(elem),
        }
    }

    pub fn scalable_vector(len: u64, elem: Type) -> Type {
        Type::Vector {
            len,
            scalable: true,
            elem: Box::new(elem),
        }
    }

    pub fn array(len: u64, elem: Type) -> Type {
        Type::Array {
            len,
            elem: Box::new(elem),
        }
    }

    /// Literal (anonymous) struct type.
    pub fn struct_of(fields: Vec<Type>, packed: bool) -> Type {
        Type::Struct(Rc::new(StructType::literal(fields, packed)))
    }

    pub fn func(ret: Type, params: Vec<Type>) -> Type {
        Type::Func {
            ret: Box::new(ret),
            params,
            variadic: false,
        }
    }

    pub fn variadic_func(ret: Type, params: Vec<Type>) -> Type {
        Type::Func {
            ret: Box::new(ret),
            params,
            variadic: true,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Type::Int { .. })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer { .. })
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Type::Vector { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array { .. })
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Type::Struct(_))
    }

    pub fn is_func(&self) -> bool {
        matches!(self, Type::Func { .. })
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, Type::Array { .. } | Type::Struct(_))
    }

    /// Element type of a pointer, vector or array.
    pub fn elem_type(&self) -> Option<&Type> {
        match self {
            Type::Pointer { elem, .. } | Type::Vector { elem, .. } | Type::Array { elem, .. } => {
                Some(elem)
            }
            _ => None,
        }
    }

    /// Lane count of a vector type.
    pub fn vector_len(&self) -> Option<u64> {
        match self {
            Type::Vector { len, .. } => Some(*len),
            _ => None,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Void, Type::Void) => true,
            (Type::Int { bits: a }, Type::Int { bits: b }) => a == b,
            (Type::Float(a), Type::Float(b)) => a == b,
            (
                Type::Pointer { elem: a, addr_space: sa },
                Type::Pointer { elem: b, addr_space: sb },
            ) => sa == sb && a == b,
            (
                Type::Vector { len: la, scalable: sa, elem: a },
                Type::Vector { len: lb, scalable: sb, elem: b },
            ) => la == lb && sa == sb && a == b,
            (Type::Array { len: la, elem: a }, Type::Array { len: lb, elem: b }) => {
                la == lb && a == b
            }
            (Type::Struct(a), Type::Struct(b)) => StructType::equal(a, b),
            (
                Type::Func { ret: ra, params: pa, variadic: va },
                Type::Func { ret: rb, params: pb, variadic: vb },
            ) => ra == rb && pa == pb && va == vb,
            (Type::Label, Type::Label) => true,
            (Type::Token, Type::Token) => true,
            (Type::Metadata, Type::Metadata) => true,
            _ => false,
        }
    }
}

impl Eq for Type {}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => f.write_str("void"),
            Type::Int { bits } => write!(f, "i{bits}"),
            Type::Float(kind) => kind.fmt(f),
            Type::Pointer { elem, addr_space: 0 } => write!(f, "{elem}*"),
            Type::Pointer { elem, addr_space } => write!(f, "{elem} addrspace({addr_space})*"),
            Type::Vector { len, scalable: false, elem } => write!(f, "<{len} x {elem}>"),
            Type::Vector { len, scalable: true, elem } => {
                write!(f, "<vscale x {len} x {elem}>")
            }
            Type::Array { len, elem } => write!(f, "[{len} x {elem}]"),
            Type::Struct(st) => match st.name() {
                // Identified structs are referenced by name; the body is
                // printed with the module's type definitions.
                Some(name) => write!(f, "%{}", quote(name)),
                None => f.write_str(&st.body_string()),
            },
            Type::Func { ret, params, variadic } => {
                write!(f, "{ret} (")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                if *variadic {
                    if !params.is_empty() {
                        f.write_str(", ")?;
                    }
                    f.write_str("...")?;
                }
                f.write_str(")")
            }
            Type::Label => f.write_str("label"),
            Type::Token => f.write_str("token"),
            Type::Metadata => f.write_str("metadata"),
        }
    }
}

/// Body of a struct type: its field list and packing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructBody {
    pub fields: Vec<Type>,
    pub packed: bool,
}

/// A struct type. Literal structs carry no name and compare structurally;
/// identified structs carry a name, compare by it, and may start opaque
/// (no body) to support forward references.
#[derive(Debug, Serialize, Deserialize)]
pub struct StructType {
    name: Option<String>,
    body: RefCell<Option<StructBody>>,
}

impl StructType {
    /// Create an identified struct type with no body yet (opaque).
    pub fn named(name: impl Into<String>) -> Self {
        StructType {
            name: Some(name.into()),
            body: RefCell::new(None),
        }
    }

    /// Create a literal struct type.
    pub fn literal(fields: Vec<Type>, packed: bool) -> Self {
        StructType {
            name: None,
            body: RefCell::new(Some(StructBody { fields, packed })),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_opaque(&self) -> bool {
        self.body.borrow().is_none()
    }

    /// Resolve an opaque struct by assigning its body. All existing
    /// references observe the assignment.
    pub fn set_body(&self, fields: Vec<Type>, packed: bool) {
        *self.body.borrow_mut() = Some(StructBody { fields, packed });
    }

    /// Number of fields; zero while opaque.
    pub fn num_fields(&self) -> usize {
        self.body.borrow().as_ref().map_or(0, |b| b.fields.len())
    }

    /// The type of field `i`. Panics on an opaque struct or an
    /// out-of-range index.
    pub fn field(&self, i: usize) -> Type {
        let body = self.body.borrow();
        let body = body
            .as_ref()
            .unwrap_or_else(|| panic!("field access on opaque struct type"));
        body.fields[i].clone()
    }

    pub fn is_packed(&self) -> bool {
        self.body.borrow().as_ref().is_some_and(|b| b.packed)
    }

    /// The textual body form: `{ i32, i8 }`, `<{ i32 }>`, or `opaque`.
    pub fn body_string(&self) -> String {
        let body = self.body.borrow();
        let body = match body.as_ref() {
            Some(body) => body,
            None => return "opaque".to_string(),
        };
        if body.fields.is_empty() {
            return if body.packed { "<{}>".to_string() } else { "{}".to_string() };
        }
        let fields = body
            .fields
            .iter()
            .map(Type::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        if body.packed {
            format!("<{{ {fields} }}>")
        } else {
            format!("{{ {fields} }}")
        }
    }

    /// Struct equality: identified structs compare by name, literal
    /// structs compare structurally, and the two kinds never compare equal.
    pub fn equal(a: &Rc<StructType>, b: &Rc<StructType>) -> bool {
        if Rc::ptr_eq(a, b) {
            return true;
        }
        match (&a.name, &b.name) {
            (Some(x), Some(y)) => x == y,
            (None, None) => *a.body.borrow() == *b.body.borrow(),
            _ => false,
        }
    }
}
