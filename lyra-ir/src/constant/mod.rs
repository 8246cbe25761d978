//! Constants
//!
//! Immediate constants and the constant-expression algebra. Constants are
//! pure values: they print inline at every use site (their identifier form
//! IS their textual form), participate in no cycles, and are treated as
//! immutable once referenced.

use lyra_common::{GlobalIdent, LocalIdent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::types::{FloatKind, StructType, Type};

mod expr;

pub use self::expr::{ConstExpr, GepIndex};
pub(crate) use self::expr::{
    aggregate_elem_type, cmp_result_type, gep_inst_type, shuffle_result_type,
};

/// An IR constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    /// Integer constant. The value is kept in 128-bit two's complement.
    Int { ty: Type, value: i128 },
    /// Floating-point constant, stored as the raw bit pattern of its kind
    /// so serialization is exact.
    Float { kind: FloatKind, bits: u128 },
    /// `null` of a pointer type.
    Null { ty: Type },
    /// `none` of token type.
    NoneToken,
    /// Struct constant.
    Struct { ty: Type, fields: Vec<Constant> },
    /// Array constant.
    Array { ty: Type, elems: Vec<Constant> },
    /// Character array constant, printed `c"..."`.
    CharArray { ty: Type, bytes: Vec<u8> },
    /// Vector constant.
    Vector { ty: Type, elems: Vec<Constant> },
    ZeroInitializer { ty: Type },
    Undef { ty: Type },
    Poison { ty: Type },
    /// Address of a basic block, `blockaddress(@f, %bb)`; of type `i8*`.
    BlockAddress {
        func: Rc<GlobalIdent>,
        block: Rc<LocalIdent>,
    },
    /// Reference to a global; the type is pointer-to-content.
    GlobalRef { ident: Rc<GlobalIdent>, ty: Type },
    /// Constant expression.
    Expr(Box<ConstExpr>),
}

impl Constant {
    /// Integer constant of the given integer type.
    pub fn int(ty: Type, value: i128) -> Constant {
        assert!(ty.is_int(), "integer constant of non-integer type {ty}");
        Constant::Int { ty, value }
    }

    pub fn i1(value: bool) -> Constant {
        Constant::Int {
            ty: Type::i1(),
            value: value as i128,
        }
    }

    pub fn i8(value: i64) -> Constant {
        Constant::Int {
            ty: Type::i8(),
            value: value as i128,
        }
    }

    pub fn i32(value: i64) -> Constant {
        Constant::Int {
            ty: Type::i32(),
            value: value as i128,
        }
    }

    pub fn i64(value: i64) -> Constant {
        Constant::Int {
            ty: Type::i64(),
            value: value as i128,
        }
    }

    pub fn f32(value: f32) -> Constant {
        Constant::Float {
            kind: FloatKind::Float,
            bits: value.to_bits() as u128,
        }
    }

    pub fn f64(value: f64) -> Constant {
        Constant::Float {
            kind: FloatKind::Double,
            bits: value.to_bits() as u128,
        }
    }

    /// Floating-point constant from a raw bit pattern, for the kinds with
    /// no native Rust representation.
    pub fn float_bits(kind: FloatKind, bits: u128) -> Constant {
        Constant::Float { kind, bits }
    }

    /// `null` constant of the given pointer type.
    pub fn null(ty: Type) -> Constant {
        assert!(ty.is_pointer(), "null constant of non-pointer type {ty}");
        Constant::Null { ty }
    }

    /// Literal struct constant; the type is derived from the fields.
    pub fn struct_of(fields: Vec<Constant>, packed: bool) -> Constant {
        let field_tys = fields.iter().map(Constant::ty).collect();
        Constant::Struct {
            ty: Type::struct_of(field_tys, packed),
            fields,
        }
    }

    /// Constant of an identified struct type.
    pub fn named_struct(st: Rc<StructType>, fields: Vec<Constant>) -> Constant {
        Constant::Struct {
            ty: Type::Struct(st),
            fields,
        }
    }

    /// Array constant over the given element type.
    pub fn array(elem_ty: Type, elems: Vec<Constant>) -> Constant {
        Constant::Array {
            ty: Type::array(elems.len() as u64, elem_ty),
            elems,
        }
    }

    /// Character array constant, `c"..."`.
    pub fn char_array(bytes: Vec<u8>) -> Constant {
        Constant::CharArray {
            ty: Type::array(bytes.len() as u64, Type::i8()),
            bytes,
        }
    }

    /// Vector constant; the type is derived from the first element.
    pub fn vector(elems: Vec<Constant>) -> Constant {
        let elem_ty = elems
            .first()
            .unwrap_or_else(|| panic!("empty vector constant"))
            .ty();
        Constant::Vector {
            ty: Type::vector(elems.len() as u64, elem_ty),
            elems,
        }
    }

    pub fn zero(ty: Type) -> Constant {
        Constant::ZeroInitializer { ty }
    }

    pub fn undef(ty: Type) -> Constant {
        Constant::Undef { ty }
    }

    pub fn poison(ty: Type) -> Constant {
        Constant::Poison { ty }
    }

    pub fn block_address(func: Rc<GlobalIdent>, block: Rc<LocalIdent>) -> Constant {
        Constant::BlockAddress { func, block }
    }

    /// Reference to a global; `ty` is the pointer-to-content type.
    pub fn global_ref(ident: Rc<GlobalIdent>, ty: Type) -> Constant {
        Constant::GlobalRef { ident, ty }
    }

    pub fn expr(e: ConstExpr) -> Constant {
        Constant::Expr(Box::new(e))
    }

    /// The type of the constant. Derived for expressions, stored for
    /// everything else; derivation is pure, so repeated calls agree.
    pub fn ty(&self) -> Type {
        match self {
            Constant::Int { ty, .. }
            | Constant::Null { ty }
            | Constant::Struct { ty, .. }
            | Constant::Array { ty, .. }
            | Constant::CharArray { ty, .. }
            | Constant::Vector { ty, .. }
            | Constant::ZeroInitializer { ty }
            | Constant::Undef { ty }
            | Constant::Poison { ty }
            | Constant::GlobalRef { ty, .. } => ty.clone(),
            Constant::Float { kind, .. } => Type::Float(*kind),
            Constant::NoneToken => Type::Token,
            Constant::BlockAddress { .. } => Type::ptr(Type::i8()),
            Constant::Expr(e) => e.ty(),
        }
    }

    /// The type-value pair form, `<type> <const>`.
    pub fn typed(&self) -> String {
        format!("{} {}", self.ty(), self)
    }

    /// Return an equivalent, potentially simplified constant.
    ///
    /// Placeholder contract: not implemented for any expression yet.
    pub fn simplify(&self) -> Constant {
        match self {
            Constant::Expr(_) => unimplemented!("constant expression simplification"),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int { ty, value } => {
                if *ty == Type::i1() {
                    f.write_str(if *value != 0 { "true" } else { "false" })
                } else {
                    write!(f, "{value}")
                }
            }
            Constant::Float { kind, bits } => fmt_float(*kind, *bits, f),
            Constant::Null { .. } => f.write_str("null"),
            Constant::NoneToken => f.write_str("none"),
            Constant::Struct { ty, fields } => {
                let packed = matches!(ty, Type::Struct(st) if st.is_packed());
                if packed {
                    f.write_str("<")?;
                }
                if fields.is_empty() {
                    f.write_str("{}")?;
                } else {
                    f.write_str("{ ")?;
                    for (i, field) in fields.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{} {}", field.ty(), field)?;
                    }
                    f.write_str(" }")?;
                }
                if packed {
                    f.write_str(">")?;
                }
                Ok(())
            }
            Constant::Array { elems, .. } => {
                f.write_str("[")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {}", elem.ty(), elem)?;
                }
                f.write_str("]")
            }
            Constant::CharArray { bytes, .. } => {
                f.write_str("c\"")?;
                for &b in bytes {
                    if (b' '..=b'~').contains(&b) && b != b'"' && b != b'\\' {
                        write!(f, "{}", b as char)?;
                    } else {
                        write!(f, "\\{b:02X}")?;
                    }
                }
                f.write_str("\"")
            }
            Constant::Vector { elems, .. } => {
                f.write_str("<")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {}", elem.ty(), elem)?;
                }
                f.write_str(">")
            }
            Constant::ZeroInitializer { .. } => f.write_str("zeroinitializer"),
            Constant::Undef { .. } => f.write_str("undef"),
            Constant::Poison { .. } => f.write_str("poison"),
            Constant::BlockAddress { func, block } => {
                write!(f, "blockaddress({func}, {block})")
            }
            Constant::GlobalRef { ident, .. } => ident.fmt(f),
            Constant::Expr(e) => e.fmt(f),
        }
    }
}

/// Print a floating-point constant the way the assembly writer does:
/// decimal scientific form when it reparses to the identical bit pattern,
/// otherwise the per-kind hexadecimal form.
fn fmt_float(kind: FloatKind, bits: u128, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match kind {
        FloatKind::Half => write!(f, "0xH{:04X}", bits as u16),
        FloatKind::BFloat => write!(f, "0xR{:04X}", bits as u16),
        FloatKind::X86Fp80 => write!(f, "0xK{bits:020X}"),
        FloatKind::Fp128 => write!(f, "0xL{bits:032X}"),
        FloatKind::PpcFp128 => write!(f, "0xM{bits:032X}"),
        FloatKind::Float => fmt_f64(f32::from_bits(bits as u32) as f64, f),
        FloatKind::Double => fmt_f64(f64::from_bits(bits as u64), f),
    }
}

fn fmt_f64(v: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if v.is_finite() {
        let dec = c_exp_format(v);
        let exact = dec
            .parse::<f64>()
            .map(|r| r.to_bits() == v.to_bits())
            .unwrap_or(false);
        if exact {
            return f.write_str(&dec);
        }
    }
    write!(f, "0x{:016X}", v.to_bits())
}

/// C-style `%e` rendering: six fractional digits, sign and two digits in
/// the exponent (`1.000000e+00`).
fn c_exp_format(v: f64) -> String {
    let s = format!("{v:.6e}");
    match s.split_once('e') {
        Some((mant, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mant}e{sign}{:02}", exp.abs())
        }
        None => s,
    }
}
