//! Constant expressions
//!
//! Pure, side-effect-free computations over constants, mirroring the
//! instruction opcodes. Types are derived under the same rules as the
//! corresponding instructions; no evaluation is performed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constant::Constant;
use crate::enums::{CastOp, FBinOp, FPred, IBinOp, IPred};
use crate::types::Type;
use crate::value::Value;

/// A constant expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstExpr {
    /// Integer arithmetic, bitwise and shift expressions.
    IntBinary {
        op: IBinOp,
        x: Constant,
        y: Constant,
    },
    /// Floating-point arithmetic expressions.
    FloatBinary {
        op: FBinOp,
        x: Constant,
        y: Constant,
    },
    ICmp {
        pred: IPred,
        x: Constant,
        y: Constant,
    },
    FCmp {
        pred: FPred,
        x: Constant,
        y: Constant,
    },
    Cast {
        op: CastOp,
        from: Constant,
        to: Type,
    },
    Select {
        cond: Constant,
        x: Constant,
        y: Constant,
    },
    ExtractElement {
        x: Constant,
        index: Constant,
    },
    InsertElement {
        x: Constant,
        elem: Constant,
        index: Constant,
    },
    ShuffleVector {
        x: Constant,
        y: Constant,
        mask: Constant,
    },
    ExtractValue {
        x: Constant,
        indices: Vec<u64>,
    },
    InsertValue {
        x: Constant,
        elem: Constant,
        indices: Vec<u64>,
    },
    GetElementPtr {
        in_bounds: bool,
        elem_ty: Type,
        src: Constant,
        indices: Vec<GepIndex>,
    },
}

impl ConstExpr {
    /// `getelementptr` expression over the given element type.
    pub fn gep(elem_ty: Type, src: Constant, indices: Vec<GepIndex>) -> ConstExpr {
        ConstExpr::GetElementPtr {
            in_bounds: false,
            elem_ty,
            src,
            indices,
        }
    }

    /// `getelementptr inbounds` expression.
    pub fn gep_inbounds(elem_ty: Type, src: Constant, indices: Vec<GepIndex>) -> ConstExpr {
        ConstExpr::GetElementPtr {
            in_bounds: true,
            elem_ty,
            src,
            indices,
        }
    }

    /// The derived type of the expression.
    pub fn ty(&self) -> Type {
        match self {
            ConstExpr::IntBinary { x, .. } | ConstExpr::FloatBinary { x, .. } => x.ty(),
            ConstExpr::ICmp { x, .. } => cmp_result_type(&x.ty(), /*float*/ false),
            ConstExpr::FCmp { x, .. } => cmp_result_type(&x.ty(), /*float*/ true),
            ConstExpr::Cast { to, .. } => to.clone(),
            ConstExpr::Select { x, .. } => x.ty(),
            ConstExpr::ExtractElement { x, .. } => match x.ty() {
                Type::Vector { elem, .. } => *elem,
                ty => panic!("extractelement of non-vector type `{ty}`"),
            },
            ConstExpr::InsertElement { x, .. } => x.ty(),
            ConstExpr::ShuffleVector { x, mask, .. } => shuffle_result_type(&x.ty(), &mask.ty()),
            ConstExpr::ExtractValue { x, indices } => aggregate_elem_type(&x.ty(), indices),
            ConstExpr::InsertValue { x, .. } => x.ty(),
            ConstExpr::GetElementPtr {
                elem_ty, indices, ..
            } => gep_expr_type(elem_ty, indices),
        }
    }
}

impl fmt::Display for ConstExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstExpr::IntBinary { op, x, y } => {
                write!(f, "{op} ({}, {})", x.typed(), y.typed())
            }
            ConstExpr::FloatBinary { op, x, y } => {
                write!(f, "{op} ({}, {})", x.typed(), y.typed())
            }
            ConstExpr::ICmp { pred, x, y } => {
                write!(f, "icmp {pred} ({}, {})", x.typed(), y.typed())
            }
            ConstExpr::FCmp { pred, x, y } => {
                write!(f, "fcmp {pred} ({}, {})", x.typed(), y.typed())
            }
            ConstExpr::Cast { op, from, to } => {
                write!(f, "{op} ({} to {to})", from.typed())
            }
            ConstExpr::Select { cond, x, y } => {
                write!(f, "select ({}, {}, {})", cond.typed(), x.typed(), y.typed())
            }
            ConstExpr::ExtractElement { x, index } => {
                write!(f, "extractelement ({}, {})", x.typed(), index.typed())
            }
            ConstExpr::InsertElement { x, elem, index } => {
                write!(
                    f,
                    "insertelement ({}, {}, {})",
                    x.typed(),
                    elem.typed(),
                    index.typed()
                )
            }
            ConstExpr::ShuffleVector { x, y, mask } => {
                write!(
                    f,
                    "shufflevector ({}, {}, {})",
                    x.typed(),
                    y.typed(),
                    mask.typed()
                )
            }
            ConstExpr::ExtractValue { x, indices } => {
                write!(f, "extractvalue ({}", x.typed())?;
                for index in indices {
                    write!(f, ", {index}")?;
                }
                f.write_str(")")
            }
            ConstExpr::InsertValue { x, elem, indices } => {
                write!(f, "insertvalue ({}, {}", x.typed(), elem.typed())?;
                for index in indices {
                    write!(f, ", {index}")?;
                }
                f.write_str(")")
            }
            ConstExpr::GetElementPtr {
                in_bounds,
                elem_ty,
                src,
                indices,
            } => {
                f.write_str("getelementptr")?;
                if *in_bounds {
                    f.write_str(" inbounds")?;
                }
                write!(f, " ({elem_ty}, {}", src.typed())?;
                for index in indices {
                    write!(f, ", {index}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// An index of a `getelementptr` constant expression, optionally tagged
/// `inrange`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GepIndex {
    pub in_range: bool,
    pub index: Constant,
}

impl GepIndex {
    pub fn new(index: Constant) -> GepIndex {
        GepIndex {
            in_range: false,
            index,
        }
    }

    pub fn in_range(index: Constant) -> GepIndex {
        GepIndex {
            in_range: true,
            index,
        }
    }
}

impl From<Constant> for GepIndex {
    fn from(index: Constant) -> GepIndex {
        GepIndex::new(index)
    }
}

impl fmt::Display for GepIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.in_range {
            write!(f, "inrange {}", self.index.typed())
        } else {
            f.write_str(&self.index.typed())
        }
    }
}

// ### [ Type derivation helpers ] #############################################

/// Result shape of `icmp`/`fcmp`: `i1`, or a matching vector of `i1`.
pub(crate) fn cmp_result_type(operand: &Type, float: bool) -> Type {
    let scalar_ok = |ty: &Type| {
        if float {
            ty.is_float()
        } else {
            ty.is_int() || ty.is_pointer()
        }
    };
    match operand {
        ty if scalar_ok(ty) => Type::i1(),
        Type::Vector {
            len,
            scalable,
            elem,
        } if scalar_ok(elem) => Type::Vector {
            len: *len,
            scalable: *scalable,
            elem: Box::new(Type::i1()),
        },
        ty => {
            let kind = if float { "fcmp" } else { "icmp" };
            panic!("invalid {kind} operand type `{ty}`");
        }
    }
}

/// Result type of `shufflevector`: the mask's length over the operand's
/// element type.
pub(crate) fn shuffle_result_type(x: &Type, mask: &Type) -> Type {
    let elem = match x {
        Type::Vector { elem, .. } => elem.as_ref().clone(),
        ty => panic!("shufflevector of non-vector type `{ty}`"),
    };
    match mask {
        Type::Vector { len, scalable, .. } => Type::Vector {
            len: *len,
            scalable: *scalable,
            elem: Box::new(elem),
        },
        ty => panic!("shufflevector mask of non-vector type `{ty}`"),
    }
}

/// Element type selected by `extractvalue`/`insertvalue` indices.
pub(crate) fn aggregate_elem_type(ty: &Type, indices: &[u64]) -> Type {
    let mut e = ty.clone();
    for &index in indices {
        e = match e {
            Type::Struct(st) => st.field(index as usize),
            Type::Array { elem, .. } => *elem,
            ty => panic!("cannot index into non-aggregate type `{ty}`"),
        };
    }
    e
}

/// A view over one gep index, constant or value.
enum GepIdx<'a> {
    Const(&'a Constant),
    Val(&'a Value),
}

impl GepIdx<'_> {
    fn ty(&self) -> Type {
        match self {
            GepIdx::Const(c) => c.ty(),
            GepIdx::Val(v) => v.ty(),
        }
    }

    fn as_constant(&self) -> Option<&Constant> {
        match self {
            GepIdx::Const(c) => Some(c),
            GepIdx::Val(Value::Const(c)) => Some(c),
            GepIdx::Val(_) => None,
        }
    }
}

/// Extract the struct field index selected by a gep index constant. Vector
/// indices must be uniform across lanes; `zeroinitializer` selects field 0.
fn struct_field_index(index: &Constant) -> i128 {
    match index {
        Constant::Int { value, .. } => *value,
        Constant::ZeroInitializer { .. } => 0,
        Constant::Vector { elems, .. } => {
            let mut lanes = elems.iter().map(|elem| match elem {
                Constant::Int { value, .. } => *value,
                other => panic!("invalid struct index lane; expected integer constant, got `{other}`"),
            });
            let first = lanes
                .next()
                .unwrap_or_else(|| panic!("empty vector as struct index"));
            for lane in lanes {
                if lane != first {
                    panic!("struct index mismatch; vector lanes {first} and {lane} differ");
                }
            }
            first
        }
        other => panic!(
            "invalid struct index; expected integer constant, integer vector or zeroinitializer, got `{other}`"
        ),
    }
}

/// Walk the element type selected by gep indices. The 0th index only
/// scales the base pointer and never advances the type.
fn gep_descend(elem_ty: &Type, indices: &[GepIdx]) -> Type {
    let mut e = elem_ty.clone();
    for (i, index) in indices.iter().enumerate() {
        if i == 0 {
            continue;
        }
        e = match e {
            Type::Pointer { .. } => {
                panic!("cannot index into element of pointer type `{elem_ty}`")
            }
            Type::Vector { elem, .. } | Type::Array { elem, .. } => *elem,
            Type::Struct(st) => {
                let index = index
                    .as_constant()
                    .unwrap_or_else(|| panic!("non-constant index into struct type"));
                st.field(struct_field_index(index) as usize)
            }
            ty => panic!("cannot index into element type `{ty}`"),
        };
    }
    e
}

/// Result type of a `getelementptr` constant expression over `elem_ty`.
/// A vector 0th index makes the result a vector of pointers.
pub(crate) fn gep_expr_type(elem_ty: &Type, indices: &[GepIndex]) -> Type {
    let views: Vec<GepIdx> = indices.iter().map(|i| GepIdx::Const(&i.index)).collect();
    let e = gep_descend(elem_ty, &views);
    if let Some(first) = indices.first() {
        if let Type::Vector { len, scalable, .. } = first.index.ty() {
            return Type::Vector {
                len,
                scalable,
                elem: Box::new(Type::ptr(e)),
            };
        }
    }
    Type::ptr(e)
}

/// Result type of a `getelementptr` instruction: a vector of pointers when
/// the source or any index is a vector, with all lane counts agreeing.
pub(crate) fn gep_inst_type(elem_ty: &Type, src: &Value, indices: &[Value]) -> Type {
    let mut lanes: Option<(u64, bool)> = None;
    let mut observe = |ty: &Type| {
        if let Type::Vector { len, scalable, .. } = ty {
            if let Some((seen, _)) = lanes {
                if seen != *len {
                    panic!("gep vector operand length mismatch; {seen} versus {len}");
                }
            }
            lanes = Some((*len, *scalable));
        }
    };
    observe(&src.ty());
    for index in indices {
        observe(&index.ty());
    }
    let views: Vec<GepIdx> = indices.iter().map(GepIdx::Val).collect();
    let e = gep_descend(elem_ty, &views);
    match lanes {
        Some((len, scalable)) => Type::Vector {
            len,
            scalable,
            elem: Box::new(Type::ptr(e)),
        },
        None => Type::ptr(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StructType;
    use lyra_common::GlobalIdent;
    use std::rc::Rc;

    fn named(name: &str, fields: Vec<Type>) -> Rc<StructType> {
        let st = Rc::new(StructType::named(name));
        st.set_body(fields, false);
        st
    }

    #[test]
    fn test_gep_through_struct() {
        // %S = type { i32, [10 x i8] }; gep (S, S* %p, i32 0, i32 1, i32 3) : i8*
        let s = named("S", vec![Type::i32(), Type::array(10, Type::i8())]);
        let s_ty = Type::Struct(s);
        let src = Constant::global_ref(Rc::new(GlobalIdent::named("p")), Type::ptr(s_ty.clone()));
        let e = ConstExpr::gep(
            s_ty,
            src,
            vec![
                Constant::i32(0).into(),
                Constant::i32(1).into(),
                Constant::i32(3).into(),
            ],
        );
        assert_eq!(e.ty().to_string(), "i8*");
    }

    #[test]
    fn test_gep_inrange_display() {
        let t = named("T", vec![Type::i32(), Type::i64()]);
        let t_ty = Type::Struct(t);
        let src = Constant::global_ref(Rc::new(GlobalIdent::named("g")), Type::ptr(t_ty.clone()));
        let e = ConstExpr::gep_inbounds(
            t_ty,
            src,
            vec![
                GepIndex::in_range(Constant::i32(0)),
                GepIndex::new(Constant::i32(1)),
            ],
        );
        assert_eq!(e.ty().to_string(), "i64*");
        assert_eq!(
            e.to_string(),
            "getelementptr inbounds (%T, %T* @g, inrange i32 0, i32 1)"
        );
    }

    #[test]
    fn test_gep_vector_index_wraps_result() {
        let src = Constant::global_ref(
            Rc::new(GlobalIdent::named("a")),
            Type::ptr(Type::array(8, Type::i32())),
        );
        let lanes = Constant::vector(vec![Constant::i64(0), Constant::i64(1)]);
        let e = ConstExpr::gep(
            Type::array(8, Type::i32()),
            src,
            vec![lanes.into(), Constant::i64(3).into()],
        );
        assert_eq!(e.ty().to_string(), "<2 x i32*>");
    }

    #[test]
    fn test_gep_uniform_vector_struct_index() {
        let s = named("pair", vec![Type::i32(), Type::i8()]);
        let src = Constant::global_ref(
            Rc::new(GlobalIdent::named("p")),
            Type::ptr(Type::Struct(s.clone())),
        );
        let uniform = Constant::vector(vec![Constant::i32(1), Constant::i32(1)]);
        let e = ConstExpr::gep(
            Type::Struct(s),
            src,
            vec![Constant::i32(0).into(), uniform.into()],
        );
        assert_eq!(e.ty().to_string(), "i8*");
    }

    #[test]
    #[should_panic(expected = "struct index mismatch")]
    fn test_gep_lane_mismatch() {
        let s = named("pair2", vec![Type::i32(), Type::i8()]);
        let src = Constant::global_ref(
            Rc::new(GlobalIdent::named("p")),
            Type::ptr(Type::Struct(s.clone())),
        );
        let skewed = Constant::vector(vec![Constant::i32(0), Constant::i32(1)]);
        let e = ConstExpr::gep(
            Type::Struct(s),
            src,
            vec![Constant::i32(0).into(), skewed.into()],
        );
        let _ = e.ty();
    }

    #[test]
    #[should_panic(expected = "pointer type")]
    fn test_gep_through_pointer_mid_walk() {
        let src = Constant::global_ref(
            Rc::new(GlobalIdent::named("pp")),
            Type::ptr(Type::ptr(Type::i32())),
        );
        let e = ConstExpr::gep(
            Type::ptr(Type::i32()),
            src,
            vec![Constant::i32(0).into(), Constant::i32(0).into()],
        );
        let _ = e.ty();
    }

    #[test]
    fn test_cmp_expr_types() {
        let e = ConstExpr::ICmp {
            pred: IPred::Eq,
            x: Constant::i32(1),
            y: Constant::i32(2),
        };
        assert_eq!(e.ty(), Type::i1());
        assert_eq!(e.to_string(), "icmp eq (i32 1, i32 2)");

        let vx = Constant::vector(vec![Constant::i32(1), Constant::i32(2)]);
        let vy = Constant::vector(vec![Constant::i32(3), Constant::i32(4)]);
        let ve = ConstExpr::ICmp {
            pred: IPred::Slt,
            x: vx,
            y: vy,
        };
        assert_eq!(ve.ty().to_string(), "<2 x i1>");
    }

    #[test]
    fn test_cast_and_select_exprs() {
        let cast = ConstExpr::Cast {
            op: CastOp::BitCast,
            from: Constant::null(Type::ptr(Type::i8())),
            to: Type::ptr(Type::i32()),
        };
        assert_eq!(cast.ty().to_string(), "i32*");
        assert_eq!(cast.to_string(), "bitcast (i8* null to i32*)");

        let select = ConstExpr::Select {
            cond: Constant::i1(true),
            x: Constant::i32(1),
            y: Constant::i32(2),
        };
        assert_eq!(select.ty(), Type::i32());
        assert_eq!(select.to_string(), "select (i1 true, i32 1, i32 2)");
    }

    #[test]
    fn test_aggregate_exprs() {
        let agg = Constant::struct_of(
            vec![
                Constant::i32(1),
                Constant::array(Type::i8(), vec![Constant::i8(0), Constant::i8(1)]),
            ],
            false,
        );
        let e = ConstExpr::ExtractValue {
            x: agg,
            indices: vec![1, 0],
        };
        assert_eq!(e.ty(), Type::i8());
        assert_eq!(
            e.to_string(),
            "extractvalue ({ i32, [2 x i8] } { i32 1, [2 x i8] [i8 0, i8 1] }, 1, 0)"
        );
    }
}
