//! Other instructions
//!
//! Comparisons, `phi`, `select`, `freeze`, `call`, `va_arg`, and the
//! exception-handling pads (`landingpad`, `catchpad`, `cleanuppad`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::attrs::{FuncAttr, ReturnAttr};
use crate::block::Block;
use crate::constant::cmp_result_type;
use crate::enums::{CallingConv, ClauseType, FPred, FastMathFlag, IPred, Tail};
use crate::inst::{fmt_attachments, Inst};
use crate::metadata::MdAttachment;
use crate::term::ExceptionScope;
use crate::types::Type;
use crate::value::{Arg, OperandBundle, Value};
use lyra_common::LocalIdent;

/// `icmp` instruction. The result is `i1`, or a vector of `i1` matching
/// the operand shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstICmp {
    pub ident: Rc<LocalIdent>,
    pub pred: IPred,
    /// Integer scalar, pointer, or vector of either.
    pub x: Value,
    pub y: Value,
    pub ty: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstICmp {
    pub fn new(pred: IPred, x: Value, y: Value) -> Self {
        let ty = cmp_result_type(&x.ty(), /*float*/ false);
        InstICmp {
            ident: Rc::new(LocalIdent::unnamed()),
            pred,
            x,
            y,
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

impl fmt::Display for InstICmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = icmp {} {}, {}",
            self.ident,
            self.pred,
            self.x,
            self.y.ident()
        )?;
        fmt_attachments(f, &self.metadata)
    }
}

/// `fcmp` instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstFCmp {
    pub ident: Rc<LocalIdent>,
    pub pred: FPred,
    pub x: Value,
    pub y: Value,
    pub fast_math: Vec<FastMathFlag>,
    pub ty: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstFCmp {
    pub fn new(pred: FPred, x: Value, y: Value) -> Self {
        let ty = cmp_result_type(&x.ty(), /*float*/ true);
        InstFCmp {
            ident: Rc::new(LocalIdent::unnamed()),
            pred,
            x,
            y,
            fast_math: Vec::new(),
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

impl fmt::Display for InstFCmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = fcmp", self.ident)?;
        for flag in &self.fast_math {
            write!(f, " {flag}")?;
        }
        write!(f, " {} {}, {}", self.pred, self.x, self.y.ident())?;
        fmt_attachments(f, &self.metadata)
    }
}

/// An incoming value of a `phi` instruction: the value and the label of
/// the predecessor block it arrives from. The label reference is
/// non-owning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incoming {
    pub value: Value,
    pub pred: Rc<LocalIdent>,
}

impl Incoming {
    pub fn new(value: Value, pred: Rc<LocalIdent>) -> Self {
        Incoming { value, pred }
    }
}

impl fmt::Display for Incoming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {}, {} ]", self.value.ident(), self.pred)
    }
}

/// `phi` instruction. All incoming values share the result type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstPhi {
    pub ident: Rc<LocalIdent>,
    pub incs: Vec<Incoming>,
    pub ty: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstPhi {
    pub fn new(incs: Vec<Incoming>) -> Self {
        let ty = incs
            .first()
            .unwrap_or_else(|| panic!("empty phi instruction"))
            .value
            .ty();
        InstPhi {
            ident: Rc::new(LocalIdent::unnamed()),
            incs,
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

impl fmt::Display for InstPhi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = phi {} ", self.ident, self.ty)?;
        for (i, inc) in self.incs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{inc}")?;
        }
        fmt_attachments(f, &self.metadata)
    }
}

/// `select` instruction; the result type is the then-operand's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstSelect {
    pub ident: Rc<LocalIdent>,
    /// `i1`, or a vector of `i1` matching the operand shape.
    pub cond: Value,
    pub x: Value,
    pub y: Value,
    pub fast_math: Vec<FastMathFlag>,
    pub ty: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstSelect {
    pub fn new(cond: Value, x: Value, y: Value) -> Self {
        let ty = x.ty();
        InstSelect {
            ident: Rc::new(LocalIdent::unnamed()),
            cond,
            x,
            y,
            fast_math: Vec::new(),
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

impl fmt::Display for InstSelect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = select", self.ident)?;
        for flag in &self.fast_math {
            write!(f, " {flag}")?;
        }
        write!(f, " {}, {}, {}", self.cond, self.x, self.y)?;
        fmt_attachments(f, &self.metadata)
    }
}

/// `freeze` instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstFreeze {
    pub ident: Rc<LocalIdent>,
    pub x: Value,
    pub ty: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstFreeze {
    pub fn new(x: Value) -> Self {
        let ty = x.ty();
        InstFreeze {
            ident: Rc::new(LocalIdent::unnamed()),
            x,
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

impl fmt::Display for InstFreeze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = freeze {}", self.ident, self.x)?;
        fmt_attachments(f, &self.metadata)
    }
}

/// The function signature of a callee value. The callee slot accepts
/// function references, function-pointer-typed values, and inline
/// assembly; anything else is fatal.
pub(crate) fn callee_sig(callee: &Value) -> Type {
    match callee.ty() {
        Type::Pointer { elem, .. } if elem.is_func() => *elem,
        // Inline assembly carries its signature directly.
        sig @ Type::Func { .. } => sig,
        ty => panic!("invalid callee type `{ty}`; expected pointer to function"),
    }
}

/// `call` instruction.
///
/// The full callee signature is cached so the serializer can print the
/// signature in place of the return type when the callee is variadic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstCall {
    pub ident: Rc<LocalIdent>,
    pub callee: Value,
    pub args: Vec<Arg>,
    /// Cached callee signature.
    pub sig: Type,
    pub tail: Option<Tail>,
    pub fast_math: Vec<FastMathFlag>,
    pub calling_conv: Option<CallingConv>,
    pub return_attrs: Vec<ReturnAttr>,
    pub addr_space: u32,
    pub func_attrs: Vec<FuncAttr>,
    pub bundles: Vec<OperandBundle>,
    pub metadata: Vec<MdAttachment>,
}

impl InstCall {
    pub fn new(callee: Value, args: Vec<Arg>) -> Self {
        let sig = callee_sig(&callee);
        InstCall {
            ident: Rc::new(LocalIdent::unnamed()),
            callee,
            args,
            sig,
            tail: None,
            fast_math: Vec::new(),
            calling_conv: None,
            return_attrs: Vec::new(),
            addr_space: 0,
            func_attrs: Vec::new(),
            bundles: Vec::new(),
            metadata: Vec::new(),
        }
    }

    /// The result type: the return type of the callee signature.
    pub fn ty(&self) -> Type {
        match &self.sig {
            Type::Func { ret, .. } => (**ret).clone(),
            _ => unreachable!("call signature is always a function type"),
        }
    }

    /// The result as an operand, for non-void calls.
    pub fn result(&self) -> Value {
        Value::local(self.ident.clone(), self.ty())
    }

    fn is_variadic(&self) -> bool {
        matches!(&self.sig, Type::Func { variadic: true, .. })
    }
}

impl fmt::Display for InstCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.ty().is_void() {
            write!(f, "{} = ", self.ident)?;
        }
        if let Some(tail) = self.tail {
            write!(f, "{tail} ")?;
        }
        f.write_str("call")?;
        for flag in &self.fast_math {
            write!(f, " {flag}")?;
        }
        if let Some(cc) = self.calling_conv {
            write!(f, " {cc}")?;
        }
        for attr in &self.return_attrs {
            write!(f, " {attr}")?;
        }
        if self.addr_space != 0 {
            write!(f, " addrspace({})", self.addr_space)?;
        }
        // Variadic callees print the full signature in place of the
        // return type.
        if self.is_variadic() {
            write!(f, " {}", self.sig)?;
        } else {
            write!(f, " {}", self.ty())?;
        }
        write!(f, " {}(", self.callee.ident())?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")?;
        for attr in &self.func_attrs {
            write!(f, " {attr}")?;
        }
        if !self.bundles.is_empty() {
            f.write_str(" [ ")?;
            for (i, bundle) in self.bundles.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{bundle}")?;
            }
            f.write_str(" ]")?;
        }
        fmt_attachments(f, &self.metadata)
    }
}

/// `va_arg` instruction; the result type is stated explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstVAArg {
    pub ident: Rc<LocalIdent>,
    pub arg_list: Value,
    pub arg_ty: Type,
    pub metadata: Vec<MdAttachment>,
}

impl InstVAArg {
    pub fn new(arg_list: Value, arg_ty: Type) -> Self {
        InstVAArg {
            ident: Rc::new(LocalIdent::unnamed()),
            arg_list,
            arg_ty,
            metadata: Vec::new(),
        }
    }

    pub fn ty(&self) -> Type {
        self.arg_ty.clone()
    }

    pub fn result(&self) -> Value {
        Value::local(self.ident.clone(), self.arg_ty.clone())
    }
}

impl fmt::Display for InstVAArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = va_arg {}, {}", self.ident, self.arg_list, self.arg_ty)?;
        fmt_attachments(f, &self.metadata)
    }
}

/// A landingpad catch or filter clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub kind: ClauseType,
    pub x: Value,
}

impl Clause {
    pub fn catch(x: Value) -> Self {
        Clause {
            kind: ClauseType::Catch,
            x,
        }
    }

    pub fn filter(x: Value) -> Self {
        Clause {
            kind: ClauseType::Filter,
            x,
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.x)
    }
}

/// `landingpad` instruction. Clauses may be empty only when the cleanup
/// flag is set; serializing a landingpad with neither is fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstLandingPad {
    pub ident: Rc<LocalIdent>,
    pub result_ty: Type,
    pub cleanup: bool,
    pub clauses: Vec<Clause>,
    pub metadata: Vec<MdAttachment>,
}

impl InstLandingPad {
    pub fn new(result_ty: Type, clauses: Vec<Clause>) -> Self {
        InstLandingPad {
            ident: Rc::new(LocalIdent::unnamed()),
            result_ty,
            cleanup: false,
            clauses,
            metadata: Vec::new(),
        }
    }

    pub fn ty(&self) -> Type {
        self.result_ty.clone()
    }

    pub fn result(&self) -> Value {
        Value::local(self.ident.clone(), self.result_ty.clone())
    }
}

impl fmt::Display for InstLandingPad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.cleanup && self.clauses.is_empty() {
            panic!("landingpad without cleanup requires at least one clause");
        }
        write!(f, "{} = landingpad {}", self.ident, self.result_ty)?;
        // Clause continuation lines are indented one level deeper than
        // the instruction.
        if self.cleanup {
            f.write_str("\n\t\tcleanup")?;
        }
        for clause in &self.clauses {
            write!(f, "\n\t\t{clause}")?;
        }
        fmt_attachments(f, &self.metadata)
    }
}

/// `catchpad` instruction. The scope names a `catchswitch` terminator of
/// the same function; its result is token-typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstCatchPad {
    pub ident: Rc<LocalIdent>,
    /// Token result of the scoping `catchswitch`.
    pub scope: Value,
    pub args: Vec<Value>,
    pub metadata: Vec<MdAttachment>,
}

impl InstCatchPad {
    pub fn new(scope: Value, args: Vec<Value>) -> Self {
        InstCatchPad {
            ident: Rc::new(LocalIdent::unnamed()),
            scope,
            args,
            metadata: Vec::new(),
        }
    }

    pub fn ty(&self) -> Type {
        Type::Token
    }

    pub fn result(&self) -> Value {
        Value::local(self.ident.clone(), Type::Token)
    }
}

impl fmt::Display for InstCatchPad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = catchpad within {} [", self.ident, self.scope.ident())?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str("]")?;
        fmt_attachments(f, &self.metadata)
    }
}

/// `cleanuppad` instruction. The scope is another pad or the `none`
/// sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstCleanupPad {
    pub ident: Rc<LocalIdent>,
    pub scope: ExceptionScope,
    pub args: Vec<Value>,
    pub metadata: Vec<MdAttachment>,
}

impl InstCleanupPad {
    pub fn new(scope: ExceptionScope, args: Vec<Value>) -> Self {
        InstCleanupPad {
            ident: Rc::new(LocalIdent::unnamed()),
            scope,
            args,
            metadata: Vec::new(),
        }
    }

    pub fn ty(&self) -> Type {
        Type::Token
    }

    pub fn result(&self) -> Value {
        Value::local(self.ident.clone(), Type::Token)
    }
}

impl fmt::Display for InstCleanupPad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = cleanuppad within {} [", self.ident, self.scope)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str("]")?;
        fmt_attachments(f, &self.metadata)
    }
}

/// Append helpers for the other family.
impl Block {
    pub fn new_icmp(&mut self, pred: IPred, x: Value, y: Value) -> &mut InstICmp {
        self.insts.push(Inst::ICmp(InstICmp::new(pred, x, y)));
        match self.insts.last_mut() {
            Some(Inst::ICmp(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_fcmp(&mut self, pred: FPred, x: Value, y: Value) -> &mut InstFCmp {
        self.insts.push(Inst::FCmp(InstFCmp::new(pred, x, y)));
        match self.insts.last_mut() {
            Some(Inst::FCmp(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_phi(&mut self, incs: Vec<Incoming>) -> &mut InstPhi {
        self.insts.push(Inst::Phi(InstPhi::new(incs)));
        match self.insts.last_mut() {
            Some(Inst::Phi(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_select(&mut self, cond: Value, x: Value, y: Value) -> &mut InstSelect {
        self.insts.push(Inst::Select(InstSelect::new(cond, x, y)));
        match self.insts.last_mut() {
            Some(Inst::Select(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_freeze(&mut self, x: Value) -> &mut InstFreeze {
        self.insts.push(Inst::Freeze(InstFreeze::new(x)));
        match self.insts.last_mut() {
            Some(Inst::Freeze(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_call(&mut self, callee: Value, args: Vec<Arg>) -> &mut InstCall {
        self.insts.push(Inst::Call(InstCall::new(callee, args)));
        match self.insts.last_mut() {
            Some(Inst::Call(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_va_arg(&mut self, arg_list: Value, arg_ty: Type) -> &mut InstVAArg {
        self.insts.push(Inst::VAArg(InstVAArg::new(arg_list, arg_ty)));
        match self.insts.last_mut() {
            Some(Inst::VAArg(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_landingpad(&mut self, result_ty: Type, clauses: Vec<Clause>) -> &mut InstLandingPad {
        self.insts
            .push(Inst::LandingPad(InstLandingPad::new(result_ty, clauses)));
        match self.insts.last_mut() {
            Some(Inst::LandingPad(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_catchpad(&mut self, scope: Value, args: Vec<Value>) -> &mut InstCatchPad {
        self.insts.push(Inst::CatchPad(InstCatchPad::new(scope, args)));
        match self.insts.last_mut() {
            Some(Inst::CatchPad(inst)) => inst,
            _ => unreachable!(),
        }
    }

    pub fn new_cleanuppad(&mut self, scope: ExceptionScope, args: Vec<Value>) -> &mut InstCleanupPad {
        self.insts
            .push(Inst::CleanupPad(InstCleanupPad::new(scope, args)));
        match self.insts.last_mut() {
            Some(Inst::CleanupPad(inst)) => inst,
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::Constant;
    use lyra_common::GlobalIdent;

    fn local(name: &str, ty: Type) -> Value {
        Value::local(Rc::new(LocalIdent::named(name)), ty)
    }

    fn func_ref(name: &str, sig: Type) -> Value {
        Value::global(Rc::new(GlobalIdent::named(name)), Type::ptr(sig))
    }

    #[test]
    fn test_icmp_scalar() {
        let inst = InstICmp::new(IPred::Eq, local("a", Type::i32()), local("b", Type::i32()));
        assert_eq!(inst.ty(), Type::i1());
        let mut inst = inst;
        inst.ident = Rc::new(LocalIdent::named("cmp"));
        assert_eq!(inst.to_string(), "%cmp = icmp eq i32 %a, %b");
    }

    #[test]
    fn test_icmp_vector() {
        let vec_ty = Type::vector(4, Type::i32());
        let inst = InstICmp::new(
            IPred::Slt,
            local("a", vec_ty.clone()),
            local("b", vec_ty),
        );
        assert_eq!(inst.ty().to_string(), "<4 x i1>");
    }

    #[test]
    fn test_icmp_pointer_operands() {
        let p = Type::ptr(Type::i8());
        let inst = InstICmp::new(IPred::Ne, local("p", p.clone()), local("q", p));
        assert_eq!(inst.ty(), Type::i1());
    }

    #[test]
    #[should_panic(expected = "invalid icmp operand type")]
    fn test_icmp_float_operands_rejected() {
        let _ = InstICmp::new(
            IPred::Eq,
            local("x", Type::double()),
            local("y", Type::double()),
        );
    }

    #[test]
    fn test_fcmp_fast_math() {
        let mut inst = InstFCmp::new(
            FPred::Olt,
            local("x", Type::float()),
            local("y", Type::float()),
        );
        inst.ident = Rc::new(LocalIdent::named("lt"));
        inst.fast_math = vec![FastMathFlag::NNaN, FastMathFlag::NSZ];
        assert_eq!(inst.to_string(), "%lt = fcmp nnan nsz olt float %x, %y");
        assert_eq!(inst.ty(), Type::i1());
    }

    #[test]
    fn test_phi_display() {
        let entry = Rc::new(LocalIdent::named("entry"));
        let loop_ = Rc::new(LocalIdent::named("loop"));
        let mut inst = InstPhi::new(vec![
            Incoming::new(Value::from(Constant::i32(0)), entry),
            Incoming::new(local("next", Type::i32()), loop_),
        ]);
        inst.ident = Rc::new(LocalIdent::named("i"));
        assert_eq!(
            inst.to_string(),
            "%i = phi i32 [ 0, %entry ], [ %next, %loop ]"
        );
        assert_eq!(inst.ty(), Type::i32());
    }

    #[test]
    #[should_panic(expected = "empty phi")]
    fn test_empty_phi_rejected() {
        let _ = InstPhi::new(vec![]);
    }

    #[test]
    fn test_select_display() {
        let mut inst = InstSelect::new(
            local("c", Type::i1()),
            Value::from(Constant::i32(1)),
            Value::from(Constant::i32(2)),
        );
        inst.ident = Rc::new(LocalIdent::named("r"));
        assert_eq!(inst.to_string(), "%r = select i1 %c, i32 1, i32 2");
        assert_eq!(inst.ty(), Type::i32());
    }

    #[test]
    fn test_void_call_elides_result() {
        let f = func_ref("f", Type::func(Type::Void, vec![Type::i32()]));
        let inst = InstCall::new(f, vec![Arg::from(local("x", Type::i32()))]);
        assert_eq!(inst.to_string(), "call void @f(i32 %x)");
        assert!(inst.ty().is_void());
    }

    #[test]
    fn test_nonvoid_call_prints_result() {
        let f = func_ref("g", Type::func(Type::i32(), vec![]));
        let mut inst = InstCall::new(f, vec![]);
        inst.ident = Rc::new(LocalIdent::named("r"));
        assert_eq!(inst.to_string(), "%r = call i32 @g()");
    }

    #[test]
    fn test_variadic_call_prints_signature() {
        let sig = Type::variadic_func(Type::i32(), vec![Type::ptr(Type::i8())]);
        let printf = func_ref("printf", sig);
        let mut inst = InstCall::new(
            printf,
            vec![
                Arg::from(local("fmt", Type::ptr(Type::i8()))),
                Arg::from(Value::from(Constant::i32(42))),
            ],
        );
        inst.ident = Rc::new(LocalIdent::named("n"));
        assert_eq!(
            inst.to_string(),
            "%n = call i32 (i8*, ...) @printf(i8* %fmt, i32 42)"
        );
        assert_eq!(inst.ty(), Type::i32());
    }

    #[test]
    fn test_call_adornments() {
        let f = func_ref("h", Type::func(Type::Void, vec![]));
        let mut inst = InstCall::new(f, vec![]);
        inst.tail = Some(Tail::Tail);
        inst.calling_conv = Some(CallingConv::Fast);
        inst.func_attrs = vec![FuncAttr::NoUnwind, FuncAttr::Group(2)];
        assert_eq!(inst.to_string(), "tail call fastcc void @h() nounwind #2");
    }

    #[test]
    fn test_call_with_operand_bundle() {
        let f = func_ref("target", Type::func(Type::Void, vec![]));
        let mut inst = InstCall::new(f, vec![]);
        inst.bundles = vec![OperandBundle::new(
            "deopt",
            vec![Value::from(Constant::i32(10))],
        )];
        assert_eq!(inst.to_string(), "call void @target() [ \"deopt\"(i32 10) ]");
    }

    #[test]
    fn test_call_inline_asm_callee() {
        let asm = crate::value::InlineAsm {
            ty: Type::func(Type::Void, vec![]),
            asm: "nop".to_string(),
            constraints: String::new(),
            side_effect: true,
            align_stack: false,
            intel_dialect: false,
        };
        let inst = InstCall::new(Value::Asm(asm), vec![]);
        assert_eq!(inst.to_string(), "call void asm sideeffect \"nop\", \"\"()");
    }

    #[test]
    fn test_call_through_local_function_pointer() {
        let fp = local("fp", Type::ptr(Type::func(Type::i8(), vec![])));
        let inst = InstCall::new(fp, vec![]);
        assert_eq!(inst.ty(), Type::i8());
    }

    #[test]
    #[should_panic(expected = "invalid callee type")]
    fn test_non_function_callee_rejected() {
        let _ = InstCall::new(local("x", Type::i32()), vec![]);
    }

    #[test]
    fn test_va_arg() {
        let mut inst = InstVAArg::new(local("ap", Type::ptr(Type::i8())), Type::i32());
        inst.ident = Rc::new(LocalIdent::named("v"));
        assert_eq!(inst.to_string(), "%v = va_arg i8* %ap, i32");
        assert_eq!(inst.ty(), Type::i32());
    }

    #[test]
    fn test_landingpad_layout() {
        let lp_ty = Type::struct_of(vec![Type::ptr(Type::i8()), Type::i32()], false);
        let type_info = Value::global(
            Rc::new(GlobalIdent::named("type_info")),
            Type::ptr(Type::i8()),
        );
        let mut inst = InstLandingPad::new(lp_ty, vec![Clause::catch(type_info)]);
        inst.ident = Rc::new(LocalIdent::named("lp"));
        inst.cleanup = true;
        assert_eq!(
            inst.to_string(),
            "%lp = landingpad { i8*, i32 }\n\t\tcleanup\n\t\tcatch i8* @type_info"
        );
    }

    #[test]
    #[should_panic(expected = "requires at least one clause")]
    fn test_landingpad_without_cleanup_or_clauses_rejected() {
        let lp_ty = Type::struct_of(vec![Type::ptr(Type::i8()), Type::i32()], false);
        let mut inst = InstLandingPad::new(lp_ty, vec![]);
        inst.ident = Rc::new(LocalIdent::named("lp"));
        let _ = inst.to_string();
    }

    #[test]
    fn test_pads_are_token_typed() {
        let cs = local("cs", Type::Token);
        let catch = InstCatchPad::new(cs, vec![]);
        assert_eq!(catch.ty(), Type::Token);

        let cleanup = InstCleanupPad::new(ExceptionScope::None, vec![]);
        assert_eq!(cleanup.ty(), Type::Token);
        let mut cleanup = cleanup;
        cleanup.ident = Rc::new(LocalIdent::named("cp"));
        assert_eq!(cleanup.to_string(), "%cp = cleanuppad within none []");
    }
}
