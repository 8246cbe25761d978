//! Terminators
//!
//! The sole operation kind permitted to close a basic block. Block targets
//! are non-owning label references; `invoke` and `catchswitch` produce
//! results and take part in local numbering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::attrs::{FuncAttr, ReturnAttr};
use crate::block::Block;
use crate::constant::Constant;
use crate::enums::CallingConv;
use crate::inst::fmt_attachments;
use crate::metadata::MdAttachment;
use crate::types::Type;
use crate::value::{Arg, OperandBundle, Value};
use lyra_common::LocalIdent;

use crate::inst::callee_sig;

/// A terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Terminator {
    Ret(TermRet),
    Br(TermBr),
    CondBr(TermCondBr),
    Switch(TermSwitch),
    IndirectBr(TermIndirectBr),
    Invoke(TermInvoke),
    Resume(TermResume),
    CatchSwitch(TermCatchSwitch),
    CatchRet(TermCatchRet),
    CleanupRet(TermCleanupRet),
    Unreachable(TermUnreachable),
}

impl Terminator {
    /// The result identifier, for the result-producing terminators.
    pub fn ident(&self) -> Option<&Rc<LocalIdent>> {
        match self {
            Terminator::Invoke(t) => Some(&t.ident),
            Terminator::CatchSwitch(t) => Some(&t.ident),
            _ => None,
        }
    }

    /// Whether the terminator defines a local.
    pub fn produces_value(&self) -> bool {
        match self {
            Terminator::Invoke(t) => !t.ty().is_void(),
            Terminator::CatchSwitch(_) => true,
            _ => false,
        }
    }

    /// The operand values, in syntactic order.
    pub fn operands(&self) -> Vec<&Value> {
        match self {
            Terminator::Ret(t) => t.value.iter().collect(),
            Terminator::Br(_) | Terminator::Unreachable(_) => vec![],
            Terminator::CondBr(t) => vec![&t.cond],
            Terminator::Switch(t) => vec![&t.x],
            Terminator::IndirectBr(t) => vec![&t.addr],
            Terminator::Invoke(t) => {
                let mut ops = vec![&t.callee];
                ops.extend(t.args.iter().map(|arg| &arg.value));
                ops
            }
            Terminator::Resume(t) => vec![&t.x],
            Terminator::CatchSwitch(t) => match &t.scope {
                ExceptionScope::None => vec![],
                ExceptionScope::Value(v) => vec![v],
            },
            Terminator::CatchRet(t) => vec![&t.from],
            Terminator::CleanupRet(t) => vec![&t.from],
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Ret(t) => t.fmt(f),
            Terminator::Br(t) => t.fmt(f),
            Terminator::CondBr(t) => t.fmt(f),
            Terminator::Switch(t) => t.fmt(f),
            Terminator::IndirectBr(t) => t.fmt(f),
            Terminator::Invoke(t) => t.fmt(f),
            Terminator::Resume(t) => t.fmt(f),
            Terminator::CatchSwitch(t) => t.fmt(f),
            Terminator::CatchRet(t) => t.fmt(f),
            Terminator::CleanupRet(t) => t.fmt(f),
            Terminator::Unreachable(t) => t.fmt(f),
        }
    }
}

/// `ret` terminator. A missing value is a void return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermRet {
    pub value: Option<Value>,
    pub metadata: Vec<MdAttachment>,
}

impl fmt::Display for TermRet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "ret {value}")?,
            None => f.write_str("ret void")?,
        }
        fmt_attachments(f, &self.metadata)
    }
}

/// Unconditional `br` terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermBr {
    pub target: Rc<LocalIdent>,
    pub metadata: Vec<MdAttachment>,
}

impl fmt::Display for TermBr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "br label {}", self.target)?;
        fmt_attachments(f, &self.metadata)
    }
}

/// Conditional `br` terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermCondBr {
    pub cond: Value,
    pub if_true: Rc<LocalIdent>,
    pub if_false: Rc<LocalIdent>,
    pub metadata: Vec<MdAttachment>,
}

impl fmt::Display for TermCondBr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "br {}, label {}, label {}",
            self.cond, self.if_true, self.if_false
        )?;
        fmt_attachments(f, &self.metadata)
    }
}

/// A case of a `switch` terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    /// Integer case value.
    pub x: Constant,
    pub target: Rc<LocalIdent>,
}

impl Case {
    pub fn new(x: Constant, target: Rc<LocalIdent>) -> Self {
        Case { x, target }
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, label {}", self.x.typed(), self.target)
    }
}

/// `switch` terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermSwitch {
    pub x: Value,
    pub default: Rc<LocalIdent>,
    pub cases: Vec<Case>,
    pub metadata: Vec<MdAttachment>,
}

impl fmt::Display for TermSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "switch {}, label {} [\n", self.x, self.default)?;
        for case in &self.cases {
            write!(f, "\t\t{case}\n")?;
        }
        f.write_str("\t]")?;
        fmt_attachments(f, &self.metadata)
    }
}

/// `indirectbr` terminator. The address derives from a `blockaddress`
/// constant; the listed targets are the only valid destinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermIndirectBr {
    pub addr: Value,
    pub valid_targets: Vec<Rc<LocalIdent>>,
    pub metadata: Vec<MdAttachment>,
}

impl fmt::Display for TermIndirectBr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "indirectbr {}, [", self.addr)?;
        for (i, target) in self.valid_targets.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "label {target}")?;
        }
        f.write_str("]")?;
        fmt_attachments(f, &self.metadata)
    }
}

/// `invoke` terminator. Result-producing; the callee rules match `call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermInvoke {
    pub ident: Rc<LocalIdent>,
    pub callee: Value,
    pub args: Vec<Arg>,
    pub normal: Rc<LocalIdent>,
    pub exception: Rc<LocalIdent>,
    /// Cached callee signature.
    pub sig: Type,
    pub calling_conv: Option<CallingConv>,
    pub return_attrs: Vec<ReturnAttr>,
    pub addr_space: u32,
    pub func_attrs: Vec<FuncAttr>,
    pub bundles: Vec<OperandBundle>,
    pub metadata: Vec<MdAttachment>,
}

impl TermInvoke {
    pub fn new(
        callee: Value,
        args: Vec<Arg>,
        normal: Rc<LocalIdent>,
        exception: Rc<LocalIdent>,
    ) -> Self {
        let sig = callee_sig(&callee);
        TermInvoke {
            ident: Rc::new(LocalIdent::unnamed()),
            callee,
            args,
            normal,
            exception,
            sig,
            calling_conv: None,
            return_attrs: Vec::new(),
            addr_space: 0,
            func_attrs: Vec::new(),
            bundles: Vec::new(),
            metadata: Vec::new(),
        }
    }

    pub fn ty(&self) -> Type {
        match &self.sig {
            Type::Func { ret, .. } => (**ret).clone(),
            _ => unreachable!("invoke signature is always a function type"),
        }
    }

    pub fn result(&self) -> Value {
        Value::local(self.ident.clone(), self.ty())
    }

    fn is_variadic(&self) -> bool {
        matches!(&self.sig, Type::Func { variadic: true, .. })
    }
}

impl fmt::Display for TermInvoke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.ty().is_void() {
            write!(f, "{} = ", self.ident)?;
        }
        f.write_str("invoke")?;
        if let Some(cc) = self.calling_conv {
            write!(f, " {cc}")?;
        }
        for attr in &self.return_attrs {
            write!(f, " {attr}")?;
        }
        if self.addr_space != 0 {
            write!(f, " addrspace({})", self.addr_space)?;
        }
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
        write!(
            f,
            "\n\t\tto label {} unwind label {}",
            self.normal, self.exception
        )?;
        fmt_attachments(f, &self.metadata)
    }
}

/// `resume` terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermResume {
    pub x: Value,
    pub metadata: Vec<MdAttachment>,
}

impl fmt::Display for TermResume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resume {}", self.x)?;
        fmt_attachments(f, &self.metadata)
    }
}

/// Exception scope of a pad or `catchswitch`: an enclosing pad's token,
/// or the `none` sentinel for function scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExceptionScope {
    None,
    Value(Value),
}

impl fmt::Display for ExceptionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExceptionScope::None => f.write_str("none"),
            ExceptionScope::Value(v) => f.write_str(&v.ident()),
        }
    }
}

/// Unwind target of `catchswitch` and `cleanupret`: the caller, or a
/// block label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnwindTarget {
    Caller,
    Label(Rc<LocalIdent>),
}

impl fmt::Display for UnwindTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnwindTarget::Caller => f.write_str("to caller"),
            UnwindTarget::Label(label) => write!(f, "label {label}"),
        }
    }
}

/// `catchswitch` terminator. Token-typed result; handlers are catchpad
/// blocks of the same function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermCatchSwitch {
    pub ident: Rc<LocalIdent>,
    pub scope: ExceptionScope,
    pub handlers: Vec<Rc<LocalIdent>>,
    pub unwind: UnwindTarget,
    pub metadata: Vec<MdAttachment>,
}

impl TermCatchSwitch {
    pub fn new(scope: ExceptionScope, handlers: Vec<Rc<LocalIdent>>, unwind: UnwindTarget) -> Self {
        TermCatchSwitch {
            ident: Rc::new(LocalIdent::unnamed()),
            scope,
            handlers,
            unwind,
            metadata: Vec::new(),
        }
    }

    pub fn ty(&self) -> Type {
        Type::Token
    }

    /// The token result, used as the scope of catchpads.
    pub fn result(&self) -> Value {
        Value::local(self.ident.clone(), Type::Token)
    }
}

impl fmt::Display for TermCatchSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = catchswitch within {} [", self.ident, self.scope)?;
        for (i, handler) in self.handlers.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "label {handler}")?;
        }
        write!(f, "] unwind {}", self.unwind)?;
        fmt_attachments(f, &self.metadata)
    }
}

/// `catchret` terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermCatchRet {
    /// Token of the exited catchpad.
    pub from: Value,
    pub to: Rc<LocalIdent>,
    pub metadata: Vec<MdAttachment>,
}

impl fmt::Display for TermCatchRet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "catchret from {} to label {}", self.from.ident(), self.to)?;
        fmt_attachments(f, &self.metadata)
    }
}

/// `cleanupret` terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermCleanupRet {
    /// Token of the exited cleanuppad.
    pub from: Value,
    pub unwind: UnwindTarget,
    pub metadata: Vec<MdAttachment>,
}

impl fmt::Display for TermCleanupRet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cleanupret from {} unwind {}", self.from.ident(), self.unwind)?;
        fmt_attachments(f, &self.metadata)
    }
}

/// `unreachable` terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermUnreachable {
    pub metadata: Vec<MdAttachment>,
}

impl fmt::Display for TermUnreachable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unreachable")?;
        fmt_attachments(f, &self.metadata)
    }
}

/// Terminator setters: each replaces the block's terminator and returns
/// it for further adornment.
impl Block {
    pub fn new_ret(&mut self, value: Option<Value>) -> &mut TermRet {
        self.term = Some(Terminator::Ret(TermRet {
            value,
            metadata: Vec::new(),
        }));
        match self.term.as_mut() {
            Some(Terminator::Ret(term)) => term,
            _ => unreachable!(),
        }
    }

    pub fn new_br(&mut self, target: Rc<LocalIdent>) -> &mut TermBr {
        self.term = Some(Terminator::Br(TermBr {
            target,
            metadata: Vec::new(),
        }));
        match self.term.as_mut() {
            Some(Terminator::Br(term)) => term,
            _ => unreachable!(),
        }
    }

    pub fn new_cond_br(
        &mut self,
        cond: Value,
        if_true: Rc<LocalIdent>,
        if_false: Rc<LocalIdent>,
    ) -> &mut TermCondBr {
        self.term = Some(Terminator::CondBr(TermCondBr {
            cond,
            if_true,
            if_false,
            metadata: Vec::new(),
        }));
        match self.term.as_mut() {
            Some(Terminator::CondBr(term)) => term,
            _ => unreachable!(),
        }
    }

    pub fn new_switch(
        &mut self,
        x: Value,
        default: Rc<LocalIdent>,
        cases: Vec<Case>,
    ) -> &mut TermSwitch {
        self.term = Some(Terminator::Switch(TermSwitch {
            x,
            default,
            cases,
            metadata: Vec::new(),
        }));
        match self.term.as_mut() {
            Some(Terminator::Switch(term)) => term,
            _ => unreachable!(),
        }
    }

    pub fn new_indirect_br(
        &mut self,
        addr: Value,
        valid_targets: Vec<Rc<LocalIdent>>,
    ) -> &mut TermIndirectBr {
        self.term = Some(Terminator::IndirectBr(TermIndirectBr {
            addr,
            valid_targets,
            metadata: Vec::new(),
        }));
        match self.term.as_mut() {
            Some(Terminator::IndirectBr(term)) => term,
            _ => unreachable!(),
        }
    }

    pub fn new_invoke(
        &mut self,
        callee: Value,
        args: Vec<Arg>,
        normal: Rc<LocalIdent>,
        exception: Rc<LocalIdent>,
    ) -> &mut TermInvoke {
        self.term = Some(Terminator::Invoke(TermInvoke::new(
            callee, args, normal, exception,
        )));
        match self.term.as_mut() {
            Some(Terminator::Invoke(term)) => term,
            _ => unreachable!(),
        }
    }

    pub fn new_resume(&mut self, x: Value) -> &mut TermResume {
        self.term = Some(Terminator::Resume(TermResume {
            x,
            metadata: Vec::new(),
        }));
        match self.term.as_mut() {
            Some(Terminator::Resume(term)) => term,
            _ => unreachable!(),
        }
    }

    pub fn new_catch_switch(
        &mut self,
        scope: ExceptionScope,
        handlers: Vec<Rc<LocalIdent>>,
        unwind: UnwindTarget,
    ) -> &mut TermCatchSwitch {
        self.term = Some(Terminator::CatchSwitch(TermCatchSwitch::new(
            scope, handlers, unwind,
        )));
        match self.term.as_mut() {
            Some(Terminator::CatchSwitch(term)) => term,
            _ => unreachable!(),
        }
    }

    pub fn new_catch_ret(&mut self, from: Value, to: Rc<LocalIdent>) -> &mut TermCatchRet {
        self.term = Some(Terminator::CatchRet(TermCatchRet {
            from,
            to,
            metadata: Vec::new(),
        }));
        match self.term.as_mut() {
            Some(Terminator::CatchRet(term)) => term,
            _ => unreachable!(),
        }
    }

    pub fn new_cleanup_ret(&mut self, from: Value, unwind: UnwindTarget) -> &mut TermCleanupRet {
        self.term = Some(Terminator::CleanupRet(TermCleanupRet {
            from,
            unwind,
            metadata: Vec::new(),
        }));
        match self.term.as_mut() {
            Some(Terminator::CleanupRet(term)) => term,
            _ => unreachable!(),
        }
    }

    pub fn new_unreachable(&mut self) -> &mut TermUnreachable {
        self.term = Some(Terminator::Unreachable(TermUnreachable {
            metadata: Vec::new(),
        }));
        match self.term.as_mut() {
            Some(Terminator::Unreachable(term)) => term,
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::Constant;
    use lyra_common::GlobalIdent;

    fn label(name: &str) -> Rc<LocalIdent> {
        Rc::new(LocalIdent::named(name))
    }

    fn local(name: &str, ty: Type) -> Value {
        Value::local(Rc::new(LocalIdent::named(name)), ty)
    }

    #[test]
    fn test_ret_display() {
        let void_ret = TermRet {
            value: None,
            metadata: Vec::new(),
        };
        assert_eq!(void_ret.to_string(), "ret void");

        let ret = TermRet {
            value: Some(Value::from(Constant::i32(0))),
            metadata: Vec::new(),
        };
        assert_eq!(ret.to_string(), "ret i32 0");
    }

    #[test]
    fn test_branch_display() {
        let br = TermBr {
            target: label("loop"),
            metadata: Vec::new(),
        };
        assert_eq!(br.to_string(), "br label %loop");

        let cond = TermCondBr {
            cond: local("c", Type::i1()),
            if_true: label("then"),
            if_false: label("else"),
            metadata: Vec::new(),
        };
        assert_eq!(cond.to_string(), "br i1 %c, label %then, label %else");
    }

    #[test]
    fn test_switch_layout() {
        let sw = TermSwitch {
            x: local("x", Type::i32()),
            default: label("default"),
            cases: vec![
                Case::new(Constant::i32(0), label("a")),
                Case::new(Constant::i32(1), label("b")),
            ],
            metadata: Vec::new(),
        };
        assert_eq!(
            sw.to_string(),
            "switch i32 %x, label %default [\n\t\ti32 0, label %a\n\t\ti32 1, label %b\n\t]"
        );
    }

    #[test]
    fn test_invoke_display() {
        let callee = Value::global(
            Rc::new(GlobalIdent::named("may_throw")),
            Type::ptr(Type::func(Type::Void, vec![])),
        );
        let invoke = TermInvoke::new(callee, vec![], label("cont"), label("lpad"));
        assert_eq!(
            invoke.to_string(),
            "invoke void @may_throw()\n\t\tto label %cont unwind label %lpad"
        );
        assert!(invoke.ty().is_void());
    }

    #[test]
    fn test_catchswitch_display() {
        let mut cs = TermCatchSwitch::new(
            ExceptionScope::None,
            vec![label("handler")],
            UnwindTarget::Caller,
        );
        cs.ident = Rc::new(LocalIdent::named("cs"));
        assert_eq!(
            cs.to_string(),
            "%cs = catchswitch within none [label %handler] unwind to caller"
        );
        assert_eq!(cs.ty(), Type::Token);
    }

    #[test]
    fn test_cleanupret_display() {
        let cp = local("cp", Type::Token);
        let cr = TermCleanupRet {
            from: cp,
            unwind: UnwindTarget::Label(label("next")),
            metadata: Vec::new(),
        };
        assert_eq!(cr.to_string(), "cleanupret from %cp unwind label %next");
    }

    #[test]
    fn test_indirectbr_display() {
        let f = Rc::new(GlobalIdent::named("f"));
        let addr = Value::from(Constant::block_address(f, label("bb")));
        let ib = TermIndirectBr {
            addr,
            valid_targets: vec![label("bb"), label("cc")],
            metadata: Vec::new(),
        };
        assert_eq!(
            ib.to_string(),
            "indirectbr i8* blockaddress(@f, %bb), [label %bb, label %cc]"
        );
    }
}
