//! Keyword enum families
//!
//! Every enum family of the assembly syntax, with its bidirectional
//! keyword mapping: `Display` renders the canonical keyword, `FromStr`
//! is the lookup the parser uses. Unknown textual forms are an
//! [`IrError::UnknownKeyword`]; unknown enum values at serialization time
//! cannot occur (the enums are closed).

use lyra_common::IrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Define an enum whose variants map one-to-one onto assembly keywords.
macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $family:literal {
            $($variant:ident => $kw:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let kw = match self {
                    $(Self::$variant => $kw),+
                };
                f.write_str(kw)
            }
        }

        impl FromStr for $name {
            type Err = IrError;

            fn from_str(s: &str) -> Result<Self, IrError> {
                match s {
                    $($kw => Ok(Self::$variant),)+
                    _ => Err(IrError::UnknownKeyword {
                        family: $family,
                        keyword: s.to_string(),
                    }),
                }
            }
        }
    };
}

keyword_enum! {
    /// Integer comparison predicates.
    IPred, "icmp predicate" {
        Eq => "eq",
        Ne => "ne",
        Ugt => "ugt",
        Uge => "uge",
        Ult => "ult",
        Ule => "ule",
        Sgt => "sgt",
        Sge => "sge",
        Slt => "slt",
        Sle => "sle",
    }
}

keyword_enum! {
    /// Floating-point comparison predicates.
    FPred, "fcmp predicate" {
        False => "false",
        Oeq => "oeq",
        Ogt => "ogt",
        Oge => "oge",
        Olt => "olt",
        Ole => "ole",
        One => "one",
        Ord => "ord",
        Ueq => "ueq",
        Ugt => "ugt",
        Uge => "uge",
        Ult => "ult",
        Ule => "ule",
        Une => "une",
        Uno => "uno",
        True => "true",
    }
}

keyword_enum! {
    /// Fast-math flags.
    FastMathFlag, "fast-math flag" {
        AFn => "afn",
        Arcp => "arcp",
        Contract => "contract",
        Fast => "fast",
        NInf => "ninf",
        NNaN => "nnan",
        NSZ => "nsz",
        Reassoc => "reassoc",
    }
}

keyword_enum! {
    /// Integer binary opcodes.
    IBinOp, "binary opcode" {
        Add => "add",
        Sub => "sub",
        Mul => "mul",
        UDiv => "udiv",
        SDiv => "sdiv",
        URem => "urem",
        SRem => "srem",
        Shl => "shl",
        LShr => "lshr",
        AShr => "ashr",
        And => "and",
        Or => "or",
        Xor => "xor",
    }
}

impl IBinOp {
    /// Whether the opcode admits `nuw`/`nsw` wrap flags.
    pub fn has_wrap_flags(&self) -> bool {
        matches!(self, IBinOp::Add | IBinOp::Sub | IBinOp::Mul | IBinOp::Shl)
    }

    /// Whether the opcode admits the `exact` flag.
    pub fn has_exact_flag(&self) -> bool {
        matches!(
            self,
            IBinOp::UDiv | IBinOp::SDiv | IBinOp::LShr | IBinOp::AShr
        )
    }
}

keyword_enum! {
    /// Floating-point binary opcodes.
    FBinOp, "binary opcode" {
        FAdd => "fadd",
        FSub => "fsub",
        FMul => "fmul",
        FDiv => "fdiv",
        FRem => "frem",
    }
}

keyword_enum! {
    /// Conversion opcodes.
    CastOp, "conversion opcode" {
        Trunc => "trunc",
        ZExt => "zext",
        SExt => "sext",
        FPTrunc => "fptrunc",
        FPExt => "fpext",
        FPToUI => "fptoui",
        FPToSI => "fptosi",
        UIToFP => "uitofp",
        SIToFP => "sitofp",
        PtrToInt => "ptrtoint",
        IntToPtr => "inttoptr",
        BitCast => "bitcast",
        AddrSpaceCast => "addrspacecast",
    }
}

keyword_enum! {
    /// Linkage kinds of globals and functions.
    Linkage, "linkage" {
        Private => "private",
        Internal => "internal",
        AvailableExternally => "available_externally",
        LinkOnce => "linkonce",
        Weak => "weak",
        Common => "common",
        Appending => "appending",
        ExternWeak => "extern_weak",
        LinkOnceODR => "linkonce_odr",
        WeakODR => "weak_odr",
        External => "external",
    }
}

keyword_enum! {
    /// Runtime preemption specifiers.
    Preemption, "preemption specifier" {
        DsoLocal => "dso_local",
        DsoPreemptable => "dso_preemptable",
    }
}

keyword_enum! {
    /// Symbol visibility styles. Default visibility is represented by
    /// absence and never printed.
    Visibility, "visibility" {
        Hidden => "hidden",
        Protected => "protected",
    }
}

keyword_enum! {
    /// DLL storage classes.
    DllStorage, "DLL storage class" {
        Import => "dllimport",
        Export => "dllexport",
    }
}

keyword_enum! {
    /// Tail-call markers on call instructions.
    Tail, "tail mode" {
        Tail => "tail",
        MustTail => "musttail",
        NoTail => "notail",
    }
}

keyword_enum! {
    /// Unnamed-address kinds.
    UnnamedAddr, "unnamed_addr kind" {
        UnnamedAddr => "unnamed_addr",
        LocalUnnamedAddr => "local_unnamed_addr",
    }
}

keyword_enum! {
    /// Atomic memory orderings.
    AtomicOrdering, "atomic ordering" {
        Unordered => "unordered",
        Monotonic => "monotonic",
        Acquire => "acquire",
        Release => "release",
        AcqRel => "acq_rel",
        SeqCst => "seq_cst",
    }
}

keyword_enum! {
    /// `atomicrmw` operations.
    AtomicOp, "atomicrmw operation" {
        Add => "add",
        And => "and",
        FAdd => "fadd",
        FSub => "fsub",
        Max => "max",
        Min => "min",
        Nand => "nand",
        Or => "or",
        Sub => "sub",
        UMax => "umax",
        UMin => "umin",
        Xchg => "xchg",
        Xor => "xor",
    }
}

keyword_enum! {
    /// Landingpad clause kinds.
    ClauseType, "clause type" {
        Catch => "catch",
        Filter => "filter",
    }
}

keyword_enum! {
    /// Comdat selection kinds.
    SelectionKind, "selection kind" {
        Any => "any",
        ExactMatch => "exactmatch",
        Largest => "largest",
        NoDuplicates => "noduplicates",
        SameSize => "samesize",
    }
}

keyword_enum! {
    /// Named calling conventions.
    CallingConv, "calling convention" {
        C => "ccc",
        Fast => "fastcc",
        Cold => "coldcc",
        WebKitJs => "webkit_jscc",
        AnyReg => "anyregcc",
        PreserveMost => "preserve_mostcc",
        PreserveAll => "preserve_allcc",
        CxxFastTls => "cxx_fast_tlscc",
        Swift => "swiftcc",
        Tail => "tailcc",
        CfGuardCheck => "cfguard_checkcc",
        X86StdCall => "x86_stdcallcc",
        X86FastCall => "x86_fastcallcc",
        X86ThisCall => "x86_thiscallcc",
        X86VectorCall => "x86_vectorcallcc",
        X86RegCall => "x86_regcallcc",
        X86Intr => "x86_intrcc",
        X86_64SysV => "x86_64_sysvcc",
        Win64 => "win64cc",
        ArmApcs => "arm_apcscc",
        ArmAapcs => "arm_aapcscc",
        ArmAapcsVfp => "arm_aapcs_vfpcc",
        Aarch64VectorPcs => "aarch64_vector_pcs",
        Msp430Intr => "msp430_intrcc",
        AvrIntr => "avr_intrcc",
        AvrSignal => "avr_signalcc",
        PtxKernel => "ptx_kernel",
        PtxDevice => "ptx_device",
        SpirFunc => "spir_func",
        SpirKernel => "spir_kernel",
        IntelOclBi => "intel_ocl_bicc",
        Hhvm => "hhvmcc",
        HhvmC => "hhvm_ccc",
        AmdGpuVs => "amdgpu_vs",
        AmdGpuGs => "amdgpu_gs",
        AmdGpuPs => "amdgpu_ps",
        AmdGpuCs => "amdgpu_cs",
        AmdGpuHs => "amdgpu_hs",
        AmdGpuLs => "amdgpu_ls",
        AmdGpuEs => "amdgpu_es",
        AmdGpuKernel => "amdgpu_kernel",
    }
}

/// Thread-local storage models. The general-dynamic model prints as a bare
/// `thread_local`; the specific models print parenthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreadLocal {
    General,
    InitialExec,
    LocalDynamic,
    LocalExec,
}

impl fmt::Display for ThreadLocal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadLocal::General => f.write_str("thread_local"),
            ThreadLocal::InitialExec => f.write_str("thread_local(initialexec)"),
            ThreadLocal::LocalDynamic => f.write_str("thread_local(localdynamic)"),
            ThreadLocal::LocalExec => f.write_str("thread_local(localexec)"),
        }
    }
}

impl FromStr for ThreadLocal {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, IrError> {
        match s {
            "initialexec" => Ok(ThreadLocal::InitialExec),
            "localdynamic" => Ok(ThreadLocal::LocalDynamic),
            "localexec" => Ok(ThreadLocal::LocalExec),
            _ => Err(IrError::UnknownKeyword {
                family: "thread-local model",
                keyword: s.to_string(),
            }),
        }
    }
}
