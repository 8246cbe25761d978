//! Function, parameter and return attributes
//!
//! Attribute sets appear inline on functions, call sites and parameters,
//! or collected into numbered attribute groups printed at module end.
//! The serializer reproduces whichever grouping was recorded rather than
//! re-deriving it, so golden output matches the source.

use lyra_common::ident::quote;
use lyra_common::IrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Function attribute: a bare keyword, a parameterized keyword, a string
/// attribute, or a reference to a numbered attribute group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FuncAttr {
    AlwaysInline,
    ArgMemOnly,
    Builtin,
    Cold,
    Convergent,
    InaccessibleMemOrArgMemOnly,
    InaccessibleMemOnly,
    InlineHint,
    JumpTable,
    MinSize,
    Naked,
    NoBuiltin,
    NoDuplicate,
    NoFree,
    NoImplicitFloat,
    NoInline,
    NonLazyBind,
    NoRecurse,
    NoRedZone,
    NoReturn,
    NoSync,
    NoUnwind,
    OptNone,
    OptSize,
    ReadNone,
    ReadOnly,
    ReturnsTwice,
    SafeStack,
    SanitizeAddress,
    SanitizeHWAddress,
    SanitizeMemory,
    SanitizeMemTag,
    SanitizeThread,
    Speculatable,
    SpeculativeLoadHardening,
    Ssp,
    SspReq,
    SspStrong,
    StrictFP,
    Uwtable,
    WillReturn,
    WriteOnly,
    /// `alignstack(<n>)`
    AlignStack(u64),
    /// `"key"` or `"key"="value"`
    StringAttr { key: String, value: Option<String> },
    /// `#<n>`: reference to a module-level attribute group.
    Group(u64),
}

impl fmt::Display for FuncAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kw = match self {
            FuncAttr::AlwaysInline => "alwaysinline",
            FuncAttr::ArgMemOnly => "argmemonly",
            FuncAttr::Builtin => "builtin",
            FuncAttr::Cold => "cold",
            FuncAttr::Convergent => "convergent",
            FuncAttr::InaccessibleMemOrArgMemOnly => "inaccessiblemem_or_argmemonly",
            FuncAttr::InaccessibleMemOnly => "inaccessiblememonly",
            FuncAttr::InlineHint => "inlinehint",
            FuncAttr::JumpTable => "jumptable",
            FuncAttr::MinSize => "minsize",
            FuncAttr::Naked => "naked",
            FuncAttr::NoBuiltin => "nobuiltin",
            FuncAttr::NoDuplicate => "noduplicate",
            FuncAttr::NoFree => "nofree",
            FuncAttr::NoImplicitFloat => "noimplicitfloat",
            FuncAttr::NoInline => "noinline",
            FuncAttr::NonLazyBind => "nonlazybind",
            FuncAttr::NoRecurse => "norecurse",
            FuncAttr::NoRedZone => "noredzone",
            FuncAttr::NoReturn => "noreturn",
            FuncAttr::NoSync => "nosync",
            FuncAttr::NoUnwind => "nounwind",
            FuncAttr::OptNone => "optnone",
            FuncAttr::OptSize => "optsize",
            FuncAttr::ReadNone => "readnone",
            FuncAttr::ReadOnly => "readonly",
            FuncAttr::ReturnsTwice => "returns_twice",
            FuncAttr::SafeStack => "safestack",
            FuncAttr::SanitizeAddress => "sanitize_address",
            FuncAttr::SanitizeHWAddress => "sanitize_hwaddress",
            FuncAttr::SanitizeMemory => "sanitize_memory",
            FuncAttr::SanitizeMemTag => "sanitize_memtag",
            FuncAttr::SanitizeThread => "sanitize_thread",
            FuncAttr::Speculatable => "speculatable",
            FuncAttr::SpeculativeLoadHardening => "speculative_load_hardening",
            FuncAttr::Ssp => "ssp",
            FuncAttr::SspReq => "sspreq",
            FuncAttr::SspStrong => "sspstrong",
            FuncAttr::StrictFP => "strictfp",
            FuncAttr::Uwtable => "uwtable",
            FuncAttr::WillReturn => "willreturn",
            FuncAttr::WriteOnly => "writeonly",
            FuncAttr::AlignStack(n) => return write!(f, "alignstack({n})"),
            FuncAttr::StringAttr { key, value } => {
                write!(f, "\"{key}\"")?;
                if let Some(value) = value {
                    write!(f, "=\"{value}\"")?;
                }
                return Ok(());
            }
            FuncAttr::Group(id) => return write!(f, "#{id}"),
        };
        f.write_str(kw)
    }
}

impl FromStr for FuncAttr {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, IrError> {
        let attr = match s {
            "alwaysinline" => FuncAttr::AlwaysInline,
            "argmemonly" => FuncAttr::ArgMemOnly,
            "builtin" => FuncAttr::Builtin,
            "cold" => FuncAttr::Cold,
            "convergent" => FuncAttr::Convergent,
            "inaccessiblemem_or_argmemonly" => FuncAttr::InaccessibleMemOrArgMemOnly,
            "inaccessiblememonly" => FuncAttr::InaccessibleMemOnly,
            "inlinehint" => FuncAttr::InlineHint,
            "jumptable" => FuncAttr::JumpTable,
            "minsize" => FuncAttr::MinSize,
            "naked" => FuncAttr::Naked,
            "nobuiltin" => FuncAttr::NoBuiltin,
            "noduplicate" => FuncAttr::NoDuplicate,
            "nofree" => FuncAttr::NoFree,
            "noimplicitfloat" => FuncAttr::NoImplicitFloat,
            "noinline" => FuncAttr::NoInline,
            "nonlazybind" => FuncAttr::NonLazyBind,
            "norecurse" => FuncAttr::NoRecurse,
            "noredzone" => FuncAttr::NoRedZone,
            "noreturn" => FuncAttr::NoReturn,
            "nosync" => FuncAttr::NoSync,
            "nounwind" => FuncAttr::NoUnwind,
            "optnone" => FuncAttr::OptNone,
            "optsize" => FuncAttr::OptSize,
            "readnone" => FuncAttr::ReadNone,
            "readonly" => FuncAttr::ReadOnly,
            "returns_twice" => FuncAttr::ReturnsTwice,
            "safestack" => FuncAttr::SafeStack,
            "sanitize_address" => FuncAttr::SanitizeAddress,
            "sanitize_hwaddress" => FuncAttr::SanitizeHWAddress,
            "sanitize_memory" => FuncAttr::SanitizeMemory,
            "sanitize_memtag" => FuncAttr::SanitizeMemTag,
            "sanitize_thread" => FuncAttr::SanitizeThread,
            "speculatable" => FuncAttr::Speculatable,
            "speculative_load_hardening" => FuncAttr::SpeculativeLoadHardening,
            "ssp" => FuncAttr::Ssp,
            "sspreq" => FuncAttr::SspReq,
            "sspstrong" => FuncAttr::SspStrong,
            "strictfp" => FuncAttr::StrictFP,
            "uwtable" => FuncAttr::Uwtable,
            "willreturn" => FuncAttr::WillReturn,
            "writeonly" => FuncAttr::WriteOnly,
            _ => {
                return Err(IrError::UnknownKeyword {
                    family: "function attribute",
                    keyword: s.to_string(),
                })
            }
        };
        Ok(attr)
    }
}

/// Parameter attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamAttr {
    ByVal,
    ImmArg,
    InAlloca,
    InReg,
    Nest,
    NoAlias,
    NoCapture,
    NoFree,
    NonNull,
    ReadNone,
    ReadOnly,
    Returned,
    SignExt,
    SRet,
    SwiftError,
    SwiftSelf,
    WriteOnly,
    ZeroExt,
    /// `align <n>`
    Align(u64),
    /// `dereferenceable(<n>)`
    Dereferenceable(u64),
    /// `dereferenceable_or_null(<n>)`
    DereferenceableOrNull(u64),
}

impl fmt::Display for ParamAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kw = match self {
            ParamAttr::ByVal => "byval",
            ParamAttr::ImmArg => "immarg",
            ParamAttr::InAlloca => "inalloca",
            ParamAttr::InReg => "inreg",
            ParamAttr::Nest => "nest",
            ParamAttr::NoAlias => "noalias",
            ParamAttr::NoCapture => "nocapture",
            ParamAttr::NoFree => "nofree",
            ParamAttr::NonNull => "nonnull",
            ParamAttr::ReadNone => "readnone",
            ParamAttr::ReadOnly => "readonly",
            ParamAttr::Returned => "returned",
            ParamAttr::SignExt => "signext",
            ParamAttr::SRet => "sret",
            ParamAttr::SwiftError => "swifterror",
            ParamAttr::SwiftSelf => "swiftself",
            ParamAttr::WriteOnly => "writeonly",
            ParamAttr::ZeroExt => "zeroext",
            ParamAttr::Align(n) => return write!(f, "align {n}"),
            ParamAttr::Dereferenceable(n) => return write!(f, "dereferenceable({n})"),
            ParamAttr::DereferenceableOrNull(n) => {
                return write!(f, "dereferenceable_or_null({n})")
            }
        };
        f.write_str(kw)
    }
}

impl FromStr for ParamAttr {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, IrError> {
        let attr = match s {
            "byval" => ParamAttr::ByVal,
            "immarg" => ParamAttr::ImmArg,
            "inalloca" => ParamAttr::InAlloca,
            "inreg" => ParamAttr::InReg,
            "nest" => ParamAttr::Nest,
            "noalias" => ParamAttr::NoAlias,
            "nocapture" => ParamAttr::NoCapture,
            "nofree" => ParamAttr::NoFree,
            "nonnull" => ParamAttr::NonNull,
            "readnone" => ParamAttr::ReadNone,
            "readonly" => ParamAttr::ReadOnly,
            "returned" => ParamAttr::Returned,
            "signext" => ParamAttr::SignExt,
            "sret" => ParamAttr::SRet,
            "swifterror" => ParamAttr::SwiftError,
            "swiftself" => ParamAttr::SwiftSelf,
            "writeonly" => ParamAttr::WriteOnly,
            "zeroext" => ParamAttr::ZeroExt,
            _ => {
                return Err(IrError::UnknownKeyword {
                    family: "parameter attribute",
                    keyword: s.to_string(),
                })
            }
        };
        Ok(attr)
    }
}

/// Return-value attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReturnAttr {
    InReg,
    NoAlias,
    NonNull,
    SignExt,
    ZeroExt,
    Dereferenceable(u64),
    DereferenceableOrNull(u64),
}

impl fmt::Display for ReturnAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnAttr::InReg => f.write_str("inreg"),
            ReturnAttr::NoAlias => f.write_str("noalias"),
            ReturnAttr::NonNull => f.write_str("nonnull"),
            ReturnAttr::SignExt => f.write_str("signext"),
            ReturnAttr::ZeroExt => f.write_str("zeroext"),
            ReturnAttr::Dereferenceable(n) => write!(f, "dereferenceable({n})"),
            ReturnAttr::DereferenceableOrNull(n) => write!(f, "dereferenceable_or_null({n})"),
        }
    }
}

impl FromStr for ReturnAttr {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, IrError> {
        let attr = match s {
            "inreg" => ReturnAttr::InReg,
            "noalias" => ReturnAttr::NoAlias,
            "nonnull" => ReturnAttr::NonNull,
            "signext" => ReturnAttr::SignExt,
            "zeroext" => ReturnAttr::ZeroExt,
            _ => {
                return Err(IrError::UnknownKeyword {
                    family: "return attribute",
                    keyword: s.to_string(),
                })
            }
        };
        Ok(attr)
    }
}

/// Module-level attribute group definition, e.g.
/// `attributes #0 = { noinline nounwind }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrGroupDef {
    pub id: u64,
    pub attrs: Vec<FuncAttr>,
}

impl AttrGroupDef {
    pub fn new(id: u64, attrs: Vec<FuncAttr>) -> Self {
        AttrGroupDef { id, attrs }
    }
}

impl fmt::Display for AttrGroupDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attributes #{} = {{", self.id)?;
        for attr in &self.attrs {
            write!(f, " {attr}")?;
        }
        f.write_str(" }")
    }
}

/// Quote a section or garbage-collector name.
pub(crate) fn quoted(s: &str) -> String {
    // Section names reuse the identifier escape rules, always quoted.
    let q = quote(s);
    if q.starts_with('"') {
        q
    } else {
        format!("\"{q}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_func_attr_display() {
        assert_eq!(FuncAttr::NoUnwind.to_string(), "nounwind");
        assert_eq!(FuncAttr::AlignStack(16).to_string(), "alignstack(16)");
        assert_eq!(FuncAttr::Group(3).to_string(), "#3");
        assert_eq!(
            FuncAttr::StringAttr {
                key: "frame-pointer".to_string(),
                value: Some("all".to_string()),
            }
            .to_string(),
            "\"frame-pointer\"=\"all\""
        );
    }

    #[test]
    fn test_func_attr_from_str() {
        assert_eq!(
            "speculative_load_hardening".parse::<FuncAttr>().unwrap(),
            FuncAttr::SpeculativeLoadHardening
        );
        assert!("not-an-attr".parse::<FuncAttr>().is_err());
    }

    #[test]
    fn test_param_attr_display() {
        assert_eq!(ParamAttr::NoCapture.to_string(), "nocapture");
        assert_eq!(ParamAttr::Align(8).to_string(), "align 8");
        assert_eq!(
            ParamAttr::DereferenceableOrNull(4).to_string(),
            "dereferenceable_or_null(4)"
        );
    }

    #[test]
    fn test_attr_group_def() {
        let def = AttrGroupDef::new(0, vec![FuncAttr::NoInline, FuncAttr::NoUnwind]);
        assert_eq!(def.to_string(), "attributes #0 = { noinline nounwind }");
    }
}
