//! Metadata
//!
//! Attachments on modules, functions, globals and instructions, and the
//! module-level metadata definitions they reference. Metadata is purely
//! decorative for the correctness of the model but round-trips
//! byte-exactly.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constant::Constant;

/// Reference to a numbered metadata definition, `!42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MdRef(pub u64);

impl fmt::Display for MdRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!{}", self.0)
    }
}

/// A metadata attachment, `!dbg !42`. Attachments are ordered and always
/// serialized last on their carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MdAttachment {
    /// Attachment name, without the leading `!`.
    pub name: String,
    pub node: MdRef,
}

impl MdAttachment {
    pub fn new(name: impl Into<String>, node: MdRef) -> Self {
        MdAttachment {
            name: name.into(),
            node,
        }
    }
}

impl fmt::Display for MdAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!{} {}", self.name, self.node)
    }
}

/// A field of a metadata tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MdField {
    Null,
    Ref(MdRef),
    Str(String),
    Const(Constant),
}

impl fmt::Display for MdField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MdField::Null => f.write_str("null"),
            MdField::Ref(node) => node.fmt(f),
            MdField::Str(s) => {
                f.write_str("!\"")?;
                for &b in s.as_bytes() {
                    if (b' '..=b'~').contains(&b) && b != b'"' && b != b'\\' {
                        write!(f, "{}", b as char)?;
                    } else {
                        write!(f, "\\{b:02X}")?;
                    }
                }
                f.write_str("\"")
            }
            MdField::Const(c) => f.write_str(&c.typed()),
        }
    }
}

/// A metadata node: a generic tuple, or a specialized record rendered as
/// `!DIThing(key: value, ...)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MdNode {
    Tuple(Vec<MdField>),
    Specialized {
        name: String,
        /// Key-value pairs, values kept in their rendered form.
        fields: Vec<(String, String)>,
    },
}

impl fmt::Display for MdNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MdNode::Tuple(fields) => {
                f.write_str("!{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str("}")
            }
            MdNode::Specialized { name, fields } => {
                write!(f, "!{name}(")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A module-level metadata definition, `!0 = !{...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MdDef {
    pub id: u64,
    pub distinct: bool,
    pub node: MdNode,
}

impl MdDef {
    pub fn new(id: u64, node: MdNode) -> Self {
        MdDef {
            id,
            distinct: false,
            node,
        }
    }

    pub fn distinct(id: u64, node: MdNode) -> Self {
        MdDef {
            id,
            distinct: true,
            node,
        }
    }

    /// Reference to this definition.
    pub fn md_ref(&self) -> MdRef {
        MdRef(self.id)
    }
}

impl fmt::Display for MdDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!{} = ", self.id)?;
        if self.distinct {
            f.write_str("distinct ")?;
        }
        self.node.fmt(f)
    }
}

/// A named metadata collection, `!llvm.ident = !{!0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedMd {
    pub name: String,
    pub nodes: Vec<MdRef>,
}

impl NamedMd {
    pub fn new(name: impl Into<String>, nodes: Vec<MdRef>) -> Self {
        NamedMd {
            name: name.into(),
            nodes,
        }
    }
}

impl fmt::Display for NamedMd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!{} = !{{", self.name)?;
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{node}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_display() {
        let md = MdAttachment::new("dbg", MdRef(42));
        assert_eq!(md.to_string(), "!dbg !42");
    }

    #[test]
    fn test_tuple_display() {
        let def = MdDef::new(
            0,
            MdNode::Tuple(vec![
                MdField::Const(Constant::i32(7)),
                MdField::Str("clang".to_string()),
                MdField::Null,
                MdField::Ref(MdRef(1)),
            ]),
        );
        assert_eq!(def.to_string(), "!0 = !{i32 7, !\"clang\", null, !1}");
    }

    #[test]
    fn test_distinct_and_specialized() {
        let def = MdDef::distinct(
            3,
            MdNode::Specialized {
                name: "DIFile".to_string(),
                fields: vec![
                    ("filename".to_string(), "\"a.c\"".to_string()),
                    ("directory".to_string(), "\"/tmp\"".to_string()),
                ],
            },
        );
        assert_eq!(
            def.to_string(),
            "!3 = distinct !DIFile(filename: \"a.c\", directory: \"/tmp\")"
        );
    }

    #[test]
    fn test_named_md_display() {
        let named = NamedMd::new("llvm.module.flags", vec![MdRef(0), MdRef(1)]);
        assert_eq!(named.to_string(), "!llvm.module.flags = !{!0, !1}");
    }
}
