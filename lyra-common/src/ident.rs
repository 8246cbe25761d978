//! IR identifiers
//!
//! Local (`%name`, `%42`) and global (`@name`, `@42`) identifiers, plus the
//! quoting rules of the assembly syntax. An identifier is either named at
//! construction or left unnamed; unnamed identifiers receive a dense numeric
//! id lazily, at serialization time. Definition and use sites share one
//! identifier (behind `Rc`), so the assignment is visible everywhere at once.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;

/// Identifier of a local value: a function parameter, an instruction result,
/// or a basic-block label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalIdent {
    name: Option<String>,
    num: Cell<Option<u64>>,
}

impl LocalIdent {
    /// Create a named local identifier.
    pub fn named(name: impl Into<String>) -> Self {
        LocalIdent {
            name: Some(name.into()),
            num: Cell::new(None),
        }
    }

    /// Create an unnamed local identifier. It renders only after a numeric
    /// id has been assigned.
    pub fn unnamed() -> Self {
        LocalIdent {
            name: None,
            num: Cell::new(None),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }

    /// Whether a numeric id has been assigned.
    pub fn is_assigned(&self) -> bool {
        self.num.get().is_some()
    }

    /// Assign the numeric id of an unnamed identifier. Assignment is
    /// recomputed on every serialization, so setting it repeatedly is fine.
    pub fn set_num(&self, num: u64) {
        debug_assert!(self.name.is_none(), "numbering a named identifier");
        self.num.set(Some(num));
    }
}

impl fmt::Display for LocalIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, self.num.get()) {
            (Some(name), _) => write!(f, "%{}", quote(name)),
            (None, Some(num)) => write!(f, "%{num}"),
            (None, None) => panic!("use of unnamed local identifier before id assignment"),
        }
    }
}

/// Identifier of a global value: a global variable, function, alias or
/// ifunc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalIdent {
    name: Option<String>,
    num: Cell<Option<u64>>,
}

impl GlobalIdent {
    /// Create a named global identifier.
    pub fn named(name: impl Into<String>) -> Self {
        GlobalIdent {
            name: Some(name.into()),
            num: Cell::new(None),
        }
    }

    /// Create an unnamed global identifier.
    pub fn unnamed() -> Self {
        GlobalIdent {
            name: None,
            num: Cell::new(None),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }

    /// Whether a numeric id has been assigned.
    pub fn is_assigned(&self) -> bool {
        self.num.get().is_some()
    }

    pub fn set_num(&self, num: u64) {
        debug_assert!(self.name.is_none(), "numbering a named identifier");
        self.num.set(Some(num));
    }
}

impl fmt::Display for GlobalIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, self.num.get()) {
            (Some(name), _) => write!(f, "@{}", quote(name)),
            (None, Some(num)) => write!(f, "@{num}"),
            (None, None) => panic!("use of unnamed global identifier before id assignment"),
        }
    }
}

/// Quote an IR name if it contains characters outside the bare-identifier
/// alphabet. Quoted names escape non-printable characters, `"` and `\` as
/// `\hh` hex pairs.
pub fn quote(name: &str) -> String {
    if is_bare(name) {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for &b in name.as_bytes() {
        if (b' '..=b'~').contains(&b) && b != b'"' && b != b'\\' {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\{b:02X}"));
        }
    }
    out.push('"');
    out
}

/// Report whether a name is printable without quotes: it must match
/// `[-a-zA-Z$._][-a-zA-Z$._0-9]*`.
fn is_bare(name: &str) -> bool {
    let mut chars = name.chars();
    let head = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    let head_ok = head.is_ascii_alphabetic() || matches!(head, '-' | '$' | '.' | '_');
    head_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '$' | '.' | '_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_local() {
        let id = LocalIdent::named("tmp");
        assert_eq!(id.to_string(), "%tmp");
    }

    #[test]
    fn test_unnamed_local_after_assignment() {
        let id = LocalIdent::unnamed();
        id.set_num(7);
        assert_eq!(id.to_string(), "%7");
    }

    #[test]
    #[should_panic(expected = "before id assignment")]
    fn test_unnamed_local_before_assignment() {
        let _ = LocalIdent::unnamed().to_string();
    }

    #[test]
    fn test_quoted_names() {
        assert_eq!(quote("simple.name$-_"), "simple.name$-_");
        assert_eq!(quote("has space"), "\"has space\"");
        assert_eq!(quote("0leading"), "\"0leading\"");
        assert_eq!(quote("tab\there"), "\"tab\\09here\"");
        assert_eq!(GlobalIdent::named("a b").to_string(), "@\"a b\"");
    }
}
