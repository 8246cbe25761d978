//! Error handling for the Lyra IR library
//!
//! This module defines the error type shared between the IR model and the
//! textual parser. Only recoverable, caller-facing conditions are errors;
//! invariant violations inside the model (malformed GEP walks, mismatched
//! operand types) are programmer errors and abort immediately.

use std::fmt;
use thiserror::Error;

/// Errors surfaced to callers of the IR library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrError {
    /// Malformed textual IR at the parse boundary. Parsing halts on the
    /// first format error.
    #[error("{file}:{offset}: {message}")]
    Format {
        /// Name of the input file.
        file: String,
        /// Byte offset of the offending token.
        offset: usize,
        message: String,
    },

    /// A textual keyword did not map to any variant of an enum family.
    #[error("unknown {family} keyword `{keyword}`")]
    UnknownKeyword {
        family: &'static str,
        keyword: String,
    },

    /// A named type was referenced but never defined in the module.
    #[error("unresolved named type `%{name}`")]
    UnresolvedType { name: String },
}

impl IrError {
    /// Create a format error for the given file position.
    pub fn format(file: impl Into<String>, offset: usize, message: impl fmt::Display) -> Self {
        IrError::Format {
            file: file.into(),
            offset,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display() {
        let err = IrError::format("main.ll", 42, "expected `=`");
        assert_eq!(err.to_string(), "main.ll:42: expected `=`");
    }

    #[test]
    fn test_unknown_keyword_display() {
        let err = IrError::UnknownKeyword {
            family: "linkage",
            keyword: "interna".to_string(),
        };
        assert_eq!(err.to_string(), "unknown linkage keyword `interna`");
    }
}
