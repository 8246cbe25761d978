//! Lyra - Common Types and Utilities
//!
//! This crate contains the identifier machinery and error definitions
//! shared between the IR model and its collaborators (the textual parser
//! produces values of these types; the serializer consumes them).

pub mod error;
pub mod ident;

pub use error::IrError;
pub use ident::{GlobalIdent, LocalIdent};
