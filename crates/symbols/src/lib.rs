//! Static symbol resolution for watched variables: read an ELF symbol table,
//! collect the names a trigger expression (or variable list) refers to, and
//! resolve every one of them to its link-time address.

mod error;
mod resolve;
mod source;
mod table;
mod trigger;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{Error, ParseError};
pub use resolve::{Resolution, resolve};
pub use source::{SymbolSource, parse_var_list};
pub use table::{ImageKind, Symbol, SymbolKind, SymbolTable};
pub use trigger::{RESERVED_KEYWORDS, TriggerExpression, extract_required_symbols};
