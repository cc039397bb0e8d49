//! Tree-sitter integration for locating the parts of a Python function.
//!
//! This module wraps the Python grammar, runs capture queries or a cursor
//! walk over the concrete syntax tree, and classifies nodes into the byte
//! spans the view builder edits.

pub mod errors;
pub mod locator;
pub mod parser;
pub mod query;
pub mod validator;

pub use errors::TreeSitterError;
pub use locator::{ClassifiedSpans, LocatorStrategy, SyntaxLocator};
pub use parser::{ParsedSource, PythonParser};
pub use query::{QueryEngine, QueryMatch};
pub use validator::ensure_valid;
