use crate::ts::errors::TreeSitterError;
use crate::ts::parser::ParsedSource;

/// Fail fast on syntactically invalid input.
///
/// Returns Ok(()) if the tree has no ERROR or MISSING nodes.
pub fn ensure_valid(parsed: &ParsedSource<'_>) -> Result<(), TreeSitterError> {
    if !parsed.has_errors() {
        return Ok(());
    }

    let errors = parsed.error_nodes();
    match errors.len() {
        // has_error() can be set without a collectable node; report the root
        0 => Err(TreeSitterError::SyntaxError {
            byte_start: 0,
            byte_end: parsed.source.len(),
        }),
        1 => Err(TreeSitterError::SyntaxError {
            byte_start: errors[0].byte_start,
            byte_end: errors[0].byte_end,
        }),
        n => Err(TreeSitterError::MultipleSyntaxErrors { count: n }),
    }
}
