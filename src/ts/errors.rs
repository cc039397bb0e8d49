use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeSitterError {
    #[error("failed to set Python language for parser")]
    LanguageSet,

    #[error("failed to parse source code")]
    ParseFailed,

    #[error("invalid tree-sitter query: {message}")]
    InvalidQuery { message: String },

    #[error("syntax error detected at byte {byte_start}..{byte_end}")]
    SyntaxError { byte_start: usize, byte_end: usize },

    #[error("multiple syntax errors detected: {count} ERROR nodes")]
    MultipleSyntaxErrors { count: usize },

    #[error("no function name found: source has no named function definition")]
    MissingName,

    #[error("function definition at byte {byte_start} has no body block")]
    MissingBody { byte_start: usize },

    #[error("capture '{name}' not found in query matches")]
    CaptureNotFound { name: String },
}

impl TreeSitterError {
    /// True for failures caused by the input text itself.
    ///
    /// Setup failures (language, query compilation) are not tied to any one
    /// record and stop the whole run.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            TreeSitterError::ParseFailed
                | TreeSitterError::SyntaxError { .. }
                | TreeSitterError::MultipleSyntaxErrors { .. }
                | TreeSitterError::MissingName
                | TreeSitterError::MissingBody { .. }
                | TreeSitterError::CaptureNotFound { .. }
        )
    }
}
