use crate::span::Span;
use crate::ts::errors::TreeSitterError;
use crate::ts::parser::{python_language, ParsedSource};
use std::collections::HashMap;
use tree_sitter::{Query, QueryCursor, StreamingIterator};

/// A match from a tree-sitter query with captured nodes.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    /// The full match byte range
    pub span: Span,
    /// Named captures: capture_name -> node
    pub captures: HashMap<String, CapturedNode>,
}

impl QueryMatch {
    pub fn capture(&self, name: &str) -> Result<&CapturedNode, TreeSitterError> {
        self.captures
            .get(name)
            .ok_or_else(|| TreeSitterError::CaptureNotFound {
                name: name.to_string(),
            })
    }
}

#[derive(Debug, Clone)]
pub struct CapturedNode {
    pub span: Span,
    pub text: String,
    pub kind: String,
}

/// Engine for executing tree-sitter queries against parsed Python source.
pub struct QueryEngine {
    query: Query,
    capture_names: Vec<String>,
}

impl QueryEngine {
    /// Compile a tree-sitter query against the Python grammar.
    ///
    /// # Query Syntax
    ///
    /// Tree-sitter queries use S-expression syntax:
    /// ```text
    /// (function_definition
    ///   name: (identifier) @name
    ///   body: (block) @body)
    /// ```
    ///
    /// Captures are prefixed with `@` and can be referenced by name.
    pub fn new(query_str: &str) -> Result<Self, TreeSitterError> {
        let query = Query::new(&python_language(), query_str).map_err(|e| {
            TreeSitterError::InvalidQuery {
                message: e.to_string(),
            }
        })?;

        let capture_names = query.capture_names().iter().map(|s| s.to_string()).collect();

        Ok(Self {
            query,
            capture_names,
        })
    }

    /// Execute the query against parsed source and return all matches,
    /// ordered by `(start, end)` of the whole match.
    pub fn find_all(&self, parsed: &ParsedSource<'_>) -> Vec<QueryMatch> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.query, parsed.root_node(), parsed.source.as_bytes());

        let mut results = Vec::new();

        // tree-sitter 0.25+ uses StreamingIterator
        while let Some(m) = matches.next() {
            let mut captures = HashMap::new();
            let mut overall_start = usize::MAX;
            let mut overall_end = 0usize;

            for capture in m.captures {
                let node = capture.node;
                let name = &self.capture_names[capture.index as usize];

                overall_start = overall_start.min(node.start_byte());
                overall_end = overall_end.max(node.end_byte());

                captures.insert(
                    name.clone(),
                    CapturedNode {
                        span: Span::from_node(node),
                        text: parsed.node_text(node).to_string(),
                        kind: node.kind().to_string(),
                    },
                );
            }

            if overall_start != usize::MAX {
                results.push(QueryMatch {
                    span: Span {
                        start: overall_start,
                        end: overall_end,
                    },
                    captures,
                });
            }
        }

        // Match order follows node completion, not source position
        results.sort_by_key(|m| m.span);
        results
    }

    /// Get capture names defined in the query.
    pub fn capture_names(&self) -> &[String] {
        &self.capture_names
    }
}

/// Queries used to classify a Python function.
pub mod queries {
    /// Every function definition, nested ones included.
    pub const FUNCTIONS: &str = r#"(function_definition) @function"#;

    /// Function definitions with their name identifier.
    pub const FUNCTION_NAMES: &str = r#"(function_definition
        name: (identifier) @name
    ) @function"#;

    /// Function definitions with their body block.
    pub const FUNCTION_BODIES: &str = r#"(function_definition
        body: (block) @body
    ) @function"#;

    /// Comments and strings standing alone as statements (docstrings).
    pub const COMMENTS_AND_DOCSTRINGS: &str = r#"[
        (comment) @comment
        (expression_statement (string) @docstring)
    ]"#;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::parser::PythonParser;

    #[test]
    fn find_function_names_in_source_order() {
        let mut parser = PythonParser::new().unwrap();
        let source = r#"
def outer():
    def inner():
        pass
    return inner

def other():
    pass
"#;
        let parsed = parser.parse_with_source(source).unwrap();
        let engine = QueryEngine::new(queries::FUNCTION_NAMES).unwrap();

        let names: Vec<_> = engine
            .find_all(&parsed)
            .iter()
            .map(|m| m.capture("name").unwrap().text.clone())
            .collect();
        assert_eq!(names, vec!["outer", "inner", "other"]);
    }

    #[test]
    fn find_body_block() {
        let mut parser = PythonParser::new().unwrap();
        let source = "def f(x):\n    return x\n";
        let parsed = parser.parse_with_source(source).unwrap();
        let engine = QueryEngine::new(queries::FUNCTION_BODIES).unwrap();

        let matches = engine.find_all(&parsed);
        assert_eq!(matches.len(), 1);
        let body = matches[0].capture("body").unwrap();
        assert_eq!(body.kind, "block");
        assert_eq!(body.text, "return x");
    }

    #[test]
    fn comments_and_docstrings_only_match_statement_strings() {
        let mut parser = PythonParser::new().unwrap();
        let source = r#"def f():
    """Doc."""
    # note
    x = "not a docstring"
    return x
"#;
        let parsed = parser.parse_with_source(source).unwrap();
        let engine = QueryEngine::new(queries::COMMENTS_AND_DOCSTRINGS).unwrap();

        let texts: Vec<_> = engine
            .find_all(&parsed)
            .into_iter()
            .flat_map(|m| m.captures.into_values().map(|c| c.text))
            .collect();
        assert_eq!(texts, vec![r#""""Doc.""""#, "# note"]);
    }

    #[test]
    fn missing_capture_is_reported() {
        let mut parser = PythonParser::new().unwrap();
        let parsed = parser.parse_with_source("def f(): pass\n").unwrap();
        let engine = QueryEngine::new(queries::FUNCTIONS).unwrap();

        let m = &engine.find_all(&parsed)[0];
        assert!(matches!(
            m.capture("name"),
            Err(TreeSitterError::CaptureNotFound { .. })
        ));
    }

    #[test]
    fn invalid_query_is_rejected() {
        let result = QueryEngine::new("(function_definition @oops");
        assert!(matches!(result, Err(TreeSitterError::InvalidQuery { .. })));
    }

    #[test]
    fn capture_names_are_exposed() {
        let engine = QueryEngine::new(queries::COMMENTS_AND_DOCSTRINGS).unwrap();
        assert_eq!(engine.capture_names(), &["comment", "docstring"]);
    }
}
