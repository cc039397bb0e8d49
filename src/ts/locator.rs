use crate::span::Span;
use crate::ts::errors::TreeSitterError;
use crate::ts::parser::{ParsedSource, PythonParser};
use crate::ts::query::{queries, QueryEngine};
use crate::ts::validator::ensure_valid;
use serde::Deserialize;
use std::fmt;
use tree_sitter::Node;

/// How the locator finds the function's parts in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocatorStrategy {
    /// Explicit pre-order cursor walk
    #[default]
    Walk,
    /// Tree-sitter capture queries
    Query,
}

impl LocatorStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "walk" => Some(LocatorStrategy::Walk),
            "query" => Some(LocatorStrategy::Query),
            _ => None,
        }
    }
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocatorStrategy::Walk => write!(f, "walk"),
            LocatorStrategy::Query => write!(f, "query"),
        }
    }
}

/// Byte spans of one function's semantic parts.
///
/// All spans point into the text that was classified and are invalid against
/// any other buffer, including an edited copy of that text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedSpans {
    /// The whole `function_definition` node
    pub definition: Span,
    /// The function's identifier
    pub name: Span,
    /// The body block
    pub body: Span,
    /// From the start of the definition to the start of the body.
    /// Covers keywords, name, parameters, annotations and the colon,
    /// plus whatever whitespace separates them from the body.
    pub header: Span,
    /// Comments and statement strings anywhere in the tree, in source order
    pub comments: Vec<Span>,
}

impl ClassifiedSpans {
    fn from_parts(
        definition: Span,
        name: Option<Span>,
        body: Option<Span>,
        mut comments: Vec<Span>,
    ) -> Result<Self, TreeSitterError> {
        let name = name.ok_or(TreeSitterError::MissingName)?;
        let body = body.ok_or(TreeSitterError::MissingBody {
            byte_start: definition.start,
        })?;
        comments.sort();

        Ok(Self {
            definition,
            name,
            body,
            header: Span {
                start: definition.start,
                end: body.start,
            },
            comments,
        })
    }
}

struct FunctionQueries {
    functions: QueryEngine,
    names: QueryEngine,
    bodies: QueryEngine,
    comments: QueryEngine,
}

impl FunctionQueries {
    fn compile() -> Result<Self, TreeSitterError> {
        Ok(Self {
            functions: QueryEngine::new(queries::FUNCTIONS)?,
            names: QueryEngine::new(queries::FUNCTION_NAMES)?,
            bodies: QueryEngine::new(queries::FUNCTION_BODIES)?,
            comments: QueryEngine::new(queries::COMMENTS_AND_DOCSTRINGS)?,
        })
    }
}

/// Classifies the first function definition of a Python snippet.
///
/// Owns its parser (and compiled queries for [`LocatorStrategy::Query`]), so
/// each worker needs its own instance.
pub struct SyntaxLocator {
    parser: PythonParser,
    strategy: LocatorStrategy,
    queries: Option<FunctionQueries>,
}

impl SyntaxLocator {
    pub fn new(strategy: LocatorStrategy) -> Result<Self, TreeSitterError> {
        let queries = match strategy {
            LocatorStrategy::Walk => None,
            LocatorStrategy::Query => Some(FunctionQueries::compile()?),
        };

        Ok(Self {
            parser: PythonParser::new()?,
            strategy,
            queries,
        })
    }

    pub fn strategy(&self) -> LocatorStrategy {
        self.strategy
    }

    /// Parse `source` and classify its first function definition.
    ///
    /// "First" means first in a pre-order traversal, so an enclosing function
    /// wins over the functions nested in it.
    pub fn classify(&mut self, source: &str) -> Result<ClassifiedSpans, TreeSitterError> {
        let parsed = self.parser.parse_with_source(source)?;
        ensure_valid(&parsed)?;

        match &self.queries {
            Some(queries) => classify_by_query(&parsed, queries),
            None => classify_by_walk(parsed.root_node()),
        }
    }
}

fn is_comment_like(node: Node<'_>) -> bool {
    match node.kind() {
        "comment" => true,
        "string" => node
            .parent()
            .is_some_and(|parent| parent.kind() == "expression_statement"),
        _ => false,
    }
}

fn classify_by_walk(root: Node<'_>) -> Result<ClassifiedSpans, TreeSitterError> {
    let mut function = None;
    let mut comments = Vec::new();
    let mut cursor = root.walk();

    'walk: loop {
        let node = cursor.node();
        if node.kind() == "function_definition" && function.is_none() {
            function = Some(node);
        } else if is_comment_like(node) {
            comments.push(Span::from_node(node));
        }

        if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }

    let function = function.ok_or(TreeSitterError::MissingName)?;

    let mut name = None;
    let mut body = None;
    let mut child_cursor = function.walk();
    for child in function.children(&mut child_cursor) {
        match child.kind() {
            "identifier" if name.is_none() => name = Some(Span::from_node(child)),
            "block" if body.is_none() => body = Some(Span::from_node(child)),
            _ => {}
        }
    }

    ClassifiedSpans::from_parts(Span::from_node(function), name, body, comments)
}

fn classify_by_query(
    parsed: &ParsedSource<'_>,
    queries: &FunctionQueries,
) -> Result<ClassifiedSpans, TreeSitterError> {
    // Matches come back sorted by span, so the first one is the outermost
    // definition that starts earliest
    let definition = queries
        .functions
        .find_all(parsed)
        .first()
        .map(|m| m.capture("function").map(|c| c.span))
        .transpose()?
        .ok_or(TreeSitterError::MissingName)?;

    let part_of = |engine: &QueryEngine, capture: &str| -> Result<Option<Span>, TreeSitterError> {
        for m in engine.find_all(parsed) {
            if m.capture("function")?.span == definition {
                return Ok(Some(m.capture(capture)?.span));
            }
        }
        Ok(None)
    };

    let name = part_of(&queries.names, "name")?;
    let body = part_of(&queries.bodies, "body")?;

    let comments = queries
        .comments
        .find_all(parsed)
        .into_iter()
        .flat_map(|m| m.captures.into_values().map(|c| c.span))
        .collect();

    ClassifiedSpans::from_parts(definition, name, body, comments)
}
