//! The four views of a function and the builder that derives them.

use crate::edit::{self, EditError, EditPlan};
use crate::span::Span;
use crate::ts::{ClassifiedSpans, LocatorStrategy, SyntaxLocator, TreeSitterError};
use serde::Serialize;
use thiserror::Error;
use tracing::trace;

/// Sentinel replacing the function name in the masked view.
///
/// Downstream evaluation matches this token exactly.
pub const NAME_MASK: &str = "<NAME_MASK>";

/// Owned textual views of one function. Nothing here borrows the source or
/// the syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionViews {
    #[serde(rename = "result_func_name")]
    pub name: String,
    #[serde(rename = "result_body_with_coms")]
    pub body_with_comments: String,
    #[serde(rename = "result_body_no_coms")]
    pub body_without_comments: String,
    #[serde(rename = "result_masked_no_coms")]
    pub masked_without_comments: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// The record's source could not be decomposed. Skip the record.
    #[error("function extraction failed: {0}")]
    Extraction(#[source] TreeSitterError),

    /// A span did not fit the text it was applied to. Stop the run.
    #[error("span invariant violated: {0}")]
    Invariant(#[from] EditError),

    /// The parser or queries could not be set up. Stop the run.
    #[error("locator setup failed: {0}")]
    Setup(#[source] TreeSitterError),
}

impl ViewError {
    /// True when only the current record is affected.
    pub fn is_record_local(&self) -> bool {
        matches!(self, ViewError::Extraction(_))
    }
}

impl From<TreeSitterError> for ViewError {
    fn from(error: TreeSitterError) -> Self {
        if error.is_input_error() {
            ViewError::Extraction(error)
        } else {
            ViewError::Setup(error)
        }
    }
}

/// Knobs for view construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub strategy: LocatorStrategy,
    /// Remove whole lines left blank by comment and docstring removal
    pub strip_comment_lines: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            strategy: LocatorStrategy::default(),
            strip_comment_lines: true,
        }
    }
}

/// Derives [`FunctionViews`] from Python function source.
pub struct ViewBuilder {
    locator: SyntaxLocator,
    options: ViewOptions,
}

impl ViewBuilder {
    pub fn new(options: ViewOptions) -> Result<Self, TreeSitterError> {
        Ok(Self {
            locator: SyntaxLocator::new(options.strategy)?,
            options,
        })
    }

    pub fn options(&self) -> ViewOptions {
        self.options
    }

    /// Build all four views.
    ///
    /// Comments are stripped first and the stripped text is parsed again:
    /// stripping shifts every byte offset, so spans from the first parse are
    /// never applied to the stripped text.
    pub fn build(&mut self, source: &str) -> Result<FunctionViews, ViewError> {
        let spans = self.locator.classify(source)?;
        let stripped = self.strip_comments(source, &spans)?;

        let name = name_view(source, &spans)?;
        let body_with_comments = body_view(source, &spans)?;

        let stripped_spans = self.locator.classify(&stripped)?;
        let body_without_comments = body_view(&stripped, &stripped_spans)?;
        let masked_without_comments = masked_view(&stripped, &stripped_spans)?;

        trace!(
            name = %name,
            comments = spans.comments.len(),
            stripped_bytes = source.len() - stripped.len(),
            "built function views"
        );

        Ok(FunctionViews {
            name,
            body_with_comments,
            body_without_comments,
            masked_without_comments,
        })
    }

    /// The source with every comment and docstring removed.
    pub fn strip(&mut self, source: &str) -> Result<String, ViewError> {
        let spans = self.locator.classify(source)?;
        self.strip_comments(source, &spans)
    }

    fn strip_comments(&self, source: &str, spans: &ClassifiedSpans) -> Result<String, ViewError> {
        let comments = spans.comments.iter().copied();
        let plan = if self.options.strip_comment_lines {
            EditPlan::line_aware(source, comments)?
        } else {
            EditPlan::new(comments)?
        };
        Ok(edit::delete_spans(source, &plan)?)
    }
}

/// The function's identifier.
pub fn name_view(source: &str, spans: &ClassifiedSpans) -> Result<String, EditError> {
    edit::extract(source, spans.name).map(str::to_owned)
}

/// The body block, verbatim.
pub fn body_view(source: &str, spans: &ClassifiedSpans) -> Result<String, EditError> {
    edit::extract(source, spans.body).map(str::to_owned)
}

/// The definition with its name masked and its leading keywords dropped.
///
/// Runs from the masked name to the end of the definition, so `def` and
/// `async def` disappear while parameters, annotations and body stay.
pub fn masked_view(source: &str, spans: &ClassifiedSpans) -> Result<String, EditError> {
    let masked = edit::replace_span(source, spans.name, NAME_MASK)?;

    // The definition contains the name, so its end moves by the length change
    let definition = spans.definition.shift_end(spans.name.len(), NAME_MASK.len());
    let view = Span::new(spans.name.start, definition.end)?;
    edit::extract(&masked, view).map(str::to_owned)
}
