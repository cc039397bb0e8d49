//! Pure text editing over byte spans.
//!
//! Every operation takes the original text by reference and returns a new
//! `String`, so one source buffer can feed several view constructions.
//! Deletions are always applied bottom-to-top: splicing out a high-offset
//! range never moves the bytes of a lower-offset range still to be removed.

use crate::span::{Span, SpanError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("span {span} out of bounds for text of length {text_len}")]
    SpanOutOfBounds { span: Span, text_len: usize },

    #[error("span {span} does not fall on UTF-8 character boundaries")]
    NotCharBoundary { span: Span },

    #[error("spans {first} and {second} overlap")]
    OverlappingSpans { first: Span, second: Span },

    #[error(transparent)]
    InvalidSpan(#[from] SpanError),
}

/// Ordered set of pairwise-disjoint spans scheduled for deletion.
///
/// Spans are kept sorted ascending by `(start, end)`. Empty spans are dropped
/// since deleting them is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "EditPlan does nothing until passed to delete_spans()"]
pub struct EditPlan {
    spans: Vec<Span>,
}

impl EditPlan {
    /// Build a plan from raw spans, rejecting any overlap.
    pub fn new(spans: impl IntoIterator<Item = Span>) -> Result<Self, EditError> {
        let mut spans: Vec<Span> = spans.into_iter().filter(|s| !s.is_empty()).collect();
        spans.sort();

        // Sorted by start, so checking neighbours is enough
        for window in spans.windows(2) {
            if window[0].overlaps(&window[1]) {
                return Err(EditError::OverlappingSpans {
                    first: window[0],
                    second: window[1],
                });
            }
        }

        Ok(Self { spans })
    }

    /// Build a plan that removes whole lines where possible.
    ///
    /// A span that is the only non-blank content of its line(s) grows to cover
    /// the line's indentation and its trailing newline. A span that ends a line
    /// after other code (a trailing comment) grows backwards over the
    /// horizontal whitespace separating it from that code. Anything else is
    /// deleted exactly as given.
    pub fn line_aware(text: &str, spans: impl IntoIterator<Item = Span>) -> Result<Self, EditError> {
        let bytes = text.as_bytes();
        let widened = spans
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(|span| {
                check_span(text, span)?;
                Ok(widen_to_line(bytes, span))
            })
            .collect::<Result<Vec<_>, EditError>>()?;

        Self::new(widened)
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Total number of bytes the plan removes.
    pub fn bytes_removed(&self) -> usize {
        self.spans.iter().map(Span::len).sum()
    }
}

fn widen_to_line(bytes: &[u8], span: Span) -> Span {
    let mut line_start = span.start;
    while line_start > 0 && matches!(bytes[line_start - 1], b' ' | b'\t') {
        line_start -= 1;
    }
    let starts_line = line_start == 0 || bytes[line_start - 1] == b'\n';

    let mut after = span.end;
    while after < bytes.len() && matches!(bytes[after], b' ' | b'\t' | b'\r') {
        after += 1;
    }
    let ends_line = after == bytes.len() || bytes[after] == b'\n';

    match (starts_line, ends_line) {
        (true, true) => Span {
            start: line_start,
            end: (after + 1).min(bytes.len()),
        },
        (false, true) => Span {
            start: line_start,
            end: span.end,
        },
        _ => span,
    }
}

/// Check that `span` is a valid, character-aligned range into `text`.
pub fn check_span(text: &str, span: Span) -> Result<(), EditError> {
    if span.start > span.end {
        return Err(SpanError::InvalidSpan {
            start: span.start,
            end: span.end,
        }
        .into());
    }
    if !span.fits(text.len()) {
        return Err(EditError::SpanOutOfBounds {
            span,
            text_len: text.len(),
        });
    }
    if !text.is_char_boundary(span.start) || !text.is_char_boundary(span.end) {
        return Err(EditError::NotCharBoundary { span });
    }
    Ok(())
}

/// Return `text[span]` verbatim.
pub fn extract(text: &str, span: Span) -> Result<&str, EditError> {
    check_span(text, span)?;
    Ok(&text[span.range()])
}

/// Replace a single span with `replacement`.
pub fn replace_span(text: &str, span: Span, replacement: &str) -> Result<String, EditError> {
    check_span(text, span)?;

    let mut out = String::with_capacity(text.len() - span.len() + replacement.len());
    out.push_str(&text[..span.start]);
    out.push_str(replacement);
    out.push_str(&text[span.end..]);
    Ok(out)
}

/// Remove every span of `plan` from `text`.
///
/// Spans are spliced out in descending start order. When anything was
/// removed, leading `\n` characters are trimmed from the result so a deleted
/// leading comment or docstring does not leave blank lines at the top.
/// Trimming only touches the prefix, so doing it once after the last splice
/// gives the same text as trimming after every splice.
pub fn delete_spans(text: &str, plan: &EditPlan) -> Result<String, EditError> {
    if plan.is_empty() {
        return Ok(text.to_owned());
    }

    // Validate all spans before touching anything
    for span in plan.spans() {
        check_span(text, *span)?;
    }

    let mut out = text.to_owned();
    for span in plan.spans().iter().rev() {
        out.replace_range(span.range(), "");
    }

    Ok(out.trim_start_matches('\n').to_owned())
}
