//! func-views: decompose Python functions into training views
//!
//! Given the source of one Python function, derive four textual views:
//! its name, its body with comments, its body without comments, and a
//! comment-free variant with the name replaced by [`NAME_MASK`].
//!
//! # Architecture
//!
//! Everything is expressed as byte-span operations over an immutable source
//! buffer. Intelligence lives in span acquisition (tree-sitter classification
//! in [`ts`]); application is a handful of pure splices in [`edit`].
//!
//! - [`span`]: half-open byte ranges
//! - [`ts`]: parsing and classification of the first function definition
//! - [`edit`]: deletion plans, replacement and extraction
//! - [`views`]: the builder composing the four views
//! - [`pipeline`]: JSONL in, enriched JSONL out
//!
//! # Offsets
//!
//! An edit that changes the length of a buffer invalidates every span
//! computed against it. The builder never rebases spans by hand: after
//! stripping comments it parses the stripped text again.
//!
//! # Example
//!
//! ```no_run
//! use func_views::{ViewBuilder, ViewOptions};
//!
//! let mut builder = ViewBuilder::new(ViewOptions::default()).unwrap();
//! let views = builder
//!     .build("def add(a, b):\n    \"\"\"Adds.\"\"\"\n    return a + b\n")
//!     .unwrap();
//!
//! assert_eq!(views.name, "add");
//! assert_eq!(views.body_without_comments, "return a + b");
//! assert_eq!(views.masked_without_comments, "<NAME_MASK>(a, b):\n    return a + b");
//! ```

pub mod config;
pub mod edit;
pub mod pipeline;
pub mod pool;
pub mod span;
pub mod ts;
pub mod views;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, PipelineConfig};
pub use edit::{delete_spans, extract, replace_span, EditError, EditPlan};
pub use pipeline::{PipelineError, PipelineOptions, RecordPipeline, RunSummary};
pub use span::{Span, SpanError};
pub use ts::{ClassifiedSpans, LocatorStrategy, SyntaxLocator, TreeSitterError};
pub use views::{FunctionViews, ViewBuilder, ViewError, ViewOptions, NAME_MASK};
