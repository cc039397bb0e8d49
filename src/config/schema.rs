use crate::pipeline::PipelineOptions;
use crate::ts::LocatorStrategy;
use crate::views::ViewOptions;
use serde::Deserialize;
use std::fmt;

/// Record field holding the function source in CodeSearchNet exports.
pub const DEFAULT_SOURCE_FIELD: &str = "whole_func_string";

pub const DEFAULT_BATCH_SIZE: usize = 512;

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub input: InputSection,
    #[serde(default)]
    pub extraction: ExtractionSection,
    #[serde(default)]
    pub run: RunSection,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct InputSection {
    #[serde(default = "default_source_field")]
    pub source_field: String,
}

impl Default for InputSection {
    fn default() -> Self {
        Self {
            source_field: default_source_field(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExtractionSection {
    #[serde(default)]
    pub strategy: LocatorStrategy,
    #[serde(default = "default_true")]
    pub strip_comment_lines: bool,
}

impl Default for ExtractionSection {
    fn default() -> Self {
        Self {
            strategy: LocatorStrategy::default(),
            strip_comment_lines: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Worker threads; 0 means one per core, 1 means sequential
    #[serde(default)]
    pub jobs: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            jobs: 0,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

fn default_source_field() -> String {
    DEFAULT_SOURCE_FIELD.to_string()
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.input.source_field.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "input.source_field",
            });
        }
        if self.run.batch_size == 0 {
            issues.push(ValidationIssue::OutOfRange {
                field: "run.batch_size",
                message: "must be at least 1".to_string(),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            strategy: self.extraction.strategy,
            strip_comment_lines: self.extraction.strip_comment_lines,
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            source_field: self.input.source_field.clone(),
            jobs: self.run.jobs,
            batch_size: self.run.batch_size,
            view: self.view_options(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    MissingField {
        field: &'static str,
    },
    OutOfRange {
        field: &'static str,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field } => {
                write!(f, "config missing required field '{field}'")
            }
            ValidationIssue::OutOfRange { field, message } => {
                write!(f, "config field '{field}' out of range: {message}")
            }
        }
    }
}
