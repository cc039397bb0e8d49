//! JSONL record pipeline: one function per input line, one enriched record
//! per output line.
//!
//! Records are independent, so batches are fanned out over a rayon pool with
//! one pooled [`ViewBuilder`] per worker thread. Results are collected in
//! input order and written by a single writer.

use crate::config::schema::{DEFAULT_BATCH_SIZE, DEFAULT_SOURCE_FIELD};
use crate::pool::with_view_builder;
use crate::ts::TreeSitterError;
use crate::views::{ViewBuilder, ViewError, ViewOptions};
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to serialize record on line {line}: {source}")]
    Serialize {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("aborting on line {line}: {source}")]
    Fatal {
        line: usize,
        #[source]
        source: ViewError,
    },

    #[error("failed to set up parser: {0}")]
    Setup(#[from] TreeSitterError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Field holding the function source
    pub source_field: String,
    /// Worker threads; 0 means one per core, 1 means sequential
    pub jobs: usize,
    /// Records read before a batch is processed
    pub batch_size: usize,
    pub view: ViewOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            source_field: DEFAULT_SOURCE_FIELD.to_string(),
            jobs: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            view: ViewOptions::default(),
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub read: usize,
    pub written: usize,
    pub skipped_malformed: usize,
    pub skipped_missing_source: usize,
    pub skipped_extraction: usize,
}

impl RunSummary {
    pub fn skipped(&self) -> usize {
        self.skipped_malformed + self.skipped_missing_source + self.skipped_extraction
    }

    fn record_skip(&mut self, reason: &SkipReason) {
        match reason {
            SkipReason::Malformed(_) | SkipReason::NotAnObject => self.skipped_malformed += 1,
            SkipReason::MissingSource { .. } => self.skipped_missing_source += 1,
            SkipReason::Extraction(_) => self.skipped_extraction += 1,
        }
    }
}

/// Why a single record was dropped.
#[derive(Debug)]
pub enum SkipReason {
    Malformed(serde_json::Error),
    NotAnObject,
    MissingSource { field: String },
    Extraction(ViewError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Malformed(e) => write!(f, "malformed JSON: {e}"),
            SkipReason::NotAnObject => write!(f, "record is not a JSON object"),
            SkipReason::MissingSource { field } => {
                write!(f, "missing or non-string source field '{field}'")
            }
            SkipReason::Extraction(e) => write!(f, "{e}"),
        }
    }
}

/// Result of processing one input line.
#[derive(Debug)]
pub enum Outcome {
    /// Serialized output record, without trailing newline
    Record(String),
    Skipped(SkipReason),
}

/// Enrich one JSON record with its function views.
///
/// `line` is the raw line without its terminator; invalid UTF-8 is reported
/// as a malformed record. Per-record problems become [`Outcome::Skipped`];
/// only invariant and setup failures are returned as errors.
pub fn process_line(
    builder: &mut ViewBuilder,
    line_no: usize,
    line: &[u8],
    source_field: &str,
) -> Result<Outcome, PipelineError> {
    let mut record: Map<String, Value> = match serde_json::from_slice::<Value>(line) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Ok(Outcome::Skipped(SkipReason::NotAnObject)),
        Err(e) => return Ok(Outcome::Skipped(SkipReason::Malformed(e))),
    };

    let Some(source) = record.get(source_field).and_then(Value::as_str) else {
        return Ok(Outcome::Skipped(SkipReason::MissingSource {
            field: source_field.to_string(),
        }));
    };

    let views = match builder.build(source) {
        Ok(views) => views,
        Err(e) if e.is_record_local() => return Ok(Outcome::Skipped(SkipReason::Extraction(e))),
        Err(source) => {
            return Err(PipelineError::Fatal {
                line: line_no,
                source,
            })
        }
    };

    let serialize = |source| PipelineError::Serialize {
        line: line_no,
        source,
    };
    if let Value::Object(fields) = serde_json::to_value(&views).map_err(serialize)? {
        record.extend(fields);
    }

    let json = serde_json::to_string(&record).map_err(serialize)?;
    Ok(Outcome::Record(json))
}

/// Reads records, derives views and writes enriched records.
pub struct RecordPipeline {
    options: PipelineOptions,
}

impl RecordPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Process every line of `input`, writing one JSON object per line to
    /// `output`. Blank lines are ignored. Lines are read as bytes, so a line
    /// that is not UTF-8 is skipped like any other malformed record.
    pub fn run<R: BufRead, W: Write>(
        &self,
        input: R,
        mut output: W,
    ) -> Result<RunSummary, PipelineError> {
        let pool = if self.options.jobs == 1 {
            None
        } else {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.options.jobs)
                    .build()?,
            )
        };
        let mut sequential = if pool.is_none() {
            Some(ViewBuilder::new(self.options.view)?)
        } else {
            None
        };

        let batch_size = self.options.batch_size.max(1);
        let mut summary = RunSummary::default();
        let mut batch: Vec<(usize, Vec<u8>)> = Vec::with_capacity(batch_size);

        for (idx, line) in input.split(b'\n').enumerate() {
            let mut line = line?;
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            batch.push((idx + 1, line));

            if batch.len() >= batch_size {
                let outcomes = self.process_batch(&batch, pool.as_ref(), sequential.as_mut())?;
                write_outcomes(&batch, outcomes, &mut output, &mut summary)?;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            let outcomes = self.process_batch(&batch, pool.as_ref(), sequential.as_mut())?;
            write_outcomes(&batch, outcomes, &mut output, &mut summary)?;
        }

        output.flush()?;

        info!(
            read = summary.read,
            written = summary.written,
            skipped = summary.skipped(),
            "pipeline finished"
        );
        Ok(summary)
    }

    /// Run over files. The output is written to a temporary file next to
    /// `output` and renamed into place only when the run succeeds.
    pub fn run_files(&self, input: &Path, output: &Path) -> Result<RunSummary, PipelineError> {
        let reader = BufReader::new(File::open(input)?);
        self.run_to_file(reader, output)
    }

    /// Run from any reader (stdin included) into `output`, atomically.
    pub fn run_to_file<R: BufRead>(
        &self,
        reader: R,
        output: &Path,
    ) -> Result<RunSummary, PipelineError> {
        let parent = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut temp = tempfile::NamedTempFile::new_in(parent)?;

        let summary = {
            let mut writer = BufWriter::new(&mut temp);
            let summary = self.run(reader, &mut writer)?;
            writer.flush()?;
            summary
        };

        temp.as_file().sync_all()?;
        temp.persist(output).map_err(|e| e.error)?;

        Ok(summary)
    }

    fn process_batch(
        &self,
        batch: &[(usize, Vec<u8>)],
        pool: Option<&rayon::ThreadPool>,
        sequential: Option<&mut ViewBuilder>,
    ) -> Result<Vec<Outcome>, PipelineError> {
        debug!(records = batch.len(), "processing batch");
        let field = self.options.source_field.as_str();

        match (pool, sequential) {
            (Some(pool), _) => {
                let view = self.options.view;
                pool.install(|| {
                    batch
                        .par_iter()
                        .map(|(line_no, line)| -> Result<Outcome, PipelineError> {
                            with_view_builder(view, |builder| {
                                process_line(builder, *line_no, line, field)
                            })?
                        })
                        .collect::<Result<Vec<_>, PipelineError>>()
                })
            }
            (None, Some(builder)) => batch
                .iter()
                .map(|(line_no, line)| process_line(builder, *line_no, line, field))
                .collect(),
            (None, None) => Ok(Vec::new()),
        }
    }
}

fn write_outcomes<W: Write>(
    batch: &[(usize, Vec<u8>)],
    outcomes: Vec<Outcome>,
    output: &mut W,
    summary: &mut RunSummary,
) -> Result<(), PipelineError> {
    for ((line_no, _), outcome) in batch.iter().zip(outcomes) {
        summary.read += 1;
        match outcome {
            Outcome::Record(json) => {
                output.write_all(json.as_bytes())?;
                output.write_all(b"\n")?;
                summary.written += 1;
            }
            Outcome::Skipped(reason) => {
                warn!(line = line_no, reason = %reason, "skipping record");
                summary.record_skip(&reason);
            }
        }
    }
    Ok(())
}
