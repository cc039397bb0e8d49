use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use func_views::config::{discover, PipelineConfig};
use func_views::{LocatorStrategy, RecordPipeline, RunSummary, ViewBuilder, ViewOptions};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "func-views")]
#[command(about = "Derive name, body and masked views from Python functions", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich a JSONL file of functions with their views
    Process {
        /// Input JSONL file, or - for stdin
        #[arg(short, long)]
        input: PathBuf,

        /// Output JSONL file, or - for stdout
        #[arg(short, long)]
        output: PathBuf,

        /// Config file (defaults to ./func-views.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Record field holding the function source
        #[arg(long)]
        source_field: Option<String>,

        /// Worker threads (0 = one per core, 1 = sequential)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Records per batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Node classification strategy
        #[arg(long, value_parser = parse_strategy)]
        strategy: Option<LocatorStrategy>,

        /// Delete only the comment nodes, leaving their lines in place
        #[arg(long)]
        keep_comment_lines: bool,
    },

    /// Show the views of a single Python function
    Inspect {
        /// Python file holding one function
        file: PathBuf,

        /// Show a diff between the source and its comment-stripped text
        #[arg(short, long)]
        diff: bool,

        /// Print the views as a JSON object
        #[arg(long)]
        json: bool,

        /// Config file (defaults to ./func-views.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Node classification strategy
        #[arg(long, value_parser = parse_strategy)]
        strategy: Option<LocatorStrategy>,

        /// Delete only the comment nodes, leaving their lines in place
        #[arg(long)]
        keep_comment_lines: bool,
    },
}

fn parse_strategy(s: &str) -> Result<LocatorStrategy, String> {
    LocatorStrategy::parse(s).ok_or_else(|| format!("unknown strategy '{s}' (expected walk or query)"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Process {
            input,
            output,
            config,
            source_field,
            jobs,
            batch_size,
            strategy,
            keep_comment_lines,
        } => {
            let mut config = load_config(config.as_deref(), strategy, keep_comment_lines)?;
            if let Some(field) = source_field {
                config.input.source_field = field;
            }
            if let Some(jobs) = jobs {
                config.run.jobs = jobs;
            }
            if let Some(batch_size) = batch_size {
                config.run.batch_size = batch_size;
            }
            config.validate()?;

            cmd_process(&config, &input, &output)
        }

        Commands::Inspect {
            file,
            diff,
            json,
            config,
            strategy,
            keep_comment_lines,
        } => {
            let config = load_config(config.as_deref(), strategy, keep_comment_lines)?;
            config.validate()?;
            cmd_inspect(&file, diff, json, config.view_options())
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Load the config and apply the extraction flags shared by both commands.
fn load_config(
    explicit: Option<&Path>,
    strategy: Option<LocatorStrategy>,
    keep_comment_lines: bool,
) -> Result<PipelineConfig> {
    let cwd = env::current_dir().context("cannot determine working directory")?;
    let mut config = discover(explicit, &cwd)?;
    if let Some(strategy) = strategy {
        config.extraction.strategy = strategy;
    }
    if keep_comment_lines {
        config.extraction.strip_comment_lines = false;
    }
    Ok(config)
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn cmd_process(config: &PipelineConfig, input: &Path, output: &Path) -> Result<()> {
    let pipeline = RecordPipeline::new(config.pipeline_options());

    eprintln!(
        "{}",
        format!(
            "Processing {} -> {} (field '{}', strategy {})",
            input.display(),
            output.display(),
            config.input.source_field,
            config.extraction.strategy
        )
        .dimmed()
    );

    let summary = match (is_stdio(input), is_stdio(output)) {
        (false, false) => pipeline.run_files(input, output)?,
        (true, true) => pipeline.run(io::stdin().lock(), io::stdout().lock())?,
        (true, false) => pipeline.run_to_file(io::stdin().lock(), output)?,
        (false, true) => {
            let file = fs::File::open(input)
                .with_context(|| format!("failed to open {}", input.display()))?;
            pipeline.run(BufReader::new(file), io::stdout().lock())?
        }
    };

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    eprintln!();
    eprintln!("{}", "Summary:".bold());
    eprintln!("  {} read", summary.read);
    eprintln!("  {} written", format!("{}", summary.written).green());
    eprintln!("  {} skipped", format!("{}", summary.skipped()).yellow());
    if summary.skipped() > 0 {
        eprintln!("    {} malformed", summary.skipped_malformed);
        eprintln!("    {} missing source", summary.skipped_missing_source);
        eprintln!("    {} extraction failed", summary.skipped_extraction);
    }
}

fn cmd_inspect(file: &Path, show_diff: bool, json: bool, options: ViewOptions) -> Result<()> {
    let source =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;

    let mut builder = ViewBuilder::new(options)?;
    let views = builder
        .build(&source)
        .with_context(|| format!("cannot derive views for {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
    } else {
        print_view("name", &views.name);
        print_view("body with comments", &views.body_with_comments);
        print_view("body without comments", &views.body_without_comments);
        print_view("masked without comments", &views.masked_without_comments);
    }

    if show_diff {
        let stripped = builder.strip(&source)?;
        display_diff(file, &source, &stripped);
    }

    Ok(())
}

fn print_view(label: &str, text: &str) {
    println!("{}", format!("== {label} ==").cyan().bold());
    println!("{text}");
    println!();
}

/// Show unified diff between the source and its comment-stripped text
fn display_diff(file: &Path, original: &str, stripped: &str) {
    println!("{}", format!("--- {} (original)", file.display()).dimmed());
    println!("{}", format!("+++ {} (comments stripped)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, stripped);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}
