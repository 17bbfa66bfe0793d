//! filebatch - Pattern-based batch copy and move with rollback.
//!
//! Usage:
//!   filebatch copy DIR PATTERN TARGET     Copy matching files
//!   filebatch move DIR PATTERN TARGET     Move matching files
//!   filebatch find DIR PATTERN            List matching files
//!   filebatch run --request JOB.json      Run a batch described in JSON
//!   filebatch --help                      Show help

use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Context, Result};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use filebatch_ops::{
    start_copy, start_move, summary, BatchEvent, CancellationToken, ConflictPolicy,
    OperationType, TransferOutcome, TransferRequest,
};
use filebatch_scan::PatternMatcher;

#[derive(Parser)]
#[command(
    name = "filebatch",
    version,
    about = "Pattern-based batch copy and move with rollback",
    long_about = "filebatch copies or moves every file matching a glob pattern into a \
                  target directory.\n\n\
                  If any file fails, files already written by the batch are removed \
                  again. Moves delete their sources only after every file was copied."
)]
struct Cli {
    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy files matching a pattern
    Copy(TransferArgs),

    /// Move files matching a pattern
    Move(TransferArgs),

    /// List files matching a pattern
    Find {
        /// Root directory where pattern matching starts
        directory: PathBuf,

        /// Pattern to match, e.g. "**/*.xml"
        pattern: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Run a copy or move described by a JSON request file
    Run {
        /// Path to the request file
        #[arg(short, long)]
        request: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct TransferArgs {
    /// Root directory where pattern matching starts
    directory: PathBuf,

    /// Pattern to match, e.g. "**/*.xml"
    pattern: String,

    /// Directory the matched files are written to
    target: PathBuf,

    /// Recreate the matched files' subdirectories under the target
    #[arg(short, long)]
    preserve_structure: bool,

    /// Fail instead of creating missing target directories
    #[arg(long)]
    no_create_dirs: bool,

    /// What to do when a destination file already exists
    #[arg(short = 'c', long, default_value = "fail")]
    on_conflict: ConflictArg,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum ConflictArg {
    /// Abort the whole batch before writing anything
    #[default]
    Fail,
    /// Replace the existing file
    Overwrite,
    /// Write as name(N).ext instead
    Rename,
}

impl From<ConflictArg> for ConflictPolicy {
    fn from(arg: ConflictArg) -> Self {
        match arg {
            ConflictArg::Fail => ConflictPolicy::Fail,
            ConflictArg::Overwrite => ConflictPolicy::Overwrite,
            ConflictArg::Rename => ConflictPolicy::Rename,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// A request file: the batch settings plus which operation to run.
#[derive(Deserialize)]
struct JobFile {
    operation: OperationType,
    #[serde(flatten)]
    request: TransferRequest,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Command::Copy(args) => {
            let format = args.format;
            let request = args.into_request()?;
            run_batch(OperationType::Copy, request, format).await?;
        }
        Command::Move(args) => {
            let format = args.format;
            let request = args.into_request()?;
            run_batch(OperationType::Move, request, format).await?;
        }
        Command::Find {
            directory,
            pattern,
            format,
        } => {
            run_find(&directory, &pattern, format)?;
        }
        Command::Run { request, format } => {
            let (operation, request) = load_job(&request)?;
            run_batch(operation, request, format).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| eyre!("failed to install tracing subscriber: {e}"))
}

impl TransferArgs {
    fn into_request(self) -> Result<TransferRequest> {
        build_request(
            &self.directory,
            self.pattern,
            &self.target,
            self.preserve_structure,
            !self.no_create_dirs,
            self.on_conflict.into(),
        )
    }
}

/// Build a validated request, resolving relative paths against the working directory.
fn build_request(
    directory: &Path,
    pattern: String,
    target: &Path,
    preserve_structure: bool,
    create_target_directories: bool,
    on_conflict: ConflictPolicy,
) -> Result<TransferRequest> {
    let request = TransferRequest::builder()
        .source_directory(std::path::absolute(directory).context("Invalid source directory")?)
        .pattern(pattern)
        .target_directory(std::path::absolute(target).context("Invalid target directory")?)
        .preserve_structure(preserve_structure)
        .create_target_directories(create_target_directories)
        .on_conflict(on_conflict)
        .build()?;

    Ok(request)
}

/// Load a request file.
fn load_job(path: &Path) -> Result<(OperationType, TransferRequest)> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    let job: JobFile = serde_json::from_str(&content)
        .with_context(|| format!("Invalid request file {}", path.display()))?;

    let request = build_request(
        &job.request.source_directory,
        job.request.pattern,
        &job.request.target_directory,
        job.request.preserve_structure,
        job.request.create_target_directories,
        job.request.on_conflict,
    )?;

    Ok((job.operation, request))
}

/// Run a copy or move batch, printing progress to stderr.
async fn run_batch(
    operation: OperationType,
    request: TransferRequest,
    format: OutputFormat,
) -> Result<()> {
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling, rolling back written files...");
            ctrl_c.cancel();
        }
    });

    eprintln!(
        "{} {} from {} to {}...",
        operation,
        request.pattern,
        request.source_directory.display(),
        request.target_directory.display()
    );

    let mut rx = match operation {
        OperationType::Copy => start_copy(request, cancel),
        OperationType::Move => start_move(request, cancel),
    };

    let mut reported = 0;
    let mut result = None;

    while let Some(event) = rx.recv().await {
        match event {
            BatchEvent::Progress(progress) => {
                if progress.files_completed > reported {
                    reported = progress.files_completed;
                    if let Some(file) = &progress.current_file {
                        eprintln!(
                            " [{}/{}] {}",
                            progress.files_completed,
                            progress.files_total,
                            file.display()
                        );
                    }
                }
            }
            BatchEvent::Complete(complete) => result = Some(complete),
        }
    }

    let outcomes = result
        .ok_or_else(|| eyre!("{operation} task ended without a result"))?
        .wrap_err_with(|| format!("{operation} failed"))?;

    print_outcomes(operation, &outcomes, format)
}

fn print_outcomes(
    operation: OperationType,
    outcomes: &[TransferOutcome],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for outcome in outcomes {
                println!(
                    "{} -> {}",
                    outcome.source_path.display(),
                    outcome.final_destination.display()
                );
            }
            eprintln!();
            eprintln!(
                "{} ({})",
                summary(operation, outcomes),
                format_size(filebatch_core::total_bytes(outcomes))
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outcomes)?);
        }
    }

    Ok(())
}

/// List files matching a pattern.
fn run_find(directory: &Path, pattern: &str, format: OutputFormat) -> Result<()> {
    let directory = std::path::absolute(directory).context("Invalid directory")?;
    let matcher = PatternMatcher::new(pattern).context("Find failed")?;
    let matches = matcher.find(&directory).context("Find failed")?;

    match format {
        OutputFormat::Text => {
            for relative in &matches {
                println!("{}", relative.display());
            }
            eprintln!();
            eprintln!("{} file(s) matched {}", matches.len(), matcher.pattern());
        }
        OutputFormat::Json => {
            let full: Vec<PathBuf> = matches.iter().map(|r| directory.join(r)).collect();
            println!("{}", serde_json::to_string_pretty(&full)?);
        }
    }

    Ok(())
}

/// Format bytes as human-readable size.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
