//! cmptree - Verify that a backup or clone of a directory tree is a faithful copy.
//!
//! Usage:
//!   cmptree compare FS1 FS2   Compare the candidate tree FS2 against FS1
//!   cmptree log-stats [LOG]   Summarize an error log of a previous run
//!   cmptree --help            Show help

use std::fs::File;
use std::io::{BufReader, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread::{self, JoinHandle};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::EnvFilter;

use cmptree_analyze::{CompareProgress, LogAnalytics, TreeComparer};
use cmptree_core::{CompareConfig, CompareSummary};
use cmptree_report::{ERR_LOG_DEFAULT_NAME, LogFileSink, run_digest};

#[derive(Parser)]
#[command(
    name = "cmptree",
    version,
    about = "Verify that a backup or clone of a directory tree is a faithful copy",
    long_about = "cmptree compares a reference tree (FS1) with a candidate tree (FS2) and \
                  reports missing entries, type mismatches, differing content or symlink \
                  targets, and inaccessible entries.\n\n\
                  Errors are written to 'cmp-err.log'; the exit code is 0 when the trees \
                  match, 1 when they differ, and 2 on fatal errors."
)]
struct Cli {
    /// Debug logging and relative paths in report lines
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compare two directory trees
    Compare {
        /// Reference tree (FS1)
        fs1: PathBuf,

        /// Candidate tree (FS2)
        fs2: PathBuf,

        /// Also log matching entries to cmp-ok.log
        #[arg(short = 'i', long)]
        report_identical: bool,

        /// Compare the tree structure only, never file content
        #[arg(short = 's', long)]
        structure_only: bool,

        /// Compare files by size and modification time only
        #[arg(long)]
        shallow: bool,

        /// Do not apply the standard backup exclusions
        #[arg(short = 'c', long)]
        clear_std_exclusions: bool,

        /// Add exclusions for a live (mounted, running) filesystem
        #[arg(short = 'l', long)]
        live_fs_exclusions: bool,

        /// Additional exclusion pattern (repeatable); a leading '/' anchors it at the tree top
        #[arg(short = 'e', long = "exclude", value_name = "PATTERN")]
        exclude: Vec<String>,

        /// Do not report entries that only exist in FS2
        #[arg(long = "ignore-missing-in-fs1")]
        ignore_missing_in_fs1: bool,

        /// Let anchored patterns match at any depth (trees that are not volume tops)
        #[arg(short = 'r', long)]
        relative_fs_top: bool,

        /// Directory or file name for the log files
        #[arg(short = 'o', long, value_name = "PATH")]
        output_path: Option<PathBuf>,

        /// Compare only the entries listed in this file (one relative path per line)
        #[arg(long, value_name = "FILE")]
        from_list: Option<PathBuf>,

        /// Worker threads for content comparison (0 = auto, 1 = sequential)
        #[arg(short = 'j', long, default_value = "0")]
        jobs: usize,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the most frequent errors and comments of an error log
    LogStats {
        /// Error log of a previous run
        #[arg(default_value = ERR_LOG_DEFAULT_NAME)]
        log: PathBuf,

        /// Number of entries to show per section
        #[arg(short = 'n', long, default_value = "3")]
        top: usize,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Options for a `compare` run that only affect the binary.
struct Presentation {
    verbose: bool,
    quiet: bool,
    json: bool,
}

fn main() -> ExitCode {
    if let Err(err) = color_eyre::install() {
        eprintln!("Error: {err}");
        return ExitCode::from(2);
    }

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    init_logging(cli.verbose, cli.quiet)?;

    match cli.command {
        Command::Compare {
            fs1,
            fs2,
            report_identical,
            structure_only,
            shallow,
            clear_std_exclusions,
            live_fs_exclusions,
            exclude,
            ignore_missing_in_fs1,
            relative_fs_top,
            output_path,
            from_list,
            jobs,
            json,
        } => {
            let mut builder = CompareConfig::builder();
            builder
                .reference(fs1)
                .candidate(fs2)
                .exclude_patterns(exclude)
                .shallow(shallow)
                .structure_only(structure_only)
                .ignore_missing_in_reference(ignore_missing_in_fs1)
                .relative_fs_top(relative_fs_top)
                .report_identical(report_identical)
                .show_relative(cli.verbose)
                .jobs(jobs);
            if !clear_std_exclusions {
                builder.standard_exclusions(live_fs_exclusions);
            }
            if let Some(list) = from_list {
                builder.traverse_list(list);
            }
            let config = builder.build().context("Invalid configuration")?;

            let presentation = Presentation {
                verbose: cli.verbose,
                quiet: cli.quiet,
                json,
            };
            run_compare(config, output_path.as_deref(), &presentation)
        }
        Command::LogStats { log, top, format } => {
            run_log_stats(&log, top, format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Install the stderr log subscriber; `RUST_LOG` overrides the level.
fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| eyre!("cannot install logger: {e}"))
}

/// Run a comparison and print its digest.
fn run_compare(
    config: CompareConfig,
    output_path: Option<&Path>,
    presentation: &Presentation,
) -> Result<ExitCode> {
    let comparer = TreeComparer::new(config).context("Cannot start comparison")?;
    let sink = LogFileSink::open(output_path, comparer.config().show_relative)
        .context("Cannot prepare log files")?;

    if !presentation.quiet && !presentation.json {
        eprintln!(
            "Comparing {} with {}...",
            comparer.reference().display(),
            comparer.candidate().display()
        );
    }
    let show_progress =
        !presentation.quiet && !presentation.json && std::io::stderr().is_terminal();
    let progress = show_progress.then(|| spawn_progress(comparer.subscribe()));

    let result = comparer.run(sink);
    // The progress channel closes once the run is over
    if let Some(handle) = progress {
        let _ = handle.join();
    }
    let (mut sink, summary) = result.context("Comparison failed")?;
    sink.close();

    if presentation.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        if presentation.verbose {
            print_summary(&summary);
        }
        if !presentation.quiet || !summary.is_ok() {
            println!("{}", run_digest(summary.is_ok(), sink.err_log().path())?);
        }
    }

    Ok(if summary.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Render progress updates on stderr until the run ends.
fn spawn_progress(mut rx: broadcast::Receiver<CompareProgress>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stderr = std::io::stderr();
        loop {
            match rx.blocking_recv() {
                Ok(progress) => {
                    let _ = write!(
                        stderr,
                        "\r\x1b[2K[{}] {} entries, {} dirs, {} queued, {} errors ({:.0}/s)",
                        progress.phase,
                        progress.entries_processed,
                        progress.dirs_walked,
                        progress.files_queued,
                        progress.errors_count,
                        progress.entries_per_second()
                    );
                    let _ = stderr.flush();
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        let _ = write!(stderr, "\r\x1b[2K");
        let _ = stderr.flush();
    })
}

fn print_summary(summary: &CompareSummary) {
    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} directories, {} files compared ({})",
        summary.dirs_walked,
        summary.files_compared,
        format_size(summary.bytes_compared)
    );
    for (kind, count) in &summary.error_counts {
        println!("   {kind:<22} {count:>8}");
    }
    println!(" Compared in {:.2}s", summary.duration.as_secs_f64());
    println!("{}", "─".repeat(60));
    println!();
}

/// Summarize an error log.
fn run_log_stats(log: &Path, top: usize, format: OutputFormat) -> Result<()> {
    let file = File::open(log).with_context(|| format!("Cannot open {}", log.display()))?;
    let analytics = LogAnalytics::from_reader(BufReader::new(file))
        .with_context(|| format!("Cannot read {}", log.display()))?;
    let report = analytics.report(top);

    match format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

/// Format bytes as human-readable size.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
