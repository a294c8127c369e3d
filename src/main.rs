use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use crossbeam_channel::Receiver;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use idfind::config::{Config, OutputFormat};
use idfind::digest::id_hash_hex;
use idfind::search::{ParallelConfig, SearchEvent, SearchStatistics, run_parallel_search};
use idfind::table::{self, HashSource, Headers, ResultRow};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_PATH: &str = "idfind.toml";

// --- Command Line Arguments ---

#[derive(Parser)]
#[command(name = "idfind")]
#[command(about = "idfind - recover integer ids from their SHA-256 hashes")]
#[command(version)]
#[command(subcommand_required = true)]
#[command(arg_required_else_help = true)]
struct Args {
    /// Enable verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// CLI output format selection
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliOutputFormat {
    /// Two-column CSV, unmatched ids left empty
    Csv,
    /// JSON array of {hash, id} objects, unmatched ids null
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(cli: CliOutputFormat) -> Self {
        match cli {
            CliOutputFormat::Csv => OutputFormat::Csv,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Reverse every hash in a file and write the recovered ids
    Search {
        /// File with one hash per line, or a delimited file with a header row
        input: PathBuf,
        /// TOML config file (defaults to ./idfind.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Header of the column holding the hashes
        #[arg(long)]
        column: Option<String>,
        /// Field delimiter for column input
        #[arg(long)]
        delimiter: Option<char>,
        /// Largest id to try
        #[arg(long, allow_negative_numbers = true)]
        max_id: Option<i64>,
        /// Number of worker threads (0 = all cores)
        #[arg(long, short = 'j')]
        workers: Option<usize>,
        /// Output file
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum)]
        format: Option<CliOutputFormat>,
    },
    /// Print the SHA-256 hash of each id
    Hash {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Write a default config file
    InitConfig {
        #[arg(default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Command line overrides for the search
struct SearchOverrides {
    column: Option<String>,
    delimiter: Option<char>,
    max_id: Option<i64>,
    workers: Option<usize>,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
}

impl SearchOverrides {
    fn apply(self, config: &mut Config) {
        if let Some(column) = self.column {
            config.input.column = Some(column);
        }
        if let Some(delimiter) = self.delimiter {
            config.input.delimiter = delimiter.to_string();
        }
        if let Some(max_id) = self.max_id {
            config.search.max_id = max_id;
        }
        if let Some(workers) = self.workers {
            config.search.workers = workers;
        }
        if let Some(output) = self.output {
            config.output.path = output.to_string_lossy().into_owned();
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
    }
}

// --- Search ---

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Configuration loaded from: {}", path.display());
            Ok(config)
        }
        None => Ok(Config::load_or_default(Path::new(DEFAULT_CONFIG_PATH))?),
    }
}

fn run_search_command(
    input: &Path,
    config_path: Option<&Path>,
    overrides: SearchOverrides,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    overrides.apply(&mut config);
    config.validate()?;

    let source = match config.input.column.as_deref() {
        Some(name) => HashSource::Column {
            name,
            delimiter: config.delimiter(),
        },
        None => HashSource::Lines,
    };
    let hashes = table::read_hashes(input, source)
        .with_context(|| format!("Failed to read hashes from {}", input.display()))?;
    info!("Loaded {} hashes from {}", hashes.len(), input.display());

    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let listener = spawn_progress_listener(event_rx);

    let parallel_config = ParallelConfig::default()
        .with_workers_option(config.workers())
        .with_progress_interval(config.search.progress_interval)
        .with_events(event_tx);

    let result = run_parallel_search(&hashes, config.search.max_id, &parallel_config);

    // Dropping the last sender ends the listener
    drop(parallel_config);
    if listener.join().is_err() {
        warn!("Progress listener panicked");
    }
    let result = result.context("Search failed")?;

    let ids = result.align(&hashes);
    let rows: Vec<ResultRow<'_>> = hashes
        .iter()
        .zip(&ids)
        .map(|(hash, id)| ResultRow {
            hash: hash.as_str(),
            id: *id,
        })
        .collect();

    let output = PathBuf::from(&config.output.path);
    table::write_results(
        &output,
        &rows,
        config.output.format,
        Headers {
            hash: &config.output.hash_header,
            id: &config.output.id_header,
        },
    )
    .with_context(|| format!("Failed to write results to {}", output.display()))?;

    let matched_rows = ids.iter().filter(|id| id.is_some()).count();
    println!("Matched {} of {} hashes", matched_rows, hashes.len());
    print_search_statistics(&result.statistics);
    println!("Results written to: {}", output.display());

    Ok(())
}

/// Render search events: progress bar on stderr, worker details at debug level.
fn spawn_progress_listener(events: Receiver<SearchEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut bar: Option<ProgressBar> = None;

        for event in events {
            match event {
                SearchEvent::Started {
                    max_id,
                    workers,
                    targets,
                } => {
                    debug!(
                        "Search started: max_id={} workers={} targets={}",
                        max_id, workers, targets
                    );
                    let pb = ProgressBar::new(max_id);
                    match ProgressStyle::default_bar().template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                    ) {
                        Ok(style) => pb.set_style(style.progress_chars("#>-")),
                        Err(e) => warn!("Invalid progress bar template: {}", e),
                    }
                    bar = Some(pb);
                }
                SearchEvent::Progress { hashed, .. } => {
                    if let Some(pb) = &bar {
                        pb.set_position(hashed);
                    }
                }
                SearchEvent::WorkerFinished {
                    worker_id,
                    candidates_hashed,
                    matches,
                } => {
                    debug!(
                        "Worker {} done: {} hashed, {} matches",
                        worker_id, candidates_hashed, matches
                    );
                }
                SearchEvent::Completed { matched, elapsed } => {
                    if let Some(pb) = bar.take() {
                        pb.finish_with_message(format!("{} matched in {:.2?}", matched, elapsed));
                    }
                }
            }
        }
    })
}

/// Print search statistics
fn print_search_statistics(stats: &SearchStatistics) {
    println!("\nSearch Statistics:");
    println!("  Max id: {}", stats.max_id);
    println!("  Workers: {}", stats.workers);
    println!("  Distinct targets: {}", stats.targets);
    println!("  Candidates hashed: {}", stats.candidates_hashed);
    println!("  Elapsed time: {:.2?}", stats.elapsed_time);
    println!("  Throughput: {:.0} hashes/s", stats.throughput());
}

// --- Other commands ---

fn print_hashes(ids: &[u64]) {
    for &id in ids {
        println!("{}\t{}", id, id_hash_hex(id));
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::save_default(path)
        .with_context(|| format!("Failed to write default config to {}", path.display()))?;
    println!("Default config written to: {}", path.display());
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// --- Main Function ---
fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let outcome = match args.command {
        Commands::Search {
            input,
            config,
            column,
            delimiter,
            max_id,
            workers,
            output,
            format,
        } => {
            let overrides = SearchOverrides {
                column,
                delimiter,
                max_id,
                workers,
                output,
                format: format.map(Into::into),
            };
            run_search_command(&input, config.as_deref(), overrides)
        }
        Commands::Hash { ids } => {
            print_hashes(&ids);
            Ok(())
        }
        Commands::InitConfig { path, force } => init_config(&path, force),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
