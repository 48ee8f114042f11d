// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};

use crate::adapters::AdapterBackend;
use crate::adapters::http::{HttpLemmatizer, HttpTranslator};
use crate::adapters::mock::{MockDictionaryStore, MockLemmatizer, MockUserProgressStore};
use crate::adapters::sqlite::{SqliteConnection, SqliteDictionaryStore, SqliteProgressStore};
use crate::adapters::{DictionaryStore, Lemmatizer, Translator, UserProgressStore};
use crate::app_config::{Config, LogLevel};
use crate::file_utils::FileManager;
use crate::orchestrator::{FilteringRequest, TaskOrchestrator};
use crate::progress::{ProgressBroadcaster, ProgressTracker, TaskStatus};
use crate::vocabulary::CefrLevel;

mod adapters;
mod app_config;
mod errors;
mod file_utils;
mod filtering;
mod language_utils;
mod orchestrator;
mod progress;
mod subtitle_processor;
mod vocabulary;

/// CLI wrapper for CefrLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl From<CliLevel> for CefrLevel {
    fn from(level: CliLevel) -> Self {
        match level {
            CliLevel::A1 => CefrLevel::A1,
            CliLevel::A2 => CefrLevel::A2,
            CliLevel::B1 => CefrLevel::B1,
            CliLevel::B2 => CefrLevel::B2,
            CliLevel::C1 => CefrLevel::C1,
            CliLevel::C2 => CefrLevel::C2,
        }
    }
}

/// CLI wrapper for AdapterBackend to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliBackend {
    Mock,
    Sqlite,
    Http,
}

impl From<CliBackend> for AdapterBackend {
    fn from(backend: CliBackend) -> Self {
        match backend {
            CliBackend::Mock => AdapterBackend::Mock,
            CliBackend::Sqlite => AdapterBackend::Sqlite,
            CliBackend::Http => AdapterBackend::Http,
        }
    }
}

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Filter subtitle vocabulary against the learner's known words
    Filter(FilterArgs),

    /// Generate shell completions for lexisub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct FilterArgs {
    /// Subtitle file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Subtitle language code (e.g. 'de', 'en', 'es')
    #[arg(short, long)]
    language: Option<String>,

    /// Target proficiency level
    #[arg(short = 'L', long, value_enum)]
    level: Option<CliLevel>,

    /// User the run belongs to
    #[arg(short, long)]
    user: Option<String>,

    /// Adapter backend to use
    #[arg(short, long, value_enum)]
    backend: Option<CliBackend>,

    /// Output directory for result artifacts
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Lexisub - subtitle vocabulary filtering
///
/// Classifies time-coded subtitle text against a learner's known words and
/// target level, reporting which segments are ready, nearly ready (one
/// blocking word) or worth studying (two or more unknown words).
#[derive(Parser, Debug)]
#[command(name = "lexisub")]
#[command(version = "1.0.0")]
#[command(about = "Subtitle vocabulary filtering tool")]
#[command(long_about = "Lexisub partitions subtitles by how much of their vocabulary a learner
already knows, and extracts the blocking words for study.

EXAMPLES:
    lexisub filter lesson01.de.srt                  # Filter with default config
    lexisub filter -l de -L b1 lesson01.de.srt      # German at level B1
    lexisub filter -b sqlite /subtitles/            # Whole directory, SQLite dictionary
    lexisub filter --log-level debug lesson.srt     # Verbose run
    lexisub completions bash > lexisub.bash         # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a
    different file with --config-path. If the file doesn't exist, a default
    one is created automatically.

BACKENDS:
    mock    - in-memory adapters, no persistence (default)
    sqlite  - local SQLite dictionary and known-word stores
    http    - remote lemmatizer/translator services, SQLite stores")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default;
    // the level is updated after the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "lexisub", &mut std::io::stdout());
            Ok(())
        }
        Commands::Filter(args) => run_filter(args).await,
    }
}

async fn run_filter(options: FilterArgs) -> Result<()> {
    if let Some(level) = &options.log_level {
        log::set_max_level(level_filter(level.clone().into()));
    }

    // Load or create configuration
    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        config.to_file(config_path)?;
        config
    };

    // Override config with CLI options if provided
    if let Some(language) = &options.language {
        config.language = language.clone();
    }
    if let Some(level) = options.level {
        config.target_level = level.into();
    }
    if let Some(user) = &options.user {
        config.user_id = user.clone();
    }
    if let Some(backend) = options.backend {
        config.adapters.backend = backend.into();
    }
    if let Some(output_dir) = &options.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(level) = &options.log_level {
        config.log_level = level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;

    if options.log_level.is_none() {
        log::set_max_level(level_filter(config.log_level));
    }

    let orchestrator = build_orchestrator(&config)?;
    let _heartbeat = orchestrator.start_heartbeat();

    // Collect input files
    let files: Vec<PathBuf> = if options.input_path.is_file() {
        vec![options.input_path.clone()]
    } else if options.input_path.is_dir() {
        FileManager::find_files(&options.input_path, "srt")?
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", options.input_path));
    };

    if files.is_empty() {
        warn!("No subtitle files found under {:?}", options.input_path);
        return Ok(());
    }

    info!("Processing {} subtitle file(s)", files.len());

    for file in files {
        process_file(&orchestrator, &file).await?;
    }

    Ok(())
}

/// Submit one file and render its progress until the task terminates
async fn process_file(orchestrator: &TaskOrchestrator, file: &Path) -> Result<()> {
    info!("Filtering {:?}", file);

    let request = FilteringRequest::new("", "subtitle");
    let task_id = orchestrator
        .submit_file(file, request)
        .map_err(|e| anyhow!("Failed to submit {:?}: {}", file, e))?;

    let progress_bar = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style);

    loop {
        let Ok(progress) = orchestrator.poll(&task_id) else {
            break;
        };

        progress_bar.set_position(progress.progress as u64);
        progress_bar.set_message(progress.current_step.clone());

        match progress.status {
            TaskStatus::Processing => {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            TaskStatus::Completed => {
                progress_bar.finish_with_message("done");
                if let Some(path) = &progress.result_path {
                    info!("Artifact written to {}", path);
                }
                if let Some(result) = &progress.result {
                    info!(
                        "Segments: {} total, {} ready, {} single-blocker, {} learning",
                        result["total_subtitles"], result["empty"],
                        result["single_blocker"], result["learning"]
                    );
                }
                break;
            }
            TaskStatus::Failed => {
                progress_bar.abandon_with_message("failed");
                return Err(anyhow!(
                    "Task failed: {}",
                    progress.error.as_deref().unwrap_or("unknown error")
                ));
            }
        }
    }

    Ok(())
}

/// Wire an orchestrator for the configured backend
fn build_orchestrator(config: &Config) -> Result<TaskOrchestrator> {
    let tracker = ProgressTracker::new(ProgressBroadcaster::new());

    let (lemmatizer, dictionary, progress_store, translator): (
        Arc<dyn Lemmatizer>,
        Arc<dyn DictionaryStore>,
        Arc<dyn UserProgressStore>,
        Option<Arc<dyn Translator>>,
    ) = match config.adapters.backend {
        AdapterBackend::Mock => (
            Arc::new(MockLemmatizer::identity()),
            Arc::new(MockDictionaryStore::new()),
            Arc::new(MockUserProgressStore::new()),
            None,
        ),
        AdapterBackend::Sqlite => {
            let connection = match &config.adapters.database_path {
                Some(path) => SqliteConnection::open(path)?,
                None => SqliteConnection::open_default()?,
            };
            let lemmatizer: Arc<dyn Lemmatizer> = if config.adapters.lemmatizer_endpoint.is_empty() {
                Arc::new(MockLemmatizer::identity())
            } else {
                Arc::new(HttpLemmatizer::new(&config.adapters.lemmatizer_endpoint)?)
            };
            (
                lemmatizer,
                Arc::new(SqliteDictionaryStore::new(connection.clone())),
                Arc::new(SqliteProgressStore::new(connection)),
                None,
            )
        }
        AdapterBackend::Http => {
            let connection = match &config.adapters.database_path {
                Some(path) => SqliteConnection::open(path)?,
                None => SqliteConnection::open_default()?,
            };
            let translator: Option<Arc<dyn Translator>> =
                if config.adapters.translator_endpoint.is_empty() {
                    None
                } else {
                    Some(Arc::new(HttpTranslator::new(&config.adapters.translator_endpoint)?))
                };
            (
                Arc::new(HttpLemmatizer::new(&config.adapters.lemmatizer_endpoint)?),
                Arc::new(SqliteDictionaryStore::new(connection.clone())),
                Arc::new(SqliteProgressStore::new(connection)),
                translator,
            )
        }
    };

    Ok(TaskOrchestrator::new(
        config.clone(),
        lemmatizer,
        dictionary,
        progress_store,
        translator,
        None,
        tracker,
    ))
}
