// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use heritage_translator::app_config::{self, Config};
use heritage_translator::app_controller::{Controller, RunOutcome, RunPlan};
use heritage_translator::translation::CancellationFlag;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate untranslated heritage records (default command)
    Translate(TranslateArgs),

    /// Generate shell completions for heritage-translator
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug, Clone, Default)]
struct TranslateArgs {
    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Dataset URL or local file path
    #[arg(short, long)]
    source: Option<String>,

    /// Directory for the exported dataset and checkpoints
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "heritage.conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

/// Heritage Translator - batch English translation of heritage records
///
/// Loads the heritage dataset, translates every record that has no English
/// name or description yet, and exports the enriched dataset.
#[derive(Parser, Debug)]
#[command(name = "heritage-translator")]
#[command(version)]
#[command(about = "AI-powered batch translation of heritage records")]
#[command(long_about = "Heritage Translator loads the heritage dataset, translates untranslated records with an OpenAI-compatible API and exports the enriched dataset.

EXAMPLES:
    heritage-translator                                  # Translate using default config
    heritage-translator -y                               # Skip the confirmation prompt
    heritage-translator -w 4 -m solar-pro2               # Use 4 workers and a specific model
    heritage-translator -s ./heritage-data.js -o out/    # Local dataset, custom output dir
    heritage-translator completions bash > ht.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in heritage.conf.json by default. You can specify a
    different file with --config-path. If the file doesn't exist, a default one
    will be created automatically. The API key is read from the environment
    variable named in provider.api_key_env (UPSTAGE_API_KEY by default).")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
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
        // The logger accepts everything; `log::set_max_level` does the filtering
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour for log level
    fn get_color_for_level(level: Level) -> &'static str {
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
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "heritage-translator", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => run_translate(cli.translate).await,
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)
        .with_context(|| format!("Failed to load config file: {:?}", options.config_path))?;
    apply_overrides(&mut config, &options);

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let controller = Controller::with_config(config)?;

    let cancel = CancellationFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if signal_flag.is_cancelled() {
                error!("Second interrupt received, exiting without saving");
                std::process::exit(130);
            }
            warn!("Interrupt received, finishing in-flight translations (press Ctrl-C again to exit)");
            signal_flag.cancel();
        }
    });

    // The prompt blocks on stdin, so keep it off the async worker threads
    let assume_yes = options.yes;
    let outcome = controller
        .run(
            move |plan| assume_yes || tokio::task::block_in_place(|| ask_confirmation(plan)),
            cancel,
        )
        .await;

    match outcome {
        Ok(RunOutcome::NothingToDo) | Ok(RunOutcome::Aborted) => Ok(()),
        Ok(RunOutcome::Completed(summary)) => {
            info!(
                "✅ {} translated, {} failed, {} records updated, output: {:?}",
                summary.succeeded, summary.failed, summary.updated, summary.export_path
            );
            if summary.cancelled {
                warn!("Run was interrupted; rerun to translate the remaining records");
            }
            Ok(())
        }
        Err(e) => {
            error!("{:#}", e);
            Err(e)
        }
    }
}

/// Apply CLI flags on top of the loaded configuration
fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(workers) = options.workers {
        config.batch.workers = workers;
    }

    if let Some(model) = &options.model {
        config.provider.model = model.clone();
    }

    if let Some(source) = &options.source {
        if source.starts_with("http://") || source.starts_with("https://") {
            config.source.url = source.clone();
            config.source.local_path = None;
        } else {
            config.source.local_path = Some(Path::new(source).to_path_buf());
        }
    }

    if let Some(output_dir) = &options.output_dir {
        config.output_dir = output_dir.clone();
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

// Ask the operator to confirm the run plan on stdin
fn ask_confirmation(plan: &RunPlan) -> bool {
    print!("Translate {} records? Proceed? (y/N) ", plan.jobs);
    let _ = std::io::stdout().flush();

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    answer.trim().eq_ignore_ascii_case("y")
}
