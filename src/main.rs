// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{error, warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use yapt::app_config::{self, Config, TranslationEngine};
use yapt::app_controller::Controller;
use yapt::providers::ollama::{select_model, Ollama};
use yapt::translation::CancellationFlag;

/// CLI Wrapper for TranslationEngine to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliEngine {
    Google,
    Ollama,
}

impl From<CliEngine> for TranslationEngine {
    fn from(cli_engine: CliEngine) -> Self {
        match cli_engine {
            CliEngine::Google => TranslationEngine::Google,
            CliEngine::Ollama => TranslationEngine::Ollama,
        }
    }
}

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
    /// Translate a PDF document (default command)
    Translate(TranslateArgs),

    /// List the models installed on the Ollama server
    Models {
        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config: String,
    },

    /// Generate shell completions for yapt
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input PDF file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output PDF file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Target language code (e.g. 'zh-TW', 'ja', 'fr')
    #[arg(short, long)]
    lang: Option<String>,

    /// Pages to translate, e.g. "1-10,15,20-25" (default: all)
    #[arg(short, long)]
    pages: Option<String>,

    /// Show detailed progress
    #[arg(short, long)]
    verbose: bool,

    /// Translation engine
    #[arg(short, long, value_enum)]
    engine: Option<CliEngine>,

    /// Ollama model to use (default: first gemma model installed)
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config: String,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// YAPT - Yet Another PDF Translator
///
/// Extracts the text of a PDF, translates it with Google Translate or a local
/// Ollama model and writes the translation over the original text.
#[derive(Parser, Debug)]
#[command(name = "yapt")]
#[command(version)]
#[command(about = "PDF translation tool that keeps the original layout")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "YAPT extracts the text of a PDF, translates every text run and writes the translation at the original position.

EXAMPLES:
    yapt input.pdf output.pdf                        # Translate to Traditional Chinese with Google
    yapt input.pdf output.pdf -l ja                  # Translate to Japanese
    yapt input.pdf output.pdf -p 1-10,15,20-25       # Translate selected pages only
    yapt input.pdf output.pdf -e ollama -m gemma2:9b # Use a local Ollama model
    yapt models                                      # List installed Ollama models
    yapt completions bash > yapt.bash                # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.

ENGINES:
    google - Google Translate web API (default)
    ollama - Local Ollama server (http://localhost:11434)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input PDF file
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output PDF file
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Target language code (e.g. 'zh-TW', 'ja', 'fr')
    #[arg(short, long)]
    lang: Option<String>,

    /// Pages to translate, e.g. "1-10,15,20-25" (default: all)
    #[arg(short, long)]
    pages: Option<String>,

    /// Show detailed progress
    #[arg(short, long)]
    verbose: bool,

    /// Translation engine
    #[arg(short, long, value_enum)]
    engine: Option<CliEngine>,

    /// Ollama model to use (default: first gemma model installed)
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config: String,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,
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
        // Accept everything here, the max level does the filtering
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }

    // @returns: Marker for log level
    fn marker_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "✗",
            Level::Warn => "!",
            Level::Info => " ",
            Level::Debug => "·",
            Level::Trace => "…",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::color_for_level(level),
                now,
                Self::marker_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    match run_cli().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_cli() -> Result<()> {
    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "yapt", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Models { config }) => list_models(&config).await,
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            // Default behavior - top-level args translate directly
            let (input, output) = match (cli.input, cli.output) {
                (Some(input), Some(output)) => (input, output),
                _ => return Err(anyhow!("INPUT and OUTPUT are required when no subcommand is specified")),
            };

            let translate_args = TranslateArgs {
                input,
                output,
                lang: cli.lang,
                pages: cli.pages,
                verbose: cli.verbose,
                engine: cli.engine,
                model: cli.model,
                config: cli.config,
                log_level: cli.log_level,
            };
            run_translate(translate_args).await
        }
    }
}

/// Load the configuration file, creating a default one when missing
fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;
        Ok(config)
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        Ok(config)
    }
}

fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(engine) = &options.engine {
        config.engine = engine.clone().into();
    }

    if let Some(model) = &options.model {
        config.translation.ollama.model = model.clone();
    }

    if let Some(lang) = &options.lang {
        config.target_language = lang.clone();
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    } else if options.verbose {
        config.log_level = app_config::LogLevel::Debug;
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // Apply an explicit log level before the config is read
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = load_or_create_config(&options.config)?;
    apply_overrides(&mut config, &options);

    config.validate()
        .context("Configuration validation failed")?;

    log::set_max_level(config.log_level.to_level_filter());

    if !options.input.is_file() {
        return Err(anyhow!("Input file does not exist: {:?}", options.input));
    }

    let cancel = CancellationFlag::new();
    let handler_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current step...");
            handler_flag.cancel();
        }
    });

    info!(
        "Translating {:?} -> {:?} ({}, {})",
        options.input,
        options.output,
        config.target_language,
        config.engine.display_name()
    );

    let controller = Controller::with_config(config)?.with_cancellation(cancel);
    let report = controller
        .run(&options.input, &options.output, options.pages.as_deref())
        .await?;

    info!("Translation complete: {:?}", options.output);
    if let Some(issues_log) = &report.issues_log {
        warn!("Some text could not be translated, see {:?}", issues_log);
    }

    Ok(())
}

async fn list_models(config_path: &str) -> Result<()> {
    let config = load_or_create_config(config_path)?;
    let ollama_config = &config.translation.ollama;

    let client = Ollama::new(
        ollama_config.endpoint.clone(),
        ollama_config.timeout_secs,
        ollama_config.list_timeout_secs,
    );
    let models = client.list_models().await
        .context("Failed to list Ollama models (is `ollama serve` running?)")?;

    let requested = Some(ollama_config.model.as_str()).filter(|m| !m.trim().is_empty());
    let selected = select_model(&models, requested)?;

    println!("Ollama models at {}:", client.base_url());
    for model in &models {
        let marker = if *model == selected { "*" } else { " " };
        println!(" {} {}", marker, model);
    }

    Ok(())
}
