mod config;
mod sessions;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use sesstriage_core::{classify, PipelineOptions, DEFAULT_WINDOW_SECS};
use sesstriage_logging::{init_tracing, LogFormat, Reporter};
use sesstriage_sessions::DEFAULT_PREFIX;

use config::TriageConfig;
use sessions::SessionsSettings;

#[derive(Parser, Debug)]
#[command(
    name = "sesstriage",
    about = "Classify web sessions by user agent and fold crawler traffic",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log filter directive (default: warn, or the config file's value)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormatChoice>,

    /// Also append logs to this file as JSON lines
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Path to a config file (default: ./sesstriage.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Suppress progress output on stderr
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify and merge every session in a directory
    Sessions {
        /// Directory holding session records
        dir: PathBuf,

        /// Print virtual sessions as JSON
        #[arg(long)]
        json: bool,

        /// Proximity window for folding single-visit sessions, in seconds
        #[arg(short, long)]
        window: Option<i64>,

        /// Number of classification workers
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Classify a single user agent string
    Ua {
        /// The user agent string
        useragent: String,
    },
    /// Print decoded session records without classifying them
    Dump {
        /// Directory holding session records
        dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => TriageConfig::load_from(path)?,
        None => {
            let working_dir =
                std::env::current_dir().context("Failed to get current directory")?;
            TriageConfig::discover(&working_dir)?.unwrap_or_default()
        }
    };

    // CLI flags win over the config file
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.log.level.clone())
        .unwrap_or_else(|| "warn".to_string());
    let log_format: LogFormat = cli
        .log_format
        .map(Into::into)
        .or(config.log.format)
        .unwrap_or_default();

    let _guard = init_tracing(&log_level, log_format, cli.log_file.as_deref())
        .context("Failed to initialize logging")?;

    let reporter = if cli.quiet {
        Reporter::quiet()
    } else {
        Reporter::new(log_format)
    };
    let prefix = config
        .session_prefix
        .clone()
        .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

    match cli.command {
        Command::Sessions {
            dir,
            json,
            window,
            workers,
        } => {
            let settings = SessionsSettings {
                dir,
                prefix,
                window_secs: window.or(config.window_secs).unwrap_or(DEFAULT_WINDOW_SECS),
                workers: workers
                    .or(config.workers)
                    .unwrap_or_else(|| PipelineOptions::default().workers),
                json,
            };
            tracing::debug!(?settings, "Resolved settings");
            sessions::handle_sessions_command(settings, &reporter).await
        }
        Command::Ua { useragent } => {
            let facts = classify(Some(useragent.as_str()));
            println!("{}", serde_json::to_string_pretty(&facts)?);
            Ok(())
        }
        Command::Dump { dir } => sessions::handle_dump_command(dir, prefix, &reporter),
    }
}
