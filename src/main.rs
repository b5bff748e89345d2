mod calc;
mod cmd;
mod data;
mod ui;

use clap::error::ErrorKind;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Default log level when not specified
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Parser)]
#[command(name = "ccal", version, about = "Keyboard-driven terminal calendar")]
struct Cli {
    /// Directory holding config.json (default: ~/.ccal)
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Append logs to this file (logging is off when omitted)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match usage_error(&e) {
            None => {
                let _ = e.print();
                return ExitCode::SUCCESS;
            }
            Some(message) => {
                println!("Error: {message}");
                return ExitCode::FAILURE;
            }
        },
    };

    if let Some(log_file) = &cli.log_file {
        init_logging(&cli.log_level, log_file);
    }

    let config_dir = cli.config_dir.clone().unwrap_or_else(|| {
        data::persistence::default_config_dir().unwrap_or_else(|_| PathBuf::from(".ccal"))
    });

    match cmd::root::run(&config_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// One-line diagnostic for a bad command line; `None` for `--help` and
/// `--version`, which print their text and exit successfully.
fn usage_error(e: &clap::Error) -> Option<String> {
    match e.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => None,
        _ => {
            let rendered = e.to_string();
            let first = rendered.lines().next().unwrap_or_default();
            Some(first.trim_start_matches("error: ").trim().to_string())
        }
    }
}

fn parse_level(log_level: &str) -> Level {
    match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Sends tracing output to `log_file`; the terminal itself belongs to the UI.
fn init_logging(log_level: &str, log_file: &Path) {
    let file = match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", log_file.display(), e);
            return;
        }
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(log_level))
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}
