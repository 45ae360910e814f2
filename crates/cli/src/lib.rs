pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ivrbook_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

use crate::commands::{CommandResult, EXIT_CONFIG};

#[derive(Debug, Parser)]
#[command(
    name = "ivrbook",
    about = "Hospital appointment IVR",
    long_about = "Run the appointment booking call as an AGI script, rehearse it with a keypad script, and inspect configuration.",
    after_help = "Examples:\n  ivrbook agi\n  ivrbook simulate --digits 5,15,1,10,30,1\n  ivrbook doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to an ivrbook.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override logging.level")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Handle one call over stdin/stdout as an AGI script")]
    Agi,
    #[command(about = "Run a call against a keypad script and print a JSON report")]
    Simulate {
        #[arg(long, help = "Comma-separated keypad entries; an empty entry is a timeout")]
        digits: String,
        #[arg(long, help = "Caller id presented by the simulated channel")]
        caller_id: Option<String>,
        #[arg(long, help = "Deliver notifications to the configured webhooks")]
        send: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and webhook readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions {
        config_path: cli.config.clone(),
        require_file: cli.config.is_some(),
        overrides: ConfigOverrides {
            log_level: cli.log_level.clone(),
            ..ConfigOverrides::default()
        },
    };

    let result = match cli.command {
        Command::Config => {
            CommandResult { exit_code: 0, output: commands::config::run(&options) }
        }
        Command::Doctor { json } => {
            let (healthy, output) = commands::doctor::run(&options, json);
            CommandResult { exit_code: if healthy { 0 } else { EXIT_CONFIG }, output }
        }
        Command::Agi => match load(&options, "agi") {
            Ok(config) => {
                init_logging(&config);
                let result = commands::agi::run(&config);
                // stdout is the AGI channel.
                eprintln!("{}", result.output);
                return ExitCode::from(result.exit_code);
            }
            Err(result) => {
                eprintln!("{}", result.output);
                return ExitCode::from(result.exit_code);
            }
        },
        Command::Simulate { digits, caller_id, send } => match load(&options, "simulate") {
            Ok(config) => {
                init_logging(&config);
                commands::simulate::run(&config, &digits, caller_id.as_deref(), send)
            }
            Err(result) => result,
        },
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn load(options: &LoadOptions, command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options.clone()).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })
}

/// Logs go to stderr so they never interleave with AGI commands or JSON
/// reports on stdout.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}
