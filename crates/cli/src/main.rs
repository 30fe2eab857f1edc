// poaudit CLI - flag voter registrations at postal facility addresses

mod audit;
mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use poaudit_io::PipelineError;

use audit::RunOverrides;
use exit_codes::{pipeline_exit_code, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "poaudit")]
#[command(about = "Flag voter registrations that resolve to postal facilities, PO Boxes or mail drops")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Debug logging (per-batch progress)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan voter files and write the flagged-address table
    #[command(after_help = "\
Examples:
  poaudit run
  poaudit run --config poaudit.toml --json
  poaudit run --data-dir /srv/swvf --output-dir /srv/out --batch-size 50000
  OVC_ENABLE=0 poaudit run")]
    Run {
        /// TOML config file (built-in defaults when omitted)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Directory holding SWVF_* voter files and the cached facility table
        #[arg(long, env = "POST_OFFICE_DATA_DIR")]
        data_dir: Option<PathBuf>,

        /// Directory for the flagged output and the cached watchlist
        #[arg(long, env = "POST_OFFICE_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Two-letter state code
        #[arg(long, env = "POST_OFFICE_STATE")]
        state: Option<String>,

        /// Rows read per batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Compare flagged voters against the cached watchlist (yes/no)
        #[arg(long, env = "OVC_ENABLE", value_parser = audit::parse_switch)]
        watchlist: Option<bool>,

        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Parse and validate a config file without running
    #[command(after_help = "\
Examples:
  poaudit validate --config poaudit.toml")]
    Validate {
        /// TOML config file
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },

    /// Count flagged rows that appear on a watchlist
    #[command(after_help = "\
Examples:
  poaudit overlap --flagged output/flagged_voter_addresses.csv --watchlist output/ovc_voter_ids.csv")]
    Overlap {
        /// Flagged output written by `poaudit run`
        #[arg(long)]
        flagged: PathBuf,

        /// Cached watchlist table
        #[arg(long)]
        watchlist: PathBuf,

        /// Print the overlap as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  poaudit-audit ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::init_from_env(env_logger::Env::default().default_filter_or(default_filter));

    let result = match cli.command {
        None => {
            eprintln!("Usage: poaudit <command> [options]");
            eprintln!("       poaudit --help for more information");
            Ok(())
        }
        Some(Commands::Run {
            config,
            data_dir,
            output_dir,
            state,
            batch_size,
            watchlist,
            json,
        }) => audit::cmd_run(
            config,
            RunOverrides {
                data_dir,
                output_dir,
                state,
                batch_size,
                watchlist,
            },
            json,
        ),
        Some(Commands::Validate { config }) => audit::cmd_validate(config),
        Some(Commands::Overlap {
            flagged,
            watchlist,
            json,
        }) => audit::cmd_overlap(flagged, watchlist, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn pipeline(err: PipelineError) -> Self {
        let hint = match &err {
            PipelineError::NoInputFiles { .. } => {
                Some("set --data-dir or POST_OFFICE_DATA_DIR to the folder holding the voter files".to_string())
            }
            PipelineError::Output(_) => Some("check that the output directory is writable".to_string()),
            _ => None,
        };
        Self {
            code: pipeline_exit_code(&err),
            message: err.to_string(),
            hint,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        if self.hint.is_none() {
            self.hint = Some(hint.into());
        }
        self
    }
}
