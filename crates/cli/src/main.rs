// Clearpoint CLI - statement-to-clearing reconciliation

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::EXIT_SUCCESS;
use recon::{CompareArgs, ConfigArgs, RunArgs};

#[derive(Parser)]
#[command(name = "clearpoint")]
#[command(about = "Reconcile a bank statement against direct-debit, EFT and cheque clearing reports")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Warnings and errors only (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a statement against the three clearing reports
    #[command(after_help = "\
Examples:
  clearpoint run --statement stmt.txt --direct-debit DirectDebits.xlsx \\
      --eft EFTs.xlsx --cheque Cheques.xlsx --config recon.toml
  clearpoint run --statement stmt.txt --direct-debit dd.csv --eft eft.csv \\
      --cheque chq.csv --account KES1020000010001 --output out/Recon.xlsx --json")]
    Run {
        /// Fixed-width statement export
        #[arg(long)]
        statement: PathBuf,

        /// Direct-debit clearing report (.xlsx/.xls/.ods/.csv)
        #[arg(long)]
        direct_debit: PathBuf,

        /// EFT clearing report
        #[arg(long)]
        eft: PathBuf,

        /// Cheque clearing report
        #[arg(long)]
        cheque: PathBuf,

        /// Recon config (.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Target account; overrides the config's target_account
        #[arg(long, env = "CLEARPOINT_ACCOUNT")]
        account: Option<String>,

        /// Report path (default: ./Recon.xlsx)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print meta, summary and counts as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Compare two statement snapshots of the same account
    #[command(after_help = "\
Examples:
  clearpoint compare --current june.txt --previous may.txt --account KES1020000010001")]
    Compare {
        /// Current statement export
        #[arg(long)]
        current: PathBuf,

        /// Previous statement export
        #[arg(long)]
        previous: PathBuf,

        /// Recon config (.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Target account; overrides the config's target_account
        #[arg(long, env = "CLEARPOINT_ACCOUNT")]
        account: Option<String>,

        /// Report path (default: ./PeriodCompare.xlsx)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print meta, summary and counts as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate a recon config without running
    Validate {
        /// Path to the recon .toml config file
        config: PathBuf,
    },
}

pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  clearpoint-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Also bridges `log` records from the engine crates.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run {
            statement,
            direct_debit,
            eft,
            cheque,
            config,
            account,
            output,
            json,
        } => recon::cmd_run(
            ConfigArgs { config, account },
            RunArgs { statement, direct_debit, eft, cheque, output, json },
        ),
        Commands::Compare { current, previous, config, account, output, json } => recon::cmd_compare(
            ConfigArgs { config, account },
            CompareArgs { current, previous, output, json },
        ),
        Commands::Validate { config } => recon::cmd_validate(config),
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
