//! `clearpoint run | compare | validate`

use std::path::{Path, PathBuf};

use serde::Serialize;

use clearpoint_io::{read_statement, read_table, ReportArtifact};
use clearpoint_recon::model::{ReconCounts, ReconInput, ReconMeta};
use clearpoint_recon::report::{ReconReport, ReportSummary};
use clearpoint_recon::{build_period_report, build_report, ReconConfig, ReconError};

use crate::exit_codes::{recon_exit_code, EXIT_INVALID_CONFIG, EXIT_IO, EXIT_USAGE};
use crate::CliError;

/// Paths shared by `run` and `compare`.
pub struct ConfigArgs {
    pub config: Option<PathBuf>,
    pub account: Option<String>,
}

pub struct RunArgs {
    pub statement: PathBuf,
    pub direct_debit: PathBuf,
    pub eft: PathBuf,
    pub cheque: PathBuf,
    pub output: Option<PathBuf>,
    pub json: bool,
}

pub struct CompareArgs {
    pub current: PathBuf,
    pub previous: PathBuf,
    pub output: Option<PathBuf>,
    pub json: bool,
}

/// Machine-readable run output for `--json`.
#[derive(Serialize)]
struct JsonOutput<'a> {
    meta: &'a ReconMeta,
    summary: &'a ReportSummary,
    counts: &'a ReconCounts,
    warnings: &'a [String],
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        CliError { code: recon_exit_code(&err), message: err.to_string(), hint: None }
    }
}

fn load_config(args: &ConfigArgs) -> Result<ReconConfig, CliError> {
    match (&args.config, &args.account) {
        (Some(path), account) => {
            let text = std::fs::read_to_string(path).map_err(|e| CliError {
                code: EXIT_INVALID_CONFIG,
                message: format!("cannot read config {}: {e}", path.display()),
                hint: None,
            })?;
            let config = ReconConfig::from_toml_with_account(&text, account.as_deref())?;
            log::debug!("config '{}' loaded from {}", config.name, path.display());
            Ok(config)
        }
        (None, Some(account)) => {
            let config = ReconConfig::new(account.as_str());
            config.validate()?;
            Ok(config)
        }
        (None, None) => Err(CliError {
            code: EXIT_USAGE,
            message: "no target account".into(),
            hint: Some("pass --config recon.toml or --account <ID>".into()),
        }),
    }
}

pub fn cmd_run(config_args: ConfigArgs, args: RunArgs) -> Result<(), CliError> {
    let config = load_config(&config_args)?;

    let input = ReconInput {
        statement: read_statement(&args.statement)?,
        direct_debit: read_table(&args.direct_debit)?,
        eft: read_table(&args.eft)?,
        cheque: read_table(&args.cheque)?,
    };

    let result = clearpoint_recon::run(&config, &input)?;
    let report = build_report(&result);
    publish(&report, args.output.as_deref())?;

    if args.json {
        print_json(&report)?;
    }

    let s = &result.summary;
    let c = &report.counts;
    eprintln!(
        "recon '{}' for {}: {} statement entries, {} cleared entries",
        result.meta.config_name, config.target_account, c.statement_entries, c.cleared_entries,
    );
    eprintln!(
        "exceptions: {} statement-only, {} clearing-only; {} reversal group(s), {} cleared duplicate group(s), {} amount discrepancies",
        c.statement_exceptions,
        c.clearing_exceptions,
        c.reversal_groups,
        c.cleared_duplicate_groups,
        c.discrepancies,
    );
    eprintln!(
        "credits {} / debits {} / cleared debits {} / closing balance {}",
        s.total_statement_credits, s.total_statement_debits, s.total_cleared_debits, s.closing_balance,
    );
    print_warnings(&report);
    Ok(())
}

pub fn cmd_compare(config_args: ConfigArgs, args: CompareArgs) -> Result<(), CliError> {
    let config = load_config(&config_args)?;

    let current = read_statement(&args.current)?;
    let previous = read_statement(&args.previous)?;
    let result = clearpoint_recon::compare_periods(&config, &current, &previous)?;
    let report = build_period_report(&result);
    publish(&report, args.output.as_deref())?;

    if args.json {
        print_json(&report)?;
    }

    let p = &result.summary;
    eprintln!(
        "period compare for {}: {} current entries, {} not in previous snapshot",
        config.target_account,
        report.counts.statement_entries,
        report.counts.statement_exceptions,
    );
    eprintln!(
        "closing balance {} -> {}",
        p.previous.closing_balance, p.current.closing_balance,
    );
    print_warnings(&report);
    Ok(())
}

pub fn cmd_validate(path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&ConfigArgs { config: Some(path), account: None })?;
    eprintln!(
        "valid: recon '{}' for account {} (tolerance {}, {} excluded bank(s))",
        config.name,
        config.target_account,
        config.tolerance,
        config.excluded_banks.len(),
    );
    Ok(())
}

fn publish(report: &ReconReport, output: Option<&Path>) -> Result<(), CliError> {
    let artifact = ReportArtifact::render(report)?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&artifact.file_name));
    artifact.publish(&path)?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn print_json(report: &ReconReport) -> Result<(), CliError> {
    let output = JsonOutput {
        meta: &report.meta,
        summary: &report.summary,
        counts: &report.counts,
        warnings: &report.warnings,
    };
    let json_str = serde_json::to_string_pretty(&output).map_err(|e| CliError {
        code: EXIT_IO,
        message: format!("JSON serialization error: {e}"),
        hint: None,
    })?;
    println!("{json_str}");
    Ok(())
}

fn print_warnings(report: &ReconReport) {
    for w in &report.warnings {
        eprintln!("warning: {w}");
    }
}
