use crate::aggregate::{period_summary, snapshot_summary, summarize};
use crate::classify::classify;
use crate::clearing::load_channel;
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::matcher::{match_statement, outer_join};
use crate::model::{
    Channel, ChannelLoad, ClearedSet, PeriodResult, ReconInput, ReconMeta, ReconResult, RunMode,
};
use crate::statement::parse_statement;

/// Run a full reconciliation: statement against the three clearing channels.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    config.validate()?;

    let statement = parse_statement(&input.statement, config)?;
    let loads = load_channels(config, input)?;
    let cleared = ClearedSet::from_loads(&loads);

    let outcome = match_statement(&statement.entries, &cleared);
    let exceptions = classify(
        &statement.entries,
        &cleared,
        &outcome,
        config.tolerance,
        &config.duplicate_marker,
    )?;
    let summary = summarize(&statement.entries, &loads, statement.closing_balance)?;

    Ok(ReconResult {
        meta: meta(config, RunMode::Full),
        statement,
        loads,
        cleared,
        outcome,
        exceptions,
        summary,
    })
}

/// Compare two statement snapshots of the same account.
pub fn compare_periods(
    config: &ReconConfig,
    current_text: &str,
    previous_text: &str,
) -> Result<PeriodResult, ReconError> {
    config.validate()?;

    let current = parse_statement(current_text, config)?;
    let previous = parse_statement(previous_text, config)?;
    let join = outer_join(&current.entries, &previous.entries);
    let summary = period_summary(
        snapshot_summary(&previous.entries, previous.closing_balance)?,
        snapshot_summary(&current.entries, current.closing_balance)?,
    );

    let result = PeriodResult {
        meta: meta(config, RunMode::Period),
        current,
        previous,
        join,
        summary,
    };
    log::info!(
        "period compare: {} current entries, {} not in previous snapshot",
        result.current.entries.len(),
        result.exceptions().count()
    );
    Ok(result)
}

/// Channels load independently; results come back in `Channel::ALL` order
/// whatever order the workers finish in.
fn load_channels(config: &ReconConfig, input: &ReconInput) -> Result<Vec<ChannelLoad>, ReconError> {
    let results: Vec<Result<ChannelLoad, ReconError>> = std::thread::scope(|s| {
        let handles: Vec<_> = Channel::ALL
            .iter()
            .map(|&channel| {
                let table = input.report(channel);
                (channel, s.spawn(move || load_channel(channel, table, config)))
            })
            .collect();
        handles
            .into_iter()
            .map(|(channel, handle)| {
                handle.join().unwrap_or_else(|_| {
                    Err(ReconError::Io(format!("{channel} loader panicked")))
                })
            })
            .collect()
    });
    results.into_iter().collect()
}

fn meta(config: &ReconConfig, mode: RunMode) -> ReconMeta {
    ReconMeta {
        config_name: config.name.clone(),
        mode,
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        run_at: chrono::Utc::now().to_rfc3339(),
    }
}
