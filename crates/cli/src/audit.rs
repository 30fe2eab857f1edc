//! `poaudit run`, `poaudit validate` and `poaudit overlap`.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use poaudit_audit::AuditConfig;
use poaudit_io::{
    load_reference, load_watchlist_ids, overlap, run, FileStatus, RunSummary, WatchlistOverlap,
};

use crate::exit_codes::{EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_USAGE};
use crate::CliError;

/// Command-line values that replace config values when present.
#[derive(Debug, Default)]
pub struct RunOverrides {
    pub data_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub state: Option<String>,
    pub batch_size: Option<usize>,
    pub watchlist: Option<bool>,
}

/// JSON document printed by `run --json`.
#[derive(Serialize)]
struct RunReport<'a> {
    state: &'a str,
    #[serde(flatten)]
    summary: &'a RunSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    watchlist: Option<&'a WatchlistOverlap>,
}

/// Parse an on/off switch as accepted by `--watchlist` and `OVC_ENABLE`.
pub fn parse_switch(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" => Ok(true),
        "0" | "false" | "f" | "no" | "n" => Ok(false),
        other => Err(format!("expected a yes/no value, got {other:?}")),
    }
}

pub fn load_config(path: Option<&Path>) -> Result<AuditConfig, CliError> {
    let Some(path) = path else {
        return Ok(AuditConfig::default());
    };

    let text = std::fs::read_to_string(path).map_err(|e| {
        CliError::new(EXIT_USAGE, format!("cannot read config {}: {e}", path.display()))
    })?;
    AuditConfig::from_toml(&text).map_err(|e| {
        CliError::new(EXIT_INVALID_CONFIG, format!("{}: {e}", path.display()))
    })
}

pub fn apply_overrides(config: &mut AuditConfig, overrides: &RunOverrides) -> Result<(), CliError> {
    if let Some(dir) = &overrides.data_dir {
        config.input.data_dir = dir.clone();
    }
    if let Some(dir) = &overrides.output_dir {
        config.output.dir = dir.clone();
    }
    if let Some(state) = &overrides.state {
        config.state = state.trim().to_uppercase();
    }
    if let Some(batch_size) = overrides.batch_size {
        config.input.batch_size = batch_size;
    }
    if let Some(enabled) = overrides.watchlist {
        config.watchlist.enabled = enabled;
    }
    config
        .validate()
        .map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))
}

pub fn cmd_run(
    config_path: Option<PathBuf>,
    overrides: RunOverrides,
    json_output: bool,
) -> Result<(), CliError> {
    let mut config = load_config(config_path.as_deref())?;
    apply_overrides(&mut config, &overrides)?;

    info!(
        "State: {} | data: {} | output: {}",
        config.state,
        config.input.data_dir.display(),
        config.output.dir.display()
    );

    let index = load_reference(&config).map_err(|e| {
        CliError::pipeline(e).with_hint("the cached facility table must exist under the data directory")
    })?;
    let summary = run(&config, &index).map_err(CliError::pipeline)?;

    let watchlist = if config.watchlist.enabled {
        watchlist_overlap(&config, &summary.output_path)
    } else {
        info!("Watchlist comparison disabled");
        None
    };

    print_summary(&summary, watchlist.as_ref());

    if json_output {
        let report = RunReport {
            state: &config.state,
            summary: &summary,
            watchlist: watchlist.as_ref(),
        };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    Ok(())
}

/// Watchlist failures never fail the run.
fn watchlist_overlap(config: &AuditConfig, flagged: &Path) -> Option<WatchlistOverlap> {
    let path = config.watchlist_path();
    let ids = match load_watchlist_ids(&path) {
        Ok(ids) => ids,
        Err(e) => {
            warn!("Watchlist unavailable, continuing without comparison: {e}");
            return None;
        }
    };
    info!("Watchlist ids loaded: {} from {}", ids.len(), path.display());

    match overlap(flagged, &ids) {
        Ok(result) => Some(result),
        Err(e) => {
            warn!("Watchlist comparison failed: {e}");
            None
        }
    }
}

fn print_summary(summary: &RunSummary, watchlist: Option<&WatchlistOverlap>) {
    let t = &summary.tally;
    eprintln!("output: {}", summary.output_path.display());
    eprintln!(
        "flagged {} of {} records ({} high priority, no unit)",
        t.total_flagged, t.records_scanned, t.total_high_priority
    );
    eprintln!(
        "  facility street matches: {} ({} without coordinates)",
        t.facility_matches, t.facility_missing_coords
    );
    eprintln!("  PO Box only:             {}", t.po_box_only);
    eprintln!("  commercial keyword only: {}", t.keyword_only);
    eprintln!("files: {} scanned, {} skipped", t.files_scanned, t.files_skipped);
    for file in &summary.files {
        match file.status {
            FileStatus::Scanned => eprintln!(
                "  {}: {} rows, {} flagged",
                file.file, file.rows_read, file.rows_flagged
            ),
            FileStatus::Skipped => eprintln!(
                "  {}: skipped ({})",
                file.file,
                file.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
    if let Some(w) = watchlist {
        eprintln!(
            "watchlist: {} flagged rows ({} voters) of {} listed ids",
            w.flagged_rows, w.distinct_voters, w.watchlist_ids
        );
    }
}

pub fn cmd_validate(config_path: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;

    eprintln!("config OK");
    eprintln!("  state:      {}", config.state);
    eprintln!(
        "  input:      {} ({} .{})",
        config.input.data_dir.display(),
        config.input.file_pattern,
        config.input.extensions.join("|.")
    );
    eprintln!("  encoding:   {}", config.input.encoding);
    eprintln!("  batch size: {}", config.input.batch_size);
    eprintln!("  reference:  {}", config.reference_path().display());
    eprintln!("  output:     {}", config.output_path().display());
    if config.watchlist.enabled {
        eprintln!("  watchlist:  {}", config.watchlist_path().display());
    } else {
        eprintln!("  watchlist:  disabled");
    }
    eprintln!("  city aliases: {}", config.city_aliases().len());
    Ok(())
}

pub fn cmd_overlap(flagged: PathBuf, watchlist: PathBuf, json_output: bool) -> Result<(), CliError> {
    let ids = load_watchlist_ids(&watchlist).map_err(|e| {
        CliError::new(EXIT_ERROR, e.to_string())
            .with_hint("the watchlist needs a header naming a voter id column")
    })?;
    let result = overlap(&flagged, &ids).map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;

    eprintln!(
        "watchlist: {} flagged rows ({} voters) of {} listed ids",
        result.flagged_rows, result.distinct_voters, result.watchlist_ids
    );

    if json_output {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }
    Ok(())
}
