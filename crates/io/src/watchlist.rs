//! Watchlist overlap.
//!
//! A cached table of voter identifiers published by an outside watchlist is
//! compared against the flagged output after a run. The comparison is
//! reporting only; it never feeds back into classification.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use crate::csv::{read_file_as_utf8, sniff_delimiter};
use crate::error::WatchlistError;

/// Preferred identifier headers, compared case-insensitively after trimming.
const ID_COLUMN_CANDIDATES: [&str; 5] = [
    "sos voter id",
    "sos_voterid",
    "voter id",
    "voter_id",
    "sos voterid",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WatchlistOverlap {
    /// Identifiers on the watchlist.
    pub watchlist_ids: usize,
    /// Flagged output rows whose voter id is on the watchlist.
    pub flagged_rows: usize,
    /// Distinct flagged voter ids on the watchlist.
    pub distinct_voters: usize,
}

/// Pick the identifier column: a known header name first, else the first
/// header mentioning both "voter" and "id".
pub fn find_id_column(headers: &[String]) -> Option<usize> {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

    ID_COLUMN_CANDIDATES
        .iter()
        .find_map(|candidate| lowered.iter().position(|h| h == candidate))
        .or_else(|| {
            lowered
                .iter()
                .position(|h| h.contains("voter") && h.contains("id"))
        })
}

pub fn load_watchlist_ids(path: &Path) -> Result<BTreeSet<String>, WatchlistError> {
    let content = read_file_as_utf8(path)
        .map_err(|e| WatchlistError::Io(format!("{}: {}", path.display(), e)))?;

    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(&content))
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| WatchlistError::Csv(e.to_string()))?
        .iter()
        .map(String::from)
        .collect();

    let column = find_id_column(&headers).ok_or(WatchlistError::NoIdColumn { headers })?;

    let mut ids = BTreeSet::new();
    for result in reader.records() {
        let record = result.map_err(|e| WatchlistError::Csv(e.to_string()))?;
        let id = record.get(column).unwrap_or("").trim();
        if id.is_empty() || id.eq_ignore_ascii_case("nan") {
            continue;
        }
        ids.insert(id.to_string());
    }
    Ok(ids)
}

/// Count flagged output rows whose `voter_id` appears in `ids`.
pub fn overlap(flagged_csv: &Path, ids: &BTreeSet<String>) -> Result<WatchlistOverlap, WatchlistError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(flagged_csv)
        .map_err(|e| WatchlistError::Io(format!("{}: {}", flagged_csv.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| WatchlistError::Csv(e.to_string()))?
        .clone();
    let column = headers
        .iter()
        .position(|h| h == "voter_id")
        .ok_or_else(|| WatchlistError::NoIdColumn {
            headers: headers.iter().map(String::from).collect(),
        })?;

    let mut flagged_rows = 0;
    let mut seen = BTreeSet::new();
    for result in reader.records() {
        let record = result.map_err(|e| WatchlistError::Csv(e.to_string()))?;
        let id = record.get(column).unwrap_or("").trim();
        if ids.contains(id) {
            flagged_rows += 1;
            seen.insert(id.to_string());
        }
    }

    Ok(WatchlistOverlap {
        watchlist_ids: ids.len(),
        flagged_rows,
        distinct_voters: seen.len(),
    })
}
