//! Run driver.
//!
//! Discovers voter files, scans them in name order against a prebuilt
//! facility index, appends every retained batch to one output file and keeps
//! the run tally. A file that cannot be scanned is skipped; only reference,
//! discovery and output failures stop a run.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use poaudit_audit::{AuditConfig, FacilityIndex, RunTally};

use crate::discover::discover_voter_files;
use crate::error::{PipelineError, ScanError};
use crate::output::FlaggedWriter;
use crate::scanner::{scan, ScanOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Scanned,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    pub status: FileStatus,
    pub rows_read: usize,
    pub rows_flagged: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub tally: RunTally,
    pub files: Vec<FileReport>,
}

/// Scan every discovered voter file and write the flagged output.
///
/// The output file is created (header only) before the first file is read,
/// so a run that flags nothing still leaves a valid, empty table.
pub fn run(config: &AuditConfig, index: &FacilityIndex) -> Result<RunSummary, PipelineError> {
    let options = ScanOptions::from_config(&config.input)?;
    let files = discover_voter_files(&config.input)?;
    if files.is_empty() {
        return Err(PipelineError::NoInputFiles {
            dir: config.input.data_dir.display().to_string(),
            pattern: config.input.file_pattern.clone(),
        });
    }

    info!(
        "Found {} voter file(s) in {}",
        files.len(),
        config.input.data_dir.display()
    );

    let output_path = config.output_path();
    let mut writer = FlaggedWriter::create(&output_path)?;
    let mut tally = RunTally::new();
    let mut reports = Vec::with_capacity(files.len());

    for path in &files {
        let mut file_tally = RunTally::new();
        let display = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        info!("Scanning {}", display);
        let FileScan { rows_read, error } =
            scan_file(path, index, &options, &mut writer, &mut file_tally)?;
        file_tally.record_scanned(rows_read);

        let report = match error {
            None => {
                file_tally.files_scanned += 1;
                info!(
                    "{}: {} rows, {} flagged ({} high priority)",
                    display, rows_read, file_tally.total_flagged, file_tally.total_high_priority
                );
                FileReport {
                    file: display,
                    status: FileStatus::Scanned,
                    rows_read,
                    rows_flagged: file_tally.total_flagged,
                    error: None,
                }
            }
            Some(e) => {
                file_tally.files_skipped += 1;
                warn!("Skipping {}", e);
                FileReport {
                    file: display,
                    status: FileStatus::Skipped,
                    rows_read,
                    rows_flagged: file_tally.total_flagged,
                    error: Some(e.to_string()),
                }
            }
        };

        tally.merge(&file_tally);
        reports.push(report);
    }

    info!(
        "Run complete: {} flagged, {} high priority, {} file(s) skipped -> {}",
        tally.total_flagged,
        tally.total_high_priority,
        tally.files_skipped,
        output_path.display()
    );

    Ok(RunSummary {
        output_path,
        tally,
        files: reports,
    })
}

/// What one file contributed before it finished or was skipped.
struct FileScan {
    rows_read: usize,
    /// The skippable error that stopped the file, if any.
    error: Option<ScanError>,
}

/// Stream one file into the writer. Only output failures are returned as
/// errors; batches appended before a scan error stay in the output and in
/// the tally.
fn scan_file(
    path: &Path,
    index: &FacilityIndex,
    options: &ScanOptions,
    writer: &mut FlaggedWriter,
    tally: &mut RunTally,
) -> Result<FileScan, PipelineError> {
    let mut batches = match scan(path, index, options) {
        Ok(batches) => batches,
        Err(e) => {
            return Ok(FileScan {
                rows_read: 0,
                error: Some(e),
            })
        }
    };

    while let Some(batch) = batches.next() {
        let batch = match batch {
            Ok(batch) => batch,
            Err(e) => {
                return Ok(FileScan {
                    rows_read: batches.rows_read(),
                    error: Some(e),
                })
            }
        };
        writer.write_batch(&batch)?;
        tally.record_batch(&batch);
        debug!(
            "{}: {} rows so far, {} written",
            batches.file_name(),
            batches.rows_read(),
            writer.rows_written()
        );
    }

    Ok(FileScan {
        rows_read: batches.rows_read(),
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use poaudit_audit::config::FacilityColumns;
    use poaudit_audit::{CityAliases, FacilityTable};
    use std::fs;
    use tempfile::tempdir;

    const HEADER: &str =
        "SOS_VOTERID,FIRST_NAME,LAST_NAME,RESIDENTIAL_ADDRESS1,RESIDENTIAL_CITY,RESIDENTIAL_ZIP\n";

    fn empty_index() -> FacilityIndex {
        let table = FacilityTable::new(vec!["po_address".into(), "po_city".into()], vec![]);
        FacilityIndex::build(&table, &FacilityColumns::default(), CityAliases::default()).unwrap()
    }

    fn scan_into(path: &Path, options: &ScanOptions) -> (FileScan, RunTally, usize) {
        let dir = tempdir().unwrap();
        let mut writer = FlaggedWriter::create(&dir.path().join("out.csv")).unwrap();
        let mut tally = RunTally::new();
        let outcome = scan_file(path, &empty_index(), options, &mut writer, &mut tally).unwrap();
        (outcome, tally, writer.rows_written())
    }

    #[test]
    fn test_complete_file_reports_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("SWVF_1.csv");
        fs::write(&path, format!("{HEADER}OH1,A,B,PO BOX 1,KENT,44240\nOH2,A,B,7 OAK AVE,KENT,44240\n")).unwrap();

        let (outcome, tally, written) = scan_into(&path, &ScanOptions::default());
        assert_eq!(outcome.rows_read, 2);
        assert!(outcome.error.is_none());
        assert_eq!(tally.total_flagged, 1);
        assert_eq!(written, 1);
    }

    #[test]
    fn test_header_failure_reads_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("SWVF_2.csv");
        fs::write(&path, "SOS_VOTERID,FIRST_NAME\nOH1,A\n").unwrap();

        let (outcome, tally, written) = scan_into(&path, &ScanOptions::default());
        assert_eq!(outcome.rows_read, 0);
        assert!(matches!(outcome.error, Some(ScanError::MissingColumns { .. })));
        assert_eq!(tally, RunTally::new());
        assert_eq!(written, 0);
    }

    #[test]
    fn test_decode_failure_keeps_rows_of_earlier_batches() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("SWVF_3.csv");
        let mut body = HEADER.as_bytes().to_vec();
        body.extend_from_slice(b"OH1,A,B,PO BOX 1,KENT,44240\n");
        body.extend_from_slice(b"OH2,\xFF,B,PO BOX 2,KENT,44240\n");
        fs::write(&path, body).unwrap();

        let options = ScanOptions {
            encoding: encoding_rs::UTF_8,
            batch_size: 1,
            ..ScanOptions::default()
        };
        let (outcome, tally, written) = scan_into(&path, &options);
        assert_eq!(outcome.rows_read, 1);
        assert!(matches!(outcome.error, Some(ScanError::Decode { line: 3, .. })));
        assert_eq!(tally.total_flagged, 1);
        assert_eq!(written, 1);
    }
}
