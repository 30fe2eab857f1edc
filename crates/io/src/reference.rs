// Cached facility table loading

use std::path::Path;

use log::info;

use poaudit_audit::{AuditConfig, FacilityIndex, FacilityTable};

use crate::csv::{read_file_as_utf8, sniff_delimiter};
use crate::error::PipelineError;

/// Read a delimited facility table into memory. Short rows are padded with
/// empty fields.
pub fn load_facility_table(path: &Path) -> Result<FacilityTable, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);

    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        let mut row: Vec<String> = record.iter().map(String::from).collect();
        if row.len() < headers.len() {
            row.resize(headers.len(), String::new());
        }
        rows.push(row);
    }

    Ok(FacilityTable::new(headers, rows))
}

/// Load the cached facility table named by `reference.file` and build the
/// lookup index with the configured alias table.
pub fn load_reference(config: &AuditConfig) -> Result<FacilityIndex, PipelineError> {
    let path = config.reference_path();
    let table = load_facility_table(&path)
        .map_err(|e| PipelineError::Reference(format!("{}: {}", path.display(), e)))?;

    let index = FacilityIndex::build(&table, &config.reference.columns, config.city_aliases())
        .map_err(|e| PipelineError::Reference(format!("{}: {}", path.display(), e)))?;

    info!(
        "Loaded {} facility rows from {} ({} street+city keys, {} street+zip keys)",
        index.source_rows(),
        path.display(),
        index.len_by_city(),
        index.len_by_zip()
    );
    Ok(index)
}
