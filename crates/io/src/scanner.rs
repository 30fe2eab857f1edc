//! Streaming voter-file scanner.
//!
//! A file is read in batches of `batch_size` rows. Each batch is decoded,
//! classified against the facility index and filtered to retained records
//! before the next batch is read, so memory stays bounded by the batch size.

use std::fs::File;
use std::path::Path;

use ::csv::{ByteRecord, Reader, ReaderBuilder};
use encoding_rs::Encoding;
use log::debug;

use poaudit_audit::config::{InputConfig, VoterColumns};
use poaudit_audit::{classify_batch, ClassifiedRecord, FacilityIndex, VoterRecord};

use crate::csv::{decode_field, decode_header, detect_delimiter, resolve_encoding};
use crate::error::{PipelineError, ScanError};

/// Per-run scanning parameters, resolved once from config.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub columns: VoterColumns,
    pub encoding: &'static Encoding,
    pub batch_size: usize,
}

impl ScanOptions {
    pub fn from_config(input: &InputConfig) -> Result<Self, PipelineError> {
        let encoding = resolve_encoding(&input.encoding).ok_or_else(|| {
            PipelineError::Config(format!("unknown encoding label '{}'", input.encoding))
        })?;
        Ok(Self {
            columns: input.columns.clone(),
            encoding,
            batch_size: input.batch_size.max(1),
        })
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            columns: VoterColumns::default(),
            encoding: encoding_rs::WINDOWS_1252,
            batch_size: 100_000,
        }
    }
}

/// Header positions of the columns the classifier reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    voter_id: usize,
    first_name: usize,
    last_name: usize,
    address_line1: usize,
    address_line2: Option<usize>,
    city: usize,
    zip: usize,
}

impl ColumnLayout {
    /// Locate every required column; on failure return the missing names in
    /// required-column order.
    fn resolve(headers: &[String], columns: &VoterColumns) -> Result<Self, Vec<String>> {
        let position = |name: &str| headers.iter().position(|h| h == name);

        let missing: Vec<String> = columns
            .required()
            .iter()
            .filter(|name| position(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }

        let find = |name: &str| position(name).unwrap_or_default();
        Ok(Self {
            voter_id: find(&columns.voter_id),
            first_name: find(&columns.first_name),
            last_name: find(&columns.last_name),
            address_line1: find(&columns.address_line1),
            address_line2: columns.address_line2.iter().find_map(|name| position(name)),
            city: find(&columns.city),
            zip: find(&columns.zip),
        })
    }
}

/// Lazy batch iterator over one voter file.
///
/// Yields one `Ok(batch)` per input batch, holding only the retained
/// records (possibly none). The first error ends the iteration.
pub struct VoterScan<'a> {
    file: String,
    reader: Reader<File>,
    layout: ColumnLayout,
    index: &'a FacilityIndex,
    encoding: &'static Encoding,
    batch_size: usize,
    delimiter: u8,
    record: ByteRecord,
    rows_read: usize,
    batches: usize,
    done: bool,
}

/// Open `path`, sniff its delimiter and validate its header.
///
/// Fails with `ScanError::MissingColumns` before any row is read when a
/// required column is absent.
pub fn scan<'a>(
    path: &Path,
    index: &'a FacilityIndex,
    options: &ScanOptions,
) -> Result<VoterScan<'a>, ScanError> {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let delimiter = detect_delimiter(path, options.encoding).map_err(|e| ScanError::Io {
        file: file.clone(),
        message: e.to_string(),
    })?;

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| ScanError::Io {
            file: file.clone(),
            message: e.to_string(),
        })?;

    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|e| ScanError::Csv {
            file: file.clone(),
            message: e.to_string(),
        })?
        .iter()
        .map(|cell| decode_header(cell, options.encoding))
        .collect();

    let layout = ColumnLayout::resolve(&headers, &options.columns).map_err(|missing| {
        ScanError::MissingColumns {
            file: file.clone(),
            missing,
        }
    })?;

    debug!(
        "{}: delimiter {:?}, {} columns, address line 2 {}",
        file,
        delimiter as char,
        headers.len(),
        if layout.address_line2.is_some() { "present" } else { "absent" }
    );

    Ok(VoterScan {
        file,
        reader,
        layout,
        index,
        encoding: options.encoding,
        batch_size: options.batch_size.max(1),
        delimiter,
        record: ByteRecord::new(),
        rows_read: 0,
        batches: 0,
        done: false,
    })
}

impl<'a> VoterScan<'a> {
    /// Display name used in output rows and reports.
    pub fn file_name(&self) -> &str {
        &self.file
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Data rows consumed by the batches yielded so far.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    fn field(&self, idx: usize) -> Result<String, ScanError> {
        let bytes = self.record.get(idx).unwrap_or(b"");
        decode_field(bytes, self.encoding)
            .map(|s| s.into_owned())
            .ok_or_else(|| ScanError::Decode {
                file: self.file.clone(),
                line: self.record.position().map(|p| p.line()).unwrap_or(0),
            })
    }

    fn current_record(&self) -> Result<VoterRecord, ScanError> {
        let layout = self.layout;
        Ok(VoterRecord {
            source_file: self.file.clone(),
            voter_id: self.field(layout.voter_id)?,
            first_name: self.field(layout.first_name)?,
            last_name: self.field(layout.last_name)?,
            address_line1: self.field(layout.address_line1)?,
            address_line2: layout.address_line2.map(|idx| self.field(idx)).transpose()?,
            city: self.field(layout.city)?,
            zip: self.field(layout.zip)?,
        })
    }
}

impl<'a> Iterator for VoterScan<'a> {
    type Item = Result<Vec<ClassifiedRecord>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut batch = Vec::with_capacity(self.batch_size.min(8192));
        while batch.len() < self.batch_size {
            match self.reader.read_byte_record(&mut self.record) {
                Ok(true) => match self.current_record() {
                    Ok(record) => batch.push(record),
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                },
                Ok(false) => {
                    self.done = true;
                    break;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(ScanError::Csv {
                        file: self.file.clone(),
                        message: e.to_string(),
                    }));
                }
            }
        }

        if batch.is_empty() {
            return None;
        }

        self.rows_read += batch.len();
        self.batches += 1;
        let retained = classify_batch(&batch, self.index);
        debug!(
            "{}: batch {} ({} rows) -> {} retained",
            self.file,
            self.batches,
            batch.len(),
            retained.len()
        );
        Some(Ok(retained))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
