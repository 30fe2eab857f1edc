// Flagged-address output sink

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use ::csv::{Writer, WriterBuilder};

use poaudit_audit::ClassifiedRecord;

use crate::error::PipelineError;

pub const OUTPUT_HEADERS: [&str; 18] = [
    "source_file",
    "voter_id",
    "first_name",
    "last_name",
    "addr",
    "city",
    "zip5",
    "flag_facility_street_match",
    "flag_po_box_style",
    "flag_commercial_keyword",
    "match_reason",
    "po_name",
    "po_address",
    "po_city",
    "po_zip5",
    "po_lat",
    "po_long",
    "has_unit",
];

/// Single output file for a whole run. The header is written once at
/// creation; every batch is appended and flushed.
pub struct FlaggedWriter {
    path: PathBuf,
    writer: Writer<File>,
    rows_written: usize,
}

impl FlaggedWriter {
    /// Create (or truncate) `path`, creating parent directories as needed.
    pub fn create(path: &Path) -> Result<Self, PipelineError> {
        let fail = |e: &dyn std::fmt::Display| {
            PipelineError::Output(format!("{}: {}", path.display(), e))
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| fail(&e))?;
        }

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|e| fail(&e))?;
        writer.write_record(OUTPUT_HEADERS).map_err(|e| fail(&e))?;
        writer.flush().map_err(|e| fail(&e))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows_written: 0,
        })
    }

    pub fn write_batch(&mut self, batch: &[ClassifiedRecord]) -> Result<(), PipelineError> {
        for record in batch {
            self.writer
                .write_record(render_row(record))
                .map_err(|e| self.error(&e))?;
        }
        self.writer.flush().map_err(|e| self.error(&e))?;
        self.rows_written += batch.len();
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    fn error(&self, e: &dyn std::fmt::Display) -> PipelineError {
        PipelineError::Output(format!("{}: {}", self.path.display(), e))
    }
}

fn render_row(record: &ClassifiedRecord) -> [String; 18] {
    let facility = record.facility.as_ref();
    let text = |value: Option<&String>| value.cloned().unwrap_or_default();
    let coord = |v: Option<f64>| v.map(|c| c.to_string()).unwrap_or_default();

    [
        record.source_file.clone(),
        record.voter_id.clone(),
        record.first_name.clone(),
        record.last_name.clone(),
        record.address_key.clone(),
        record.city_key.clone(),
        record.zip5.clone(),
        record.facility_match.to_string(),
        record.po_box_style.to_string(),
        record.commercial_keyword.to_string(),
        record.match_reason.clone(),
        text(facility.map(|p| &p.name)),
        text(facility.map(|p| &p.address)),
        text(facility.map(|p| &p.city)),
        text(facility.map(|p| &p.zip5)),
        coord(facility.and_then(|p| p.latitude)),
        coord(facility.and_then(|p| p.longitude)),
        record.has_unit.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use poaudit_audit::FacilityRecord;
    use tempfile::tempdir;

    fn flagged(voter_id: &str, facility: Option<FacilityRecord>) -> ClassifiedRecord {
        ClassifiedRecord {
            source_file: "SWVF_1_22.txt".into(),
            voter_id: voter_id.into(),
            first_name: "ANN".into(),
            last_name: "LEE".into(),
            address_key: "100 MAIN ST".into(),
            city_key: "SPRINGFIELD".into(),
            zip5: "45501".into(),
            facility_match: facility.is_some(),
            po_box_style: facility.is_none(),
            commercial_keyword: false,
            has_unit: false,
            match_reason: if facility.is_some() {
                "facility_street_city".into()
            } else {
                "po_box_style".into()
            },
            facility,
        }
    }

    fn station() -> FacilityRecord {
        FacilityRecord {
            name: "SPRINGFIELD MAIN".into(),
            address: "100 MAIN ST".into(),
            city: "SPRINGFIELD".into(),
            zip5: "45501".into(),
            latitude: Some(39.92),
            longitude: None,
            address_key: "100 MAIN ST".into(),
            city_key: "SPRINGFIELD".into(),
        }
    }

    #[test]
    fn test_header_written_on_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out/flagged.csv");
        let writer = FlaggedWriter::create(&path).unwrap();
        assert_eq!(writer.rows_written(), 0);
        drop(writer);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, format!("{}\n", OUTPUT_HEADERS.join(",")));
    }

    #[test]
    fn test_rows_render_flags_and_facility_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flagged.csv");
        let mut writer = FlaggedWriter::create(&path).unwrap();
        writer
            .write_batch(&[flagged("OH1", Some(station())), flagged("OH2", None)])
            .unwrap();
        assert_eq!(writer.rows_written(), 2);
        drop(writer);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "SWVF_1_22.txt,OH1,ANN,LEE,100 MAIN ST,SPRINGFIELD,45501,true,false,false,\
             facility_street_city,SPRINGFIELD MAIN,100 MAIN ST,SPRINGFIELD,45501,39.92,,false"
        );
        assert_eq!(
            lines[2],
            "SWVF_1_22.txt,OH2,ANN,LEE,100 MAIN ST,SPRINGFIELD,45501,false,true,false,\
             po_box_style,,,,,,,false"
        );
    }

    #[test]
    fn test_create_truncates_previous_run() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flagged.csv");
        fs::write(&path, "stale\n").unwrap();
        FlaggedWriter::create(&path).unwrap();
        assert!(!fs::read_to_string(&path).unwrap().contains("stale"));
    }
}
