use serde::Serialize;

use crate::model::ClassifiedRecord;

/// Running totals across every file and batch of one run.
///
/// Purely additive: counters only grow while a run is in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunTally {
    pub total_flagged: usize,
    pub total_high_priority: usize,
    pub facility_matches: usize,
    pub po_box_only: usize,
    pub keyword_only: usize,
    pub facility_missing_coords: usize,
    pub records_scanned: usize,
    pub files_scanned: usize,
    pub files_skipped: usize,
}

impl RunTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one retained batch. Records that are not retained are ignored,
    /// so a caller may pass an unfiltered batch safely.
    pub fn record_batch(&mut self, batch: &[ClassifiedRecord]) {
        for record in batch.iter().filter(|r| r.is_retained()) {
            self.total_flagged += 1;
            if record.is_high_priority() {
                self.total_high_priority += 1;
            }

            if record.facility_match {
                self.facility_matches += 1;
                let has_coords = record
                    .facility
                    .as_ref()
                    .map(|f| f.has_coordinates())
                    .unwrap_or(false);
                if !has_coords {
                    self.facility_missing_coords += 1;
                }
            } else if record.po_box_style {
                self.po_box_only += 1;
            } else if record.commercial_keyword {
                self.keyword_only += 1;
            }
        }
    }

    pub fn record_scanned(&mut self, rows: usize) {
        self.records_scanned += rows;
    }

    pub fn merge(&mut self, other: &RunTally) {
        self.total_flagged += other.total_flagged;
        self.total_high_priority += other.total_high_priority;
        self.facility_matches += other.facility_matches;
        self.po_box_only += other.po_box_only;
        self.keyword_only += other.keyword_only;
        self.facility_missing_coords += other.facility_missing_coords;
        self.records_scanned += other.records_scanned;
        self.files_scanned += other.files_scanned;
        self.files_skipped += other.files_skipped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FacilityRecord;

    fn record(facility: bool, po_box: bool, commercial: bool, unit: bool) -> ClassifiedRecord {
        ClassifiedRecord {
            source_file: "f.txt".into(),
            voter_id: "1".into(),
            first_name: String::new(),
            last_name: String::new(),
            address_key: String::new(),
            city_key: String::new(),
            zip5: String::new(),
            facility_match: facility,
            po_box_style: po_box,
            commercial_keyword: commercial,
            has_unit: unit,
            match_reason: String::new(),
            facility: facility.then(|| FacilityRecord {
                name: "X".into(),
                address: "1 MAIN ST".into(),
                city: "AKRON".into(),
                zip5: "44309".into(),
                latitude: Some(41.0),
                longitude: None,
                address_key: "1 MAIN ST".into(),
                city_key: "AKRON".into(),
            }),
        }
    }

    #[test]
    fn tally_counts() {
        let mut tally = RunTally::new();
        tally.record_batch(&[
            record(true, false, false, false),
            record(true, true, false, true),
            record(false, true, true, false),
            record(false, false, true, true),
            record(false, false, false, true),
        ]);
        assert_eq!(tally.total_flagged, 4);
        assert_eq!(tally.total_high_priority, 2);
        assert_eq!(tally.facility_matches, 2);
        assert_eq!(tally.facility_missing_coords, 2);
        assert_eq!(tally.po_box_only, 1);
        assert_eq!(tally.keyword_only, 1);
    }

    #[test]
    fn tally_is_additive_across_batches() {
        let batch = [record(false, true, false, false), record(false, false, true, true)];

        let mut whole = RunTally::new();
        whole.record_batch(&batch);

        let mut split = RunTally::new();
        split.record_batch(&batch[..1]);
        split.record_batch(&batch[1..]);
        assert_eq!(whole, split);

        let mut merged = RunTally::new();
        merged.merge(&whole);
        merged.merge(&split);
        assert_eq!(merged.total_flagged, 4);
        assert_eq!(merged.total_high_priority, 2);
    }
}
