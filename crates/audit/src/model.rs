use serde::Serialize;

// ---------------------------------------------------------------------------
// Reference side
// ---------------------------------------------------------------------------

/// Raw facility dataset as delivered by the reference collaborator:
/// a header row plus string rows. Short rows are padded with empty fields.
#[derive(Debug, Clone, Default)]
pub struct FacilityTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FacilityTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A single postal facility with its derived join keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityRecord {
    pub name: String,
    pub address: String,
    pub city: String,
    pub zip5: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(skip)]
    pub address_key: String,
    #[serde(skip)]
    pub city_key: String,
}

impl FacilityRecord {
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

// ---------------------------------------------------------------------------
// Input side
// ---------------------------------------------------------------------------

/// One voter-roll row, already mapped from its source columns.
/// Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoterRecord {
    pub source_file: String,
    pub voter_id: String,
    pub first_name: String,
    pub last_name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub zip: String,
}

// ---------------------------------------------------------------------------
// Output side
// ---------------------------------------------------------------------------

/// Which reference map produced the facility match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    FacilityStreetCity,
    FacilityStreetZip,
    PoBoxStyle,
    CommercialKeyword,
}

impl MatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FacilityStreetCity => "facility_street_city",
            Self::FacilityStreetZip => "facility_street_zip",
            Self::PoBoxStyle => "po_box_style",
            Self::CommercialKeyword => "commercial_keyword",
        }
    }
}

impl std::fmt::Display for MatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedRecord {
    pub source_file: String,
    pub voter_id: String,
    pub first_name: String,
    pub last_name: String,
    pub address_key: String,
    pub city_key: String,
    pub zip5: String,
    pub facility_match: bool,
    pub po_box_style: bool,
    pub commercial_keyword: bool,
    pub has_unit: bool,
    pub match_reason: String,
    pub facility: Option<FacilityRecord>,
}

impl ClassifiedRecord {
    /// Kept in the output iff at least one primary flag is set.
    /// `has_unit` alone never retains a record.
    pub fn is_retained(&self) -> bool {
        self.facility_match || self.po_box_style || self.commercial_keyword
    }

    /// A retained record with no apartment/suite/unit qualifier.
    pub fn is_high_priority(&self) -> bool {
        self.is_retained() && !self.has_unit
    }

    pub fn reasons(&self) -> impl Iterator<Item = &str> {
        self.match_reason.split(';').filter(|t| !t.is_empty())
    }
}
