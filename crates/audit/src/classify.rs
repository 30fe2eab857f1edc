//! Record classification.
//!
//! A voter record is looked up in the facility index (city key first, then
//! ZIP5), scanned for PO-Box / commercial-drop / unit vocabulary, and given a
//! reason string whose token order never depends on detection order.
//!
//! When the full address key misses, the street part in front of the first
//! unit designator is looked up the same way, so `122 N Depeyster St Apt 4`
//! still lands on the station at `122 N DEPEYSTER ST`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{ClassifiedRecord, FacilityRecord, MatchReason, VoterRecord};
use crate::normalize::{collapse_whitespace, extract_zip5, normalize};
use crate::reference::FacilityIndex;

static PO_BOX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:P\.?\s*O\.?\s*BOX|PO\s*BOX|P\s*O\s*BOX|POST\s+OFFICE\s+BOX)\b").unwrap()
});

static COMMERCIAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:PMB|UPS\s*STORE|MAIL\s*(?:CENTER|CTR)|USPS|POST\s*OFFICE)\b").unwrap()
});

static UNIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:\b(?:APT|UNIT|STE|SUITE)\b|#)").unwrap());

/// First unit designator and everything after it.
static UNIT_TAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:\b(?:APT|UNIT|STE|SUITE)\b|#).*$").unwrap());

/// Lexical flags computed from the joined (un-normalized) address text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexicalFlags {
    pub po_box_style: bool,
    pub commercial_keyword: bool,
    pub has_unit: bool,
}

pub fn lexical_flags(addr: &str) -> LexicalFlags {
    LexicalFlags {
        po_box_style: PO_BOX_RE.is_match(addr),
        commercial_keyword: COMMERCIAL_RE.is_match(addr),
        has_unit: UNIT_RE.is_match(addr),
    }
}

/// Address line 1 plus line 2 (when present), whitespace-collapsed.
pub fn joined_address(record: &VoterRecord) -> String {
    match record.address_line2.as_deref() {
        Some(line2) => collapse_whitespace(&format!("{} {}", record.address_line1, line2)),
        None => record.address_line1.clone(),
    }
}

/// Normalized street key with any trailing unit designator removed, or
/// `None` when the address names no unit or nothing precedes the unit.
pub fn street_key(addr: &str) -> Option<String> {
    let unit = UNIT_TAIL_RE.find(addr)?;
    let key = normalize(&addr[..unit.start()]);
    (!key.is_empty()).then_some(key)
}

/// City-first facility lookup. A city agreement is stronger evidence than a
/// ZIP5 agreement, so the ZIP map is only consulted when the city map misses.
pub fn match_facility<'a>(
    index: &'a FacilityIndex,
    address_key: &str,
    city_key: &str,
    zip5: &str,
) -> Option<(MatchReason, &'a FacilityRecord)> {
    if address_key.is_empty() {
        return None;
    }
    if let Some(hit) = index.lookup_city(address_key, city_key) {
        return Some((MatchReason::FacilityStreetCity, hit));
    }
    index
        .lookup_zip(address_key, zip5)
        .map(|hit| (MatchReason::FacilityStreetZip, hit))
}

/// Assemble the `;`-joined reason string.
///
/// Primary reason is the facility token, else PO-Box, else commercial; any
/// other set flags follow in the fixed order facility, po_box, commercial.
pub fn assemble_reason(
    facility: Option<MatchReason>,
    po_box_style: bool,
    commercial_keyword: bool,
) -> String {
    let mut tokens: Vec<&'static str> = Vec::with_capacity(3);
    if let Some(reason) = facility {
        tokens.push(reason.as_str());
    }
    if po_box_style {
        tokens.push(MatchReason::PoBoxStyle.as_str());
    }
    if commercial_keyword {
        tokens.push(MatchReason::CommercialKeyword.as_str());
    }
    tokens.join(";")
}

/// Classify a single record. Never fails; missing fields behave as empty.
pub fn classify(record: &VoterRecord, index: &FacilityIndex) -> ClassifiedRecord {
    let addr = joined_address(record);
    let address_key = normalize(&addr);
    let city_key = index.aliases().city_key(&record.city);
    let zip5 = extract_zip5(&record.zip);

    // Exact key first; a unit-qualified address falls back to its street.
    let matched = match_facility(index, &address_key, &city_key, &zip5).or_else(|| {
        street_key(&addr).and_then(|street| match_facility(index, &street, &city_key, &zip5))
    });
    let flags = lexical_flags(&addr);

    let match_reason = assemble_reason(
        matched.map(|(reason, _)| reason),
        flags.po_box_style,
        flags.commercial_keyword,
    );

    ClassifiedRecord {
        source_file: record.source_file.clone(),
        voter_id: record.voter_id.clone(),
        first_name: record.first_name.clone(),
        last_name: record.last_name.clone(),
        address_key,
        city_key,
        zip5,
        facility_match: matched.is_some(),
        po_box_style: flags.po_box_style,
        commercial_keyword: flags.commercial_keyword,
        has_unit: flags.has_unit,
        match_reason,
        facility: matched.map(|(_, facility)| facility.clone()),
    }
}

/// Classify a batch and keep only retained records, in input order.
pub fn classify_batch(records: &[VoterRecord], index: &FacilityIndex) -> Vec<ClassifiedRecord> {
    records
        .iter()
        .map(|r| classify(r, index))
        .filter(|c| c.is_retained())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
