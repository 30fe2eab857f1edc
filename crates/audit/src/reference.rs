//! Facility reference index.
//!
//! Two read-only lookup maps built from the same facility table:
//! `(address_key, city_key)` and `(address_key, zip5)`, each nested by
//! address key so lookups borrow the caller's keys. When several rows
//! collide on a key, the row with the smallest `name` is kept.

use std::cmp::Ordering;
use std::collections::HashMap;

use log::debug;

use crate::config::FacilityColumns;
use crate::error::AuditError;
use crate::model::{FacilityRecord, FacilityTable};
use crate::normalize::{extract_zip5, normalize, CityAliases};

/// address_key -> (city_key | zip5) -> preferred facility
type KeyedFacilities = HashMap<String, HashMap<String, FacilityRecord>>;

#[derive(Debug, Clone)]
pub struct FacilityIndex {
    by_city: KeyedFacilities,
    by_zip: KeyedFacilities,
    aliases: CityAliases,
    source_rows: usize,
}

impl FacilityIndex {
    /// Build both maps from a raw facility table.
    ///
    /// Fails only when the address or city column is absent. Missing name,
    /// zip or coordinate columns yield empty values.
    pub fn build(
        table: &FacilityTable,
        columns: &FacilityColumns,
        aliases: CityAliases,
    ) -> Result<Self, AuditError> {
        let required = |name: &str| -> Result<usize, AuditError> {
            table
                .column_index(name)
                .ok_or_else(|| AuditError::ReferenceData { column: name.into() })
        };

        let address_idx = required(&columns.address)?;
        let city_idx = required(&columns.city)?;
        let name_idx = table.column_index(&columns.name);
        let zip_idx = table.column_index(&columns.zip);
        let lat_idx = table.column_index(&columns.latitude);
        let lon_idx = table.column_index(&columns.longitude);

        let mut facilities = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let address = cell(row, Some(address_idx));
            let city = cell(row, Some(city_idx));
            let address_key = normalize(address);
            if address_key.is_empty() {
                continue;
            }

            facilities.push(FacilityRecord {
                name: cell(row, name_idx).trim().to_string(),
                address: address.trim().to_string(),
                city: city.trim().to_string(),
                zip5: extract_zip5(cell(row, zip_idx)),
                latitude: parse_coordinate(cell(row, lat_idx)),
                longitude: parse_coordinate(cell(row, lon_idx)),
                city_key: aliases.city_key(city),
                address_key,
            });
        }

        let mut by_city = KeyedFacilities::new();
        let mut by_zip = KeyedFacilities::new();
        let mut collisions = 0usize;

        for facility in facilities {
            let address_key = facility.address_key.clone();
            let city_key = facility.city_key.clone();
            let zip5 = facility.zip5.clone();
            collisions +=
                keep_preferred(&mut by_city, &address_key, &city_key, facility.clone()) as usize;
            collisions += keep_preferred(&mut by_zip, &address_key, &zip5, facility) as usize;
        }

        let index = Self {
            by_city,
            by_zip,
            aliases,
            source_rows: table.rows.len(),
        };
        debug!(
            "facility index: {} rows -> {} city keys, {} zip keys ({} collisions)",
            index.source_rows,
            index.len_by_city(),
            index.len_by_zip(),
            collisions
        );
        Ok(index)
    }

    pub fn lookup_city(&self, address_key: &str, city_key: &str) -> Option<&FacilityRecord> {
        self.by_city.get(address_key)?.get(city_key)
    }

    pub fn lookup_zip(&self, address_key: &str, zip5: &str) -> Option<&FacilityRecord> {
        self.by_zip.get(address_key)?.get(zip5)
    }

    /// The alias table applied to facility cities; classification must use
    /// the same one so keys agree.
    pub fn aliases(&self) -> &CityAliases {
        &self.aliases
    }

    pub fn len_by_city(&self) -> usize {
        self.by_city.values().map(HashMap::len).sum()
    }

    pub fn len_by_zip(&self) -> usize {
        self.by_zip.values().map(HashMap::len).sum()
    }

    pub fn source_rows(&self) -> usize {
        self.source_rows
    }

    pub fn is_empty(&self) -> bool {
        self.by_city.is_empty() && self.by_zip.is_empty()
    }
}

/// Insert `candidate` unless the slot already holds a record that sorts
/// first. Returns true when the key was already occupied.
fn keep_preferred(
    map: &mut KeyedFacilities,
    address_key: &str,
    second_key: &str,
    candidate: FacilityRecord,
) -> bool {
    let slots = map.entry(address_key.to_string()).or_default();
    match slots.get_mut(second_key) {
        Some(existing) => {
            if facility_order(&candidate, existing) == Ordering::Less {
                *existing = candidate;
            }
            true
        }
        None => {
            slots.insert(second_key.to_string(), candidate);
            false
        }
    }
}

/// Smallest name wins; remaining fields break exact name ties so the
/// outcome never depends on row order.
fn facility_order(a: &FacilityRecord, b: &FacilityRecord) -> Ordering {
    a.name
        .cmp(&b.name)
        .then_with(|| a.address.cmp(&b.address))
        .then_with(|| a.city.cmp(&b.city))
        .then_with(|| a.zip5.cmp(&b.zip5))
        .then_with(|| cmp_coordinate(a.latitude, b.latitude))
        .then_with(|| cmp_coordinate(a.longitude, b.longitude))
}

fn cmp_coordinate(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn cell(row: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i)).map(|s| s.as_str()).unwrap_or("")
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
