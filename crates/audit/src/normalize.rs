//! Text normalization for join keys.
//!
//! Every address-like and city-like field goes through [`normalize`] before it
//! is used as a lookup key, on both the facility side and the voter side.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

static ZIP5_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{5}").unwrap());

/// Canonicalize free text into a stable join key.
///
/// Upper-cases, turns hyphens into spaces, drops `.`, `,` and `#`, collapses
/// whitespace runs to a single space and trims.
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_uppercase()
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | '#'))
        .map(|c| if c == '-' { ' ' } else { c })
        .collect();
    collapse_whitespace(&cleaned)
}

/// Collapse whitespace runs to a single space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First five consecutive ASCII digits anywhere in `text`, or empty.
///
/// Tolerates ZIP+4 (`43215-1234`), leading text and missing values.
pub fn extract_zip5(text: &str) -> String {
    ZIP5_RE
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// City aliases
// ---------------------------------------------------------------------------

const DEFAULT_CITY_ALIASES: &[(&str, &str)] = &[
    ("ST MARYS", "SAINT MARYS"),
    ("ST. MARYS", "SAINT MARYS"),
    ("BOARDMAN", "YOUNGSTOWN"),
    ("POLAND", "YOUNGSTOWN"),
    ("WINTERSVILLE", "STEUBENVILLE"),
];

/// Static mapping from alias city keys to the canonical city key they are
/// postally grouped under.
///
/// Both sides are normalized on construction, so `"St. Marys"` and
/// `"ST MARYS"` are the same entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityAliases {
    map: BTreeMap<String, String>,
}

impl CityAliases {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (normalize(k.as_ref()), normalize(v.as_ref())))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        Self { map }
    }

    pub fn empty() -> Self {
        Self { map: BTreeMap::new() }
    }

    /// Map an already-normalized key to its canonical form.
    pub fn resolve(&self, key: &str) -> String {
        self.map.get(key).cloned().unwrap_or_else(|| key.to_string())
    }

    /// `alias(normalize(raw))`.
    pub fn city_key(&self, raw: &str) -> String {
        self.resolve(&normalize(raw))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for CityAliases {
    fn default() -> Self {
        Self::new(DEFAULT_CITY_ALIASES.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_basic() {
        assert_eq!(normalize("100 Main St."), "100 MAIN ST");
        assert_eq!(normalize("  1200  W. Broad-St., #4 "), "1200 W BROAD ST 4");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("\t\n"), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            "100 Main St.",
            "P.O. Box 45",
            "  a-b -- c,,d##e  ",
            "Suite #200, 5th-floor",
            "ünïcödé straße",
            "",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn collapse_keeps_case_and_punctuation() {
        assert_eq!(collapse_whitespace("  12 Elm   St.\tApt 3 "), "12 Elm St. Apt 3");
    }

    #[test]
    fn zip5_extraction() {
        assert_eq!(extract_zip5("43215"), "43215");
        assert_eq!(extract_zip5("43215-1234"), "43215");
        assert_eq!(extract_zip5("OH 43215"), "43215");
        assert_eq!(extract_zip5("432151234"), "43215");
        assert_eq!(extract_zip5("4321"), "");
        assert_eq!(extract_zip5(""), "");
        assert_eq!(extract_zip5("43215.0"), "43215");
        // Non-ASCII digits never form a zip
        assert_eq!(extract_zip5("٤٣٢١٥"), "");
        assert_eq!(extract_zip5("４３２１５"), "");
    }

    #[test]
    fn default_aliases() {
        let aliases = CityAliases::default();
        assert_eq!(aliases.city_key("St. Marys"), "SAINT MARYS");
        assert_eq!(aliases.city_key("st marys"), "SAINT MARYS");
        assert_eq!(aliases.city_key("Boardman"), "YOUNGSTOWN");
        assert_eq!(aliases.city_key("Columbus"), "COLUMBUS");
        // "ST. MARYS" and "ST MARYS" collapse to one entry
        assert_eq!(aliases.len(), 4);
    }

    #[test]
    fn custom_aliases_normalize_both_sides() {
        let aliases = CityAliases::new([("Mt. Vernon", "mount vernon")]);
        assert_eq!(aliases.city_key("MT VERNON"), "MOUNT VERNON");
        assert_eq!(aliases.city_key("Boardman"), "BOARDMAN");
    }
}
