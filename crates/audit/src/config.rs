use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use serde::Deserialize;

use crate::error::AuditError;
use crate::normalize::CityAliases;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub watchlist: WatchlistConfig,
    /// Replaces the built-in alias table when present.
    #[serde(default)]
    pub city_aliases: Option<BTreeMap<String, String>>,
}

fn default_state() -> String {
    "OH".into()
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            state: default_state(),
            input: InputConfig::default(),
            output: OutputConfig::default(),
            reference: ReferenceConfig::default(),
            watchlist: WatchlistConfig::default(),
            city_aliases: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub data_dir: PathBuf,
    /// Glob matched against file names (not paths).
    pub file_pattern: String,
    /// Accepted extensions, compared case-insensitively.
    pub extensions: Vec<String>,
    pub encoding: String,
    pub batch_size: usize,
    pub columns: VoterColumns,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            file_pattern: "SWVF_*".into(),
            extensions: vec!["csv".into(), "txt".into()],
            encoding: "iso-8859-1".into(),
            batch_size: 100_000,
            columns: VoterColumns::default(),
        }
    }
}

/// Header names for the voter-file columns the scanner needs.
/// Matching is exact and case-sensitive.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VoterColumns {
    pub voter_id: String,
    pub first_name: String,
    pub last_name: String,
    pub address_line1: String,
    /// Accepted names for the optional second address line; first present wins.
    pub address_line2: Vec<String>,
    pub city: String,
    pub zip: String,
}

impl Default for VoterColumns {
    fn default() -> Self {
        Self {
            voter_id: "SOS_VOTERID".into(),
            first_name: "FIRST_NAME".into(),
            last_name: "LAST_NAME".into(),
            address_line1: "RESIDENTIAL_ADDRESS1".into(),
            address_line2: vec![
                "RESIDENTIAL_ADDRESS2".into(),
                "RESIDENTIAL_SECONDARY_ADDR".into(),
                "RESIDENTIAL_SECONDARY_ADDRESS".into(),
            ],
            city: "RESIDENTIAL_CITY".into(),
            zip: "RESIDENTIAL_ZIP".into(),
        }
    }
}

impl VoterColumns {
    /// The six columns a file must carry to be scanned.
    pub fn required(&self) -> [&str; 6] {
        [
            &self.address_line1,
            &self.city,
            &self.zip,
            &self.voter_id,
            &self.first_name,
            &self.last_name,
        ]
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            file: "flagged_voter_addresses.csv".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reference + Watchlist
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReferenceConfig {
    /// Cached facility table. Relative paths resolve against `input.data_dir`.
    pub file: PathBuf,
    pub columns: FacilityColumns,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("usps_facilities.csv"),
            columns: FacilityColumns::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FacilityColumns {
    pub name: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub latitude: String,
    pub longitude: String,
}

impl Default for FacilityColumns {
    fn default() -> Self {
        Self {
            name: "po_name".into(),
            address: "po_address".into(),
            city: "po_city".into(),
            zip: "po_zip5".into(),
            latitude: "po_lat".into(),
            longitude: "po_long".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchlistConfig {
    pub enabled: bool,
    /// Cached id table. Relative paths resolve against `output.dir`.
    pub file: PathBuf,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: PathBuf::from("ovc_voter_ids.csv"),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl AuditConfig {
    pub fn from_toml(input: &str) -> Result<Self, AuditError> {
        let config: AuditConfig =
            toml::from_str(input).map_err(|e| AuditError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AuditError> {
        if self.input.batch_size == 0 {
            return Err(AuditError::ConfigValidation(
                "input.batch_size must be at least 1".into(),
            ));
        }

        if self.input.file_pattern.trim().is_empty() {
            return Err(AuditError::ConfigValidation(
                "input.file_pattern must not be empty".into(),
            ));
        }

        if self.input.extensions.is_empty() {
            return Err(AuditError::ConfigValidation(
                "input.extensions must list at least one extension".into(),
            ));
        }

        // Any WHATWG label encoding_rs resolves; the IO layer uses the same lookup.
        if Encoding::for_label(self.input.encoding.trim().as_bytes()).is_none() {
            return Err(AuditError::ConfigValidation(format!(
                "input.encoding '{}' is not supported",
                self.input.encoding
            )));
        }

        for name in self.input.columns.required() {
            if name.trim().is_empty() {
                return Err(AuditError::ConfigValidation(
                    "input.columns: required column names must not be empty".into(),
                ));
            }
        }

        let facility = &self.reference.columns;
        if facility.address.trim().is_empty() || facility.city.trim().is_empty() {
            return Err(AuditError::ConfigValidation(
                "reference.columns: address and city column names must not be empty".into(),
            ));
        }

        if self.output.file.trim().is_empty() {
            return Err(AuditError::ConfigValidation(
                "output.file must not be empty".into(),
            ));
        }

        Ok(())
    }

    pub fn city_aliases(&self) -> CityAliases {
        match &self.city_aliases {
            Some(map) => CityAliases::new(map.iter()),
            None => CityAliases::default(),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output.dir.join(&self.output.file)
    }

    pub fn reference_path(&self) -> PathBuf {
        resolve(&self.input.data_dir, &self.reference.file)
    }

    pub fn watchlist_path(&self) -> PathBuf {
        resolve(&self.output.dir, &self.watchlist.file)
    }
}

fn resolve(base: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        base.join(file)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
state = "OH"

[input]
data_dir = "/srv/swvf"
file_pattern = "SWVF_*"
extensions = ["csv", "txt"]
encoding = "iso-8859-1"
batch_size = 5000

[input.columns]
voter_id = "VOTER_ID"

[output]
dir = "/srv/out"
file = "flagged.csv"

[reference]
file = "facilities.csv"

[reference.columns]
name = "LOCALE_NAME"

[watchlist]
enabled = false
file = "/tmp/ids.csv"

[city_aliases]
"ST MARYS" = "SAINT MARYS"
"#;

    #[test]
    fn parse_full() {
        let config = AuditConfig::from_toml(FULL).unwrap();
        assert_eq!(config.state, "OH");
        assert_eq!(config.input.batch_size, 5000);
        assert_eq!(config.input.columns.voter_id, "VOTER_ID");
        // Unspecified column names keep their defaults
        assert_eq!(config.input.columns.city, "RESIDENTIAL_CITY");
        assert_eq!(config.input.columns.address_line2.len(), 3);
        assert_eq!(config.reference.columns.name, "LOCALE_NAME");
        assert_eq!(config.reference.columns.address, "po_address");
        assert!(!config.watchlist.enabled);

        assert_eq!(config.output_path(), PathBuf::from("/srv/out/flagged.csv"));
        assert_eq!(config.reference_path(), PathBuf::from("/srv/swvf/facilities.csv"));
        assert_eq!(config.watchlist_path(), PathBuf::from("/tmp/ids.csv"));

        let aliases = config.city_aliases();
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases.city_key("Boardman"), "BOARDMAN");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = AuditConfig::from_toml("").unwrap();
        assert_eq!(config.input.data_dir, PathBuf::from("data"));
        assert_eq!(config.input.batch_size, 100_000);
        assert_eq!(config.input.encoding, "iso-8859-1");
        assert_eq!(
            config.output_path(),
            PathBuf::from("output/flagged_voter_addresses.csv")
        );
        assert_eq!(config.reference_path(), PathBuf::from("data/usps_facilities.csv"));
        assert!(config.watchlist.enabled);
        assert_eq!(config.city_aliases(), CityAliases::default());
    }

    #[test]
    fn reject_zero_batch_size() {
        let err = AuditConfig::from_toml("[input]\nbatch_size = 0\n").unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn reject_unknown_encoding() {
        let err = AuditConfig::from_toml("[input]\nencoding = \"ebcdic\"\n").unwrap_err();
        assert!(err.to_string().contains("ebcdic"));
    }

    #[test]
    fn accept_any_resolvable_encoding_label() {
        for label in ["iso-8859-15", "windows-1250", "iso8859-1", "l1", " UTF-8 "] {
            let toml = format!("[input]\nencoding = \"{label}\"\n");
            let config = AuditConfig::from_toml(&toml)
                .unwrap_or_else(|e| panic!("{label:?} rejected: {e}"));
            assert_eq!(config.input.encoding, label);
        }
    }

    #[test]
    fn reject_unknown_field() {
        let err = AuditConfig::from_toml("[input]\nbatchsize = 10\n").unwrap_err();
        assert!(matches!(err, AuditError::ConfigParse(_)));
    }

    #[test]
    fn reject_empty_required_column() {
        let err = AuditConfig::from_toml("[input.columns]\ncity = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("input.columns"));
    }
}
