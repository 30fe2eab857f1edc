use std::fmt;

#[derive(Debug)]
pub enum AuditError {
    /// Facility table lacks a column the index cannot be built without.
    ReferenceData { column: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad batch size, unknown encoding, etc.).
    ConfigValidation(String),
}

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReferenceData { column } => {
                write!(f, "reference data: missing required column '{column}'")
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for AuditError {}
