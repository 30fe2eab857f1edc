use std::fmt;

/// A problem confined to one input file. The run skips the file and moves on.
#[derive(Debug)]
pub enum ScanError {
    /// Header lacks one or more required columns.
    MissingColumns { file: String, missing: Vec<String> },
    /// A field cannot be decoded with the configured encoding.
    Decode { file: String, line: u64 },
    /// CSV framing error.
    Csv { file: String, message: String },
    /// Open/read failure.
    Io { file: String, message: String },
}

impl ScanError {
    pub fn file(&self) -> &str {
        match self {
            Self::MissingColumns { file, .. }
            | Self::Decode { file, .. }
            | Self::Csv { file, .. }
            | Self::Io { file, .. } => file,
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumns { file, missing } => {
                write!(f, "{file}: missing required column(s): {}", missing.join(", "))
            }
            Self::Decode { file, line } => {
                write!(f, "{file}, line {line}: field cannot be decoded with the configured encoding")
            }
            Self::Csv { file, message } => write!(f, "{file}: CSV error: {message}"),
            Self::Io { file, message } => write!(f, "{file}: IO error: {message}"),
        }
    }
}

impl std::error::Error for ScanError {}

/// A problem that stops the whole run.
#[derive(Debug)]
pub enum PipelineError {
    /// Reference data missing or unusable; nothing safe to match against.
    Reference(String),
    /// Config values the IO layer cannot act on (encoding label, glob pattern).
    Config(String),
    /// No input file matched the configured pattern.
    NoInputFiles { dir: String, pattern: String },
    /// Output file cannot be created or written.
    Output(String),
    /// Input directory cannot be listed.
    Io(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference(msg) => write!(f, "reference data error: {msg}"),
            Self::Config(msg) => write!(f, "config error: {msg}"),
            Self::NoInputFiles { dir, pattern } => {
                write!(f, "no voter files found in {dir} matching {pattern}")
            }
            Self::Output(msg) => write!(f, "output error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {}

/// Watchlist failures are reported but never stop a run.
#[derive(Debug)]
pub enum WatchlistError {
    Io(String),
    Csv(String),
    /// No column looks like a voter identifier.
    NoIdColumn { headers: Vec<String> },
}

impl fmt::Display for WatchlistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "watchlist IO error: {msg}"),
            Self::Csv(msg) => write!(f, "watchlist CSV error: {msg}"),
            Self::NoIdColumn { headers } => {
                write!(f, "watchlist has no voter id column (headers: {})", headers.join(", "))
            }
        }
    }
}

impl std::error::Error for WatchlistError {}
