// File I/O: voter-file scanning, flagged output, cached collaborator tables

pub mod csv;
pub mod discover;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod reference;
pub mod scanner;
pub mod watchlist;

pub use discover::discover_voter_files;
pub use error::{PipelineError, ScanError, WatchlistError};
pub use output::{FlaggedWriter, OUTPUT_HEADERS};
pub use pipeline::{run, FileReport, FileStatus, RunSummary};
pub use reference::{load_facility_table, load_reference};
pub use scanner::{scan, ScanOptions, VoterScan};
pub use watchlist::{load_watchlist_ids, overlap, WatchlistOverlap};
