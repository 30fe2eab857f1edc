//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | Success                                               |
//! | 1    | General error (unspecified)                           |
//! | 2    | CLI usage error (bad args, unreadable config file)    |
//! | 3    | Invalid config (parse or validation failure)          |
//! | 4    | Reference data missing or unusable                    |
//! | 5    | No input files matched                                |
//! | 6    | Output file cannot be created or written              |
//!
//! Skipped input files and watchlist failures are warnings, not exit codes.
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use poaudit_io::PipelineError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, config file cannot be read.
pub const EXIT_USAGE: u8 = 2;

/// Config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Facility reference table missing, unreadable, or lacking a required column.
pub const EXIT_REFERENCE_DATA: u8 = 4;

/// No voter file matched the input pattern.
pub const EXIT_NO_INPUT: u8 = 5;

/// Output file could not be created or appended.
pub const EXIT_OUTPUT: u8 = 6;

/// Map a fatal pipeline error to its exit code.
pub fn pipeline_exit_code(err: &PipelineError) -> u8 {
    match err {
        PipelineError::Reference(_) => EXIT_REFERENCE_DATA,
        PipelineError::Config(_) => EXIT_INVALID_CONFIG,
        PipelineError::NoInputFiles { .. } => EXIT_NO_INPUT,
        PipelineError::Output(_) => EXIT_OUTPUT,
        PipelineError::Io(_) => EXIT_ERROR,
    }
}
