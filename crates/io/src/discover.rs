// Voter-file discovery

use std::fs;
use std::path::PathBuf;

use poaudit_audit::config::InputConfig;

use crate::error::PipelineError;

/// Regular files in `input.data_dir` whose name matches `input.file_pattern`
/// and whose extension is one of `input.extensions` (case-insensitive),
/// sorted by file name. A missing directory yields no files.
pub fn discover_voter_files(input: &InputConfig) -> Result<Vec<PathBuf>, PipelineError> {
    let pattern = glob::Pattern::new(&input.file_pattern).map_err(|e| {
        PipelineError::Config(format!(
            "invalid input.file_pattern {:?}: {}",
            input.file_pattern, e
        ))
    })?;

    let match_opts = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    let extensions: Vec<String> = input
        .extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
        .collect();

    if !input.data_dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(&input.data_dir).map_err(|e| {
        PipelineError::Io(format!("failed to list {}: {}", input.data_dir.display(), e))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            PipelineError::Io(format!("failed to list {}: {}", input.data_dir.display(), e))
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();
        if filename.is_empty() || !pattern.matches_with(&filename, match_opts) {
            continue;
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !extensions.contains(&extension) {
            continue;
        }

        files.push((filename, path));
    }

    files.sort();
    Ok(files.into_iter().map(|(_, path)| path).collect())
}
