use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;

use crate::parsing::simfile::{parse_simfile_file, Document};

/// Outcome of parsing a set of simfiles. Files that failed are only counted;
/// the reason is logged as they are seen.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub documents: Vec<Document>,
    pub failed: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.documents.len() + self.failed
    }
}

/// Finds simfiles under `root` matching `pattern` (e.g. `**/*.sm`), sorted by
/// path. Unreadable entries are skipped with a warning.
///
/// # Errors
///
/// Returns the glob error when `pattern` is not a valid glob.
pub fn find_simfiles(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, glob::PatternError> {
    let full_pattern = root.join(pattern);
    let mut paths: Vec<PathBuf> = glob::glob(&full_pattern.to_string_lossy())?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable path {:?}: {}", e.path(), e.error());
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    paths.sort();
    Ok(paths)
}

/// Parses every file in parallel. One bad file never stops the rest.
pub fn parse_all(paths: &[PathBuf]) -> BatchReport {
    let results: Vec<_> = paths
        .par_iter()
        .map(|path| (path, parse_simfile_file(path)))
        .collect();

    let mut report = BatchReport::default();
    for (path, result) in results {
        match result {
            Ok(document) => report.documents.push(document),
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                report.failed += 1;
            }
        }
    }

    info!("{} parsed. {} failed.", report.total(), report.failed);
    report
}
