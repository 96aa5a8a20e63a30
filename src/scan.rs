use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::adapters::{ArtifactSet, MetricAdapter};
use crate::error::FoldBenchError;

/// A primary artifact matched by one adapter, with its sibling paths.
#[derive(Debug, Clone)]
pub struct DiscoveredArtifact {
    pub adapter: usize,
    pub artifacts: ArtifactSet,
}

/// Walks `root` recursively once and classifies every file against the
/// adapters. Files matching no pattern are ignored. Results are sorted by
/// path so repeated scans see the same order.
pub fn scan_artifacts(
    root: &Path,
    adapters: &[Box<dyn MetricAdapter>],
) -> Result<Vec<DiscoveredArtifact>, FoldBenchError> {
    let mut found = Vec::new();
    for path in walk_files(root)? {
        let (Some(dir), Some(filename)) = (path.parent(), path.file_name().and_then(|v| v.to_str()))
        else {
            continue;
        };
        let matched = adapters
            .iter()
            .enumerate()
            .find_map(|(idx, adapter)| adapter.discover(filename).map(|id| (idx, id)));
        if let Some((idx, raw_id)) = matched {
            debug!("{} -> {} {}", path.display(), adapters[idx].tool(), raw_id);
            found.push(DiscoveredArtifact {
                adapter: idx,
                artifacts: adapters[idx].artifacts(dir, &raw_id),
            });
        }
    }
    Ok(found)
}

fn walk_files(root: &Path) -> Result<Vec<PathBuf>, FoldBenchError> {
    let entries = fs::read_dir(root).map_err(|err| {
        FoldBenchError::Filesystem(format!("read results dir {}: {err}", root.display()))
    })?;

    let mut files = Vec::new();
    let mut stack = Vec::new();
    collect(entries, &mut files, &mut stack);
    while let Some(dir) = stack.pop() {
        match fs::read_dir(&dir) {
            Ok(entries) => collect(entries, &mut files, &mut stack),
            Err(err) => warn!("skipping unreadable directory {}: {err}", dir.display()),
        }
    }
    files.sort();
    Ok(files)
}

/// Symlinked directories are not descended into; symlinked files are kept.
fn collect(entries: fs::ReadDir, files: &mut Vec<PathBuf>, stack: &mut Vec<PathBuf>) {
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable directory entry: {err}");
                continue;
            }
        };
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(err) => {
                warn!("skipping {}: {err}", path.display());
                continue;
            }
        };
        if file_type.is_dir() {
            stack.push(path);
        } else if file_type.is_symlink() {
            if path.is_dir() {
                debug!("not following directory link {}", path.display());
            } else if path.is_file() {
                files.push(path);
            }
        } else {
            files.push(path);
        }
    }
}

/// First `*.csv` directly inside `root`, by name.
pub fn find_table(root: &Path) -> Result<PathBuf, FoldBenchError> {
    let entries = fs::read_dir(root).map_err(|err| {
        FoldBenchError::Filesystem(format!("read results dir {}: {err}", root.display()))
    })?;
    let mut tables = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|value| value.to_str())
                    .map(|value| value.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .collect::<Vec<_>>();
    tables.sort();
    tables
        .into_iter()
        .next()
        .ok_or_else(|| FoldBenchError::TableMissing(root.to_path_buf()))
}
