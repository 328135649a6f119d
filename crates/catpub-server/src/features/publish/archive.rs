//! Safety-net archiving of run folders
//!
//! Each distinct run folder referenced by the batch is copied into the
//! archive root before anything destructive touches it. Archives are purely
//! additive and never overwritten; a name collision gets a timestamp suffix
//! (plus a counter if an operator manages to archive twice in one second).
//!
//! Failures here are warnings, not aborts: the source folder is still
//! untouched at this point, so there is nothing to roll back.

use std::io;
use std::path::{Path, PathBuf};

use super::mover::copy_dir_recursive;
use super::types::{ArchiveOutcome, ValidatedSpu};

/// The distinct folders to archive for a batch: every run folder, plus SPU
/// folders that sit directly under the draft root (they are their own unit).
pub fn archive_targets(validated: &[ValidatedSpu]) -> Vec<PathBuf> {
    let mut targets: Vec<PathBuf> = Vec::new();
    for spu in validated {
        let target = spu.run_folder.clone().unwrap_or_else(|| spu.dir.clone());
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
    targets
}

fn folder_label(folder: &Path) -> String {
    folder
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| folder.display().to_string())
}

/// Pick a destination under `archive_root` that does not exist yet.
fn unique_archive_path(archive_root: &Path, name: &str) -> PathBuf {
    let plain = archive_root.join(name);
    if !plain.exists() {
        return plain;
    }
    let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
    let stamped = archive_root.join(format!("{name}-{stamp}"));
    if !stamped.exists() {
        return stamped;
    }
    let mut counter = 1u32;
    loop {
        let candidate = archive_root.join(format!("{name}-{stamp}-{counter}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

fn archive_one(folder: &Path, archive_root: &Path) -> io::Result<PathBuf> {
    std::fs::create_dir_all(archive_root)?;
    let dest = unique_archive_path(archive_root, &folder_label(folder));
    copy_dir_recursive(folder, &dest)?;
    Ok(dest)
}

/// Copy every target folder into the archive root, one outcome per folder.
pub async fn archive_run_folders(
    validated: &[ValidatedSpu],
    archive_root: &Path,
) -> Vec<ArchiveOutcome> {
    let targets = archive_targets(validated);
    let mut outcomes = Vec::with_capacity(targets.len());

    for folder in targets {
        let label = folder_label(&folder);
        let root = archive_root.to_path_buf();
        let src = folder.clone();
        let result = tokio::task::spawn_blocking(move || archive_one(&src, &root)).await;

        let outcome = match result {
            Ok(Ok(dest)) => ArchiveOutcome {
                run_folder: label,
                archived: true,
                archive_path: Some(dest.display().to_string()),
                error: None,
            },
            Ok(Err(e)) => {
                tracing::warn!(folder = %folder.display(), error = %e, "Archive copy failed");
                ArchiveOutcome {
                    run_folder: label,
                    archived: false,
                    archive_path: None,
                    error: Some(e.to_string()),
                }
            }
            Err(e) => {
                tracing::warn!(folder = %folder.display(), error = %e, "Archive task panicked");
                ArchiveOutcome {
                    run_folder: label,
                    archived: false,
                    archive_path: None,
                    error: Some(e.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }

    outcomes
}
