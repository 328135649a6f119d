//! Run folder cleanup, the join point after the move phase
//!
//! A run folder is removed only when every SPU sourced from it moved
//! successfully and nothing else remains inside. A folder with any unmoved
//! SPU, or with content beyond the current batch (other SPU folders, stray
//! files), is left in place so the interrupted run stays inspectable and
//! resumable.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use super::types::{MoveOutcome, ValidatedSpu};

/// Decide which run folders are fully drained.
pub fn deletable_run_folders(
    validated: &[ValidatedSpu],
    outcomes: &[MoveOutcome],
) -> Vec<PathBuf> {
    let moved: HashSet<&str> = outcomes
        .iter()
        .filter(|o| o.moved)
        .map(|o| o.spu.as_str())
        .collect();

    let mut members: HashMap<&PathBuf, Vec<&str>> = HashMap::new();
    for spu in validated {
        if let Some(run_folder) = &spu.run_folder {
            members.entry(run_folder).or_default().push(spu.spu.as_str());
        }
    }

    let mut deletable: Vec<PathBuf> = members
        .into_iter()
        .filter(|(_, spus)| spus.iter().all(|s| moved.contains(s)))
        .map(|(folder, _)| folder.clone())
        .collect();
    deletable.sort();
    deletable
}

async fn is_empty_dir(folder: &std::path::Path) -> std::io::Result<bool> {
    let mut entries = tokio::fs::read_dir(folder).await?;
    Ok(entries.next_entry().await?.is_none())
}

/// Remove run folders that are fully drained and now empty. Errors are
/// logged, not propagated; a leftover folder is harmless and the next run
/// will retry.
pub async fn clean_run_folders(
    validated: &[ValidatedSpu],
    outcomes: &[MoveOutcome],
) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    for folder in deletable_run_folders(validated, outcomes) {
        match is_empty_dir(&folder).await {
            Ok(true) => match tokio::fs::remove_dir(&folder).await {
                Ok(()) => {
                    tracing::info!(folder = %folder.display(), "Run folder removed");
                    removed.push(folder);
                }
                Err(e) => {
                    tracing::warn!(folder = %folder.display(), error = %e, "Run folder cleanup failed");
                }
            },
            Ok(false) => {
                tracing::info!(folder = %folder.display(), "Run folder not empty, keeping");
            }
            Err(e) => {
                tracing::warn!(folder = %folder.display(), error = %e, "Run folder cleanup failed");
            }
        }
    }
    removed
}
