//! Image folder relocation, the first irreversible stage
//!
//! Each validated SPU folder moves from the draft tree to
//! `{live_root}/{spu}`. The primitive is rename-first: an atomic rename when
//! source and destination share a filesystem, otherwise a recursive copy
//! followed by deletion of the source. Outcomes are tracked per SPU; one
//! failed move never stops the rest of the batch.

use futures::{stream, FutureExt, StreamExt};
use std::io;
use std::path::Path;

use super::types::{MoveOutcome, ValidatedSpu};

/// Recursively copy a directory tree. Also used by the archive stage.
pub(crate) fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Move a directory, falling back to copy-then-delete across filesystems.
pub async fn move_or_copy(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    match tokio::fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            let src = src.to_path_buf();
            let dst = dst.to_path_buf();
            tokio::task::spawn_blocking(move || {
                copy_dir_recursive(&src, &dst)?;
                std::fs::remove_dir_all(&src)
            })
            .await
            .map_err(io::Error::other)?
        }
        Err(e) => Err(e),
    }
}

/// Move every validated SPU folder into the live root.
///
/// SPU folders are independent, so moves run with bounded concurrency.
/// Outcomes come back in the input order.
pub async fn move_all(
    validated: &[ValidatedSpu],
    live_root: &Path,
    concurrency: usize,
) -> Vec<MoveOutcome> {
    let moves: Vec<_> = validated
        .iter()
        .map(|v| {
            let dst = live_root.join(&v.spu);
            async move {
                match move_or_copy(&v.dir, &dst).await {
                    Ok(()) => {
                        tracing::debug!(spu = %v.spu, dst = %dst.display(), "Image folder moved");
                        MoveOutcome {
                            spu: v.spu.clone(),
                            moved: true,
                            error: None,
                        }
                    }
                    Err(e) => {
                        tracing::warn!(spu = %v.spu, error = %e, "Image folder move failed");
                        MoveOutcome {
                            spu: v.spu.clone(),
                            moved: false,
                            error: Some(e.to_string()),
                        }
                    }
                }
            }
            .boxed()
        })
        .collect();
    stream::iter(moves)
        .buffered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn spu_folder(root: &Path, rel: &str) -> ValidatedSpu {
        let dir = root.join(rel);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("main.jpg"), b"img").unwrap();
        ValidatedSpu {
            spu: dir.file_name().unwrap().to_string_lossy().to_string(),
            run_folder: dir.parent().filter(|p| *p != root).map(Path::to_path_buf),
            dir,
        }
    }

    #[tokio::test]
    async fn move_relocates_source_to_destination() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("draft/run-1/AB100");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("main.jpg"), b"img").unwrap();
        let dst = tmp.path().join("live/AB100");

        move_or_copy(&src, &dst).await.unwrap();

        assert!(!src.exists());
        assert!(dst.join("main.jpg").exists());
    }

    #[tokio::test]
    async fn move_all_reports_per_spu_outcomes() {
        let tmp = TempDir::new().unwrap();
        let draft = tmp.path().join("draft");
        let live = tmp.path().join("live");
        let good = spu_folder(&draft, "run-1/AB100");
        // a source that vanished between validation and the move phase
        let bad = ValidatedSpu {
            spu: "AB200".into(),
            dir: draft.join("run-1/AB200"),
            run_folder: Some(draft.join("run-1")),
        };

        let outcomes = move_all(&[good, bad], &live, 2).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].spu, "AB100");
        assert!(outcomes[0].moved);
        assert_eq!(outcomes[1].spu, "AB200");
        assert!(!outcomes[1].moved);
        assert!(outcomes[1].error.is_some());
        assert!(live.join("AB100/main.jpg").exists());
    }

    #[test]
    fn recursive_copy_preserves_nested_trees() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir_all(src.join("nested")).unwrap();
        std::fs::write(src.join("main.jpg"), b"a").unwrap();
        std::fs::write(src.join("nested/01.jpg"), b"b").unwrap();
        let dst: PathBuf = tmp.path().join("dst");

        copy_dir_recursive(&src, &dst).unwrap();

        assert!(dst.join("main.jpg").exists());
        assert!(dst.join("nested/01.jpg").exists());
        assert!(src.join("main.jpg").exists());
    }
}
