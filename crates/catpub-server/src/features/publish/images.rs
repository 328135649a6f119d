//! Image folder validation, the hard gate
//!
//! Every SPU folder is checked before any database or filesystem mutation.
//! A single bad folder anywhere in the batch aborts the whole run, because
//! the later stages are not transactionally reversible.
//!
//! Naming convention inside a SPU folder: exactly one `main.<ext>` plus any
//! number of `<digits>.<ext>` images. Filenames are normalized (lowercased,
//! interior whitespace stripped) before validation so routine export noise
//! does not fail the gate. Dotfiles are ignored.

use regex::Regex;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use super::types::{ImageIssue, ValidatedSpu};
use crate::db::DraftProduct;

static MAIN_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^main\.(jpg|jpeg|png|webp|gif)$").unwrap()
});

static NUMBERED_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+\.(jpg|jpeg|png|webp|gif)$").unwrap()
});

/// Resolve a stored `image_folder` value against the draft root.
///
/// Fails closed: absolute paths and any `..` component are rejected so a
/// malformed draft row can never point the destructive stages outside the
/// draft tree.
pub fn resolve_image_dir(draft_root: &Path, image_folder: &str) -> Option<PathBuf> {
    let relative = Path::new(image_folder.trim());
    if relative.as_os_str().is_empty() || relative.is_absolute() {
        return None;
    }
    if relative
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return None;
    }
    Some(draft_root.join(relative))
}

/// The run folder a SPU directory belongs to, if any.
///
/// SPU folders directly under the draft root have no run folder.
pub fn run_folder_of(draft_root: &Path, dir: &Path) -> Option<PathBuf> {
    let parent = dir.parent()?;
    if parent == draft_root {
        None
    } else {
        Some(parent.to_path_buf())
    }
}

fn normalized_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Rename files in `dir` to the naming convention's casing.
///
/// Never clobbers: if the normalized name already exists the original file
/// is left alone and will be reported by validation instead.
pub fn normalize_folder(dir: &Path) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let normalized = normalized_name(&name);
        if normalized != name {
            let target = dir.join(&normalized);
            if target.exists() {
                tracing::warn!(
                    dir = %dir.display(),
                    from = %name,
                    to = %normalized,
                    "Skipping filename normalization, target exists"
                );
                continue;
            }
            std::fs::rename(entry.path(), target)?;
        }
    }
    Ok(())
}

struct FolderReport {
    file_count: usize,
    main_count: usize,
    invalid: Vec<String>,
}

fn inspect_folder(dir: &Path) -> io::Result<FolderReport> {
    let mut report = FolderReport {
        file_count: 0,
        main_count: 0,
        invalid: Vec::new(),
    };
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        report.file_count += 1;
        if MAIN_IMAGE_RE.is_match(&name) {
            report.main_count += 1;
        } else if !NUMBERED_IMAGE_RE.is_match(&name) {
            report.invalid.push(name);
        }
    }
    report.invalid.sort();
    Ok(report)
}

/// Validate (and normalize) every product's image folder.
///
/// Returns the SPUs that are safe to move plus all accumulated issues. The
/// caller aborts the run when the issue list is non-empty. Products without
/// an `image_folder` have nothing to validate or move and are not returned
/// in either list.
pub fn validate_products(
    draft_root: &Path,
    products: &[DraftProduct],
) -> io::Result<(Vec<ValidatedSpu>, Vec<ImageIssue>)> {
    let mut validated = Vec::new();
    let mut issues = Vec::new();

    for product in products {
        let Some(folder) = product.image_folder.as_deref() else {
            continue;
        };
        let mut issue = ImageIssue::clean(&product.spu);

        let Some(dir) = resolve_image_dir(draft_root, folder) else {
            issue.invalid_path = true;
            issues.push(issue);
            continue;
        };

        if !dir.is_dir() {
            issue.folder_missing = true;
            issues.push(issue);
            continue;
        }

        normalize_folder(&dir)?;
        let report = inspect_folder(&dir)?;
        if report.file_count > 0 && report.main_count != 1 {
            issue.missing_main = true;
        }
        issue.invalid_prefixes = report.invalid;

        if issue.is_clean() {
            validated.push(ValidatedSpu {
                spu: product.spu.clone(),
                run_folder: run_folder_of(draft_root, &dir),
                dir,
            });
        } else {
            issues.push(issue);
        }
    }

    Ok((validated, issues))
}
