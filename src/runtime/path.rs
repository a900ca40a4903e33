//! Path utility functions for normalization and comparison.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by processing `.` and `..` components lexically.
/// This does not access the filesystem and does not follow symlinks.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Keep the `..` when there is nothing left to pop
                if !result.pop() {
                    result.push(component);
                }
            }
            _ => {
                result.push(component);
            }
        }
    }
    result
}

/// Check if a path is under a given directory by comparing normalized path components.
/// Returns true if `path` is under `dir` (i.e., `dir` is a prefix of `path`).
///
/// # Security
/// Both paths are normalized first, so `/work/src/../../etc/passwd` is NOT under `/work`.
pub fn is_path_under(path: &Path, dir: &Path) -> bool {
    let normalized_path = normalize_path(path);
    let normalized_dir = normalize_path(dir);

    let path_components: Vec<_> = normalized_path.components().collect();
    let dir_components: Vec<_> = normalized_dir.components().collect();

    if path_components.len() < dir_components.len() {
        return false;
    }

    dir_components
        .iter()
        .zip(path_components.iter())
        .all(|(d, p)| d == p)
}

/// Express `path` relative to `base`, but only when it lies inside `base`.
///
/// Relative inputs are resolved against `base` first. Returns `None` for
/// paths outside `base` (or equal to it), so callers never receive a result
/// that starts with `..`.
pub fn relative_path_under(base: &Path, path: &Path) -> Option<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    let absolute = normalize_path(&absolute);
    let base = normalize_path(base);

    if !is_path_under(&absolute, &base) {
        return None;
    }

    let relative = pathdiff::diff_paths(&absolute, &base)?;
    if relative.as_os_str().is_empty() || relative.is_absolute() {
        return None;
    }
    Some(relative)
}
