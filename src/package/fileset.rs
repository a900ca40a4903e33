use anyhow::{Context, Result, bail};
use log::{debug, warn};
use std::path::PathBuf;

use crate::config::Target;
use crate::runtime::Runtime;

/// Expand publish targets into the ordered list of files to archive.
///
/// Each target's glob is expanded in turn; directories are dropped and the
/// optional exclude pattern is matched against the base name only. Fails
/// when nothing is left.
#[tracing::instrument(skip(runtime, targets))]
pub fn collect_files<R: Runtime>(runtime: &R, targets: &[Target]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for target in targets {
        let exclude = match target.exclude.as_deref().filter(|p| !p.is_empty()) {
            Some(pattern) => Some(
                glob::Pattern::new(pattern)
                    .with_context(|| format!("Invalid exclude pattern '{}'", pattern))?,
            ),
            None => None,
        };

        let matches = glob::glob(&target.path)
            .with_context(|| format!("Invalid target pattern '{}'", target.path))?;

        for entry in matches {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Skipping unreadable match for '{}': {}", target.path, e);
                    continue;
                }
            };

            if runtime.metadata(&path)?.is_dir() {
                continue;
            }

            if let Some(pattern) = &exclude
                && path
                    .file_name()
                    .is_some_and(|name| pattern.matches(&name.to_string_lossy()))
            {
                debug!("Excluding {:?} (matches '{}')", path, pattern);
                continue;
            }

            files.push(path);
        }
    }

    if files.is_empty() {
        bail!("no files found");
    }

    debug!("Collected {} file(s)", files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn target(path: &Path, exclude: Option<&str>) -> Target {
        Target {
            path: path.to_string_lossy().into_owned(),
            exclude: exclude.map(String::from),
        }
    }

    #[test]
    fn test_collect_expands_globs_and_skips_directories() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::create_dir(dir.path().join("sub.txt")).unwrap();

        let files = collect_files(&RealRuntime, &[target(&dir.path().join("*.txt"), None)]).unwrap();

        assert_eq!(
            files,
            vec![dir.path().join("a.txt"), dir.path().join("b.txt")]
        );
    }

    #[test]
    fn test_collect_exclude_matches_base_name_only() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("logs")).unwrap();
        fs::write(dir.path().join("logs/app.log"), "log").unwrap();
        fs::write(dir.path().join("logs/app.conf"), "conf").unwrap();

        let files = collect_files(
            &RealRuntime,
            &[target(&dir.path().join("logs/*"), Some("*.log"))],
        )
        .unwrap();
        assert_eq!(files, vec![dir.path().join("logs/app.conf")]);

        // Directory components are not considered by the exclude pattern
        let files = collect_files(
            &RealRuntime,
            &[target(&dir.path().join("logs/*"), Some("logs"))],
        )
        .unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_collect_keeps_target_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.bin"), "a").unwrap();
        fs::write(dir.path().join("z.cfg"), "z").unwrap();

        let files = collect_files(
            &RealRuntime,
            &[
                target(&dir.path().join("*.cfg"), None),
                target(&dir.path().join("*.bin"), Some("")),
            ],
        )
        .unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("z.cfg"), dir.path().join("a.bin")]
        );
    }

    #[test]
    fn test_collect_no_files_found() {
        let dir = tempdir().unwrap();
        let err = collect_files(&RealRuntime, &[target(&dir.path().join("*.none"), None)])
            .unwrap_err();
        assert_eq!(err.to_string(), "no files found");
    }

    #[test]
    fn test_collect_invalid_pattern() {
        let result = collect_files(
            &RealRuntime,
            &[Target {
                path: "[".to_string(),
                exclude: None,
            }],
        );
        assert!(result.is_err());
    }
}
