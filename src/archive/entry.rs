//! Entry naming rules shared by archive creation and extraction.

use std::path::{Component, Path, PathBuf};

use crate::runtime::relative_path_under;

/// Name under which `file` is stored in an archive created from `base`.
///
/// Files inside `base` keep their relative path; anything else falls back to
/// its base name. Separators are always forward slashes.
pub fn archive_entry_name(base: &Path, file: &Path) -> String {
    if let Some(relative) = relative_path_under(base, file) {
        return relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");
    }

    match file.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => file.to_string_lossy().into_owned(),
    }
}

/// Sanitize a stored entry name so it cannot leave the extraction directory.
///
/// Both `/` and `\` count as separators. `.` segments vanish, `..` consumes
/// the previous segment and is dropped once nothing is left to consume, and
/// root or drive prefixes are removed. Returns `None` when nothing remains.
pub fn sanitize_entry_name(name: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();

    for (index, segment) in name.split(['/', '\\']).enumerate() {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s if index == 0 && is_drive_prefix(s) => {}
            s => parts.push(s),
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Join a sanitized, forward-slash entry name onto `destination`.
pub fn entry_target(destination: &Path, sanitized: &str) -> PathBuf {
    let mut target = destination.to_path_buf();
    for part in sanitized.split('/') {
        target.push(part);
    }
    target
}

fn is_drive_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_entry_name_inside_base() {
        assert_eq!(
            archive_entry_name(Path::new("/work"), Path::new("/work/conf/app.yaml")),
            "conf/app.yaml"
        );
        assert_eq!(
            archive_entry_name(Path::new("/work"), Path::new("bin/tool")),
            "bin/tool"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_entry_name_outside_base_falls_back_to_file_name() {
        assert_eq!(
            archive_entry_name(Path::new("/work"), Path::new("/etc/hosts")),
            "hosts"
        );
        assert_eq!(
            archive_entry_name(Path::new("/work"), Path::new("../shared/lib.so")),
            "lib.so"
        );
    }

    #[test]
    fn test_sanitize_plain_names_untouched() {
        assert_eq!(sanitize_entry_name("a.txt").as_deref(), Some("a.txt"));
        assert_eq!(
            sanitize_entry_name("dir/sub/a.txt").as_deref(),
            Some("dir/sub/a.txt")
        );
    }

    #[test]
    fn test_sanitize_strips_leading_traversal() {
        assert_eq!(
            sanitize_entry_name("../../etc/passwd").as_deref(),
            Some("etc/passwd")
        );
        assert_eq!(
            sanitize_entry_name("..\\..\\etc\\passwd").as_deref(),
            Some("etc/passwd")
        );
        assert_eq!(
            sanitize_entry_name("..\\../mixed/..\\x").as_deref(),
            Some("x")
        );
    }

    #[test]
    fn test_sanitize_normalizes_inner_segments() {
        assert_eq!(sanitize_entry_name("a/./b/../c").as_deref(), Some("a/c"));
        assert_eq!(sanitize_entry_name("a/../../b").as_deref(), Some("b"));
    }

    #[test]
    fn test_sanitize_removes_root_and_drive() {
        assert_eq!(
            sanitize_entry_name("/etc/passwd").as_deref(),
            Some("etc/passwd")
        );
        assert_eq!(
            sanitize_entry_name("C:\\Windows\\win.ini").as_deref(),
            Some("Windows/win.ini")
        );
    }

    #[test]
    fn test_sanitize_empty_results() {
        assert_eq!(sanitize_entry_name(""), None);
        assert_eq!(sanitize_entry_name("./"), None);
        assert_eq!(sanitize_entry_name("../.."), None);
    }

    #[test]
    fn test_entry_target_joins_segments() {
        let target = entry_target(Path::new("out"), "a/b/c.txt");
        assert_eq!(target, Path::new("out").join("a").join("b").join("c.txt"));
    }
}
