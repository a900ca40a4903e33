//! Remote archive naming: `<name>-<version>.tar.gz`.

/// Fixed suffix of every published archive.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// File name under which a package version is published.
pub fn archive_file_name(name: &str, version: &str) -> String {
    format!("{}-{}{}", name, version, ARCHIVE_SUFFIX)
}

/// Split an archive base name into `(name, version)` on its last hyphen.
///
/// Returns `None` when there is no hyphen or the name part would be empty.
/// A version that itself contains a hyphen (`1.0.0-rc.1`) splits in the
/// wrong place; the naming scheme cannot express it.
pub fn split_name_version(file_name: &str) -> Option<(&str, &str)> {
    let base = file_name.strip_suffix(ARCHIVE_SUFFIX).unwrap_or(file_name);
    let index = base.rfind('-')?;
    if index == 0 {
        return None;
    }
    Some((&base[..index], &base[index + 1..]))
}

/// Final path component of a remote object identifier.
///
/// Remote identifiers may use either separator depending on the store.
pub fn remote_base_name(remote_path: &str) -> &str {
    remote_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(remote_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_file_name() {
        assert_eq!(archive_file_name("foo", "1.2.3"), "foo-1.2.3.tar.gz");
    }

    #[test]
    fn test_split_simple() {
        assert_eq!(split_name_version("foo-1.2.3.tar.gz"), Some(("foo", "1.2.3")));
    }

    #[test]
    fn test_split_uses_last_hyphen() {
        assert_eq!(
            split_name_version("foo-bar-1.0.0.tar.gz"),
            Some(("foo-bar", "1.0.0"))
        );
    }

    #[test]
    fn test_split_not_parseable() {
        assert_eq!(split_name_version("nodash.tar.gz"), None);
        assert_eq!(split_name_version("-1.0.0.tar.gz"), None);
    }

    #[test]
    fn test_split_prerelease_known_limitation() {
        // The hyphen inside the version wins the last-hyphen split
        assert_eq!(
            split_name_version("foo-1.0.0-rc.1.tar.gz"),
            Some(("foo-1.0.0", "rc.1"))
        );
    }

    #[test]
    fn test_remote_base_name() {
        assert_eq!(remote_base_name("/srv/pkgs/foo-1.0.0.tar.gz"), "foo-1.0.0.tar.gz");
        assert_eq!(remote_base_name("pkgs\\foo-1.0.0.tar.gz"), "foo-1.0.0.tar.gz");
        assert_eq!(remote_base_name("foo-1.0.0.tar.gz"), "foo-1.0.0.tar.gz");
    }
}
