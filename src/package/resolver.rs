//! Catalog construction and per-package version resolution.
//!
//! The catalog is rebuilt from remote object names for every batch. Each
//! requested spec resolves independently to the highest matching version;
//! any failure aborts the whole batch.

use log::debug;
use std::cmp::Ordering;
use std::collections::HashMap;

use super::name::{ARCHIVE_SUFFIX, remote_base_name, split_name_version};
use super::spec::PackageSpec;
use super::version::{ConstraintError, Version, VersionConstraint, parse_version};

/// A published archive found in the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteArchive {
    pub name: String,
    pub version: String,
    pub remote_path: String,
}

/// The archive chosen for one requested spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
    pub remote_path: String,
}

impl From<&RemoteArchive> for ResolvedPackage {
    fn from(archive: &RemoteArchive) -> Self {
        Self {
            name: archive.name.clone(),
            version: archive.version.clone(),
            remote_path: archive.remote_path.clone(),
        }
    }
}

/// Reasons a resolution batch fails.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid version constraint for {name}: {source}")]
    InvalidConstraint {
        name: String,
        #[source]
        source: ConstraintError,
    },
    #[error("package not found: {0}")]
    NotFound(String),
    #[error("no version satisfies constraint '{constraint}' for {name}")]
    Unsatisfiable { name: String, constraint: String },
}

/// Published archives grouped by package name, in listing order.
#[derive(Debug, Default)]
pub struct Catalog {
    packages: HashMap<String, Vec<RemoteArchive>>,
}

impl Catalog {
    /// Build a catalog from remote object identifiers.
    ///
    /// Objects without the archive suffix, or whose base name does not split
    /// into name and version, are left out.
    pub fn from_remote_paths<I, S>(remote_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = Catalog::default();
        for remote_path in remote_paths {
            let remote_path = remote_path.as_ref();
            let base_name = remote_base_name(remote_path);
            if !base_name.ends_with(ARCHIVE_SUFFIX) {
                continue;
            }
            let Some((name, version)) = split_name_version(base_name) else {
                debug!("Ignoring unparseable archive name {:?}", base_name);
                continue;
            };
            catalog.push(RemoteArchive {
                name: name.to_string(),
                version: version.to_string(),
                remote_path: remote_path.to_string(),
            });
        }
        catalog
    }

    /// Append an archive, keeping listing order within its package.
    pub fn push(&mut self, archive: RemoteArchive) {
        self.packages
            .entry(archive.name.clone())
            .or_default()
            .push(archive);
    }

    /// All archives published under `name`, in listing order.
    pub fn candidates(&self, name: &str) -> &[RemoteArchive] {
        self.packages.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Package names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.packages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Archives of `name` from highest to lowest version; unparseable versions last.
    pub fn versions_descending(&self, name: &str) -> Vec<&RemoteArchive> {
        let mut archives: Vec<(&RemoteArchive, Option<Version>)> = self
            .candidates(name)
            .iter()
            .map(|a| (a, parse_version(&a.version).ok()))
            .collect();
        archives.sort_by(|(a, va), (b, vb)| match (va, vb) {
            (Some(va), Some(vb)) => vb.cmp_precedence(va),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.version.cmp(&b.version),
        });
        archives.into_iter().map(|(a, _)| a).collect()
    }

    pub fn len(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Package resolver - pure functions over a [`Catalog`].
pub struct PackageResolver;

impl PackageResolver {
    /// Resolve every spec, in order. Either all specs resolve or none do.
    pub fn resolve(
        catalog: &Catalog,
        specs: &[PackageSpec],
    ) -> Result<Vec<ResolvedPackage>, ResolveError> {
        specs
            .iter()
            .map(|spec| Self::resolve_one(catalog, spec))
            .collect()
    }

    /// Pick the highest version of `spec.name` that satisfies its constraint.
    ///
    /// Candidates with unparseable versions are skipped. When two candidates
    /// carry the same version, the one listed first wins.
    pub fn resolve_one(
        catalog: &Catalog,
        spec: &PackageSpec,
    ) -> Result<ResolvedPackage, ResolveError> {
        let constraint = VersionConstraint::parse(&spec.ver).map_err(|source| {
            ResolveError::InvalidConstraint {
                name: spec.name.clone(),
                source,
            }
        })?;

        debug!("Resolving {} as {}", spec, constraint);

        let candidates = catalog.candidates(&spec.name);
        if candidates.is_empty() {
            return Err(ResolveError::NotFound(spec.name.clone()));
        }

        let mut best: Option<(&RemoteArchive, Version)> = None;
        for candidate in candidates {
            let version = match parse_version(&candidate.version) {
                Ok(v) => v,
                Err(e) => {
                    debug!(
                        "Skipping {:?}: unparseable version {:?}: {}",
                        candidate.remote_path, candidate.version, e
                    );
                    continue;
                }
            };
            if !constraint.matches(&version) {
                continue;
            }
            // Strictly greater keeps the earliest listed entry on ties;
            // build metadata does not count
            let is_better = match &best {
                Some((_, best_version)) => {
                    version.cmp_precedence(best_version) == Ordering::Greater
                }
                None => true,
            };
            if is_better {
                best = Some((candidate, version));
            }
        }

        match best {
            Some((archive, _)) => {
                debug!("Resolved {} to {}", spec, archive.version);
                Ok(archive.into())
            }
            None => Err(ResolveError::Unsatisfiable {
                name: spec.name.clone(),
                constraint: spec.ver.clone(),
            }),
        }
    }
}
