//! List action - reports what the remote store has published.

use anyhow::{Context, Result};

use crate::package::Catalog;
use crate::remote::RemoteStore;

/// Published versions of one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: String,
    /// Highest version first
    pub versions: Vec<String>,
}

/// List action - queries the remote store
pub struct ListAction<'a, S: RemoteStore> {
    store: &'a S,
}

impl<'a, S: RemoteStore> ListAction<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Every published package, sorted by name
    #[tracing::instrument(skip(self))]
    pub fn list_packages(&self, remote_root: &str) -> Result<Vec<PackageInfo>> {
        let listing = self
            .store
            .list(remote_root)
            .with_context(|| format!("Failed to list remote {}", remote_root))?;
        let catalog = Catalog::from_remote_paths(&listing);

        Ok(catalog
            .names()
            .into_iter()
            .map(|name| PackageInfo {
                name: name.to_string(),
                versions: catalog
                    .versions_descending(name)
                    .into_iter()
                    .map(|a| a.version.clone())
                    .collect(),
            })
            .collect())
    }
}
