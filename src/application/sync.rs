//! Sync action - resolves requested packages against the remote store and
//! installs them into a local directory.

use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::archive::ArchiveCodec;
use crate::cleanup::CleanupGuard;
use crate::package::{Catalog, PackageResolver, PackageSpec, ResolvedPackage, remote_base_name};
use crate::remote::RemoteStore;
use crate::runtime::{Runtime, is_same_file};

/// Sync action - list, resolve, download, extract
pub struct SyncAction<'a, R: Runtime, A: ArchiveCodec, S: RemoteStore> {
    runtime: &'a R,
    codec: &'a A,
    store: &'a S,
}

impl<'a, R: Runtime + 'static, A: ArchiveCodec, S: RemoteStore> SyncAction<'a, R, A, S> {
    pub fn new(runtime: &'a R, codec: &'a A, store: &'a S) -> Self {
        Self {
            runtime,
            codec,
            store,
        }
    }

    /// Install the best match for every spec into `output_dir`.
    ///
    /// Resolution is all-or-nothing. Packages are then fetched in order and
    /// the first failure stops the run; packages already extracted stay.
    #[tracing::instrument(skip(self, specs))]
    pub fn run(
        &self,
        specs: &[PackageSpec],
        remote_root: &str,
        output_dir: &Path,
    ) -> Result<Vec<ResolvedPackage>> {
        self.runtime
            .create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

        let listing = self
            .store
            .list(remote_root)
            .with_context(|| format!("Failed to list remote {}", remote_root))?;
        let catalog = Catalog::from_remote_paths(&listing);
        debug!(
            "Catalog has {} archive(s) out of {} remote object(s)",
            catalog.len(),
            listing.len()
        );
        if catalog.is_empty() {
            warn!("No package archives found under {}", remote_root);
        }

        let resolved = PackageResolver::resolve(&catalog, specs).context("resolve packages")?;

        for package in &resolved {
            self.install(package, output_dir)?;
            info!("Updated: {} {}", package.name, package.version);
        }

        Ok(resolved)
    }

    fn install(&self, package: &ResolvedPackage, output_dir: &Path) -> Result<()> {
        let local = output_dir.join(remote_base_name(&package.remote_path));

        // The store may already hold the archive at `local`; it is the only copy
        if let Some(source) = self.store.local_path(&package.remote_path)
            && is_same_file(self.runtime, &source, &local)
        {
            debug!("Extracting {:?} in place", local);
            return self
                .codec
                .extract(self.runtime, &local, output_dir)
                .with_context(|| format!("Failed to extract {:?}", local));
        }

        let guard = CleanupGuard::new(self.runtime, local.clone());

        self.store
            .download(&package.remote_path, &local)
            .with_context(|| format!("Failed to download {}", package.remote_path))?;
        self.codec
            .extract(self.runtime, &local, output_dir)
            .with_context(|| format!("Failed to extract {:?}", local))?;

        guard.success();
        Ok(())
    }
}
