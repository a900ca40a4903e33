use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

use super::RemoteStore;
use crate::runtime::{Runtime, is_same_file};

/// Remote store backed by a directory on a mounted file system.
///
/// Remote identifiers are plain paths.
pub struct DirStore<R: Runtime> {
    runtime: R,
}

impl<R: Runtime> DirStore<R> {
    pub fn new(runtime: R) -> Self {
        Self { runtime }
    }
}

impl<R: Runtime> RemoteStore for DirStore<R> {
    #[tracing::instrument(skip(self))]
    fn list(&self, root: &str) -> Result<Vec<String>> {
        let mut entries = self
            .runtime
            .read_dir(Path::new(root))
            .with_context(|| format!("Failed to list remote directory {}", root))?;
        entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        debug!("Found {} object(s) under {}", entries.len(), root);
        Ok(entries
            .into_iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect())
    }

    #[tracing::instrument(skip(self))]
    fn upload(&self, local_archive: &Path, remote_dir: &str) -> Result<String> {
        let file_name = local_archive
            .file_name()
            .with_context(|| format!("Invalid archive path {:?}", local_archive))?;
        let remote_dir = Path::new(remote_dir);
        self.runtime.create_dir_all(remote_dir)?;

        // Copy under a temporary name so listings never see a partial archive
        let destination = remote_dir.join(file_name);
        let mut partial = destination.clone().into_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        self.runtime
            .copy(local_archive, &partial)
            .with_context(|| format!("Failed to upload {:?} to {:?}", local_archive, remote_dir))?;
        self.runtime.rename(&partial, &destination)?;

        info!("Uploaded {:?} to {:?}", local_archive, destination);
        Ok(destination.to_string_lossy().into_owned())
    }

    #[tracing::instrument(skip(self))]
    fn download(&self, remote_id: &str, local_path: &Path) -> Result<()> {
        let remote_path = Path::new(remote_id);
        if is_same_file(&self.runtime, remote_path, local_path) {
            debug!("{} is already at {:?}", remote_id, local_path);
            return Ok(());
        }
        if let Some(parent) = local_path.parent()
            && !parent.as_os_str().is_empty()
        {
            self.runtime.create_dir_all(parent)?;
        }
        self.runtime
            .copy(remote_path, local_path)
            .with_context(|| format!("Failed to download {} to {:?}", remote_id, local_path))?;
        debug!("Downloaded {} to {:?}", remote_id, local_path);
        Ok(())
    }

    fn local_path(&self, remote_id: &str) -> Option<PathBuf> {
        Some(PathBuf::from(remote_id))
    }
}
