//! Remote store abstraction.
//!
//! The orchestration layer only needs to list, upload and download archives.
//! `DirStore` serves a directory on a mounted file system; `SftpStore` (behind
//! the `sftp` feature) talks SSH file transfer. Dropping a store closes it.

mod dir;
#[cfg(feature = "sftp")]
mod sftp;

use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::config::{Protocol, RemoteConfig};
use crate::runtime::Runtime;

pub use dir::DirStore;
#[cfg(feature = "sftp")]
pub use sftp::SftpStore;

/// Operations the publish and sync workflows need from a remote store.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteStore {
    /// Identifiers of every object directly under `root`, sorted by name.
    fn list(&self, root: &str) -> Result<Vec<String>>;

    /// Copy `local_archive` into `remote_dir`, creating the directory if
    /// needed. Returns the identifier of the uploaded object.
    fn upload(&self, local_archive: &Path, remote_dir: &str) -> Result<String>;

    /// Copy the object `remote_id` to `local_path`.
    fn download(&self, remote_id: &str, local_path: &Path) -> Result<()>;

    /// Where `remote_id` lives on the local file system, if it does.
    fn local_path(&self, _remote_id: &str) -> Option<PathBuf> {
        None
    }
}

impl<S: RemoteStore + ?Sized> RemoteStore for Box<S> {
    fn list(&self, root: &str) -> Result<Vec<String>> {
        (**self).list(root)
    }

    fn upload(&self, local_archive: &Path, remote_dir: &str) -> Result<String> {
        (**self).upload(local_archive, remote_dir)
    }

    fn download(&self, remote_id: &str, local_path: &Path) -> Result<()> {
        (**self).download(remote_id, local_path)
    }

    fn local_path(&self, remote_id: &str) -> Option<PathBuf> {
        (**self).local_path(remote_id)
    }
}

/// Open the store described by `config`.
#[tracing::instrument(skip(runtime))]
pub fn open_store<R: Runtime + 'static>(
    runtime: R,
    config: &RemoteConfig,
) -> Result<Box<dyn RemoteStore>> {
    debug!("Opening {} store at {}", config.protocol, config.remote_root());
    match config.protocol {
        Protocol::Dir => Ok(Box::new(DirStore::new(runtime))),
        Protocol::Sftp => open_sftp(runtime, config),
    }
}

#[cfg(feature = "sftp")]
fn open_sftp<R: Runtime + 'static>(
    runtime: R,
    config: &RemoteConfig,
) -> Result<Box<dyn RemoteStore>> {
    Ok(Box::new(SftpStore::connect(runtime, config)?))
}

#[cfg(not(feature = "sftp"))]
fn open_sftp<R: Runtime + 'static>(
    _runtime: R,
    config: &RemoteConfig,
) -> Result<Box<dyn RemoteStore>> {
    anyhow::bail!(
        "Cannot connect to {}: pm was built without SFTP support (rebuild with `--features sftp` or use `protocol: dir`)",
        config.host
    )
}

/// Join a remote directory and a file name with a forward slash.
pub(crate) fn join_remote(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}
