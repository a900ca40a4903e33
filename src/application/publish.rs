//! Publish action - packs the configured files and optionally uploads them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::archive::ArchiveCodec;
use crate::cleanup::CleanupGuard;
use crate::config::PublishSpec;
use crate::package::{archive_file_name, collect_files};
use crate::remote::RemoteStore;
use crate::runtime::Runtime;

/// What a publish run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Local path of the created archive
    pub archive: PathBuf,
    /// Number of files packed
    pub file_count: usize,
    /// Remote identifier, when the archive was uploaded
    pub remote: Option<String>,
}

/// Publish action - collect, archive, upload
pub struct PublishAction<'a, R: Runtime, A: ArchiveCodec, S: RemoteStore> {
    runtime: &'a R,
    codec: &'a A,
    store: Option<&'a S>,
}

impl<'a, R: Runtime + 'static, A: ArchiveCodec, S: RemoteStore> PublishAction<'a, R, A, S> {
    /// Create a new publish action. Without a store the archive stays local.
    pub fn new(runtime: &'a R, codec: &'a A, store: Option<&'a S>) -> Self {
        Self {
            runtime,
            codec,
            store,
        }
    }

    #[tracing::instrument(skip(self, spec), fields(name = %spec.name, ver = %spec.ver))]
    pub fn run(&self, spec: &PublishSpec) -> Result<PublishOutcome> {
        let files = collect_files(self.runtime, &spec.targets).context("collect files")?;
        debug!("Collected {} file(s) for {}", files.len(), spec.name);

        let file_name = archive_file_name(&spec.name, &spec.ver);
        let archive = match spec.output_dir() {
            Some(dir) => {
                self.runtime
                    .create_dir_all(dir)
                    .with_context(|| format!("Failed to create output directory {:?}", dir))?;
                dir.join(&file_name)
            }
            None => PathBuf::from(&file_name),
        };

        let guard = CleanupGuard::new(self.runtime, archive.clone());
        self.codec
            .create(self.runtime, &archive, &files)
            .with_context(|| format!("Failed to create archive {:?}", archive))?;
        guard.success();
        info!("Archive created: {:?}", archive);

        let remote = match self.store {
            Some(store) => {
                let remote_dir = spec
                    .ssh
                    .as_ref()
                    .map(|c| c.remote_root())
                    .unwrap_or(".");
                let id = store
                    .upload(&archive, remote_dir)
                    .with_context(|| format!("Failed to upload {:?}", archive))?;
                Some(id)
            }
            None => None,
        };

        Ok(PublishOutcome {
            archive,
            file_count: files.len(),
            remote,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{MockArchiveCodec, TarGzCodec};
    use crate::config::{Protocol, RemoteConfig, Target};
    use crate::remote::MockRemoteStore;
    use crate::runtime::RealRuntime;
    use mockall::predicate::eq;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn spec_for(dir: &Path, output: Option<PathBuf>) -> PublishSpec {
        PublishSpec {
            name: "tools".into(),
            ver: "1.2.0".into(),
            targets: vec![Target {
                path: dir.join("src/*.txt").to_string_lossy().into_owned(),
                exclude: None,
            }],
            ssh: None,
            output,
        }
    }

    fn write_sources(dir: &Path) {
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(dir.join("src/a.txt"), "alpha").unwrap();
        fs::write(dir.join("src/b.txt"), "beta").unwrap();
    }

    #[test]
    fn test_publish_creates_archive_in_output_dir() {
        let dir = tempdir().unwrap();
        write_sources(dir.path());
        let output = dir.path().join("out/nested");
        let spec = spec_for(dir.path(), Some(output.clone()));

        let action: PublishAction<_, _, MockRemoteStore> =
            PublishAction::new(&RealRuntime, &TarGzCodec, None);
        let outcome = action.run(&spec).unwrap();

        assert_eq!(outcome.archive, output.join("tools-1.2.0.tar.gz"));
        assert_eq!(outcome.file_count, 2);
        assert_eq!(outcome.remote, None);
        assert!(outcome.archive.is_file());
    }

    #[test]
    fn test_publish_no_files_fails_before_archiving() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out");
        let spec = spec_for(dir.path(), Some(output.clone()));

        let mut codec = MockArchiveCodec::new();
        codec.expect_create::<RealRuntime>().never();

        let action: PublishAction<_, _, MockRemoteStore> =
            PublishAction::new(&RealRuntime, &codec, None);
        let err = action.run(&spec).unwrap_err();

        assert!(format!("{:#}", err).contains("no files found"));
        assert!(!output.exists());
    }

    #[test_log::test]
    fn test_publish_removes_partial_archive_on_failure() {
        let dir = tempdir().unwrap();
        write_sources(dir.path());
        let output = dir.path().join("out");
        let spec = spec_for(dir.path(), Some(output.clone()));

        let mut codec = MockArchiveCodec::new();
        codec
            .expect_create::<RealRuntime>()
            .times(1)
            .returning(|_, archive, _| {
                fs::write(archive, b"half an archive").unwrap();
                Err(anyhow::anyhow!("disk full"))
            });

        let action: PublishAction<_, _, MockRemoteStore> =
            PublishAction::new(&RealRuntime, &codec, None);
        let err = action.run(&spec).unwrap_err();

        assert!(format!("{:#}", err).contains("disk full"));
        assert!(!output.join("tools-1.2.0.tar.gz").exists());
    }

    #[test]
    fn test_publish_uploads_to_remote_root() {
        let dir = tempdir().unwrap();
        write_sources(dir.path());
        let output = dir.path().join("out");
        let mut spec = spec_for(dir.path(), Some(output.clone()));
        spec.ssh = Some(RemoteConfig {
            protocol: Protocol::Dir,
            remote_path: "/srv/packages".into(),
            ..Default::default()
        });

        let mut store = MockRemoteStore::new();
        store
            .expect_upload()
            .with(
                eq(output.join("tools-1.2.0.tar.gz")),
                eq("/srv/packages"),
            )
            .times(1)
            .returning(|_, _| Ok("/srv/packages/tools-1.2.0.tar.gz".to_string()));

        let action = PublishAction::new(&RealRuntime, &TarGzCodec, Some(&store));
        let outcome = action.run(&spec).unwrap();

        assert_eq!(
            outcome.remote.as_deref(),
            Some("/srv/packages/tools-1.2.0.tar.gz")
        );
    }

    #[test]
    fn test_publish_upload_failure_keeps_local_archive() {
        let dir = tempdir().unwrap();
        write_sources(dir.path());
        let output = dir.path().join("out");
        let mut spec = spec_for(dir.path(), Some(output.clone()));
        spec.ssh = Some(RemoteConfig::default());

        let mut store = MockRemoteStore::new();
        store
            .expect_upload()
            .with(eq(output.join("tools-1.2.0.tar.gz")), eq("."))
            .returning(|_, _| Err(anyhow::anyhow!("connection reset")));

        let action = PublishAction::new(&RealRuntime, &TarGzCodec, Some(&store));
        let err = action.run(&spec).unwrap_err();

        assert!(format!("{:#}", err).contains("connection reset"));
        assert!(output.join("tools-1.2.0.tar.gz").exists());
    }
}
