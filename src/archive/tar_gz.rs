use crate::runtime::{Runtime, is_path_under};
use anyhow::{Context, Result, bail};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::{debug, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use tar::{Archive, Builder, Header};

use super::ArchiveCodec;
use super::entry::{archive_entry_name, entry_target, sanitize_entry_name};

/// Codec for gzip-compressed tar archives (.tar.gz)
pub struct TarGzCodec;

impl ArchiveCodec for TarGzCodec {
    fn create<R: Runtime + 'static>(
        &self,
        runtime: &R,
        output: &Path,
        files: &[PathBuf],
    ) -> Result<()> {
        let base = runtime.current_dir()?;
        self.create_in(runtime, &base, output, files)
    }

    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        destination: &Path,
    ) -> Result<()> {
        self.extract_impl(runtime, archive_path, destination)
    }
}

impl TarGzCodec {
    /// Create an archive whose entry names are relative to `base`.
    pub(crate) fn create_in<R: Runtime>(
        &self,
        runtime: &R,
        base: &Path,
        output: &Path,
        files: &[PathBuf],
    ) -> Result<()> {
        debug!(
            "Creating tar.gz archive {:?} from {} file(s)...",
            output,
            files.len()
        );
        let writer = runtime
            .create_file(output)
            .with_context(|| format!("Failed to create archive at {:?}", output))?;
        let mut builder = Builder::new(GzEncoder::new(writer, Compression::default()));

        for file in files {
            let metadata = runtime.metadata(file)?;
            if !metadata.is_file() {
                warn!("Skipping {:?}: not a regular file", file);
                continue;
            }

            let name = archive_entry_name(base, file);
            let mut header = Header::new_gnu();
            header.set_metadata(&metadata);

            let source = runtime
                .open(file)
                .with_context(|| format!("Failed to open {:?}", file))?;
            builder
                .append_data(&mut header, &name, source)
                .with_context(|| format!("Failed to add {:?} to archive as {}", file, name))?;
            debug!("Added {:?} as {}", file, name);
        }

        let encoder = builder
            .into_inner()
            .context("Failed to finish tar stream")?;
        let mut writer = encoder.finish().context("Failed to finish gzip stream")?;
        writer.flush().context("Failed to flush archive")?;

        info!("Archive created at {:?}.", output);
        Ok(())
    }

    fn extract_impl<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        destination: &Path,
    ) -> Result<()> {
        debug!("Extracting tar.gz archive to {:?}...", destination);
        let reader = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;
        let mut archive = Archive::new(GzDecoder::new(reader));

        let entries = archive
            .entries()
            .with_context(|| format!("Failed to read entries of {:?}", archive_path))?;

        for entry in entries {
            let mut entry = entry.context("Failed to read archive entry")?;
            let raw_name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();

            let Some(relative) = sanitize_entry_name(&raw_name) else {
                debug!("Skipping entry {:?}: no usable path", raw_name);
                continue;
            };
            if relative != raw_name.trim_end_matches('/') {
                warn!("Entry {:?} sanitized to {:?}", raw_name, relative);
            }

            let target = entry_target(destination, &relative);
            if !is_path_under(&target, destination) {
                bail!("Entry {:?} resolves outside {:?}", raw_name, destination);
            }
            let entry_type = entry.header().entry_type();
            let mode = entry.header().mode().unwrap_or(0o644) & 0o777;

            let depth = relative.split('/').count();

            if entry_type.is_dir() {
                unlink_symlinks(runtime, destination, &relative, depth)?;
                runtime.create_dir_all(&target)?;
                // Owner must keep write access so later entries can land inside
                if let Err(e) = runtime.set_permissions(&target, mode | 0o700) {
                    debug!("Failed to set permissions on {:?}: {}", target, e);
                }
                continue;
            }

            if !entry_type.is_file() {
                warn!(
                    "Skipping entry {:?}: unsupported entry type {:?}",
                    raw_name, entry_type
                );
                continue;
            }

            unlink_symlinks(runtime, destination, &relative, depth)?;
            if let Some(parent) = target.parent() {
                runtime.create_dir_all(parent)?;
            }

            {
                let mut dest_file = runtime.create_file(&target)?;
                std::io::copy(&mut entry, &mut dest_file)
                    .with_context(|| format!("Failed to extract file {:?}", target))?;
                dest_file
                    .flush()
                    .with_context(|| format!("Failed to flush {:?}", target))?;
            }

            #[cfg(unix)]
            if let Err(e) = runtime.set_permissions(&target, mode) {
                debug!("Failed to set permissions on {:?}: {}", target, e);
            }
        }

        info!("Extraction complete.");
        Ok(())
    }
}

/// Remove symlinks among the first `depth` segments of `relative` below
/// `destination`, so nothing written afterwards is redirected out of it.
fn unlink_symlinks<R: Runtime>(
    runtime: &R,
    destination: &Path,
    relative: &str,
    depth: usize,
) -> Result<()> {
    let mut current = destination.to_path_buf();
    for part in relative.split('/').take(depth) {
        current.push(part);
        if runtime.is_symlink(&current) {
            warn!("Replacing symlink {:?}", current);
            runtime
                .remove_file(&current)
                .with_context(|| format!("Failed to remove symlink {:?}", current))?;
        }
    }
    Ok(())
}
