use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use ssh2::{HashType, Session, Sftp};
use std::io::Write;
use std::net::TcpStream;
use std::path::{Path, PathBuf};

use super::{RemoteStore, join_remote};
use crate::config::RemoteConfig;
use crate::runtime::Runtime;

/// Remote store reached over SSH file transfer with password authentication.
pub struct SftpStore<R: Runtime> {
    runtime: R,
    session: Session,
    sftp: Sftp,
}

impl<R: Runtime> SftpStore<R> {
    /// Connect, authenticate and start the SFTP subsystem.
    ///
    /// The server host key is logged but not verified.
    pub fn connect(runtime: R, config: &RemoteConfig) -> Result<Self> {
        let address = format!("{}:{}", config.host, config.port());
        debug!("Connecting to {} as {}...", address, config.user);

        let tcp = TcpStream::connect(&address)
            .with_context(|| format!("Failed to connect to {}", address))?;
        let mut session = Session::new().context("Failed to create SSH session")?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .with_context(|| format!("SSH handshake with {} failed", address))?;

        match session.host_key_hash(HashType::Sha256) {
            Some(hash) => debug!("Host key SHA256 for {}: {}", address, hex(hash)),
            None => warn!("Server {} did not present a host key hash", address),
        }

        session
            .userauth_password(&config.user, &config.password)
            .with_context(|| format!("Authentication failed for {}@{}", config.user, address))?;
        if !session.authenticated() {
            bail!("Authentication failed for {}@{}", config.user, address);
        }

        let sftp = session.sftp().context("Failed to start SFTP subsystem")?;
        info!("Connected to {}", address);

        Ok(Self {
            runtime,
            session,
            sftp,
        })
    }

    fn mkdir_all(&self, dir: &str) -> Result<()> {
        let mut current = if dir.starts_with('/') {
            String::from("/")
        } else {
            String::new()
        };

        for part in dir.split('/').filter(|p| !p.is_empty() && *p != ".") {
            current = if current.is_empty() {
                part.to_string()
            } else {
                join_remote(&current, part)
            };
            let path = Path::new(&current);
            if self.sftp.stat(path).is_err() {
                debug!("Creating remote directory {}", current);
                self.sftp
                    .mkdir(path, 0o755)
                    .with_context(|| format!("Failed to create remote directory {}", current))?;
            }
        }
        Ok(())
    }
}

impl<R: Runtime> RemoteStore for SftpStore<R> {
    #[tracing::instrument(skip(self))]
    fn list(&self, root: &str) -> Result<Vec<String>> {
        let mut entries: Vec<PathBuf> = self
            .sftp
            .readdir(Path::new(root))
            .with_context(|| format!("Failed to list remote directory {}", root))?
            .into_iter()
            .map(|(path, _stat)| path)
            .collect();
        entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        Ok(entries
            .into_iter()
            .filter_map(|p| {
                let name = p.file_name()?.to_string_lossy().into_owned();
                Some(join_remote(root, &name))
            })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    fn upload(&self, local_archive: &Path, remote_dir: &str) -> Result<String> {
        let file_name = local_archive
            .file_name()
            .with_context(|| format!("Invalid archive path {:?}", local_archive))?
            .to_string_lossy()
            .into_owned();
        self.mkdir_all(remote_dir)?;

        let destination = join_remote(remote_dir, &file_name);
        let mut source = self
            .runtime
            .open(local_archive)
            .with_context(|| format!("Failed to open {:?}", local_archive))?;
        let mut remote_file = self
            .sftp
            .create(Path::new(&destination))
            .with_context(|| format!("Failed to create remote file {}", destination))?;
        std::io::copy(&mut source, &mut remote_file)
            .with_context(|| format!("Failed to upload {:?} to {}", local_archive, destination))?;
        remote_file.flush()?;

        info!("Uploaded {:?} to {}", local_archive, destination);
        Ok(destination)
    }

    #[tracing::instrument(skip(self))]
    fn download(&self, remote_id: &str, local_path: &Path) -> Result<()> {
        let mut remote_file = self
            .sftp
            .open(Path::new(remote_id))
            .with_context(|| format!("Failed to open remote file {}", remote_id))?;
        if let Some(parent) = local_path.parent()
            && !parent.as_os_str().is_empty()
        {
            self.runtime.create_dir_all(parent)?;
        }
        let mut destination = self.runtime.create_file(local_path)?;
        std::io::copy(&mut remote_file, &mut destination)
            .with_context(|| format!("Failed to download {} to {:?}", remote_id, local_path))?;
        destination.flush()?;
        debug!("Downloaded {} to {:?}", remote_id, local_path);
        Ok(())
    }
}

impl<R: Runtime> Drop for SftpStore<R> {
    fn drop(&mut self) {
        if let Err(e) = self.session.disconnect(None, "closing", None) {
            debug!("SSH disconnect failed: {}", e);
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
