//! Publish and update specs, loaded from JSON or YAML files.

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::package::PackageSpec;
use crate::runtime::Runtime;

/// Default SSH port when the config leaves it unset (or zero).
pub const DEFAULT_PORT: u16 = 22;

/// Default local directory for `update` when `output_dir` is unset.
pub const DEFAULT_OUTPUT_DIR: &str = "./dist";

/// Transport used to reach the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// SSH file transfer (requires the `sftp` feature)
    #[default]
    Sftp,
    /// A directory on a locally mounted file system
    Dir,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Sftp => write!(f, "sftp"),
            Protocol::Dir => write!(f, "dir"),
        }
    }
}

/// Connection settings for the remote store.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub protocol: Protocol,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remote_path: String,
}

impl RemoteConfig {
    pub fn port(&self) -> u16 {
        match self.port {
            None | Some(0) => DEFAULT_PORT,
            Some(port) => port,
        }
    }

    /// Remote base directory; `.` when unset.
    pub fn remote_root(&self) -> &str {
        if self.remote_path.is_empty() {
            "."
        } else {
            &self.remote_path
        }
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port())
            .field("user", &self.user)
            .field("password", &"*********")
            .field("remote_path", &self.remote_path)
            .finish()
    }
}

/// One include rule of a publish spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Glob selecting files to include
    pub path: String,
    /// Glob matched against each file's base name; matches are dropped
    #[serde(default)]
    pub exclude: Option<String>,
}

/// What `pm create` packages and where it goes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishSpec {
    pub name: String,
    pub ver: String,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default)]
    pub ssh: Option<RemoteConfig>,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl PublishSpec {
    /// Load and validate a publish spec.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let spec: PublishSpec = load_file(runtime, path)?;
        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("Publish spec is missing a package name");
        }
        if self.ver.trim().is_empty() {
            bail!("Publish spec for '{}' is missing a version", self.name);
        }
        if self.name.contains(['/', '\\']) || self.ver.contains(['/', '\\']) {
            bail!(
                "Package name and version must not contain path separators: {}-{}",
                self.name,
                self.ver
            );
        }
        if self.ver.contains('-') {
            warn!(
                "Version '{}' contains '-'; the published name will not split back into '{}' and '{}'",
                self.ver, self.name, self.ver
            );
        }
        Ok(())
    }

    /// Output directory for the archive, if one is configured.
    pub fn output_dir(&self) -> Option<&Path> {
        self.output
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// What `pm update` fetches and where it installs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSpec {
    #[serde(default)]
    pub packages: Vec<PackageSpec>,
    #[serde(default)]
    pub ssh: Option<RemoteConfig>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl UpdateSpec {
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        load_file(runtime, path)
    }

    /// Local install directory; [`DEFAULT_OUTPUT_DIR`] when unset.
    pub fn output_dir(&self) -> PathBuf {
        match self.output_dir.as_deref() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }

    /// Remote settings; updating without them is an error.
    pub fn remote(&self) -> Result<&RemoteConfig> {
        self.ssh
            .as_ref()
            .context("ssh config required: the update spec has no remote store settings")
    }
}

/// Read `path` and decode it by extension.
///
/// `.yaml`/`.yml` are always YAML. Anything else is tried as JSON first and
/// then as YAML.
pub fn load_file<T: DeserializeOwned, R: Runtime>(runtime: &R, path: &Path) -> Result<T> {
    let data = runtime
        .read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    parse_config(&data, path)
}

fn parse_config<T: DeserializeOwned>(data: &str, path: &Path) -> Result<T> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if extension == "yaml" || extension == "yml" {
        return serde_yaml::from_str(data)
            .with_context(|| format!("Failed to parse YAML config {:?}", path));
    }

    match serde_json::from_str(data) {
        Ok(value) => Ok(value),
        Err(json_err) => {
            debug!("{:?} is not JSON ({}), trying YAML", path, json_err);
            serde_yaml::from_str(data)
                .with_context(|| format!("Failed to parse config {:?} as JSON or YAML", path))
        }
    }
}
