mod entry;
mod tar_gz;

use crate::runtime::Runtime;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub use entry::{archive_entry_name, sanitize_entry_name};
pub use tar_gz::TarGzCodec;

/// Trait for archive codecs that can both pack and unpack
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveCodec: Send + Sync {
    /// Pack `files`, in order, into a new archive at `output`.
    ///
    /// Entry names are taken relative to the current working directory, or
    /// fall back to the file name for inputs outside it.
    fn create<R: Runtime + 'static>(
        &self,
        runtime: &R,
        output: &Path,
        files: &[PathBuf],
    ) -> Result<()>;

    /// Unpack the archive into `destination`, never writing outside of it.
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        destination: &Path,
    ) -> Result<()>;
}
