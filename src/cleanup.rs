use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// RAII guard that removes a partially written file when dropped.
///
/// Call [`CleanupGuard::success`] once the file is complete to keep it.
pub struct CleanupGuard<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
    armed: bool,
}

impl<'a, R: Runtime> CleanupGuard<'a, R> {
    pub fn new(runtime: &'a R, path: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            path: path.into(),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mark the operation as successful, keeping the file
    pub fn success(mut self) {
        self.armed = false;
    }
}

impl<R: Runtime> Drop for CleanupGuard<'_, R> {
    fn drop(&mut self) {
        if !self.armed || !self.runtime.exists(&self.path) {
            return;
        }
        debug!("Cleaning up: {:?}", self.path);
        if let Err(e) = self.runtime.remove_file(&self.path) {
            debug!("Failed to remove {:?}: {}", self.path, e);
        }
    }
}
