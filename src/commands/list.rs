use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::{application::ListAction, config::UpdateSpec, remote::open_store, runtime::Runtime};

/// Print every package published in the remote store named by the spec at
/// `config_path`, with its versions from newest to oldest.
#[tracing::instrument(skip(runtime))]
pub fn list<R: Runtime + 'static>(runtime: R, config_path: &Path) -> Result<()> {
    let spec = UpdateSpec::load(&runtime, config_path)?;
    let remote = spec.remote()?;

    let store = open_store(runtime, remote)?;
    let packages = ListAction::new(&store).list_packages(remote.remote_root())?;
    if packages.is_empty() {
        println!("No packages published.");
        return Ok(());
    }

    debug!("Found {} package(s)", packages.len());
    for package in packages {
        println!("{} {}", package.name, package.versions.join(", "));
    }
    Ok(())
}
