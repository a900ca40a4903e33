use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::{
    application::SyncAction,
    archive::TarGzCodec,
    config::UpdateSpec,
    remote::open_store,
    runtime::Runtime,
};

/// Resolve the packages listed in the update spec at `config_path` and
/// install them into its output directory.
#[tracing::instrument(skip(runtime))]
pub fn update<R: Runtime + Clone + 'static>(runtime: R, config_path: &Path) -> Result<()> {
    let spec = UpdateSpec::load(&runtime, config_path)?;
    let remote = spec.remote()?;
    let output_dir = spec.output_dir();
    debug!(
        "Updating {} package(s) into {:?} from {:?}",
        spec.packages.len(),
        output_dir,
        remote
    );

    let store = open_store(runtime.clone(), remote)?;
    let codec = TarGzCodec;
    let action = SyncAction::new(&runtime, &codec, &store);
    let resolved = action.run(&spec.packages, remote.remote_root(), &output_dir)?;

    if resolved.is_empty() {
        println!("No packages requested.");
    }
    for package in resolved {
        println!("Updated {} {}", package.name, package.version);
    }
    Ok(())
}
