use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::{
    application::PublishAction,
    archive::TarGzCodec,
    config::PublishSpec,
    remote::open_store,
    runtime::Runtime,
};

/// Pack the files described by the publish spec at `config_path`, then
/// upload the archive when the spec carries remote settings.
#[tracing::instrument(skip(runtime))]
pub fn create<R: Runtime + Clone + 'static>(runtime: R, config_path: &Path) -> Result<()> {
    let spec = PublishSpec::load(&runtime, config_path)?;
    debug!("Loaded publish spec {:?}", spec);

    let store = match &spec.ssh {
        Some(remote) => Some(open_store(runtime.clone(), remote)?),
        None => None,
    };

    let codec = TarGzCodec;
    let action = PublishAction::new(&runtime, &codec, store.as_ref());
    let outcome = action.run(&spec)?;

    println!(
        "Created {} ({} file(s))",
        outcome.archive.display(),
        outcome.file_count
    );
    if let Some(remote) = outcome.remote {
        println!("Uploaded to {}", remote);
    }
    Ok(())
}
