//! Application layer - use cases that coordinate the archive codec, the
//! resolver and the remote store.
//!
//! The CLI layer loads configuration and opens the store; these actions only
//! see the traits, so they run the same against a mounted directory, an SFTP
//! server or a mock.

mod list;
mod publish;
mod sync;

pub use list::{ListAction, PackageInfo};
pub use publish::{PublishAction, PublishOutcome};
pub use sync::SyncAction;
