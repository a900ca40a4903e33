//! CLI entry points. Each command loads its config file, opens the remote
//! store it names and hands off to an application action.

mod create;
mod list;
mod update;

pub use create::create;
pub use list::list;
pub use update::update;
