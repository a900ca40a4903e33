//! Package naming, version constraints and resolution
//!
//! This module turns remote archive names into a catalog, resolves requested
//! package specs against it, and gathers the files that make up a package.

mod fileset;
mod name;
mod resolver;
mod spec;
mod version;

pub use fileset::collect_files;
pub use name::{ARCHIVE_SUFFIX, archive_file_name, remote_base_name, split_name_version};
pub use resolver::{Catalog, PackageResolver, RemoteArchive, ResolveError, ResolvedPackage};
pub use spec::PackageSpec;
pub use version::{ConstraintError, Version, VersionConstraint, parse_version};
