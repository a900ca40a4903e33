use serde::{Deserialize, Serialize};
use std::fmt;

/// A requested package: name plus version constraint.
///
/// An empty `ver` accepts any published version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    #[serde(default)]
    pub ver: String,
}

impl PackageSpec {
    pub fn new(name: impl Into<String>, ver: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ver: ver.into(),
        }
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ver.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}@{}", self.name, self.ver)
        }
    }
}
