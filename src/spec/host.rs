//! Concrete host and group identifiers.
//!
//! Example: range token `client-[1:2]`  =>  HostName("client-1"), HostName("client-2")
//!
//! HostName derives ordering so resolved groups can live in BTreeSet/Map and
//! come out in ascending lexicographic order.

use serde::Serialize;
use std::fmt;

/// Group key with any `:children` marker already stripped.
pub type GroupName = String;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct HostName(String);

impl HostName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HostName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
