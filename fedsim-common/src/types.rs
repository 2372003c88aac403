//! Core identifiers shared across fedsim crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a federated client within a run.
///
/// Client indices are assigned once at startup, ascending from zero, and
/// stay fixed for the lifetime of the run: partitions, round iteration order
/// and reported metrics are all keyed by this index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(usize);

impl ClientId {
    /// Creates a client identifier from its roster index.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the roster index.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client_{}", self.0)
    }
}
