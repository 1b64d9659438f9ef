//! Internal operation outcomes.
//!
//! The public cache API only says "value or nothing"; these types keep the
//! reason around so the crate's own tests can tell an expiry from a corrupt
//! entry or a failing substrate.

use serde_json::Value;

use crate::storage::StorageError;

/// Why an operation fell back to a miss or a dropped write.
#[derive(Debug)]
pub(crate) enum Degradation {
    /// The stored value could not be decoded (or the entry could not be encoded)
    CorruptEntry(String),
    /// The substrate refused the operation
    Storage(StorageError),
}

/// Result of reading one key.
#[derive(Debug)]
pub(crate) enum Lookup {
    Hit(Value),
    /// No entry under the key
    Miss,
    /// An entry existed but had expired; it has been deleted
    Expired,
    Degraded(Degradation),
}

impl Lookup {
    pub(crate) fn into_option(self) -> Option<Value> {
        match self {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss | Lookup::Expired | Lookup::Degraded(_) => None,
        }
    }
}

/// Result of writing one key.
#[derive(Debug)]
pub(crate) enum WriteOutcome {
    /// Written on the first attempt; `evicted` entries made room afterwards
    Stored { evicted: usize },
    /// Written on the retry after quota recovery evicted `evicted` entries
    Recovered { evicted: usize },
    /// Not written
    Dropped(Degradation),
}

impl WriteOutcome {
    #[cfg(test)]
    pub(crate) fn is_written(&self) -> bool {
        !matches!(self, WriteOutcome::Dropped(_))
    }
}
