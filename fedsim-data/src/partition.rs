//! Deterministic assignment of original speaker groups to federated clients.
//!
//! Partitioning is keyed by the dataset's original group identifier (the
//! `client_id` manifest column), never by raw row index: all utterances of
//! one speaker land on the same federated client.

use std::ops::Range;

use fedsim_common::ClientId;

/// Returns the slice of the sorted group list assigned to `client_index`.
///
/// Properties:
/// - Slices are contiguous and disjoint across clients.
/// - Every client receives exactly `num_groups / num_clients` groups
///   (floor division); remainder groups that do not divide evenly are
///   assigned to no client at all. The truncation is intentional.
pub fn group_slice(num_groups: usize, client_index: usize, num_clients: usize) -> Range<usize> {
    assert!(num_clients > 0);
    assert!(client_index < num_clients, "client index out of range");

    let per_client = num_groups / num_clients;
    let start = client_index * per_client;
    start..start + per_client
}

/// The fixed set of original groups assigned to one federated client.
///
/// Derived once from the sorted list of unique group identifiers; immutable
/// for the lifetime of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPartition {
    client: ClientId,
    groups: Vec<String>,
}

impl GroupPartition {
    /// Assigns a contiguous slice of `sorted_groups` to `client`.
    ///
    /// `sorted_groups` must be sorted and deduplicated; the slice bounds are
    /// computed by [`group_slice`].
    ///
    /// # Panics
    /// Panics if `num_clients` is zero or `client` is out of range.
    pub fn assign(sorted_groups: &[String], client: ClientId, num_clients: usize) -> Self {
        let range = group_slice(sorted_groups.len(), client.index(), num_clients);
        Self {
            client,
            groups: sorted_groups[range].to_vec(),
        }
    }

    /// Returns the owning client.
    pub fn client(&self) -> ClientId {
        self.client
    }

    /// Returns the assigned group identifiers.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Returns true if `group` belongs to this partition.
    pub fn contains(&self, group: &str) -> bool {
        self.groups.binary_search_by(|g| g.as_str().cmp(group)).is_ok()
    }

    /// Returns the number of assigned groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if no groups were assigned.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
