//! Reconciler: combine a fetched remote list with locally remembered order
//!
//! The remote is authoritative for which items exist and for their fields;
//! the local copy is authoritative for position, because positions the user
//! chose may not have reached the server yet.

use crate::ordering::{renumber_positions, sort_for_display};
use crate::types::{Entity, EntityId};
use std::collections::HashMap;

/// Overlay local positions onto the remote list.
///
/// Remote-only items keep their remote position, or get the next free
/// position when the remote sent none. Local-only items are dropped.
pub fn merge<E: Entity>(remote: &[E], local: &[E]) -> Vec<E> {
    let local_positions: HashMap<&EntityId, Option<usize>> =
        local.iter().map(|item| (item.id(), item.position())).collect();

    let mut merged: Vec<E> = remote
        .iter()
        .map(|item| {
            let mut item = item.clone();
            if let Some(Some(position)) = local_positions.get(item.id()) {
                item.set_position(*position);
            }
            item
        })
        .collect();

    let mut next_free = merged
        .iter()
        .filter_map(|item| item.position())
        .max()
        .map(|max| max + 1)
        .unwrap_or(0);
    for item in merged.iter_mut().filter(|item| item.position().is_none()) {
        item.set_position(next_free);
        next_free += 1;
    }

    merged
}

/// `renumber(sort(merge(remote, local)))`
pub fn reconcile<E: Entity>(remote: &[E], local: &[E]) -> Vec<E> {
    renumber_positions(&sort_for_display(&merge(remote, local)))
}

/// What to show when the fetch failed: the local list in display order
pub fn fallback<E: Entity>(local: &[E]) -> Vec<E> {
    sort_for_display(local)
}
