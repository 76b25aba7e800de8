//! Keyed merge of a cached collection with an incoming one.
//!
//! Both strategies are total, pure functions. The output never contains two
//! items with the same identity key, and the same inputs always produce the
//! same output.
//!
//! # Strategies
//!
//! - [`MergeStrategy::ReplaceIfNewer`]: cached order is kept, a cached item is
//!   swapped for the incoming item with the same key when the incoming one is
//!   strictly newer, unseen incoming keys are appended.
//! - [`MergeStrategy::UnionUnique`]: first seen wins. Cached items come first
//!   and incoming items are only appended for keys not yet present.

use crate::item::VersionedItem;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Merge strategy for keyed collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeStrategy {
    /// Newer incoming items replace cached items with the same key
    ReplaceIfNewer,
    /// Cached items win, incoming items only fill in missing keys
    UnionUnique,
}

impl MergeStrategy {
    /// Merge `incoming` into `cached` using this strategy.
    pub fn merge<T>(self, cached: &[T], incoming: &[T]) -> Vec<T>
    where
        T: VersionedItem + Clone,
    {
        match self {
            MergeStrategy::ReplaceIfNewer => replace_if_newer(cached, incoming),
            MergeStrategy::UnionUnique => union_unique(cached, incoming),
        }
    }
}

/// Replace-if-newer-by-key merge.
///
/// The first incoming item for a key is the one compared against the cached
/// item. Ties keep the cached item.
pub fn replace_if_newer<T>(cached: &[T], incoming: &[T]) -> Vec<T>
where
    T: VersionedItem + Clone,
{
    let mut first_incoming: HashMap<T::Key, &T> = HashMap::with_capacity(incoming.len());
    for item in incoming {
        first_incoming.entry(item.key()).or_insert(item);
    }

    let mut seen = HashSet::with_capacity(cached.len() + incoming.len());
    let mut merged = Vec::with_capacity(cached.len() + incoming.len());

    for item in cached {
        let key = item.key();
        if !seen.insert(key.clone()) {
            continue;
        }
        match first_incoming.get(&key) {
            Some(newer) if newer.timestamp_or_epoch() > item.timestamp_or_epoch() => {
                merged.push((*newer).clone());
            }
            _ => merged.push(item.clone()),
        }
    }

    append_unseen(&mut merged, &mut seen, incoming);
    merged
}

/// Union-unique-by-key merge. First seen wins.
pub fn union_unique<T>(cached: &[T], incoming: &[T]) -> Vec<T>
where
    T: VersionedItem + Clone,
{
    let mut seen = HashSet::with_capacity(cached.len() + incoming.len());
    let mut merged = Vec::with_capacity(cached.len() + incoming.len());
    append_unseen(&mut merged, &mut seen, cached);
    append_unseen(&mut merged, &mut seen, incoming);
    merged
}

fn append_unseen<T>(merged: &mut Vec<T>, seen: &mut HashSet<T::Key>, items: &[T])
where
    T: VersionedItem + Clone,
{
    for item in items {
        if seen.insert(item.key()) {
            merged.push(item.clone());
        }
    }
}

/// Stable ascending sort by timestamp, missing timestamps first.
pub fn sort_chronologically<T: VersionedItem>(items: &mut [T]) {
    items.sort_by_key(|item| item.timestamp_or_epoch());
}
