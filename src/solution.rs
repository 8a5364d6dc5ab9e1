//! The per-partition vertex state store.
//!
//! The solution set holds exactly one entry per vertex id for the lifetime of
//! a run. Each partition owns the entries whose keys hash to its channel, so
//! the update phase can mutate all partitions in parallel without
//! coordination.
//!
//! Two layouts back the store, selected by the builder's
//! `set_solution_set_unmanaged_memory` flag:
//!
//! - **sorted** (default): a key-sorted vector searched by binary search,
//!   the compact, managed-memory-style layout;
//! - **hashed**: a plain hash map traded for lookup speed at a larger
//!   footprint.

use crate::graph::{Data, VertexKey};
use anyhow::{Result, bail};
use std::collections::HashMap;

pub(crate) enum SolutionStore<K, V> {
    Sorted(Vec<(K, V)>),
    Hashed(HashMap<K, V>),
}

impl<K: VertexKey, V: Data> SolutionStore<K, V> {
    pub fn new(unmanaged: bool) -> Self {
        if unmanaged {
            Self::Hashed(HashMap::new())
        } else {
            Self::Sorted(Vec::new())
        }
    }

    /// Insert one initial vertex. Duplicate ids are a configuration error.
    pub fn insert_initial(&mut self, key: K, value: V) -> Result<()> {
        match self {
            Self::Sorted(entries) => match entries.binary_search_by(|(k, _)| k.cmp(&key)) {
                Ok(_) => bail!("duplicate vertex id {key:?} in the initial vertex set"),
                Err(pos) => entries.insert(pos, (key, value)),
            },
            Self::Hashed(entries) => {
                if entries.contains_key(&key) {
                    bail!("duplicate vertex id {key:?} in the initial vertex set");
                }
                entries.insert(key, value);
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        match self {
            Self::Sorted(entries) => entries
                .binary_search_by(|(k, _)| k.cmp(key))
                .ok()
                .map(|pos| &entries[pos].1),
            Self::Hashed(entries) => entries.get(key),
        }
    }

    /// Replace the state of an existing vertex.
    pub fn update(&mut self, key: &K, value: V) {
        match self {
            Self::Sorted(entries) => {
                let pos = entries
                    .binary_search_by(|(k, _)| k.cmp(key))
                    .expect("update targets an existing vertex");
                entries[pos].1 = value;
            }
            Self::Hashed(entries) => {
                let slot = entries
                    .get_mut(key)
                    .expect("update targets an existing vertex");
                *slot = value;
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Sorted(entries) => entries.len(),
            Self::Hashed(entries) => entries.len(),
        }
    }

    pub fn into_pairs(self) -> Vec<(K, V)> {
        match self {
            Self::Sorted(entries) => entries,
            Self::Hashed(entries) => entries.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_layouts_agree_on_the_basic_contract() {
        for unmanaged in [false, true] {
            let mut store: SolutionStore<i64, u32> = SolutionStore::new(unmanaged);
            store.insert_initial(3, 30).unwrap();
            store.insert_initial(1, 10).unwrap();
            store.insert_initial(2, 20).unwrap();

            assert_eq!(store.len(), 3);
            assert_eq!(store.get(&1), Some(&10));
            assert_eq!(store.get(&9), None);

            store.update(&2, 99);
            assert_eq!(store.get(&2), Some(&99));

            let mut pairs = store.into_pairs();
            pairs.sort_unstable();
            assert_eq!(pairs, vec![(1, 10), (2, 99), (3, 30)]);
        }
    }

    #[test]
    fn duplicate_initial_ids_are_rejected() {
        for unmanaged in [false, true] {
            let mut store: SolutionStore<i64, u32> = SolutionStore::new(unmanaged);
            store.insert_initial(1, 1).unwrap();
            assert!(store.insert_initial(1, 2).is_err());
            assert_eq!(store.len(), 1);
        }
    }

    #[test]
    fn sorted_layout_keeps_keys_ordered() {
        let mut store: SolutionStore<i64, u32> = SolutionStore::new(false);
        for k in [5i64, 1, 4, 2, 3] {
            store.insert_initial(k, 0).unwrap();
        }
        let keys: Vec<i64> = store.into_pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![1, 2, 3, 4, 5]);
    }
}
