//! Open-addressing hash index with quadratic probing
//!
//! Slots hold either nothing or an entry; deleted entries stay behind as
//! tombstones (`active == false`) so probe chains through them stay intact.
//! Growth doubles capacity and rebuilds from active entries only, which is
//! the only point where tombstones are reclaimed wholesale.
//!
//! # Probe sequence
//!
//! Starting at `hash(key) % capacity`, attempt `step` (from 1) moves the
//! cursor by `step²` from its previous position. Lookups and deletes give up
//! after `capacity` attempts. Inserts have no cutoff and rely on the load
//! factor staying below 1 to reach a free slot.
//!
//! For capacities that are not a power of two the sequence may cycle over a
//! subset of slots; an insert whose reachable slots are all live would then
//! never terminate. Default construction only ever produces powers of two.

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter;
use std::mem;

use super::config::ProbingConfig;
use super::errors::IndexResult;
use crate::observability::{log_event_with_fields, Event, IndexMetrics, Logger, MetricsSnapshot};

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    active: bool,
}

#[derive(Debug)]
enum Slot<K, V> {
    Empty,
    Occupied(Entry<K, V>),
}

fn empty_slots<K, V>(capacity: usize) -> Vec<Slot<K, V>> {
    iter::repeat_with(|| Slot::Empty).take(capacity).collect()
}

/// Next cursor position after `step` attempts
fn probe(index: usize, step: usize, capacity: usize) -> usize {
    let offset = (step as u128 * step as u128) % capacity as u128;
    ((index as u128 + offset) % capacity as u128) as usize
}

/// Unordered key-value index with expected O(1) insert, get and delete.
pub struct ProbingIndex<K, V, S = RandomState> {
    slots: Vec<Slot<K, V>>,
    /// Active entries
    size: usize,
    tombstones: usize,
    load_factor_threshold: f64,
    hash_builder: S,
    metrics: IndexMetrics,
}

impl<K, V> ProbingIndex<K, V, RandomState> {
    /// Empty index with capacity 8 and threshold 0.7
    pub fn new() -> Self {
        Self::build(ProbingConfig::default(), RandomState::new())
    }

    pub fn with_config(config: ProbingConfig) -> IndexResult<Self> {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<K, V, S> ProbingIndex<K, V, S> {
    /// Validated construction with a caller-supplied hasher
    pub fn with_config_and_hasher(config: ProbingConfig, hash_builder: S) -> IndexResult<Self> {
        config.validate()?;
        Ok(Self::build(config, hash_builder))
    }

    fn build(config: ProbingConfig, hash_builder: S) -> Self {
        Self {
            slots: empty_slots(config.initial_capacity),
            size: 0,
            tombstones: 0,
            load_factor_threshold: config.load_factor_threshold,
            hash_builder,
            metrics: IndexMetrics::new(),
        }
    }

    /// Number of active entries
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Current slot count
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.size as f64 / self.slots.len() as f64
    }

    pub fn load_factor_threshold(&self) -> f64 {
        self.load_factor_threshold
    }

    /// Slots holding a deleted entry not yet reclaimed
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    pub fn resizes(&self) -> u64 {
        self.metrics.resizes()
    }

    /// Lookups/deletes that stopped at the step cutoff
    pub fn probe_cutoffs(&self) -> u64 {
        self.metrics.probe_cutoffs()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn should_resize(&self) -> bool {
        self.load_factor() >= self.load_factor_threshold
    }
}

impl<K, V, S> ProbingIndex<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Insert or update a key, growing the table first if the load factor
    /// has reached the threshold.
    ///
    /// Returns the previous value when the key was already live.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.should_resize() {
            self.resize();
        }

        let previous = self.place(key, value);
        if previous.is_some() {
            self.metrics.record_update();
        } else {
            self.metrics.record_insert();
        }
        previous
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let found = self.find(key).and_then(|index| match &self.slots[index] {
            Slot::Occupied(entry) => Some(&entry.value),
            Slot::Empty => None,
        });
        self.metrics.record_lookup(found.is_some());
        found
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find(key)?;
        match &mut self.slots[index] {
            Slot::Occupied(entry) => Some(&mut entry.value),
            Slot::Empty => None,
        }
    }

    /// True iff `get` would find the key
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Tombstone a live key. Returns whether anything was removed.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = match self.find(key) {
            Some(index) => index,
            None => return false,
        };
        if let Slot::Occupied(entry) = &mut self.slots[index] {
            entry.active = false;
        }
        self.size -= 1;
        self.tombstones += 1;
        self.metrics.record_delete();
        true
    }

    fn home_index<Q: Hash + ?Sized>(&self, key: &Q) -> usize {
        (self.hash_builder.hash_one(key) % self.slots.len() as u64) as usize
    }

    /// Slot index of the live entry for `key`.
    ///
    /// Stops at the first empty slot, or after `capacity` attempts.
    fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let capacity = self.slots.len();
        let mut index = self.home_index(key);
        let mut step = 1;

        loop {
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Occupied(entry) if entry.active && Borrow::<Q>::borrow(&entry.key) == key => {
                    return Some(index)
                }
                Slot::Occupied(_) => {}
            }

            index = probe(index, step, capacity);
            step += 1;
            if step > capacity {
                self.metrics.record_probe_cutoff();
                log_event_with_fields(
                    Event::IndexProbeCutoff,
                    &[("capacity", &capacity.to_string()), ("steps", &step.to_string())],
                );
                return None;
            }
        }
    }

    /// Write `key` without checking the load factor.
    ///
    /// The first tombstone met is remembered and reused, but probing continues
    /// past it so a live copy of the key further down the chain is updated
    /// rather than duplicated.
    fn place(&mut self, key: K, value: V) -> Option<V> {
        let capacity = self.slots.len();
        let mut index = self.home_index(&key);
        let mut step = 1;
        let mut reusable: Option<usize> = None;

        let target = loop {
            match &mut self.slots[index] {
                Slot::Empty => break reusable.unwrap_or(index),
                Slot::Occupied(entry) if entry.active => {
                    if entry.key == key {
                        return Some(mem::replace(&mut entry.value, value));
                    }
                }
                Slot::Occupied(_) => {
                    // Deliberately keeps probing past the first tombstone, unlike a plain first-fit insert
                    if reusable.is_none() {
                        reusable = Some(index);
                    }
                }
            }

            index = probe(index, step, capacity);
            step += 1;
            if step > capacity {
                if let Some(tombstone) = reusable {
                    break tombstone;
                }
            }
        };

        if let Slot::Occupied(_) = self.slots[target] {
            self.tombstones -= 1;
        }
        self.slots[target] = Slot::Occupied(Entry {
            key,
            value,
            active: true,
        });
        self.size += 1;
        None
    }

    /// Double capacity and reinsert active entries in their old slot order.
    ///
    /// The new slot array is fully built before it replaces the old one.
    fn resize(&mut self) {
        let old_capacity = self.slots.len();
        let new_capacity = old_capacity * 2;
        let discarded = self.tombstones;

        let old_slots = mem::replace(&mut self.slots, empty_slots(new_capacity));
        self.size = 0;
        self.tombstones = 0;

        for slot in old_slots {
            if let Slot::Occupied(entry) = slot {
                if entry.active {
                    self.place(entry.key, entry.value);
                }
            }
        }

        self.metrics.record_resize();
        if Logger::enabled(Event::IndexResize.severity()) {
            log_event_with_fields(
                Event::IndexResize,
                &[
                    ("entries", &self.size.to_string()),
                    ("new_capacity", &new_capacity.to_string()),
                    ("old_capacity", &old_capacity.to_string()),
                    ("tombstones_discarded", &discarded.to_string()),
                ],
            );
        }
    }
}

impl<K, V> Default for ProbingIndex<K, V, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> fmt::Debug for ProbingIndex<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbingIndex")
            .field("size", &self.size)
            .field("capacity", &self.slots.len())
            .field("tombstones", &self.tombstones)
            .field("load_factor_threshold", &self.load_factor_threshold)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::Hasher;

    /// Sends every key to slot 0
    #[derive(Debug, Clone, Copy, Default)]
    struct Colliding;

    struct ZeroHasher;

    impl Hasher for ZeroHasher {
        fn finish(&self) -> u64 {
            0
        }
        fn write(&mut self, _bytes: &[u8]) {}
    }

    impl BuildHasher for Colliding {
        type Hasher = ZeroHasher;
        fn build_hasher(&self) -> ZeroHasher {
            ZeroHasher
        }
    }

    fn colliding(capacity: usize, threshold: f64) -> ProbingIndex<String, i32, Colliding> {
        let config = ProbingConfig::new(capacity, threshold).unwrap();
        ProbingIndex::with_config_and_hasher(config, Colliding).unwrap()
    }

    #[test]
    fn test_probe_sequence_is_cumulative() {
        // 0 -> +1 -> +4 -> +9 -> +16 (mod 8)
        let mut index = 0;
        let mut visited = vec![index];
        for step in 1..5 {
            index = probe(index, step, 8);
            visited.push(index);
        }
        assert_eq!(visited, vec![0, 1, 5, 6, 6]);
    }

    #[test]
    fn test_insert_and_get() {
        let mut table = ProbingIndex::new();
        table.insert("apple", 10);
        table.insert("banana", 20);

        assert_eq!(table.get(&"apple"), Some(&10));
        assert_eq!(table.get(&"banana"), Some(&20));
        assert_eq!(table.get(&"missing"), None);
        assert_eq!(table.capacity(), 8);
        assert_eq!(table.size(), 2);
    }

    #[test]
    fn test_update_existing_key() {
        let mut table = ProbingIndex::new();
        assert_eq!(table.insert("apple", 10), None);
        assert_eq!(table.insert("apple", 99), Some(10));

        assert_eq!(table.get(&"apple"), Some(&99));
        assert_eq!(table.size(), 1);
    }

    #[test]
    fn test_delete_twice() {
        let mut table = ProbingIndex::new();
        table.insert("apple", 10);

        assert!(table.delete(&"apple"));
        assert!(!table.delete(&"apple"));
        assert!(!table.contains(&"apple"));
        assert_eq!(table.size(), 0);
        assert_eq!(table.tombstones(), 1);
    }

    #[test]
    fn test_colliding_keys_stay_reachable() {
        let mut table = colliding(8, 0.7);
        for (i, key) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            table.insert(key.to_string(), i as i32);
        }
        for (i, key) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            assert_eq!(table.get(*key), Some(&(i as i32)));
        }
        assert_eq!(table.capacity(), 8);
    }

    #[test]
    fn test_delete_keeps_chain_intact() {
        let mut table = colliding(8, 0.7);
        table.insert("a".to_string(), 1);
        table.insert("b".to_string(), 2);
        table.insert("c".to_string(), 3);

        // "b" sits between "a" and "c" on the chain
        assert!(table.delete("b"));
        assert_eq!(table.get("c"), Some(&3));
        assert_eq!(table.get("a"), Some(&1));
        assert_eq!(table.get("b"), None);
    }

    #[test]
    fn test_tombstone_reused_by_new_key() {
        let mut table = colliding(8, 0.7);
        table.insert("a".to_string(), 1);
        table.insert("b".to_string(), 2);
        assert!(table.delete("a"));
        assert_eq!(table.tombstones(), 1);

        table.insert("c".to_string(), 3);
        assert_eq!(table.tombstones(), 0);
        assert_eq!(table.size(), 2);
        assert_eq!(table.get("c"), Some(&3));
        assert_eq!(table.get("b"), Some(&2));
    }

    #[test]
    fn test_reinsert_after_delete_is_single_entry() {
        let mut table = colliding(8, 0.7);
        table.insert("a".to_string(), 1);
        assert!(table.delete("a"));

        table.insert("a".to_string(), 2);
        assert_eq!(table.get("a"), Some(&2));
        assert_eq!(table.size(), 1);
        assert_eq!(table.tombstones(), 0);
    }

    #[test]
    fn test_live_key_behind_tombstone_is_updated_not_duplicated() {
        let mut table = colliding(8, 0.7);
        table.insert("a".to_string(), 1);
        table.insert("b".to_string(), 2);
        assert!(table.delete("a"));

        // The tombstone left by "a" comes first on b's chain
        assert_eq!(table.insert("b".to_string(), 20), Some(2));
        assert_eq!(table.size(), 1);

        assert!(table.delete("b"));
        assert_eq!(table.get("b"), None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_resize_at_threshold() {
        let mut table = ProbingIndex::new();
        for i in 0..6 {
            table.insert(i, i);
        }
        // 5/8 < 0.7 before the sixth insert
        assert_eq!(table.capacity(), 8);
        assert_eq!(table.resizes(), 0);

        table.insert(6, 6);
        assert_eq!(table.capacity(), 16);
        assert_eq!(table.resizes(), 1);
        for i in 0..7 {
            assert_eq!(table.get(&i), Some(&i));
        }
    }

    #[test]
    fn test_resize_discards_tombstones() {
        let mut table = ProbingIndex::new();
        for i in 0..5 {
            table.insert(i, i * 10);
        }
        table.delete(&0);
        table.delete(&1);
        for i in 5..8 {
            table.insert(i, i * 10);
        }
        assert_eq!(table.size(), 6);

        // 6/8 >= 0.7, this insert rebuilds first
        table.insert(8, 80);
        assert_eq!(table.capacity(), 16);
        assert_eq!(table.tombstones(), 0);
        assert_eq!(table.size(), 7);
        assert_eq!(table.get(&0), None);
        assert_eq!(table.get(&1), None);
        for i in 2..9 {
            assert_eq!(table.get(&i), Some(&(i * 10)));
        }
    }

    #[test]
    fn test_many_inserts_preserve_contents() {
        let mut table = ProbingIndex::new();
        for i in 0..1000 {
            table.insert(format!("product_{}", i), i);
        }
        assert_eq!(table.size(), 1000);
        assert!(table.load_factor() < 0.7);
        assert!(table.capacity().is_power_of_two());
        for i in 0..1000 {
            assert_eq!(table.get(format!("product_{}", i).as_str()), Some(&i));
        }
    }

    #[test]
    fn test_probe_cutoff_reports_absent() {
        // Seven colliding keys cover every slot this chain reaches within
        // eight attempts, so a miss never meets an empty slot.
        let mut table = colliding(8, 0.9);
        for key in ["a", "b", "c", "d", "e", "f", "g"] {
            table.insert(key.to_string(), 0);
        }
        assert_eq!(table.capacity(), 8);

        assert_eq!(table.get("missing"), None);
        assert_eq!(table.probe_cutoffs(), 1);
        assert!(!table.delete("missing"));
        assert_eq!(table.probe_cutoffs(), 2);
        assert_eq!(table.size(), 7);
    }

    #[test]
    fn test_capacity_one() {
        let config = ProbingConfig::new(1, 0.5).unwrap();
        let mut table = ProbingIndex::with_config(config).unwrap();
        table.insert("x", 1);
        assert_eq!(table.capacity(), 1);
        table.insert("y", 2);
        assert_eq!(table.capacity(), 2);
        assert_eq!(table.get(&"x"), Some(&1));
        assert_eq!(table.get(&"y"), Some(&2));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ProbingConfig {
            initial_capacity: 0,
            load_factor_threshold: 0.7,
        };
        assert!(ProbingIndex::<i32, i32>::with_config(config).is_err());
    }

    #[test]
    fn test_get_mut() {
        let mut table = ProbingIndex::new();
        table.insert("stock", 5);
        if let Some(v) = table.get_mut(&"stock") {
            *v -= 1;
        }
        assert_eq!(table.get(&"stock"), Some(&4));
        assert!(table.get_mut(&"missing").is_none());
    }

    #[test]
    fn test_metrics() {
        let mut table = ProbingIndex::new();
        table.insert(1, ());
        table.insert(1, ());
        table.get(&1);
        table.get(&2);
        table.delete(&1);

        let snap = table.metrics();
        assert_eq!(snap.inserts, 1);
        assert_eq!(snap.updates, 1);
        assert_eq!(snap.lookups, 2);
        assert_eq!(snap.lookup_misses, 1);
        assert_eq!(snap.deletes, 1);
    }
}
