// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Reverse purge hash map for sketch items.
//!
//! Open-addressed linear probing over parallel `keys`/`values`/`states`
//! arrays. A state byte records `1 + probe distance` from the key's ideal
//! slot, or 0 for an empty slot; deletion shifts displaced neighbors back
//! so the invariant holds after every operation.

use crate::common::RandomSource;
use crate::hash::SketchHash;

pub(crate) const LOAD_FACTOR: f64 = 0.75;
const DRIFT_LIMIT: usize = 1024;

#[derive(Debug, Clone)]
pub(crate) struct ReversePurgeHashMap<T> {
    lg_length: u8,
    load_threshold: usize,
    keys: Vec<Option<T>>,
    values: Vec<i64>,
    states: Vec<u16>,
    num_active: usize,
}

impl<T: Eq + SketchHash> ReversePurgeHashMap<T> {
    pub fn new(map_size: usize) -> Self {
        assert!(
            map_size.is_power_of_two() && map_size >= 4,
            "map_size must be a power of 2 and at least 4"
        );
        let lg_length = map_size.trailing_zeros() as u8;
        let load_threshold = (map_size as f64 * LOAD_FACTOR) as usize;
        Self {
            lg_length,
            load_threshold,
            keys: (0..map_size).map(|_| None).collect(),
            values: vec![0; map_size],
            states: vec![0; map_size],
            num_active: 0,
        }
    }

    /// Returns the value mapped to the key, or 0 if the key is absent.
    pub fn get(&self, key: &T) -> i64 {
        let probe = self.hash_probe(key);
        if self.states[probe] > 0 {
            return self.values[probe];
        }
        0
    }

    /// Adds `delta` to the key's value, inserting the key if absent.
    pub fn adjust(&mut self, key: T, delta: i64) {
        let mask = self.keys.len() - 1;
        let mut probe = (key.sketch_hash() as usize) & mask;
        let mut drift: usize = 1;
        while self.states[probe] != 0 {
            let matches = self.keys[probe]
                .as_ref()
                .map(|existing| existing == &key)
                .unwrap_or(false);
            if matches {
                break;
            }
            probe = (probe + 1) & mask;
            drift += 1;
            debug_assert!(drift < DRIFT_LIMIT, "drift limit exceeded");
        }
        if self.states[probe] == 0 {
            self.keys[probe] = Some(key);
            self.values[probe] = delta;
            self.states[probe] = drift as u16;
            self.num_active += 1;
        } else {
            self.values[probe] += delta;
        }
    }

    /// Deletes every entry whose value is no longer positive.
    pub fn keep_only_positive_counts(&mut self) {
        // Scan below the last empty slot first so wrapped probe clusters
        // are repaired before the tail is visited.
        let len = self.keys.len();
        let mut first_probe = len - 1;
        while self.states[first_probe] > 0 {
            first_probe -= 1;
        }
        for probe in (0..first_probe).rev() {
            if self.states[probe] > 0 && self.values[probe] <= 0 {
                self.hash_delete(probe);
                self.num_active -= 1;
            }
        }
        for probe in (first_probe..len).rev() {
            if self.states[probe] > 0 && self.values[probe] <= 0 {
                self.hash_delete(probe);
                self.num_active -= 1;
            }
        }
    }

    pub fn adjust_all_values_by(&mut self, delta: i64) {
        for value in &mut self.values {
            *value += delta;
        }
    }

    /// Subtracts an approximate median of the tracked values from every
    /// entry, deletes the entries that became non-positive, and returns
    /// the subtracted median.
    ///
    /// The median is computed over a uniform without-replacement sample
    /// of at most `sample_size` active values drawn with `rng`.
    pub fn purge<R: RandomSource>(&mut self, sample_size: usize, rng: &mut R) -> i64 {
        let limit = sample_size.min(self.num_active);
        if limit == 0 {
            return 0;
        }
        let mut samples = Vec::with_capacity(limit);
        let mut seen = 0u64;
        for i in 0..self.values.len() {
            if self.is_active(i) {
                seen += 1;
                if samples.len() < limit {
                    samples.push(self.values[i]);
                } else {
                    let j = rng.next_bounded(seen) as usize;
                    if j < limit {
                        samples[j] = self.values[i];
                    }
                }
            }
        }
        let mid = samples.len() / 2;
        samples.select_nth_unstable(mid);
        let median = samples[mid];
        self.adjust_all_values_by(-median);
        self.keep_only_positive_counts();
        median
    }

    /// Rebuilds the map at `new_size`, reinserting every active entry.
    pub fn resize(&mut self, new_size: usize) {
        assert!(
            new_size.is_power_of_two() && new_size >= self.keys.len(),
            "new_size must be a power of 2 and must not shrink the map"
        );
        let mut old_keys = std::mem::take(&mut self.keys);
        let old_values = std::mem::take(&mut self.values);
        let old_states = std::mem::take(&mut self.states);
        self.keys = (0..new_size).map(|_| None).collect();
        self.values = vec![0; new_size];
        self.states = vec![0; new_size];
        self.lg_length = new_size.trailing_zeros() as u8;
        self.load_threshold = (new_size as f64 * LOAD_FACTOR) as usize;
        self.num_active = 0;
        for i in 0..old_keys.len() {
            if old_states[i] > 0 {
                if let Some(key) = old_keys[i].take() {
                    self.adjust(key, old_values[i]);
                }
            }
        }
    }

    pub fn length(&self) -> usize {
        self.keys.len()
    }

    pub fn lg_length(&self) -> u8 {
        self.lg_length
    }

    pub fn capacity(&self) -> usize {
        self.load_threshold
    }

    pub fn num_active(&self) -> usize {
        self.num_active
    }

    pub fn active_keys(&self) -> Vec<T>
    where
        T: Clone,
    {
        if self.num_active == 0 {
            return Vec::new();
        }
        let mut keys = Vec::with_capacity(self.num_active);
        for i in 0..self.keys.len() {
            if self.states[i] > 0 {
                if let Some(key) = self.keys[i].as_ref() {
                    keys.push(key.clone());
                }
            }
        }
        keys
    }

    pub fn active_values(&self) -> Vec<i64> {
        if self.num_active == 0 {
            return Vec::new();
        }
        let mut values = Vec::with_capacity(self.num_active);
        for i in 0..self.values.len() {
            if self.states[i] > 0 {
                values.push(self.values[i]);
            }
        }
        values
    }

    /// Iterates active entries in arbitrary order. Safe only against a
    /// non-mutating map.
    pub fn iter(&self) -> ReversePurgeIter<'_, T> {
        ReversePurgeIter::new(self)
    }

    fn is_active(&self, probe: usize) -> bool {
        self.states[probe] > 0
    }

    fn hash_probe(&self, key: &T) -> usize {
        let mask = self.keys.len() - 1;
        let mut probe = (key.sketch_hash() as usize) & mask;
        while self.states[probe] > 0 {
            let matches = self.keys[probe]
                .as_ref()
                .map(|existing| existing == key)
                .unwrap_or(false);
            if matches {
                break;
            }
            probe = (probe + 1) & mask;
        }
        probe
    }

    fn hash_delete(&mut self, mut delete_probe: usize) {
        // Robin-Hood deletion: shift displaced neighbors back until a slot
        // at its ideal position or an empty slot stops the walk.
        self.states[delete_probe] = 0;
        self.keys[delete_probe] = None;
        let mut drift: usize = 1;
        let mask = self.keys.len() - 1;
        let mut probe = (delete_probe + drift) & mask;
        while self.states[probe] != 0 {
            if self.states[probe] as usize > drift {
                self.keys[delete_probe] = self.keys[probe].take();
                self.values[delete_probe] = self.values[probe];
                self.states[delete_probe] = self.states[probe] - drift as u16;
                self.states[probe] = 0;
                drift = 0;
                delete_probe = probe;
            }
            probe = (probe + 1) & mask;
            drift += 1;
            debug_assert!(drift < DRIFT_LIMIT, "drift limit exceeded");
        }
    }
}

pub(crate) struct ReversePurgeIter<'a, T> {
    map: &'a ReversePurgeHashMap<T>,
    index: usize,
    count: usize,
    stride: usize,
    mask: usize,
}

impl<'a, T> ReversePurgeIter<'a, T> {
    fn new(map: &'a ReversePurgeHashMap<T>) -> Self {
        let size = map.keys.len();
        let stride = ((size as f64 * 0.6180339887498949) as usize) | 1;
        let mask = size - 1;
        let index = 0usize.wrapping_sub(stride);
        Self {
            map,
            index,
            count: 0,
            stride,
            mask,
        }
    }
}

impl<'a, T> Iterator for ReversePurgeIter<'a, T> {
    type Item = (&'a T, i64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.count >= self.map.num_active {
            return None;
        }
        loop {
            self.index = self.index.wrapping_add(self.stride) & self.mask;
            if self.map.states[self.index] == 0 {
                continue;
            }
            self.count += 1;
            // an active slot always holds a key
            debug_assert!(
                self.map.keys[self.index].is_some(),
                "active slot missing its key"
            );
            return self.map.keys[self.index]
                .as_ref()
                .map(|key| (key, self.map.values[self.index]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::XorShift64;

    fn assert_probe_states<T: Eq + SketchHash>(map: &ReversePurgeHashMap<T>) {
        let mask = map.keys.len() - 1;
        for i in 0..map.keys.len() {
            if map.states[i] == 0 {
                continue;
            }
            let key = map.keys[i].as_ref().expect("active key missing");
            let ideal = (key.sketch_hash() as usize) & mask;
            let distance = (i.wrapping_sub(ideal)) & mask;
            assert_eq!(
                map.states[i] as usize,
                distance + 1,
                "slot {i} state does not match probe distance"
            );
        }
    }

    #[test]
    fn test_adjust_and_get() {
        let mut map = ReversePurgeHashMap::new(8);
        map.adjust(1i64, 3);
        map.adjust(2i64, 1);
        map.adjust(1i64, 2);
        assert_eq!(map.get(&1), 5);
        assert_eq!(map.get(&2), 1);
        assert_eq!(map.get(&3), 0);
        assert_eq!(map.num_active(), 2);
        assert_probe_states(&map);
    }

    #[test]
    fn test_states_track_probe_distance_across_operations() {
        let mut map = ReversePurgeHashMap::new(8);
        for key in 0i64..6 {
            map.adjust(key, key + 1);
        }
        assert_probe_states(&map);

        map.resize(16);
        assert_eq!(map.num_active(), 6);
        assert_probe_states(&map);

        let mut rng = XorShift64::seeded(7);
        map.purge(16, &mut rng);
        assert_probe_states(&map);
    }

    #[test]
    fn test_purge_subtracts_median_and_drops_nonpositive() {
        let mut map = ReversePurgeHashMap::new(16);
        for key in 0i64..8 {
            map.adjust(key, if key < 2 { 10 } else { 1 });
        }
        let mut rng = XorShift64::seeded(42);
        let median = map.purge(8, &mut rng);
        assert_eq!(median, 1);
        assert_eq!(map.num_active(), 2);
        assert_eq!(map.get(&0), 9);
        assert_eq!(map.get(&1), 9);
        for value in map.active_values() {
            assert!(value > 0);
        }
        assert_probe_states(&map);
    }

    #[test]
    fn test_resize_preserves_entries() {
        let mut map = ReversePurgeHashMap::new(4);
        map.adjust("a".to_string(), 2);
        map.adjust("b".to_string(), 5);
        map.resize(32);
        assert_eq!(map.length(), 32);
        assert_eq!(map.get(&"a".to_string()), 2);
        assert_eq!(map.get(&"b".to_string()), 5);
        assert_eq!(map.num_active(), 2);
    }

    #[test]
    fn test_iter_visits_each_active_entry_once() {
        let mut map = ReversePurgeHashMap::new(16);
        for key in 0i64..10 {
            map.adjust(key, 1);
        }
        let mut seen: Vec<i64> = map.iter().map(|(key, _)| *key).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0i64..10).collect::<Vec<_>>());
    }
}
