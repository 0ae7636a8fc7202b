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

//! Frequent items sketch implementation.

use byteorder::ByteOrder;
use byteorder::LE;

use crate::codec::Family;
use crate::common::XorShift64;
use crate::error::Error;
use crate::hash::SketchHash;
use crate::frequencies::reverse_purge_hash_map::LOAD_FACTOR;
use crate::frequencies::reverse_purge_hash_map::ReversePurgeHashMap;
use crate::frequencies::serde::ItemsSerde;
use crate::frequencies::serialization::*;

const LG_MIN_MAP_SIZE: u8 = 2;
const SAMPLE_SIZE: usize = 256;
const EPSILON_FACTOR: f64 = 3.5;

/// Error guarantees for frequent item queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    /// Include items whose upper bound reaches the threshold (no false negatives).
    NoFalseNegatives,
    /// Include items whose lower bound reaches the threshold (no false positives).
    NoFalsePositives,
}

/// Result row for frequent item queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row<T> {
    item: T,
    estimate: i64,
    upper_bound: i64,
    lower_bound: i64,
}

impl<T> Row<T> {
    /// Returns the item value.
    pub fn item(&self) -> &T {
        &self.item
    }

    /// Returns the estimated frequency.
    pub fn estimate(&self) -> i64 {
        self.estimate
    }

    /// Returns the upper bound for the frequency.
    pub fn upper_bound(&self) -> i64 {
        self.upper_bound
    }

    /// Returns the lower bound for the frequency.
    pub fn lower_bound(&self) -> i64 {
        self.lower_bound
    }
}

/// Frequent items sketch tracking approximate counts of heavy hitters.
///
/// Implements the Misra-Gries lineage: a hash map of (item, count) pairs
/// with bounded size. When the map would exceed its maximum capacity, all
/// counts are decremented by an approximate median and non-positive
/// entries are purged; the cumulative decrement is the `offset` error
/// term. Merging sketches accumulates a second, independent `merge_error`
/// term. For any item, the true count lies in
/// `[lower_bound, upper_bound]` deterministically.
///
/// See the [frequencies module documentation](crate::frequencies) for
/// usage examples.
#[derive(Debug, Clone)]
pub struct FrequentItemsSketch<T> {
    lg_max_map_size: u8,
    cur_map_cap: usize,
    offset: i64,
    merge_error: i64,
    stream_length: i64,
    sample_size: usize,
    hash_map: ReversePurgeHashMap<T>,
    rng: XorShift64,
}

impl<T: Eq + SketchHash> FrequentItemsSketch<T> {
    /// Creates a new sketch.
    ///
    /// `max_map_size` bounds the physical size of the internal hash map
    /// and must be a power of 2 of at least 4. The maximum number of
    /// tracked (item, count) pairs is `0.75 * max_map_size`.
    pub fn new(max_map_size: usize) -> Result<Self, Error> {
        let lg_max = Self::check_max_map_size(max_map_size)?;
        Ok(Self::with_lg_map_sizes(lg_max, LG_MIN_MAP_SIZE))
    }

    /// Creates a new sketch whose purge sampling is seeded for
    /// reproducibility.
    pub fn with_seed(max_map_size: usize, seed: u64) -> Result<Self, Error> {
        let lg_max = Self::check_max_map_size(max_map_size)?;
        let mut sketch = Self::with_lg_map_sizes(lg_max, LG_MIN_MAP_SIZE);
        sketch.rng = XorShift64::seeded(seed);
        Ok(sketch)
    }

    /// Returns true if the sketch is empty.
    pub fn is_empty(&self) -> bool {
        self.hash_map.num_active() == 0
    }

    /// Returns the number of active items being tracked.
    pub fn num_active_items(&self) -> usize {
        self.hash_map.num_active()
    }

    /// Returns the sum of the frequencies in the stream seen so far.
    pub fn stream_length(&self) -> i64 {
        self.stream_length
    }

    /// Returns the estimated frequency of the given item.
    ///
    /// An item absent from the map has an estimate of 0.
    pub fn estimate(&self, item: &T) -> i64 {
        let count = self.hash_map.get(item);
        if count > 0 { count + self.offset } else { 0 }
    }

    /// Returns the guaranteed upper bound frequency of the given item.
    pub fn upper_bound(&self, item: &T) -> i64 {
        self.hash_map.get(item) + self.offset + self.merge_error
    }

    /// Returns the guaranteed lower bound frequency of the given item,
    /// which can never be negative.
    pub fn lower_bound(&self, item: &T) -> i64 {
        (self.hash_map.get(item) - self.merge_error).max(0)
    }

    /// Returns an upper bound on the error of [`Self::estimate`] for any
    /// item.
    pub fn maximum_error(&self) -> i64 {
        self.offset + self.merge_error
    }

    /// Returns epsilon for this sketch.
    pub fn epsilon(&self) -> f64 {
        Self::epsilon_for_lg(self.lg_max_map_size)
    }

    /// Returns epsilon for a sketch configured with `lg_max_map_size`.
    pub fn epsilon_for_lg(lg_max_map_size: u8) -> f64 {
        EPSILON_FACTOR / (1u64 << lg_max_map_size) as f64
    }

    /// Returns the a priori error estimate for an anticipated stream weight.
    pub fn apriori_error(lg_max_map_size: u8, estimated_stream_length: i64) -> f64 {
        Self::epsilon_for_lg(lg_max_map_size) * estimated_stream_length as f64
    }

    /// Returns the maximum number of counters the sketch supports.
    pub fn maximum_map_capacity(&self) -> usize {
        ((1u64 << self.lg_max_map_size) as f64 * LOAD_FACTOR) as usize
    }

    /// Returns the current number of counters the sketch supports.
    pub fn current_map_capacity(&self) -> usize {
        self.cur_map_cap
    }

    /// Returns the configured lg of the maximum map size.
    pub fn lg_max_map_size(&self) -> u8 {
        self.lg_max_map_size
    }

    /// Returns the lg of the current map size.
    pub fn lg_cur_map_size(&self) -> u8 {
        self.hash_map.lg_length()
    }

    /// Updates the sketch with an item and a frequency count of one.
    pub fn update(&mut self, item: T) -> Result<(), Error> {
        self.update_with_count(item, 1)
    }

    /// Updates the sketch with an item and a positive frequency count.
    ///
    /// A zero count is a no-op; a negative count is a `Domain` error.
    pub fn update_with_count(&mut self, item: T, count: i64) -> Result<(), Error> {
        if count == 0 {
            return Ok(());
        }
        if count < 0 {
            return Err(Error::domain("count may not be negative"));
        }
        self.stream_length += count;
        self.hash_map.adjust(item, count);
        let num_active = self.hash_map.num_active();

        if self.hash_map.lg_length() < self.lg_max_map_size {
            // Below target size: grow instead of purging.
            if num_active >= self.cur_map_cap {
                self.hash_map.resize(2 * self.hash_map.length());
                self.cur_map_cap = self.hash_map.capacity();
            }
        } else if num_active + 1 > self.cur_map_cap {
            // Purge one update early so the next insert cannot overshoot
            // the capacity.
            self.offset += self.hash_map.purge(self.sample_size, &mut self.rng);
            if self.hash_map.num_active() > self.maximum_map_capacity() {
                return Err(Error::state("purge did not reduce number of active items"));
            }
        }
        Ok(())
    }

    /// Merges another sketch into this one. The other sketch may be of a
    /// different size; the result carries the combined error bounds.
    pub fn merge(&mut self, other: &Self) -> Result<(), Error>
    where
        T: Clone,
    {
        if other.is_empty() {
            return Ok(());
        }
        let merged_total = self.stream_length + other.stream_length;
        self.merge_error += other.maximum_error();
        for (item, count) in other.hash_map.iter() {
            self.update_with_count(item.clone(), count)?;
        }
        // The updates above already added the counts, so the combined
        // total is assigned last.
        self.stream_length = merged_total;
        Ok(())
    }

    /// Resets the sketch to its virgin state with a minimal-length map.
    pub fn reset(&mut self) {
        let mut sketch = Self::with_lg_map_sizes(self.lg_max_map_size, LG_MIN_MAP_SIZE);
        sketch.rng = self.rng;
        *self = sketch;
    }

    /// Returns frequent items using the sketch maximum error as threshold.
    ///
    /// With [`ErrorType::NoFalseNegatives`] every item whose true count
    /// reaches the threshold is present (there may be false positives);
    /// with [`ErrorType::NoFalsePositives`] every reported item truly
    /// reaches the threshold (there may be false negatives). Rows are
    /// sorted by estimate, descending.
    pub fn frequent_items(&self, error_type: ErrorType) -> Vec<Row<T>>
    where
        T: Clone,
    {
        self.frequent_items_with_threshold(error_type, self.maximum_error())
    }

    /// Returns frequent items using a custom threshold, raised to the
    /// sketch maximum error if below it.
    pub fn frequent_items_with_threshold(&self, error_type: ErrorType, threshold: i64) -> Vec<Row<T>>
    where
        T: Clone,
    {
        let threshold = threshold.max(self.maximum_error());
        let mut rows = Vec::new();
        for (item, count) in self.hash_map.iter() {
            let upper = count + self.offset + self.merge_error;
            let lower = (count - self.merge_error).max(0);
            let include = match error_type {
                ErrorType::NoFalseNegatives => upper >= threshold,
                ErrorType::NoFalsePositives => lower >= threshold,
            };
            if include {
                rows.push(Row {
                    item: item.clone(),
                    estimate: count + self.offset,
                    upper_bound: upper,
                    lower_bound: lower,
                });
            }
        }
        rows.sort_by(|a, b| b.estimate.cmp(&a.estimate));
        rows
    }

    /// Serializes this sketch into a byte vector using the provided
    /// item serializer.
    pub fn serialize_with<S: ItemsSerde<T>>(&self, serde: &S) -> Vec<u8>
    where
        T: Clone,
    {
        if self.is_empty() {
            let mut out = vec![0u8; 8];
            out[PREAMBLE_LONGS_BYTE] = PREAMBLE_LONGS_EMPTY;
            out[SER_VER_BYTE] = SER_VER;
            out[FAMILY_BYTE] = Family::FREQUENCY.id;
            out[LG_MAX_MAP_SIZE_BYTE] = self.lg_max_map_size;
            out[LG_CUR_MAP_SIZE_BYTE] = self.hash_map.lg_length();
            out[FLAGS_BYTE] = EMPTY_FLAG_MASK;
            out[SKETCH_TYPE_BYTE] = serde.type_byte();
            return out;
        }

        let active_items = self.num_active_items();
        let values = self.hash_map.active_values();
        let keys = self.hash_map.active_keys();
        let items_bytes = serde.serialize_items(&keys);
        let pre_bytes = PREAMBLE_LONGS_NONEMPTY as usize * 8;
        let values_bytes = active_items * 8;
        let mut out = vec![0u8; pre_bytes + values_bytes + items_bytes.len()];

        out[PREAMBLE_LONGS_BYTE] = PREAMBLE_LONGS_NONEMPTY;
        out[SER_VER_BYTE] = SER_VER;
        out[FAMILY_BYTE] = Family::FREQUENCY.id;
        out[LG_MAX_MAP_SIZE_BYTE] = self.lg_max_map_size;
        out[LG_CUR_MAP_SIZE_BYTE] = self.hash_map.lg_length();
        out[SKETCH_TYPE_BYTE] = serde.type_byte();
        LE::write_u32(
            &mut out[ACTIVE_ITEMS_INT..ACTIVE_ITEMS_INT + 4],
            active_items as u32,
        );
        LE::write_i64(
            &mut out[STREAM_LENGTH_LONG..STREAM_LENGTH_LONG + 8],
            self.stream_length,
        );
        LE::write_i64(&mut out[OFFSET_LONG..OFFSET_LONG + 8], self.offset);
        LE::write_i64(
            &mut out[MERGE_ERROR_LONG..MERGE_ERROR_LONG + 8],
            self.merge_error,
        );
        LE::write_i64_into(&values, &mut out[pre_bytes..pre_bytes + values_bytes]);
        out[pre_bytes + values_bytes..].copy_from_slice(&items_bytes);
        out
    }

    /// Deserializes a sketch from bytes using the provided item
    /// serializer. The serializer type byte must match the one the image
    /// was written with.
    pub fn deserialize_with<S: ItemsSerde<T>>(bytes: &[u8], serde: &S) -> Result<Self, Error> {
        if bytes.len() < 8 {
            return Err(Error::insufficient_data("frequency preamble"));
        }
        let pre_longs = bytes[PREAMBLE_LONGS_BYTE];
        let ser_ver = bytes[SER_VER_BYTE];
        let family = bytes[FAMILY_BYTE];
        let lg_max = bytes[LG_MAX_MAP_SIZE_BYTE];
        let lg_cur = bytes[LG_CUR_MAP_SIZE_BYTE];
        let flags = bytes[FLAGS_BYTE];
        let type_byte = bytes[SKETCH_TYPE_BYTE];
        let is_empty = (flags & EMPTY_FLAG_MASK) != 0;

        if pre_longs != PREAMBLE_LONGS_EMPTY && pre_longs != PREAMBLE_LONGS_NONEMPTY {
            return Err(Error::corruption(format!(
                "preamble longs must be {PREAMBLE_LONGS_EMPTY} or {PREAMBLE_LONGS_NONEMPTY}: {pre_longs}"
            )));
        }
        if ser_ver != SER_VER {
            return Err(Error::unsupported_serial_version(SER_VER, ser_ver));
        }
        Family::FREQUENCY.validate_id(family)?;
        if is_empty != (pre_longs == PREAMBLE_LONGS_EMPTY) {
            return Err(Error::corruption(
                "empty flag disagrees with preamble length",
            ));
        }
        if type_byte != serde.type_byte() {
            return Err(Error::corruption(format!(
                "sketch type {type_byte} does not match serializer type {}",
                serde.type_byte()
            )));
        }
        if lg_max > 31 {
            return Err(Error::corruption(format!("lg_max_map_size too large: {lg_max}")));
        }
        if lg_cur > lg_max {
            return Err(Error::corruption("lg_cur_map_size exceeds lg_max_map_size"));
        }

        if is_empty {
            return Ok(Self::with_lg_map_sizes(lg_max, lg_cur));
        }

        let pre_bytes = PREAMBLE_LONGS_NONEMPTY as usize * 8;
        if bytes.len() < pre_bytes {
            return Err(Error::insufficient_data("full frequency preamble"));
        }
        let active_items = LE::read_u32(&bytes[ACTIVE_ITEMS_INT..ACTIVE_ITEMS_INT + 4]) as usize;
        let stream_length = LE::read_i64(&bytes[STREAM_LENGTH_LONG..STREAM_LENGTH_LONG + 8]);
        let offset_value = LE::read_i64(&bytes[OFFSET_LONG..OFFSET_LONG + 8]);
        let merge_error = LE::read_i64(&bytes[MERGE_ERROR_LONG..MERGE_ERROR_LONG + 8]);

        let values_bytes = active_items
            .checked_mul(8)
            .ok_or_else(|| Error::corruption("values size overflow"))?;
        let items_offset = pre_bytes + values_bytes;
        if bytes.len() < items_offset {
            return Err(Error::insufficient_data("frequency values"));
        }
        let mut values = vec![0i64; active_items];
        LE::read_i64_into(&bytes[pre_bytes..items_offset], &mut values);
        let (items, _consumed) = serde.deserialize_items(&bytes[items_offset..], active_items)?;
        if items.len() != active_items {
            return Err(Error::corruption("item count mismatch during deserialization"));
        }

        let mut sketch = Self::with_lg_map_sizes(lg_max, lg_cur);
        for (item, value) in items.into_iter().zip(values) {
            if value <= 0 {
                return Err(Error::corruption("item count must be positive"));
            }
            sketch.update_with_count(item, value)?;
        }
        sketch.stream_length = stream_length;
        sketch.offset = offset_value;
        sketch.merge_error = merge_error;
        Ok(sketch)
    }

    fn check_max_map_size(max_map_size: usize) -> Result<u8, Error> {
        if !max_map_size.is_power_of_two() || max_map_size < (1 << LG_MIN_MAP_SIZE) {
            return Err(Error::domain(format!(
                "max_map_size must be a power of 2 and at least {}: {max_map_size}",
                1 << LG_MIN_MAP_SIZE
            )));
        }
        Ok(max_map_size.trailing_zeros() as u8)
    }

    fn with_lg_map_sizes(lg_max_map_size: u8, lg_cur_map_size: u8) -> Self {
        let lg_max = lg_max_map_size.max(LG_MIN_MAP_SIZE);
        let lg_cur = lg_cur_map_size.max(LG_MIN_MAP_SIZE).min(lg_max);
        let map = ReversePurgeHashMap::new(1usize << lg_cur);
        let cur_map_cap = map.capacity();
        let max_map_cap = ((1u64 << lg_max) as f64 * LOAD_FACTOR) as usize;
        let sample_size = SAMPLE_SIZE.min(max_map_cap);
        Self {
            lg_max_map_size: lg_max,
            cur_map_cap,
            offset: 0,
            merge_error: 0,
            stream_length: 0,
            sample_size,
            hash_map: map,
            rng: XorShift64::default(),
        }
    }
}
