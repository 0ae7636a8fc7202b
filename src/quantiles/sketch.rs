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

use super::DEFAULT_K;
use super::MAX_K;
use super::MIN_K;
use super::serialization::EMPTY_FLAG_MASK;
use super::serialization::PREAMBLE_LONGS_EMPTY;
use super::serialization::PREAMBLE_LONGS_NONEMPTY;
use super::serialization::SER_VER;
use super::sorted_view::SortedView;
use super::sorted_view::build_sorted_view;
use crate::codec::Family;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::common::RandomSource;
use crate::common::XorShift64;
use crate::error::Error;

const MIN_BASE_BUFFER_ITEMS: usize = 4;

/// Quantiles sketch over a stream of `f64` values.
///
/// The sketch keeps a combined buffer laid out as a base buffer of up to
/// `2k` unsorted values followed by level slots of exactly `k` sorted
/// values each. Bit `l` of the bit pattern is set iff level `l` is
/// occupied, and the pattern always equals `n / 2k`: filling the base
/// buffer propagates a carry upward exactly like binary addition.
///
/// See the [quantiles module documentation](crate::quantiles) for more.
#[derive(Debug, Clone)]
pub struct QuantilesSketch {
    k: u16,
    n: u64,
    combined_buffer: Vec<f64>,
    base_buffer_count: usize,
    bit_pattern: u64,
    min_value: f64,
    max_value: f64,
    rng: XorShift64,
}

impl Default for QuantilesSketch {
    fn default() -> Self {
        // DEFAULT_K is always a valid parameter.
        Self::new(DEFAULT_K).unwrap_or_else(|_| unreachable!())
    }
}

impl QuantilesSketch {
    /// Creates a new sketch with the given value of k, which controls
    /// accuracy (rank error is roughly `1.65 / k`) and must be a power of
    /// two in `[2, 32768]`.
    pub fn new(k: u16) -> Result<Self, Error> {
        check_k(k)?;
        Ok(Self {
            k,
            n: 0,
            combined_buffer: vec![0.0; MIN_BASE_BUFFER_ITEMS.min(2 * k as usize)],
            base_buffer_count: 0,
            bit_pattern: 0,
            min_value: f64::INFINITY,
            max_value: f64::NEG_INFINITY,
            rng: XorShift64::default(),
        })
    }

    /// Creates a new sketch whose compaction randomness is seeded for
    /// reproducibility.
    pub fn with_seed(k: u16, seed: u64) -> Result<Self, Error> {
        let mut sketch = Self::new(k)?;
        sketch.rng = XorShift64::seeded(seed);
        Ok(sketch)
    }

    /// Returns parameter k used to configure this sketch.
    pub fn k(&self) -> u16 {
        self.k
    }

    /// Returns total number of values presented to the sketch.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Returns true if the sketch has not seen any data.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Returns true once any level is occupied.
    pub fn is_estimation_mode(&self) -> bool {
        self.bit_pattern != 0
    }

    /// Returns the number of retained values.
    pub fn num_retained(&self) -> usize {
        self.base_buffer_count + self.k as usize * self.bit_pattern.count_ones() as usize
    }

    /// Returns the smallest value seen by the sketch.
    pub fn min_value(&self) -> Option<f64> {
        if self.is_empty() { None } else { Some(self.min_value) }
    }

    /// Returns the largest value seen by the sketch.
    pub fn max_value(&self) -> Option<f64> {
        if self.is_empty() { None } else { Some(self.max_value) }
    }

    /// Returns the approximate normalized rank error for this sketch.
    pub fn normalized_rank_error(&self) -> f64 {
        1.65 / self.k as f64
    }

    /// Updates the sketch with a new value. NaN values are ignored.
    pub fn update(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        if value > self.max_value {
            self.max_value = value;
        }
        if value < self.min_value {
            self.min_value = value;
        }

        if self.base_buffer_count + 1 > self.combined_buffer.len() {
            self.grow_base_buffer();
        }
        self.combined_buffer[self.base_buffer_count] = value;
        self.base_buffer_count += 1;
        self.n += 1;
        if self.base_buffer_count == 2 * self.k as usize {
            self.process_full_base_buffer();
        }
    }

    /// Merges another sketch into this one.
    ///
    /// The source k must equal the target k, or exceed it by a power-of-two
    /// factor (the source is then down-sampled into this sketch). Use
    /// [`QuantilesUnion`](crate::quantiles::QuantilesUnion) when the roles
    /// of the two sketches are not known in advance.
    pub fn merge(&mut self, other: &QuantilesSketch) -> Result<(), Error> {
        if other.is_empty() {
            return Ok(());
        }
        if self.k == other.k {
            self.merge_same_k(other);
            Ok(())
        } else if other.k > self.k {
            self.downsampling_merge(other)
        } else {
            Err(Error::domain(format!(
                "target k {} must not exceed source k {}",
                self.k, other.k
            )))
        }
    }

    /// Returns the normalized rank of the given value.
    pub fn rank(&self, value: f64, inclusive: bool) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.sorted_view().rank(value, inclusive))
    }

    /// Returns the approximate quantile for the given normalized rank,
    /// which must be in `[0.0, 1.0]`.
    pub fn quantile(&self, rank: f64, inclusive: bool) -> Result<Option<f64>, Error> {
        if !(0.0..=1.0).contains(&rank) {
            return Err(Error::domain(format!("rank must be in [0.0, 1.0]: {rank}")));
        }
        if self.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.sorted_view().quantile(rank, inclusive)))
    }

    /// Returns the approximate CDF at the given split points, which must
    /// be unique, monotonically increasing and not NaN.
    pub fn cdf(&self, split_points: &[f64], inclusive: bool) -> Result<Option<Vec<f64>>, Error> {
        if self.is_empty() {
            return Ok(None);
        }
        self.sorted_view().cdf(split_points, inclusive).map(Some)
    }

    /// Returns the approximate PMF over the intervals defined by the given
    /// split points.
    pub fn pmf(&self, split_points: &[f64], inclusive: bool) -> Result<Option<Vec<f64>>, Error> {
        if self.is_empty() {
            return Ok(None);
        }
        self.sorted_view().pmf(split_points, inclusive).map(Some)
    }

    /// Resets the sketch to its virgin state, keeping k.
    pub fn reset(&mut self) {
        self.n = 0;
        self.combined_buffer = vec![0.0; MIN_BASE_BUFFER_ITEMS.min(2 * self.k as usize)];
        self.base_buffer_count = 0;
        self.bit_pattern = 0;
        self.min_value = f64::INFINITY;
        self.max_value = f64::NEG_INFINITY;
    }

    /// Serializes the sketch to bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let empty = self.is_empty();
        let mut bytes = SketchBytes::with_capacity(self.serialized_size());
        bytes.write_u8(if empty {
            PREAMBLE_LONGS_EMPTY
        } else {
            PREAMBLE_LONGS_NONEMPTY
        });
        bytes.write_u8(SER_VER);
        bytes.write_u8(Family::QUANTILES.id);
        bytes.write_u8(if empty { EMPTY_FLAG_MASK } else { 0 });
        bytes.write_u16_le(self.k);
        bytes.write_u8(0);
        bytes.write_u8(0);
        if empty {
            return bytes.into_bytes();
        }

        bytes.write_u64_le(self.n);
        bytes.write_f64_le(self.min_value);
        bytes.write_f64_le(self.max_value);
        for value in &self.combined_buffer[..self.base_buffer_count] {
            bytes.write_f64_le(*value);
        }
        let k = self.k as usize;
        for level in occupied_levels(self.bit_pattern) {
            let start = (2 + level) * k;
            for value in &self.combined_buffer[start..start + k] {
                bytes.write_f64_le(*value);
            }
        }
        bytes.into_bytes()
    }

    /// Deserializes a sketch from bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<QuantilesSketch, Error> {
        let mut cursor = SketchSlice::new(bytes);
        let read_err = |what: &'static str| move |_| Error::insufficient_data(what);

        let pre_longs = cursor.read_u8().map_err(read_err("preamble"))?;
        let ser_ver = cursor.read_u8().map_err(read_err("preamble"))?;
        let family = cursor.read_u8().map_err(read_err("preamble"))?;
        let flags = cursor.read_u8().map_err(read_err("preamble"))?;
        let k = cursor.read_u16_le().map_err(read_err("preamble"))?;
        let _unused = cursor.read_u16_le().map_err(read_err("preamble"))?;

        if pre_longs != PREAMBLE_LONGS_EMPTY && pre_longs != PREAMBLE_LONGS_NONEMPTY {
            return Err(Error::corruption(format!(
                "preamble longs must be {PREAMBLE_LONGS_EMPTY} or {PREAMBLE_LONGS_NONEMPTY}: {pre_longs}"
            )));
        }
        if ser_ver != SER_VER {
            return Err(Error::unsupported_serial_version(SER_VER, ser_ver));
        }
        Family::QUANTILES.validate_id(family)?;
        if !k.is_power_of_two() || !(MIN_K..=MAX_K).contains(&k) {
            return Err(Error::corruption(format!("k out of range: {k}")));
        }
        let is_empty = (flags & EMPTY_FLAG_MASK) != 0;
        if is_empty != (pre_longs == PREAMBLE_LONGS_EMPTY) {
            return Err(Error::corruption(
                "empty flag disagrees with preamble length",
            ));
        }
        if is_empty {
            return QuantilesSketch::new(k);
        }

        let n = cursor.read_u64_le().map_err(read_err("n"))?;
        if n == 0 {
            return Err(Error::corruption("populated sketch must have n > 0"));
        }
        let min_value = cursor.read_f64_le().map_err(read_err("min value"))?;
        let max_value = cursor.read_f64_le().map_err(read_err("max value"))?;
        if !(min_value <= max_value) {
            return Err(Error::corruption("min value exceeds max value"));
        }

        let mut sketch = QuantilesSketch::new(k)?;
        let k = k as usize;
        let bit_pattern = n / (2 * k as u64);
        let base_buffer_count = (n % (2 * k as u64)) as usize;
        let num_levels = (64 - bit_pattern.leading_zeros()) as usize;
        let space = if num_levels > 0 {
            (2 + num_levels) * k
        } else {
            sketch.combined_buffer.len().max(base_buffer_count)
        };
        sketch.combined_buffer.resize(space, 0.0);
        sketch.n = n;
        sketch.bit_pattern = bit_pattern;
        sketch.base_buffer_count = base_buffer_count;
        sketch.min_value = min_value;
        sketch.max_value = max_value;

        for i in 0..base_buffer_count {
            sketch.combined_buffer[i] = cursor.read_f64_le().map_err(read_err("base buffer"))?;
        }
        for level in occupied_levels(bit_pattern) {
            let start = (2 + level) * k;
            for i in 0..k {
                sketch.combined_buffer[start + i] =
                    cursor.read_f64_le().map_err(read_err("level data"))?;
            }
            let run = &sketch.combined_buffer[start..start + k];
            if run.windows(2).any(|w| w[0] > w[1]) {
                return Err(Error::corruption(format!("level {level} is not sorted")));
            }
        }
        Ok(sketch)
    }

    pub(crate) fn bit_pattern(&self) -> u64 {
        self.bit_pattern
    }

    pub(crate) fn base_buffer(&self) -> &[f64] {
        &self.combined_buffer[..self.base_buffer_count]
    }

    pub(crate) fn level(&self, level: usize) -> &[f64] {
        let k = self.k as usize;
        let start = (2 + level) * k;
        &self.combined_buffer[start..start + k]
    }

    fn serialized_size(&self) -> usize {
        if self.is_empty() {
            return 8;
        }
        8 + 8 + 16 + 8 * self.num_retained()
    }

    fn sorted_view(&self) -> SortedView {
        let base = std::iter::once((self.base_buffer(), 1u64));
        let levels = occupied_levels(self.bit_pattern)
            .map(|level| (self.level(level), 1u64 << level))
            .collect::<Vec<_>>();
        build_sorted_view(base.chain(levels.into_iter()))
    }

    fn grow_base_buffer(&mut self) {
        let two_k = 2 * self.k as usize;
        let old = self.combined_buffer.len();
        debug_assert!(old < two_k, "base buffer cannot grow past 2k");
        let new_size = (2 * old).clamp(MIN_BASE_BUFFER_ITEMS, two_k);
        self.combined_buffer.resize(new_size, 0.0);
    }

    fn process_full_base_buffer(&mut self) {
        let two_k = 2 * self.k as usize;
        debug_assert_eq!(self.base_buffer_count, two_k, "base buffer must be full");
        self.maybe_grow_levels(self.n);
        self.combined_buffer[..two_k].sort_by(f64::total_cmp);
        self.propagate_from_base_buffer();
        self.base_buffer_count = 0;
        debug_assert_eq!(self.bit_pattern, self.n / (2 * self.k as u64));
    }

    fn maybe_grow_levels(&mut self, new_n: u64) {
        let k = self.k as usize;
        let levels_needed = num_levels_needed(self.k, new_n);
        if levels_needed == 0 {
            return;
        }
        let space_needed = (2 + levels_needed) * k;
        if space_needed > self.combined_buffer.len() {
            self.combined_buffer.resize(space_needed, 0.0);
        }
    }

    /// Propagates the sorted, full base buffer into the levels, halving it
    /// by randomized even/odd selection on the way in.
    fn propagate_from_base_buffer(&mut self) {
        let k = self.k as usize;
        let ending = lowest_zero_bit_starting_at(self.bit_pattern, 0);
        let end_start = (2 + ending) * k;
        let offset = (self.rng.next_u64() & 1) as usize;
        for j in 0..k {
            self.combined_buffer[end_start + j] = self.combined_buffer[offset + 2 * j];
        }
        self.cascade_merge(0, ending);
        self.bit_pattern += 1;
    }

    /// Propagates one sorted k-item level from another sketch into this
    /// one, starting the carry at `starting_level`.
    fn propagate_from_level(&mut self, starting_level: usize, src: &[f64]) {
        let k = self.k as usize;
        debug_assert_eq!(src.len(), k, "carry source must hold exactly k items");
        let ending = lowest_zero_bit_starting_at(self.bit_pattern, starting_level);
        let end_start = (2 + ending) * k;
        self.combined_buffer[end_start..end_start + k].copy_from_slice(src);
        self.cascade_merge(starting_level, ending);
        // Carry propagation is binary addition on the bit pattern; the
        // intermediate bits clear themselves.
        self.bit_pattern += 1u64 << starting_level;
    }

    fn cascade_merge(&mut self, starting_level: usize, ending_level: usize) {
        if starting_level == ending_level {
            return;
        }
        let k = self.k as usize;
        let end_start = (2 + ending_level) * k;
        let mut scratch = vec![0.0f64; 2 * k];
        for level in starting_level..ending_level {
            let level_start = (2 + level) * k;
            merge_two_sorted_runs(
                &self.combined_buffer[level_start..level_start + k],
                &self.combined_buffer[end_start..end_start + k],
                &mut scratch,
            );
            let offset = (self.rng.next_u64() & 1) as usize;
            for j in 0..k {
                self.combined_buffer[end_start + j] = scratch[offset + 2 * j];
            }
        }
    }

    fn merge_same_k(&mut self, other: &QuantilesSketch) {
        debug_assert_eq!(self.k, other.k);
        let n_final = self.n + other.n;
        for value in other.base_buffer() {
            self.update(*value);
        }
        self.maybe_grow_levels(n_final);
        for level in occupied_levels(other.bit_pattern) {
            self.propagate_from_level(level, other.level(level));
        }
        self.n = n_final;
        if other.max_value > self.max_value {
            self.max_value = other.max_value;
        }
        if other.min_value < self.min_value {
            self.min_value = other.min_value;
        }
        debug_assert_eq!(self.bit_pattern, self.n / (2 * self.k as u64));
    }

    fn downsampling_merge(&mut self, other: &QuantilesSketch) -> Result<(), Error> {
        let target_k = self.k as usize;
        let source_k = other.k as usize;
        let down_factor = source_k / target_k;
        if source_k % target_k != 0 || !down_factor.is_power_of_two() {
            return Err(Error::domain(format!(
                "source k {source_k} must be target k {target_k} times a power of 2"
            )));
        }
        let lg_down_factor = down_factor.trailing_zeros() as usize;

        let n_final = self.n + other.n;
        for value in other.base_buffer() {
            self.update(*value);
        }
        self.maybe_grow_levels(n_final);
        let mut down_buf = vec![0.0f64; target_k];
        for level in occupied_levels(other.bit_pattern) {
            zip_with_stride(
                other.level(level),
                &mut down_buf,
                down_factor,
                &mut self.rng,
            );
            self.propagate_from_level(level + lg_down_factor, &down_buf);
        }
        self.n = n_final;
        if other.max_value > self.max_value {
            self.max_value = other.max_value;
        }
        if other.min_value < self.min_value {
            self.min_value = other.min_value;
        }
        debug_assert_eq!(self.bit_pattern, self.n / (2 * self.k as u64));
        Ok(())
    }
}

fn check_k(k: u16) -> Result<(), Error> {
    if !k.is_power_of_two() || !(MIN_K..=MAX_K).contains(&k) {
        return Err(Error::domain(format!(
            "k must be a power of 2 in [{MIN_K}, {MAX_K}], got {k}"
        )));
    }
    Ok(())
}

fn occupied_levels(pattern: u64) -> impl Iterator<Item = usize> {
    (0..64usize).filter(move |level| (pattern >> level) & 1 == 1)
}

fn num_levels_needed(k: u16, n: u64) -> usize {
    let filled = n / (2 * k as u64);
    (64 - filled.leading_zeros()) as usize
}

fn lowest_zero_bit_starting_at(bits: u64, starting_bit: usize) -> usize {
    let mut pos = starting_bit & 0x3f;
    let mut remaining = bits >> pos;
    while remaining & 1 != 0 {
        remaining >>= 1;
        pos += 1;
    }
    pos
}

/// Picks one survivor per stride group, at a random offset within the
/// group, keeping the output sorted.
fn zip_with_stride<R: RandomSource>(src: &[f64], dst: &mut [f64], stride: usize, rng: &mut R) {
    let random_offset = rng.next_bounded(stride as u64) as usize;
    for (j, slot) in dst.iter_mut().enumerate() {
        *slot = src[j * stride + random_offset];
    }
}

fn merge_two_sorted_runs(a: &[f64], b: &[f64], out: &mut [f64]) {
    debug_assert_eq!(a.len() + b.len(), out.len());
    let mut i = 0;
    let mut j = 0;
    for slot in out.iter_mut() {
        *slot = if i < a.len() && (j >= b.len() || a[i] <= b[j]) {
            let value = a[i];
            i += 1;
            value
        } else {
            let value = b[j];
            j += 1;
            value
        };
    }
}
