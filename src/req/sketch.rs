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

use super::Criteria;
use super::DEFAULT_K;
use super::MAX_K;
use super::MIN_K;
use super::auxiliary::ReqAuxiliary;
use super::compactor::ReqCompactor;
use super::serialization::EMPTY_FLAG_MASK;
use super::serialization::HRA_FLAG_MASK;
use super::serialization::LE_CRITERION_FLAG_MASK;
use super::serialization::PREAMBLE_LONGS_EMPTY;
use super::serialization::PREAMBLE_LONGS_NONEMPTY;
use super::serialization::SER_VER;
use crate::codec::Family;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::common::XorShift64;
use crate::error::Error;

/// Relative-error quantiles sketch over `f32` values.
///
/// A stack of compactors, each holding a sorted run of weight `2^height`;
/// a full compactor halves part of its run and promotes the survivors one
/// level up. The error is relative to the queried rank, tightening toward
/// rank 1 when `hra` is set and toward rank 0 otherwise.
///
/// See the [req module documentation](crate::req) for more.
#[derive(Debug, Clone)]
pub struct ReqSketch {
    k: u16,
    hra: bool,
    criterion: Criteria,
    total_n: u64,
    max_nom_size: usize,
    retained: usize,
    min_value: f32,
    max_value: f32,
    compactors: Vec<ReqCompactor>,
    rng: XorShift64,
}

impl Default for ReqSketch {
    fn default() -> Self {
        // DEFAULT_K with high-rank accuracy is always a valid configuration.
        Self::new(DEFAULT_K, true).unwrap_or_else(|_| unreachable!())
    }
}

impl ReqSketch {
    /// Creates a new sketch.
    ///
    /// `k` is the section size controlling the relative error target and
    /// must be even and in `[4, 1024]`. `hra` selects whether accuracy is
    /// highest near rank 1 (true) or rank 0 (false).
    pub fn new(k: u16, hra: bool) -> Result<Self, Error> {
        if k & 1 == 1 || !(MIN_K..=MAX_K).contains(&k) {
            return Err(Error::domain(format!(
                "k must be even and in [{MIN_K}, {MAX_K}], got {k}"
            )));
        }
        let mut sketch = Self {
            k,
            hra,
            criterion: Criteria::Lt,
            total_n: 0,
            max_nom_size: 0,
            retained: 0,
            min_value: f32::INFINITY,
            max_value: f32::NEG_INFINITY,
            compactors: Vec::new(),
            rng: XorShift64::default(),
        };
        sketch.grow();
        Ok(sketch)
    }

    /// Creates a new sketch whose compaction coin flips are seeded for
    /// reproducibility.
    pub fn with_seed(k: u16, hra: bool, seed: u64) -> Result<Self, Error> {
        let mut sketch = Self::new(k, hra)?;
        sketch.rng = XorShift64::seeded(seed);
        Ok(sketch)
    }

    /// Returns the configured section size k.
    pub fn k(&self) -> u16 {
        self.k
    }

    /// Returns true if accuracy is highest near the top ranks.
    pub fn high_rank_accuracy(&self) -> bool {
        self.hra
    }

    /// Returns the rank comparison criterion used by queries.
    pub fn criterion(&self) -> Criteria {
        self.criterion
    }

    /// Sets the rank comparison criterion used by queries.
    pub fn set_criterion(&mut self, criterion: Criteria) {
        self.criterion = criterion;
    }

    /// Returns total number of values presented to the sketch.
    pub fn n(&self) -> u64 {
        self.total_n
    }

    /// Returns true if the sketch has not seen any data.
    pub fn is_empty(&self) -> bool {
        self.total_n == 0
    }

    /// Returns the number of retained values.
    pub fn num_retained(&self) -> usize {
        self.retained
    }

    /// Returns the smallest value seen by the sketch.
    pub fn min_value(&self) -> Option<f32> {
        if self.is_empty() { None } else { Some(self.min_value) }
    }

    /// Returns the largest value seen by the sketch.
    pub fn max_value(&self) -> Option<f32> {
        if self.is_empty() { None } else { Some(self.max_value) }
    }

    /// Updates the sketch with a new value. NaN values are ignored.
    pub fn update(&mut self, value: f32) -> Result<(), Error> {
        if value.is_nan() {
            return Ok(());
        }
        if self.is_empty() {
            self.min_value = value;
            self.max_value = value;
        } else {
            if value < self.min_value {
                self.min_value = value;
            }
            if value > self.max_value {
                self.max_value = value;
            }
        }
        self.compactors[0].buffer_mut().append(value);
        self.retained += 1;
        self.total_n += 1;
        if self.retained >= self.max_nom_size {
            self.compress()?;
        }
        Ok(())
    }

    /// Merges another sketch into this one. Both sketches must share the
    /// same rank-accuracy orientation.
    pub fn merge(&mut self, other: &ReqSketch) -> Result<(), Error> {
        if other.is_empty() {
            return Ok(());
        }
        if self.hra != other.hra {
            return Err(Error::domain(
                "both sketches must use the same high-rank-accuracy setting",
            ));
        }
        self.total_n += other.total_n;
        if other.min_value < self.min_value {
            self.min_value = other.min_value;
        }
        if other.max_value > self.max_value {
            self.max_value = other.max_value;
        }
        while self.compactors.len() < other.compactors.len() {
            self.grow();
        }
        for (height, other_compactor) in other.compactors.iter().enumerate() {
            self.compactors[height].merge(other_compactor)?;
        }
        self.update_aggregates();
        while self.retained >= self.max_nom_size {
            self.compress()?;
        }
        Ok(())
    }

    /// Returns the normalized rank of the given value under the sketch
    /// criterion.
    pub fn rank(&self, value: f32) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let lteq = self.criterion == Criteria::Le;
        let mut count = 0u64;
        for compactor in &self.compactors {
            let mut run = compactor.buffer().clone();
            count += (1u64 << compactor.lg_weight()) * run.count_lt_or_eq(value, lteq) as u64;
        }
        Some(count as f64 / self.total_n as f64)
    }

    /// Returns the quantile of the largest normalized rank below (or at,
    /// per the criterion) the given normalized rank, which must be in
    /// `[0.0, 1.0]`. A rank below every retained entry yields NaN.
    pub fn quantile(&self, norm_rank: f64) -> Result<Option<f32>, Error> {
        if !(0.0..=1.0).contains(&norm_rank) {
            return Err(Error::domain(format!(
                "normalized rank must be in [0.0, 1.0]: {norm_rank}"
            )));
        }
        if self.is_empty() {
            return Ok(None);
        }
        Ok(Some(ReqAuxiliary::new(self).quantile(norm_rank, self.criterion)))
    }

    /// Resets the sketch to its virgin state, keeping the configuration.
    pub fn reset(&mut self) {
        self.total_n = 0;
        self.retained = 0;
        self.max_nom_size = 0;
        self.min_value = f32::INFINITY;
        self.max_value = f32::NEG_INFINITY;
        self.compactors.clear();
        self.grow();
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
        bytes.write_u8(Family::RELATIVE_ERROR.id);
        let mut flags = 0u8;
        if empty {
            flags |= EMPTY_FLAG_MASK;
        }
        if self.hra {
            flags |= HRA_FLAG_MASK;
        }
        if self.criterion == Criteria::Le {
            flags |= LE_CRITERION_FLAG_MASK;
        }
        bytes.write_u8(flags);
        bytes.write_u16_le(self.k);
        bytes.write_u8(self.compactors.len() as u8);
        bytes.write_u8(0);
        if empty {
            return bytes.into_bytes();
        }

        bytes.write_u64_le(self.total_n);
        bytes.write_f32_le(self.min_value);
        bytes.write_f32_le(self.max_value);
        for compactor in &self.compactors {
            bytes.write_u64_le(compactor.state());
            bytes.write_u32_le(compactor.section_size());
            bytes.write_u32_le(compactor.num_sections());
            bytes.write_u32_le(compactor.buffer().len() as u32);
            for value in compactor.buffer().as_slice() {
                bytes.write_f32_le(*value);
            }
        }
        bytes.into_bytes()
    }

    /// Deserializes a sketch from bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<ReqSketch, Error> {
        let mut cursor = SketchSlice::new(bytes);
        let read_err = |what: &'static str| move |_| Error::insufficient_data(what);

        let pre_longs = cursor.read_u8().map_err(read_err("preamble"))?;
        let ser_ver = cursor.read_u8().map_err(read_err("preamble"))?;
        let family = cursor.read_u8().map_err(read_err("preamble"))?;
        let flags = cursor.read_u8().map_err(read_err("preamble"))?;
        let k = cursor.read_u16_le().map_err(read_err("preamble"))?;
        let num_compactors = cursor.read_u8().map_err(read_err("preamble"))? as usize;
        let _unused = cursor.read_u8().map_err(read_err("preamble"))?;

        if pre_longs != PREAMBLE_LONGS_EMPTY && pre_longs != PREAMBLE_LONGS_NONEMPTY {
            return Err(Error::corruption(format!(
                "preamble longs must be {PREAMBLE_LONGS_EMPTY} or {PREAMBLE_LONGS_NONEMPTY}: {pre_longs}"
            )));
        }
        if ser_ver != SER_VER {
            return Err(Error::unsupported_serial_version(SER_VER, ser_ver));
        }
        Family::RELATIVE_ERROR.validate_id(family)?;
        if k & 1 == 1 || !(MIN_K..=MAX_K).contains(&k) {
            return Err(Error::corruption(format!("k out of range: {k}")));
        }
        let is_empty = (flags & EMPTY_FLAG_MASK) != 0;
        if is_empty != (pre_longs == PREAMBLE_LONGS_EMPTY) {
            return Err(Error::corruption(
                "empty flag disagrees with preamble length",
            ));
        }
        let hra = (flags & HRA_FLAG_MASK) != 0;
        let criterion = if (flags & LE_CRITERION_FLAG_MASK) != 0 {
            Criteria::Le
        } else {
            Criteria::Lt
        };

        let mut sketch = ReqSketch::new(k, hra)?;
        sketch.criterion = criterion;
        if is_empty {
            return Ok(sketch);
        }
        if num_compactors == 0 {
            return Err(Error::corruption("populated sketch must have compactors"));
        }

        let n = cursor.read_u64_le().map_err(read_err("n"))?;
        if n == 0 {
            return Err(Error::corruption("populated sketch must have n > 0"));
        }
        let min_value = cursor.read_f32_le().map_err(read_err("min value"))?;
        let max_value = cursor.read_f32_le().map_err(read_err("max value"))?;
        if !(min_value <= max_value) {
            return Err(Error::corruption("min value exceeds max value"));
        }

        sketch.compactors.clear();
        for height in 0..num_compactors {
            let state = cursor.read_u64_le().map_err(read_err("compactor state"))?;
            let section_size = cursor
                .read_u32_le()
                .map_err(read_err("compactor section size"))?;
            let num_sections = cursor
                .read_u32_le()
                .map_err(read_err("compactor sections"))?;
            if section_size == 0
                || num_sections == 0
                || (section_size as u64) * (num_sections as u64) > (1 << 20)
            {
                return Err(Error::corruption("compactor section layout is invalid"));
            }
            let count = cursor.read_u32_le().map_err(read_err("compactor count"))? as usize;
            let mut compactor =
                ReqCompactor::from_state(height as u8, hra, state, section_size, num_sections);
            let mut items = Vec::new();
            for _ in 0..count {
                items.push(cursor.read_f32_le().map_err(read_err("compactor items"))?);
            }
            // A bottom-space buffer appends downward, so restoring the
            // serialized (ascending-offset) order means appending in
            // reverse.
            if hra {
                items.reverse();
            }
            for value in items {
                compactor.buffer_mut().append(value);
            }
            sketch.compactors.push(compactor);
        }
        sketch.total_n = n;
        sketch.min_value = min_value;
        sketch.max_value = max_value;
        sketch.update_aggregates();
        Ok(sketch)
    }

    pub(crate) fn compactors(&self) -> &[ReqCompactor] {
        &self.compactors
    }

    fn serialized_size(&self) -> usize {
        if self.is_empty() {
            return 8;
        }
        8 + 8 + 8 + self.compactors.len() * 20 + 4 * self.retained
    }

    fn grow(&mut self) {
        let lg_weight = self.compactors.len() as u8;
        self.compactors
            .push(ReqCompactor::new(lg_weight, self.k as u32, self.hra));
        self.update_aggregates();
    }

    fn compress(&mut self) -> Result<(), Error> {
        for height in 0..self.compactors.len() {
            if self.compactors[height].buffer().len() >= self.compactors[height].nom_capacity() {
                if height + 1 >= self.compactors.len() {
                    self.grow();
                }
                let promote = self.compactors[height].compact(&mut self.rng)?;
                self.compactors[height + 1].buffer_mut().sort();
                self.compactors[height + 1]
                    .buffer_mut()
                    .merge_sort_in(&promote)?;
                self.update_aggregates();
                if self.retained < self.max_nom_size {
                    break;
                }
            }
        }
        Ok(())
    }

    fn update_aggregates(&mut self) {
        self.retained = self
            .compactors
            .iter()
            .map(|compactor| compactor.buffer().len())
            .sum();
        self.max_nom_size = self
            .compactors
            .iter()
            .map(|compactor| compactor.nom_capacity())
            .sum();
    }
}
