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

//! One element of the relative-error compactor stack.

use super::buffer::FloatBuffer;
use crate::common::RandomSource;
use crate::error::Error;

const MIN_SECTION_SIZE: u32 = 4;
const INIT_NUMBER_OF_SECTIONS: u32 = 3;

/// A compactor holds items of weight `2^lg_weight` in a [`FloatBuffer`]
/// oriented so that compaction trims the end away from the accurate ranks.
#[derive(Debug, Clone)]
pub(crate) struct ReqCompactor {
    lg_weight: u8,
    hra: bool,
    buf: FloatBuffer,
    coin: bool,
    state: u64,
    section_size: u32,
    num_sections: u32,
}

impl ReqCompactor {
    pub fn new(lg_weight: u8, section_size: u32, hra: bool) -> Self {
        Self::from_state(lg_weight, hra, 0, section_size, INIT_NUMBER_OF_SECTIONS)
    }

    /// Rebuilds a compactor with explicit compaction state, used when
    /// deserializing.
    pub fn from_state(
        lg_weight: u8,
        hra: bool,
        state: u64,
        section_size: u32,
        num_sections: u32,
    ) -> Self {
        let nom_capacity = (2 * num_sections * section_size) as usize;
        let buf = FloatBuffer::new(2 * nom_capacity, nom_capacity, hra);
        Self {
            lg_weight,
            hra,
            buf,
            coin: false,
            state,
            section_size,
            num_sections,
        }
    }

    pub fn lg_weight(&self) -> u8 {
        self.lg_weight
    }

    pub fn state(&self) -> u64 {
        self.state
    }

    pub fn section_size(&self) -> u32 {
        self.section_size
    }

    pub fn num_sections(&self) -> u32 {
        self.num_sections
    }

    pub fn buffer(&self) -> &FloatBuffer {
        &self.buf
    }

    pub fn buffer_mut(&mut self) -> &mut FloatBuffer {
        &mut self.buf
    }

    /// Number of retained items that triggers a compaction.
    pub fn nom_capacity(&self) -> usize {
        (2 * self.num_sections * self.section_size) as usize
    }

    /// Halves the compaction range of the buffer, returning the sorted
    /// survivors to be promoted to the next higher compactor.
    pub fn compact<R: RandomSource>(&mut self, rng: &mut R) -> Result<FloatBuffer, Error> {
        self.buf.sort();
        self.state += 1;
        let secs_to_compact = (self.state.trailing_zeros() + 1).min(self.num_sections);
        let (start, end) = self.compaction_range(secs_to_compact);
        // Fresh coin on every other compaction, repeated in between.
        if self.state & 1 == 1 {
            self.coin = rng.next_bool();
        }
        let promote = self.buf.evens_or_odds(start, end, self.coin)?;
        self.buf.trim_length(self.buf.len() - (end - start));
        self.ensure_enough_sections();
        Ok(promote)
    }

    /// Merges another compactor of the same height into this one.
    pub fn merge(&mut self, other: &ReqCompactor) -> Result<(), Error> {
        debug_assert_eq!(self.lg_weight, other.lg_weight, "heights must match");
        self.state |= other.state;
        while self.ensure_enough_sections() {}
        if other.buf.is_empty() {
            return Ok(());
        }
        self.buf.sort();
        let mut other_buf = other.buf.clone();
        other_buf.sort();
        other_buf.trim_capacity();
        self.buf.merge_sort_in(&other_buf)
    }

    /// The range of active offsets to compact, leaving the end near the
    /// accurate ranks untouched. Always an even count.
    fn compaction_range(&self, secs_to_compact: u32) -> (usize, usize) {
        let len = self.buf.len();
        let non_compact = self.nom_capacity() / 2
            + ((self.num_sections - secs_to_compact) * self.section_size) as usize;
        let (mut start, mut end) = if self.hra {
            (0, len.saturating_sub(non_compact))
        } else {
            (non_compact.min(len), len)
        };
        if (end - start) & 1 == 1 {
            if self.hra {
                end -= 1;
            } else {
                start += 1;
            }
        }
        (start, end)
    }

    /// Widens the section layout once enough compactions have happened:
    /// the section size shrinks by sqrt(2) while the number of sections
    /// doubles, keeping the nominal capacity stable as the error target
    /// tightens.
    fn ensure_enough_sections(&mut self) -> bool {
        let shrunk = nearest_even(self.section_size as f64 / std::f64::consts::SQRT_2);
        let threshold = 1u64
            .checked_shl(self.num_sections.saturating_sub(1))
            .unwrap_or(u64::MAX);
        if self.state >= threshold
            && self.section_size > MIN_SECTION_SIZE
            && shrunk >= MIN_SECTION_SIZE
        {
            self.section_size = shrunk;
            self.num_sections <<= 1;
            self.buf.ensure_capacity(2 * self.nom_capacity());
            return true;
        }
        false
    }
}

fn nearest_even(value: f64) -> u32 {
    (2.0 * (value / 2.0).round()) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::XorShift64;

    #[test]
    fn test_compact_halves_the_compaction_range() {
        let mut compactor = ReqCompactor::new(0, 4, false);
        let nom = compactor.nom_capacity();
        for i in 0..nom {
            compactor.buffer_mut().append(i as f32);
        }
        let mut rng = XorShift64::seeded(11);
        let before = compactor.buffer().len();
        let promote = compactor.compact(&mut rng).unwrap();
        let removed = before - compactor.buffer().len();
        assert_eq!(promote.len() * 2, removed);
        assert!(promote.is_sorted());
        assert!(compactor.buffer().len() < before);
    }

    #[test]
    fn test_low_rank_accuracy_keeps_smallest_items_exact() {
        let mut compactor = ReqCompactor::new(0, 4, false);
        let nom = compactor.nom_capacity();
        for i in (0..nom).rev() {
            compactor.buffer_mut().append(i as f32);
        }
        let mut rng = XorShift64::seeded(5);
        compactor.compact(&mut rng).unwrap();
        // The bottom of the buffer survives compaction untouched.
        assert_eq!(compactor.buffer().as_slice()[0], 0.0);
        assert_eq!(compactor.buffer().as_slice()[1], 1.0);
    }

    #[test]
    fn test_high_rank_accuracy_keeps_largest_items_exact() {
        let mut compactor = ReqCompactor::new(0, 4, true);
        let nom = compactor.nom_capacity();
        for i in 0..nom {
            compactor.buffer_mut().append(i as f32);
        }
        let mut rng = XorShift64::seeded(5);
        compactor.compact(&mut rng).unwrap();
        let len = compactor.buffer().len();
        assert_eq!(compactor.buffer().as_slice()[len - 1], (nom - 1) as f32);
    }

    #[test]
    fn test_merge_combines_buffers() {
        let mut a = ReqCompactor::new(1, 4, false);
        let mut b = ReqCompactor::new(1, 4, false);
        for i in 0..6 {
            a.buffer_mut().append(i as f32);
            b.buffer_mut().append((i + 6) as f32);
        }
        a.merge(&b).unwrap();
        assert_eq!(a.buffer().len(), 12);
        assert!(a.buffer().is_sorted());
    }
}
