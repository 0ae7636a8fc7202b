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

//! A growable buffer of floats with selectable orientation.
//!
//! The active region sits at the top of the backing array when
//! `space_at_bottom` is set, at the bottom otherwise. Public offsets are
//! always relative to the active region, so callers never see the
//! orientation.

use crate::error::Error;

#[derive(Debug, Clone)]
pub(crate) struct FloatBuffer {
    arr: Vec<f32>,
    count: usize,
    delta: usize,
    sorted: bool,
    space_at_bottom: bool,
}

impl FloatBuffer {
    /// Creates an empty buffer with the given capacity and growth step.
    pub fn new(capacity: usize, delta: usize, space_at_bottom: bool) -> Self {
        Self {
            arr: vec![0.0; capacity],
            count: 0,
            delta,
            sorted: true,
            space_at_bottom,
        }
    }

    /// Takes ownership of the given items as the active region and sorts
    /// them unless already sorted.
    pub fn wrap(items: Vec<f32>, is_sorted: bool, space_at_bottom: bool) -> Self {
        let count = items.len();
        let mut buf = Self {
            arr: items,
            count,
            delta: 0,
            sorted: is_sorted,
            space_at_bottom,
        };
        buf.sort();
        buf
    }

    /// Appends the item, growing the backing array by `delta` when full.
    pub fn append(&mut self, item: f32) {
        self.ensure_space(1);
        let index = if self.space_at_bottom {
            self.arr.len() - self.count - 1
        } else {
            self.count
        };
        self.arr[index] = item;
        self.count += 1;
        // a single item is trivially sorted
        if self.count > 1 {
            self.sorted = false;
        }
    }

    /// Ensures the backing array holds at least `new_capacity` slots,
    /// keeping the active region at its oriented end.
    pub fn ensure_capacity(&mut self, new_capacity: usize) {
        if new_capacity <= self.arr.len() {
            return;
        }
        let mut out = vec![0.0f32; new_capacity];
        let src = self.active_start();
        let dst = if self.space_at_bottom {
            new_capacity - self.count
        } else {
            0
        };
        out[dst..dst + self.count].copy_from_slice(&self.arr[src..src + self.count]);
        self.arr = out;
    }

    /// Number of active items.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Total number of slots in the backing array.
    pub fn capacity(&self) -> usize {
        self.arr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// The active region, lowest offset first.
    pub fn as_slice(&self) -> &[f32] {
        let start = self.active_start();
        &self.arr[start..start + self.count]
    }

    /// Sorts the active region in place. A no-op if already sorted.
    pub fn sort(&mut self) {
        if self.sorted {
            return;
        }
        let start = self.active_start();
        let count = self.count;
        self.arr[start..start + count].sort_by(f32::total_cmp);
        self.sorted = true;
    }

    /// Returns the count of active items less than (or, with `lteq`, less
    /// than or equal to) the given value, sorting lazily first.
    pub fn count_lt_or_eq(&mut self, value: f32, lteq: bool) -> usize {
        self.sort();
        let slice = self.as_slice();
        if lteq {
            slice.partition_point(|&x| x <= value)
        } else {
            slice.partition_point(|&x| x < value)
        }
    }

    /// Returns a new sorted buffer holding every other item of the range
    /// `[start_offset, end_offset)` of the active region, which is sorted
    /// first. The range size must be even.
    pub fn evens_or_odds(
        &mut self,
        start_offset: usize,
        end_offset: usize,
        odds: bool,
    ) -> Result<FloatBuffer, Error> {
        let range = end_offset - start_offset;
        if range & 1 == 1 {
            return Err(Error::domain("input range size must be even"));
        }
        let base = self.active_start();
        let start = base + start_offset;
        let end = base + end_offset;
        self.arr[start..end].sort_by(f32::total_cmp);

        let first = if odds { 1 } else { 0 };
        let mut out = Vec::with_capacity(range / 2);
        let mut i = start + first;
        while i < end {
            out.push(self.arr[i]);
            i += 2;
        }
        Ok(FloatBuffer::wrap(out, true, self.space_at_bottom))
    }

    /// Merges the incoming sorted buffer into this sorted buffer, stably.
    pub fn merge_sort_in(&mut self, other: &FloatBuffer) -> Result<(), Error> {
        if !self.sorted || !other.is_sorted() {
            return Err(Error::domain("both buffers must be sorted"));
        }
        let in_len = other.len();
        self.ensure_space(in_len);
        let other_slice = other.as_slice();
        let capacity = self.arr.len();
        let total = self.count + in_len;

        if self.space_at_bottom {
            // Scan up, insert at the bottom.
            let target_start = capacity - total;
            let mut i = capacity - self.count;
            let mut j = 0usize;
            for k in target_start..capacity {
                self.arr[k] = if i < capacity && j < in_len {
                    if self.arr[i] <= other_slice[j] {
                        let value = self.arr[i];
                        i += 1;
                        value
                    } else {
                        let value = other_slice[j];
                        j += 1;
                        value
                    }
                } else if i < capacity {
                    let value = self.arr[i];
                    i += 1;
                    value
                } else {
                    let value = other_slice[j];
                    j += 1;
                    value
                };
            }
        } else {
            // Scan down, insert at the top.
            let mut i = self.count as isize - 1;
            let mut j = in_len as isize - 1;
            for k in (0..total).rev() {
                self.arr[k] = if i >= 0 && j >= 0 {
                    if self.arr[i as usize] >= other_slice[j as usize] {
                        let value = self.arr[i as usize];
                        i -= 1;
                        value
                    } else {
                        let value = other_slice[j as usize];
                        j -= 1;
                        value
                    }
                } else if i >= 0 {
                    let value = self.arr[i as usize];
                    i -= 1;
                    value
                } else {
                    let value = other_slice[j as usize];
                    j -= 1;
                    value
                };
            }
        }
        self.count = total;
        self.sorted = true;
        Ok(())
    }

    /// Shrinks the backing array to the active length.
    pub fn trim_capacity(&mut self) {
        if self.count == self.arr.len() {
            return;
        }
        let start = self.active_start();
        let mut out = vec![0.0f32; self.count];
        out.copy_from_slice(&self.arr[start..start + self.count]);
        self.arr = out;
    }

    /// Reduces the active length to `new_length`; never grows. Slots
    /// outside the new active region keep their garbage.
    pub fn trim_length(&mut self, new_length: usize) {
        if new_length < self.count {
            self.count = new_length;
        }
    }

    fn active_start(&self) -> usize {
        if self.space_at_bottom {
            self.arr.len() - self.count
        } else {
            0
        }
    }

    fn ensure_space(&mut self, space: usize) {
        if self.count + space > self.arr.len() {
            self.ensure_capacity(self.count + space + self.delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_lazy_sorted_count() {
        let mut buf = FloatBuffer::new(16, 4, false);
        buf.append(3.0);
        buf.append(1.0);
        buf.append(2.0);
        assert!(!buf.is_sorted());
        assert_eq!(buf.count_lt_or_eq(2.0, true), 2);
        assert!(buf.is_sorted());
        assert_eq!(buf.count_lt_or_eq(2.0, false), 1);
        assert_eq!(buf.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_append_grows_past_capacity() {
        let mut buf = FloatBuffer::new(2, 3, true);
        for i in 0..10 {
            buf.append(i as f32);
        }
        assert_eq!(buf.len(), 10);
        assert!(buf.capacity() >= 10);
        buf.sort();
        assert_eq!(buf.as_slice()[0], 0.0);
        assert_eq!(buf.as_slice()[9], 9.0);
    }

    #[test]
    fn test_merge_sort_in_both_orientations() {
        for space_at_bottom in [false, true] {
            let mut a = FloatBuffer::new(8, 8, space_at_bottom);
            for value in [1.0f32, 3.0, 5.0] {
                a.append(value);
            }
            a.sort();
            let b = FloatBuffer::wrap(vec![2.0, 3.0, 6.0], true, space_at_bottom);
            a.merge_sort_in(&b).unwrap();
            assert_eq!(a.len(), 6);
            assert!(a.is_sorted());
            assert_eq!(a.as_slice(), &[1.0, 2.0, 3.0, 3.0, 5.0, 6.0]);
        }
    }

    #[test]
    fn test_merge_sort_in_requires_sorted() {
        let mut a = FloatBuffer::new(8, 8, false);
        a.append(2.0);
        a.append(1.0);
        let b = FloatBuffer::wrap(vec![3.0], true, false);
        assert!(a.merge_sort_in(&b).is_err());
    }

    #[test]
    fn test_evens_or_odds() {
        let mut buf = FloatBuffer::new(8, 0, false);
        for value in [4.0f32, 2.0, 3.0, 1.0] {
            buf.append(value);
        }
        let evens = buf.evens_or_odds(0, 4, false).unwrap();
        assert_eq!(evens.as_slice(), &[1.0, 3.0]);
        let odds = buf.evens_or_odds(0, 4, true).unwrap();
        assert_eq!(odds.as_slice(), &[2.0, 4.0]);
    }

    #[test]
    fn test_evens_or_odds_odd_range_is_domain_error() {
        let mut buf = FloatBuffer::new(8, 0, false);
        for value in [1.0f32, 2.0, 3.0] {
            buf.append(value);
        }
        assert!(buf.evens_or_odds(0, 3, false).is_err());
    }

    #[test]
    fn test_trim_length_drops_away_from_accurate_end() {
        let mut top = FloatBuffer::new(8, 0, false);
        for value in [1.0f32, 2.0, 3.0, 4.0] {
            top.append(value);
        }
        top.sort();
        top.trim_length(2);
        assert_eq!(top.as_slice(), &[1.0, 2.0]);

        let mut bottom = FloatBuffer::new(8, 0, true);
        for value in [1.0f32, 2.0, 3.0, 4.0] {
            bottom.append(value);
        }
        bottom.sort();
        bottom.trim_length(2);
        assert_eq!(bottom.as_slice(), &[3.0, 4.0]);
    }

    #[test]
    fn test_trim_capacity() {
        let mut buf = FloatBuffer::new(32, 0, true);
        buf.append(2.0);
        buf.append(1.0);
        buf.trim_capacity();
        assert_eq!(buf.capacity(), 2);
        buf.sort();
        assert_eq!(buf.as_slice(), &[1.0, 2.0]);
    }
}
