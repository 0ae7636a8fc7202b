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

//! Dense on-heap bucket array.

use crate::error::Error;

/// Version byte written ahead of the raw bucket bytes.
const DENSE_VERSION: u8 = 2;

/// Delta record describing one effective bucket increase.
///
/// Replaces a callback interface: the caller of [`DenseBuckets::update`]
/// decides whether to observe the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketUpdate {
    /// Index of the bucket that changed.
    pub bucket: u32,
    /// Value stored before the update.
    pub old_value: u8,
    /// Value stored after the update.
    pub new_value: u8,
}

/// Dense mapping from bucket index to byte value with `max` update semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenseBuckets {
    buckets: Vec<u8>,
}

impl DenseBuckets {
    /// Creates a store of `num_buckets` zeroed buckets.
    pub fn new(num_buckets: usize) -> Result<Self, Error> {
        if num_buckets == 0 {
            return Err(Error::domain("num_buckets must be positive"));
        }
        Ok(Self {
            buckets: vec![0; num_buckets],
        })
    }

    /// Returns the configured number of buckets.
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the value currently stored in a bucket.
    pub fn get(&self, index: usize) -> u8 {
        self.buckets[index]
    }

    /// Assigns `value` to bucket `index` if it exceeds the stored value.
    ///
    /// Returns the delta record exactly once per effective change, and
    /// `None` when the write had no effect.
    pub fn update(&mut self, index: usize, value: u8) -> Option<BucketUpdate> {
        let old_value = self.buckets[index];
        if value <= old_value {
            return None;
        }
        self.buckets[index] = value;
        Some(BucketUpdate {
            bucket: index as u32,
            old_value,
            new_value: value,
        })
    }

    /// Returns a single-pass iterator over the non-zero buckets.
    pub fn iter(&self) -> DenseBucketIter<'_> {
        DenseBucketIter {
            buckets: &self.buckets,
            index: 0,
        }
    }

    /// Returns the number of bytes [`Self::write_into`] needs.
    pub fn serialized_size(&self) -> usize {
        1 + self.buckets.len()
    }

    /// Writes the version byte and raw bucket bytes at `offset`, returning
    /// the offset one past the written data.
    pub fn write_into(&self, out: &mut [u8], offset: usize) -> Result<usize, Error> {
        let needed = self.serialized_size();
        if out.len().saturating_sub(offset) < needed {
            return Err(Error::capacity(format!(
                "output too small: {} < {}",
                out.len().saturating_sub(offset),
                needed
            )));
        }
        out[offset] = DENSE_VERSION;
        out[offset + 1..offset + needed].copy_from_slice(&self.buckets);
        Ok(offset + needed)
    }

    /// Serializes the store to a fresh byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.serialized_size()];
        // Cannot fail: the vector was sized above.
        let _ = self.write_into(&mut out, 0);
        out
    }

    /// Reads a store previously written by [`Self::write_into`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.is_empty() {
            return Err(Error::insufficient_data("dense bucket version byte"));
        }
        if bytes[0] != DENSE_VERSION {
            return Err(Error::corruption(format!(
                "invalid dense bucket version: expected {DENSE_VERSION}, got {}",
                bytes[0]
            )));
        }
        if bytes.len() < 2 {
            return Err(Error::insufficient_data("dense bucket payload"));
        }
        Ok(Self {
            buckets: bytes[1..].to_vec(),
        })
    }
}

/// Iterator over the non-zero buckets of a [`DenseBuckets`] store.
///
/// Finite and single pass; zero-valued buckets are skipped transparently.
pub struct DenseBucketIter<'a> {
    buckets: &'a [u8],
    index: usize,
}

impl Iterator for DenseBucketIter<'_> {
    type Item = (u32, u8);

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.buckets.len() {
            let index = self.index;
            self.index += 1;
            if self.buckets[index] != 0 {
                return Some((index as u32, self.buckets[index]));
            }
        }
        None
    }
}
