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

//! Item hashing for the sketch hash tables.
//!
//! Generic items hash through MurmurHash3 x64/128; raw 64-bit keys take
//! the much cheaper `fmix64` finalizer path instead.

use std::hash::Hash;
use std::hash::Hasher;

/// The seed 9001 used in the sketch update methods is a prime number that was chosen very early
/// on in experimental testing.
///
/// In order to perform set operations on two sketches it is critical that the hash function and
/// seed are identical for both sketches, otherwise the assumed 1:1 relationship between the
/// original source key value and the hashed bit string would be violated.
pub(crate) const DEFAULT_UPDATE_SEED: u32 = 9001;

/// 64-bit hashing capability for sketch keys.
///
/// The provided method routes through MurmurHash3; fixed-width 64-bit
/// keys override it with the `fmix64` finalizer, which mixes all 64
/// bits at a fraction of the cost. Custom key types opt in with an empty
/// impl block.
pub trait SketchHash: Hash {
    /// Returns the 64-bit hash the sketch hash tables probe with.
    fn sketch_hash(&self) -> u64 {
        hash_item(self)
    }
}

impl SketchHash for i64 {
    fn sketch_hash(&self) -> u64 {
        hash_long(*self)
    }
}

impl SketchHash for u64 {
    fn sketch_hash(&self) -> u64 {
        fmix64(*self)
    }
}

impl SketchHash for String {}

impl SketchHash for &str {}

/// Hashes an item into 64 bits through MurmurHash3 x64/128.
#[inline]
pub(crate) fn hash_item<T: Hash + ?Sized>(item: &T) -> u64 {
    let mut hasher = mur3::Hasher128::with_seed(DEFAULT_UPDATE_SEED);
    item.hash(&mut hasher);
    hasher.finish()
}

/// Hashes a raw 64-bit key.
#[inline]
pub(crate) fn hash_long(key: i64) -> u64 {
    fmix64(key as u64)
}

/// The MurmurHash3 finalization mix, a full-avalanche bijection on 64 bits.
#[inline]
pub(crate) fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51afd7ed558ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ceb9fe1a85ec53);
    k ^ (k >> 33)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_item(&42i64), hash_item(&42i64));
        assert_eq!(hash_item(&"alpha"), hash_item(&"alpha"));
        assert_eq!(42i64.sketch_hash(), 42i64.sketch_hash());
    }

    #[test]
    fn test_hash_spreads_nearby_keys() {
        let a = hash_item(&1i64);
        let b = hash_item(&2i64);
        assert_ne!(a, b);
        assert_ne!(a ^ b, u64::MAX);
    }

    #[test]
    fn test_long_keys_take_the_fmix64_path() {
        assert_eq!(1i64.sketch_hash(), fmix64(1));
        assert_eq!((-1i64).sketch_hash(), fmix64(u64::MAX));
        assert_eq!(7u64.sketch_hash(), fmix64(7));
    }

    #[test]
    fn test_fmix64_avalanche() {
        assert_eq!(fmix64(0), 0);
        assert_ne!(fmix64(1), fmix64(2));
        // a one-bit change flips roughly half the output bits
        let flipped = (fmix64(1) ^ fmix64(3)).count_ones();
        assert!((16..=48).contains(&flipped));
    }
}
