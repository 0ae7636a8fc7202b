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

//! Dense bucket storage and aggregation utilities for the HLL family.
//!
//! A bucket store maps `bucket index -> byte value` with `max` update
//! semantics: a write only takes effect when the new value exceeds the
//! stored one, and the store reports each effective change as a
//! [`BucketUpdate`] delta record.
//!
//! # Usage
//!
//! ```rust
//! # use sketches::hll::{compute_inv_pow2_sum, DenseBuckets};
//! let mut buckets = DenseBuckets::new(16).unwrap();
//! assert!(buckets.update(3, 5).is_some());
//! assert!(buckets.update(3, 2).is_none());
//! let sum = compute_inv_pow2_sum(16, buckets.iter());
//! assert!(sum < 16.0);
//! ```

mod buckets;
mod utils;

pub use self::buckets::BucketUpdate;
pub use self::buckets::DenseBucketIter;
pub use self::buckets::DenseBuckets;
pub use self::utils::compute_inv_pow2_sum;
pub use self::utils::inv_pow2;
