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

//! Frequency sketches for finding heavy hitters in data streams.
//!
//! The sketch tracks approximate frequencies with deterministic upper and
//! lower bounds, and can report the heavy hitters with either no false
//! negatives or no false positives.
//!
//! Keys hash through [`SketchHash`]: MurmurHash3 for general items, the
//! cheaper fmix64 finalizer for raw 64-bit keys.
//!
//! # Usage
//!
//! ```rust
//! # use sketches::frequencies::ErrorType;
//! # use sketches::frequencies::FrequentItemsSketch;
//! let mut sketch = FrequentItemsSketch::<i64>::new(64).unwrap();
//! sketch.update_with_count(1, 3).unwrap();
//! sketch.update(2).unwrap();
//! let rows = sketch.frequent_items(ErrorType::NoFalseNegatives);
//! assert!(rows.iter().any(|row| *row.item() == 1));
//! ```
//!
//! # Serialization
//!
//! ```rust
//! # use sketches::frequencies::FrequentItemsSketch;
//! # use sketches::frequencies::LongsSerde;
//! let mut sketch = FrequentItemsSketch::<i64>::new(64).unwrap();
//! sketch.update_with_count(42, 2).unwrap();
//!
//! let bytes = sketch.serialize_with(&LongsSerde);
//! let decoded = FrequentItemsSketch::<i64>::deserialize_with(&bytes, &LongsSerde).unwrap();
//! assert!(decoded.estimate(&42) >= 2);
//! ```

mod reverse_purge_hash_map;
mod serde;
mod serialization;
mod sketch;

pub use crate::hash::SketchHash;

pub use self::serde::ItemsSerde;
pub use self::serde::LongsSerde;
pub use self::serde::StringsSerde;
pub use self::sketch::ErrorType;
pub use self::sketch::FrequentItemsSketch;
pub use self::sketch::Row;
