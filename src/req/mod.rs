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

//! Relative-error quantiles sketch.
//!
//! Unlike the [quantiles](crate::quantiles) sketch, whose rank error is
//! uniform, this sketch keeps the error proportional to the distance from
//! one chosen end of the rank range: exact at the accurate end, coarser
//! toward the other. It is built from a stack of compactors that
//! probabilistically halve sorted runs.
//!
//! # Usage
//!
//! ```rust
//! # use sketches::req::ReqSketch;
//! let mut sketch = ReqSketch::new(12, true).unwrap();
//! for i in 1..=10_000 {
//!     sketch.update(i as f32).unwrap();
//! }
//! // accuracy is tightest near the top ranks
//! let p99 = sketch.quantile(0.99).unwrap().unwrap();
//! assert!(p99 > 9_500.0);
//! ```

mod auxiliary;
mod buffer;
mod compactor;
mod serialization;
mod sketch;

pub use self::sketch::ReqSketch;

/// Default section size.
pub const DEFAULT_K: u16 = 12;
/// Minimum section size.
pub const MIN_K: u16 = 4;
/// Maximum section size.
pub const MAX_K: u16 = 1024;

/// Comparison criterion for rank and quantile searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criteria {
    /// Strictly less than.
    Lt,
    /// Less than or equal.
    Le,
}
