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

//! Quantiles sketch with compact levels and carry propagation.
//!
//! The sketch answers approximate rank, quantile, CDF and PMF queries
//! over a numeric stream using bounded memory, with a rank error of
//! roughly `1.65 / k`. Sketches merge through [`QuantilesUnion`], which
//! also handles inputs configured with different k.
//!
//! # Usage
//!
//! ```rust
//! # use sketches::quantiles::QuantilesSketch;
//! let mut sketch = QuantilesSketch::new(128).unwrap();
//! for i in 1..=1000 {
//!     sketch.update(i as f64);
//! }
//! let median = sketch.quantile(0.5, true).unwrap().unwrap();
//! assert!(median > 400.0 && median < 600.0);
//! ```

mod serialization;
mod sketch;
mod sorted_view;
mod union;

pub use self::sketch::QuantilesSketch;
pub use self::union::QuantilesUnion;

/// Default value of parameter k.
pub const DEFAULT_K: u16 = 128;
/// Minimum value of parameter k.
pub const MIN_K: u16 = 2;
/// Maximum value of parameter k.
pub const MAX_K: u16 = 32768;
