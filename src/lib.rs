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

//! # Sketches
//!
//! Compact, mergeable summaries answering approximate queries over data
//! streams far larger than memory, with worst-case error guarantees and a
//! stable serialized form.
//!
//! The library is divided into modules that constitute distinct groups of
//! functionality:
//!
//! - [`frequencies`] — approximate counts of heavy hitters with
//!   deterministic error bounds.
//! - [`quantiles`] — rank, quantile, CDF and PMF queries with uniform
//!   rank error, plus a union operation.
//! - [`req`] — quantiles with error relative to the queried rank.
//! - [`hll`] — dense bucket storage and aggregation utilities for
//!   distinct counting.
//!
//! All sketches are single-writer: update paths assume exclusive
//! mutation, while read-only queries on a quiescent sketch are safe to
//! run in parallel.

pub mod codec;
pub mod common;
pub mod error;
pub mod frequencies;
pub mod hll;
pub mod quantiles;
pub mod req;

mod hash;
