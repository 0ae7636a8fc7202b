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

//! Binary serialization format constants for relative-error sketches.
//!
//! Byte 0 carries the preamble length in longs; byte 3 the flags; bytes
//! 4-5 the section size k; byte 6 the number of compactors. A populated
//! sketch adds `n`, the extrema, and one record per compactor (state,
//! section layout and retained items, bottom compactor first).

/// Serialization version.
pub(crate) const SER_VER: u8 = 1;

/// Preamble longs for an empty sketch.
pub(crate) const PREAMBLE_LONGS_EMPTY: u8 = 1;
/// Preamble longs for a populated sketch.
pub(crate) const PREAMBLE_LONGS_NONEMPTY: u8 = 2;

/// Flags bit 2 marks an empty sketch.
pub(crate) const EMPTY_FLAG_MASK: u8 = 0x04;
/// Flags bit 3 marks high-rank-accuracy orientation.
pub(crate) const HRA_FLAG_MASK: u8 = 0x08;
/// Flags bit 4 marks the less-than-or-equal rank criterion.
pub(crate) const LE_CRITERION_FLAG_MASK: u8 = 0x10;
