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

//! Binary serialization format constants for quantiles sketches.
//!
//! Byte 0 holds the preamble length in longs, so a reader can size the
//! header before validating the rest. An empty sketch serializes to a
//! single preamble long; a populated sketch adds a second long for `n`,
//! the two extrema, the base buffer and the occupied levels bottom-up.
//! The bit pattern is not stored: it is always `n / 2k`.

/// Serialization version.
pub(crate) const SER_VER: u8 = 1;

/// Preamble longs for an empty sketch.
pub(crate) const PREAMBLE_LONGS_EMPTY: u8 = 1;
/// Preamble longs for a populated sketch.
pub(crate) const PREAMBLE_LONGS_NONEMPTY: u8 = 2;

/// Flags bit 2 marks an empty sketch.
pub(crate) const EMPTY_FLAG_MASK: u8 = 0x04;
