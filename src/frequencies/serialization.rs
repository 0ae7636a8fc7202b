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

//! Preamble layout for serialized frequency sketches.
//!
//! An empty sketch needs 8 bytes; all others use a 40-byte preamble.
//! Multi-byte integers are little-endian.
//!
//! ```text
//! Long || Start Byte Adr:
//! Adr:
//!      ||    7     |    6   |    5   |    4   |    3   |    2   |    1   |     0         |
//!  0   ||----------|--Type--|-Flags--|-LgCur--|-LgMax--|-FamID--|-SerVer-|-PreambleLongs-|
//!      ||    15    |   14   |   13   |   12   |   11   |   10   |    9   |     8         |
//!  1   ||---------------(unused)-------------|--------------ActiveItems-----------------|
//!      ||    23    |   22   |   21   |   20   |   19   |   18   |   17   |    16         |
//!  2   ||----------------------------------streamLength----------------------------------|
//!      ||    31    |   30   |   29   |   28   |   27   |   26   |   25   |    24         |
//!  3   ||-------------------------------------offset-------------------------------------|
//!      ||    39    |   38   |   37   |   36   |   35   |   34   |   33   |    32         |
//!  4   ||-----------------------------------mergeError-----------------------------------|
//! ```
//!
//! The values buffer follows the preamble, then the serialized items.

/// Byte offset of the preamble length.
pub(crate) const PREAMBLE_LONGS_BYTE: usize = 0;
/// Byte offset of the serialization version.
pub(crate) const SER_VER_BYTE: usize = 1;
/// Byte offset of the family id.
pub(crate) const FAMILY_BYTE: usize = 2;
/// Byte offset of lg of the maximum map size.
pub(crate) const LG_MAX_MAP_SIZE_BYTE: usize = 3;
/// Byte offset of lg of the current map size.
pub(crate) const LG_CUR_MAP_SIZE_BYTE: usize = 4;
/// Byte offset of the flags byte.
pub(crate) const FLAGS_BYTE: usize = 5;
/// Byte offset of the item serializer type byte.
pub(crate) const SKETCH_TYPE_BYTE: usize = 6;
/// Byte offset of the active item count (u32).
pub(crate) const ACTIVE_ITEMS_INT: usize = 8;
/// Byte offset of the stream length (i64).
pub(crate) const STREAM_LENGTH_LONG: usize = 16;
/// Byte offset of the offset error term (i64).
pub(crate) const OFFSET_LONG: usize = 24;
/// Byte offset of the merge error term (i64).
pub(crate) const MERGE_ERROR_LONG: usize = 32;

/// Serialization version.
pub(crate) const SER_VER: u8 = 1;
/// Preamble longs for an empty sketch.
pub(crate) const PREAMBLE_LONGS_EMPTY: u8 = 1;
/// Preamble longs for a populated sketch.
pub(crate) const PREAMBLE_LONGS_NONEMPTY: u8 = 5;
/// Flags bit 2 marks an empty sketch.
pub(crate) const EMPTY_FLAG_MASK: u8 = 0x04;
