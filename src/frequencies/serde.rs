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

//! Item serialization for frequent items sketches.

use std::str;

use byteorder::ByteOrder;
use byteorder::LE;

use crate::error::Error;

/// Serializer/deserializer for items stored in a frequency sketch.
///
/// The type byte identifies the serializer on the wire; a reader must use
/// a serde with the same type byte it was written with.
pub trait ItemsSerde<T> {
    /// Identifies this serializer in the serialized preamble.
    fn type_byte(&self) -> u8;

    /// Serializes a slice of items to a byte buffer.
    fn serialize_items(&self, items: &[T]) -> Vec<u8>;

    /// Deserializes `num_items` from bytes, returning items and bytes consumed.
    fn deserialize_items(&self, bytes: &[u8], num_items: usize) -> Result<(Vec<T>, usize), Error>;
}

/// Serializer for `i64` items.
#[derive(Debug, Default, Clone, Copy)]
pub struct LongsSerde;

impl ItemsSerde<i64> for LongsSerde {
    fn type_byte(&self) -> u8 {
        1
    }

    fn serialize_items(&self, items: &[i64]) -> Vec<u8> {
        if items.is_empty() {
            return Vec::new();
        }
        let mut out = vec![0u8; items.len() * 8];
        LE::write_i64_into(items, &mut out);
        out
    }

    fn deserialize_items(&self, bytes: &[u8], num_items: usize) -> Result<(Vec<i64>, usize), Error> {
        let needed = num_items
            .checked_mul(8)
            .ok_or_else(|| Error::corruption("items size overflow"))?;
        if bytes.len() < needed {
            return Err(Error::insufficient_data("i64 items"));
        }
        let mut items = vec![0i64; num_items];
        LE::read_i64_into(&bytes[..needed], &mut items);
        Ok((items, needed))
    }
}

/// Serializer for UTF-8 string items, each a u32 length prefix plus bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringsSerde;

impl ItemsSerde<String> for StringsSerde {
    fn type_byte(&self) -> u8 {
        2
    }

    fn serialize_items(&self, items: &[String]) -> Vec<u8> {
        if items.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::new();
        for item in items {
            let bytes = item.as_bytes();
            out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            out.extend_from_slice(bytes);
        }
        out
    }

    fn deserialize_items(
        &self,
        bytes: &[u8],
        num_items: usize,
    ) -> Result<(Vec<String>, usize), Error> {
        if num_items == 0 {
            return Ok((Vec::new(), 0));
        }
        let mut items = Vec::with_capacity(num_items);
        let mut offset = 0usize;
        for _ in 0..num_items {
            if offset + 4 > bytes.len() {
                return Err(Error::insufficient_data("string length"));
            }
            let len = LE::read_u32(&bytes[offset..offset + 4]) as usize;
            offset += 4;
            if offset + len > bytes.len() {
                return Err(Error::insufficient_data("string payload"));
            }
            let value = str::from_utf8(&bytes[offset..offset + len])
                .map_err(|_| Error::corruption("invalid UTF-8 string payload"))?
                .to_string();
            items.push(value);
            offset += len;
        }
        Ok((items, offset))
    }
}
