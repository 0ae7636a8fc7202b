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

use googletest::assert_that;
use googletest::prelude::contains_substring;
use sketches::error::ErrorKind;
use sketches::frequencies::FrequentItemsSketch;
use sketches::frequencies::LongsSerde;
use sketches::frequencies::StringsSerde;

#[test]
fn test_empty_sketch_serializes_to_one_preamble_long() {
    let sketch = FrequentItemsSketch::<i64>::new(8).unwrap();
    let bytes = sketch.serialize_with(&LongsSerde);

    assert_eq!(bytes.len(), 8);
    assert_eq!(bytes[0], 1, "preamble longs");
    assert_eq!(bytes[1], 1, "serialization version");
    assert_eq!(bytes[2], 10, "family id");
    assert_eq!(bytes[3], 3, "lg max map size");
    assert_eq!(bytes[4], 2, "lg cur map size");
    assert_ne!(bytes[5] & 0x04, 0, "empty flag");
    assert_eq!(bytes[6], 1, "serde type byte");

    let restored = FrequentItemsSketch::<i64>::deserialize_with(&bytes, &LongsSerde).unwrap();
    assert!(restored.is_empty());
    assert_eq!(restored.lg_max_map_size(), 3);
}

#[test]
fn test_populated_sketch_uses_five_preamble_longs() {
    let mut sketch = FrequentItemsSketch::<i64>::new(32).unwrap();
    sketch.update_with_count(7, 3).unwrap();
    let bytes = sketch.serialize_with(&LongsSerde);
    assert_eq!(bytes[0], 5, "preamble longs");
    assert_eq!(bytes[5] & 0x04, 0, "empty flag clear");
    assert_eq!(bytes.len(), 40 + 8 + 8);
}

#[test]
fn test_longs_round_trip() {
    let mut sketch = FrequentItemsSketch::<i64>::with_seed(32, 5).unwrap();
    for i in 1..=100 {
        sketch.update_with_count(i, i).unwrap();
    }
    let bytes = sketch.serialize_with(&LongsSerde);
    let restored = FrequentItemsSketch::<i64>::deserialize_with(&bytes, &LongsSerde).unwrap();
    assert_eq!(restored.stream_length(), sketch.stream_length());
    assert_eq!(restored.maximum_error(), sketch.maximum_error());
    assert_eq!(restored.num_active_items(), sketch.num_active_items());
    assert_eq!(restored.estimate(&42), sketch.estimate(&42));
    assert_eq!(restored.lower_bound(&99), sketch.lower_bound(&99));
    assert_eq!(restored.upper_bound(&99), sketch.upper_bound(&99));
}

#[test]
fn test_strings_round_trip() {
    let mut sketch = FrequentItemsSketch::<String>::new(32).unwrap();
    sketch.update_with_count("alpha".to_string(), 3).unwrap();
    sketch.update_with_count("beta".to_string(), 5).unwrap();
    sketch.update_with_count("gamma".to_string(), 7).unwrap();

    let bytes = sketch.serialize_with(&StringsSerde);
    let restored = FrequentItemsSketch::<String>::deserialize_with(&bytes, &StringsSerde).unwrap();
    assert_eq!(restored.stream_length(), 15);
    assert_eq!(restored.estimate(&"beta".to_string()), 5);
    assert_eq!(restored.num_active_items(), 3);
}

#[test]
fn test_merge_error_survives_round_trip() {
    let mut left = FrequentItemsSketch::<i64>::with_seed(8, 1).unwrap();
    let mut right = FrequentItemsSketch::<i64>::with_seed(8, 2).unwrap();
    for item in 0..9 {
        left.update(item).unwrap();
        right.update(item).unwrap();
    }
    left.merge(&right).unwrap();
    let width_before = left.upper_bound(&8) - left.lower_bound(&8);

    let bytes = left.serialize_with(&LongsSerde);
    let restored = FrequentItemsSketch::<i64>::deserialize_with(&bytes, &LongsSerde).unwrap();
    assert_eq!(restored.maximum_error(), left.maximum_error());
    assert_eq!(restored.upper_bound(&8) - restored.lower_bound(&8), width_before);
}

#[test]
fn test_truncated_input_is_corruption() {
    let err = FrequentItemsSketch::<i64>::deserialize_with(&[1, 1, 10], &LongsSerde).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corruption);
}

#[test]
fn test_wrong_family_is_corruption() {
    let mut sketch = FrequentItemsSketch::<i64>::new(8).unwrap();
    sketch.update(1).unwrap();
    let mut bytes = sketch.serialize_with(&LongsSerde);
    bytes[2] = 15;
    let err = FrequentItemsSketch::<i64>::deserialize_with(&bytes, &LongsSerde).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corruption);
    assert_that!(err.message(), contains_substring("invalid family"));
}

#[test]
fn test_wrong_serial_version_is_corruption() {
    let sketch = FrequentItemsSketch::<i64>::new(8).unwrap();
    let mut bytes = sketch.serialize_with(&LongsSerde);
    bytes[1] = 9;
    let err = FrequentItemsSketch::<i64>::deserialize_with(&bytes, &LongsSerde).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corruption);
}

#[test]
fn test_bad_preamble_longs_is_corruption() {
    let sketch = FrequentItemsSketch::<i64>::new(8).unwrap();
    let mut bytes = sketch.serialize_with(&LongsSerde);
    bytes[0] = 3;
    let err = FrequentItemsSketch::<i64>::deserialize_with(&bytes, &LongsSerde).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corruption);
    assert_that!(err.message(), contains_substring("preamble longs"));
}

#[test]
fn test_empty_flag_mismatch_is_corruption() {
    let sketch = FrequentItemsSketch::<i64>::new(8).unwrap();
    let mut bytes = sketch.serialize_with(&LongsSerde);
    bytes[5] = 0; // still one preamble long, but claims non-empty
    let err = FrequentItemsSketch::<i64>::deserialize_with(&bytes, &LongsSerde).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corruption);
}

#[test]
fn test_serde_type_mismatch_is_corruption() {
    let mut sketch = FrequentItemsSketch::<i64>::new(8).unwrap();
    sketch.update(1).unwrap();
    let bytes = sketch.serialize_with(&LongsSerde);
    let err = FrequentItemsSketch::<String>::deserialize_with(&bytes, &StringsSerde).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corruption);
    assert_that!(err.message(), contains_substring("serializer type"));
}
