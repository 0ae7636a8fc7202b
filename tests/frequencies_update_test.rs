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

use sketches::error::ErrorKind;
use sketches::frequencies::ErrorType;
use sketches::frequencies::FrequentItemsSketch;

#[test]
fn test_exact_mode_counts() {
    let mut sketch = FrequentItemsSketch::<&str>::new(8).unwrap();
    sketch.update_with_count("a", 3).unwrap();
    sketch.update_with_count("b", 1).unwrap();
    sketch.update_with_count("c", 2).unwrap();
    sketch.update_with_count("d", 4).unwrap();

    assert_eq!(sketch.stream_length(), 10);
    assert_eq!(sketch.num_active_items(), 4);
    assert_eq!(sketch.maximum_error(), 0);
    assert_eq!(sketch.estimate(&"a"), 3);
    assert_eq!(sketch.lower_bound(&"a"), 3);
    assert_eq!(sketch.upper_bound(&"a"), 3);
    assert_eq!(sketch.estimate(&"zzz"), 0);
}

#[test]
fn test_purge_fires_once_past_capacity() {
    // max map size 8 tracks at most 6 items; the purge is triggered one
    // update early.
    let mut sketch = FrequentItemsSketch::<i64>::with_seed(8, 1).unwrap();
    for item in 0..9 {
        sketch.update(item).unwrap();
    }

    assert_eq!(sketch.stream_length(), 9);
    // every count equaled the sampled median of 1
    assert_eq!(sketch.maximum_error(), 1);
    for item in 0..9 {
        let estimate = sketch.estimate(&item);
        assert!(estimate <= 1 + 1, "estimate {estimate} above true count + offset");
        assert!(sketch.upper_bound(&item) >= 1);
    }
}

#[test]
fn test_bounds_bracket_true_counts() {
    let mut sketch = FrequentItemsSketch::<i64>::with_seed(64, 7).unwrap();
    let mut true_counts = std::collections::HashMap::new();
    for i in 0..10_000i64 {
        let item = i % 300;
        let count = 1 + (i % 5);
        sketch.update_with_count(item, count).unwrap();
        *true_counts.entry(item).or_insert(0i64) += count;
    }
    for (item, true_count) in true_counts {
        assert!(sketch.lower_bound(&item) <= true_count);
        assert!(sketch.upper_bound(&item) >= true_count);
    }
}

#[test]
fn test_purge_keeps_heavy_hitters() {
    let mut sketch = FrequentItemsSketch::<i64>::with_seed(8, 3).unwrap();
    sketch.update_with_count(1, 10).unwrap();
    for item in 2..=7 {
        sketch.update(item).unwrap();
    }

    assert_eq!(sketch.stream_length(), 16);
    assert_eq!(sketch.maximum_error(), 1);
    assert_eq!(sketch.estimate(&1), 10);
    assert_eq!(sketch.lower_bound(&1), 9);

    let rows = sketch.frequent_items(ErrorType::NoFalsePositives);
    assert!(!rows.is_empty());
    assert_eq!(*rows[0].item(), 1);
    assert_eq!(rows[0].estimate(), 10);
}

#[test]
fn test_frequent_items_sorted_descending() {
    let mut sketch = FrequentItemsSketch::<i64>::new(64).unwrap();
    for (item, count) in [(1, 5), (2, 9), (3, 2), (4, 7)] {
        sketch.update_with_count(item, count).unwrap();
    }
    let rows = sketch.frequent_items(ErrorType::NoFalseNegatives);
    assert_eq!(rows.len(), 4);
    let estimates: Vec<i64> = rows.iter().map(|row| row.estimate()).collect();
    assert_eq!(estimates, vec![9, 7, 5, 2]);
}

#[test]
fn test_merge_accumulates_merge_error() {
    let mut left = FrequentItemsSketch::<i64>::with_seed(8, 21).unwrap();
    let mut right = FrequentItemsSketch::<i64>::with_seed(8, 22).unwrap();
    for item in 0..9 {
        left.update(item).unwrap();
        right.update_with_count(item, 2).unwrap();
    }
    let left_stream = left.stream_length();
    let right_error = right.maximum_error();
    assert!(right_error > 0);

    left.merge(&right).unwrap();
    assert_eq!(left.stream_length(), left_stream + right.stream_length());
    assert!(left.maximum_error() >= right_error);

    // the bound width is offset + 2 * merge_error for any tracked item
    for item in 0..9 {
        if left.estimate(&item) > 0 {
            let width = left.upper_bound(&item) - left.lower_bound(&item);
            assert_eq!(width, left.maximum_error() + right_error);
        }
    }
}

#[test]
fn test_merge_empty_is_identity() {
    let mut sketch = FrequentItemsSketch::<i64>::new(16).unwrap();
    sketch.update_with_count(5, 4).unwrap();
    let empty = FrequentItemsSketch::<i64>::new(16).unwrap();
    sketch.merge(&empty).unwrap();
    assert_eq!(sketch.stream_length(), 4);
    assert_eq!(sketch.estimate(&5), 4);
    assert_eq!(sketch.maximum_error(), 0);
}

#[test]
fn test_zero_count_is_noop() {
    let mut sketch = FrequentItemsSketch::<i64>::new(16).unwrap();
    sketch.update_with_count(1, 0).unwrap();
    assert!(sketch.is_empty());
    assert_eq!(sketch.stream_length(), 0);
}

#[test]
fn test_negative_count_is_domain_error() {
    let mut sketch = FrequentItemsSketch::<i64>::new(16).unwrap();
    let err = sketch.update_with_count(1, -1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Domain);
}

#[test]
fn test_bad_map_size_is_domain_error() {
    assert_eq!(
        FrequentItemsSketch::<i64>::new(24).unwrap_err().kind(),
        ErrorKind::Domain
    );
    assert_eq!(
        FrequentItemsSketch::<i64>::new(2).unwrap_err().kind(),
        ErrorKind::Domain
    );
}

#[test]
fn test_reset_returns_to_minimal_map() {
    let mut sketch = FrequentItemsSketch::<i64>::new(64).unwrap();
    for item in 0..40 {
        sketch.update(item).unwrap();
    }
    assert!(sketch.lg_cur_map_size() > 2);
    sketch.reset();
    assert!(sketch.is_empty());
    assert_eq!(sketch.stream_length(), 0);
    assert_eq!(sketch.maximum_error(), 0);
    assert_eq!(sketch.lg_cur_map_size(), 2);
    assert_eq!(sketch.lg_max_map_size(), 6);
}
