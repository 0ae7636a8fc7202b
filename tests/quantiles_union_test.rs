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
use googletest::prelude::near;
use sketches::error::ErrorKind;
use sketches::quantiles::QuantilesSketch;
use sketches::quantiles::QuantilesUnion;

#[test]
fn test_virgin_union_is_state_error() {
    let union = QuantilesUnion::new();
    assert_eq!(union.result().unwrap_err().kind(), ErrorKind::State);

    let mut union = QuantilesUnion::new();
    assert_eq!(union.update(1.0).unwrap_err().kind(), ErrorKind::State);
}

#[test]
fn test_union_of_empty_input_initializes() {
    let mut union = QuantilesUnion::new();
    let empty = QuantilesSketch::new(32).unwrap();
    union.update_sketch(&empty).unwrap();
    let result = union.result().unwrap();
    assert!(result.is_empty());
    assert_eq!(result.k(), 32);
    // the union is initialized now, so direct updates work
    union.update(5.0).unwrap();
    assert_eq!(union.result().unwrap().n(), 1);
}

#[test]
fn test_union_merges_same_k() {
    let mut low = QuantilesSketch::with_seed(16, 1).unwrap();
    let mut high = QuantilesSketch::with_seed(16, 2).unwrap();
    for i in 1..=1000 {
        low.update(i as f64);
        high.update((i + 1000) as f64);
    }

    let mut union = QuantilesUnion::new();
    union.update_sketch(&low).unwrap();
    union.update_sketch(&high).unwrap();

    let result = union.result().unwrap();
    assert_eq!(result.n(), 2000);
    assert_eq!(result.min_value(), Some(1.0));
    assert_eq!(result.max_value(), Some(2000.0));
    let median = result.quantile(0.5, true).unwrap().unwrap();
    assert_that!(median, near(1000.0, 1.65 * 2000.0 / 16.0));
}

#[test]
fn test_union_targets_smaller_k() {
    let mut coarse = QuantilesSketch::with_seed(16, 3).unwrap();
    let mut fine = QuantilesSketch::with_seed(64, 4).unwrap();
    for i in 0..1000 {
        coarse.update(i as f64);
        fine.update((i + 1000) as f64);
    }

    // feed the larger-k sketch first: the union must still settle on k=16
    let mut union = QuantilesUnion::new();
    union.update_sketch(&fine).unwrap();
    union.update_sketch(&coarse).unwrap();

    let result = union.result().unwrap();
    assert_eq!(result.k(), 16);
    assert_eq!(result.n(), 2000);
    assert_eq!(result.min_value(), Some(0.0));
    assert_eq!(result.max_value(), Some(1999.0));
}

#[test]
fn test_result_is_a_deep_copy() {
    let mut sketch = QuantilesSketch::new(16).unwrap();
    sketch.update(1.0);
    let mut union = QuantilesUnion::from_sketch(sketch);
    let result = union.result().unwrap();
    union.update(2.0).unwrap();
    // the earlier result must not observe the later update
    assert_eq!(result.n(), 1);
    assert_eq!(union.result().unwrap().n(), 2);
}

#[test]
fn test_result_and_reset() {
    let mut sketch = QuantilesSketch::new(16).unwrap();
    sketch.update(1.0);
    let mut union = QuantilesUnion::from_sketch(sketch);
    let result = union.result_and_reset().unwrap();
    assert_eq!(result.n(), 1);
    assert!(union.result_and_reset().is_none());
    assert_eq!(union.result().unwrap_err().kind(), ErrorKind::State);
}

#[test]
fn test_union_from_bytes() {
    let mut sketch = QuantilesSketch::with_seed(32, 9).unwrap();
    for i in 0..100 {
        sketch.update(i as f64);
    }
    let bytes = sketch.serialize();
    let union = QuantilesUnion::from_bytes(&bytes).unwrap();
    assert_eq!(union.result().unwrap().n(), 100);
}
