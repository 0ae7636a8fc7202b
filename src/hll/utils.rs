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

//! Inverse power-of-two aggregation over bucket values.

use crate::error::Error;

/// Returns `2^-e` for `0 <= e <= 1023` by direct IEEE-754 exponent
/// manipulation.
pub fn inv_pow2(e: i32) -> Result<f64, Error> {
    if !(0..=1023).contains(&e) {
        return Err(Error::domain(format!(
            "e cannot be negative or greater than 1023: {e}"
        )));
    }
    Ok(f64::from_bits(((1023 - e) as u64) << 52))
}

/// Computes `(num_buckets - observed) + sum(2^-value)` over the observed
/// buckets.
///
/// Unobserved buckets contribute `2^0 = 1` each, so an empty iterator
/// yields `num_buckets`.
pub fn compute_inv_pow2_sum<I>(num_buckets: u32, buckets: I) -> f64
where
    I: Iterator<Item = (u32, u8)>,
{
    let mut sum = 0.0f64;
    let mut remaining = num_buckets as i64;
    for (_bucket, value) in buckets {
        sum += inv_pow2_of_byte(value);
        remaining -= 1;
    }
    sum + remaining as f64
}

#[inline]
fn inv_pow2_of_byte(value: u8) -> f64 {
    f64::from_bits((1023 - value as u64) << 52)
}
