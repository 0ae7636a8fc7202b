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

//! Weighted sorted view backing rank, quantile, CDF and PMF queries.

use crate::error::Error;

#[derive(Debug, Clone)]
pub(crate) struct SortedView {
    entries: Vec<Entry>,
    total_weight: u64,
}

#[derive(Debug, Clone)]
struct Entry {
    value: f64,
    // Cumulative weight up to and including this entry.
    weight: u64,
}

impl SortedView {
    fn new(mut entries: Vec<Entry>) -> Self {
        entries.sort_by(|a, b| f64::total_cmp(&a.value, &b.value));
        let mut total_weight = 0u64;
        for entry in &mut entries {
            total_weight += entry.weight;
            entry.weight = total_weight;
        }
        Self {
            entries,
            total_weight,
        }
    }

    pub fn rank(&self, value: f64, inclusive: bool) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }

        let idx = if inclusive {
            self.entries.partition_point(|e| e.value <= value)
        } else {
            self.entries.partition_point(|e| e.value < value)
        };

        if idx == 0 {
            return 0.0;
        }
        self.entries[idx - 1].weight as f64 / self.total_weight as f64
    }

    pub fn quantile(&self, rank: f64, inclusive: bool) -> f64 {
        let weight = if inclusive {
            (rank * self.total_weight as f64).ceil() as u64
        } else {
            (rank * self.total_weight as f64) as u64
        };

        let idx = if inclusive {
            self.entries.partition_point(|e| e.weight < weight)
        } else {
            self.entries.partition_point(|e| e.weight <= weight)
        };

        if idx >= self.entries.len() {
            return self.entries[self.entries.len() - 1].value;
        }
        self.entries[idx].value
    }

    pub fn cdf(&self, split_points: &[f64], inclusive: bool) -> Result<Vec<f64>, Error> {
        check_split_points(split_points)?;
        let mut ranks = Vec::with_capacity(split_points.len() + 1);
        for value in split_points {
            ranks.push(self.rank(*value, inclusive));
        }
        ranks.push(1.0);
        Ok(ranks)
    }

    pub fn pmf(&self, split_points: &[f64], inclusive: bool) -> Result<Vec<f64>, Error> {
        let mut buckets = self.cdf(split_points, inclusive)?;
        for i in (1..buckets.len()).rev() {
            buckets[i] -= buckets[i - 1];
        }
        Ok(buckets)
    }
}

/// Builds a view over the given runs of equally weighted values.
pub(crate) fn build_sorted_view<'a, I>(runs: I) -> SortedView
where
    I: Iterator<Item = (&'a [f64], u64)>,
{
    let mut entries = Vec::new();
    for (values, weight) in runs {
        for value in values {
            entries.push(Entry {
                value: *value,
                weight,
            });
        }
    }
    SortedView::new(entries)
}

fn check_split_points(split_points: &[f64]) -> Result<(), Error> {
    for value in split_points {
        if value.is_nan() {
            return Err(Error::domain("split_points must not contain NaN values"));
        }
    }
    for window in split_points.windows(2) {
        if window[0] >= window[1] {
            return Err(Error::domain(
                "split_points must be unique and monotonically increasing",
            ));
        }
    }
    Ok(())
}
