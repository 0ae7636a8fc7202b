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

//! Rank table supporting quantile searches.

use super::Criteria;
use super::sketch::ReqSketch;

/// Parallel arrays of the sketch's retained items sorted globally, each
/// item carrying the lg weight of its compactor and its cumulative
/// normalized rank.
#[derive(Debug)]
pub(crate) struct ReqAuxiliary {
    items: Vec<f32>,
    lg_weights: Vec<u8>,
    norm_ranks: Vec<f64>,
}

impl ReqAuxiliary {
    pub fn new(sketch: &ReqSketch) -> Self {
        let total = sketch.num_retained();
        let mut aux = Self {
            items: vec![0.0; total],
            lg_weights: vec![0; total],
            norm_ranks: vec![0.0; total],
        };
        let mut aux_count = 0;
        for compactor in sketch.compactors() {
            let mut run = compactor.buffer().as_slice().to_vec();
            if !compactor.buffer().is_sorted() {
                run.sort_by(f32::total_cmp);
            }
            aux.merge_sort_in(&run, compactor.lg_weight(), aux_count);
            aux_count += run.len();
        }
        let n = sketch.n();
        let mut sum = 0.0f64;
        for i in 0..total {
            sum += (1u64 << aux.lg_weights[i]) as f64;
            aux.norm_ranks[i] = sum / n as f64;
        }
        aux
    }

    /// Returns the quantile of the largest normalized rank below (or at,
    /// with [`Criteria::Le`]) the given normalized rank, or NaN when the
    /// rank lies below every entry.
    pub fn quantile(&self, norm_rank: f64, criterion: Criteria) -> f32 {
        let idx = match criterion {
            Criteria::Lt => self.norm_ranks.partition_point(|&rank| rank < norm_rank),
            Criteria::Le => self.norm_ranks.partition_point(|&rank| rank <= norm_rank),
        };
        if idx == 0 {
            return f32::NAN;
        }
        self.items[idx - 1]
    }

    /// Merges a sorted run into the table, carrying its lg weight. The
    /// first `aux_count` slots already hold a sorted prefix.
    fn merge_sort_in(&mut self, other: &[f32], lg_weight: u8, aux_count: usize) {
        let total = aux_count + other.len();
        let mut i = aux_count as isize - 1;
        let mut j = other.len() as isize - 1;
        for k in (0..total).rev() {
            if i >= 0 && j >= 0 {
                if self.items[i as usize] >= other[j as usize] {
                    self.items[k] = self.items[i as usize];
                    self.lg_weights[k] = self.lg_weights[i as usize];
                    i -= 1;
                } else {
                    self.items[k] = other[j as usize];
                    self.lg_weights[k] = lg_weight;
                    j -= 1;
                }
            } else if i >= 0 {
                self.items[k] = self.items[i as usize];
                self.lg_weights[k] = self.lg_weights[i as usize];
                i -= 1;
            } else if j >= 0 {
                self.items[k] = other[j as usize];
                self.lg_weights[k] = lg_weight;
                j -= 1;
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_ranks_are_monotone_and_bounded() {
        let mut sketch = ReqSketch::with_seed(4, false, 3).unwrap();
        for i in 0..5000 {
            sketch.update(i as f32).unwrap();
        }
        let aux = ReqAuxiliary::new(&sketch);
        assert_eq!(aux.items.len(), sketch.num_retained());
        for window in aux.items.windows(2) {
            assert!(window[0] <= window[1], "items must be non-decreasing");
        }
        let mut prev = 0.0;
        for rank in &aux.norm_ranks {
            assert!(*rank >= prev, "norm ranks must be non-decreasing");
            assert!(*rank > 0.0 && *rank <= 1.0 + 1e-12);
            prev = *rank;
        }
        let last = aux.norm_ranks.last().copied().unwrap_or_default();
        assert!((last - 1.0).abs() < 1e-9, "total weight must reach n");
    }

    #[test]
    fn test_quantile_out_of_range_is_nan() {
        let mut sketch = ReqSketch::new(4, false).unwrap();
        sketch.update(10.0).unwrap();
        let aux = ReqAuxiliary::new(&sketch);
        assert!(aux.quantile(0.5, Criteria::Lt).is_nan());
        assert_eq!(aux.quantile(1.0, Criteria::Le), 10.0);
    }

    #[test]
    fn test_quantile_of_extreme_ranks() {
        // few enough items that nothing has been compacted yet
        let mut sketch = ReqSketch::with_seed(4, false, 9).unwrap();
        for i in 1..=20 {
            sketch.update(i as f32).unwrap();
        }
        let aux = ReqAuxiliary::new(&sketch);
        assert_eq!(aux.quantile(1.0, Criteria::Le), 20.0);
        assert_eq!(aux.quantile(0.5, Criteria::Le), 10.0);
        assert!(aux.quantile(0.0, Criteria::Le).is_nan());
    }
}
