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

//! Union operation over quantiles sketches.

use super::sketch::QuantilesSketch;
use crate::error::Error;

/// Combines quantiles sketches of possibly different k.
///
/// The union holds at most one internal sketch and folds every input into
/// it; different-k inputs are merged into the smaller-k side so the error
/// guarantee of the result is the weaker of the two. The internal sketch
/// is never handed out directly: [`QuantilesUnion::result`] returns a
/// deep copy.
#[derive(Debug, Clone, Default)]
pub struct QuantilesUnion {
    gadget: Option<QuantilesSketch>,
}

impl QuantilesUnion {
    /// Creates a virgin union with no internal sketch.
    pub fn new() -> Self {
        Self { gadget: None }
    }

    /// Creates a union seeded with the given sketch.
    pub fn from_sketch(sketch: QuantilesSketch) -> Self {
        Self {
            gadget: Some(sketch),
        }
    }

    /// Creates a union from a serialized sketch image.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            gadget: Some(QuantilesSketch::deserialize(bytes)?),
        })
    }

    /// Folds the given sketch into the union.
    pub fn update_sketch(&mut self, other: &QuantilesSketch) -> Result<(), Error> {
        self.gadget = update_logic(self.gadget.take(), Some(other))?;
        Ok(())
    }

    /// Presents a single value to the union.
    ///
    /// The union must have been initialized by a prior sketch input;
    /// otherwise this is a `State` error.
    pub fn update(&mut self, value: f64) -> Result<(), Error> {
        match self.gadget.as_mut() {
            None => Err(Error::state("union not initialized")),
            Some(gadget) => {
                gadget.update(value);
                Ok(())
            }
        }
    }

    /// Returns a deep copy of the union result.
    ///
    /// Fails with a `State` error on an uninitialized or reset union.
    pub fn result(&self) -> Result<QuantilesSketch, Error> {
        match self.gadget.as_ref() {
            None => Err(Error::state("union not initialized")),
            Some(gadget) => Ok(gadget.clone()),
        }
    }

    /// Returns the union result and resets the union, avoiding a copy.
    pub fn result_and_reset(&mut self) -> Option<QuantilesSketch> {
        self.gadget.take()
    }

    /// Resets the union to its virgin state.
    pub fn reset(&mut self) {
        self.gadget = None;
    }
}

/// Dispatches a union input over the null/empty/valid status of both
/// sides, mirroring binary addition of the case table:
/// both absent stays absent, a single usable side is kept or copied, and
/// two usable sides merge into the smaller-k target.
fn update_logic(
    my: Option<QuantilesSketch>,
    other: Option<&QuantilesSketch>,
) -> Result<Option<QuantilesSketch>, Error> {
    let mut sw1 = match &my {
        None => 0,
        Some(sketch) if sketch.is_empty() => 4,
        Some(_) => 8,
    };
    sw1 |= match other {
        None => 0,
        Some(sketch) if sketch.is_empty() => 1,
        Some(_) => 2,
    };
    // 0 = absent, 1 = no-op, 2 = copy other, 3 = merge
    let out_case = match sw1 {
        0 => 0,
        1 | 2 => 2,
        4 | 5 | 8 | 9 => 1,
        6 | 10 => 3,
        _ => 1,
    };
    match out_case {
        0 => Ok(None),
        1 => Ok(my),
        2 => Ok(other.cloned()),
        _ => {
            let (Some(mut mine), Some(other)) = (my, other) else {
                return Ok(None);
            };
            if mine.k() <= other.k() {
                mine.merge(other)?;
                Ok(Some(mine))
            } else {
                // Must reverse roles, and must copy: the caller keeps a
                // handle on `other`.
                let mut target = other.clone();
                target.merge(&mine)?;
                Ok(Some(target))
            }
        }
    }
}
