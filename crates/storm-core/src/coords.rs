//! Coordinate snapping: vertices shared by adjacent lines must land on the same node.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scaled magnitudes at or past this bound are left untouched so the round trip stays exact.
const EXACT_INT_LIMIT: f64 = 1_125_899_906_842_624.0; // 2^50

/// A graph node: a coordinate pair after rounding. Equality and hashing are by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Node {
    pub x: OrderedFloat<f64>,
    pub y: OrderedFloat<f64>,
}

impl Node {
    /// Build a node from raw coordinates, rounding both to `decimals` places.
    pub fn rounded(x: f64, y: f64, decimals: u32) -> Self {
        Self {
            x: OrderedFloat(round_coord(x, decimals)),
            y: OrderedFloat(round_coord(y, decimals)),
        }
    }

    /// Build a node from coordinates that are already rounded.
    pub fn exact(x: f64, y: f64) -> Self {
        Self {
            x: OrderedFloat(x),
            y: OrderedFloat(y),
        }
    }

    pub fn x(&self) -> f64 {
        self.x.into_inner()
    }

    pub fn y(&self) -> f64 {
        self.y.into_inner()
    }

    pub fn to_point(&self) -> geo::Point<f64> {
        geo::Point::new(self.x(), self.y())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x(), self.y())
    }
}

/// Round a single coordinate value to `decimals` places (half away from zero).
///
/// Idempotent for every precision: once the scaled value can no longer carry a
/// fractional part the input is returned unchanged.
pub fn round_coord(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let exp = i32::try_from(decimals).unwrap_or(i32::MAX);
    let factor = 10f64.powi(exp);
    let scaled = value * factor;
    if !scaled.is_finite() || scaled.abs() >= EXACT_INT_LIMIT {
        return value;
    }
    let rounded = scaled.round() / factor;
    // -0.0 and 0.0 must snap to the same node
    if rounded == 0.0 { 0.0 } else { rounded }
}
