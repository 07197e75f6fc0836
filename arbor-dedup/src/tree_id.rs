//! Canonical tree identifiers.
//!
//! A tree id is a pure function of the representative location rounded to
//! a fixed 5-decimal grid (~1 m): any two observations that round to the
//! same grid cell receive the same id, in this run or any other. The id is
//! the stable join key between processing runs; nothing else about a
//! cluster feeds into it. Distinct grid cells colliding to one id cannot
//! happen, but two reports of the same tree landing in adjacent cells can
//! — that split is accepted and documented.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places kept in the identifier grid.
pub const GRID_PRECISION_DECIMALS: u32 = 5;

/// Deterministic location-derived identifier for a canonical tree.
///
/// Encoded as a fixed 19-character string: signed zero-padded latitude
/// (9 chars) followed by signed zero-padded longitude (10 chars), both at
/// 5 decimal places. Example: `+32.05000+034.75000`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeId(String);

impl TreeId {
    /// Derive the identifier for a location.
    pub fn from_coords(lat: f64, lng: f64) -> Self {
        TreeId(format!("{:+09.5}{:+010.5}", snap(lat), snap(lng)))
    }

    /// The encoded identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Round to the identifier grid, normalizing negative zero so values an
/// epsilon either side of an axis cannot encode differently.
fn snap(value: f64) -> f64 {
    let scale = 10f64.powi(GRID_PRECISION_DECIMALS as i32);
    let rounded = (value * scale).round() / scale;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
