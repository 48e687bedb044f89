// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-point geographic coordinates.
//!
//! Coordinates are stored as `i32` in units of 10^-7 degrees, which is the
//! precision OSM data carries. Storing integers keeps entities `Eq`/`Hash`
//! and makes re-parsing a line bit-identical.

use std::fmt;

/// Fixed-point units per degree
pub const COORDINATE_PRECISION: i32 = 10_000_000;

/// A longitude/latitude pair in fixed-point representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    x: i32,
    y: i32,
}

impl Location {
    /// Create from fixed-point values (10^-7 degrees).
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Create from degrees. Returns `None` for non-finite values or values
    /// that do not fit the fixed-point range.
    pub fn from_degrees(lon: f64, lat: f64) -> Option<Self> {
        Some(Self {
            x: degrees_to_fixed(lon)?,
            y: degrees_to_fixed(lat)?,
        })
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Longitude in degrees
    #[inline]
    pub fn lon(&self) -> f64 {
        fixed_to_degrees(self.x)
    }

    /// Latitude in degrees
    #[inline]
    pub fn lat(&self) -> f64 {
        fixed_to_degrees(self.y)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lon(), self.lat())
    }
}

/// Convert degrees to fixed-point, rounding to the nearest unit.
#[inline]
pub fn degrees_to_fixed(value: f64) -> Option<i32> {
    if !value.is_finite() {
        return None;
    }
    let scaled = (value * COORDINATE_PRECISION as f64).round();
    if scaled < i32::MIN as f64 || scaled > i32::MAX as f64 {
        return None;
    }
    Some(scaled as i32)
}

#[inline]
pub fn fixed_to_degrees(value: i32) -> f64 {
    value as f64 / COORDINATE_PRECISION as f64
}
