// Speleo - Cave survey data conversion toolkit
//
// Copyright (c) 2025 Speleo contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Measurement unit conversions and bearing arithmetic.
//!
//! All internal storage is metres and degrees; these functions convert at
//! the parse/write boundary. Pure functions, no state.

use std::str::FromStr;

const METRES_PER_FOOT: f64 = 0.3048;
const METRES_PER_YARD: f64 = 0.9144;
const DEGREES_PER_GRAD: f64 = 360.0 / 400.0;
const MINUTES_PER_DEGREE: f64 = 60.0;

/// Length measurement units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LengthUnit {
    Metres,
    Feet,
    Yards,
}

impl FromStr for LengthUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "metres" | "meters" | "metric" | "m" => Ok(Self::Metres),
            "feet" | "foot" | "ft" => Ok(Self::Feet),
            "yards" | "yard" | "yd" => Ok(Self::Yards),
            _ => Err(format!("unknown length unit '{}'", s)),
        }
    }
}

/// Bearing (compass) measurement units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BearingUnit {
    Degrees,
    Grads,
    Minutes,
}

impl FromStr for BearingUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "degrees" | "degs" | "deg" => Ok(Self::Degrees),
            "grads" | "grad" | "mils" => Ok(Self::Grads),
            "minutes" | "mins" => Ok(Self::Minutes),
            _ => Err(format!("unknown bearing unit '{}'", s)),
        }
    }
}

/// Gradient (clino) measurement units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GradientUnit {
    Degrees,
    Grads,
    Minutes,
    Percent,
}

impl FromStr for GradientUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "degrees" | "degs" | "deg" => Ok(Self::Degrees),
            "grads" | "grad" | "mils" => Ok(Self::Grads),
            "minutes" | "mins" => Ok(Self::Minutes),
            "percent" | "percentage" => Ok(Self::Percent),
            _ => Err(format!("unknown gradient unit '{}'", s)),
        }
    }
}

/// Convert a length to metres.
pub fn length_to_metres(value: f64, unit: LengthUnit) -> f64 {
    match unit {
        LengthUnit::Metres => value,
        LengthUnit::Feet => value * METRES_PER_FOOT,
        LengthUnit::Yards => value * METRES_PER_YARD,
    }
}

/// Convert a length in metres to the given unit.
pub fn length_from_metres(value: f64, unit: LengthUnit) -> f64 {
    match unit {
        LengthUnit::Metres => value,
        LengthUnit::Feet => value / METRES_PER_FOOT,
        LengthUnit::Yards => value / METRES_PER_YARD,
    }
}

/// Convert a bearing to degrees.
pub fn bearing_to_degrees(value: f64, unit: BearingUnit) -> f64 {
    match unit {
        BearingUnit::Degrees => value,
        BearingUnit::Grads => value * DEGREES_PER_GRAD,
        BearingUnit::Minutes => value / MINUTES_PER_DEGREE,
    }
}

/// Convert a bearing in degrees to the given unit.
pub fn bearing_from_degrees(value: f64, unit: BearingUnit) -> f64 {
    match unit {
        BearingUnit::Degrees => value,
        BearingUnit::Grads => value / DEGREES_PER_GRAD,
        BearingUnit::Minutes => value * MINUTES_PER_DEGREE,
    }
}

/// Convert a gradient to degrees.
pub fn gradient_to_degrees(value: f64, unit: GradientUnit) -> f64 {
    match unit {
        GradientUnit::Degrees => value,
        GradientUnit::Grads => value * DEGREES_PER_GRAD,
        GradientUnit::Minutes => value / MINUTES_PER_DEGREE,
        GradientUnit::Percent => (value / 100.0).atan().to_degrees(),
    }
}

/// Convert a gradient in degrees to the given unit.
pub fn gradient_from_degrees(value: f64, unit: GradientUnit) -> f64 {
    match unit {
        GradientUnit::Degrees => value,
        GradientUnit::Grads => value / DEGREES_PER_GRAD,
        GradientUnit::Minutes => value * MINUTES_PER_DEGREE,
        GradientUnit::Percent => value.to_radians().tan() * 100.0,
    }
}

/// Normalize a bearing in degrees to the range [0, 360).
pub fn normalize_bearing(degrees: f64) -> f64 {
    let mut d = degrees % 360.0;
    if d < 0.0 {
        d += 360.0;
    }
    // -0.0 % 360.0 is -0.0; keep the canonical zero.
    if d == 0.0 {
        d = 0.0;
    }
    d
}

/// Vector average of two bearings, wraparound correct.
///
/// `average_bearings(359.0, 1.0)` is 0, not 180. Exactly opposed bearings
/// have no meaningful vector average; the arithmetic midpoint of the two
/// inputs is returned for that degenerate case.
pub fn average_bearings(a: f64, b: f64) -> f64 {
    let (ar, br) = (a.to_radians(), b.to_radians());
    let x = ar.sin() + br.sin();
    let y = ar.cos() + br.cos();
    if x.abs() < 1e-9 && y.abs() < 1e-9 {
        return normalize_bearing((a + b) / 2.0);
    }
    normalize_bearing(x.atan2(y).to_degrees())
}

/// Minimal absolute difference between two bearings, in [0, 180].
pub fn bearing_difference(a: f64, b: f64) -> f64 {
    let d = (normalize_bearing(a) - normalize_bearing(b)).abs();
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    // ==================== Length conversions ====================

    #[test]
    fn test_feet_to_metres() {
        assert!((length_to_metres(10.0, LengthUnit::Feet) - 3.048).abs() < EPS);
    }

    #[test]
    fn test_yards_to_metres() {
        assert!((length_to_metres(1.0, LengthUnit::Yards) - 0.9144).abs() < EPS);
    }

    #[test]
    fn test_metres_identity() {
        assert_eq!(length_to_metres(2.5, LengthUnit::Metres), 2.5);
        assert_eq!(length_from_metres(2.5, LengthUnit::Metres), 2.5);
    }

    // ==================== Bearing conversions ====================

    #[test]
    fn test_grads_full_circle() {
        assert!((bearing_to_degrees(400.0, BearingUnit::Grads) - 360.0).abs() < EPS);
    }

    #[test]
    fn test_minutes_to_degrees() {
        assert!((bearing_to_degrees(90.0, BearingUnit::Minutes) - 1.5).abs() < EPS);
    }

    // ==================== Gradient conversions ====================

    #[test]
    fn test_percent_gradient() {
        assert!((gradient_to_degrees(100.0, GradientUnit::Percent) - 45.0).abs() < EPS);
        assert!((gradient_from_degrees(45.0, GradientUnit::Percent) - 100.0).abs() < EPS);
    }

    // ==================== Bearing arithmetic ====================

    #[test]
    fn test_normalize_bearing() {
        assert_eq!(normalize_bearing(365.0), 5.0);
        assert_eq!(normalize_bearing(-90.0), 270.0);
        assert_eq!(normalize_bearing(360.0), 0.0);
    }

    #[test]
    fn test_average_wraparound() {
        let avg = average_bearings(359.0, 1.0);
        assert!(avg < 0.001 || avg > 359.999, "got {}", avg);
    }

    #[test]
    fn test_average_commutative() {
        let a = average_bearings(10.0, 80.0);
        let b = average_bearings(80.0, 10.0);
        assert!((a - b).abs() < EPS);
        assert!((a - 45.0).abs() < EPS);
    }

    #[test]
    fn test_average_degenerate_opposed() {
        assert!((average_bearings(90.0, 270.0) - 180.0).abs() < EPS);
    }

    #[test]
    fn test_bearing_difference() {
        assert!((bearing_difference(350.0, 10.0) - 20.0).abs() < EPS);
        assert!((bearing_difference(10.0, 350.0) - 20.0).abs() < EPS);
        assert_eq!(bearing_difference(90.0, 90.0), 0.0);
    }

    // ==================== Unit name parsing ====================

    #[test]
    fn test_parse_unit_names() {
        assert_eq!("FEET".parse::<LengthUnit>(), Ok(LengthUnit::Feet));
        assert_eq!("grads".parse::<BearingUnit>(), Ok(BearingUnit::Grads));
        assert_eq!("Percent".parse::<GradientUnit>(), Ok(GradientUnit::Percent));
        assert!("furlongs".parse::<LengthUnit>().is_err());
    }
}
