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

//! Property tests for unit conversions and leg arithmetic.

use proptest::prelude::*;
use speleo_core::units::*;
use speleo_core::{Leg, Station, Vertical};

proptest! {
    #[test]
    fn length_round_trip(value in -10_000.0f64..10_000.0) {
        for unit in [LengthUnit::Feet, LengthUnit::Yards] {
            let back = length_to_metres(length_from_metres(value, unit), unit);
            prop_assert!((back - value).abs() < 1e-6);
        }
    }

    #[test]
    fn bearing_round_trip(value in 0.0f64..360.0) {
        for unit in [BearingUnit::Grads, BearingUnit::Minutes] {
            let back = bearing_to_degrees(bearing_from_degrees(value, unit), unit);
            prop_assert!((back - value).abs() < 1e-6);
        }
    }

    #[test]
    fn gradient_round_trip(value in -89.0f64..89.0) {
        for unit in [GradientUnit::Grads, GradientUnit::Minutes, GradientUnit::Percent] {
            let back = gradient_to_degrees(gradient_from_degrees(value, unit), unit);
            prop_assert!((back - value).abs() < 1e-6);
        }
    }

    #[test]
    fn bearing_average_is_commutative(a in 0.0f64..360.0, b in 0.0f64..360.0) {
        let ab = average_bearings(a, b);
        let ba = average_bearings(b, a);
        prop_assert!(bearing_difference(ab, ba) < 1e-6);
    }

    #[test]
    fn bearing_average_lies_between(a in 0.0f64..360.0, spread in 0.1f64..179.0) {
        let b = normalize_bearing(a + spread);
        let avg = average_bearings(a, b);
        prop_assert!(bearing_difference(avg, a) <= spread / 2.0 + 1e-6);
        prop_assert!(bearing_difference(avg, b) <= spread / 2.0 + 1e-6);
    }

    #[test]
    fn normalized_bearing_in_range(value in -10_000.0f64..10_000.0) {
        let n = normalize_bearing(value);
        prop_assert!((0.0..360.0).contains(&n));
    }

    #[test]
    fn leg_reversal_is_involution(
        length in 0.0f64..100.0,
        bearing in 0.0f64..360.0,
        inclination in -90.0f64..90.0,
    ) {
        let leg = Leg::normal(Station::new(1), Station::new(2), length, bearing, inclination);
        let twice = leg.reversed().unwrap().reversed().unwrap();
        prop_assert_eq!(twice.from.id, leg.from.id);
        prop_assert!((twice.bearing - leg.bearing).abs() < 1e-9
            || bearing_difference(twice.bearing, leg.bearing) < 1e-9);
        prop_assert_eq!(twice.vertical, leg.vertical);
    }

    #[test]
    fn diving_reversal_negates_depth_change(change in -50.0f64..50.0) {
        let leg = Leg::diving(
            Station::new(1),
            Station::new(2),
            10.0,
            45.0,
            Vertical::DepthChange(change),
        );
        let rev = leg.reversed().unwrap();
        prop_assert_eq!(rev.vertical.depth_change(), Some(-change));
    }
}
