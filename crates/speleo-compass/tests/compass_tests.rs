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

//! Integration tests for the Compass parser against the shared fixture.

use speleo_compass::parse_compass;
use speleo_core::BufferLogger;
use speleo_test::{lines, COMPASS_SAMPLE};

#[test]
fn test_sample_sections_and_legs() {
    let mut logger = BufferLogger::new();
    let survey = parse_compass(&lines(COMPASS_SAMPLE), &mut logger).unwrap();
    assert_eq!(survey.name, "Test Cave");
    assert_eq!(survey.series.len(), 2);
    assert_eq!(survey.series[0].name(), "A");
    assert_eq!(survey.series[1].name(), "B");
    assert_eq!(survey.series[0].legs.len(), 2);
    assert_eq!(survey.series[1].legs.len(), 1);
}

#[test]
fn test_sample_backsight_and_flags() {
    let survey = parse_compass(&lines(COMPASS_SAMPLE), &mut BufferLogger::new()).unwrap();
    let series = &survey.series[0];

    // First leg: forward 15.0/-6.0, back 193.0/6.0 reversed to 13.0/-6.0.
    let leg = &series.legs[0];
    assert!((leg.bearing - 14.0).abs() < 1e-6);
    assert!((leg.inclination() - -6.0).abs() < 1e-9);

    // Second leg carried a duplicate flag and a comment.
    assert!(series.legs[1].duplicate);
    assert_eq!(series.legs[1].comment, "resurvey of old leg");
}

#[test]
fn test_lengths_are_converted_to_metres() {
    let survey = parse_compass(&lines(COMPASS_SAMPLE), &mut BufferLogger::new()).unwrap();
    // 32.80 ft and 16.40 ft; the duplicate is excluded from total length.
    let series = &survey.series[0];
    assert!((series.legs[0].length - 9.99744).abs() < 1e-6);
    assert!((series.total_length() - 9.99744).abs() < 1e-6);
}

#[test]
fn test_station_names_resolve_to_stable_ids() {
    let survey = parse_compass(&lines(COMPASS_SAMPLE), &mut BufferLogger::new()).unwrap();
    let series = &survey.series[0];
    let a2_as_to = series.legs[0].to.as_ref().unwrap().id;
    let a2_as_from = series.legs[1].from.id;
    assert_eq!(a2_as_to, a2_as_from);
    assert!(a2_as_to < 0);
}
