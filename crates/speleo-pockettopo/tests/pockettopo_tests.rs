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

//! Integration tests for the PocketTopo parser against the shared fixture.

use speleo_core::BufferLogger;
use speleo_pockettopo::parse_pockettopo;
use speleo_test::{lines, POCKETTOPO_SAMPLE};

#[test]
fn test_sample_series_layout() {
    let survey = parse_pockettopo(&lines(POCKETTOPO_SAMPLE), &mut BufferLogger::new()).unwrap();
    assert_eq!(survey.name, "TESTCAVE");
    assert_eq!(survey.series.len(), 1);
    let root = &survey.series[0];
    assert_eq!(root.name(), "TESTCAVE");
    assert_eq!(root.children.len(), 2);
    assert!(survey.find_series("TESTCAVE.1").is_some());
    assert!(survey.find_series("TESTCAVE.2").is_some());
}

#[test]
fn test_repeated_shots_are_averaged() {
    let survey = parse_pockettopo(&lines(POCKETTOPO_SAMPLE), &mut BufferLogger::new()).unwrap();
    let series = survey.find_series("TESTCAVE.1").unwrap();
    // 1.0-1.1, merged 1.1-1.2, splay at 1.2, cross-series 1.2-2.0.
    assert_eq!(series.legs.len(), 4);

    let merged = &series.legs[1];
    assert!((merged.length - 5.330).abs() < 1e-9);
    assert!((merged.bearing - 13.75).abs() < 0.01);
    assert!((merged.inclination() - -3.275).abs() < 1e-9);
}

#[test]
fn test_sample_splay_and_cross_series_leg() {
    let mut logger = BufferLogger::new();
    let survey = parse_pockettopo(&lines(POCKETTOPO_SAMPLE), &mut logger).unwrap();
    let series = survey.find_series("TESTCAVE.1").unwrap();

    let splay = &series.legs[2];
    assert!(splay.splay);
    assert_eq!(splay.to.as_ref().unwrap().display_name(), "2a");

    // The leg into the next series keeps its full far-station reference
    // and is tied to series 2 through a resolved link on the root.
    let cross = &series.legs[3];
    assert_eq!(cross.to.as_ref().unwrap().display_name(), "2.0");
    let root = &survey.series[0];
    assert_eq!(root.links.len(), 1);
    assert_eq!(root.links[0].path1, "1");
    assert_eq!(root.links[0].path2, "2");
    assert_eq!(root.links[0].station2.id, 0);
}

#[test]
fn test_trip_date_lands_on_series() {
    let survey = parse_pockettopo(&lines(POCKETTOPO_SAMPLE), &mut BufferLogger::new()).unwrap();
    assert_eq!(
        survey.find_series("TESTCAVE.1").unwrap().date.as_deref(),
        Some("2010/03/28")
    );
}

#[test]
fn test_total_length_excludes_splays() {
    let survey = parse_pockettopo(&lines(POCKETTOPO_SAMPLE), &mut BufferLogger::new()).unwrap();
    // 2.550 + 5.330 + 4.120 + 3.000; the splay does not count.
    assert!((survey.total_length() - 15.0).abs() < 1e-9);
}
