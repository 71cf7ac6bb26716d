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

//! Shared fixtures for the speleo format converter tests.
//!
//! Sample files live here as string constants so the integration tests of
//! the parser and writer crates exercise the same inputs, plus a couple
//! of model builders for tests that start from an in-memory survey.

use speleo_core::{Leg, Series, Survey};

/// Split fixture text into the decoded-line form the parsers consume.
pub fn lines(text: &str) -> Vec<String> {
    text.lines().map(String::from).collect()
}

/// A two-section Compass export with backsights in the first section.
pub const COMPASS_SAMPLE: &str = "\
Test Cave
SURVEY NAME: A
SURVEY DATE: 7 10 79  COMMENT: entrance series
SURVEY TEAM:
D.Smith P.Jones
DECLINATION: 0.00  FORMAT: DMMDLRUDLADN  CORRECTIONS: 0.00 0.00 0.00

FROM TO LENGTH BEARING INC LEFT UP DOWN RIGHT AZM2 INC2 FLAGS COMMENTS

A1 A2 32.80 15.00 -6.00 2.00 1.00 3.00 1.00 193.00 6.00
A2 A3 16.40 100.00 2.00 1.00 1.00 1.00 2.00 -999.00 -999.00 #|L#resurvey of old leg
\u{000C}
Test Cave
SURVEY NAME: B
SURVEY DATE: 8 10 79
SURVEY TEAM:
D.Smith
DECLINATION: 0.00  FORMAT: DMMDLRUDLADN

FROM TO LENGTH BEARING INC LEFT UP DOWN RIGHT

B1 B2 9.84 200.00 0.00 0.00 0.00 0.00 0.00
";

/// A nested Survex file with mixed flags, an equate and a splay.
pub const SURVEX_SAMPLE: &str = "\
*begin cave
*calibrate declination 0.0
*data normal from to tape compass clino
*begin upper
1 2 5.00 10.00 -2.00
2 3 4.00 100.00 0.00 ; muddy ledge
*flags splay
3 - 1.20 190.00 0.00
*flags not splay
*end upper
*begin lower
1 2 6.00 190.00 5.00
*end lower
*equate upper.3 lower.1
*end cave
";

/// A PocketTopo text export with repeated shots, a splay and a leg that
/// crosses between two series.
pub const POCKETTOPO_SAMPLE: &str = "\
TESTCAVE (m, 360)

[1]: 2010/03/28 \"First trip\"

1.0\t1.1\t2.550\t312.81\t-23.57\t[1]
1.1\t1.2\t5.330\t13.80\t-3.25\t[1]
1.1\t1.2\t5.330\t13.70\t-3.30\t[1]
1.2\t\t1.870\t95.70\t3.00\t[1]
1.2\t2.0\t4.120\t78.00\t1.00\t[1]
2.0\t2.1\t3.000\t100.00\t0.00\t[1]
";

/// A minimal DXF export: one two-leg polyline plus a separate LINE pair.
pub const DXF_SAMPLE: &str = "\
0
SECTION
2
ENTITIES
0
POLYLINE
8
Centreline
0
VERTEX
10
0.0
20
0.0
30
0.0
0
VERTEX
10
0.0
20
10.0
30
0.0
0
VERTEX
10
5.0
20
10.0
30
-1.0
0
SEQEND
0
LINE
8
Centreline
10
5.0
20
10.0
30
-1.0
11
5.0
21
15.0
31
-1.0
0
ENDSEC
0
EOF
";

/// Three legs due north with three axis-aligned splays at each of the
/// four stations. After LRUD reconstruction the expected extents are,
/// per station: (left, right, up, down) =
/// 1: (0.51, 0, 1.55, 0.86), 2: (0, 0.58, 2.73, 1.16),
/// 3: (0.41, 0, 3.68, 0.54), 4: (0, 0.52, 4.40, 1.42).
pub fn linear_splay_series() -> Series {
    let mut series = Series::new("test");
    for (from, to) in [("1", "2"), ("2", "3"), ("3", "4")] {
        let from = series.station(from);
        let to = series.station(to);
        series.add_leg(Leg::normal(from, to, 10.0, 0.0, 0.0));
    }
    let splays = [
        ("1", 270.0, 0.51, 1.55, 0.86),
        ("2", 90.0, 0.58, 2.73, 1.16),
        ("3", 270.0, 0.41, 3.68, 0.54),
        ("4", 90.0, 0.52, 4.40, 1.42),
    ];
    for (name, bearing, horizontal, up, down) in splays {
        let s = series.station(name);
        series.add_leg(Leg::splay(s.clone(), horizontal, bearing, 0.0));
        series.add_leg(Leg::splay(s.clone(), up, 15.0, 90.0));
        series.add_leg(Leg::splay(s, down, 195.0, -90.0));
    }
    series
}

/// The linear splay series wrapped in a survey.
pub fn linear_splay_survey() -> Survey {
    let mut survey = Survey::new("test");
    survey.add_series(linear_splay_series());
    survey
}

/// A survey with two sibling series under one parent, sharing a station
/// through a resolved link.
pub fn branched_survey() -> Survey {
    let mut cave = Series::new("cave");
    let mut upper = Series::child_of("upper", &cave);
    for (from, to, bearing) in [("1", "2", 10.0), ("2", "3", 100.0)] {
        let from = upper.station(from);
        let to = upper.station(to);
        upper.add_leg(Leg::normal(from, to, 5.0, bearing, 0.0));
    }
    let mut lower = Series::child_of("lower", &cave);
    for (from, to, bearing) in [("1", "2", 190.0)] {
        let from = lower.station(from);
        let to = lower.station(to);
        lower.add_leg(Leg::normal(from, to, 6.0, bearing, 5.0));
    }
    cave.add_child(upper);
    cave.add_child(lower);
    let mut survey = Survey::new("test");
    survey.add_series(cave);
    speleo_core::resolve_equates(
        &mut survey,
        &[speleo_core::Equate::new("cave.upper.3", "cave.lower.1").expect("fixture equate")],
    )
    .expect("fixture link");
    survey
}
