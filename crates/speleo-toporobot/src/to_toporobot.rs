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

//! Writer producing Toporobot text from a survey.
//!
//! Toporobot has no nesting and no branches, so the survey is first run
//! through the [linearizer](crate::linearize). Every record line starts
//! with four fixed-width integers `serie station 1 1`; negative station
//! numbers mark serie meta records and the six header records use series
//! −6…−1. Data columns are fixed-width with two decimals. The writer
//! never fails; inconsistencies are logged and the affected record is
//! emitted with neutral values.

use crate::linearize::{linearize, FlatSurvey};
use speleo_core::{Logger, Lrud, Survey};

/// Render a survey as Toporobot text.
pub fn to_toporobot(survey: &Survey, logger: &mut dyn Logger) -> String {
    let flat = linearize(survey, logger);
    if flat.chains.is_empty() {
        logger.log("no centreline legs to export");
    }

    let mut out = String::new();
    write_header(&mut out, survey);
    for (index, chain) in flat.chains.iter().enumerate() {
        let serie = index as i32 + 1;
        write_chain(&mut out, &flat, serie, index);
    }
    out
}

fn prefix(serie: i32, station: i32) -> String {
    format!("{:6}{:6}{:4}{:4}", serie, station, 1, 1)
}

/// The six synthetic header records, series −6…−1: survey name, entrance
/// coordinates, date, a reserved record, instrument corrections, and the
/// unit circle / precision record.
fn write_header(out: &mut String, survey: &Survey) {
    let name = if survey.name.is_empty() {
        "Cave"
    } else {
        survey.name.as_str()
    };
    let date = survey
        .series
        .iter()
        .find_map(|s| s.date.clone())
        .unwrap_or_else(|| "1970/01/01".to_string());

    out.push_str(&format!("{} {}\n", prefix(-6, 1), name));
    out.push_str(&format!(
        "{}{:10.2}{:10.2}{:10.2}\n",
        prefix(-5, 1),
        0.0,
        0.0,
        0.0
    ));
    out.push_str(&format!("{} {}\n", prefix(-4, 1), date));
    out.push_str(&format!("{}\n", prefix(-3, 1)));
    out.push_str(&format!(
        "{}{:8.2}{:8.2}{:8.2}\n",
        prefix(-2, 1),
        0.0,
        0.0,
        0.0
    ));
    out.push_str(&format!(
        "{}{:8.2}{:8.2}{:8.2}{:2}{:2}\n",
        prefix(-1, 1),
        360.0,
        360.0,
        0.05,
        1,
        1
    ));
}

fn write_chain(out: &mut String, flat: &FlatSurvey, serie: i32, index: usize) {
    let chain = &flat.chains[index];
    let head = chain.nodes[0];

    // Serie name record (-2): the series path of the chain's first station.
    out.push_str(&format!(
        "{} {}\n",
        prefix(serie, -2),
        flat.stations[head].series
    ));

    // Serie link record (-1): where this chain attaches. A chain whose
    // first station already appears in an earlier chain starts there;
    // otherwise it anchors to its own first station.
    let (anchor_serie, anchor_station) = flat.chains[..index]
        .iter()
        .enumerate()
        .find_map(|(other, c)| {
            c.nodes
                .iter()
                .position(|&n| n == head)
                .map(|pos| (other as i32 + 1, pos as i32))
        })
        .unwrap_or((serie, 0));
    out.push_str(&format!(
        "{}{:6}{:6}\n",
        prefix(serie, -1),
        anchor_serie,
        anchor_station
    ));

    for (position, &node) in chain.nodes.iter().enumerate() {
        let lrud = flat.stations[node].lrud;
        let (distance, bearing, gradient) = if position == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let leg = chain.legs[position - 1];
            (leg.length, leg.bearing, leg.gradient)
        };
        write_station(out, serie, position as i32, distance, bearing, gradient, lrud);
    }
}

#[allow(clippy::too_many_arguments)]
fn write_station(
    out: &mut String,
    serie: i32,
    station: i32,
    distance: f64,
    bearing: f64,
    gradient: f64,
    lrud: Lrud,
) {
    out.push_str(&format!(
        "{}{:8.2}{:8.2}{:8.2}{:8.2}{:8.2}{:8.2}{:8.2}\n",
        prefix(serie, station),
        distance,
        bearing,
        gradient,
        lrud.left,
        lrud.right,
        lrud.up,
        lrud.down
    ));
}
