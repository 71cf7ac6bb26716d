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

//! Passage dimension (LRUD) reconstruction from splay shots.
//!
//! Mutates a [`Series`] in place: splay legs radiating from a station are
//! classified as up, down, left or right shots relative to the passage
//! direction, the best shot per direction becomes the station's extent on
//! its regular leg, and the winning splays are marked consumed. The series
//! must be exclusively owned for the duration of the call.

use crate::leg::Lrud;
use crate::series::Series;
use crate::units::{average_bearings, bearing_difference, normalize_bearing};
use std::collections::HashSet;

/// Splays matching a radiating regular leg within these tolerances are
/// assumed to be back-sight checks rather than dimension shots.
const BACKSIGHT_BEARING_TOLERANCE: f64 = 3.0;
const BACKSIGHT_GRADIENT_TOLERANCE: f64 = 3.0;
const BACKSIGHT_TAPE_TOLERANCE: f64 = 0.2;

/// Splays steeper than this are up/down candidates.
const VERTICAL_THRESHOLD: f64 = 20.0;
/// Splays strictly inside this band are left/right candidates.
const HORIZONTAL_BAND: f64 = 70.0;

#[derive(Debug, Clone, Copy)]
struct Shot {
    bearing: f64,
    inclination: f64,
    length: f64,
}

#[derive(Debug, Clone, Copy)]
struct Pick {
    /// Index into the station's splay group.
    splay: usize,
    value: f64,
    /// Selection key; larger wins.
    key: f64,
    candidates: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct Dimensions {
    up: Option<Pick>,
    down: Option<Pick>,
    left: Option<Pick>,
    right: Option<Pick>,
}

impl Dimensions {
    fn is_empty(&self) -> bool {
        self.up.is_none() && self.down.is_none() && self.left.is_none() && self.right.is_none()
    }
}

/// Reconstruct passage dimensions for a series and all nested series.
pub fn generate_lrud(series: &mut Series) {
    for child in &mut series.children {
        generate_lrud(child);
    }
    generate_local(series);
}

fn generate_local(series: &mut Series) {
    // Non-surface, non-diving legs only; splays need a usable gradient
    // and regular legs a usable direction.
    let regular: Vec<usize> = series
        .legs
        .iter()
        .enumerate()
        .filter(|(_, l)| !l.splay && !l.surface && !l.nosurvey && !l.is_diving() && l.to.is_some())
        .map(|(i, _)| i)
        .collect();
    let splays: Vec<usize> = series
        .legs
        .iter()
        .enumerate()
        .filter(|(_, l)| l.splay && !l.surface && !l.splay_used && !l.is_diving())
        .map(|(i, _)| i)
        .collect();

    let mut seen = HashSet::new();
    for &i in &regular {
        let sid = series.legs[i].from.id;
        if !seen.insert(sid) {
            continue;
        }

        let outgoing: Vec<usize> = regular
            .iter()
            .copied()
            .filter(|&j| series.legs[j].from.id == sid)
            .collect();
        let incoming: Vec<usize> = regular
            .iter()
            .copied()
            .filter(|&j| series.legs[j].to.as_ref().map(|t| t.id) == Some(sid))
            .collect();

        let mut radiating: Vec<Shot> = Vec::new();
        for &j in &outgoing {
            radiating.push(shot_of(series, j, false));
        }
        for &j in &incoming {
            radiating.push(shot_of(series, j, true));
        }

        let out_bearing = series.legs[i].bearing;
        let forward = match best_previous(series, &incoming, out_bearing) {
            Some(prev_bearing) => average_bearings(out_bearing, prev_bearing),
            None => out_bearing,
        };

        let group: Vec<usize> = splays
            .iter()
            .copied()
            .filter(|&j| series.legs[j].from.id == sid)
            .collect();
        if group.is_empty() {
            continue;
        }

        let dims = pick_dimensions(series, &group, &radiating, forward);
        apply_to_leg(series, i, &group, &dims);
    }

    // Stations that only ever appear as a `to` endpoint: treat the
    // arriving leg, reversed, as the radiating set and cache the result
    // on the series instead of a leg.
    let origin_ids: HashSet<i32> = regular.iter().map(|&j| series.legs[j].from.id).collect();
    let mut seen_terminal = HashSet::new();
    for &i in &regular {
        let (tid, station) = match &series.legs[i].to {
            Some(t) => (t.id, t.clone()),
            None => continue,
        };
        if origin_ids.contains(&tid) || !seen_terminal.insert(tid) {
            continue;
        }

        let incoming: Vec<usize> = regular
            .iter()
            .copied()
            .filter(|&j| series.legs[j].to.as_ref().map(|t| t.id) == Some(tid))
            .collect();
        let radiating: Vec<Shot> = incoming.iter().map(|&j| shot_of(series, j, true)).collect();
        let forward = series.legs[i].bearing;

        let group: Vec<usize> = splays
            .iter()
            .copied()
            .filter(|&j| series.legs[j].from.id == tid)
            .collect();
        if group.is_empty() {
            continue;
        }

        let dims = pick_dimensions(series, &group, &radiating, forward);
        if dims.is_empty() {
            continue;
        }
        let mut lrud = series.terminal_lrud(tid).unwrap_or_default();
        merge(&mut lrud, &dims);
        series.set_terminal_lrud(station, lrud);
        mark_consumed(series, &group, &dims);
    }
}

fn shot_of(series: &Series, index: usize, reverse: bool) -> Shot {
    let leg = &series.legs[index];
    if reverse {
        Shot {
            bearing: normalize_bearing(leg.bearing + 180.0),
            inclination: -leg.inclination(),
            length: leg.length,
        }
    } else {
        Shot {
            bearing: leg.bearing,
            inclination: leg.inclination(),
            length: leg.length,
        }
    }
}

/// The previous leg whose bearing best continues into the outgoing leg,
/// by minimum bearing difference.
fn best_previous(series: &Series, incoming: &[usize], out_bearing: f64) -> Option<f64> {
    incoming
        .iter()
        .map(|&j| series.legs[j].bearing)
        .min_by(|a, b| {
            bearing_difference(*a, out_bearing)
                .partial_cmp(&bearing_difference(*b, out_bearing))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

fn is_backsight(shot: &Shot, radiating: &[Shot]) -> bool {
    radiating.iter().any(|r| {
        bearing_difference(shot.bearing, r.bearing) <= BACKSIGHT_BEARING_TOLERANCE
            && (shot.inclination - r.inclination).abs() <= BACKSIGHT_GRADIENT_TOLERANCE
            && (shot.length - r.length).abs() <= BACKSIGHT_TAPE_TOLERANCE
    })
}

fn pick_dimensions(
    series: &Series,
    group: &[usize],
    radiating: &[Shot],
    forward: f64,
) -> Dimensions {
    let mut dims = Dimensions::default();
    for (g, &j) in group.iter().enumerate() {
        let shot = shot_of(series, j, false);
        if is_backsight(&shot, radiating) {
            continue;
        }
        let inc = shot.inclination;

        if inc > VERTICAL_THRESHOLD {
            let value = shot.length * inc.to_radians().sin();
            consider(&mut dims.up, g, value, inc);
        }
        if inc < -VERTICAL_THRESHOLD {
            let value = shot.length * inc.to_radians().sin().abs();
            consider(&mut dims.down, g, value, -inc);
        }
        if inc > -HORIZONTAL_BAND && inc < HORIZONTAL_BAND {
            let relative = normalize_bearing(shot.bearing - forward);
            if relative > 0.0 && relative < 180.0 {
                let proj = shot.length * inc.to_radians().cos() * (relative - 90.0).to_radians().cos();
                consider(&mut dims.right, g, proj, proj);
            } else {
                let proj = shot.length * inc.to_radians().cos() * (relative - 270.0).to_radians().cos();
                consider(&mut dims.left, g, proj, proj);
            }
        }
    }
    dims
}

fn consider(slot: &mut Option<Pick>, splay: usize, value: f64, key: f64) {
    match slot {
        None => {
            *slot = Some(Pick {
                splay,
                value,
                key,
                candidates: 1,
            })
        }
        Some(pick) => {
            pick.candidates += 1;
            if key > pick.key {
                pick.splay = splay;
                pick.value = value;
                pick.key = key;
            }
        }
    }
}

fn apply_to_leg(series: &mut Series, leg_index: usize, group: &[usize], dims: &Dimensions) {
    let mut lrud = series.legs[leg_index].lrud;
    merge(&mut lrud, dims);
    series.legs[leg_index].lrud = lrud;
    mark_consumed(series, group, dims);
}

fn merge(lrud: &mut Lrud, dims: &Dimensions) {
    if let Some(p) = dims.up {
        lrud.up = p.value;
    }
    if let Some(p) = dims.down {
        lrud.down = p.value;
    }
    if let Some(p) = dims.left {
        lrud.left = p.value;
    }
    if let Some(p) = dims.right {
        lrud.right = p.value;
    }
}

/// A winning splay is consumed only when it was the sole candidate for
/// its direction; ambiguous groups stay visible to the writers.
fn mark_consumed(series: &mut Series, group: &[usize], dims: &Dimensions) {
    for pick in [dims.up, dims.down, dims.left, dims.right].into_iter().flatten() {
        if pick.candidates == 1 {
            series.legs[group[pick.splay]].splay_used = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leg::Leg;

    fn station(series: &mut Series, name: &str) -> crate::station::Station {
        series.station(name)
    }

    /// Three legs due north with axis-aligned splays at every station.
    fn linear_fixture() -> Series {
        let mut series = Series::new("test");
        let splay_data = [
            // (station, left?, horizontal bearing, h len, up len, down len)
            ("1", 270.0, 0.51, 1.55, 0.86),
            ("2", 90.0, 0.58, 2.73, 1.16),
            ("3", 270.0, 0.41, 3.68, 0.54),
            ("4", 90.0, 0.52, 4.40, 1.42),
        ];
        for w in [("1", "2"), ("2", "3"), ("3", "4")] {
            let from = station(&mut series, w.0);
            let to = station(&mut series, w.1);
            series.add_leg(Leg::normal(from, to, 10.0, 0.0, 0.0));
        }
        for (name, bearing, h, up, down) in splay_data {
            let s = station(&mut series, name);
            series.add_leg(Leg::splay(s.clone(), h, bearing, 0.0));
            series.add_leg(Leg::splay(s.clone(), up, 15.0, 90.0));
            series.add_leg(Leg::splay(s, down, 195.0, -90.0));
        }
        series
    }

    #[test]
    fn test_linear_series_dimensions() {
        let mut series = linear_fixture();
        generate_lrud(&mut series);

        let l1 = series.legs[0].lrud;
        assert!((l1.left - 0.51).abs() < 1e-9);
        assert_eq!(l1.right, 0.0);
        assert!((l1.up - 1.55).abs() < 1e-9);
        assert!((l1.down - 0.86).abs() < 1e-9);

        let l2 = series.legs[1].lrud;
        assert_eq!(l2.left, 0.0);
        assert!((l2.right - 0.58).abs() < 1e-9);
        assert!((l2.up - 2.73).abs() < 1e-9);
        assert!((l2.down - 1.16).abs() < 1e-9);

        let l3 = series.legs[2].lrud;
        assert!((l3.left - 0.41).abs() < 1e-9);
        assert!((l3.up - 3.68).abs() < 1e-9);

        // Station 4 never appears as a from station.
        let terminal = series.terminal_lrud(4).expect("terminal LRUD for 4");
        assert!((terminal.right - 0.52).abs() < 1e-9);
        assert!((terminal.up - 4.40).abs() < 1e-9);
        assert!((terminal.down - 1.42).abs() < 1e-9);
        assert_eq!(terminal.left, 0.0);
    }

    #[test]
    fn test_winning_splays_are_consumed() {
        let mut series = linear_fixture();
        generate_lrud(&mut series);
        let consumed = series.legs.iter().filter(|l| l.splay_used).count();
        // One splay per direction per station, all unambiguous.
        assert_eq!(consumed, 12);
    }

    #[test]
    fn test_idempotent_without_eligible_splays() {
        let mut series = Series::new("plain");
        let a = station(&mut series, "1");
        let b = station(&mut series, "2");
        series.add_leg(Leg::normal(a, b, 4.2, 123.0, -2.0));
        generate_lrud(&mut series);
        generate_lrud(&mut series);
        assert!(series.legs[0].lrud.is_zero());
        assert!(series.terminal_lruds.is_empty());
    }

    #[test]
    fn test_backsight_splays_are_discarded() {
        let mut series = Series::new("bs");
        let a = station(&mut series, "1");
        let b = station(&mut series, "2");
        series.add_leg(Leg::normal(a, b.clone(), 5.0, 90.0, 0.0));
        // Splay from 2 back along the leg, within all three tolerances.
        series.add_leg(Leg::splay(b, 5.1, 271.0, 1.0));
        generate_lrud(&mut series);
        assert!(series.terminal_lruds.is_empty());
        assert!(!series.legs[1].splay_used);
    }

    #[test]
    fn test_ambiguous_direction_keeps_splays() {
        let mut series = Series::new("amb");
        let a = station(&mut series, "1");
        let b = station(&mut series, "2");
        series.add_leg(Leg::normal(a.clone(), b, 5.0, 0.0, 0.0));
        series.add_leg(Leg::splay(a.clone(), 1.0, 90.0, 0.0));
        series.add_leg(Leg::splay(a, 1.4, 100.0, 0.0));
        generate_lrud(&mut series);
        // Best of the two right-hand shots wins the extent,
        // but neither splay is consumed.
        assert!(series.legs[0].lrud.right > 1.0);
        assert!(!series.legs[1].splay_used);
        assert!(!series.legs[2].splay_used);
    }

    #[test]
    fn test_up_down_threshold_is_exclusive() {
        let mut series = Series::new("th");
        let a = station(&mut series, "1");
        let b = station(&mut series, "2");
        series.add_leg(Leg::normal(a.clone(), b, 5.0, 0.0, 0.0));
        // Exactly 20 degrees is not an up candidate.
        series.add_leg(Leg::splay(a, 2.0, 90.0, 20.0));
        generate_lrud(&mut series);
        assert_eq!(series.legs[0].lrud.up, 0.0);
        // But it is inside the left/right band.
        assert!(series.legs[0].lrud.right > 0.0);
    }

    #[test]
    fn test_nested_series_are_processed() {
        let mut parent = Series::new("cave");
        let mut child = Series::child_of("inner", &parent);
        let a = child.station("1");
        let b = child.station("2");
        child.add_leg(Leg::normal(a.clone(), b, 6.0, 0.0, 0.0));
        child.add_leg(Leg::splay(a, 0.9, 270.0, 0.0));
        parent.add_child(child);
        generate_lrud(&mut parent);
        assert!((parent.children[0].legs[0].lrud.left - 0.9).abs() < 1e-9);
    }
}
