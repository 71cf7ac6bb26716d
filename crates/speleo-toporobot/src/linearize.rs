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

//! Series linearizer: flatten a nested, branching survey into simple
//! unbranched chains.
//!
//! Stations are given survey-global identities keyed by (series path,
//! station id); resolved links collapse the two sides of each equate into
//! one identity, with the first-seen series preferred as the
//! representative. Calibration corrections are applied here, so chain
//! legs carry final values. Chains grow by appending or prepending
//! compatible legs (reversing a leg where needed) and never revisit a
//! station; a leg whose both endpoints are already placed starts its own
//! two-station chain. Branches show up as several chains sharing a
//! station.

use std::collections::HashMap;

use speleo_core::units::normalize_bearing;
use speleo_core::{Logger, Lrud, Series, Survey, Vertical};

/// One survey-global station after link resolution.
#[derive(Debug, Clone)]
pub struct FlatStation {
    /// Dotted path of the series the representative belongs to.
    pub series: String,
    pub id: i32,
    pub name: String,
    pub lrud: Lrud,
}

/// One leg between two global station indices, fully corrected.
#[derive(Debug, Clone, Copy)]
pub struct FlatLeg {
    pub from: usize,
    pub to: usize,
    pub length: f64,
    pub bearing: f64,
    pub gradient: f64,
}

impl FlatLeg {
    fn reversed(self) -> Self {
        Self {
            from: self.to,
            to: self.from,
            bearing: normalize_bearing(self.bearing + 180.0),
            gradient: -self.gradient,
            ..self
        }
    }
}

/// An unbranched chain of stations and the legs between them.
/// `legs.len() == nodes.len() - 1` and `legs[i]` runs `nodes[i]` to
/// `nodes[i + 1]`.
#[derive(Debug, Default)]
pub struct Chain {
    pub nodes: Vec<usize>,
    pub legs: Vec<FlatLeg>,
}

/// The flattened survey.
#[derive(Debug, Default)]
pub struct FlatSurvey {
    pub stations: Vec<FlatStation>,
    pub chains: Vec<Chain>,
}

struct Interner {
    index: HashMap<(String, i32), usize>,
    parent: Vec<usize>,
    stations: Vec<FlatStation>,
}

impl Interner {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            parent: Vec::new(),
            stations: Vec::new(),
        }
    }

    fn intern(&mut self, series: &str, id: i32, name: String) -> usize {
        let key = (series.to_string(), id);
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.stations.len();
        self.index.insert(key, idx);
        self.parent.push(idx);
        self.stations.push(FlatStation {
            series: series.to_string(),
            id,
            name,
            lrud: Lrud::default(),
        });
        idx
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    /// Union two identities, keeping the earlier-interned station as the
    /// representative.
    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (keep, merge) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[merge] = keep;
        if self.stations[keep].lrud.is_zero() && !self.stations[merge].lrud.is_zero() {
            self.stations[keep].lrud = self.stations[merge].lrud;
        }
    }

    fn set_lrud(&mut self, idx: usize, lrud: Lrud) {
        let root = self.find(idx);
        if self.stations[root].lrud.is_zero() {
            self.stations[root].lrud = lrud;
        }
    }
}

/// Flatten a survey into linear chains of corrected legs.
pub fn linearize(survey: &Survey, logger: &mut dyn Logger) -> FlatSurvey {
    let mut interner = Interner::new();
    let mut legs: Vec<FlatLeg> = Vec::new();

    for series in &survey.series {
        collect(series, series.name(), &mut interner, &mut legs, logger);
    }

    let mut chains: Vec<Chain> = Vec::new();
    for mut leg in legs {
        leg.from = interner.find(leg.from);
        leg.to = interner.find(leg.to);
        place(&mut chains, leg);
    }

    FlatSurvey {
        stations: interner.stations,
        chains,
    }
}

fn collect(
    series: &Series,
    path: &str,
    interner: &mut Interner,
    legs: &mut Vec<FlatLeg>,
    logger: &mut dyn Logger,
) {
    let cal = &series.calibration;
    for leg in &series.legs {
        if leg.splay {
            continue;
        }
        if leg.nosurvey {
            logger.log(&format!(
                "nosurvey leg at {} has no measurements, skipped",
                leg.from.display_name()
            ));
            continue;
        }
        if leg.duplicate {
            logger.log(&format!(
                "duplicate leg at {} skipped",
                leg.from.display_name()
            ));
            continue;
        }
        let to = match &leg.to {
            Some(t) => t,
            None => continue,
        };

        let from_idx = interner.intern(path, leg.from.id, leg.from.display_name());
        let to_idx = interner.intern(path, to.id, to.display_name());
        if !leg.lrud.is_zero() {
            interner.set_lrud(from_idx, leg.lrud);
        }
        if let Some(lrud) = series.terminal_lrud(to.id) {
            interner.set_lrud(to_idx, lrud);
        }

        let length = cal.corrected_length(leg.length);
        let bearing = cal.corrected_bearing(leg.bearing);
        let gradient = match leg.vertical {
            Vertical::Inclination(inc) => cal.corrected_gradient(inc),
            // Diving legs fold their depth gain back into an inclination.
            _ => {
                let change = leg.vertical.depth_change().unwrap_or(0.0);
                if length > 0.0 {
                    (change / length).clamp(-1.0, 1.0).asin().to_degrees()
                } else {
                    0.0
                }
            }
        };
        legs.push(FlatLeg {
            from: from_idx,
            to: to_idx,
            length,
            bearing,
            gradient,
        });
    }

    for link in &series.links {
        let side = |interner: &mut Interner, rel: &str, id: i32, name: String| {
            let full = if rel.is_empty() {
                path.to_string()
            } else {
                format!("{}.{}", path, rel)
            };
            interner.intern(&full, id, name)
        };
        let a = side(
            &mut *interner,
            &link.path1,
            link.station1.id,
            link.station1.display_name(),
        );
        let b = side(
            &mut *interner,
            &link.path2,
            link.station2.id,
            link.station2.display_name(),
        );
        interner.union(a, b);
    }

    for child in &series.children {
        let child_path = format!("{}.{}", path, child.name());
        collect(child, &child_path, interner, legs, logger);
    }
}

fn place(chains: &mut Vec<Chain>, leg: FlatLeg) {
    for chain in chains.iter_mut() {
        let head = chain.nodes.first().copied();
        let tail = chain.nodes.last().copied();
        if tail == Some(leg.from) && !chain.nodes.contains(&leg.to) {
            chain.nodes.push(leg.to);
            chain.legs.push(leg);
            return;
        }
        if head == Some(leg.to) && !chain.nodes.contains(&leg.from) {
            chain.nodes.insert(0, leg.from);
            chain.legs.insert(0, leg);
            return;
        }
        if tail == Some(leg.to) && !chain.nodes.contains(&leg.from) {
            let rev = leg.reversed();
            chain.nodes.push(rev.to);
            chain.legs.push(rev);
            return;
        }
        if head == Some(leg.from) && !chain.nodes.contains(&leg.to) {
            let rev = leg.reversed();
            chain.nodes.insert(0, rev.from);
            chain.legs.insert(0, rev);
            return;
        }
    }
    chains.push(Chain {
        nodes: vec![leg.from, leg.to],
        legs: vec![leg],
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use speleo_core::{BufferLogger, Leg};

    fn flat(survey: &Survey) -> FlatSurvey {
        linearize(survey, &mut BufferLogger::new())
    }

    #[test]
    fn test_linear_series_is_one_chain() {
        let mut survey = Survey::new("t");
        let mut series = Series::new("cave");
        for (a, b) in [("1", "2"), ("2", "3"), ("3", "4")] {
            let from = series.station(a);
            let to = series.station(b);
            series.add_leg(Leg::normal(from, to, 10.0, 0.0, 0.0));
        }
        survey.add_series(series);

        let flat = flat(&survey);
        assert_eq!(flat.chains.len(), 1);
        assert_eq!(flat.chains[0].nodes.len(), 4);
        assert_eq!(flat.chains[0].legs.len(), 3);
    }

    #[test]
    fn test_branch_splits_into_second_chain() {
        let mut survey = Survey::new("t");
        let mut series = Series::new("cave");
        for (a, b) in [("1", "2"), ("2", "3"), ("2", "10")] {
            let from = series.station(a);
            let to = series.station(b);
            series.add_leg(Leg::normal(from, to, 5.0, 0.0, 0.0));
        }
        survey.add_series(series);

        let flat = flat(&survey);
        assert_eq!(flat.chains.len(), 2);
        // The branch chain shares station 2 with the main chain.
        let junction = flat.chains[0].nodes[1];
        assert_eq!(flat.chains[1].nodes[0], junction);
    }

    #[test]
    fn test_linked_series_continue_one_chain() {
        let survey = speleo_test::branched_survey();
        let flat = flat(&survey);
        // upper: 1-2-3, lower: 1-2 with upper.3 == lower.1, so the lower
        // leg extends the upper chain through the shared station.
        assert_eq!(flat.chains.len(), 1);
        assert_eq!(flat.chains[0].nodes.len(), 4);
        let junction = flat.chains[0].nodes[2];
        // The representative keeps the first-seen series.
        assert_eq!(flat.stations[junction].series, "cave.upper");
        assert_eq!(flat.stations[junction].id, 3);
    }

    #[test]
    fn test_loop_closure_becomes_short_chain() {
        let mut survey = Survey::new("t");
        let mut series = Series::new("cave");
        for (a, b) in [("1", "2"), ("2", "3"), ("3", "1")] {
            let from = series.station(a);
            let to = series.station(b);
            series.add_leg(Leg::normal(from, to, 5.0, 0.0, 0.0));
        }
        survey.add_series(series);

        let flat = flat(&survey);
        // 1-2-3 grows, then 3-1 would revisit 1 and is placed alone.
        assert_eq!(flat.chains.len(), 2);
        assert_eq!(flat.chains[1].nodes.len(), 2);
    }

    #[test]
    fn test_calibration_applied_to_chain_legs() {
        let mut survey = Survey::new("t");
        let mut series = Series::new("cave");
        series.calibration.tape = 0.1;
        series.calibration.declination = 2.0;
        let from = series.station("1");
        let to = series.station("2");
        series.add_leg(Leg::normal(from, to, 10.0, 350.0, -5.0));
        survey.add_series(series);

        let flat = flat(&survey);
        let leg = flat.chains[0].legs[0];
        assert!((leg.length - 9.9).abs() < 1e-9);
        assert!((leg.bearing - 352.0).abs() < 1e-9);
        assert!((leg.gradient - -5.0).abs() < 1e-9);
    }

    #[test]
    fn test_diving_leg_depth_folded_to_gradient() {
        let mut survey = Survey::new("t");
        let mut series = Series::new("sump");
        let from = series.station("1");
        let to = series.station("2");
        series.add_leg(Leg::diving(
            from,
            to,
            10.0,
            90.0,
            Vertical::Depths { from: -2.0, to: -7.0 },
        ));
        survey.add_series(series);

        let flat = flat(&survey);
        let expected = (-0.5f64).asin().to_degrees();
        assert!((flat.chains[0].legs[0].gradient - expected).abs() < 1e-9);
    }

    #[test]
    fn test_splays_and_duplicates_excluded() {
        let mut survey = Survey::new("t");
        let mut series = Series::new("cave");
        let s1 = series.station("1");
        let s2 = series.station("2");
        series.add_leg(Leg::normal(s1.clone(), s2.clone(), 10.0, 0.0, 0.0));
        let mut dup = Leg::normal(s1.clone(), s2, 10.0, 0.0, 0.0);
        dup.duplicate = true;
        series.add_leg(dup);
        series.add_leg(Leg::splay(s1, 2.0, 90.0, 0.0));
        survey.add_series(series);

        let flat = flat(&survey);
        assert_eq!(flat.chains.len(), 1);
        assert_eq!(flat.chains[0].legs.len(), 1);
    }

    #[test]
    fn test_reversed_leg_joins_tail() {
        let mut survey = Survey::new("t");
        let mut series = Series::new("cave");
        // Second leg is surveyed back towards the chain end.
        for (a, b, bearing) in [("1", "2", 0.0), ("3", "2", 90.0)] {
            let from = series.station(a);
            let to = series.station(b);
            series.add_leg(Leg::normal(from, to, 5.0, bearing, 10.0));
        }
        survey.add_series(series);

        let flat = flat(&survey);
        assert_eq!(flat.chains.len(), 1);
        let second = flat.chains[0].legs[1];
        assert!((second.bearing - 270.0).abs() < 1e-9);
        assert!((second.gradient - -10.0).abs() < 1e-9);
    }
}
