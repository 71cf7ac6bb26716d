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

//! Survey series: a named, possibly nested chain of legs sharing one
//! calibration context.

use crate::leg::{Leg, Lrud};
use crate::station::{Fix, Station, StationInterner};
use crate::units::{normalize_bearing, BearingUnit, GradientUnit, LengthUnit};

/// Instrument calibration offsets for one series.
///
/// Corrections follow zero-error semantics: the stored offset is the
/// instrument's reading at a true zero, so it is subtracted from raw
/// readings. Declination is added to bearings after the compass offset.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Calibration {
    pub tape: f64,
    pub compass: f64,
    pub clino: f64,
    pub clino_scale: f64,
    pub declination: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            tape: 0.0,
            compass: 0.0,
            clino: 0.0,
            clino_scale: 1.0,
            declination: 0.0,
        }
    }
}

impl Calibration {
    /// Apply the tape correction to a raw length in metres.
    pub fn corrected_length(&self, raw: f64) -> f64 {
        raw - self.tape
    }

    /// Apply compass offset and declination to a raw bearing in degrees.
    pub fn corrected_bearing(&self, raw: f64) -> f64 {
        normalize_bearing(raw - self.compass + self.declination)
    }

    /// Apply clino offset and scale to a raw gradient in degrees.
    pub fn corrected_gradient(&self, raw: f64) -> f64 {
        (raw - self.clino) * self.clino_scale
    }
}

/// Default measurement units for raw readings in one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitSettings {
    pub length: LengthUnit,
    pub depth: LengthUnit,
    pub bearing: BearingUnit,
    pub gradient: GradientUnit,
}

impl Default for UnitSettings {
    fn default() -> Self {
        Self {
            length: LengthUnit::Metres,
            depth: LengthUnit::Metres,
            bearing: BearingUnit::Degrees,
            gradient: GradientUnit::Degrees,
        }
    }
}

/// One positional field role in a data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataField {
    From,
    To,
    Tape,
    Compass,
    Clino,
    FromDepth,
    ToDepth,
    DepthChange,
    Ignore,
    IgnoreAll,
}

/// An ordered list of field roles consumed positionally by data lines.
///
/// A series may hold a normal and a diving order at the same time to
/// support mixed blocks; the writer picks per leg by its diving flag.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataOrder {
    pub fields: Vec<DataField>,
    pub diving: bool,
    pub nosurvey: bool,
}

impl DataOrder {
    pub fn normal(fields: Vec<DataField>) -> Self {
        Self {
            fields,
            diving: false,
            nosurvey: false,
        }
    }

    pub fn diving(fields: Vec<DataField>) -> Self {
        Self {
            fields,
            diving: true,
            nosurvey: false,
        }
    }

    pub fn nosurvey(fields: Vec<DataField>) -> Self {
        Self {
            fields,
            diving: false,
            nosurvey: true,
        }
    }

    /// The conventional `from to tape compass clino` order.
    pub fn default_normal() -> Self {
        Self::normal(vec![
            DataField::From,
            DataField::To,
            DataField::Tape,
            DataField::Compass,
            DataField::Clino,
        ])
    }
}

/// A resolved station equivalence between two series, held by their
/// common ancestor. Paths are dot-separated and relative to the holder;
/// an empty path names the holder itself.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeriesLink {
    pub path1: String,
    pub station1: Station,
    pub path2: String,
    pub station2: Station,
}

/// A named, possibly branching chain of legs sharing one calibration
/// context. Series nest; nested series and direct legs may coexist.
/// Leg insertion order is significant: it encodes traverse order and
/// passage-dimension block adjacency.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Series {
    name: String,
    pub legs: Vec<Leg>,
    pub children: Vec<Series>,
    pub links: Vec<SeriesLink>,
    pub calibration: Calibration,
    pub units: UnitSettings,
    pub primary_order: Option<DataOrder>,
    pub secondary_order: Option<DataOrder>,
    pub date: Option<String>,
    /// Fixed or entrance-flagged stations declared in this series.
    pub markers: Vec<Station>,
    /// Passage dimensions for stations that only ever appear as a `to`
    /// endpoint, so have no leg of their own to carry them.
    pub terminal_lruds: Vec<(Station, Lrud)>,
    interner: StationInterner,
}

impl Series {
    /// A new top-level series with default calibration and units.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            legs: Vec::new(),
            children: Vec::new(),
            links: Vec::new(),
            calibration: Calibration::default(),
            units: UnitSettings::default(),
            primary_order: None,
            secondary_order: None,
            date: None,
            markers: Vec::new(),
            terminal_lruds: Vec::new(),
            interner: StationInterner::new(),
        }
    }

    /// A child series inheriting the parent's calibration, units and data
    /// orders at creation time. The inherited values remain independently
    /// overridable afterwards.
    pub fn child_of(name: impl Into<String>, parent: &Series) -> Self {
        Self {
            calibration: parent.calibration,
            units: parent.units,
            primary_order: parent.primary_order.clone(),
            secondary_order: parent.secondary_order.clone(),
            ..Self::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Intern a station name and return the resulting station value.
    pub fn station(&mut self, name: &str) -> Station {
        let id = self.interner.intern(name);
        if id >= 0 && name == id.to_string() {
            Station::new(id)
        } else {
            Station::named(id, name)
        }
    }

    /// The id a station name resolves to, without creating a station.
    pub fn station_id(&mut self, name: &str) -> i32 {
        self.interner.intern(name)
    }

    pub fn add_leg(&mut self, leg: Leg) {
        self.legs.push(leg);
    }

    pub fn add_child(&mut self, child: Series) {
        self.children.push(child);
    }

    pub fn find_child(&self, name: &str) -> Option<&Series> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn find_child_mut(&mut self, name: &str) -> Option<&mut Series> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Record a data order declaration. At most one normal and one diving
    /// order are retained; the most recent declaration of each kind wins.
    pub fn set_data_order(&mut self, order: DataOrder) {
        match &self.primary_order {
            None => self.primary_order = Some(order),
            Some(p) if p.diving == order.diving && p.nosurvey == order.nosurvey => {
                self.primary_order = Some(order)
            }
            Some(_) => self.secondary_order = Some(order),
        }
    }

    /// The data order that applies to a leg of the given diving-ness,
    /// preferring the most recently declared matching order.
    pub fn order_for(&self, diving: bool) -> Option<&DataOrder> {
        match (&self.primary_order, &self.secondary_order) {
            (Some(p), _) if p.diving == diving => Some(p),
            (_, Some(s)) if s.diving == diving => Some(s),
            (p, _) => p.as_ref(),
        }
    }

    /// Record a fixed position for a station in this series.
    pub fn mark_fix(&mut self, name: &str, fix: Fix) {
        let id = self.interner.intern(name);
        if let Some(existing) = self.markers.iter_mut().find(|s| s.id == id) {
            existing.fix = Some(fix);
            return;
        }
        let mut station = self.station(name);
        station.fix = Some(fix);
        self.markers.push(station);
    }

    /// Flag a station in this series as a cave entrance.
    pub fn mark_entrance(&mut self, name: &str) {
        let id = self.interner.intern(name);
        if let Some(existing) = self.markers.iter_mut().find(|s| s.id == id) {
            existing.entrance = true;
            return;
        }
        let mut station = self.station(name);
        station.entrance = true;
        self.markers.push(station);
    }

    /// Store or replace the terminal passage dimensions for a station.
    pub fn set_terminal_lrud(&mut self, station: Station, lrud: Lrud) {
        if let Some(entry) = self
            .terminal_lruds
            .iter_mut()
            .find(|(s, _)| s.id == station.id)
        {
            entry.1 = lrud;
            return;
        }
        self.terminal_lruds.push((station, lrud));
    }

    /// Terminal passage dimensions for a station id, if recorded.
    pub fn terminal_lrud(&self, id: i32) -> Option<Lrud> {
        self.terminal_lruds
            .iter()
            .find(|(s, _)| s.id == id)
            .map(|(_, l)| *l)
    }

    /// Total number of legs, including nested series.
    pub fn leg_count(&self) -> usize {
        self.legs.len() + self.children.iter().map(Series::leg_count).sum::<usize>()
    }

    /// Total measured length in metres, including nested series.
    /// Splays, duplicates and nosurvey legs are excluded.
    pub fn total_length(&self) -> f64 {
        let own: f64 = self
            .legs
            .iter()
            .filter(|l| !l.splay && !l.duplicate && !l.nosurvey)
            .map(|l| l.length)
            .sum();
        own + self.children.iter().map(Series::total_length).sum::<f64>()
    }
}
