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

//! Survey legs: one measured shot between two stations.

use crate::station::Station;
use crate::units::normalize_bearing;

/// Passage dimensions at a leg's `from` station, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lrud {
    pub left: f64,
    pub right: f64,
    pub up: f64,
    pub down: f64,
}

impl Lrud {
    pub fn new(left: f64, right: f64, up: f64, down: f64) -> Self {
        Self {
            left,
            right,
            up,
            down,
        }
    }

    /// True when all four extents are zero.
    pub fn is_zero(&self) -> bool {
        self.left == 0.0 && self.right == 0.0 && self.up == 0.0 && self.down == 0.0
    }
}

/// The vertical component of a leg.
///
/// A normal leg carries an inclination in degrees; a diving leg records
/// depth instead, either as explicit from/to depths or as a signed change.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Vertical {
    Inclination(f64),
    Depths { from: f64, to: f64 },
    DepthChange(f64),
}

impl Vertical {
    /// True for either diving encoding.
    pub fn is_diving(&self) -> bool {
        !matches!(self, Self::Inclination(_))
    }

    /// The inclination in degrees, when this is not a diving leg.
    pub fn inclination(&self) -> Option<f64> {
        match self {
            Self::Inclination(i) => Some(*i),
            _ => None,
        }
    }

    /// Signed depth gain along the leg, when this is a diving leg.
    pub fn depth_change(&self) -> Option<f64> {
        match self {
            Self::Inclination(_) => None,
            Self::Depths { from, to } => Some(to - from),
            Self::DepthChange(d) => Some(*d),
        }
    }

    fn reversed(self) -> Self {
        match self {
            Self::Inclination(i) => Self::Inclination(-i),
            Self::Depths { from, to } => Self::Depths { from: to, to: from },
            Self::DepthChange(d) => Self::DepthChange(-d),
        }
    }
}

/// One measured shot between two stations, or from a station into open
/// space (a splay, which may have no `to` station at all).
///
/// Length is metres, bearing and inclination degrees. The `lrud` extents
/// belong to the `from` station. `splay_used` marks a splay that the LRUD
/// reconstruction consumed; writers do not re-emit those.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Leg {
    pub from: Station,
    pub to: Option<Station>,
    pub length: f64,
    pub bearing: f64,
    pub vertical: Vertical,
    pub lrud: Lrud,
    pub splay: bool,
    pub duplicate: bool,
    pub surface: bool,
    pub nosurvey: bool,
    pub splay_used: bool,
    pub comment: String,
}

impl Leg {
    /// A normal measured leg.
    pub fn normal(from: Station, to: Station, length: f64, bearing: f64, inclination: f64) -> Self {
        Self {
            from,
            to: Some(to),
            length,
            bearing,
            vertical: Vertical::Inclination(inclination),
            lrud: Lrud::default(),
            splay: false,
            duplicate: false,
            surface: false,
            nosurvey: false,
            splay_used: false,
            comment: String::new(),
        }
    }

    /// A splay shot with no meaningful `to` station.
    pub fn splay(from: Station, length: f64, bearing: f64, inclination: f64) -> Self {
        Self {
            to: None,
            splay: true,
            ..Self::normal(from.clone(), from, length, bearing, inclination)
        }
    }

    /// A diving leg.
    pub fn diving(from: Station, to: Station, length: f64, bearing: f64, vertical: Vertical) -> Self {
        Self {
            vertical,
            ..Self::normal(from, to, length, bearing, 0.0)
        }
    }

    /// A topological-only connection with no measurements.
    pub fn nosurvey(from: Station, to: Station) -> Self {
        Self {
            nosurvey: true,
            ..Self::normal(from, to, 0.0, 0.0, 0.0)
        }
    }

    /// True for either diving encoding.
    pub fn is_diving(&self) -> bool {
        self.vertical.is_diving()
    }

    /// The inclination in degrees; zero for diving and nosurvey legs.
    pub fn inclination(&self) -> f64 {
        self.vertical.inclination().unwrap_or(0.0)
    }

    /// The reversed shot: stations swapped, bearing turned through 180°,
    /// inclination negated, depths swapped/negated. All other fields are
    /// preserved. Returns `None` for an open splay, which has no second
    /// station to swap to.
    ///
    /// Reversal is an involution: reversing twice restores the original.
    pub fn reversed(&self) -> Option<Leg> {
        let to = self.to.as_ref()?;
        Some(Leg {
            from: to.clone(),
            to: Some(self.from.clone()),
            bearing: normalize_bearing(self.bearing + 180.0),
            vertical: self.vertical.reversed(),
            ..self.clone()
        })
    }
}
