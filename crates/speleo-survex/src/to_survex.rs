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

//! Writer producing Survex (`.svx`) source from a survey.
//!
//! Every series becomes a `*begin`/`*end` block. Calibration lines are
//! only emitted where a series differs from what it inherits, and
//! `*data`/`*flags` lines only where consecutive legs change style or
//! flags. Passage dimensions are rendered as `*data passage` blocks over
//! chains of consecutively connected stations.

use speleo_core::{Calibration, DataField, Leg, Logger, Lrud, Series, Station, Survey, Vertical};

/// Render a survey as Survex source text.
pub fn to_survex(survey: &Survey, logger: &mut dyn Logger) -> String {
    let mut out = String::new();
    for series in &survey.series {
        write_series(&mut out, series, None, logger);
    }
    out
}

/// Map a free-form name onto the Survex station/survey character set.
fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            c if c.is_ascii_alphanumeric() => out.push(c),
            '_' | '-' => out.push(c),
            '+' => out.push_str("_pl"),
            _ => out.push('_'),
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}

fn station_name(station: &Station) -> String {
    sanitize_name(&station.display_name())
}

fn write_series(
    out: &mut String,
    series: &Series,
    parent: Option<&Series>,
    logger: &mut dyn Logger,
) {
    let name = sanitize_name(series.name());
    out.push_str(&format!("*begin {}\n", name));

    if let Some(date) = &series.date {
        out.push_str(&format!("*date {}\n", date));
    }
    let inherited = parent.map(|p| p.calibration).unwrap_or_default();
    write_calibration(out, &series.calibration, &inherited);
    write_markers(out, series);
    write_legs(out, series);
    write_passages(out, series, logger);

    for child in &series.children {
        write_series(out, child, Some(series), logger);
    }
    write_links(out, series);

    out.push_str(&format!("*end {}\n", name));
}

/// Emit only the calibration quantities that differ from the inherited
/// values; a child matching its parent produces no lines at all.
fn write_calibration(out: &mut String, cal: &Calibration, inherited: &Calibration) {
    if cal.tape != inherited.tape {
        out.push_str(&format!("*calibrate tape {:.2}\n", cal.tape));
    }
    if cal.compass != inherited.compass {
        out.push_str(&format!("*calibrate compass {:.2}\n", cal.compass));
    }
    if cal.clino != inherited.clino || cal.clino_scale != inherited.clino_scale {
        if cal.clino_scale != 1.0 {
            out.push_str(&format!(
                "*calibrate clino {:.2} {:.2}\n",
                cal.clino, cal.clino_scale
            ));
        } else {
            out.push_str(&format!("*calibrate clino {:.2}\n", cal.clino));
        }
    }
    if cal.declination != inherited.declination {
        out.push_str(&format!("*calibrate declination {:.2}\n", cal.declination));
    }
}

fn write_markers(out: &mut String, series: &Series) {
    for marker in &series.markers {
        let name = station_name(marker);
        if let Some(fix) = marker.fix {
            out.push_str(&format!(
                "*fix {} {:.2} {:.2} {:.2}\n",
                name, fix.x, fix.y, fix.z
            ));
        }
        if marker.entrance {
            out.push_str(&format!("*entrance {}\n", name));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegStyle {
    Normal,
    Diving,
    Nosurvey,
}

impl LegStyle {
    fn of(leg: &Leg) -> Self {
        if leg.nosurvey {
            Self::Nosurvey
        } else if leg.is_diving() {
            Self::Diving
        } else {
            Self::Normal
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Diving => "diving",
            Self::Nosurvey => "nosurvey",
        }
    }

    fn canonical_fields(self) -> &'static [DataField] {
        match self {
            Self::Normal => &[
                DataField::From,
                DataField::To,
                DataField::Tape,
                DataField::Compass,
                DataField::Clino,
            ],
            Self::Diving => &[
                DataField::From,
                DataField::To,
                DataField::Tape,
                DataField::Compass,
                DataField::DepthChange,
            ],
            Self::Nosurvey => &[DataField::From, DataField::To],
        }
    }
}

fn field_keyword(field: DataField) -> &'static str {
    match field {
        DataField::From => "from",
        DataField::To => "to",
        DataField::Tape => "tape",
        DataField::Compass => "compass",
        DataField::Clino => "clino",
        DataField::FromDepth => "fromdepth",
        DataField::ToDepth => "todepth",
        DataField::DepthChange => "depthchange",
        DataField::Ignore => "ignore",
        DataField::IgnoreAll => "ignoreall",
    }
}

/// The series' stored data order for this leg's style, when it can be
/// replayed verbatim: plain from/to plus instrument fields, and depth
/// fields matching the leg's vertical encoding.
fn stored_fields<'a>(series: &'a Series, style: LegStyle, leg: &Leg) -> Option<&'a [DataField]> {
    [series.primary_order.as_ref(), series.secondary_order.as_ref()]
        .into_iter()
        .flatten()
        .find(|order| {
            order.diving == (style == LegStyle::Diving)
                && order.nosurvey == (style == LegStyle::Nosurvey)
        })
        .filter(|order| {
            order
                .fields
                .iter()
                .all(|f| !matches!(f, DataField::Ignore | DataField::IgnoreAll))
                && order.fields.contains(&DataField::From)
                && order.fields.contains(&DataField::To)
                && (!order
                    .fields
                    .iter()
                    .any(|f| matches!(f, DataField::FromDepth | DataField::ToDepth))
                    || matches!(leg.vertical, Vertical::Depths { .. }))
        })
        .map(|order| order.fields.as_slice())
}

fn data_header(style: LegStyle, fields: &[DataField]) -> String {
    let keywords: Vec<&str> = fields.iter().map(|f| field_keyword(*f)).collect();
    format!("*data {} {}\n", style.keyword(), keywords.join(" "))
}

fn field_value(field: DataField, leg: &Leg, from: &str, to: &str) -> String {
    match field {
        DataField::From => from.to_string(),
        DataField::To => to.to_string(),
        DataField::Tape => format!("{:.2}", leg.length),
        DataField::Compass => format!("{:.2}", leg.bearing),
        DataField::Clino => format!("{:.2}", leg.inclination()),
        DataField::FromDepth => match leg.vertical {
            Vertical::Depths { from: d, .. } => format!("{:.2}", d),
            _ => "0.00".to_string(),
        },
        DataField::ToDepth => match leg.vertical {
            Vertical::Depths { to: d, .. } => format!("{:.2}", d),
            _ => "0.00".to_string(),
        },
        DataField::DepthChange => {
            format!("{:.2}", leg.vertical.depth_change().unwrap_or(0.0))
        }
        DataField::Ignore | DataField::IgnoreAll => "-".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct FlagState {
    duplicate: bool,
    splay: bool,
    surface: bool,
}

impl FlagState {
    fn of(leg: &Leg) -> Self {
        Self {
            duplicate: leg.duplicate,
            splay: leg.splay,
            surface: leg.surface,
        }
    }

    /// The `*flags` line switching from `self` to `next`, if any change.
    fn transition(self, next: FlagState) -> Option<String> {
        let mut tokens: Vec<&str> = Vec::new();
        for (was, now, name) in [
            (self.duplicate, next.duplicate, "duplicate"),
            (self.splay, next.splay, "splay"),
            (self.surface, next.surface, "surface"),
        ] {
            match (was, now) {
                (false, true) => tokens.push(name),
                (true, false) => {
                    tokens.push("not");
                    tokens.push(name);
                }
                _ => {}
            }
        }
        if tokens.is_empty() {
            None
        } else {
            Some(format!("*flags {}\n", tokens.join(" ")))
        }
    }
}

fn write_legs(out: &mut String, series: &Series) {
    let mut header: Option<String> = None;
    let mut flags = FlagState::default();

    for leg in &series.legs {
        // Splays consumed by LRUD reconstruction are not re-emitted.
        if leg.splay_used {
            continue;
        }
        let style = LegStyle::of(leg);
        let fields =
            stored_fields(series, style, leg).unwrap_or_else(|| style.canonical_fields());
        let needed = data_header(style, fields);
        if header.as_deref() != Some(needed.as_str()) {
            out.push_str(&needed);
            header = Some(needed);
        }
        if let Some(line) = flags.transition(FlagState::of(leg)) {
            out.push_str(&line);
        }
        flags = FlagState::of(leg);

        let from = station_name(&leg.from);
        let to = leg
            .to
            .as_ref()
            .map(station_name)
            .unwrap_or_else(|| "-".to_string());
        let values: Vec<String> = fields
            .iter()
            .map(|f| field_value(*f, leg, &from, &to))
            .collect();
        out.push_str(&values.join("\t"));
        if leg.comment.is_empty() {
            out.push('\n');
        } else {
            out.push_str(&format!("\t; {}\n", leg.comment));
        }
    }

    // Nested blocks inherit flag state, so leave it as we found it.
    if let Some(line) = flags.transition(FlagState::default()) {
        out.push_str(&line);
    }
}

fn write_links(out: &mut String, series: &Series) {
    for link in &series.links {
        let side = |path: &str, station: &Station| {
            if path.is_empty() {
                station_name(station)
            } else {
                let sanitized: Vec<String> =
                    path.split('.').map(sanitize_name).collect();
                format!("{}.{}", sanitized.join("."), station_name(station))
            }
        };
        out.push_str(&format!(
            "*equate {} {}\n",
            side(&link.path1, &link.station1),
            side(&link.path2, &link.station2)
        ));
    }
}

// ==================== passage data ====================

/// Chains of consecutively connected stations, built in leg order.
/// A leg extends the chain whose tail is its `from` station, or is
/// prepended to the chain whose head is its `to` station; otherwise it
/// starts a new chain. A leg that closes a loop (its `to` station is
/// already placed in some chain) still extends the `from` chain, so the
/// closing station's dimension line reappears there. Adjacent chains
/// are merged tail-to-head.
fn passage_chains(series: &Series, logger: &mut dyn Logger) -> Vec<Vec<Station>> {
    let mut chains: Vec<Vec<Station>> = Vec::new();

    for leg in &series.legs {
        if leg.splay || leg.nosurvey || leg.surface {
            continue;
        }
        let to = match &leg.to {
            Some(t) => t,
            None => continue,
        };
        if let Some(idx) = chains
            .iter()
            .position(|c| c.last().map(|s| s.id) == Some(leg.from.id))
        {
            if chains[idx].iter().any(|s| s.id == to.id) {
                logger.log(&format!(
                    "passage loop closed at {}",
                    to.display_name()
                ));
            }
            chains[idx].push(to.clone());
        } else if let Some(chain) = chains
            .iter_mut()
            .find(|c| c.first().map(|s| s.id) == Some(to.id))
        {
            chain.insert(0, leg.from.clone());
        } else {
            chains.push(vec![leg.from.clone(), to.clone()]);
        }
    }

    let mut merged = true;
    while merged {
        merged = false;
        'scan: for i in 0..chains.len() {
            for j in 0..chains.len() {
                if i == j {
                    continue;
                }
                let tail = chains[i].last().map(|s| s.id);
                let head = chains[j].first().map(|s| s.id);
                if tail.is_some() && tail == head {
                    let mut rest = chains.remove(j);
                    rest.remove(0);
                    let target = if j < i { i - 1 } else { i };
                    chains[target].extend(rest);
                    merged = true;
                    break 'scan;
                }
            }
        }
    }
    chains
}

/// Passage extents for a station: the first centreline leg shot from it
/// that carries dimensions, else the cached terminal entry.
fn lrud_for(series: &Series, id: i32) -> Lrud {
    series
        .legs
        .iter()
        .find(|l| !l.splay && l.from.id == id && !l.lrud.is_zero())
        .map(|l| l.lrud)
        .or_else(|| series.terminal_lrud(id))
        .unwrap_or_default()
}

fn write_passages(out: &mut String, series: &Series, logger: &mut dyn Logger) {
    for chain in passage_chains(series, logger) {
        if chain.len() < 2 {
            continue;
        }
        let extents: Vec<(String, Lrud)> = chain
            .iter()
            .map(|s| (station_name(s), lrud_for(series, s.id)))
            .collect();
        if extents.iter().all(|(_, l)| l.is_zero()) {
            continue;
        }
        out.push_str("*data passage station left right up down\n");
        for (name, lrud) in extents {
            out.push_str(&format!(
                "{}\t{:5.2}\t{:5.2}\t{:5.2}\t{:5.2}\n",
                name, lrud.left, lrud.right, lrud.up, lrud.down
            ));
        }
    }
}
