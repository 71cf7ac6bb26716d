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

//! Parser for PocketTopo text exports.
//!
//! The file opens with a `NAME (unit, circle)` header, followed by trip
//! declarations `[n]: date "comment" declination` and shot lines. Shot
//! lines are classified by their token count once the trailing `[trip]`
//! reference and any quoted comment are peeled off: five tokens make a
//! leg, four a splay (the `to` field is empty), two an equate between
//! existing stations, and a bare comment extends the previous shot.
//!
//! PocketTopo repeats a shot for every DistoX reading; consecutive shots
//! between the same station pair are collapsed into one averaged leg.
//! Station references `series.station` are split at the last `.`; each
//! distinct prefix becomes a child series of the cave. Unresolvable
//! equates are logged and the stations are left unlinked.

use std::collections::HashMap;

use crate::error::{PocketTopoError, Result};
use speleo_core::units::{bearing_to_degrees, length_to_metres, normalize_bearing};
use speleo_core::{resolve_equate, Equate, Leg, Logger, ModelErrorKind, Series, Survey};
use speleo_core::units::{BearingUnit, GradientUnit, LengthUnit};

#[derive(Debug, Clone)]
struct Trip {
    id: String,
    date: String,
    declination: f64,
}

#[derive(Debug)]
enum Record {
    Leg {
        from: String,
        to: String,
        tape: f64,
        bearing: f64,
        inclination: f64,
        trip: Option<String>,
        comment: String,
    },
    Splay {
        from: String,
        tape: f64,
        bearing: f64,
        inclination: f64,
        trip: Option<String>,
    },
    Equate {
        from: String,
        to: String,
    },
}

/// Parse a PocketTopo text export into a survey.
pub fn parse_pockettopo(lines: &[String], logger: &mut dyn Logger) -> Result<Survey> {
    let mut iter = lines.iter().enumerate();

    let (cave_name, length_unit, angle_unit) = loop {
        let (number, raw) = iter
            .next()
            .ok_or_else(|| PocketTopoError::parse("empty file", 1))?;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        break parse_header(line, number + 1)?;
    };
    let gradient_unit = match angle_unit {
        BearingUnit::Grads => GradientUnit::Grads,
        _ => GradientUnit::Degrees,
    };

    let mut trips: Vec<Trip> = Vec::new();
    let mut records: Vec<Record> = Vec::new();

    for (number, raw) in iter {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('[') {
            trips.push(parse_trip(line, number + 1, angle_unit)?);
            continue;
        }
        classify_shot(line, number + 1, &mut records, logger)?;
    }

    let grouped = group_repeated_legs(records, logger);
    build_survey(
        &cave_name,
        grouped,
        &trips,
        length_unit,
        angle_unit,
        gradient_unit,
        logger,
    )
}

/// `NAME (m, 360)`: cave name plus length unit and compass circle.
fn parse_header(line: &str, number: usize) -> Result<(String, LengthUnit, BearingUnit)> {
    let (name, units) = match line.find('(') {
        Some(idx) => (
            line[..idx].trim(),
            line[idx + 1..].trim_end_matches(')').trim(),
        ),
        None => (line, ""),
    };
    if name.is_empty() {
        return Err(PocketTopoError::parse("missing cave name", number));
    }

    let mut length_unit = LengthUnit::Metres;
    let mut angle_unit = BearingUnit::Degrees;
    for part in units.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part {
            "m" => length_unit = LengthUnit::Metres,
            "ft" => length_unit = LengthUnit::Feet,
            "360" => angle_unit = BearingUnit::Degrees,
            "400" => angle_unit = BearingUnit::Grads,
            other => {
                return Err(PocketTopoError::parse(
                    format!("unknown unit token '{}' in header", other),
                    number,
                ))
            }
        }
    }
    Ok((name.to_string(), length_unit, angle_unit))
}

/// `[1]: 2010/03/28 "First trip" 2.5`, with the declination optional.
fn parse_trip(line: &str, number: usize, angle_unit: BearingUnit) -> Result<Trip> {
    let closing = line
        .find(']')
        .ok_or_else(|| PocketTopoError::parse("unterminated trip id", number))?;
    let id = line[1..closing].to_string();
    let rest = line[closing + 1..].trim_start_matches(':').trim();

    let (before, comment_and_after) = split_quoted_comment(rest);
    let date = before
        .split_whitespace()
        .next()
        .ok_or_else(|| PocketTopoError::parse("trip line has no date", number))?
        .to_string();
    let declination = comment_and_after
        .1
        .split_whitespace()
        .next()
        .map(|t| {
            t.parse::<f64>().map_err(|_| {
                PocketTopoError::parse(format!("bad trip declination '{}'", t), number)
            })
        })
        .transpose()?
        .map(|d| bearing_to_degrees(d, angle_unit))
        .unwrap_or(0.0);

    Ok(Trip {
        id,
        date,
        declination,
    })
}

/// Split a line at its quoted comment: (before, (comment, after)).
fn split_quoted_comment(line: &str) -> (&str, (String, &str)) {
    match line.find('"') {
        Some(start) => {
            let rest = &line[start + 1..];
            match rest.find('"') {
                Some(end) => (
                    &line[..start],
                    (rest[..end].to_string(), &rest[end + 1..]),
                ),
                None => (&line[..start], (rest.to_string(), "")),
            }
        }
        None => (line, (String::new(), "")),
    }
}

fn classify_shot(
    line: &str,
    number: usize,
    records: &mut Vec<Record>,
    logger: &mut dyn Logger,
) -> Result<()> {
    let (before, (comment, after)) = split_quoted_comment(line);
    let mut tokens: Vec<&str> = before
        .split_whitespace()
        .chain(after.split_whitespace())
        .collect();
    let trip = match tokens.last() {
        Some(t) if t.starts_with('[') && t.ends_with(']') => {
            let id = t[1..t.len() - 1].to_string();
            tokens.pop();
            Some(id)
        }
        _ => None,
    };

    let number_of = |token: &str, what: &str| -> Result<f64> {
        token
            .parse::<f64>()
            .map_err(|_| PocketTopoError::parse(format!("bad {} value '{}'", what, token), number))
    };

    match tokens.len() {
        5 => records.push(Record::Leg {
            from: tokens[0].to_string(),
            to: tokens[1].to_string(),
            tape: number_of(tokens[2], "tape")?,
            bearing: number_of(tokens[3], "bearing")?,
            inclination: number_of(tokens[4], "inclination")?,
            trip,
            comment,
        }),
        4 => records.push(Record::Splay {
            from: tokens[0].to_string(),
            tape: number_of(tokens[1], "tape")?,
            bearing: number_of(tokens[2], "bearing")?,
            inclination: number_of(tokens[3], "inclination")?,
            trip,
        }),
        2 => records.push(Record::Equate {
            from: tokens[0].to_string(),
            to: tokens[1].to_string(),
        }),
        0 if !comment.is_empty() => match records.last_mut() {
            Some(Record::Leg { comment: c, .. }) => {
                if c.is_empty() {
                    *c = comment;
                } else {
                    c.push_str("; ");
                    c.push_str(&comment);
                }
            }
            _ => logger.log(&format!(
                "line {}: comment '{}' has no shot to attach to",
                number, comment
            )),
        },
        n => {
            return Err(PocketTopoError::parse(
                format!("unrecognized shot line with {} fields", n),
                number,
            ))
        }
    }
    Ok(())
}

/// An open run of consecutive repeated shots of one station pair.
/// Bearings accumulate as unit-vector components so wraparound groups
/// average correctly.
struct OpenLeg {
    from: String,
    to: String,
    tape_sum: f64,
    east_sum: f64,
    north_sum: f64,
    inclination_sum: f64,
    count: usize,
    first_bearing: f64,
    trip: Option<String>,
    comment: String,
}

impl OpenLeg {
    fn close(self) -> Record {
        let bearing = if self.count == 1 {
            self.first_bearing
        } else {
            normalize_bearing(self.east_sum.atan2(self.north_sum).to_degrees())
        };
        Record::Leg {
            from: self.from,
            to: self.to,
            tape: self.tape_sum / self.count as f64,
            bearing,
            inclination: self.inclination_sum / self.count as f64,
            trip: self.trip,
            comment: self.comment,
        }
    }
}

/// Collapse consecutive repeated shots of the same station pair into one
/// leg: tape and inclination by arithmetic mean over the whole group,
/// bearing by vector mean over the whole group.
fn group_repeated_legs(records: Vec<Record>, logger: &mut dyn Logger) -> Vec<Record> {
    let mut out: Vec<Record> = Vec::new();
    let mut open: Option<OpenLeg> = None;
    for record in records {
        match record {
            Record::Leg {
                from,
                to,
                tape,
                bearing,
                inclination,
                trip,
                comment,
            } => {
                let radians = bearing.to_radians();
                if let Some(group) = open.as_mut() {
                    if group.from == from && group.to == to {
                        group.tape_sum += tape;
                        group.east_sum += radians.sin();
                        group.north_sum += radians.cos();
                        group.inclination_sum += inclination;
                        group.count += 1;
                        if !comment.is_empty() {
                            if group.comment.is_empty() {
                                group.comment = comment;
                            } else if !group.comment.contains(comment.as_str()) {
                                group.comment.push_str("; ");
                                group.comment.push_str(&comment);
                            }
                        }
                        logger.log(&format!("merged repeated shot {} - {}", from, to));
                        continue;
                    }
                }
                if let Some(group) = open.take() {
                    out.push(group.close());
                }
                open = Some(OpenLeg {
                    from,
                    to,
                    tape_sum: tape,
                    east_sum: radians.sin(),
                    north_sum: radians.cos(),
                    inclination_sum: inclination,
                    count: 1,
                    first_bearing: bearing,
                    trip,
                    comment,
                });
            }
            other => {
                if let Some(group) = open.take() {
                    out.push(group.close());
                }
                out.push(other);
            }
        }
    }
    if let Some(group) = open.take() {
        out.push(group.close());
    }
    out
}

/// Split `series.station` at the last dot; a bare name lands in the root.
fn split_station_ref(reference: &str) -> (Option<&str>, &str) {
    match reference.rfind('.') {
        Some(idx) if idx > 0 => (Some(&reference[..idx]), &reference[idx + 1..]),
        _ => (None, reference),
    }
}

fn series_for<'a>(root: &'a mut Series, prefix: Option<&str>) -> &'a mut Series {
    let prefix = match prefix {
        Some(p) => p,
        None => return root,
    };
    let idx = match root.children.iter().position(|c| c.name() == prefix) {
        Some(i) => i,
        None => {
            let child = Series::child_of(prefix, root);
            root.add_child(child);
            root.children.len() - 1
        }
    };
    &mut root.children[idx]
}

/// Synthetic splay suffix: 0 → `a`, 25 → `z`, 26 → `aa`, …
fn splay_suffix(mut n: u32) -> String {
    let mut suffix = String::new();
    loop {
        suffix.insert(0, (b'a' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    suffix
}

#[allow(clippy::too_many_arguments)]
fn build_survey(
    cave_name: &str,
    records: Vec<Record>,
    trips: &[Trip],
    length_unit: LengthUnit,
    angle_unit: BearingUnit,
    gradient_unit: GradientUnit,
    logger: &mut dyn Logger,
) -> Result<Survey> {
    let mut root = Series::new(cave_name);
    let mut equates: Vec<Equate> = Vec::new();
    let mut splay_counts: HashMap<String, u32> = HashMap::new();

    let series_path = |prefix: Option<&str>| match prefix {
        Some(p) => format!("{}.{}", cave_name, p),
        None => cave_name.to_string(),
    };

    for record in records {
        match record {
            Record::Leg {
                from,
                to,
                tape,
                bearing,
                inclination,
                trip,
                comment,
            } => {
                let (from_prefix, from_station) = split_station_ref(&from);
                let (to_prefix, to_station) = split_station_ref(&to);
                let length = length_to_metres(tape, length_unit);
                let bearing = normalize_bearing(bearing_to_degrees(bearing, angle_unit));
                let inclination =
                    speleo_core::units::gradient_to_degrees(inclination, gradient_unit);

                let trip = trip.and_then(|id| trips.iter().find(|t| t.id == id));
                let series = series_for(&mut root, from_prefix);
                if let Some(trip) = trip {
                    if series.date.is_none() {
                        series.date = Some(trip.date.clone());
                    }
                    series.calibration.declination = trip.declination;
                }

                let from_st = series.station(from_station);
                let mut leg = if from_prefix == to_prefix {
                    let to_st = series.station(to_station);
                    Leg::normal(from_st, to_st, length, bearing, inclination)
                } else {
                    // The far station is interned here under its full
                    // reference and tied to its own series by an equate.
                    let to_st = series.station(&to);
                    equates.push(Equate::from_parts(
                        series_path(from_prefix),
                        to.clone(),
                        series_path(to_prefix),
                        to_station,
                    ));
                    Leg::normal(from_st, to_st, length, bearing, inclination)
                };
                leg.comment = comment;
                series.add_leg(leg);
                // Make sure the far series exists for the resolver.
                if from_prefix != to_prefix {
                    series_for(&mut root, to_prefix);
                }
            }
            Record::Splay {
                from,
                tape,
                bearing,
                inclination,
                trip,
            } => {
                let (prefix, station) = split_station_ref(&from);
                let length = length_to_metres(tape, length_unit);
                let bearing = normalize_bearing(bearing_to_degrees(bearing, angle_unit));
                let inclination =
                    speleo_core::units::gradient_to_degrees(inclination, gradient_unit);

                let count = splay_counts.entry(from.clone()).or_insert(0);
                let synthetic = format!("{}{}", station, splay_suffix(*count));
                *count += 1;

                let trip = trip.and_then(|id| trips.iter().find(|t| t.id == id));
                let series = series_for(&mut root, prefix);
                if let Some(trip) = trip {
                    if series.date.is_none() {
                        series.date = Some(trip.date.clone());
                    }
                }
                let from_st = series.station(station);
                let to_st = series.station(&synthetic);
                let mut leg = Leg::normal(from_st, to_st, length, bearing, inclination);
                leg.splay = true;
                series.add_leg(leg);
            }
            Record::Equate { from, to } => {
                let (p1, s1) = split_station_ref(&from);
                let (p2, s2) = split_station_ref(&to);
                equates.push(Equate::from_parts(
                    series_path(p1),
                    s1,
                    series_path(p2),
                    s2,
                ));
            }
        }
    }

    let mut survey = Survey::new(cave_name);
    survey.add_series(root);

    // PocketTopo files reference stations across trips freely; a link
    // that cannot be placed leaves the stations unconnected rather than
    // failing the whole import.
    for equate in equates {
        match resolve_equate(&mut survey, &equate) {
            Ok(()) => {}
            Err(e) if e.kind == ModelErrorKind::Structure => {
                logger.log_error(&format!("unresolvable station link: {}", e));
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(survey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use speleo_core::BufferLogger;

    fn to_lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    #[test]
    fn test_splay_suffix_sequence() {
        assert_eq!(splay_suffix(0), "a");
        assert_eq!(splay_suffix(25), "z");
        assert_eq!(splay_suffix(26), "aa");
        assert_eq!(splay_suffix(27), "ab");
        assert_eq!(splay_suffix(52), "ba");
    }

    #[test]
    fn test_header_variants() {
        assert_eq!(
            parse_header("CAVE (m, 360)", 1).unwrap(),
            ("CAVE".to_string(), LengthUnit::Metres, BearingUnit::Degrees)
        );
        assert_eq!(
            parse_header("CAVE (ft, 400)", 1).unwrap(),
            ("CAVE".to_string(), LengthUnit::Feet, BearingUnit::Grads)
        );
        assert!(parse_header("(m, 360)", 1).is_err());
    }

    #[test]
    fn test_grads_header_converts_angles() {
        let text = "CAVE (m, 400)\n\n[1]: 2020/01/01 \"t\"\n\n1.0\t1.1\t10.000\t200.00\t50.00\t[1]\n";
        let survey = parse_pockettopo(&to_lines(text), &mut BufferLogger::new()).unwrap();
        let series = survey.find_series("CAVE.1").unwrap();
        assert!((series.legs[0].bearing - 180.0).abs() < 1e-9);
        assert!((series.legs[0].inclination() - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_trip_declination_and_date() {
        let text = "CAVE (m, 360)\n\n[1]: 2020/01/01 \"t\" 2.5\n\n1.0\t1.1\t5.000\t10.00\t0.00\t[1]\n";
        let survey = parse_pockettopo(&to_lines(text), &mut BufferLogger::new()).unwrap();
        let series = survey.find_series("CAVE.1").unwrap();
        assert_eq!(series.date.as_deref(), Some("2020/01/01"));
        assert_eq!(series.calibration.declination, 2.5);
        // Declination stays in the calibration; raw bearings are untouched.
        assert_eq!(series.legs[0].bearing, 10.0);
    }

    #[test]
    fn test_three_repeated_shots_average_over_whole_group() {
        let text = "CAVE (m, 360)\n\n[1]: 2020/01/01 \"t\"\n\n\
                    1.0\t1.1\t1.000\t10.00\t0.00\t[1]\n\
                    1.0\t1.1\t2.000\t20.00\t3.00\t[1]\n\
                    1.0\t1.1\t6.000\t30.00\t6.00\t[1]\n";
        let survey = parse_pockettopo(&to_lines(text), &mut BufferLogger::new()).unwrap();
        let series = survey.find_series("CAVE.1").unwrap();
        assert_eq!(series.legs.len(), 1);
        let leg = &series.legs[0];
        assert!((leg.length - 3.0).abs() < 1e-9);
        assert!((leg.bearing - 20.0).abs() < 1e-9);
        assert!((leg.inclination() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_shots_average_across_north() {
        let text = "CAVE (m, 360)\n\n[1]: 2020/01/01 \"t\"\n\n\
                    1.0\t1.1\t5.000\t350.00\t0.00\t[1]\n\
                    1.0\t1.1\t5.000\t0.00\t0.00\t[1]\n\
                    1.0\t1.1\t5.000\t10.00\t0.00\t[1]\n";
        let survey = parse_pockettopo(&to_lines(text), &mut BufferLogger::new()).unwrap();
        let series = survey.find_series("CAVE.1").unwrap();
        assert_eq!(series.legs.len(), 1);
        assert!(series.legs[0].bearing < 1e-9 || series.legs[0].bearing > 360.0 - 1e-9);
    }

    #[test]
    fn test_comment_only_line_extends_previous_shot() {
        let text = "CAVE (m, 360)\n\n[1]: 2020/01/01 \"t\"\n\n\
                    1.0\t1.1\t5.000\t10.00\t0.00\t[1]\n\
                    \t\"tight squeeze\"\n";
        let survey = parse_pockettopo(&to_lines(text), &mut BufferLogger::new()).unwrap();
        let series = survey.find_series("CAVE.1").unwrap();
        assert_eq!(series.legs[0].comment, "tight squeeze");
    }

    #[test]
    fn test_splays_get_letter_suffixes() {
        let text = "CAVE (m, 360)\n\n[1]: 2020/01/01 \"t\"\n\n\
                    1.2\t\t1.870\t95.70\t3.00\t[1]\n\
                    1.2\t\t2.100\t200.00\t-5.00\t[1]\n";
        let survey = parse_pockettopo(&to_lines(text), &mut BufferLogger::new()).unwrap();
        let series = survey.find_series("CAVE.1").unwrap();
        assert_eq!(series.legs.len(), 2);
        assert!(series.legs[0].splay);
        assert_eq!(series.legs[0].to.as_ref().unwrap().display_name(), "2a");
        assert_eq!(series.legs[1].to.as_ref().unwrap().display_name(), "2b");
    }

    #[test]
    fn test_unresolvable_equate_is_logged_not_fatal() {
        let text = "CAVE (m, 360)\n\n[1]: 2020/01/01 \"t\"\n\n\
                    1.0\t1.1\t5.000\t10.00\t0.00\t[1]\n\
                    1.1\t9.0\n";
        let mut logger = BufferLogger::new();
        let survey = parse_pockettopo(&to_lines(text), &mut logger).unwrap();
        assert!(survey.find_series("CAVE.1").is_some());
        assert!(logger
            .errors
            .iter()
            .any(|e| e.contains("unresolvable station link")));
    }

    #[test]
    fn test_malformed_shot_line_is_fatal() {
        let text = "CAVE (m, 360)\n\n1.0\t1.1\t5.000\n";
        let err = parse_pockettopo(&to_lines(text), &mut BufferLogger::new()).unwrap_err();
        match err {
            PocketTopoError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
