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

//! Parser for Compass survey exports (`.dat`).
//!
//! A Compass file is a sequence of cave sections separated by form-feed
//! lines. Each section carries a small trip header, a declination line,
//! a fixed column header and then data lines. Lengths and passage
//! dimensions are decimal feet; bearings and inclinations are degrees.

use crate::error::{CompassError, Result};
use speleo_core::units::{average_bearings, length_to_metres, normalize_bearing, LengthUnit};
use speleo_core::{Leg, Logger, Lrud, Series, Survey};

/// Readings at or below this value mean "no reading" in Compass exports.
const ABSENT_READING: f64 = -900.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    CaveName,
    TripHeader,
    ColumnHeader,
    Data,
}

/// Parse a Compass export into a survey.
///
/// Each form-feed-delimited cave section becomes one top-level series
/// named from its `SURVEY NAME:` line. Any malformed line aborts the
/// whole parse with a line-numbered error.
pub fn parse_compass(lines: &[String], logger: &mut dyn Logger) -> Result<Survey> {
    let mut survey = Survey::new("");
    let mut series: Option<Series> = None;
    let mut state = State::CaveName;
    let mut expect_team = false;
    let mut has_backsights = false;

    for (idx, raw) in lines.iter().enumerate() {
        let line_no = idx + 1;
        if raw.contains('\u{000C}') {
            // Form feed: close the cave section and resume header parsing.
            if let Some(s) = series.take() {
                survey.add_series(s);
            }
            state = State::CaveName;
            expect_team = false;
            has_backsights = false;
            continue;
        }
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match state {
            State::CaveName => {
                if survey.name.is_empty() {
                    survey.name = line.to_string();
                }
                state = State::TripHeader;
            }
            State::TripHeader => {
                let upper = line.to_ascii_uppercase();
                if let Some(rest) = strip_keyword(line, &upper, "SURVEY NAME:") {
                    series = Some(Series::new(rest.trim()));
                } else if let Some(rest) = strip_keyword(line, &upper, "SURVEY DATE:") {
                    let series = series_for(&mut series, &survey.name, logger);
                    let date = match rest.to_ascii_uppercase().find("COMMENT:") {
                        Some(pos) => rest[..pos].trim().to_string(),
                        None => rest.trim().to_string(),
                    };
                    if !date.is_empty() {
                        series.date = Some(date);
                    }
                } else if upper.starts_with("SURVEY TEAM:") {
                    expect_team = true;
                } else if let Some(rest) = strip_keyword(line, &upper, "DECLINATION:") {
                    let series = series_for(&mut series, &survey.name, logger);
                    let token = rest.split_whitespace().next().ok_or_else(|| {
                        CompassError::parse("missing declination value", line_no)
                    })?;
                    series.calibration.declination =
                        parse_number(token, "declination", line_no)?;
                    if let Some(pos) = rest.to_ascii_uppercase().find("CORRECTIONS:") {
                        logger.log(&format!(
                            "line {}: instrument corrections '{}' not applied",
                            line_no,
                            rest[pos + 12..].trim()
                        ));
                    }
                    state = State::ColumnHeader;
                } else if expect_team {
                    // Team member names; informational only.
                    expect_team = false;
                } else {
                    return Err(CompassError::parse(
                        format!("unrecognized trip header line '{}'", line),
                        line_no,
                    ));
                }
            }
            State::ColumnHeader => {
                has_backsights = validate_column_header(line, line_no)?;
                state = State::Data;
            }
            State::Data => {
                let series = series_for(&mut series, &survey.name, logger);
                parse_data_line(line, line_no, series, has_backsights, logger)?;
            }
        }
    }

    if let Some(s) = series.take() {
        survey.add_series(s);
    }
    Ok(survey)
}

fn strip_keyword<'a>(line: &'a str, upper: &str, keyword: &str) -> Option<&'a str> {
    if upper.starts_with(keyword) {
        Some(&line[keyword.len()..])
    } else {
        None
    }
}

/// The section's series, created on demand when a file omits the
/// `SURVEY NAME:` line.
fn series_for<'a>(
    series: &'a mut Option<Series>,
    cave_name: &str,
    logger: &mut dyn Logger,
) -> &'a mut Series {
    if series.is_none() {
        logger.log_error(&format!(
            "section without SURVEY NAME, using cave name '{}'",
            cave_name
        ));
    }
    series.get_or_insert_with(|| Series::new(cave_name))
}

/// Validate the fixed column header. Only the LEFT-UP-DOWN-RIGHT
/// dimension order is supported; any other arrangement is fatal.
/// Returns whether the optional backsight columns are present.
fn validate_column_header(line: &str, line_no: usize) -> Result<bool> {
    let tokens: Vec<String> = line
        .split_whitespace()
        .map(|t| t.to_ascii_uppercase())
        .collect();
    let dims = ["LEFT", "UP", "DOWN", "RIGHT"];
    let base = ["FROM", "TO", "LENGTH", "BEARING", "INC"];

    if tokens.len() < 9 || tokens[..5] != base {
        return Err(CompassError::parse(
            format!("unrecognized column header '{}'", line),
            line_no,
        ));
    }
    if tokens[5..9] != dims {
        if dims.iter().all(|d| tokens[5..9].iter().any(|t| t == d)) {
            return Err(CompassError::parse(
                format!(
                    "unsupported dimension order '{}' (only LEFT UP DOWN RIGHT is supported)",
                    tokens[5..9].join(" ")
                ),
                line_no,
            ));
        }
        return Err(CompassError::parse(
            format!("unrecognized column header '{}'", line),
            line_no,
        ));
    }

    let rest: Vec<&str> = tokens[9..].iter().map(String::as_str).collect();
    match rest.as_slice() {
        [] | ["FLAGS", "COMMENTS"] => Ok(false),
        ["AZM2", "INC2"] | ["AZM2", "INC2", "FLAGS", "COMMENTS"] => Ok(true),
        _ => Err(CompassError::parse(
            format!("unrecognized column header '{}'", line),
            line_no,
        )),
    }
}

fn parse_number(token: &str, what: &str, line_no: usize) -> Result<f64> {
    token.parse::<f64>().map_err(|_| {
        CompassError::parse(format!("bad {} value '{}'", what, token), line_no)
    })
}

fn reading(value: f64) -> Option<f64> {
    if value <= ABSENT_READING {
        None
    } else {
        Some(value)
    }
}

fn dimension_metres(value: f64) -> f64 {
    if value < 0.0 {
        0.0
    } else {
        length_to_metres(value, LengthUnit::Feet)
    }
}

fn parse_data_line(
    line: &str,
    line_no: usize,
    series: &mut Series,
    has_backsights: bool,
    logger: &mut dyn Logger,
) -> Result<()> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let numeric_columns = if has_backsights { 11 } else { 9 };
    if tokens.len() < numeric_columns {
        return Err(CompassError::parse(
            format!(
                "expected at least {} columns, found {}",
                numeric_columns,
                tokens.len()
            ),
            line_no,
        ));
    }

    let from = series.station(tokens[0]);
    let to = series.station(tokens[1]);
    let length_ft = parse_number(tokens[2], "length", line_no)?;
    let fwd_bearing = reading(parse_number(tokens[3], "bearing", line_no)?);
    let fwd_inc = reading(parse_number(tokens[4], "inclination", line_no)?);
    let left = parse_number(tokens[5], "left", line_no)?;
    let up = parse_number(tokens[6], "up", line_no)?;
    let down = parse_number(tokens[7], "down", line_no)?;
    let right = parse_number(tokens[8], "right", line_no)?;
    let (back_bearing, back_inc) = if has_backsights {
        (
            reading(parse_number(tokens[9], "back bearing", line_no)?),
            reading(parse_number(tokens[10], "back inclination", line_no)?),
        )
    } else {
        (None, None)
    };

    let trailing = tokens[numeric_columns..].join(" ");
    let (duplicate, exclude, comment) = decode_flags(&trailing, line_no, logger);
    if exclude {
        logger.log(&format!("line {}: leg flagged for exclusion", line_no));
        return Ok(());
    }

    // Back-sight reconciliation: use whichever direction has data; with
    // both, vector-average the bearings and average the inclinations.
    let raw_bearing = match (fwd_bearing, back_bearing) {
        (Some(f), Some(b)) => average_bearings(f, normalize_bearing(b + 180.0)),
        (Some(f), None) => f,
        (None, Some(b)) => normalize_bearing(b + 180.0),
        (None, None) => {
            logger.log_error(&format!("line {}: leg has no bearing reading", line_no));
            0.0
        }
    };
    let raw_inc = match (fwd_inc, back_inc) {
        (Some(f), Some(b)) => (f + -b) / 2.0,
        (Some(f), None) => f,
        (None, Some(b)) => -b,
        (None, None) => 0.0,
    };

    // Leg values stay uncalibrated; the declination lives on the series
    // and is applied by consumers that need true bearings.
    let mut leg = Leg::normal(
        from,
        to,
        length_to_metres(length_ft, LengthUnit::Feet),
        normalize_bearing(raw_bearing),
        raw_inc,
    );
    leg.lrud = Lrud::new(
        dimension_metres(left),
        dimension_metres(right),
        dimension_metres(up),
        dimension_metres(down),
    );
    leg.duplicate = duplicate;
    leg.comment = comment;
    series.add_leg(leg);
    Ok(())
}

/// Decode the trailing flag/comment column. Flag codes are embedded as
/// `#|codes#comment`; `L` marks a duplicate leg and `X` discards the leg
/// entirely. Anything else is a plain comment.
fn decode_flags(trailing: &str, line_no: usize, logger: &mut dyn Logger) -> (bool, bool, String) {
    let mut duplicate = false;
    let mut exclude = false;

    if let Some(rest) = trailing.strip_prefix("#|") {
        if let Some(end) = rest.find('#') {
            for code in rest[..end].chars() {
                match code.to_ascii_uppercase() {
                    'L' => duplicate = true,
                    'X' => exclude = true,
                    other => logger.log(&format!(
                        "line {}: ignoring flag code '{}'",
                        line_no, other
                    )),
                }
            }
            return (duplicate, exclude, rest[end + 1..].trim().to_string());
        }
    }
    (duplicate, exclude, trailing.trim().to_string())
}
