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

//! Parser for Survex source files (`.svx`).
//!
//! Commands are case-insensitive and `;` starts a comment. `*begin` and
//! `*end` blocks nest; each named block becomes a child series and each
//! block (named or anonymous) snapshots the inherited flag and data-order
//! context, restored on `*end`. `*include` directives are resolved by the
//! caller before parsing; an optional parallel list of `"file:line"`
//! references keeps diagnostics pointing at the original files.

use crate::error::{Result, SurvexError};
use speleo_core::units::{
    bearing_to_degrees, gradient_to_degrees, length_to_metres, normalize_bearing, BearingUnit,
    GradientUnit, LengthUnit,
};
use speleo_core::{
    resolve_equates, DataField, DataOrder, Equate, Fix, FixKind, Leg, Logger, Lrud, Series,
    Survey, Vertical,
};

#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    duplicate: bool,
    splay: bool,
    surface: bool,
}

#[derive(Debug)]
struct Block {
    name: Option<String>,
    saved_flags: Flags,
    saved_order: DataOrder,
    saved_passage: bool,
}

struct Parser<'a> {
    survey: Survey,
    open: Vec<Series>,
    blocks: Vec<Block>,
    flags: Flags,
    order: DataOrder,
    in_passage: bool,
    equates: Vec<Equate>,
    logger: &'a mut dyn Logger,
}

/// Parse a Survex file into a survey.
pub fn parse_survex(lines: &[String], logger: &mut dyn Logger) -> Result<Survey> {
    parse_survex_with_refs(lines, None, logger)
}

/// Parse Survex input assembled from several files, with a parallel list
/// of `"origin-file:line"` references used in error messages.
pub fn parse_survex_with_refs(
    lines: &[String],
    refs: Option<&[String]>,
    logger: &mut dyn Logger,
) -> Result<Survey> {
    let mut parser = Parser {
        survey: Survey::new(""),
        open: Vec::new(),
        blocks: Vec::new(),
        flags: Flags::default(),
        order: DataOrder::default_normal(),
        in_passage: false,
        equates: Vec::new(),
        logger,
    };

    for (idx, raw) in lines.iter().enumerate() {
        let reference = line_reference(refs, idx);
        let text = strip_comment(raw);
        let line = text.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(command) = line.strip_prefix('*') {
            parser.command(command, &reference)?;
        } else if parser.in_passage {
            parser.passage_line(line, &reference)?;
        } else {
            parser.leg_line(line, &reference)?;
        }
    }

    if let Some(block) = parser.blocks.last() {
        return Err(SurvexError::parse(
            format!(
                "unclosed begin block '{}'",
                block.name.as_deref().unwrap_or("(anonymous)")
            ),
            "end of input",
        ));
    }
    // Only the implicit root can remain open once all blocks are closed.
    while let Some(series) = parser.open.pop() {
        parser.survey.add_series(series);
    }

    let mut survey = parser.survey;
    resolve_equates(&mut survey, &parser.equates)?;
    Ok(survey)
}

fn line_reference(refs: Option<&[String]>, idx: usize) -> String {
    refs.and_then(|r| r.get(idx))
        .cloned()
        .unwrap_or_else(|| format!("line {}", idx + 1))
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn is_anonymous(name: &str) -> bool {
    name == "-" || name == ".."
}

fn parse_f64(token: &str, what: &str, reference: &str) -> Result<f64> {
    token
        .parse::<f64>()
        .map_err(|_| SurvexError::parse(format!("bad {} value '{}'", what, token), reference))
}

impl<'a> Parser<'a> {
    fn path(&self) -> String {
        self.open
            .iter()
            .map(|s| s.name().to_string())
            .collect::<Vec<_>>()
            .join(".")
    }

    fn current_series(&mut self) -> &mut Series {
        if self.open.is_empty() {
            self.logger
                .log("survey data outside any begin block, using implicit root 'survex'");
            self.open.push(Series::new("survex"));
        }
        let last = self.open.len() - 1;
        &mut self.open[last]
    }

    fn command(&mut self, command: &str, reference: &str) -> Result<()> {
        let mut tokens = command.split_whitespace();
        let keyword = tokens.next().unwrap_or("").to_ascii_lowercase();
        let args: Vec<&str> = tokens.collect();

        match keyword.as_str() {
            "begin" => self.begin(args.first().copied()),
            "end" => self.end(args.first().copied(), reference)?,
            "data" => self.data_command(&args, reference)?,
            "calibrate" => self.calibrate(&args, reference)?,
            "units" => self.units_command(&args, reference)?,
            "date" => {
                let date = args.join(" ");
                if !date.is_empty() {
                    self.current_series().date = Some(date);
                }
            }
            "flags" => self.flags_command(&args),
            "equate" => self.equate_command(&args, reference)?,
            "fix" => self.fix_command(&args, reference)?,
            "entrance" => {
                let name = args.first().ok_or_else(|| {
                    SurvexError::parse("missing station for *entrance", reference)
                })?;
                self.current_series().mark_entrance(name);
            }
            "include" => {
                self.logger.log(&format!(
                    "{}: *include is resolved by the caller, directive skipped",
                    reference
                ));
            }
            other => {
                self.logger
                    .log(&format!("{}: unknown command '*{}' ignored", reference, other));
            }
        }
        Ok(())
    }

    fn begin(&mut self, name: Option<&str>) {
        self.blocks.push(Block {
            name: name.map(str::to_string),
            saved_flags: self.flags,
            saved_order: self.order.clone(),
            saved_passage: self.in_passage,
        });
        if let Some(n) = name {
            let child = match self.open.last() {
                Some(parent) => Series::child_of(n, parent),
                None => Series::new(n),
            };
            self.open.push(child);
        }
        self.in_passage = false;
    }

    fn end(&mut self, name: Option<&str>, reference: &str) -> Result<()> {
        let block = self
            .blocks
            .pop()
            .ok_or_else(|| SurvexError::parse("*end without matching *begin", reference))?;
        match (&block.name, name) {
            (Some(b), Some(e)) if !b.eq_ignore_ascii_case(e) => {
                return Err(SurvexError::parse(
                    format!("mismatched block name: begin '{}' ended by '{}'", b, e),
                    reference,
                ));
            }
            (None, Some(e)) => {
                return Err(SurvexError::parse(
                    format!("anonymous block ended with name '{}'", e),
                    reference,
                ));
            }
            _ => {}
        }
        if block.name.is_some() {
            let finished = match self.open.pop() {
                Some(s) => s,
                None => {
                    return Err(SurvexError::Model(speleo_core::ModelError::structure(
                        "block stack out of step with series stack",
                    )))
                }
            };
            match self.open.last_mut() {
                Some(parent) => parent.add_child(finished),
                None => self.survey.add_series(finished),
            }
        }
        self.flags = block.saved_flags;
        self.order = block.saved_order;
        self.in_passage = block.saved_passage;
        Ok(())
    }

    fn data_command(&mut self, args: &[&str], reference: &str) -> Result<()> {
        let style = args
            .first()
            .ok_or_else(|| SurvexError::parse("missing data style", reference))?
            .to_ascii_lowercase();
        match style.as_str() {
            "passage" => {
                let expected = ["station", "left", "right", "up", "down"];
                let given: Vec<String> =
                    args[1..].iter().map(|t| t.to_ascii_lowercase()).collect();
                if !given.is_empty() && given != expected {
                    self.logger.log(&format!(
                        "{}: passage data order '{}' read as station left right up down",
                        reference,
                        given.join(" ")
                    ));
                }
                self.in_passage = true;
            }
            "normal" | "diving" | "nosurvey" => {
                let mut fields = Vec::with_capacity(args.len() - 1);
                for token in &args[1..] {
                    fields.push(parse_data_field(token, reference)?);
                }
                if !fields.contains(&DataField::From) || !fields.contains(&DataField::To) {
                    return Err(SurvexError::parse(
                        "data order must include from and to",
                        reference,
                    ));
                }
                let order = DataOrder {
                    fields,
                    diving: style == "diving",
                    nosurvey: style == "nosurvey",
                };
                self.current_series().set_data_order(order.clone());
                self.order = order;
                self.in_passage = false;
            }
            "default" => {
                self.order = DataOrder::default_normal();
                self.in_passage = false;
            }
            other => {
                return Err(SurvexError::parse(
                    format!("unsupported data style '{}'", other),
                    reference,
                ));
            }
        }
        Ok(())
    }

    fn calibrate(&mut self, args: &[&str], reference: &str) -> Result<()> {
        let value_idx = args
            .iter()
            .position(|t| t.parse::<f64>().is_ok())
            .ok_or_else(|| SurvexError::parse("missing calibration value", reference))?;
        if value_idx == 0 {
            return Err(SurvexError::parse("missing calibration quantity", reference));
        }
        let value = parse_f64(args[value_idx], "calibration", reference)?;
        let scale = args
            .get(value_idx + 1)
            .and_then(|t| t.parse::<f64>().ok());

        let units = self.current_series().units;
        for quantity in &args[..value_idx] {
            let series = self.current_series();
            match quantity.to_ascii_lowercase().as_str() {
                "tape" | "length" => {
                    series.calibration.tape = length_to_metres(value, units.length)
                }
                "compass" | "bearing" => {
                    series.calibration.compass = bearing_to_degrees(value, units.bearing)
                }
                "clino" | "gradient" => {
                    series.calibration.clino = gradient_to_degrees(value, units.gradient);
                    if let Some(s) = scale {
                        series.calibration.clino_scale = s;
                    }
                }
                "declination" => {
                    series.calibration.declination = bearing_to_degrees(value, units.bearing)
                }
                other => self.logger.log_error(&format!(
                    "{}: unknown calibration quantity '{}' ignored",
                    reference, other
                )),
            }
        }
        Ok(())
    }

    fn units_command(&mut self, args: &[&str], reference: &str) -> Result<()> {
        if args.len() < 2 {
            return Err(SurvexError::parse(
                "expected *units quantity... unit",
                reference,
            ));
        }
        let unit_token = args[args.len() - 1];
        for quantity in &args[..args.len() - 1] {
            if quantity.parse::<f64>().is_ok() {
                self.logger.log(&format!(
                    "{}: unit scale factor '{}' ignored",
                    reference, quantity
                ));
                continue;
            }
            match quantity.to_ascii_lowercase().as_str() {
                "tape" | "length" => match unit_token.parse::<LengthUnit>() {
                    Ok(u) => self.current_series().units.length = u,
                    Err(e) => self.log_unit_default(&e, reference),
                },
                "depth" => match unit_token.parse::<LengthUnit>() {
                    Ok(u) => self.current_series().units.depth = u,
                    Err(e) => self.log_unit_default(&e, reference),
                },
                "compass" | "bearing" => match unit_token.parse::<BearingUnit>() {
                    Ok(u) => self.current_series().units.bearing = u,
                    Err(e) => self.log_unit_default(&e, reference),
                },
                "clino" | "gradient" => match unit_token.parse::<GradientUnit>() {
                    Ok(u) => self.current_series().units.gradient = u,
                    Err(e) => self.log_unit_default(&e, reference),
                },
                other => self.logger.log(&format!(
                    "{}: unknown unit quantity '{}' ignored",
                    reference, other
                )),
            }
        }
        Ok(())
    }

    fn log_unit_default(&mut self, error: &str, reference: &str) {
        self.logger
            .log_error(&format!("{}: {}; keeping current unit", reference, error));
    }

    fn flags_command(&mut self, args: &[&str]) {
        let mut negate = false;
        for token in args {
            match token.to_ascii_lowercase().as_str() {
                "not" => {
                    negate = true;
                    continue;
                }
                "duplicate" => self.flags.duplicate = !negate,
                "splay" => self.flags.splay = !negate,
                "surface" => self.flags.surface = !negate,
                other => self
                    .logger
                    .log(&format!("unknown flag '{}' ignored", other)),
            }
            negate = false;
        }
    }

    fn equate_command(&mut self, args: &[&str], reference: &str) -> Result<()> {
        if args.len() < 2 {
            return Err(SurvexError::parse(
                "*equate needs at least two station references",
                reference,
            ));
        }
        let path = self.path();
        let full = |name: &str| {
            if path.is_empty() {
                name.to_string()
            } else {
                format!("{}.{}", path, name)
            }
        };
        for other in &args[1..] {
            self.equates.push(Equate::new(&full(args[0]), &full(other))?);
        }
        Ok(())
    }

    fn fix_command(&mut self, args: &[&str], reference: &str) -> Result<()> {
        let name = args
            .first()
            .ok_or_else(|| SurvexError::parse("missing station for *fix", reference))?;
        let coords: Vec<f64> = args[1..]
            .iter()
            .filter_map(|t| t.parse::<f64>().ok())
            .collect();
        if coords.len() < 3 {
            return Err(SurvexError::parse(
                format!("*fix {} needs x y z coordinates", name),
                reference,
            ));
        }
        let kind = if args[1..]
            .iter()
            .any(|t| t.eq_ignore_ascii_case("gps"))
        {
            FixKind::Gps
        } else {
            FixKind::Other
        };
        let fix = Fix {
            x: coords[0],
            y: coords[1],
            z: coords[2],
            kind,
        };
        self.current_series().mark_fix(name, fix);
        Ok(())
    }

    fn passage_line(&mut self, line: &str, reference: &str) -> Result<()> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 5 {
            return Err(SurvexError::parse(
                "passage data line needs station left right up down",
                reference,
            ));
        }
        let left = parse_f64(tokens[1], "left", reference)?;
        let right = parse_f64(tokens[2], "right", reference)?;
        let up = parse_f64(tokens[3], "up", reference)?;
        let down = parse_f64(tokens[4], "down", reference)?;
        let lrud = Lrud::new(left, right, up, down);

        let series = self.current_series();
        let id = series.station_id(tokens[0]);
        if let Some(leg) = series
            .legs
            .iter_mut()
            .find(|leg| !leg.splay && leg.from.id == id)
        {
            leg.lrud = lrud;
        } else {
            // Only seen as a `to` endpoint (or not yet at all): cache it.
            let station = series.station(tokens[0]);
            series.set_terminal_lrud(station, lrud);
        }
        Ok(())
    }

    fn leg_line(&mut self, line: &str, reference: &str) -> Result<()> {
        let flags = self.flags;
        let order = self.order.clone();
        let tokens: Vec<&str> = line.split_whitespace().collect();

        let mut from_name: Option<&str> = None;
        let mut to_name: Option<&str> = None;
        let mut tape: Option<f64> = None;
        let mut compass: Option<f64> = None;
        let mut clino: Option<f64> = None;
        let mut from_depth: Option<f64> = None;
        let mut to_depth: Option<f64> = None;
        let mut depth_change: Option<f64> = None;

        let mut idx = 0;
        for field in &order.fields {
            if *field == DataField::IgnoreAll {
                idx = tokens.len();
                break;
            }
            let token = *tokens.get(idx).ok_or_else(|| {
                SurvexError::parse(
                    format!("too few values for data order ({} expected)", order.fields.len()),
                    reference,
                )
            })?;
            idx += 1;
            match field {
                DataField::From => from_name = Some(token),
                DataField::To => to_name = Some(token),
                DataField::Tape => tape = Some(parse_f64(token, "tape", reference)?),
                DataField::Compass => compass = Some(parse_bearing_token(token, reference)?),
                DataField::Clino => clino = Some(parse_clino_token(token, reference)?),
                DataField::FromDepth => {
                    from_depth = Some(parse_f64(token, "from depth", reference)?)
                }
                DataField::ToDepth => to_depth = Some(parse_f64(token, "to depth", reference)?),
                DataField::DepthChange => {
                    depth_change = Some(parse_f64(token, "depth change", reference)?)
                }
                DataField::Ignore => {}
                DataField::IgnoreAll => {}
            }
        }
        if idx < tokens.len() {
            self.logger.log(&format!(
                "{}: {} extra values ignored",
                reference,
                tokens.len() - idx
            ));
        }

        let from_name = from_name
            .ok_or_else(|| SurvexError::parse("data order has no from station", reference))?;
        if is_anonymous(from_name) {
            return Err(SurvexError::parse(
                "anonymous from station is not supported",
                reference,
            ));
        }

        let series = self.current_series();
        let units = series.units;
        let from = series.station(from_name);
        let to = match to_name {
            Some(t) if !is_anonymous(t) => Some(series.station(t)),
            _ => None,
        };

        let length = tape.map(|v| length_to_metres(v, units.length)).unwrap_or(0.0);
        let bearing = compass
            .map(|v| normalize_bearing(bearing_to_degrees(v, units.bearing)))
            .unwrap_or(0.0);

        let leg = if order.nosurvey {
            let to = to.ok_or_else(|| {
                SurvexError::parse("nosurvey leg requires two stations", reference)
            })?;
            Leg::nosurvey(from, to)
        } else {
            let vertical = if order.diving {
                match (from_depth, to_depth, depth_change) {
                    (Some(f), Some(t), _) => Vertical::Depths {
                        from: length_to_metres(f, units.depth),
                        to: length_to_metres(t, units.depth),
                    },
                    (_, _, Some(d)) => Vertical::DepthChange(length_to_metres(d, units.depth)),
                    _ => {
                        return Err(SurvexError::parse(
                            "diving data without depth readings",
                            reference,
                        ))
                    }
                }
            } else {
                Vertical::Inclination(
                    clino
                        .map(|v| gradient_to_degrees(v, units.gradient))
                        .unwrap_or(0.0),
                )
            };
            // Anonymous stations force splay classification.
            let splay = flags.splay || to.is_none();
            Leg {
                splay,
                duplicate: flags.duplicate,
                surface: flags.surface,
                vertical,
                ..Leg::normal(from.clone(), to.unwrap_or(from), length, bearing, 0.0)
            }
        };
        series.add_leg(strip_self_to(leg, to_name));
        Ok(())
    }
}

/// `Leg::normal` demands a `to` station; splays built through it get the
/// placeholder removed again here.
fn strip_self_to(mut leg: Leg, to_name: Option<&str>) -> Leg {
    let anonymous = matches!(to_name, Some(t) if is_anonymous(t)) || to_name.is_none();
    if leg.splay && anonymous {
        leg.to = None;
    }
    leg
}

fn parse_data_field(token: &str, reference: &str) -> Result<DataField> {
    match token.to_ascii_lowercase().as_str() {
        "from" => Ok(DataField::From),
        "to" => Ok(DataField::To),
        "tape" | "length" => Ok(DataField::Tape),
        "compass" | "bearing" => Ok(DataField::Compass),
        "clino" | "gradient" => Ok(DataField::Clino),
        "fromdepth" => Ok(DataField::FromDepth),
        "todepth" => Ok(DataField::ToDepth),
        "depthchange" => Ok(DataField::DepthChange),
        "ignore" => Ok(DataField::Ignore),
        "ignoreall" => Ok(DataField::IgnoreAll),
        other => Err(SurvexError::parse(
            format!("unsupported data field '{}'", other),
            reference,
        )),
    }
}

fn parse_bearing_token(token: &str, reference: &str) -> Result<f64> {
    if token == "-" {
        // Plumbed legs have no bearing.
        return Ok(0.0);
    }
    parse_f64(token, "compass", reference)
}

fn parse_clino_token(token: &str, reference: &str) -> Result<f64> {
    match token.to_ascii_uppercase().as_str() {
        "UP" | "U" | "+V" => Ok(90.0),
        "DOWN" | "D" | "-V" => Ok(-90.0),
        "LEVEL" | "H" => Ok(0.0),
        _ => parse_f64(token, "clino", reference),
    }
}
