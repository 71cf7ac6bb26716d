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

//! Parser recovering a centreline survey from a DXF drawing.
//!
//! DXF files alternate group-code and value lines. The scanner skips
//! everything before the ENTITIES section, then walks the entities:
//! POLYLINE/VERTEX/SEQEND sequences and LINE entities become point
//! chains, and TEXT entities on the "Labels" layer are collected as
//! station labels. Coordinate group codes are located with a bounded
//! lookahead so vendor-specific extra codes are skipped without being
//! misread.
//!
//! Chains become series of legs; measurements are recomputed from the
//! coordinate deltas. When every chain point carries a label of the form
//! `series.station`, the legs are regrouped into one child series per
//! prefix with links where a leg crosses between prefixes; otherwise
//! chains get sequential series and station numbers.

use crate::error::{DxfError, Result};
use speleo_core::units::normalize_bearing;
use speleo_core::{resolve_equates, Equate, Leg, Logger, Series, Survey};

/// How many code/value lines may separate an entity keyword from one of
/// its expected group codes before we give up on it.
const LOOKAHEAD: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Clone)]
struct Label {
    point: Point,
    text: String,
}

/// Parse a DXF drawing into a survey named `dxf`.
pub fn parse_dxf(lines: &[String], logger: &mut dyn Logger) -> Result<Survey> {
    let mut pos = 0;
    while pos < lines.len() && lines[pos].trim() != "ENTITIES" {
        pos += 1;
    }
    if pos == lines.len() {
        return Err(DxfError::parse("no ENTITIES section", lines.len()));
    }
    pos += 1;

    let mut chains: Vec<Vec<Point>> = Vec::new();
    let mut line_chains: Vec<Vec<Point>> = Vec::new();
    let mut labels: Vec<Label> = Vec::new();

    while pos < lines.len() {
        match lines[pos].trim() {
            "POLYLINE" => {
                let (chain, next) = read_polyline(lines, pos + 1)?;
                if chain.len() >= 2 {
                    chains.push(chain);
                } else {
                    logger.log(&format!(
                        "line {}: polyline with fewer than two vertices skipped",
                        pos + 1
                    ));
                }
                pos = next;
            }
            "LINE" => {
                let start = read_point(lines, pos + 1, ["10", "20", "30"])?;
                let end = read_point(lines, pos + 1, ["11", "21", "31"])?;
                match (start, end) {
                    (Some(p1), Some(p2)) => append_line(&mut line_chains, p1, p2),
                    _ => logger.log(&format!(
                        "line {}: LINE entity without both endpoints skipped",
                        pos + 1
                    )),
                }
                pos += 1;
            }
            "TEXT" => {
                if let Some(label) = read_text(lines, pos + 1)? {
                    labels.push(label);
                }
                pos += 1;
            }
            "ENDSEC" | "EOF" => break,
            _ => pos += 1,
        }
    }
    chains.append(&mut line_chains);

    build_survey(chains, &labels, logger)
}

/// Locate group code `code` within the lookahead window and parse the
/// value on the following line.
fn find_code(lines: &[String], start: usize, code: &str) -> Result<Option<(f64, usize)>> {
    for offset in 0..LOOKAHEAD {
        let idx = start + offset;
        if idx + 1 >= lines.len() {
            break;
        }
        if lines[idx].trim() == code {
            let value = lines[idx + 1].trim().parse::<f64>().map_err(|_| {
                DxfError::parse(
                    format!("bad value '{}' for group code {}", lines[idx + 1].trim(), code),
                    idx + 2,
                )
            })?;
            return Ok(Some((value, idx + 2)));
        }
    }
    Ok(None)
}

fn read_point(lines: &[String], start: usize, codes: [&str; 3]) -> Result<Option<Point>> {
    let (x, after_x) = match find_code(lines, start, codes[0])? {
        Some(v) => v,
        None => return Ok(None),
    };
    let (y, after_y) = match find_code(lines, after_x, codes[1])? {
        Some(v) => v,
        None => return Ok(None),
    };
    let z = match find_code(lines, after_y, codes[2])? {
        Some((v, _)) => v,
        None => 0.0,
    };
    Ok(Some(Point { x, y, z }))
}

fn read_polyline(lines: &[String], mut pos: usize) -> Result<(Vec<Point>, usize)> {
    let mut chain = Vec::new();
    while pos < lines.len() {
        match lines[pos].trim() {
            "VERTEX" => {
                match read_point(lines, pos + 1, ["10", "20", "30"])? {
                    Some(p) => chain.push(p),
                    None => {
                        return Err(DxfError::parse("vertex without coordinates", pos + 1));
                    }
                }
                pos += 1;
            }
            "SEQEND" => return Ok((chain, pos + 1)),
            _ => pos += 1,
        }
    }
    Ok((chain, pos))
}

fn read_text(lines: &[String], start: usize) -> Result<Option<Label>> {
    let mut layer = None;
    let mut text = None;
    for offset in 0..LOOKAHEAD {
        let idx = start + offset;
        if idx + 1 >= lines.len() {
            break;
        }
        match lines[idx].trim() {
            "8" if layer.is_none() => layer = Some(lines[idx + 1].trim().to_string()),
            "1" if text.is_none() => text = Some(lines[idx + 1].trim().to_string()),
            _ => {}
        }
    }
    if layer.as_deref() != Some("Labels") {
        return Ok(None);
    }
    let point = match read_point(lines, start, ["10", "20", "30"])? {
        Some(p) => p,
        None => return Ok(None),
    };
    Ok(text.map(|text| Label { point, text }))
}

/// Join LINE segments end-to-end by exact coordinate match; the first
/// chain whose tail matches the new segment's start wins.
fn append_line(line_chains: &mut Vec<Vec<Point>>, p1: Point, p2: Point) {
    if let Some(chain) = line_chains.iter_mut().find(|c| c.last() == Some(&p1)) {
        chain.push(p2);
    } else {
        line_chains.push(vec![p1, p2]);
    }
}

/// Length, bearing and inclination recovered from a coordinate delta.
fn measure(p1: Point, p2: Point) -> (f64, f64, f64) {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let dz = p2.z - p1.z;
    let horizontal = dx.hypot(dy);
    let length = horizontal.hypot(dz);
    let bearing = normalize_bearing(dx.atan2(dy).to_degrees());
    let inclination = dz.atan2(horizontal).to_degrees();
    (length, bearing, inclination)
}

fn label_for<'a>(labels: &'a [Label], point: &Point) -> Option<&'a str> {
    labels
        .iter()
        .find(|l| l.point == *point)
        .map(|l| l.text.as_str())
}

fn build_survey(
    chains: Vec<Vec<Point>>,
    labels: &[Label],
    logger: &mut dyn Logger,
) -> Result<Survey> {
    let all_labelled = !chains.is_empty()
        && chains
            .iter()
            .flatten()
            .all(|p| label_for(labels, p).is_some());

    let mut root = Series::new("dxf");
    let mut equates: Vec<Equate> = Vec::new();

    if all_labelled {
        logger.log("all stations labelled, regrouping legs by name prefix");
        for chain in &chains {
            for pair in chain.windows(2) {
                // Fully labelled chains cannot miss here.
                let n1 = match label_for(labels, &pair[0]) {
                    Some(n) => n,
                    None => continue,
                };
                let n2 = match label_for(labels, &pair[1]) {
                    Some(n) => n,
                    None => continue,
                };
                add_named_leg(&mut root, &mut equates, n1, n2, measure(pair[0], pair[1]));
            }
        }
    } else {
        for (index, chain) in chains.iter().enumerate() {
            let mut series = Series::child_of((index + 1).to_string(), &root);
            for (offset, pair) in chain.windows(2).enumerate() {
                let from = series.station(&offset.to_string());
                let to = series.station(&(offset + 1).to_string());
                let (length, bearing, inclination) = measure(pair[0], pair[1]);
                series.add_leg(Leg::normal(from, to, length, bearing, inclination));
            }
            root.add_child(series);
        }
    }

    let mut survey = Survey::new("dxf");
    survey.add_series(root);
    resolve_equates(&mut survey, &equates)?;
    Ok(survey)
}

fn split_label(label: &str) -> (Option<&str>, &str) {
    match label.rfind('.') {
        Some(idx) if idx > 0 => (Some(&label[..idx]), &label[idx + 1..]),
        _ => (None, label),
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

fn add_named_leg(
    root: &mut Series,
    equates: &mut Vec<Equate>,
    n1: &str,
    n2: &str,
    (length, bearing, inclination): (f64, f64, f64),
) {
    let (p1, s1) = split_label(n1);
    let (p2, s2) = split_label(n2);
    let path = |prefix: Option<&str>| match prefix {
        Some(p) => format!("dxf.{}", p),
        None => "dxf".to_string(),
    };

    let series = series_for(root, p1);
    let from = series.station(s1);
    let to = if p1 == p2 {
        series.station(s2)
    } else {
        equates.push(Equate::from_parts(path(p1), n2, path(p2), s2));
        series.station(n2)
    };
    series.add_leg(Leg::normal(from, to, length, bearing, inclination));
    if p1 != p2 {
        series_for(root, p2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speleo_core::BufferLogger;

    fn to_lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    fn pairs(entries: &[(&str, &str)]) -> String {
        entries
            .iter()
            .flat_map(|(code, value)| [code.to_string(), value.to_string()])
            .collect::<Vec<_>>()
            .join("\n")
            + "\n"
    }

    #[test]
    fn test_measure_axes() {
        let origin = Point { x: 0.0, y: 0.0, z: 0.0 };
        let (len, bearing, inc) = measure(origin, Point { x: 0.0, y: 10.0, z: 0.0 });
        assert!((len - 10.0).abs() < 1e-9);
        assert_eq!(bearing, 0.0);
        assert_eq!(inc, 0.0);

        let (_, bearing, _) = measure(origin, Point { x: 5.0, y: 0.0, z: 0.0 });
        assert!((bearing - 90.0).abs() < 1e-9);
        let (_, bearing, _) = measure(origin, Point { x: -5.0, y: 0.0, z: 0.0 });
        assert!((bearing - 270.0).abs() < 1e-9);

        let (len, _, inc) = measure(origin, Point { x: 0.0, y: 3.0, z: 4.0 });
        assert!((len - 5.0).abs() < 1e-9);
        assert!((inc - (4.0f64).atan2(3.0).to_degrees()).abs() < 1e-9);
    }

    #[test]
    fn test_line_segments_join_end_to_end() {
        let mut chains = Vec::new();
        let a = Point { x: 0.0, y: 0.0, z: 0.0 };
        let b = Point { x: 1.0, y: 0.0, z: 0.0 };
        let c = Point { x: 2.0, y: 0.0, z: 0.0 };
        append_line(&mut chains, a, b);
        append_line(&mut chains, b, c);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].len(), 3);

        let d = Point { x: 9.0, y: 9.0, z: 0.0 };
        append_line(&mut chains, d, a);
        assert_eq!(chains.len(), 2);
    }

    #[test]
    fn test_lookahead_skips_vendor_codes() {
        let text = format!(
            "ENTITIES\nLINE\n{}",
            pairs(&[
                ("8", "Centreline"),
                ("62", "3"),
                ("10", "0.0"),
                ("20", "0.0"),
                ("30", "0.0"),
                ("11", "0.0"),
                ("21", "4.0"),
                ("31", "0.0"),
            ])
        ) + "ENDSEC\n";
        let survey = parse_dxf(&to_lines(&text), &mut BufferLogger::new()).unwrap();
        assert_eq!(survey.leg_count(), 1);
        assert!((survey.total_length() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_bad_coordinate_value_is_fatal() {
        let text = "ENTITIES\nLINE\n10\nnotanumber\n";
        let err = parse_dxf(&to_lines(text), &mut BufferLogger::new()).unwrap_err();
        match err {
            DxfError::Parse { line, message } => {
                assert_eq!(line, 4);
                assert!(message.contains("notanumber"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_missing_entities_section_is_fatal() {
        let err = parse_dxf(&to_lines("0\nSECTION\n2\nHEADER\n"), &mut BufferLogger::new())
            .unwrap_err();
        assert!(matches!(err, DxfError::Parse { .. }));
    }

    #[test]
    fn test_labelled_points_regroup_by_prefix() {
        let mut text = String::from("ENTITIES\nPOLYLINE\n");
        for (x, y) in [(0.0, 0.0), (0.0, 10.0), (5.0, 10.0)] {
            text.push_str("0\nVERTEX\n");
            text.push_str(&pairs(&[
                ("10", &x.to_string()),
                ("20", &y.to_string()),
                ("30", "0.0"),
            ]));
        }
        text.push_str("0\nSEQEND\n");
        for ((x, y), name) in [((0.0, 0.0), "1.0"), ((0.0, 10.0), "1.1"), ((5.0, 10.0), "2.0")] {
            text.push_str("0\nTEXT\n");
            text.push_str(&pairs(&[
                ("8", "Labels"),
                ("10", &x.to_string()),
                ("20", &y.to_string()),
                ("30", "0.0"),
                ("1", name),
            ]));
        }
        text.push_str("0\nENDSEC\n");

        let survey = parse_dxf(&to_lines(&text), &mut BufferLogger::new()).unwrap();
        let one = survey.find_series("dxf.1").unwrap();
        assert_eq!(one.legs.len(), 2);
        assert_eq!(one.legs[1].to.as_ref().unwrap().display_name(), "2.0");
        assert!(survey.find_series("dxf.2").is_some());
        let root = survey.find_series("dxf").unwrap();
        assert_eq!(root.links.len(), 1);
        assert_eq!(root.links[0].path1, "1");
        assert_eq!(root.links[0].path2, "2");
    }

}
