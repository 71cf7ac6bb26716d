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

//! Info command - survey summary

use super::{input_format, read_lines};
use crate::logger::ConsoleLogger;
use colored::Colorize;
use speleo::Format;
use speleo_core::Series;
use std::collections::HashSet;

/// Summarize the contents of a survey file.
///
/// Parses the input and prints the survey name, series count, station
/// and leg counts, and the total surveyed length.
///
/// # Errors
///
/// Returns `Err` if the file cannot be read, the format cannot be
/// determined, or the input fails to parse.
pub fn info(input: &str, from: Option<Format>) -> Result<(), String> {
    let from = input_format(input, from)?;
    let lines = read_lines(input)?;

    let survey =
        speleo::parse(&lines, from, &mut ConsoleLogger).map_err(|e| e.to_string())?;

    let mut series_count = 0;
    let mut station_count = 0;
    let mut leg_count = 0;
    let mut length = 0.0;
    for series in &survey.series {
        tally(
            series,
            &mut series_count,
            &mut station_count,
            &mut leg_count,
        );
        length += series.total_length();
    }

    println!("{}", "Survey".bold().underline());
    println!();
    println!("{}    {}", "File:".cyan(), input);
    println!("{}  {}", "Format:".cyan(), from);
    if !survey.name.is_empty() {
        println!("{}    {}", "Name:".cyan(), survey.name.green());
    }
    println!();
    println!("{}   {}", "Series:".cyan(), series_count);
    println!("{} {}", "Stations:".cyan(), station_count);
    println!("{}     {}", "Legs:".cyan(), leg_count);
    println!("{}   {:.2} m", "Length:".cyan(), length);

    Ok(())
}

fn tally(series: &Series, series_count: &mut usize, stations: &mut usize, legs: &mut usize) {
    *series_count += 1;
    *legs += series.legs.len();

    let mut seen: HashSet<i32> = HashSet::new();
    for leg in &series.legs {
        seen.insert(leg.from.id);
        if !leg.splay {
            if let Some(to) = &leg.to {
                seen.insert(to.id);
            }
        }
    }
    *stations += seen.len();

    for child in &series.children {
        tally(child, series_count, stations, legs);
    }
}
