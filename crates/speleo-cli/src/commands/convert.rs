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

//! Convert command - survey dialect conversion

use super::{input_format, read_lines, write_output};
use crate::logger::ConsoleLogger;
use speleo_core::{Logger, NullLogger};
use std::path::Path;

use speleo::{ConvertOptions, Format};

/// Convert a survey file between dialects.
///
/// The input format comes from `--from` or the input extension; the
/// output format comes from `--to`, the output extension, or defaults
/// to Survex. Parser notes and warnings go to stderr unless `quiet`.
///
/// # Errors
///
/// Returns `Err` if the file cannot be read or written, a format cannot
/// be determined, or the input fails to parse.
pub fn convert(
    input: &str,
    from: Option<Format>,
    to: Option<Format>,
    output: Option<&str>,
    lrud: bool,
    quiet: bool,
) -> Result<(), String> {
    let from = input_format(input, from)?;
    let to = match to {
        Some(format) => format,
        None => output
            .and_then(|p| Format::from_path(Path::new(p)))
            .unwrap_or(Format::Survex),
    };

    let lines = read_lines(input)?;
    let options = ConvertOptions {
        generate_lrud: lrud,
    };

    let mut console = ConsoleLogger;
    let mut null = NullLogger;
    let logger: &mut dyn Logger = if quiet { &mut null } else { &mut console };

    let text = speleo::convert(&lines, from, to, &options, logger).map_err(|e| e.to_string())?;

    write_output(&text, output)
}
