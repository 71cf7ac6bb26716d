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

//! One-call conversion: parse, optionally reconstruct passage
//! dimensions, write.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use speleo_core::{generate_lrud, Logger, Survey};
use thiserror::Error;

/// A survey data dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Compass cave survey export (`.dat`).
    Compass,
    /// Survex source (`.svx`).
    Survex,
    /// PocketTopo text export (`.txt`).
    PocketTopo,
    /// DXF centreline drawing (`.dxf`).
    Dxf,
    /// Toporobot text (`.text`).
    Toporobot,
}

impl Format {
    /// Detect a format from a file name's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "dat" => Some(Self::Compass),
            "svx" => Some(Self::Survex),
            "txt" => Some(Self::PocketTopo),
            "dxf" => Some(Self::Dxf),
            "text" => Some(Self::Toporobot),
            _ => None,
        }
    }

    /// True for formats this crate can read.
    pub fn readable(self) -> bool {
        !matches!(self, Self::Toporobot)
    }

    /// True for formats this crate can write.
    pub fn writable(self) -> bool {
        matches!(self, Self::Survex | Self::Toporobot)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Compass => "compass",
            Self::Survex => "survex",
            Self::PocketTopo => "pockettopo",
            Self::Dxf => "dxf",
            Self::Toporobot => "toporobot",
        };
        f.write_str(name)
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compass" | "dat" => Ok(Self::Compass),
            "survex" | "svx" => Ok(Self::Survex),
            "pockettopo" | "topo" | "txt" => Ok(Self::PocketTopo),
            "dxf" => Ok(Self::Dxf),
            "toporobot" | "text" => Ok(Self::Toporobot),
            other => Err(format!("unknown format '{}'", other)),
        }
    }
}

/// Options for [`convert`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Reconstruct passage dimensions from splay shots before writing.
    pub generate_lrud: bool,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable passage dimension reconstruction.
    pub fn with_generate_lrud(mut self, enabled: bool) -> Self {
        self.generate_lrud = enabled;
        self
    }
}

/// Errors raised by the one-call conversion front end.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("reading {0} data is not supported")]
    UnsupportedInput(Format),

    #[error("writing {0} data is not supported")]
    UnsupportedOutput(Format),

    #[error("support for {0} is not compiled in")]
    FormatDisabled(Format),

    #[cfg(feature = "compass")]
    #[error(transparent)]
    Compass(#[from] speleo_compass::CompassError),

    #[cfg(feature = "survex")]
    #[error(transparent)]
    Survex(#[from] speleo_survex::SurvexError),

    #[cfg(feature = "pockettopo")]
    #[error(transparent)]
    PocketTopo(#[from] speleo_pockettopo::PocketTopoError),

    #[cfg(feature = "dxf")]
    #[error(transparent)]
    Dxf(#[from] speleo_dxf::DxfError),
}

/// Parse decoded input lines in the given dialect.
pub fn parse(
    lines: &[String],
    from: Format,
    logger: &mut dyn Logger,
) -> Result<Survey, ConvertError> {
    if !from.readable() {
        return Err(ConvertError::UnsupportedInput(from));
    }
    match from {
        #[cfg(feature = "compass")]
        Format::Compass => Ok(speleo_compass::parse_compass(lines, logger)?),
        #[cfg(feature = "survex")]
        Format::Survex => Ok(speleo_survex::parse_survex(lines, logger)?),
        #[cfg(feature = "pockettopo")]
        Format::PocketTopo => Ok(speleo_pockettopo::parse_pockettopo(lines, logger)?),
        #[cfg(feature = "dxf")]
        Format::Dxf => Ok(speleo_dxf::parse_dxf(lines, logger)?),
        #[allow(unreachable_patterns)]
        other => Err(ConvertError::FormatDisabled(other)),
    }
}

/// Write a survey in the given dialect.
pub fn write(
    survey: &Survey,
    to: Format,
    logger: &mut dyn Logger,
) -> Result<String, ConvertError> {
    if !to.writable() {
        return Err(ConvertError::UnsupportedOutput(to));
    }
    match to {
        #[cfg(feature = "survex")]
        Format::Survex => Ok(speleo_survex::to_survex(survey, logger)),
        #[cfg(feature = "toporobot")]
        Format::Toporobot => Ok(speleo_toporobot::to_toporobot(survey, logger)),
        #[allow(unreachable_patterns)]
        other => Err(ConvertError::FormatDisabled(other)),
    }
}

/// Parse, optionally reconstruct passage dimensions, and write.
pub fn convert(
    lines: &[String],
    from: Format,
    to: Format,
    options: &ConvertOptions,
    logger: &mut dyn Logger,
) -> Result<String, ConvertError> {
    let mut survey = parse(lines, from, logger)?;
    if options.generate_lrud {
        for series in &mut survey.series {
            generate_lrud(series);
        }
    }
    write(&survey, to, logger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use speleo_core::BufferLogger;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            Format::from_path(&PathBuf::from("cave.DAT")),
            Some(Format::Compass)
        );
        assert_eq!(
            Format::from_path(&PathBuf::from("survey.svx")),
            Some(Format::Survex)
        );
        assert_eq!(Format::from_path(&PathBuf::from("plan.pdf")), None);
        assert_eq!(Format::from_path(&PathBuf::from("noext")), None);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("compass".parse::<Format>(), Ok(Format::Compass));
        assert_eq!("SVX".parse::<Format>(), Ok(Format::Survex));
        assert!("hpgl".parse::<Format>().is_err());
    }

    #[test]
    fn test_unsupported_directions() {
        let lines: Vec<String> = Vec::new();
        let err = parse(&lines, Format::Toporobot, &mut BufferLogger::new()).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedInput(Format::Toporobot)));

        let survey = Survey::new("t");
        let err = write(&survey, Format::Compass, &mut BufferLogger::new()).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedOutput(Format::Compass)));
    }

    #[cfg(all(feature = "survex", feature = "toporobot"))]
    #[test]
    fn test_convert_survex_to_toporobot() {
        let lines: Vec<String> = "*begin cave\n1 2 5.00 10.00 0.00\n*end cave\n"
            .lines()
            .map(String::from)
            .collect();
        let out = convert(
            &lines,
            Format::Survex,
            Format::Toporobot,
            &ConvertOptions::default(),
            &mut BufferLogger::new(),
        )
        .unwrap();
        assert!(out.contains("     1    -2   1   1 cave"));
        assert!(out.contains("    5.00   10.00    0.00"));
    }

    #[cfg(all(feature = "compass", feature = "survex"))]
    #[test]
    fn test_convert_compass_to_survex_with_lrud() {
        let lines = speleo_test::lines(speleo_test::COMPASS_SAMPLE);
        let out = convert(
            &lines,
            Format::Compass,
            Format::Survex,
            &ConvertOptions {
                generate_lrud: true,
            },
            &mut BufferLogger::new(),
        )
        .unwrap();
        assert!(out.contains("*begin A"));
        assert!(out.contains("*begin B"));
    }
}
