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

//! CLI command implementations

mod convert;
mod info;

pub use convert::convert;
pub use info::info;

use speleo::Format;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Read a file from disk and split it into lines.
pub fn read_lines(path: &str) -> Result<Vec<String>, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    Ok(content.lines().map(String::from).collect())
}

/// Write content to a file or stdout.
pub fn write_output(content: &str, path: Option<&str>) -> Result<(), String> {
    match path {
        Some(p) => fs::write(p, content).map_err(|e| format!("Failed to write '{}': {}", p, e)),
        None => io::stdout()
            .write_all(content.as_bytes())
            .map_err(|e| format!("Failed to write to stdout: {}", e)),
    }
}

/// Resolve the input format from an explicit flag or the file extension.
pub fn input_format(path: &str, from: Option<Format>) -> Result<Format, String> {
    if let Some(format) = from {
        return Ok(format);
    }
    Format::from_path(Path::new(path)).ok_or_else(|| {
        format!(
            "Cannot determine the format of '{}'; pass --from explicitly",
            path
        )
    })
}
