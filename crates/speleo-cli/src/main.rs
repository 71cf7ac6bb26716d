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

//! Speleo Command Line Interface

use clap::Parser;
use speleo_cli::cli::Commands;
use std::process::ExitCode;

/// Speleo - cave survey data conversion toolkit
///
/// Reads cave survey data in Compass, Survex, PocketTopo or DXF
/// dialects and writes Survex or Toporobot output.
///
/// # Examples
///
/// ```bash
/// # Convert a Compass export to Survex
/// speleo convert cave.dat -o cave.svx
///
/// # Convert Survex to Toporobot, reconstructing passage dimensions
/// speleo convert cave.svx --to toporobot --lrud -o cave.text
///
/// # Summarize a survey file
/// speleo info cave.svx
/// ```
#[derive(Parser)]
#[command(name = "speleo")]
#[command(author, version, about = "Speleo - cave survey data conversion toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
