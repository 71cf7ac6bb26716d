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

//! CLI command definitions and argument parsing.

use clap::Subcommand;
use speleo::Format;

use crate::commands;

/// Top-level CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Convert a survey file between dialects
    Convert {
        /// Input file path
        input: String,

        /// Input format (detected from the file extension when omitted)
        #[arg(long)]
        from: Option<Format>,

        /// Output format (detected from the output extension, default survex)
        #[arg(long)]
        to: Option<Format>,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Reconstruct passage dimensions from splay shots
        #[arg(long)]
        lrud: bool,

        /// Suppress parser notes and warnings
        #[arg(short, long)]
        quiet: bool,
    },

    /// Summarize the contents of a survey file
    Info {
        /// Input file path
        input: String,

        /// Input format (detected from the file extension when omitted)
        #[arg(long)]
        from: Option<Format>,
    },
}

impl Commands {
    /// Execute the command with the provided arguments.
    ///
    /// # Errors
    ///
    /// Returns `Err` if file I/O fails, the format cannot be determined,
    /// or parsing or writing fails.
    pub fn execute(self) -> Result<(), String> {
        match self {
            Commands::Convert {
                input,
                from,
                to,
                output,
                lrud,
                quiet,
            } => commands::convert(&input, from, to, output.as_deref(), lrud, quiet),
            Commands::Info { input, from } => commands::info(&input, from),
        }
    }
}
