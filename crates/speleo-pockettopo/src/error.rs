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

//! Error types for PocketTopo parsing.

use speleo_core::ModelError;
use thiserror::Error;

/// Errors raised while parsing a PocketTopo text export.
#[derive(Debug, Error)]
pub enum PocketTopoError {
    /// Malformed input at a specific line. Fatal to the parse call.
    #[error("PocketTopo parse error at line {line}: {message}")]
    Parse {
        /// One-based line number of the offending line.
        line: usize,
        /// Detailed error message.
        message: String,
    },

    /// Error raised by the survey model.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl PocketTopoError {
    pub fn parse(message: impl Into<String>, line: usize) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Result type for PocketTopo operations.
pub type Result<T> = std::result::Result<T, PocketTopoError>;
