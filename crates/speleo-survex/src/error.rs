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

//! Error types for Survex parsing and writing.

use speleo_core::ModelError;
use thiserror::Error;

/// Errors raised while parsing a Survex source file.
///
/// The `reference` is either `"line N"` for single-file input or an
/// `"origin-file:line"` string supplied by the caller when `*include`
/// directives were flattened before parsing.
#[derive(Debug, Error)]
pub enum SurvexError {
    /// Malformed input at a specific line. Fatal to the parse call.
    #[error("Survex parse error at {reference}: {message}")]
    Parse {
        /// Origin of the offending line.
        reference: String,
        /// Detailed error message.
        message: String,
    },

    /// Error raised by the survey model.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl SurvexError {
    pub fn parse(message: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::Parse {
            reference: reference.into(),
            message: message.into(),
        }
    }
}

/// Result type for Survex operations.
pub type Result<T> = std::result::Result<T, SurvexError>;
