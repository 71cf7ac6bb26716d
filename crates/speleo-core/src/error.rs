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

//! Error types shared by the survey model and the format converters.

use std::fmt;
use thiserror::Error;

/// The kind of error that occurred while building or using a survey model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelErrorKind {
    /// Malformed input syntax (bad number, wrong token count, ...).
    Syntax,
    /// Input violates the structural rules of its dialect (bad column
    /// header, mismatched block names, unsupported field order, ...).
    Format,
    /// A recognized command was used with arguments the model cannot accept.
    Command,
    /// A data-consistency invariant was violated (equate with no common
    /// ancestor series, unresolvable station reference, ...). These
    /// indicate a logic or data problem rather than a syntax problem.
    Structure,
    /// Error while converting between representations.
    Conversion,
}

impl fmt::Display for ModelErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "SyntaxError"),
            Self::Format => write!(f, "FormatError"),
            Self::Command => write!(f, "CommandError"),
            Self::Structure => write!(f, "StructureError"),
            Self::Conversion => write!(f, "ConversionError"),
        }
    }
}

/// An error raised while parsing survey data or mutating the survey model.
///
/// Data errors always carry the 1-based line number of the offending input
/// line, or a caller-supplied line reference (e.g. `"entrance.svx:12"`)
/// when the input was assembled from several files.
#[derive(Debug, Clone, Error)]
#[error("{kind} at {loc}: {message}", loc = self.location())]
pub struct ModelError {
    /// The kind of error.
    pub kind: ModelErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Line number (1-based; 0 when the error is not tied to a line).
    pub line: usize,
    /// Origin reference overriding the plain line number.
    pub reference: Option<String>,
}

impl ModelError {
    /// Create a new error.
    pub fn new(kind: ModelErrorKind, message: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            reference: None,
        }
    }

    /// Replace the plain line number with an origin reference string.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    fn location(&self) -> String {
        match &self.reference {
            Some(r) => r.clone(),
            None => format!("line {}", self.line),
        }
    }

    pub fn syntax(message: impl Into<String>, line: usize) -> Self {
        Self::new(ModelErrorKind::Syntax, message, line)
    }

    pub fn format(message: impl Into<String>, line: usize) -> Self {
        Self::new(ModelErrorKind::Format, message, line)
    }

    pub fn command(message: impl Into<String>, line: usize) -> Self {
        Self::new(ModelErrorKind::Command, message, line)
    }

    pub fn structure(message: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::Structure, message, 0)
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::Conversion, message, 0)
    }
}

/// Result type for survey model operations.
pub type ModelResult<T> = Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_with_line() {
        let err = ModelError::syntax("bad bearing '36X'", 42);
        let msg = format!("{}", err);
        assert!(msg.contains("SyntaxError"));
        assert!(msg.contains("line 42"));
        assert!(msg.contains("bad bearing"));
    }

    #[test]
    fn test_error_display_with_reference() {
        let err = ModelError::format("mismatched block name", 7).with_reference("cave.svx:7");
        let msg = format!("{}", err);
        assert!(msg.contains("cave.svx:7"));
        assert!(!msg.contains("line 7"));
    }

    #[test]
    fn test_structure_error_has_no_line() {
        let err = ModelError::structure("no common series ancestor");
        assert_eq!(err.kind, ModelErrorKind::Structure);
        assert_eq!(err.line, 0);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(format!("{}", ModelErrorKind::Syntax), "SyntaxError");
        assert_eq!(format!("{}", ModelErrorKind::Structure), "StructureError");
    }

    #[test]
    fn test_error_is_std_error() {
        fn accepts_error<E: std::error::Error>(_: E) {}
        accepts_error(ModelError::syntax("test", 1));
    }
}
