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

//! Logging capability consumed by the parsers and writers.
//!
//! The core never prints; recoverable conditions (unknown commands,
//! unmergeable passage chains, defaulted units) are reported through a
//! caller-supplied [`Logger`] and processing continues.

/// Message sink injected into parsers and writers.
pub trait Logger {
    /// Report an informational message.
    fn log(&mut self, message: &str);

    /// Report a non-fatal error or warning.
    fn log_error(&mut self, message: &str);
}

/// A logger that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&mut self, _message: &str) {}
    fn log_error(&mut self, _message: &str) {}
}

/// A logger that records messages in memory, mainly for tests.
#[derive(Debug, Default, Clone)]
pub struct BufferLogger {
    /// Informational messages, in arrival order.
    pub messages: Vec<String>,
    /// Error messages, in arrival order.
    pub errors: Vec<String>,
}

impl BufferLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when neither channel received anything.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.errors.is_empty()
    }
}

impl Logger for BufferLogger {
    fn log(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    fn log_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_logger_records_both_channels() {
        let mut logger = BufferLogger::new();
        logger.log("parsed 3 legs");
        logger.log_error("unknown command *wibble");
        assert_eq!(logger.messages, vec!["parsed 3 legs"]);
        assert_eq!(logger.errors, vec!["unknown command *wibble"]);
        assert!(!logger.is_empty());
    }

    #[test]
    fn test_null_logger_is_silent() {
        let mut logger = NullLogger;
        logger.log("ignored");
        logger.log_error("ignored");
    }
}
