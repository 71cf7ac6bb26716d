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

//! Speleo CLI library for command-line parsing and execution.
//!
//! All file I/O and console output lives here; the library crates work on
//! decoded lines and return strings. Commands return `Result<(), String>`
//! for uniform error reporting in `main`.
//!
//! # Commands
//!
//! - **convert**: Convert a survey file between dialects
//! - **info**: Summarize the contents of a survey file

pub mod cli;
pub mod commands;
pub mod logger;
