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

//! Core data model and algorithms for cave survey data.
//!
//! The model is a tree: a [`Survey`] owns top-level [`Series`], each of
//! which owns legs, nested series, cross-series links, calibration and
//! unit defaults. Format parsers build a `Survey` from decoded text
//! lines; the [`lrud`] reconstructor optionally derives passage
//! dimensions from splay shots; writers then render the survey into an
//! output dialect.
//!
//! All lengths are stored in metres and all angles in degrees; the
//! [`units`] module converts at the format boundary.

mod equate;
mod error;
mod leg;
mod log;
pub mod lrud;
mod series;
mod station;
mod survey;
pub mod units;

pub use equate::{resolve_equate, resolve_equates, Equate};
pub use error::{ModelError, ModelErrorKind, ModelResult};
pub use leg::{Leg, Lrud, Vertical};
pub use log::{BufferLogger, Logger, NullLogger};
pub use lrud::generate_lrud;
pub use series::{Calibration, DataField, DataOrder, Series, SeriesLink, UnitSettings};
pub use station::{Fix, FixKind, Station, StationInterner};
pub use survey::Survey;
