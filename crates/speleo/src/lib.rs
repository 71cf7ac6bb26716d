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

//! # Speleo - cave survey data conversion
//!
//! Speleo reads cave survey data in several dialects (Compass, Survex,
//! PocketTopo, DXF), normalizes it into one hierarchical survey model,
//! optionally reconstructs passage dimensions from splay shots, and
//! writes Survex or Toporobot output.
//!
//! ## Quick start
//!
//! ```rust
//! use speleo::{convert, ConvertOptions, Format, NullLogger};
//!
//! let source: Vec<String> = "*begin cave\n1 2 5.00 10.00 0.00\n*end cave\n"
//!     .lines()
//!     .map(String::from)
//!     .collect();
//! let out = convert(
//!     &source,
//!     Format::Survex,
//!     Format::Survex,
//!     &ConvertOptions::default(),
//!     &mut NullLogger,
//! )
//! .unwrap();
//! assert!(out.contains("*begin cave"));
//! ```
//!
//! ## Format converters (feature-gated)
//!
//! - `compass`: Compass `.dat` input (feature = "compass")
//! - `survex`: Survex `.svx` input and output (feature = "survex")
//! - `pockettopo`: PocketTopo `.txt` input (feature = "pockettopo")
//! - `dxf`: DXF centreline input (feature = "dxf")
//! - `toporobot`: Toporobot text output (feature = "toporobot")
//!
//! All of them are on by default through `all-formats`.

// Re-export the core model
pub use speleo_core::{
    generate_lrud,
    resolve_equate,
    resolve_equates,
    BufferLogger,
    Calibration,
    DataField,
    DataOrder,
    Equate,
    Fix,
    FixKind,
    Leg,
    Logger,
    Lrud,
    ModelError,
    ModelErrorKind,
    ModelResult,
    NullLogger,
    Series,
    SeriesLink,
    Station,
    StationInterner,
    Survey,
    UnitSettings,
    Vertical,
};

pub use speleo_core::units;

#[cfg(feature = "compass")]
pub use speleo_compass::{parse_compass, CompassError};
#[cfg(feature = "dxf")]
pub use speleo_dxf::{parse_dxf, DxfError};
#[cfg(feature = "pockettopo")]
pub use speleo_pockettopo::{parse_pockettopo, PocketTopoError};
#[cfg(feature = "survex")]
pub use speleo_survex::{parse_survex, parse_survex_with_refs, to_survex, SurvexError};
#[cfg(feature = "toporobot")]
pub use speleo_toporobot::{linearize, to_toporobot};

mod convert;
pub use convert::{convert, parse, write, ConvertError, ConvertOptions, Format};
