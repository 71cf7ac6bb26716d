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

//! Survey stations and the per-series station name interner.

use std::collections::HashMap;

/// How a fixed station position was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FixKind {
    Gps,
    Other,
}

/// A fixed 3D position for a station, in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fix {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub kind: FixKind,
}

/// A named or numbered point in the cave.
///
/// The integer `id` is the primary identity. Stations parsed from
/// text-only formats get synthetic negative ids from the owning series'
/// [`StationInterner`]; the original text survives in `name`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Station {
    pub id: i32,
    pub name: Option<String>,
    pub fix: Option<Fix>,
    pub entrance: bool,
    pub comment: String,
}

impl Station {
    /// A station identified purely by number.
    pub fn new(id: i32) -> Self {
        Self {
            id,
            name: None,
            fix: None,
            entrance: false,
            comment: String::new(),
        }
    }

    /// A station with an explicit display name.
    pub fn named(id: i32, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(id)
        }
    }

    /// The display name, falling back to the id rendered as text.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(n) => n.clone(),
            None => self.id.to_string(),
        }
    }
}

/// Bidirectional station name interner, one per series.
///
/// Non-negative numeric names map straight to their value. Every other
/// name gets the next unused negative id on first use and the cached id
/// afterwards, so within one series the same name always resolves to the
/// same id.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StationInterner {
    ids: HashMap<String, i32>,
    names: Vec<String>,
}

impl StationInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a station name to its id, assigning a new negative id for
    /// a previously unseen non-numeric name.
    pub fn intern(&mut self, name: &str) -> i32 {
        if let Ok(n) = name.parse::<i32>() {
            if n >= 0 {
                return n;
            }
        }
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = -(self.names.len() as i32) - 1;
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    /// The name behind a synthetic negative id, if one was assigned.
    pub fn name_of(&self, id: i32) -> Option<&str> {
        if id >= 0 {
            return None;
        }
        self.names.get((-id - 1) as usize).map(String::as_str)
    }

    /// Number of interned (non-numeric) names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
