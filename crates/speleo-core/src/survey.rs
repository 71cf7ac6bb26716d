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

//! The top-level survey: an ordered list of series.

use crate::series::Series;

/// A whole parsed survey. Built append-only by a parser, optionally
/// mutated in place by the LRUD reconstructor, then read-only for the
/// writers. No state is shared between parse calls.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Survey {
    pub name: String,
    pub series: Vec<Series>,
}

impl Survey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// Find a series by dot-separated path from the top level.
    pub fn find_series(&self, path: &str) -> Option<&Series> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.series.iter().find(|s| s.name() == first)?;
        for segment in segments {
            current = current.find_child(segment)?;
        }
        Some(current)
    }

    /// Mutable variant of [`find_series`](Self::find_series).
    pub fn find_series_mut(&mut self, path: &str) -> Option<&mut Series> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.series.iter_mut().find(|s| s.name() == first)?;
        for segment in segments {
            current = current.find_child_mut(segment)?;
        }
        Some(current)
    }

    /// Total number of legs across all series.
    pub fn leg_count(&self) -> usize {
        self.series.iter().map(Series::leg_count).sum()
    }

    /// Total measured length in metres across all series.
    pub fn total_length(&self) -> f64 {
        self.series.iter().map(Series::total_length).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_series_by_path() {
        let mut cave = Series::new("cave");
        let mut upper = Series::child_of("upper", &cave);
        upper.add_child(Series::child_of("dig", &upper));
        cave.add_child(upper);
        let mut survey = Survey::new("test");
        survey.add_series(cave);

        assert!(survey.find_series("cave").is_some());
        assert!(survey.find_series("cave.upper.dig").is_some());
        assert!(survey.find_series("cave.lower").is_none());
        assert!(survey.find_series("mine").is_none());
    }

    #[test]
    fn test_find_series_mut() {
        let mut survey = Survey::new("test");
        survey.add_series(Series::new("cave"));
        survey.find_series_mut("cave").unwrap().date = Some("1979.10.07".to_string());
        assert_eq!(
            survey.find_series("cave").unwrap().date.as_deref(),
            Some("1979.10.07")
        );
    }
}
