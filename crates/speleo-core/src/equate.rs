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

//! Station equivalences and the cross-series equate resolver.
//!
//! Parsers collect raw [`Equate`] records; once parsing is complete the
//! resolver locates each pair's common ancestor series and attaches a
//! [`SeriesLink`] there. Resolution must finish before any writer reads
//! the survey.

use crate::error::{ModelError, ModelResult};
use crate::series::{Series, SeriesLink};
use crate::station::Station;
use crate::survey::Survey;

/// A raw station equivalence: two (series path, station name) pairs.
///
/// The canonical form always re-splits each full dotted reference at its
/// last `.` after any concatenation, so the station suffix is never
/// passed in pre-split.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Equate {
    pub series1: String,
    pub station1: String,
    pub series2: String,
    pub station2: String,
}

impl Equate {
    /// Build an equate from two full dotted station references.
    ///
    /// A reference without a `.` separator cannot name a series and is a
    /// structural error.
    pub fn new(ref1: &str, ref2: &str) -> ModelResult<Self> {
        let (series1, station1) = split_reference(ref1)?;
        let (series2, station2) = split_reference(ref2)?;
        Ok(Self {
            series1,
            station1,
            series2,
            station2,
        })
    }

    /// Build an equate from already-separated path and station parts.
    /// Used where a station name itself contains `.` characters and the
    /// last-dot re-split would land in the wrong place.
    pub fn from_parts(
        series1: impl Into<String>,
        station1: impl Into<String>,
        series2: impl Into<String>,
        station2: impl Into<String>,
    ) -> Self {
        Self {
            series1: series1.into(),
            station1: station1.into(),
            series2: series2.into(),
            station2: station2.into(),
        }
    }
}

fn split_reference(reference: &str) -> ModelResult<(String, String)> {
    match reference.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < reference.len() => Ok((
            reference[..idx].to_string(),
            reference[idx + 1..].to_string(),
        )),
        _ => Err(ModelError::structure(format!(
            "station reference '{}' has no series separator",
            reference
        ))),
    }
}

/// Resolve every equate in order. The first failure aborts.
pub fn resolve_equates(survey: &mut Survey, equates: &[Equate]) -> ModelResult<()> {
    for equate in equates {
        resolve_equate(survey, equate)?;
    }
    Ok(())
}

/// Resolve one equate: find the two sides' common ancestor series, intern
/// the stations along the remaining paths, and attach a [`SeriesLink`] on
/// the ancestor. Inserting the same station pair twice, in either order,
/// is a no-op.
pub fn resolve_equate(survey: &mut Survey, equate: &Equate) -> ModelResult<()> {
    let path1: Vec<&str> = equate.series1.split('.').collect();
    let path2: Vec<&str> = equate.series2.split('.').collect();
    let common = path1
        .iter()
        .zip(path2.iter())
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 {
        return Err(ModelError::structure(format!(
            "equate '{}.{}' = '{}.{}' shares no common series ancestor",
            equate.series1, equate.station1, equate.series2, equate.station2
        )));
    }

    let ancestor_path = path1[..common].join(".");
    let ancestor = survey.find_series_mut(&ancestor_path).ok_or_else(|| {
        ModelError::structure(format!("no series found at path '{}'", ancestor_path))
    })?;

    let rest1 = &path1[common..];
    let rest2 = &path2[common..];
    let station1 = intern_along(ancestor, rest1, &equate.station1)?;
    let station2 = intern_along(ancestor, rest2, &equate.station2)?;
    let rel1 = rest1.join(".");
    let rel2 = rest2.join(".");

    let duplicate = ancestor.links.iter().any(|l| {
        (l.path1 == rel1 && l.station1.id == station1.id && l.path2 == rel2 && l.station2.id == station2.id)
            || (l.path1 == rel2
                && l.station1.id == station2.id
                && l.path2 == rel1
                && l.station2.id == station1.id)
    });
    if duplicate {
        return Ok(());
    }

    ancestor.links.push(SeriesLink {
        path1: rel1,
        station1,
        path2: rel2,
        station2,
    });
    Ok(())
}

/// Descend a relative path below `series` and intern the station by name
/// in the series the path ends at, creating the station on the fly.
fn intern_along(series: &mut Series, path: &[&str], station: &str) -> ModelResult<Station> {
    match path.split_first() {
        None => Ok(series.station(station)),
        Some((head, tail)) => {
            let name = series.name().to_string();
            let child = series.find_child_mut(head).ok_or_else(|| {
                ModelError::structure(format!(
                    "series '{}' has no nested series '{}'",
                    name, head
                ))
            })?;
            intern_along(child, tail, station)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelErrorKind;

    fn nested_survey() -> Survey {
        let mut cave = Series::new("cave");
        let upper = Series::child_of("upper", &cave);
        let lower = Series::child_of("lower", &cave);
        cave.add_child(upper);
        cave.add_child(lower);
        let mut survey = Survey::new("test");
        survey.add_series(cave);
        survey
    }

    #[test]
    fn test_new_resplits_at_last_dot() {
        let eq = Equate::new("cave.upper.12", "cave.lower.3").unwrap();
        assert_eq!(eq.series1, "cave.upper");
        assert_eq!(eq.station1, "12");
        assert_eq!(eq.series2, "cave.lower");
        assert_eq!(eq.station2, "3");
    }

    #[test]
    fn test_reference_without_separator_is_structural() {
        let err = Equate::new("cave.upper.12", "lonely").unwrap_err();
        assert_eq!(err.kind, ModelErrorKind::Structure);
    }

    #[test]
    fn test_link_lands_on_common_ancestor() {
        let mut survey = nested_survey();
        let eq = Equate::new("cave.upper.12", "cave.lower.3").unwrap();
        resolve_equate(&mut survey, &eq).unwrap();

        let cave = survey.find_series("cave").unwrap();
        assert_eq!(cave.links.len(), 1);
        assert_eq!(cave.links[0].path1, "upper");
        assert_eq!(cave.links[0].path2, "lower");
        assert!(survey.find_series("cave.upper").unwrap().links.is_empty());
    }

    #[test]
    fn test_unequal_depths() {
        let mut survey = nested_survey();
        let eq = Equate::new("cave.upper.12", "cave.7").unwrap();
        resolve_equate(&mut survey, &eq).unwrap();
        let cave = survey.find_series("cave").unwrap();
        assert_eq!(cave.links[0].path1, "upper");
        assert_eq!(cave.links[0].path2, "");
    }

    #[test]
    fn test_no_common_ancestor_is_fatal() {
        let mut survey = nested_survey();
        survey.add_series(Series::new("mine"));
        let eq = Equate::new("cave.upper.1", "mine.2").unwrap();
        let err = resolve_equate(&mut survey, &eq).unwrap_err();
        assert_eq!(err.kind, ModelErrorKind::Structure);
    }

    #[test]
    fn test_unknown_inner_series_is_fatal() {
        let mut survey = nested_survey();
        let eq = Equate::new("cave.attic.1", "cave.lower.2").unwrap();
        let err = resolve_equate(&mut survey, &eq).unwrap_err();
        assert_eq!(err.kind, ModelErrorKind::Structure);
        assert!(err.message.contains("attic"));
    }

    #[test]
    fn test_duplicate_links_suppressed_in_both_orders() {
        let mut survey = nested_survey();
        let forward = Equate::new("cave.upper.12", "cave.lower.3").unwrap();
        let backward = Equate::new("cave.lower.3", "cave.upper.12").unwrap();
        resolve_equate(&mut survey, &forward).unwrap();
        resolve_equate(&mut survey, &forward).unwrap();
        resolve_equate(&mut survey, &backward).unwrap();
        assert_eq!(survey.find_series("cave").unwrap().links.len(), 1);
    }

    #[test]
    fn test_stations_are_interned_in_leaf_series() {
        let mut survey = nested_survey();
        let eq = Equate::new("cave.upper.ledge", "cave.lower.3").unwrap();
        resolve_equate(&mut survey, &eq).unwrap();
        let cave = survey.find_series("cave").unwrap();
        assert!(cave.links[0].station1.id < 0);
        assert_eq!(cave.links[0].station1.display_name(), "ledge");
        assert_eq!(cave.links[0].station2.id, 3);
    }
}
