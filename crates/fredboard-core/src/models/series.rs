//! Series identifiers, observations and provider metadata.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::range::DateRange;
use crate::error::InvalidInput;

/// Longest identifier accepted; FRED IDs are well under this.
pub const MAX_SERIES_ID_LEN: usize = 64;

/// Identifier for one economic data series (e.g. `UNRATE`).
///
/// Always trimmed and upper-cased, so `" unrate"` and `"UNRATE"` name
/// the same series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeriesId(String);

impl SeriesId {
    pub fn parse(raw: &str) -> Result<Self, InvalidInput> {
        let id = raw.trim().to_ascii_uppercase();
        if id.is_empty() {
            return Err(InvalidInput::EmptySeriesId);
        }
        if id.len() > MAX_SERIES_ID_LEN {
            return Err(InvalidInput::SeriesIdTooLong(id.len()));
        }
        if let Some(c) = id.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
            return Err(InvalidInput::SeriesIdCharacter(c));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SeriesId {
    type Err = InvalidInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SeriesId {
    type Error = InvalidInput;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SeriesId> for String {
    fn from(id: SeriesId) -> Self {
        id.0
    }
}

/// One dated reading. `value` is `None` when the provider reports no value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self { date, value }
    }
}

/// Observations for one series, ascending by date with unique dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesData {
    pub series_id: SeriesId,
    observations: Vec<Observation>,
}

impl SeriesData {
    /// Build from observations in any order. When a date repeats, the
    /// later entry wins.
    pub fn new(series_id: SeriesId, mut observations: Vec<Observation>) -> Self {
        // stable sort keeps arrival order among equal dates
        observations.sort_by_key(|o| o.date);
        let mut deduped: Vec<Observation> = Vec::with_capacity(observations.len());
        for obs in observations {
            match deduped.last_mut() {
                Some(last) if last.date == obs.date => *last = obs,
                _ => deduped.push(obs),
            }
        }
        Self {
            series_id,
            observations: deduped,
        }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Observations that carry a value.
    pub fn present(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.observations
            .iter()
            .filter_map(|o| o.value.map(|v| (o.date, v)))
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }

    /// Copy limited to the observations dated inside `range`.
    pub fn within(&self, range: DateRange) -> SeriesData {
        if range.is_unbounded() {
            return self.clone();
        }
        Self {
            series_id: self.series_id.clone(),
            observations: self
                .observations
                .iter()
                .filter(|o| range.contains(o.date))
                .copied()
                .collect(),
        }
    }
}

/// Descriptive metadata about a series, as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesInfo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_end: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}
