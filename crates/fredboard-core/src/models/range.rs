//! Observation date windows and the quick-select presets.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::InvalidInput;

/// Inclusive observation window; an open end means "as far as available".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// The whole history of a series.
    pub const ALL: DateRange = DateRange {
        start: None,
        end: None,
    };

    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, InvalidInput> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(InvalidInput::InvertedRange {
                    start: s.to_string(),
                    end: e.to_string(),
                });
            }
        }
        Ok(Self { start, end })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (None, None) => write!(f, "all time"),
            (Some(s), None) => write!(f, "{} onward", s),
            (None, Some(e)) => write!(f, "through {}", e),
            (Some(s), Some(e)) => write!(f, "{} to {}", s, e),
        }
    }
}

/// Quick-select windows, resolved relative to a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RangePreset {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "3m")]
    ThreeMonths,
}

impl RangePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangePreset::All => "all",
            RangePreset::FiveYears => "5y",
            RangePreset::OneYear => "1y",
            RangePreset::YearToDate => "ytd",
            RangePreset::SixMonths => "6m",
            RangePreset::ThreeMonths => "3m",
        }
    }

    /// Day-count windows use calendar-agnostic day spans (a year is 365 days).
    pub fn resolve(&self, today: NaiveDate) -> DateRange {
        let back = |days: i64| DateRange {
            start: Some(today - Duration::days(days)),
            end: Some(today),
        };
        match self {
            RangePreset::All => DateRange::ALL,
            RangePreset::FiveYears => back(365 * 5),
            RangePreset::OneYear => back(365),
            RangePreset::SixMonths => back(180),
            RangePreset::ThreeMonths => back(90),
            RangePreset::YearToDate => DateRange {
                start: NaiveDate::from_ymd_opt(today.year(), 1, 1),
                end: Some(today),
            },
        }
    }
}

impl fmt::Display for RangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangePreset {
    type Err = InvalidInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(RangePreset::All),
            "5y" => Ok(RangePreset::FiveYears),
            "1y" => Ok(RangePreset::OneYear),
            "ytd" => Ok(RangePreset::YearToDate),
            "6m" => Ok(RangePreset::SixMonths),
            "3m" => Ok(RangePreset::ThreeMonths),
            _ => Err(InvalidInput::RangePreset(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_presets_resolve() {
        let today = date(2024, 6, 15);
        assert_eq!(RangePreset::All.resolve(today), DateRange::ALL);
        assert_eq!(
            RangePreset::YearToDate.resolve(today),
            DateRange { start: Some(date(2024, 1, 1)), end: Some(today) }
        );
        assert_eq!(RangePreset::OneYear.resolve(today).start, Some(date(2023, 6, 16)));
        assert_eq!(RangePreset::ThreeMonths.resolve(today).start, Some(date(2024, 3, 17)));
        assert_eq!(RangePreset::FiveYears.resolve(today).start, Some(today - Duration::days(1825)));
    }

    #[test]
    fn test_preset_names_round_trip() {
        for preset in ["all", "5y", "1y", "ytd", "6m", "3m"] {
            let parsed: RangePreset = preset.parse().unwrap();
            assert_eq!(parsed.as_str(), preset);
            let json = serde_json::to_string(&parsed).unwrap();
            assert_eq!(json, format!("\"{}\"", preset));
        }
        assert!("10y".parse::<RangePreset>().is_err());
    }

    #[test]
    fn test_custom_range_validation() {
        assert!(DateRange::new(Some(date(2024, 2, 1)), Some(date(2024, 1, 1))).is_err());
        let range = DateRange::new(Some(date(2024, 1, 1)), None).unwrap();
        assert!(range.contains(date(2030, 1, 1)));
        assert!(!range.contains(date(2023, 12, 31)));
        assert!(!range.is_unbounded());
    }
}
