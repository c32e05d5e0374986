//! Summary statistics for one series: the chart statistics panel and the
//! per-metric summary table (latest value, sequential and year-to-date
//! change).

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::SeriesData;

/// How changes are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeMode {
    #[default]
    Percent,
    Absolute,
}

/// A change between two readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Change {
    Percent(f64),
    Absolute(f64),
}

impl Change {
    /// Percent change from `base` to `latest`, or the plain difference when
    /// absolute mode is requested or `base` is zero.
    pub fn between(base: f64, latest: f64, mode: ChangeMode) -> Self {
        match mode {
            ChangeMode::Percent if base != 0.0 => Change::Percent((latest - base) / base * 100.0),
            _ => Change::Absolute(latest - base),
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Change::Percent(v) | Change::Absolute(v) => *v,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Percent(v) => write!(f, "{:.2}%", v),
            Change::Absolute(v) => write!(f, "{:.2}", v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub date: NaiveDate,
    pub value: f64,
}

/// Statistics over the observations that carry a value. `None` fields
/// mean there were too few readings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Sample standard deviation (n - 1).
    pub std_dev: Option<f64>,
    pub latest: Option<Reading>,
    pub sequential_change: Option<Change>,
    pub ytd_change: Option<Change>,
}

impl SeriesSummary {
    /// Summarize `data`; year-to-date is measured from Jan 1 of `today`'s year.
    pub fn compute(data: &SeriesData, today: NaiveDate, mode: ChangeMode) -> Self {
        let readings: Vec<Reading> = data
            .present()
            .map(|(date, value)| Reading { date, value })
            .collect();
        let values: Vec<f64> = readings.iter().map(|r| r.value).collect();
        let count = values.len();

        let min = values.iter().copied().reduce(f64::min);
        let max = values.iter().copied().reduce(f64::max);
        let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
        let std_dev = match mean {
            Some(m) if count > 1 => {
                let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (count - 1) as f64;
                Some(var.sqrt())
            }
            _ => None,
        };

        let latest = readings.last().copied();
        let sequential_change = match readings.as_slice() {
            [.., previous, last] => Some(Change::between(previous.value, last.value, mode)),
            _ => None,
        };

        let ytd_change = match (latest, NaiveDate::from_ymd_opt(today.year(), 1, 1)) {
            (Some(last), Some(year_start)) if count >= 2 => readings
                .iter()
                .find(|r| r.date >= year_start)
                .map(|first| Change::between(first.value, last.value, mode)),
            _ => None,
        };

        Self {
            count,
            min,
            max,
            mean,
            median: median(values),
            std_dev,
            latest,
            sequential_change,
            ytd_change,
        }
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Observation, SeriesId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn data(points: &[(NaiveDate, Option<f64>)]) -> SeriesData {
        SeriesData::new(
            SeriesId::parse("TEST").unwrap(),
            points.iter().map(|(d, v)| Observation::new(*d, *v)).collect(),
        )
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_basic_statistics_skip_missing() {
        let series = data(&[
            (date(2023, 11, 1), Some(2.0)),
            (date(2023, 12, 1), Some(4.0)),
            (date(2024, 1, 1), None),
            (date(2024, 2, 1), Some(4.0)),
            (date(2024, 3, 1), Some(5.0)),
        ]);
        let summary = SeriesSummary::compute(&series, date(2024, 6, 1), ChangeMode::Percent);

        assert_eq!(summary.count, 4);
        assert_eq!(summary.min, Some(2.0));
        assert_eq!(summary.max, Some(5.0));
        assert!(close(summary.mean.unwrap(), 3.75));
        assert_eq!(summary.median, Some(4.0));
        // sample variance = (3.0625 + 0.0625 + 0.0625 + 1.5625) / 3
        assert!(close(summary.std_dev.unwrap(), (4.75f64 / 3.0).sqrt()));
        assert_eq!(summary.latest, Some(Reading { date: date(2024, 3, 1), value: 5.0 }));
    }

    #[test]
    fn test_sequential_and_ytd_changes() {
        let series = data(&[
            (date(2023, 12, 1), Some(100.0)),
            (date(2024, 1, 1), Some(80.0)),
            (date(2024, 2, 1), Some(90.0)),
            (date(2024, 3, 1), Some(99.0)),
        ]);
        let today = date(2024, 6, 1);

        let pct = SeriesSummary::compute(&series, today, ChangeMode::Percent);
        assert!(close(pct.sequential_change.unwrap().value(), 10.0));
        assert!(close(pct.ytd_change.unwrap().value(), 23.75));
        assert_eq!(pct.sequential_change.unwrap().to_string(), "10.00%");

        let abs = SeriesSummary::compute(&series, today, ChangeMode::Absolute);
        assert_eq!(abs.sequential_change, Some(Change::Absolute(9.0)));
        assert_eq!(abs.ytd_change, Some(Change::Absolute(19.0)));
        assert_eq!(abs.ytd_change.unwrap().to_string(), "19.00");
    }

    #[test]
    fn test_zero_base_falls_back_to_absolute() {
        assert_eq!(Change::between(0.0, 3.0, ChangeMode::Percent), Change::Absolute(3.0));
    }

    #[test]
    fn test_ytd_missing_without_current_year_data() {
        let series = data(&[(date(2022, 1, 1), Some(1.0)), (date(2022, 2, 1), Some(2.0))]);
        let summary = SeriesSummary::compute(&series, date(2024, 6, 1), ChangeMode::Percent);
        assert!(summary.sequential_change.is_some());
        assert!(summary.ytd_change.is_none());
    }

    #[test]
    fn test_too_few_points() {
        let single = data(&[(date(2024, 1, 1), Some(7.0))]);
        let summary = SeriesSummary::compute(&single, date(2024, 6, 1), ChangeMode::Percent);
        assert_eq!(summary.median, Some(7.0));
        assert!(summary.std_dev.is_none());
        assert!(summary.sequential_change.is_none());
        assert!(summary.ytd_change.is_none());

        let empty = data(&[]);
        let summary = SeriesSummary::compute(&empty, date(2024, 6, 1), ChangeMode::Percent);
        assert_eq!(summary.count, 0);
        assert!(summary.latest.is_none() && summary.mean.is_none() && summary.min.is_none());
    }
}
