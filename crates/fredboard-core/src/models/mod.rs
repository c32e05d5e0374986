//! Data models for tracked economic series.
//!
//! - `SeriesId`, `SeriesData`, `Observation`, `SeriesInfo`: provider data
//! - `DisplayPreference`, `LineStyle`, `SavedMetric`: what the user tracks and how it is drawn
//! - `DateRange`, `RangePreset`: observation windows

pub mod preference;
pub mod range;
pub mod series;

pub use preference::{DisplayPreference, LineStyle, SavedMetric};
pub use range::{DateRange, RangePreset};
pub use series::{Observation, SeriesData, SeriesId, SeriesInfo};
