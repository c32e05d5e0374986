//! Local caching of fetched observations.
//!
//! Fetched `SeriesData` is kept per series as JSON so that a new session
//! can render the last known values before anything is refetched. Entries
//! are considered stale after a configurable number of minutes (60 by
//! default); staleness is advisory, stale data is still served.

pub mod manager;

pub use manager::{CachedData, CachedSeries, SeriesCache, DEFAULT_STALE_MINUTES};
