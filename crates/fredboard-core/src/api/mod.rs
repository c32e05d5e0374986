//! Client side of the economic-data provider.
//!
//! `SeriesFetcher` is the seam the registry talks to; `FredClient` is the
//! production implementation over the FRED REST API. The fetcher does no
//! caching of its own.

pub mod client;
pub mod error;

use async_trait::async_trait;

use crate::error::Error;
use crate::models::{DateRange, SeriesData, SeriesId, SeriesInfo};

pub use client::{ClientOptions, FredClient};
pub use error::ApiError;

#[async_trait]
pub trait SeriesFetcher: Send + Sync {
    /// Fetch observations for `series_id` within `range`. One outbound
    /// request per call. Fails with `NotFound`, `RateLimited`,
    /// `TransientFailure` or `InvalidCredential`.
    async fn fetch(&self, series_id: &SeriesId, range: DateRange) -> Result<SeriesData, Error>;

    /// Fetch descriptive metadata (title, units, frequency).
    async fn describe(&self, series_id: &SeriesId) -> Result<SeriesInfo, Error>;
}
