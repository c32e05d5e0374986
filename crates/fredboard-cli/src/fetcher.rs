use async_trait::async_trait;
use fredboard_core::api::{FredClient, SeriesFetcher};
use fredboard_core::models::{DateRange, SeriesData, SeriesId, SeriesInfo};
use fredboard_core::Error;

/// The fetcher a CLI session runs with. Commands that never touch the
/// network run `Offline` so they work without an API key.
pub enum Fetcher {
    Online(FredClient),
    Offline,
}

#[async_trait]
impl SeriesFetcher for Fetcher {
    async fn fetch(&self, series_id: &SeriesId, range: DateRange) -> Result<SeriesData, Error> {
        match self {
            Fetcher::Online(client) => client.fetch(series_id, range).await,
            Fetcher::Offline => Err(Error::InvalidCredential),
        }
    }

    async fn describe(&self, series_id: &SeriesId) -> Result<SeriesInfo, Error> {
        match self {
            Fetcher::Online(client) => client.describe(series_id).await,
            Fetcher::Offline => Err(Error::InvalidCredential),
        }
    }
}
