//! HTTP client for the FRED REST API.
//!
//! `FredClient` issues one request per call: observations for `fetch`,
//! series metadata for `describe`. Rate-limited responses are retried
//! only when `max_rate_limit_retries` is configured above zero.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use super::{ApiError, SeriesFetcher};
use crate::error::Error;
use crate::models::{DateRange, Observation, SeriesData, SeriesId, SeriesInfo};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for FRED endpoints
pub const FRED_BASE_URL: &str = "https://api.stlouisfed.org/fred";

/// HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// FRED's placeholder for a period without a value.
const MISSING_VALUE: &str = ".";

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<RawObservation>,
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    date: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct SeriesResponse {
    #[serde(default)]
    seriess: Vec<RawSeries>,
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    #[serde(default)]
    title: String,
    units: Option<String>,
    frequency: Option<String>,
    notes: Option<String>,
    observation_start: Option<String>,
    observation_end: Option<String>,
    last_updated: Option<String>,
}

impl RawSeries {
    fn into_info(self) -> SeriesInfo {
        let date = |s: Option<String>| s.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok());
        SeriesInfo {
            title: self.title.trim().to_string(),
            units: self.units,
            frequency: self.frequency,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            observation_start: date(self.observation_start),
            observation_end: date(self.observation_end),
            last_updated: self.last_updated,
        }
    }
}

/// Settings for building a `FredClient`.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout: Duration,
    pub max_rate_limit_retries: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: FRED_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_rate_limit_retries: 0,
        }
    }
}

/// API client for FRED.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct FredClient {
    client: Client,
    api_key: String,
    options: ClientOptions,
}

impl std::fmt::Debug for FredClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FredClient")
            .field("api_key", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}

impl FredClient {
    pub fn new(api_key: impl Into<String>, options: ClientOptions) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(options.timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            options,
        })
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}/{}", self.options.base_url, endpoint);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(&url)
                .query(&[("api_key", self.api_key.as_str()), ("file_type", "json")])
                .query(params)
                .send()
                .await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let text = response.text().await?;
                    return serde_json::from_str(&text).map_err(|e| {
                        ApiError::InvalidResponse(format!("{} payload: {}", endpoint, e))
                    });
                }
                None => {
                    retries += 1;
                    if retries > self.options.max_rate_limit_retries {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(endpoint = endpoint, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    async fn fetch_observations(
        &self,
        series_id: &SeriesId,
        range: DateRange,
    ) -> Result<SeriesData, ApiError> {
        let mut params = vec![("series_id", series_id.to_string())];
        if let Some(start) = range.start {
            params.push(("observation_start", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = range.end {
            params.push(("observation_end", end.format("%Y-%m-%d").to_string()));
        }

        let parsed: ObservationsResponse = self.get("series/observations", &params).await?;
        let data = parse_observations(series_id, parsed)?;
        debug!(series = %series_id, points = data.len(), %range, "Observations fetched");
        Ok(data)
    }

    async fn fetch_info(&self, series_id: &SeriesId) -> Result<SeriesInfo, ApiError> {
        let parsed: SeriesResponse = self
            .get("series", &[("series_id", series_id.to_string())])
            .await?;
        parsed
            .seriess
            .into_iter()
            .next()
            .map(RawSeries::into_info)
            .ok_or_else(|| ApiError::NotFound(series_id.to_string()))
    }
}

fn parse_observations(
    series_id: &SeriesId,
    response: ObservationsResponse,
) -> Result<SeriesData, ApiError> {
    let mut observations = Vec::with_capacity(response.observations.len());
    for raw in response.observations {
        let date = NaiveDate::parse_from_str(&raw.date, "%Y-%m-%d").map_err(|e| {
            ApiError::InvalidResponse(format!("bad observation date {:?}: {}", raw.date, e))
        })?;
        let value = match raw.value.trim() {
            MISSING_VALUE | "" => None,
            text => match text.parse::<f64>() {
                Ok(v) if v.is_finite() => Some(v),
                _ => {
                    debug!(series = %series_id, %date, value = %text, "Unparseable value treated as missing");
                    None
                }
            },
        };
        observations.push(Observation::new(date, value));
    }
    Ok(SeriesData::new(series_id.clone(), observations))
}

#[async_trait]
impl SeriesFetcher for FredClient {
    async fn fetch(&self, series_id: &SeriesId, range: DateRange) -> Result<SeriesData, Error> {
        self.fetch_observations(series_id, range)
            .await
            .map_err(|e| e.into_error(series_id))
    }

    async fn describe(&self, series_id: &SeriesId) -> Result<SeriesInfo, Error> {
        self.fetch_info(series_id)
            .await
            .map_err(|e| e.into_error(series_id))
    }
}

// ============================================================================
// Tests
// ============================================================================
