//! fredboard core - track FRED economic series with persistent display
//! preferences.
//!
//! - `api`: the `SeriesFetcher` seam and the FRED HTTP client
//! - `store`: durable storage for saved metrics
//! - `registry`: session state reconciling saved metrics with fetched data
//! - `cache`: on-disk copies of fetched observations
//! - `stats`: summary statistics for a series

pub mod api;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod defaults;
pub mod error;
pub mod models;
pub mod registry;
pub mod stats;
pub mod store;

pub use error::{Error, InvalidInput, Result};
