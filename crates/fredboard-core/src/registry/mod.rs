//! Session state: the tracked series, their preferences and fetched data.
//!
//! `SeriesRegistry` is opened from a `PreferenceStore` at the start of a
//! session and is the only writer to it afterwards. Every mutation is
//! persisted before it returns; when persisting fails the in-memory change
//! is rolled back so memory and storage never disagree.
//!
//! Data is fetched on `add` and `refresh` only. A failed refresh keeps the
//! last good observations (stale-but-available).

mod group;

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::api::SeriesFetcher;
use crate::cache::CachedSeries;
use crate::error::{Error, Result};
use crate::models::{DateRange, DisplayPreference, SavedMetric, SeriesId};
use crate::store::{PreferenceStore, SavedMetrics};

pub use group::{GroupIter, GroupView};

/// One row of a render snapshot.
#[derive(Debug, Clone, Copy)]
pub struct TrackedSeries<'a> {
    pub metric: &'a SavedMetric,
    pub data: Option<&'a CachedSeries>,
}

/// Result of refreshing every tracked series.
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub refreshed: Vec<SeriesId>,
    pub failed: Vec<(SeriesId, Error)>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct SeriesRegistry<F, S> {
    fetcher: F,
    store: S,
    metrics: SavedMetrics,
    data: HashMap<SeriesId, CachedSeries>,
    range: DateRange,
}

impl<F: SeriesFetcher, S: PreferenceStore> SeriesRegistry<F, S> {
    /// Rebuild session state from `store`. No data is fetched.
    pub fn open(fetcher: F, store: S) -> Result<Self> {
        let metrics = store.load()?;
        debug!(count = metrics.len(), "Registry opened");
        Ok(Self {
            fetcher,
            store,
            metrics,
            data: HashMap::new(),
            range: DateRange::ALL,
        })
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    // ===== Accessors =====

    /// Window used by every fetch.
    pub fn range(&self) -> DateRange {
        self.range
    }

    /// Change the fetch window. Cached data is not refetched.
    pub fn set_range(&mut self, range: DateRange) {
        self.range = range;
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn contains(&self, series_id: &SeriesId) -> bool {
        self.metrics.contains_key(series_id)
    }

    pub fn get(&self, series_id: &SeriesId) -> Option<&SavedMetric> {
        self.metrics.get(series_id)
    }

    /// Last fetched observations, if any were fetched or restored this session.
    pub fn data(&self, series_id: &SeriesId) -> Option<&CachedSeries> {
        self.data.get(series_id)
    }

    pub fn metrics(&self) -> &SavedMetrics {
        &self.metrics
    }

    /// Read-only view of everything tracked, in insertion order.
    pub fn snapshot(&self) -> Vec<TrackedSeries<'_>> {
        self.metrics
            .values()
            .map(|metric| TrackedSeries {
                metric,
                data: self.data.get(&metric.series_id),
            })
            .collect()
    }

    /// Saved metrics whose group equals `label`. An empty label selects
    /// the ungrouped ones.
    pub fn group_view<'a>(&'a self, label: &'a str) -> GroupView<'a> {
        GroupView::new(&self.metrics, label)
    }

    /// Distinct non-empty group labels, sorted.
    pub fn groups(&self) -> Vec<&str> {
        group::labels(&self.metrics)
    }

    /// Seed the in-memory data for a tracked series, e.g. from a disk cache.
    /// Returns false (and ignores the data) when the series is not tracked.
    pub fn restore_cached(&mut self, cached: CachedSeries) -> bool {
        let series_id = cached.data.series_id.clone();
        if !self.metrics.contains_key(&series_id) {
            debug!(series = %series_id, "Ignoring cached data for untracked series");
            return false;
        }
        self.data.insert(series_id, cached);
        true
    }

    // ===== Mutations =====

    /// Start tracking `series_id`. The series is fetched first; nothing
    /// changes if the fetch fails.
    pub async fn add(
        &mut self,
        series_id: SeriesId,
        preference: DisplayPreference,
    ) -> Result<&SavedMetric> {
        if self.metrics.contains_key(&series_id) {
            return Err(Error::AlreadyExists(series_id));
        }

        let data = self.fetcher.fetch(&series_id, self.range).await?;
        let points = data.len();

        let (index, _) = self
            .metrics
            .insert_full(series_id.clone(), SavedMetric::new(series_id.clone(), preference));
        if let Err(e) = self.store.save(&self.metrics) {
            self.metrics.shift_remove(&series_id);
            return Err(e);
        }
        self.data.insert(series_id.clone(), CachedSeries::new(data));

        info!(series = %series_id, points, "Series added");
        Ok(&self.metrics[index])
    }

    /// Stop tracking `series_id`, dropping its preference and data.
    pub fn remove(&mut self, series_id: &SeriesId) -> Result<SavedMetric> {
        let (index, key, metric) = self
            .metrics
            .shift_remove_full(series_id)
            .ok_or_else(|| Error::NotFound(series_id.clone()))?;

        if let Err(e) = self.store.save(&self.metrics) {
            self.metrics.shift_insert(index, key, metric);
            return Err(e);
        }
        self.data.remove(series_id);

        info!(series = %series_id, "Series removed");
        Ok(metric)
    }

    /// Replace the display preference. Data is left untouched.
    pub fn update_preference(
        &mut self,
        series_id: &SeriesId,
        preference: DisplayPreference,
    ) -> Result<&SavedMetric> {
        let index = self
            .metrics
            .get_index_of(series_id)
            .ok_or_else(|| Error::NotFound(series_id.clone()))?;

        let previous = std::mem::replace(&mut self.metrics[index].preference, preference);
        if let Err(e) = self.store.save(&self.metrics) {
            self.metrics[index].preference = previous;
            return Err(e);
        }

        info!(series = %series_id, "Display preference updated");
        Ok(&self.metrics[index])
    }

    /// Refetch observations for a tracked series. On failure the previous
    /// data stays available through `data()` and the error is returned.
    pub async fn refresh(&mut self, series_id: &SeriesId) -> Result<&CachedSeries> {
        if !self.metrics.contains_key(series_id) {
            return Err(Error::NotFound(series_id.clone()));
        }

        match self.fetcher.fetch(series_id, self.range).await {
            Ok(data) => {
                debug!(series = %series_id, points = data.len(), "Series refreshed");
                let cached = CachedSeries::new(data);
                let slot = match self.data.entry(series_id.clone()) {
                    Entry::Occupied(mut occupied) => {
                        occupied.insert(cached);
                        occupied.into_mut()
                    }
                    Entry::Vacant(vacant) => vacant.insert(cached),
                };
                Ok(&*slot)
            }
            Err(e) => {
                warn!(
                    series = %series_id,
                    error = %e,
                    has_stale = self.data.contains_key(series_id),
                    "Refresh failed, keeping previous data"
                );
                Err(e)
            }
        }
    }

    /// Refresh every tracked series in order. Failures are collected, not
    /// fatal; each failed series keeps its previous data.
    pub async fn refresh_all(&mut self) -> RefreshReport {
        let ids: Vec<SeriesId> = self.metrics.keys().cloned().collect();
        let mut report = RefreshReport::default();
        for series_id in ids {
            match self.refresh(&series_id).await {
                Ok(_) => report.refreshed.push(series_id),
                Err(e) => report.failed.push((series_id, e)),
            }
        }
        info!(
            refreshed = report.refreshed.len(),
            failed = report.failed.len(),
            "Refresh pass complete"
        );
        report
    }

    /// Fetch provider metadata and keep it on the saved metric.
    pub async fn describe(&mut self, series_id: &SeriesId) -> Result<&SavedMetric> {
        let index = self
            .metrics
            .get_index_of(series_id)
            .ok_or_else(|| Error::NotFound(series_id.clone()))?;

        let info = self.fetcher.describe(series_id).await?;
        let previous = self.metrics[index].info.replace(info);
        if let Err(e) = self.store.save(&self.metrics) {
            self.metrics[index].info = previous;
            return Err(e);
        }

        debug!(series = %series_id, "Series metadata stored");
        Ok(&self.metrics[index])
    }
}

// ============================================================================
// Tests
// ============================================================================
