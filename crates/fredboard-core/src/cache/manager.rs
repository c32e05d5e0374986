use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{SeriesData, SeriesId};
use crate::store::write_json_atomic;

/// Consider cached observations stale after 1 hour.
pub const DEFAULT_STALE_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

/// Observations with the time they were fetched.
pub type CachedSeries = CachedData<SeriesData>;

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            let remaining_mins = minutes % 60;
            if remaining_mins >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            let remaining_hours = (minutes % 1440) / 60;
            if remaining_hours >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self, stale_minutes: i64) -> bool {
        self.age_minutes() > stale_minutes
    }
}

/// One JSON file per series under `<cache_dir>/series/`.
#[derive(Debug, Clone)]
pub struct SeriesCache {
    cache_dir: PathBuf,
}

impl SeriesCache {
    pub fn new(cache_dir: &Path) -> Result<Self> {
        let cache_dir = cache_dir.join("series");
        std::fs::create_dir_all(&cache_dir)
            .map_err(|e| Error::storage("failed to create cache directory", e))?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, series_id: &SeriesId) -> PathBuf {
        self.cache_dir.join(format!("{}.json", series_id))
    }

    fn read<T: DeserializeOwned>(path: &Path) -> Result<Option<CachedData<T>>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::storage("failed to read cache file", e))?;
        let cached = serde_json::from_str(&contents)
            .map_err(|e| Error::storage("failed to parse cache file", e))?;
        Ok(Some(cached))
    }

    /// Cached observations for `series_id`. Unreadable entries are logged
    /// and reported as absent so a refetch can replace them.
    pub fn load(&self, series_id: &SeriesId) -> Option<CachedSeries> {
        match Self::read::<SeriesData>(&self.cache_path(series_id)) {
            Ok(Some(cached)) if cached.data.series_id == *series_id => Some(cached),
            Ok(Some(_)) => {
                warn!(series = %series_id, "Cache entry belongs to another series, ignoring");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(series = %series_id, error = %e, "Failed to load cached series");
                None
            }
        }
    }

    pub fn save(&self, cached: &CachedSeries) -> Result<()> {
        let path = self.cache_path(&cached.data.series_id);
        write_json_atomic(&path, cached)
            .map_err(|e| Error::storage("failed to write cache file", e))?;
        debug!(series = %cached.data.series_id, points = cached.data.len(), "Series cached");
        Ok(())
    }

    pub fn remove(&self, series_id: &SeriesId) -> Result<()> {
        let path = self.cache_path(series_id);
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| Error::storage("failed to remove cache file", e))?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Observation;
    use chrono::{Duration, NaiveDate};

    fn series(id: &str) -> SeriesData {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        SeriesData::new(
            SeriesId::parse(id).unwrap(),
            vec![Observation::new(date, Some(4.2))],
        )
    }

    #[test]
    fn test_cached_data_age_display_just_now() {
        let cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_cached_data_age_display_rounding() {
        let mut cached = CachedData::new(());
        cached.cached_at = Utc::now() - Duration::minutes(95);
        assert_eq!(cached.age_display(), "2h ago");
        cached.cached_at = Utc::now() - Duration::hours(26);
        assert_eq!(cached.age_display(), "1d ago");
        cached.cached_at = Utc::now() - Duration::minutes(5);
        assert_eq!(cached.age_display(), "5m ago");
    }

    #[test]
    fn test_cached_data_is_stale() {
        let fresh = CachedData::new(vec![1]);
        assert!(!fresh.is_stale(DEFAULT_STALE_MINUTES));

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Utc::now() - Duration::minutes(61);
        assert!(old.is_stale(DEFAULT_STALE_MINUTES));
    }

    #[test]
    fn test_series_cache_round_trip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SeriesCache::new(dir.path()).unwrap();
        let id = SeriesId::parse("UNRATE").unwrap();
        assert!(cache.load(&id).is_none());

        let cached = CachedData::new(series("UNRATE"));
        cache.save(&cached).unwrap();
        assert_eq!(cache.load(&id), Some(cached));

        cache.remove(&id).unwrap();
        assert!(cache.load(&id).is_none());
        // removing again is a no-op
        cache.remove(&id).unwrap();
    }

    #[test]
    fn test_corrupt_cache_entry_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SeriesCache::new(dir.path()).unwrap();
        let id = SeriesId::parse("GDP").unwrap();
        std::fs::write(cache.cache_path(&id), "not json").unwrap();
        assert!(cache.load(&id).is_none());
    }
}
