use std::sync::Mutex;

use super::{PreferenceStore, SavedMetrics};
use crate::error::Result;

/// Keeps the mapping in process memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    metrics: Mutex<SavedMetrics>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: SavedMetrics) -> Self {
        Self {
            metrics: Mutex::new(metrics),
        }
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self) -> Result<SavedMetrics> {
        let guard = self.metrics.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }

    fn save(&self, metrics: &SavedMetrics) -> Result<()> {
        let mut guard = self.metrics.lock().unwrap_or_else(|e| e.into_inner());
        *guard = metrics.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DisplayPreference, SavedMetric, SeriesId};

    #[test]
    fn test_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_empty());

        let id = SeriesId::parse("CPIAUCSL").unwrap();
        let mut metrics = SavedMetrics::new();
        metrics.insert(id.clone(), SavedMetric::new(id, DisplayPreference::default()));
        store.save(&metrics).unwrap();

        assert_eq!(store.load().unwrap(), metrics);
    }
}
