use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{write_json_atomic, PreferenceStore, SavedMetrics};
use crate::error::{Error, Result};
use crate::models::{DisplayPreference, SavedMetric, SeriesId, SeriesInfo};

/// Preference file name inside the data directory
pub const PREFERENCES_FILE: &str = "saved_metrics.json";

/// Current on-disk layout version
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    version: u32,
    metrics: Vec<SavedMetric>,
}

/// Layout written by the earlier dashboard: an ID list plus side maps.
#[derive(Debug, Deserialize)]
struct LegacyDocument {
    saved_metrics: Vec<String>,
    #[serde(default)]
    saved_metrics_names: HashMap<String, String>,
    #[serde(default)]
    saved_metrics_groups: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredDocument {
    Current(Document),
    Legacy(LegacyDocument),
}

impl LegacyDocument {
    fn into_metrics(self) -> Result<SavedMetrics> {
        let mut metrics = SavedMetrics::new();
        for raw in self.saved_metrics {
            let series_id = SeriesId::parse(&raw)
                .map_err(|e| Error::storage("invalid series ID in legacy file", e))?;
            let group = self
                .saved_metrics_groups
                .get(&raw)
                .map(String::as_str)
                .unwrap_or_default();
            let mut metric =
                SavedMetric::new(series_id.clone(), DisplayPreference::default().with_group(group));
            metric.info = self.saved_metrics_names.get(&raw).map(|title| SeriesInfo {
                title: title.clone(),
                ..Default::default()
            });
            // the old format allowed repeats; first occurrence keeps its slot
            metrics.entry(series_id).or_insert(metric);
        }
        Ok(metrics)
    }
}

/// Stores the mapping as a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the standard file name inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(PREFERENCES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode(contents: &str) -> Result<SavedMetrics> {
        let doc: StoredDocument = serde_json::from_str(contents)
            .map_err(|e| Error::storage("unrecognized preference file", e))?;
        match doc {
            StoredDocument::Current(doc) => {
                if doc.version > FORMAT_VERSION {
                    return Err(Error::StorageUnavailable(format!(
                        "preference file version {} is newer than supported version {}",
                        doc.version, FORMAT_VERSION
                    )));
                }
                let mut metrics = SavedMetrics::with_capacity(doc.metrics.len());
                for metric in doc.metrics {
                    let id = metric.series_id.clone();
                    if metrics.insert(id.clone(), metric).is_some() {
                        return Err(Error::StorageUnavailable(format!(
                            "preference file lists {} more than once",
                            id
                        )));
                    }
                }
                Ok(metrics)
            }
            StoredDocument::Legacy(legacy) => {
                debug!("Reading legacy preference layout");
                legacy.into_metrics()
            }
        }
    }
}

impl PreferenceStore for JsonFileStore {
    fn load(&self) -> Result<SavedMetrics> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "No preference file yet");
                return Ok(SavedMetrics::new());
            }
            Err(e) => return Err(Error::storage("failed to read preference file", e)),
        };
        if contents.trim().is_empty() {
            warn!(path = ?self.path, "Preference file is empty, starting fresh");
            return Ok(SavedMetrics::new());
        }

        let metrics = Self::decode(&contents)?;
        debug!(path = ?self.path, count = metrics.len(), "Preferences loaded");
        Ok(metrics)
    }

    fn save(&self, metrics: &SavedMetrics) -> Result<()> {
        let doc = Document {
            version: FORMAT_VERSION,
            metrics: metrics.values().cloned().collect(),
        };
        write_json_atomic(&self.path, &doc)
            .map_err(|e| Error::storage("failed to write preference file", e))?;
        debug!(path = ?self.path, count = metrics.len(), "Preferences saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineStyle;

    fn id(s: &str) -> SeriesId {
        SeriesId::parse(s).unwrap()
    }

    fn sample() -> SavedMetrics {
        let mut metrics = SavedMetrics::new();
        let blue = DisplayPreference::new("blue", LineStyle::Dash, 3, "rates").unwrap();
        metrics.insert(id("FEDFUNDS"), SavedMetric::new(id("FEDFUNDS"), blue));
        let mut gdp = SavedMetric::new(id("GDP"), DisplayPreference::default());
        gdp.info = Some(SeriesInfo {
            title: "Gross Domestic Product".to_string(),
            units: Some("Billions of Dollars".to_string()),
            ..Default::default()
        });
        metrics.insert(id("GDP"), gdp);
        metrics.insert(id("DGS10"), SavedMetric::new(id("DGS10"), DisplayPreference::default().with_group("rates")));
        metrics
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_mapping_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        let metrics = sample();

        store.save(&metrics).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, metrics);
        let order: Vec<_> = loaded.keys().map(|k| k.as_str()).collect();
        assert_eq!(order, vec!["FEDFUNDS", "GDP", "DGS10"]);
    }

    #[test]
    fn test_save_overwrites_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        store.save(&sample()).unwrap();
        store.save(&SavedMetrics::new()).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_legacy_layout_is_imported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        std::fs::write(
            &path,
            r#"{
                "saved_metrics": ["HOUST", "INDPRO", "HOUST"],
                "saved_metrics_names": {"HOUST": "New Privately-Owned Housing Units Started"},
                "saved_metrics_groups": {"HOUST": "Construction"}
            }"#,
        )
        .unwrap();

        let loaded = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(loaded.len(), 2);
        let houst = &loaded[&id("HOUST")];
        assert_eq!(houst.group(), "Construction");
        assert_eq!(houst.display_name(), "New Privately-Owned Housing Units Started");
        let indpro = &loaded[&id("INDPRO")];
        assert_eq!(indpro.group(), "");
        assert_eq!(indpro.preference, DisplayPreference::default());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        let metric = SavedMetric::new(id("GDP"), DisplayPreference::default());
        let doc = Document {
            version: FORMAT_VERSION,
            metrics: vec![metric.clone(), metric],
        };
        std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
    }

    #[test]
    fn test_corrupt_file_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        std::fs::write(&path, "{\"metrics\": [").unwrap();
        assert!(matches!(
            JsonFileStore::new(&path).load(),
            Err(Error::StorageUnavailable(_))
        ));
    }

    #[test]
    fn test_unreadable_location_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        let store = JsonFileStore::in_dir(&blocker);
        assert!(matches!(store.load(), Err(Error::StorageUnavailable(_))));
    }

    #[test]
    fn test_invalid_preference_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        std::fs::write(
            &path,
            r#"{"version":1,"metrics":[{"series_id":"GDP","preference":{"color":"","thickness":0}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            JsonFileStore::new(&path).load(),
            Err(Error::StorageUnavailable(_))
        ));

        std::fs::write(
            &path,
            r#"{"version":1,"metrics":[{"series_id":"GDP","preference":{"color":"red","thickness":11}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            JsonFileStore::new(&path).load(),
            Err(Error::StorageUnavailable(_))
        ));
    }

    #[test]
    fn test_unwritable_location_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        let store = JsonFileStore::in_dir(&blocker);
        assert!(matches!(
            store.save(&sample()),
            Err(Error::StorageUnavailable(_))
        ));
    }
}
