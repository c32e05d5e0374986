//! Full session lifecycle against the JSON preference file.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use fredboard_core::api::SeriesFetcher;
use fredboard_core::cache::SeriesCache;
use fredboard_core::models::{
    DateRange, DisplayPreference, LineStyle, Observation, SeriesData, SeriesId, SeriesInfo,
};
use fredboard_core::registry::SeriesRegistry;
use fredboard_core::store::{JsonFileStore, PreferenceStore};
use fredboard_core::Error;

#[derive(Default)]
struct QueueFetcher {
    queue: Mutex<HashMap<SeriesId, VecDeque<Result<SeriesData, Error>>>>,
}

impl QueueFetcher {
    fn push(&self, id: &SeriesId, response: Result<SeriesData, Error>) {
        self.queue
            .lock()
            .unwrap()
            .entry(id.clone())
            .or_default()
            .push_back(response);
    }
}

#[async_trait]
impl SeriesFetcher for QueueFetcher {
    async fn fetch(&self, series_id: &SeriesId, _range: DateRange) -> Result<SeriesData, Error> {
        self.queue
            .lock()
            .unwrap()
            .get_mut(series_id)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| Err(Error::NotFound(series_id.clone())))
    }

    async fn describe(&self, series_id: &SeriesId) -> Result<SeriesInfo, Error> {
        Err(Error::NotFound(series_id.clone()))
    }
}

fn id(s: &str) -> SeriesId {
    SeriesId::parse(s).unwrap()
}

fn three_points(series_id: &SeriesId) -> SeriesData {
    let obs = (1..=3)
        .map(|m| Observation::new(NaiveDate::from_ymd_opt(2024, m, 1).unwrap(), Some(m as f64)))
        .collect();
    SeriesData::new(series_id.clone(), obs)
}

#[tokio::test]
async fn preferences_survive_a_new_session() {
    let dir = tempfile::tempdir().unwrap();
    let unrate = id("UNRATE");
    let fedfunds = id("FEDFUNDS");
    let rates = DisplayPreference::new("blue", LineStyle::Dash, 3, "rates").unwrap();

    {
        let fetcher = QueueFetcher::default();
        fetcher.push(&unrate, Ok(three_points(&unrate)));
        fetcher.push(&fedfunds, Ok(three_points(&fedfunds)));
        let mut reg = SeriesRegistry::open(fetcher, JsonFileStore::in_dir(dir.path())).unwrap();

        reg.add(unrate.clone(), rates.clone()).await.unwrap();
        reg.add(fedfunds.clone(), DisplayPreference::default()).await.unwrap();
        reg.remove(&fedfunds).unwrap();

        let cache = SeriesCache::new(&dir.path().join("cache")).unwrap();
        cache.save(reg.data(&unrate).unwrap()).unwrap();
    }

    let store = JsonFileStore::in_dir(dir.path());
    let loaded = store.load().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[&unrate].preference, rates);

    let mut reg = SeriesRegistry::open(QueueFetcher::default(), store).unwrap();
    assert!(reg.data(&unrate).is_none());
    let cache = SeriesCache::new(&dir.path().join("cache")).unwrap();
    assert!(reg.restore_cached(cache.load(&unrate).unwrap()));

    // nothing queued: refresh fails, the restored data stays
    let err = reg.refresh(&unrate).await.unwrap_err();
    assert_eq!(err, Error::NotFound(unrate.clone()));
    assert_eq!(reg.data(&unrate).unwrap().data, three_points(&unrate));

    let ids: Vec<_> = reg.group_view("rates").ids().cloned().collect();
    assert_eq!(ids, vec![unrate]);
}

#[tokio::test]
async fn refresh_failure_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let unrate = id("UNRATE");
    let fetcher = QueueFetcher::default();
    fetcher.push(&unrate, Ok(three_points(&unrate)));
    fetcher.push(&unrate, Err(Error::TransientFailure("timed out".to_string())));

    let mut reg = SeriesRegistry::open(fetcher, JsonFileStore::in_dir(dir.path())).unwrap();
    let blue = DisplayPreference::new("blue", LineStyle::Solid, 2, "").unwrap();
    reg.add(unrate.clone(), blue.clone()).await.unwrap();
    assert_eq!(reg.len(), 1);

    let err = reg.refresh(&unrate).await.unwrap_err();
    assert!(matches!(err, Error::TransientFailure(_)));
    assert_eq!(reg.data(&unrate).unwrap().data.len(), 3);
    assert_eq!(reg.get(&unrate).unwrap().preference, blue);
    assert_eq!(reg.store().load().unwrap()[&unrate].preference, blue);
}
