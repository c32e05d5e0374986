//! Command handlers. Each one works on a `Session` and prints its result.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::Args;
use tracing::{debug, warn};

use fredboard_core::api::{FredClient, SeriesFetcher};
use fredboard_core::cache::{CachedSeries, SeriesCache};
use fredboard_core::config::Config;
use fredboard_core::credentials::CredentialStore;
use fredboard_core::defaults;
use fredboard_core::models::{
    DateRange, DisplayPreference, LineStyle, RangePreset, SavedMetric, SeriesData, SeriesId,
};
use fredboard_core::registry::SeriesRegistry;
use fredboard_core::stats::{Change, ChangeMode, SeriesSummary};
use fredboard_core::store::JsonFileStore;
use fredboard_core::Error;

use crate::fetcher::Fetcher;
use crate::format::{format_group, format_value, metric_row, truncate_string, Table};

/// Display preference flags shared by `add` and `set`.
#[derive(Args, Debug, Default)]
pub struct PreferenceArgs {
    /// Line color (name or #rrggbb)
    #[arg(long)]
    pub color: Option<String>,

    /// solid, dash, dot, dashdot, longdash, longdashdot
    #[arg(long)]
    pub style: Option<LineStyle>,

    /// Line thickness in pixels (1-10)
    #[arg(long)]
    pub thickness: Option<u8>,

    /// Group label ("" to ungroup)
    #[arg(long)]
    pub group: Option<String>,
}

impl PreferenceArgs {
    /// Overlay the given flags on `base`.
    pub fn apply(&self, base: &DisplayPreference) -> Result<DisplayPreference> {
        let pref = DisplayPreference::new(
            self.color.as_deref().unwrap_or(&base.color),
            self.style.unwrap_or(base.line_style),
            self.thickness.unwrap_or(base.thickness),
            self.group.as_deref().unwrap_or(&base.group),
        )?;
        Ok(pref)
    }
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub series: SeriesId,

    /// Quick range: all, 5y, 1y, ytd, 6m, 3m
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub range: Option<RangePreset>,

    /// Custom start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Custom end date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Report absolute instead of percentage changes
    #[arg(long)]
    pub absolute: bool,

    /// Number of most recent observations to print
    #[arg(long, default_value_t = 12)]
    pub rows: usize,
}

impl ShowArgs {
    /// The window asked for on the command line, if any.
    fn requested_range(&self, today: NaiveDate) -> Result<Option<DateRange>> {
        if let Some(preset) = self.range {
            return Ok(Some(preset.resolve(today)));
        }
        if self.start.is_none() && self.end.is_none() {
            return Ok(None);
        }
        Ok(Some(DateRange::new(self.start, self.end)?))
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn change_mode(absolute: bool) -> ChangeMode {
    if absolute {
        ChangeMode::Absolute
    } else {
        ChangeMode::Percent
    }
}

// ============================================================================
// Session
// ============================================================================

pub struct Session {
    registry: SeriesRegistry<Fetcher, JsonFileStore>,
    cache: SeriesCache,
    config: Config,
}

impl Session {
    /// Load config, saved metrics and cached observations.
    pub fn open(data_dir: Option<PathBuf>, online: bool) -> Result<Self> {
        let mut config = Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        });
        if data_dir.is_some() {
            config.data_dir = data_dir;
        }

        let fetcher = if online {
            let api_key = CredentialStore::resolve()?;
            Fetcher::Online(FredClient::new(api_key, config.client_options())?)
        } else {
            Fetcher::Offline
        };

        let data_dir = config.data_dir()?;
        debug!(?data_dir, "Data directory configured");
        let store = JsonFileStore::in_dir(&data_dir);
        let range = config.default_range.resolve(today());
        let mut registry = SeriesRegistry::open(fetcher, store)
            .context("Failed to load saved metrics")?
            .with_range(range);

        let cache = SeriesCache::new(&config.cache_dir()?)?;
        let ids: Vec<SeriesId> = registry.metrics().keys().cloned().collect();
        for id in &ids {
            if let Some(cached) = cache.load(id) {
                registry.restore_cached(cached);
            }
        }

        Ok(Self {
            registry,
            cache,
            config,
        })
    }

    fn is_fresh(&self, cached: Option<&CachedSeries>) -> bool {
        cached.is_some_and(|c| !c.is_stale(self.config.cache_stale_minutes))
    }

    /// Write the in-memory observations for `series_id` to the disk cache.
    fn persist_cache(&self, series_id: &SeriesId) {
        if let Some(cached) = self.registry.data(series_id) {
            if let Err(e) = self.cache.save(cached) {
                warn!(series = %series_id, error = %e, "Failed to cache series");
            }
        }
    }

    /// Fetch the title/units for a freshly added series; failure only costs
    /// the display name.
    async fn describe_best_effort(&mut self, series_id: &SeriesId) {
        if let Err(e) = self.registry.describe(series_id).await {
            warn!(series = %series_id, error = %e, "Could not fetch series metadata");
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

pub fn list(session: &Session, group: Option<&str>) -> Result<()> {
    let mut table = Table::new(&["ID", "Name", "Group", "Color", "Style", "Width", "Latest", "Fetched"]);
    for row in session.registry.snapshot() {
        if let Some(label) = group {
            if row.metric.group() != label.trim() {
                continue;
            }
        }
        table.push(metric_row(row.metric, row.data));
    }

    if table.is_empty() {
        println!("No saved metrics. Add one with `fredboard add <SERIES>`.");
    } else {
        println!("{}", table.render());
    }
    Ok(())
}

pub fn groups(session: &Session) -> Result<()> {
    let labels = session.registry.groups();
    if labels.is_empty() {
        println!("No groups defined.");
        return Ok(());
    }
    let mut table = Table::new(&["Group", "Series"]);
    for label in labels {
        let count = session.registry.group_view(label).iter().count();
        table.push(vec![label.to_string(), count.to_string()]);
    }
    println!("{}", table.render());
    Ok(())
}

pub async fn add(session: &mut Session, series_id: SeriesId, args: &PreferenceArgs) -> Result<()> {
    let preference = args.apply(&DisplayPreference::default())?;
    session.registry.add(series_id.clone(), preference).await?;
    session.describe_best_effort(&series_id).await;
    session.persist_cache(&series_id);

    if let Some(metric) = session.registry.get(&series_id) {
        let count = session.registry.data(&series_id).map_or(0, |c| c.data.len());
        println!("Added {} ({}) with {} observations", metric.series_id, metric.display_name(), count);
    }
    Ok(())
}

pub fn remove(session: &mut Session, series_id: &SeriesId) -> Result<()> {
    let removed = session.registry.remove(series_id)?;
    if let Err(e) = session.cache.remove(series_id) {
        warn!(series = %series_id, error = %e, "Failed to remove cached series");
    }
    println!("Removed {}", removed.series_id);
    Ok(())
}

pub fn set(session: &mut Session, series_id: &SeriesId, args: &PreferenceArgs) -> Result<()> {
    let current = session
        .registry
        .get(series_id)
        .ok_or_else(|| Error::NotFound(series_id.clone()))?
        .preference
        .clone();
    let updated = session.registry.update_preference(series_id, args.apply(&current)?)?;
    let pref = &updated.preference;
    println!(
        "{}: color {}, {} line, {}px, group {}",
        updated.series_id,
        pref.color,
        pref.line_style,
        pref.thickness,
        format_group(&pref.group)
    );
    Ok(())
}

pub async fn refresh(session: &mut Session, series_id: Option<&SeriesId>) -> Result<()> {
    match series_id {
        Some(id) => {
            let result = session.registry.refresh(id).await.map(|c| c.data.len());
            match result {
                Ok(count) => {
                    session.persist_cache(id);
                    println!("Refreshed {} ({} observations)", id, count);
                }
                Err(e) if !session.registry.contains(id) => return Err(e.into()),
                Err(e) => {
                    report_stale(session, id, &e);
                    return Err(e.into());
                }
            }
        }
        None => {
            let report = session.registry.refresh_all().await;
            for id in &report.refreshed {
                session.persist_cache(id);
            }
            println!("Refreshed {} series", report.refreshed.len());
            for (id, e) in &report.failed {
                report_stale(session, id, e);
            }
            if !report.is_complete() {
                bail!("{} series could not be refreshed", report.failed.len());
            }
        }
    }
    Ok(())
}

fn report_stale(session: &Session, series_id: &SeriesId, error: &Error) {
    match session.registry.data(series_id) {
        Some(cached) => eprintln!(
            "{}: {} (keeping data fetched {})",
            series_id,
            error,
            cached.age_display()
        ),
        None => eprintln!("{}: {} (no data available)", series_id, error),
    }
    if error.is_retryable() {
        eprintln!("  This may be temporary; try again later.");
    }
}

pub async fn show(session: &mut Session, args: &ShowArgs) -> Result<()> {
    let today = today();
    let requested = args.requested_range(today)?;
    let series_id = &args.series;

    let (name, units, data) = if session.registry.contains(series_id) {
        let cached = session.registry.data(series_id);
        if requested.is_some() || !session.is_fresh(cached) {
            let default_range = session.registry.range();
            session.registry.set_range(requested.unwrap_or(default_range));
            let result = session.registry.refresh(series_id).await.map(|_| ());
            session.registry.set_range(default_range);
            match result {
                // observations for a custom window are not the session default
                Ok(()) if requested.is_none() => session.persist_cache(series_id),
                Ok(()) => {}
                Err(e) => {
                    if session.registry.data(series_id).is_none() {
                        return Err(e.into());
                    }
                    report_stale(session, series_id, &e);
                }
            }
        }
        let metric = session
            .registry
            .get(series_id)
            .ok_or_else(|| Error::NotFound(series_id.clone()))?;
        let data = session
            .registry
            .data(series_id)
            .map(|c| match requested {
                Some(window) => c.data.within(window),
                None => c.data.clone(),
            })
            .ok_or_else(|| Error::NotFound(series_id.clone()))?;
        let units = metric.info.as_ref().and_then(|i| i.units.clone());
        (metric.display_name().to_string(), units, data)
    } else {
        let range = requested.unwrap_or(session.registry.range());
        let fetcher = session.registry.fetcher();
        let data = fetcher.fetch(series_id, range).await?;
        let info = fetcher.describe(series_id).await.ok();
        let name = info
            .as_ref()
            .map(|i| i.title.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| series_id.to_string());
        (name, info.and_then(|i| i.units), data)
    };

    print_series(&name, units.as_deref(), &data, today, change_mode(args.absolute), args.rows);
    Ok(())
}

fn print_series(
    name: &str,
    units: Option<&str>,
    data: &SeriesData,
    today: NaiveDate,
    mode: ChangeMode,
    rows: usize,
) {
    println!("{} - {}", data.series_id, name);
    if let Some(units) = units {
        println!("Units: {}", units);
    }
    match (data.first_date(), data.last_date()) {
        (Some(first), Some(last)) => println!("{} observations, {} to {}", data.len(), first, last),
        _ => {
            println!("No observations in range.");
            return;
        }
    }

    let summary = SeriesSummary::compute(data, today, mode);
    let mut stats = Table::new(&["Minimum", "Maximum", "Mean", "Median", "Std Dev", "Sequential", "YTD"]);
    stats.push(vec![
        format_value(summary.min),
        format_value(summary.max),
        format_value(summary.mean),
        format_value(summary.median),
        format_value(summary.std_dev),
        summary.sequential_change.map_or_else(|| "N/A".to_string(), |c| c.to_string()),
        summary.ytd_change.map_or_else(|| "N/A".to_string(), |c| c.to_string()),
    ]);
    println!();
    println!("{}", stats.render());

    // most recent first
    let mut table = Table::new(&["Date", "Value"]);
    for obs in data.observations().iter().rev().take(rows) {
        table.push(vec![obs.date.to_string(), format_value(obs.value)]);
    }
    println!();
    println!("{}", table.render());
}

pub async fn summary(session: &mut Session, absolute: bool, group: Option<&str>) -> Result<()> {
    let ids: Vec<SeriesId> = match group {
        Some(label) => session.registry.group_view(label.trim()).ids().cloned().collect(),
        None => session.registry.metrics().keys().cloned().collect(),
    };
    if ids.is_empty() {
        println!("No saved metrics to summarize. Add some metrics first!");
        return Ok(());
    }

    let mut errors: Vec<(SeriesId, Error)> = Vec::new();
    for id in &ids {
        if session.is_fresh(session.registry.data(id)) {
            continue;
        }
        match session.registry.refresh(id).await {
            Ok(_) => session.persist_cache(id),
            Err(e) => errors.push((id.clone(), e)),
        }
    }

    let today = today();
    let mode = change_mode(absolute);
    let mut table = Table::new(&[
        "Metric",
        "Current",
        "Latest Date",
        "Units",
        "Frequency",
        "Sequential",
        "YTD",
    ]);
    for id in &ids {
        let Some(metric) = session.registry.get(id) else {
            continue;
        };
        table.push(summary_row(metric, session.registry.data(id), today, mode));
    }
    println!("{}", table.render());

    for (id, e) in &errors {
        report_stale(session, id, e);
    }
    Ok(())
}

fn summary_row(
    metric: &SavedMetric,
    cached: Option<&CachedSeries>,
    today: NaiveDate,
    mode: ChangeMode,
) -> Vec<String> {
    let info = metric.info.as_ref();
    let text = |v: Option<&String>| v.cloned().unwrap_or_else(|| "N/A".to_string());
    let units = text(info.and_then(|i| i.units.as_ref()));
    let frequency = text(info.and_then(|i| i.frequency.as_ref()));
    let name = truncate_string(metric.display_name(), 40);

    let Some(cached) = cached else {
        let error = "Error".to_string();
        return vec![name, error.clone(), error, units, frequency, "N/A".to_string(), "N/A".to_string()];
    };

    let summary = SeriesSummary::compute(&cached.data, today, mode);
    let (current, date) = match summary.latest {
        Some(r) => (format!("{:.2}", r.value), r.date.to_string()),
        None => ("N/A".to_string(), "N/A".to_string()),
    };
    let change = |c: Option<Change>| c.map_or_else(|| "N/A".to_string(), |c| c.to_string());
    vec![
        name,
        current,
        date,
        units,
        frequency,
        change(summary.sequential_change),
        change(summary.ytd_change),
    ]
}

pub async fn seed(session: &mut Session) -> Result<()> {
    let starters = defaults::starter_metrics()?;
    let mut added = 0;
    let mut skipped = 0;
    let mut failed = 0;

    for (series_id, group) in starters {
        if session.registry.contains(&series_id) {
            skipped += 1;
            continue;
        }
        println!("Adding {} to {}...", series_id, group);
        let preference = DisplayPreference::default().with_group(group);
        match session.registry.add(series_id.clone(), preference).await {
            Ok(_) => {
                session.describe_best_effort(&series_id).await;
                session.persist_cache(&series_id);
                added += 1;
            }
            Err(e) => {
                eprintln!("  {}: {}", series_id, e);
                failed += 1;
            }
        }
    }

    println!("Added {} series, {} already tracked, {} failed", added, skipped, failed);
    for label in session.registry.groups() {
        let count = session.registry.group_view(label).iter().count();
        println!("  {}: {} metrics", label, count);
    }
    Ok(())
}

pub fn key_set(key: Option<String>) -> Result<()> {
    let key = match key {
        Some(k) => k,
        None => rpassword::prompt_password("FRED API key: ").context("Failed to read API key")?,
    };
    if key.trim().is_empty() {
        bail!("API key must not be empty");
    }
    CredentialStore::store(&key)?;
    println!("API key stored in the system keychain.");
    Ok(())
}

pub fn key_clear() -> Result<()> {
    CredentialStore::delete()?;
    println!("API key removed from the system keychain.");
    Ok(())
}
