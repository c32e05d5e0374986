//! Durable storage for the user's tracked series and display preferences.
//!
//! The whole `SavedMetrics` mapping is one record: `load` reads it back in
//! insertion order, `save` replaces it atomically.
//!
//! Implementations:
//! - `JsonFileStore`: a JSON document on disk (temp file + rename on save)
//! - `MemoryStore`: process-local, for tests and throwaway sessions

mod atomic;
pub mod file;
pub mod memory;

use indexmap::IndexMap;

use crate::error::Result;
use crate::models::{SavedMetric, SeriesId};

pub(crate) use atomic::write_json_atomic;
pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Tracked series keyed by ID, in the order they were added.
pub type SavedMetrics = IndexMap<SeriesId, SavedMetric>;

pub trait PreferenceStore: Send + Sync {
    /// Read the full mapping. A store that was never written yields an
    /// empty mapping.
    fn load(&self) -> Result<SavedMetrics>;

    /// Replace the stored mapping with `metrics`.
    fn save(&self, metrics: &SavedMetrics) -> Result<()>;
}
