use indexmap::map::Values;

use crate::models::{SavedMetric, SeriesId};
use crate::store::SavedMetrics;

/// Saved metrics sharing one group label, in insertion order.
///
/// Borrowed from the registry; iterating has no side effects and can be
/// started again with `iter()`.
#[derive(Debug, Clone, Copy)]
pub struct GroupView<'a> {
    metrics: &'a SavedMetrics,
    label: &'a str,
}

impl<'a> GroupView<'a> {
    pub(crate) fn new(metrics: &'a SavedMetrics, label: &'a str) -> Self {
        Self { metrics, label }
    }

    pub fn label(&self) -> &'a str {
        self.label
    }

    pub fn iter(&self) -> GroupIter<'a> {
        GroupIter {
            inner: self.metrics.values(),
            label: self.label,
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &'a SeriesId> + 'a {
        self.iter().map(|m| &m.series_id)
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl<'a> IntoIterator for GroupView<'a> {
    type Item = &'a SavedMetric;
    type IntoIter = GroupIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &GroupView<'a> {
    type Item = &'a SavedMetric;
    type IntoIter = GroupIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct GroupIter<'a> {
    inner: Values<'a, SeriesId, SavedMetric>,
    label: &'a str,
}

impl<'a> Iterator for GroupIter<'a> {
    type Item = &'a SavedMetric;

    fn next(&mut self) -> Option<Self::Item> {
        let label = self.label;
        self.inner.by_ref().find(|m| m.group() == label)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}

/// Distinct non-empty group labels, sorted.
pub(crate) fn labels(metrics: &SavedMetrics) -> Vec<&str> {
    let mut labels: Vec<&str> = metrics
        .values()
        .map(SavedMetric::group)
        .filter(|g| !g.is_empty())
        .collect();
    labels.sort_unstable();
    labels.dedup();
    labels
}
