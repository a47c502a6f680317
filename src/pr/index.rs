use std::collections::{BTreeMap, BTreeSet};

/// Filename to the set of PR numbers that touched it.
/// Entries are only ever added for the lifetime of a run.
#[derive(Debug, Default, Clone)]
pub struct FileChangeIndex {
    files: BTreeMap<String, BTreeSet<u64>>,
}

impl FileChangeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `pr_number` touched `filename`. Repeats within one PR are no-ops.
    pub fn record(&mut self, filename: &str, pr_number: u64) {
        self.files
            .entry(filename.to_string())
            .or_default()
            .insert(pr_number);
    }

    /// Number of distinct PRs that touched `filename` (0 if never seen).
    #[allow(dead_code)] // Used by tests
    pub fn count(&self, filename: &str) -> usize {
        self.files.get(filename).map_or(0, BTreeSet::len)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// `(filename, pr_count)` sorted by descending count, then filename.
    pub fn sorted_counts(&self) -> Vec<(String, usize)> {
        let mut rows: Vec<_> = self
            .files
            .iter()
            .map(|(filename, prs)| (filename.clone(), prs.len()))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        rows
    }
}
