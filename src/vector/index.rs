//! Nearest-neighbor lookup over named vector collections.

use crate::vector::{Neighbor, VectorError, l2_distance};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;

/// Nearest-neighbor queries against a named index.
pub trait VectorIndex: Send + Sync {
    /// Up to `k` entries of `index` closest to `vector`, nearest first.
    ///
    /// Returns fewer than `k` results when the index is smaller and an empty
    /// list when it has no entries. `distance` is populated only when
    /// `include_distances` is set.
    fn query_nearest(
        &self,
        index: &str,
        vector: &[f32],
        k: usize,
        include_distances: bool,
    ) -> impl Future<Output = Result<Vec<Neighbor>, VectorError>> + Send;
}

#[derive(Debug, Default)]
struct Collection {
    dimension: Option<usize>,
    entries: Vec<(String, Vec<f32>)>,
}

impl Collection {
    fn check_dimension(&self, vector: &[f32]) -> Result<(), VectorError> {
        match self.dimension {
            Some(expected) if expected != vector.len() => Err(VectorError::DimensionMismatch {
                expected,
                actual: vector.len(),
            }),
            _ => Ok(()),
        }
    }
}

/// Exact brute-force index kept in memory.
///
/// Every query scans the whole collection, which is fine for catalog-sized
/// data (a handful of categories and physicians).
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `index` with no entries, leaving an existing one untouched
    pub fn create(&self, index: &str) {
        self.collections
            .write()
            .entry(index.to_string())
            .or_default();
    }

    /// Replace the whole contents of `index`.
    ///
    /// All vectors must share one dimension; on mismatch the previous
    /// contents are kept.
    pub fn replace(
        &self,
        index: &str,
        entries: Vec<(String, Vec<f32>)>,
    ) -> Result<(), VectorError> {
        let mut collection = Collection::default();
        for (id, vector) in entries {
            collection.check_dimension(&vector)?;
            collection.dimension = Some(vector.len());
            collection.entries.push((id, vector));
        }

        self.collections
            .write()
            .insert(index.to_string(), collection);
        Ok(())
    }

    /// Insert or overwrite a single entry, creating `index` if needed.
    ///
    /// Overwriting keeps the entry's original insertion position.
    pub fn upsert(
        &self,
        index: &str,
        id: impl Into<String>,
        vector: Vec<f32>,
    ) -> Result<(), VectorError> {
        let id = id.into();
        let mut collections = self.collections.write();
        let collection = collections.entry(index.to_string()).or_default();
        collection.check_dimension(&vector)?;
        collection.dimension = Some(vector.len());

        match collection.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = vector,
            None => collection.entries.push((id, vector)),
        }
        Ok(())
    }

    /// Number of entries in `index`, or `None` if it does not exist
    pub fn len(&self, index: &str) -> Option<usize> {
        self.collections.read().get(index).map(|c| c.entries.len())
    }

    /// Index names, sorted
    pub fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Synchronous scan behind [`VectorIndex::query_nearest`]
    pub fn nearest(
        &self,
        index: &str,
        vector: &[f32],
        k: usize,
        include_distances: bool,
    ) -> Result<Vec<Neighbor>, VectorError> {
        let collections = self.collections.read();
        let collection = collections
            .get(index)
            .ok_or_else(|| VectorError::UnknownIndex(index.to_string()))?;

        if collection.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        collection.check_dimension(vector)?;

        let mut scored: Vec<(f32, &str)> = collection
            .entries
            .iter()
            .map(|(id, stored)| (l2_distance(stored, vector), id.as_str()))
            .collect();

        // stable: equal distances keep insertion order
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(distance, id)| Neighbor::new(id, include_distances.then_some(distance)))
            .collect())
    }
}

impl VectorIndex for InMemoryVectorIndex {
    async fn query_nearest(
        &self,
        index: &str,
        vector: &[f32],
        k: usize,
        include_distances: bool,
    ) -> Result<Vec<Neighbor>, VectorError> {
        self.nearest(index, vector, k, include_distances)
    }
}
