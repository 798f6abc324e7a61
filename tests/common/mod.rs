//! Shared doubles for the embedding boundary.
#![allow(dead_code)]

use adlens::vector::{EmbeddingGenerator, Neighbor, VectorDimension, VectorError, VectorIndex};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Returns fixed vectors for known texts and fails for anything else.
pub struct ScriptedEmbedder {
    dimension: usize,
    vectors: HashMap<String, Vec<f32>>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: HashMap::new(),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        assert_eq!(vector.len(), self.dimension, "scripted vector has wrong size");
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingGenerator for ScriptedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, VectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(VectorError::EmbeddingFailed("transport closed".into()));
        }
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| VectorError::EmbeddingFailed(format!("no script for {text:?}")))
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(self.dimension).expect("non-zero test dimension")
    }
}

/// One recorded `query_nearest` call
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCall {
    pub index: String,
    pub k: usize,
    pub include_distances: bool,
}

/// Answers every query on an index with a fixed neighbor list, ignoring the
/// query vector. Lists are truncated to `k` like a real index would.
#[derive(Default)]
pub struct ScriptedIndex {
    answers: HashMap<String, Vec<Neighbor>>,
    fail: AtomicBool,
    calls: Mutex<Vec<QueryCall>>,
}

impl ScriptedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, index: &str, neighbors: Vec<(&str, Option<f32>)>) -> Self {
        self.answers.insert(
            index.to_string(),
            neighbors
                .into_iter()
                .map(|(id, distance)| Neighbor::new(id, distance))
                .collect(),
        );
        self
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<QueryCall> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl VectorIndex for ScriptedIndex {
    async fn query_nearest(
        &self,
        index: &str,
        _vector: &[f32],
        k: usize,
        include_distances: bool,
    ) -> Result<Vec<Neighbor>, VectorError> {
        self.calls.lock().expect("calls lock").push(QueryCall {
            index: index.to_string(),
            k,
            include_distances,
        });
        if self.fail.load(Ordering::SeqCst) {
            return Err(VectorError::QueryFailed("index unavailable".into()));
        }

        let mut neighbors = self.answers.get(index).cloned().unwrap_or_default();
        neighbors.truncate(k);
        if !include_distances {
            for n in &mut neighbors {
                n.distance = None;
            }
        }
        Ok(neighbors)
    }
}

pub const PHYSICIAN_INDEX: &str = "mock_physician_profiles";
pub const CATEGORY_INDEX: &str = "mock_ad_cat_data";
