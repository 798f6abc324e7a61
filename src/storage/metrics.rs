//! In-memory per-ad counters.
//!
//! Records are keyed by ad id and created with all counters at zero on first
//! access. Each mutation happens under the owning shard's lock, so a single
//! increment is never observed half-applied. Nothing here survives a restart.

use crate::error::{EngineError, EngineResult};
use crate::types::AdId;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};
use std::sync::Arc;

/// Raw counters for one ad, or the sum over several
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdMetrics {
    pub impressions: u64,
    pub viewable_impressions: u64,
    pub clicks: u64,
    /// Cumulative viewport time in seconds
    pub dwell_seconds: f64,
}

impl AddAssign for AdMetrics {
    fn add_assign(&mut self, rhs: Self) {
        self.impressions += rhs.impressions;
        self.viewable_impressions += rhs.viewable_impressions;
        self.clicks += rhs.clicks;
        self.dwell_seconds += rhs.dwell_seconds;
    }
}

impl Add for AdMetrics {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl std::iter::Sum for AdMetrics {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Shared, cloneable handle to the counter map.
///
/// Clones share the same counters; create a fresh store for isolation.
#[derive(Clone, Debug, Default)]
pub struct MetricsStore {
    counters: Arc<DashMap<AdId, AdMetrics>>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the counters for `ad`, creating a zeroed record if absent
    pub fn ensure(&self, ad: &AdId) -> AdMetrics {
        *self.counters.entry(ad.clone()).or_default()
    }

    /// Count one impression, and one viewable impression if `viewable`
    pub fn record_impression(&self, ad: &AdId, viewable: bool) {
        let mut entry = self.counters.entry(ad.clone()).or_default();
        entry.impressions += 1;
        if viewable {
            entry.viewable_impressions += 1;
        }
    }

    /// Count one click; clicks are accepted without a prior viewable impression
    pub fn record_click(&self, ad: &AdId) {
        self.counters.entry(ad.clone()).or_default().clicks += 1;
    }

    /// Add viewport time. Negative and non-finite durations are rejected.
    pub fn record_dwell(&self, ad: &AdId, seconds: f64) -> EngineResult<()> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(EngineError::validation(
                "dwell_seconds",
                format!("expected a non-negative duration, got {seconds}"),
            ));
        }
        self.counters.entry(ad.clone()).or_default().dwell_seconds += seconds;
        Ok(())
    }

    /// Snapshot without creating a record
    pub fn get(&self, ad: &str) -> Option<AdMetrics> {
        self.counters.get(ad).map(|entry| *entry)
    }

    /// Snapshot, treating an unknown ad as all zeros
    pub fn snapshot(&self, ad: &str) -> AdMetrics {
        self.get(ad).unwrap_or_default()
    }

    /// Clear every counter. Development and test hook.
    pub fn reset_all(&self) {
        self.counters.clear();
    }

    /// Number of ads with a counter record
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}
