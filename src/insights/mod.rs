//! Derived KPIs over the metrics store.
//!
//! Ratios are recomputed on every read and never cached. Roll-ups sum the raw
//! counters first and derive ratios from the totals, so a low-volume ad does
//! not weigh as much as a high-volume one.

use crate::catalog::Catalog;
use crate::storage::{AdMetrics, MetricsStore};
use crate::types::{Ad, AdFilter, CategoryId, CompanyId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw counters plus their derived ratios
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdInsight {
    #[serde(flatten)]
    pub metrics: AdMetrics,
    /// clicks / impressions
    pub ctr: f64,
    /// viewable impressions / impressions
    pub viewability_rate: f64,
    /// dwell seconds / viewable impressions
    pub avg_dwell: f64,
}

/// Derive ratios from raw counters; a zero denominator yields 0
pub fn to_insight(metrics: AdMetrics) -> AdInsight {
    AdInsight {
        metrics,
        ctr: ratio(metrics.clicks as f64, metrics.impressions),
        viewability_rate: ratio(metrics.viewable_impressions as f64, metrics.impressions),
        avg_dwell: ratio(metrics.dwell_seconds, metrics.viewable_impressions),
    }
}

fn ratio(numerator: f64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

/// Which derived ratio a leaderboard ranks on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RankBy {
    Ctr,
    Viewability,
}

impl RankBy {
    fn value(&self, insight: &AdInsight) -> f64 {
        match self {
            Self::Ctr => insight.ctr,
            Self::Viewability => insight.viewability_rate,
        }
    }
}

impl fmt::Display for RankBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ctr => f.write_str("ctr"),
            Self::Viewability => f.write_str("viewability"),
        }
    }
}

impl FromStr for RankBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ctr" => Ok(Self::Ctr),
            "viewability" | "viewability-rate" => Ok(Self::Viewability),
            other => Err(format!(
                "unknown ranking '{other}', expected 'ctr' or 'viewability'"
            )),
        }
    }
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    #[serde(flatten)]
    pub ad: Ad,
    pub rank_by: RankBy,
    pub value: f64,
}

/// Read-side view joining the catalog with the metrics store
#[derive(Debug, Clone, Copy)]
pub struct InsightCalculator<'a> {
    catalog: &'a Catalog,
    store: &'a MetricsStore,
}

impl<'a> InsightCalculator<'a> {
    pub fn new(catalog: &'a Catalog, store: &'a MetricsStore) -> Self {
        Self { catalog, store }
    }

    /// Counters for one ad; an ad with no recorded events reads as zeros
    pub fn metrics_for_ad(&self, ad: &str) -> AdMetrics {
        self.store.snapshot(ad)
    }

    /// Element-wise sum over every ad the company owns
    pub fn metrics_for_company(&self, company: CompanyId) -> AdMetrics {
        self.sum_over(AdFilter::company(company))
    }

    /// Element-wise sum over every ad whose category list contains `category`
    pub fn metrics_for_category(&self, category: CategoryId) -> AdMetrics {
        self.sum_over(AdFilter::category(category))
    }

    pub fn insight_for_ad(&self, ad: &str) -> AdInsight {
        to_insight(self.metrics_for_ad(ad))
    }

    pub fn insight_for_company(&self, company: CompanyId) -> AdInsight {
        to_insight(self.metrics_for_company(company))
    }

    pub fn insight_for_category(&self, category: CategoryId) -> AdInsight {
        to_insight(self.metrics_for_category(category))
    }

    pub fn top_by_ctr(&self, limit: usize) -> Vec<LeaderboardEntry> {
        self.top_by(RankBy::Ctr, limit)
    }

    pub fn top_by_viewability(&self, limit: usize) -> Vec<LeaderboardEntry> {
        self.top_by(RankBy::Viewability, limit)
    }

    /// Rank a snapshot of all ads by the chosen ratio, descending.
    ///
    /// The sort is stable, so ties keep catalog order. The catalog itself is
    /// never reordered.
    pub fn top_by(&self, rank_by: RankBy, limit: usize) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .catalog
            .ads()
            .iter()
            .map(|ad| LeaderboardEntry {
                value: rank_by.value(&self.insight_for_ad(ad.id.as_str())),
                ad: ad.clone(),
                rank_by,
            })
            .collect();

        entries.sort_by(|a, b| b.value.total_cmp(&a.value));
        entries.truncate(limit);
        entries
    }

    fn sum_over(&self, filter: AdFilter) -> AdMetrics {
        self.catalog
            .list_ads(filter)
            .into_iter()
            .map(|ad| self.store.snapshot(ad.id.as_str()))
            .sum()
    }
}
