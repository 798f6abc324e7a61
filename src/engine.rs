//! The engine facade handed to route handlers and the CLI.
//!
//! `AdEngine` owns the catalog, the metrics store, the embedding generator and
//! the vector index. All of them are built once at startup and borrowed by
//! the matcher and the selector on each call.

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::error::{EngineError, EngineResult, EntityKind};
use crate::insights::{AdInsight, InsightCalculator, LeaderboardEntry, RankBy};
use crate::matching::{AudienceMatcher, CompanyAudienceReport, PhysicianMatch};
use crate::selection::{AdSelector, AdWithCompanyName};
use crate::simulator::{SimulatorHandle, TrafficSimulator};
use crate::storage::{AdMetrics, MetricsStore};
use crate::types::{Ad, CategoryId, CompanyId};
use crate::vector::{
    EmbeddingGenerator, InMemoryVectorIndex, SeedSummary, VectorIndex, seed_indexes,
};
use std::sync::Arc;
use tracing::warn;

pub struct AdEngine<E, I> {
    catalog: Arc<Catalog>,
    store: MetricsStore,
    embedder: E,
    index: I,
    settings: Arc<Settings>,
}

impl<E, I> AdEngine<E, I>
where
    E: EmbeddingGenerator,
    I: VectorIndex,
{
    /// Assemble an engine, rejecting invalid settings up front
    pub fn new(
        catalog: Arc<Catalog>,
        store: MetricsStore,
        embedder: E,
        index: I,
        settings: Arc<Settings>,
    ) -> EngineResult<Self> {
        settings.validate()?;
        Ok(Self {
            catalog,
            store,
            embedder,
            index,
            settings,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &MetricsStore {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    fn known_ad(&self, ad_id: &str) -> EngineResult<&Ad> {
        self.catalog
            .ad(ad_id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Ad, ad_id, "no such ad in catalog"))
    }

    fn insights(&self) -> InsightCalculator<'_> {
        InsightCalculator::new(&self.catalog, &self.store)
    }

    // Metrics write hooks

    pub fn record_impression(&self, ad_id: &str, viewable: bool) -> EngineResult<()> {
        let ad = self.known_ad(ad_id)?;
        self.store.record_impression(&ad.id, viewable);
        Ok(())
    }

    pub fn record_click(&self, ad_id: &str) -> EngineResult<()> {
        let ad = self.known_ad(ad_id)?;
        self.store.record_click(&ad.id);
        Ok(())
    }

    pub fn record_dwell(&self, ad_id: &str, seconds: f64) -> EngineResult<()> {
        let ad = self.known_ad(ad_id)?;
        self.store.record_dwell(&ad.id, seconds)
    }

    /// Clear all counters. Development and test hook.
    pub fn reset_metrics(&self) {
        self.store.reset_all();
    }

    // Read queries

    pub fn metrics_for_ad(&self, ad_id: &str) -> EngineResult<AdMetrics> {
        self.known_ad(ad_id)?;
        Ok(self.insights().metrics_for_ad(ad_id))
    }

    pub fn metrics_for_company(&self, company: CompanyId) -> AdMetrics {
        self.insights().metrics_for_company(company)
    }

    pub fn metrics_for_category(&self, category: CategoryId) -> AdMetrics {
        self.insights().metrics_for_category(category)
    }

    pub fn insight_for_ad(&self, ad_id: &str) -> EngineResult<AdInsight> {
        self.known_ad(ad_id)?;
        Ok(self.insights().insight_for_ad(ad_id))
    }

    pub fn insight_for_company(&self, company: CompanyId) -> AdInsight {
        self.insights().insight_for_company(company)
    }

    pub fn insight_for_category(&self, category: CategoryId) -> AdInsight {
        self.insights().insight_for_category(category)
    }

    pub fn top_ads_by_ctr(&self, limit: usize) -> Vec<LeaderboardEntry> {
        self.insights().top_by_ctr(limit)
    }

    pub fn top_ads_by_viewability(&self, limit: usize) -> Vec<LeaderboardEntry> {
        self.insights().top_by_viewability(limit)
    }

    pub fn top_ads(&self, rank_by: RankBy, limit: usize) -> Vec<LeaderboardEntry> {
        self.insights().top_by(rank_by, limit)
    }

    // Matching and selection

    fn matcher(&self) -> AudienceMatcher<'_, E, I> {
        AudienceMatcher::new(
            &self.catalog,
            &self.embedder,
            &self.index,
            &self.settings.matching,
        )
    }

    pub async fn match_physicians(&self, ad_id: &str) -> EngineResult<Vec<PhysicianMatch>> {
        self.matcher().match_physicians(ad_id).await
    }

    pub async fn audience_report(&self, company: CompanyId) -> EngineResult<CompanyAudienceReport> {
        self.matcher().audience_report(company).await
    }

    pub async fn select_ad_for_question(
        &self,
        question: &str,
    ) -> EngineResult<Option<AdWithCompanyName>> {
        AdSelector::new(
            &self.catalog,
            &self.store,
            &self.embedder,
            &self.index,
            &self.settings.matching,
        )
        .select_ad_for_question(question)
        .await
    }

    /// Like [`Self::select_ad_for_question`], but any failure means no ad
    pub async fn ad_for_display(&self, question: &str) -> Option<AdWithCompanyName> {
        match self.select_ad_for_question(question).await {
            Ok(ad) => ad,
            Err(e) => {
                warn!("[engine] ad selection failed ({}): {e}", e.status_code());
                None
            }
        }
    }

    /// Like [`Self::match_physicians`], but any failure means no matches
    pub async fn matches_for_display(&self, ad_id: &str) -> Vec<PhysicianMatch> {
        match self.match_physicians(ad_id).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!("[engine] physician matching for {ad_id} failed ({}): {e}", e.status_code());
                Vec::new()
            }
        }
    }

    // Traffic

    /// A simulator over this engine's catalog and store
    pub fn traffic_simulator(&self) -> EngineResult<TrafficSimulator> {
        TrafficSimulator::new(
            &self.catalog,
            self.store.clone(),
            self.settings.simulator.clone(),
        )
    }

    /// Start simulated traffic on the configured interval.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_traffic_simulator(&self) -> EngineResult<SimulatorHandle> {
        Ok(self.traffic_simulator()?.start())
    }
}

impl<E: EmbeddingGenerator> AdEngine<E, InMemoryVectorIndex> {
    /// Embed the catalog into the in-memory indexes
    pub async fn seed_indexes(&self) -> EngineResult<SeedSummary> {
        seed_indexes(
            &self.catalog,
            &self.embedder,
            &self.index,
            &self.settings.matching,
        )
        .await
        .map_err(|e| EngineError::upstream("index seeding", e))
    }
}
