//! Question to ad selection.

use crate::catalog::Catalog;
use crate::config::MatchingConfig;
use crate::error::{EngineError, EngineResult};
use crate::storage::MetricsStore;
use crate::types::{Ad, AdFilter, CategoryId};
use crate::vector::{EmbeddingGenerator, VectorIndex, question_similarity};
use serde::Serialize;
use tracing::{debug, info, warn};

/// The chosen ad plus its owner's display name
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdWithCompanyName {
    #[serde(flatten)]
    pub ad: Ad,
    pub company_name: String,
}

/// Picks an ad for a free-text question.
pub struct AdSelector<'a, E, I> {
    catalog: &'a Catalog,
    store: &'a MetricsStore,
    embedder: &'a E,
    index: &'a I,
    config: &'a MatchingConfig,
}

impl<'a, E, I> AdSelector<'a, E, I>
where
    E: EmbeddingGenerator,
    I: VectorIndex,
{
    pub fn new(
        catalog: &'a Catalog,
        store: &'a MetricsStore,
        embedder: &'a E,
        index: &'a I,
        config: &'a MatchingConfig,
    ) -> Self {
        Self {
            catalog,
            store,
            embedder,
            index,
            config,
        }
    }

    /// Find the closest ad category for `question` and serve its first ad.
    ///
    /// `Ok(None)` means no ad should be shown: the category index is empty,
    /// the best category scored under the threshold, or no ad targets it.
    /// A served ad gets one non-viewable impression.
    pub async fn select_ad_for_question(
        &self,
        question: &str,
    ) -> EngineResult<Option<AdWithCompanyName>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(EngineError::validation("question", "must not be empty"));
        }

        let vector = self
            .embedder
            .embed(question)
            .await
            .map_err(|e| EngineError::upstream("embedding", e))?;

        let neighbors = self
            .index
            .query_nearest(&self.config.ad_category_index, &vector, 1, true)
            .await
            .map_err(|e| EngineError::upstream("ad category index query", e))?;

        let Some(best) = neighbors.into_iter().next() else {
            info!("[selector] no category match for question: {question:?}");
            return Ok(None);
        };

        let similarity = question_similarity(best.distance);
        info!(
            "[selector] query: {question:?} | best match: {} | similarity: {similarity:.4}",
            best.id
        );

        if similarity < self.config.question_threshold {
            info!(
                "[selector] similarity below threshold {}, not showing ad",
                self.config.question_threshold
            );
            return Ok(None);
        }

        let category: CategoryId = match best.id.parse() {
            Ok(category) => category,
            Err(e) => {
                warn!("[selector] index entry is not a catalog category: {e}");
                return Ok(None);
            }
        };

        let Some(ad) = self.catalog.list_ads(AdFilter::category(category)).first().copied() else {
            warn!("[selector] category match found ({category}), but no ads are configured");
            return Ok(None);
        };

        self.store.record_impression(&ad.id, false);
        debug!("[selector] serving {} for {category}", ad.id);

        Ok(Some(AdWithCompanyName {
            ad: ad.clone(),
            company_name: self.catalog.company_name(ad.company_id),
        }))
    }
}
