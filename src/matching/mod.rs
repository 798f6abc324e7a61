//! Physician audience matching.
//!
//! An ad's primary category label is embedded and looked up in the physician
//! profile index. Distances come back as L2 on unit vectors and are turned
//! into a [0, 1] similarity with [`physician_similarity`].

use crate::catalog::Catalog;
use crate::config::MatchingConfig;
use crate::error::{EngineError, EngineResult, EntityKind};
use crate::types::{AdFilter, Category, CategoryId, Company, CompanyId, Physician};
use crate::vector::{EmbeddingGenerator, Score, VectorIndex, physician_similarity};
use serde::Serialize;
use tracing::{debug, warn};

/// A physician paired with how closely their profile fits an ad's category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicianMatch {
    pub physician: Physician,
    pub similarity: Score,
}

/// One physician's row in a company audience report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudienceRow {
    pub physician: Physician,
    /// Aligned with [`CompanyAudienceReport::categories`]
    pub similarities: Vec<Option<Score>>,
    /// Mean of the similarities that are present
    pub dollar_accuracy: Option<f32>,
}

/// Physician matches across every category a company purchased
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyAudienceReport {
    pub company: Company,
    pub categories: Vec<Category>,
    pub rows: Vec<AudienceRow>,
    /// Categories with no ad to match on, or whose match failed
    pub unmatched: Vec<CategoryId>,
}

/// Matches ads to physicians through the embedding boundary.
pub struct AudienceMatcher<'a, E, I> {
    catalog: &'a Catalog,
    embedder: &'a E,
    index: &'a I,
    config: &'a MatchingConfig,
}

impl<'a, E, I> AudienceMatcher<'a, E, I>
where
    E: EmbeddingGenerator,
    I: VectorIndex,
{
    pub fn new(
        catalog: &'a Catalog,
        embedder: &'a E,
        index: &'a I,
        config: &'a MatchingConfig,
    ) -> Self {
        Self {
            catalog,
            embedder,
            index,
            config,
        }
    }

    /// Nearest physicians for an ad's primary category, nearest first.
    ///
    /// Catalog problems are reported before the embedding boundary is called.
    /// Physician ids the catalog does not know are dropped.
    pub async fn match_physicians(&self, ad_id: &str) -> EngineResult<Vec<PhysicianMatch>> {
        let ad = self
            .catalog
            .ad(ad_id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Ad, ad_id, "no such ad in catalog"))?;
        let primary = ad.primary_category().ok_or_else(|| {
            EngineError::not_found(EntityKind::Ad, ad_id, "ad has no categories to match on")
        })?;
        let category = self.catalog.category(primary).ok_or_else(|| {
            EngineError::not_found(
                EntityKind::Category,
                primary.as_str(),
                "ad references a category missing from the catalog",
            )
        })?;

        let vector = self
            .embedder
            .embed(&category.label)
            .await
            .map_err(|e| EngineError::upstream("embedding", e))?;

        let neighbors = self
            .index
            .query_nearest(&self.config.physician_index, &vector, self.config.neighbors, true)
            .await
            .map_err(|e| EngineError::upstream("physician index query", e))?;

        let matches: Vec<PhysicianMatch> = neighbors
            .into_iter()
            .filter_map(|neighbor| match self.catalog.physician(&neighbor.id) {
                Some(physician) => Some(PhysicianMatch {
                    physician: physician.clone(),
                    similarity: physician_similarity(neighbor.distance),
                }),
                None => {
                    warn!(
                        "[matcher] index returned unknown physician '{}', skipping",
                        neighbor.id
                    );
                    None
                }
            })
            .collect();

        debug!(
            "[matcher] {ad_id} ({}) matched {} physicians",
            category.label,
            matches.len()
        );
        Ok(matches)
    }

    /// Match every category `company` purchased.
    ///
    /// Each category is matched through the first catalog ad targeting it.
    /// A category without an ad, or whose match fails, is logged and left
    /// empty instead of failing the report.
    pub async fn audience_report(&self, company: CompanyId) -> EngineResult<CompanyAudienceReport> {
        let company_record = self.catalog.company(company).cloned().ok_or_else(|| {
            EngineError::not_found(EntityKind::Company, company.as_str(), "no such company")
        })?;

        let categories: Vec<Category> = self
            .catalog
            .categories_for_company(company)
            .iter()
            .filter_map(|id| self.catalog.category(*id).cloned())
            .collect();

        let mut per_category: Vec<Vec<PhysicianMatch>> = Vec::with_capacity(categories.len());
        let mut unmatched = Vec::new();

        for category in &categories {
            let Some(ad) = self.catalog.list_ads(AdFilter::category(category.id)).first().copied() else {
                debug!("[matcher] no ad targets {}, column left empty", category.id);
                unmatched.push(category.id);
                per_category.push(Vec::new());
                continue;
            };

            match self.match_physicians(ad.id.as_str()).await {
                Ok(matches) => per_category.push(matches),
                Err(e) => {
                    warn!("[matcher] matching {} via {} failed: {e}", category.id, ad.id);
                    unmatched.push(category.id);
                    per_category.push(Vec::new());
                }
            }
        }

        // distinct physicians in first-seen order
        let mut physicians: Vec<&Physician> = Vec::new();
        for m in per_category.iter().flatten() {
            if !physicians.iter().any(|p| p.id == m.physician.id) {
                physicians.push(&m.physician);
            }
        }

        let rows = physicians
            .into_iter()
            .map(|physician| {
                let similarities: Vec<Option<Score>> = per_category
                    .iter()
                    .map(|matches| {
                        matches
                            .iter()
                            .find(|m| m.physician.id == physician.id)
                            .map(|m| m.similarity)
                    })
                    .collect();
                AudienceRow {
                    physician: physician.clone(),
                    dollar_accuracy: mean(&similarities),
                    similarities,
                }
            })
            .collect();

        Ok(CompanyAudienceReport {
            company: company_record,
            categories,
            rows,
            unmatched,
        })
    }
}

fn mean(similarities: &[Option<Score>]) -> Option<f32> {
    let present: Vec<f32> = similarities.iter().flatten().map(Score::get).collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f32>() / present.len() as f32)
    }
}
