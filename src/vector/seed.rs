//! Populate the in-memory indexes from the catalog.

use crate::catalog::Catalog;
use crate::config::MatchingConfig;
use crate::vector::{EmbeddingGenerator, InMemoryVectorIndex, VectorError};

/// How many entries each index received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub categories: usize,
    pub physicians: usize,
}

/// Embed every category label and physician description.
///
/// Category entries are keyed by category slug, physician entries by
/// physician id. Both indexes named in `matching` are replaced wholesale.
/// Nothing is written if any embedding fails.
pub async fn seed_indexes<E: EmbeddingGenerator>(
    catalog: &Catalog,
    embedder: &E,
    index: &InMemoryVectorIndex,
    matching: &MatchingConfig,
) -> Result<SeedSummary, VectorError> {
    let mut categories = Vec::with_capacity(catalog.list_categories().len());
    for category in catalog.list_categories() {
        let vector = embedder.embed(&category.label).await?;
        categories.push((category.id.as_str().to_string(), vector));
    }

    let mut physicians = Vec::with_capacity(catalog.list_physicians().len());
    for physician in catalog.list_physicians() {
        let vector = embedder.embed(&physician.description).await?;
        physicians.push((physician.id.as_str().to_string(), vector));
    }

    let summary = SeedSummary {
        categories: categories.len(),
        physicians: physicians.len(),
    };
    index.replace(&matching.ad_category_index, categories)?;
    index.replace(&matching.physician_index, physicians)?;

    tracing::info!(
        "[seed] {} categories into '{}', {} physicians into '{}'",
        summary.categories,
        matching.ad_category_index,
        summary.physicians,
        matching.physician_index
    );
    Ok(summary)
}
