//! Static registries of companies, categories, ads and physicians.
//!
//! The catalog is read-only once built. Every listing preserves the order the
//! records were supplied in, which the leaderboards and the ad selector rely
//! on for tie-breaking.

mod seed;

use crate::error::{EngineError, EngineResult};
use crate::types::{
    Ad, AdFilter, AdId, Category, CategoryId, Company, CompanyId, Physician, PhysicianId,
    SponsoredQuestion,
};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::HashSet;

/// Read-only catalog of everything the engine knows about
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    companies: Vec<Company>,
    categories: Vec<Category>,
    ads: Vec<Ad>,
    physicians: Vec<Physician>,
    /// Which categories each company has purchased
    purchases: Vec<(CompanyId, Vec<CategoryId>)>,
    sponsored_questions: Vec<SponsoredQuestion>,
}

impl Catalog {
    /// Start building a catalog from explicit records
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// The built-in demo catalog
    pub fn seeded() -> Self {
        seed::demo_catalog()
    }

    pub fn list_companies(&self) -> &[Company] {
        &self.companies
    }

    pub fn list_categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn list_physicians(&self) -> &[Physician] {
        &self.physicians
    }

    pub fn list_sponsored_questions(&self) -> &[SponsoredQuestion] {
        &self.sponsored_questions
    }

    /// All ads in catalog order
    pub fn ads(&self) -> &[Ad] {
        &self.ads
    }

    /// Ads matching the filter, in catalog order
    pub fn list_ads(&self, filter: AdFilter) -> Vec<&Ad> {
        self.ads.iter().filter(|ad| filter.matches(ad)).collect()
    }

    pub fn company(&self, id: CompanyId) -> Option<&Company> {
        self.companies.iter().find(|c| c.id == id)
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn ad(&self, id: &str) -> Option<&Ad> {
        self.ads.iter().find(|ad| ad.id.as_str() == id)
    }

    pub fn physician(&self, id: &str) -> Option<&Physician> {
        self.physicians.iter().find(|p| p.id.as_str() == id)
    }

    /// Categories the company has purchased; empty for companies with no purchases
    pub fn categories_for_company(&self, id: CompanyId) -> &[CategoryId] {
        self.purchases
            .iter()
            .find(|(company, _)| *company == id)
            .map(|(_, categories)| categories.as_slice())
            .unwrap_or_default()
    }

    /// Companies that purchased the category, in purchase-map order
    pub fn companies_for_category(&self, category: CategoryId) -> Vec<CompanyId> {
        self.purchases
            .iter()
            .filter(|(_, categories)| categories.contains(&category))
            .map(|(company, _)| *company)
            .collect()
    }

    /// Display name for a company, falling back to its slug
    pub fn company_name(&self, id: CompanyId) -> String {
        self.company(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Random sample of up to `n` sponsored questions, without replacement
    pub fn sample_sponsored_questions<R: Rng + ?Sized>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> Vec<&SponsoredQuestion> {
        self.sponsored_questions
            .choose_multiple(rng, n)
            .collect()
    }
}

/// Collects catalog records and validates them on [`CatalogBuilder::build`]
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    inner: Catalog,
}

impl CatalogBuilder {
    pub fn company(mut self, id: CompanyId, name: impl Into<String>) -> Self {
        self.inner.companies.push(Company {
            id,
            name: name.into(),
        });
        self
    }

    pub fn category(mut self, id: CategoryId, label: impl Into<String>) -> Self {
        self.inner.categories.push(Category {
            id,
            label: label.into(),
        });
        self
    }

    pub fn ad(
        mut self,
        id: impl Into<String>,
        company: CompanyId,
        categories: impl IntoIterator<Item = CategoryId>,
        creative_url: impl Into<String>,
        headline: impl Into<String>,
    ) -> Self {
        self.inner.ads.push(Ad {
            id: AdId::new(id),
            company_id: company,
            category_ids: categories.into_iter().collect(),
            creative_url: creative_url.into(),
            headline: headline.into(),
        });
        self
    }

    pub fn physician(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.inner.physicians.push(Physician {
            id: PhysicianId::new(id),
            name: name.into(),
            title: title.into(),
            description: description.into(),
        });
        self
    }

    pub fn purchase(
        mut self,
        company: CompanyId,
        categories: impl IntoIterator<Item = CategoryId>,
    ) -> Self {
        self.inner
            .purchases
            .push((company, categories.into_iter().collect()));
        self
    }

    pub fn sponsored_question(
        mut self,
        id: impl Into<String>,
        company: CompanyId,
        question: impl Into<String>,
    ) -> Self {
        self.inner.sponsored_questions.push(SponsoredQuestion {
            id: id.into(),
            company_id: company,
            question: question.into(),
        });
        self
    }

    /// Validate id uniqueness and produce the catalog.
    ///
    /// Ads with an empty category list are accepted; the audience matcher
    /// reports them as not found.
    pub fn build(self) -> EngineResult<Catalog> {
        let catalog = self.inner;

        ensure_unique("company id", catalog.companies.iter().map(|c| c.id.to_string()))?;
        ensure_unique("category id", catalog.categories.iter().map(|c| c.id.to_string()))?;
        ensure_unique("ad id", catalog.ads.iter().map(|a| a.id.to_string()))?;
        ensure_unique("physician id", catalog.physicians.iter().map(|p| p.id.to_string()))?;
        ensure_unique("purchase company", catalog.purchases.iter().map(|(c, _)| c.to_string()))?;

        Ok(catalog)
    }
}

fn ensure_unique(field: &'static str, ids: impl Iterator<Item = String>) -> EngineResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.clone()) {
            return Err(EngineError::validation(field, format!("duplicate '{id}'")));
        }
    }
    Ok(())
}
