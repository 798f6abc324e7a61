//! Identifiers and immutable catalog records.
//!
//! Company and category identifiers come from closed enumerations and
//! serialize as the kebab-case slugs the dashboard routes use
//! (`eli-lilly`, `breast-cancer`). Ads and physicians carry string ids.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Advertiser identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompanyId {
    Pfizer,
    Genentech,
    Gsk,
    EliLilly,
}

impl CompanyId {
    pub const ALL: [CompanyId; 4] = [Self::Pfizer, Self::Genentech, Self::Gsk, Self::EliLilly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pfizer => "pfizer",
            Self::Genentech => "genentech",
            Self::Gsk => "gsk",
            Self::EliLilly => "eli-lilly",
        }
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompanyId {
    type Err = UnknownSlug;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownSlug(s.to_string()))
    }
}

/// Therapeutic area an ad can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryId {
    PancreaticCancer,
    BreastCancer,
    Arthritis,
    AtrialFibrillation,
    NonSmallCellLungCancer,
    Psoriasis,
    #[serde(rename = "type-2-diabetes")]
    Type2Diabetes,
}

impl CategoryId {
    pub const ALL: [CategoryId; 7] = [
        Self::PancreaticCancer,
        Self::BreastCancer,
        Self::Arthritis,
        Self::AtrialFibrillation,
        Self::NonSmallCellLungCancer,
        Self::Psoriasis,
        Self::Type2Diabetes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PancreaticCancer => "pancreatic-cancer",
            Self::BreastCancer => "breast-cancer",
            Self::Arthritis => "arthritis",
            Self::AtrialFibrillation => "atrial-fibrillation",
            Self::NonSmallCellLungCancer => "non-small-cell-lung-cancer",
            Self::Psoriasis => "psoriasis",
            Self::Type2Diabetes => "type-2-diabetes",
        }
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryId {
    type Err = UnknownSlug;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownSlug(s.to_string()))
    }
}

/// Returned when a slug does not name a known company or category
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown identifier '{0}'")]
pub struct UnknownSlug(pub String);

/// Ad identifier, e.g. `ibrance_banner`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdId(String);

impl AdId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AdId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Borrow<str> for AdId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Physician identifier, also the entry id in the physician vector index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhysicianId(String);

impl PhysicianId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhysicianId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhysicianId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Borrow<str> for PhysicianId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    /// Used verbatim as embedding input
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ad {
    pub id: AdId,
    pub company_id: CompanyId,
    /// Targeted categories; the first one is the primary category for matching
    pub category_ids: Vec<CategoryId>,
    pub creative_url: String,
    pub headline: String,
}

impl Ad {
    pub fn primary_category(&self) -> Option<CategoryId> {
        self.category_ids.first().copied()
    }

    pub fn targets(&self, category: CategoryId) -> bool {
        self.category_ids.contains(&category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Physician {
    pub id: PhysicianId,
    pub name: String,
    pub title: String,
    /// Profile text that gets embedded into the physician index
    pub description: String,
}

/// A question shown on the landing page under a sponsor's name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsoredQuestion {
    pub id: String,
    pub company_id: CompanyId,
    pub question: String,
}

/// Optional restriction for [`crate::Catalog::list_ads`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdFilter {
    pub company: Option<CompanyId>,
    pub category: Option<CategoryId>,
}

impl AdFilter {
    pub fn company(company: CompanyId) -> Self {
        Self {
            company: Some(company),
            category: None,
        }
    }

    pub fn category(category: CategoryId) -> Self {
        Self {
            company: None,
            category: Some(category),
        }
    }

    pub fn matches(&self, ad: &Ad) -> bool {
        self.company.is_none_or(|c| ad.company_id == c)
            && self.category.is_none_or(|c| ad.targets(c))
    }
}
