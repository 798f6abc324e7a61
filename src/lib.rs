//! Ad analytics and audience matching.
//!
//! An in-memory metrics store with derived KPIs, a synthetic traffic
//! generator, and embedding-based matching of ads to physician audiences and
//! of free-text questions to ads.

pub mod catalog;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod insights;
pub mod matching;
pub mod selection;
pub mod simulator;
pub mod storage;
pub mod types;
pub mod vector;

// Explicit exports for better API clarity
pub use catalog::{Catalog, CatalogBuilder};
pub use config::Settings;
pub use engine::AdEngine;
pub use error::{EngineError, EngineResult, EntityKind};
pub use insights::{AdInsight, InsightCalculator, LeaderboardEntry, RankBy, to_insight};
pub use matching::{AudienceMatcher, AudienceRow, CompanyAudienceReport, PhysicianMatch};
pub use selection::{AdSelector, AdWithCompanyName};
pub use simulator::{
    IntervalTicks, ManualTicker, ManualTicks, SimulatorHandle, TickSource, TrafficSimulator,
};
pub use storage::{AdMetrics, MetricsStore};
pub use types::{
    Ad, AdFilter, AdId, Category, CategoryId, Company, CompanyId, Physician, PhysicianId,
    SponsoredQuestion,
};
pub use vector::{
    EmbeddingGenerator, FastEmbedGenerator, InMemoryVectorIndex, Neighbor, Score, VectorError,
    VectorIndex,
};
