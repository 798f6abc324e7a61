//! Question-to-ad selection through the engine.

use crate::common::{CATEGORY_INDEX, QueryCall, ScriptedEmbedder, ScriptedIndex};
use adlens::{AdEngine, Catalog, CategoryId, CompanyId, MetricsStore, Settings};
use std::sync::Arc;

const QUESTION: &str = "What are the first-line options for HR+ breast cancer?";

fn engine_with(
    catalog: Catalog,
    neighbors: Vec<(&str, Option<f32>)>,
) -> AdEngine<ScriptedEmbedder, ScriptedIndex> {
    let embedder = ScriptedEmbedder::new(3).with(QUESTION, vec![0.0, 0.6, 0.8]);
    let index = ScriptedIndex::new().answer(CATEGORY_INDEX, neighbors);
    AdEngine::new(
        Arc::new(catalog),
        MetricsStore::new(),
        embedder,
        index,
        Arc::new(Settings::default()),
    )
    .unwrap()
}

#[tokio::test]
async fn test_close_category_serves_first_ad_with_impression() {
    let engine = engine_with(Catalog::seeded(), vec![("breast-cancer", Some(0.3))]);

    let served = engine.select_ad_for_question(QUESTION).await.unwrap().unwrap();
    // ibrance precedes verzenio in catalog order
    assert_eq!(served.ad.id.as_str(), "ibrance_banner");
    assert_eq!(served.company_name, "Pfizer");

    let metrics = engine.metrics_for_ad("ibrance_banner").unwrap();
    assert_eq!(metrics.impressions, 1);
    assert_eq!(metrics.viewable_impressions, 0);
    assert_eq!(engine.metrics_for_ad("verzenio_banner").unwrap().impressions, 0);

    assert_eq!(
        engine.index().calls(),
        vec![QueryCall {
            index: CATEGORY_INDEX.to_string(),
            k: 1,
            include_distances: true,
        }]
    );
}

#[tokio::test]
async fn test_served_ad_serializes_flat() {
    let engine = engine_with(Catalog::seeded(), vec![("arthritis", Some(0.1))]);
    let served = engine.select_ad_for_question(QUESTION).await.unwrap().unwrap();

    let json = serde_json::to_value(&served).unwrap();
    assert_eq!(json["id"], "xeljanz_sidebar");
    assert_eq!(json["companyName"], "Pfizer");
    assert_eq!(json["companyId"], "pfizer");
}

#[tokio::test]
async fn test_distant_category_shows_nothing() {
    // ((1 - 1.96) + 1) / 2 = 0.02, under the 0.1 threshold
    let engine = engine_with(Catalog::seeded(), vec![("breast-cancer", Some(1.4))]);

    assert!(engine.select_ad_for_question(QUESTION).await.unwrap().is_none());
    assert!(engine.store().is_empty());
}

#[tokio::test]
async fn test_missing_distance_shows_nothing() {
    let engine = engine_with(Catalog::seeded(), vec![("breast-cancer", None)]);

    assert!(engine.select_ad_for_question(QUESTION).await.unwrap().is_none());
    assert!(engine.store().is_empty());
}

#[tokio::test]
async fn test_empty_index_shows_nothing() {
    let engine = engine_with(Catalog::seeded(), vec![]);
    assert!(engine.select_ad_for_question(QUESTION).await.unwrap().is_none());
}

#[tokio::test]
async fn test_category_without_ads_shows_nothing() {
    let engine = engine_with(Catalog::seeded(), vec![("psoriasis", Some(0.0))]);

    assert!(engine.select_ad_for_question(QUESTION).await.unwrap().is_none());
    assert!(engine.store().is_empty());
}

#[tokio::test]
async fn test_unrecognised_index_entry_shows_nothing() {
    let engine = engine_with(Catalog::seeded(), vec![("migraine", Some(0.0))]);
    assert!(engine.select_ad_for_question(QUESTION).await.unwrap().is_none());
}

#[tokio::test]
async fn test_only_best_neighbor_is_considered() {
    let catalog = Catalog::builder()
        .company(CompanyId::Gsk, "GSK")
        .category(CategoryId::Arthritis, "Arthritis")
        .ad("joint_banner", CompanyId::Gsk, [CategoryId::Arthritis], "/j.png", "Joints")
        .build()
        .unwrap();
    // the scripted index truncates to k, so the arthritis hit never arrives
    let engine = engine_with(
        catalog,
        vec![("psoriasis", Some(0.2)), ("arthritis", Some(0.0))],
    );

    assert!(engine.select_ad_for_question(QUESTION).await.unwrap().is_none());
    assert_eq!(engine.metrics_for_ad("joint_banner").unwrap().impressions, 0);
}

#[tokio::test]
async fn test_blank_question_is_a_validation_error() {
    let engine = engine_with(Catalog::seeded(), vec![("breast-cancer", Some(0.0))]);

    for question in ["", "   \n"] {
        let err = engine.select_ad_for_question(question).await.unwrap_err();
        assert!(err.is_validation());
    }
    assert_eq!(engine.embedder().calls(), 0);
    assert!(engine.index().calls().is_empty());
}

#[tokio::test]
async fn test_display_path_swallows_failures() {
    let engine = engine_with(Catalog::seeded(), vec![("breast-cancer", Some(0.0))]);

    engine.index().set_failing(true);
    let err = engine.select_ad_for_question(QUESTION).await.unwrap_err();
    assert!(err.is_upstream());
    assert!(engine.ad_for_display(QUESTION).await.is_none());

    engine.index().set_failing(false);
    engine.embedder().set_failing(true);
    assert!(engine.ad_for_display(QUESTION).await.is_none());
    assert!(engine.store().is_empty());
}
