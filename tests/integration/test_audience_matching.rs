//! Audience matcher behavior against scripted boundary doubles.

use crate::common::{PHYSICIAN_INDEX, QueryCall, ScriptedEmbedder, ScriptedIndex};
use adlens::vector::physician_similarity;
use adlens::{AdEngine, Catalog, CategoryId, CompanyId, EngineError, MetricsStore, Settings};
use std::sync::Arc;

fn engine(
    catalog: Catalog,
    index: ScriptedIndex,
) -> AdEngine<ScriptedEmbedder, ScriptedIndex> {
    let embedder = ScriptedEmbedder::new(2)
        .with("Breast Cancer", vec![1.0, 0.0])
        .with("Arthritis", vec![0.0, 1.0])
        .with("Pancreatic Cancer", vec![-1.0, 0.0]);
    AdEngine::new(
        Arc::new(catalog),
        MetricsStore::new(),
        embedder,
        index,
        Arc::new(Settings::default()),
    )
    .unwrap()
}

#[test]
fn test_similarity_is_bounded_with_fixed_endpoints() {
    assert_eq!(physician_similarity(Some(0.0)).get(), 1.0);
    assert!(physician_similarity(Some(2.0)).get().abs() < 1e-6);

    let mut d = 0.0_f32;
    while d <= 5.0 {
        let s = physician_similarity(Some(d)).get();
        assert!((0.0..=1.0).contains(&s), "distance {d} gave {s}");
        d += 0.05;
    }
}

#[tokio::test]
async fn test_matches_keep_index_order_and_query_shape() {
    // deliberately not sorted by distance: the index order wins
    let index = ScriptedIndex::new().answer(
        PHYSICIAN_INDEX,
        vec![
            ("dr-amara-okafor", Some(0.2)),
            ("dr-priya-natarajan", Some(0.9)),
            ("dr-lucas-brandt", Some(0.5)),
            ("dr-hannah-weiss", Some(1.0)),
        ],
    );
    let engine = engine(Catalog::seeded(), index);

    let matches = engine.match_physicians("verzenio_banner").await.unwrap();
    let ids: Vec<&str> = matches.iter().map(|m| m.physician.id.as_str()).collect();
    assert_eq!(ids, vec!["dr-amara-okafor", "dr-priya-natarajan", "dr-lucas-brandt"]);

    // 1 - 0.04/2 = 0.98 -> 0.99
    assert!((matches[0].similarity.get() - 0.99).abs() < 1e-6);

    assert_eq!(
        engine.index().calls(),
        vec![QueryCall {
            index: PHYSICIAN_INDEX.to_string(),
            k: 3,
            include_distances: true,
        }]
    );
    assert_eq!(engine.embedder().calls(), 1);
}

#[tokio::test]
async fn test_empty_category_list_is_not_found_without_embedding() {
    let catalog = Catalog::builder()
        .company(CompanyId::Genentech, "Genentech")
        .category(CategoryId::PancreaticCancer, "Pancreatic Cancer")
        .ad("untargeted", CompanyId::Genentech, Vec::<CategoryId>::new(), "/u.png", "Untargeted")
        .build()
        .unwrap();
    let engine = engine(catalog, ScriptedIndex::new());

    let err = engine.match_physicians("untargeted").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status_code(), "NOT_FOUND");
    assert_eq!(engine.embedder().calls(), 0);
    assert!(engine.index().calls().is_empty());
}

#[tokio::test]
async fn test_unknown_ad_is_not_found() {
    let engine = engine(Catalog::seeded(), ScriptedIndex::new());
    let err = engine.match_physicians("no_such_ad").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound { ref id, .. } if id == "no_such_ad"));
    assert_eq!(engine.embedder().calls(), 0);
}

#[tokio::test]
async fn test_zero_neighbors_is_an_empty_list() {
    let index = ScriptedIndex::new().answer(PHYSICIAN_INDEX, vec![]);
    let engine = engine(Catalog::seeded(), index);

    let matches = engine.match_physicians("ibrance_banner").await.unwrap();
    assert!(matches.is_empty());
}

#[tokio::test]
async fn test_catalog_drift_and_missing_distances() {
    let index = ScriptedIndex::new().answer(
        PHYSICIAN_INDEX,
        vec![
            ("dr-no-longer-listed", Some(0.1)),
            ("dr-lucas-brandt", None),
            ("dr-amara-okafor", Some(0.0)),
        ],
    );
    let engine = engine(Catalog::seeded(), index);

    let matches = engine.match_physicians("xeljanz_sidebar").await.unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].physician.id.as_str(), "dr-lucas-brandt");
    // no computable distance is never a perfect match
    assert_eq!(matches[0].similarity.get(), 0.0);
    assert_eq!(matches[1].similarity.get(), 1.0);
}

#[tokio::test]
async fn test_boundary_failures_are_upstream() {
    let index = ScriptedIndex::new().answer(PHYSICIAN_INDEX, vec![("dr-amara-okafor", Some(0.3))]);
    let engine = engine(Catalog::seeded(), index);

    engine.embedder().set_failing(true);
    let err = engine.match_physicians("ibrance_banner").await.unwrap_err();
    assert_eq!(err.status_code(), "UPSTREAM_FAILURE");
    assert!(engine.index().calls().is_empty());

    engine.embedder().set_failing(false);
    engine.index().set_failing(true);
    let err = engine.match_physicians("ibrance_banner").await.unwrap_err();
    assert!(err.is_upstream());

    // the lenient entry point degrades to an empty list
    assert!(engine.matches_for_display("ibrance_banner").await.is_empty());
}

#[tokio::test]
async fn test_audience_report_for_eli_lilly() {
    let index = ScriptedIndex::new().answer(
        PHYSICIAN_INDEX,
        vec![("dr-amara-okafor", Some(0.0)), ("dr-lucas-brandt", Some(2.0))],
    );
    let engine = engine(Catalog::seeded(), index);

    let report = engine.audience_report(CompanyId::EliLilly).await.unwrap();
    let categories: Vec<CategoryId> = report.categories.iter().map(|c| c.id).collect();
    assert_eq!(categories, vec![CategoryId::Arthritis, CategoryId::BreastCancer]);
    assert!(report.unmatched.is_empty());

    // the scripted index answers the same for both categories
    assert_eq!(report.rows.len(), 2);
    let okafor = &report.rows[0];
    assert_eq!(okafor.physician.id.as_str(), "dr-amara-okafor");
    assert_eq!(okafor.dollar_accuracy, Some(1.0));
    let brandt = &report.rows[1];
    assert!(brandt.dollar_accuracy.unwrap().abs() < 1e-6);

    // one match call per purchased category
    assert_eq!(engine.index().calls().len(), 2);
}

#[tokio::test]
async fn test_audience_report_unknown_company() {
    let catalog = Catalog::builder()
        .company(CompanyId::Pfizer, "Pfizer")
        .build()
        .unwrap();
    let engine = engine(catalog, ScriptedIndex::new());

    let err = engine.audience_report(CompanyId::Gsk).await.unwrap_err();
    assert!(err.is_not_found());
}
