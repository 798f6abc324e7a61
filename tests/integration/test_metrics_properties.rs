//! Metrics store and insight invariants through the public API.

use crate::common::{ScriptedEmbedder, ScriptedIndex};
use adlens::{
    AdEngine, AdInsight, AdMetrics, Catalog, CategoryId, CompanyId, MetricsStore, Settings,
    TrafficSimulator,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn engine_with(catalog: Catalog) -> AdEngine<ScriptedEmbedder, ScriptedIndex> {
    AdEngine::new(
        Arc::new(catalog),
        MetricsStore::new(),
        ScriptedEmbedder::new(2),
        ScriptedIndex::new(),
        Arc::new(Settings::default()),
    )
    .unwrap()
}

fn seed_counts(engine: &AdEngine<ScriptedEmbedder, ScriptedIndex>, ad: &str, impressions: u64, clicks: u64) {
    for _ in 0..impressions {
        engine.record_impression(ad, true).unwrap();
    }
    for _ in 0..clicks {
        engine.record_click(ad).unwrap();
    }
}

#[test]
fn test_viewable_never_exceeds_impressions() {
    let engine = engine_with(Catalog::seeded());
    let ids: Vec<String> = engine.catalog().ads().iter().map(|a| a.id.to_string()).collect();
    let mut rng = StdRng::seed_from_u64(2024);

    for _ in 0..2_000 {
        let ad = &ids[rng.random_range(0..ids.len())];
        engine.record_impression(ad, rng.random_bool(0.5)).unwrap();

        let m = engine.metrics_for_ad(ad).unwrap();
        assert!(m.viewable_impressions <= m.impressions);
    }
}

#[test]
fn test_fresh_ad_has_zero_ratios() {
    let engine = engine_with(Catalog::seeded());
    let insight = engine.insight_for_ad("krazati_interstitial").unwrap();

    assert_eq!(insight.ctr, 0.0);
    assert_eq!(insight.viewability_rate, 0.0);
    assert_eq!(insight.avg_dwell, 0.0);
    assert_eq!(insight, AdInsight::default());
    // reading does not create a record
    assert!(engine.store().get("krazati_interstitial").is_none());
}

#[test]
fn test_ctr_viewability_dwell_scenario() {
    let engine = engine_with(Catalog::seeded());
    let ad = "ibrance_banner";
    for i in 0..100 {
        engine.record_impression(ad, i < 80).unwrap();
    }
    for _ in 0..5 {
        engine.record_click(ad).unwrap();
    }
    for _ in 0..80 {
        engine.record_dwell(ad, 2.0).unwrap();
    }

    let insight = engine.insight_for_ad(ad).unwrap();
    assert!((insight.ctr - 0.05).abs() < 1e-12);
    assert!((insight.viewability_rate - 0.80).abs() < 1e-12);
    assert!((insight.avg_dwell - 2.0).abs() < 1e-12);
}

#[test]
fn test_rollups_equal_sum_of_owned_ads() {
    let engine = engine_with(Catalog::seeded());
    let simulator = TrafficSimulator::new(
        engine.catalog(),
        engine.store().clone(),
        Settings::default().simulator,
    )
    .unwrap();
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..20 {
        simulator.tick(&mut rng);
    }

    for company in CompanyId::ALL {
        let expected: AdMetrics = engine
            .catalog()
            .ads()
            .iter()
            .filter(|ad| ad.company_id == company)
            .map(|ad| engine.metrics_for_ad(ad.id.as_str()).unwrap())
            .sum();
        assert_eq!(engine.metrics_for_company(company), expected, "{company}");
    }

    for category in CategoryId::ALL {
        let expected: AdMetrics = engine
            .catalog()
            .ads()
            .iter()
            .filter(|ad| ad.targets(category))
            .map(|ad| engine.metrics_for_ad(ad.id.as_str()).unwrap())
            .sum();
        assert_eq!(engine.metrics_for_category(category), expected, "{category}");
    }
}

#[test]
fn test_top_two_by_ctr_with_tie() {
    let engine = engine_with(Catalog::seeded());
    // catalog order: ibrance, xeljanz, krazati, keytruda, verzenio
    seed_counts(&engine, "ibrance_banner", 100, 2); // 0.02
    seed_counts(&engine, "xeljanz_sidebar", 100, 7); // 0.07
    seed_counts(&engine, "krazati_interstitial", 50, 1); // 0.02
    seed_counts(&engine, "keytruda_banner", 100, 9); // 0.09
    seed_counts(&engine, "verzenio_banner", 200, 18); // 0.09

    let top = engine.top_ads_by_ctr(2);
    let ids: Vec<&str> = top.iter().map(|e| e.ad.id.as_str()).collect();
    assert_eq!(ids, vec!["keytruda_banner", "verzenio_banner"]);
    assert!(top[0].value >= top[1].value);

    let ordered: Vec<&str> = engine.catalog().ads().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ordered[0], "ibrance_banner");
}

#[test]
fn test_top_by_viewability_uses_viewable_share() {
    let engine = engine_with(Catalog::seeded());
    engine.record_impression("xeljanz_sidebar", true).unwrap();
    engine.record_impression("xeljanz_sidebar", false).unwrap();
    engine.record_impression("verzenio_banner", true).unwrap();

    let top = engine.top_ads_by_viewability(2);
    assert_eq!(top[0].ad.id.as_str(), "verzenio_banner");
    assert_eq!(top[0].value, 1.0);
    assert_eq!(top[1].ad.id.as_str(), "xeljanz_sidebar");
    assert_eq!(top[1].value, 0.5);
}

#[test]
fn test_negative_dwell_rejected_without_side_effects() {
    let engine = engine_with(Catalog::seeded());
    let err = engine.record_dwell("verzenio_banner", -3.0).unwrap_err();
    assert_eq!(err.status_code(), "VALIDATION_ERROR");
    assert_eq!(engine.metrics_for_ad("verzenio_banner").unwrap(), AdMetrics::default());
}

#[test]
fn test_isolated_stores_do_not_share_counters() {
    let a = engine_with(Catalog::seeded());
    let b = engine_with(Catalog::seeded());
    a.record_click("keytruda_banner").unwrap();

    assert_eq!(a.metrics_for_ad("keytruda_banner").unwrap().clicks, 1);
    assert_eq!(b.metrics_for_ad("keytruda_banner").unwrap().clicks, 0);
}
