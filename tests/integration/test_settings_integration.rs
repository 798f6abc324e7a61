//! Settings files flowing into engine behavior.

use crate::common::{QueryCall, ScriptedEmbedder, ScriptedIndex};
use adlens::{AdEngine, Catalog, MetricsStore, Settings};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn write_settings(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("settings.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn test_file_settings_reach_the_matcher() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(
        &dir,
        r#"
[matching]
physician_index = "physicians_2025"
neighbors = 1
"#,
    );
    let settings = Settings::load_from(&path).unwrap();

    let engine = AdEngine::new(
        Arc::new(Catalog::seeded()),
        MetricsStore::new(),
        ScriptedEmbedder::new(2).with("Pancreatic Cancer", vec![0.0, 1.0]),
        ScriptedIndex::new().answer(
            "physicians_2025",
            vec![("dr-mei-tanaka", Some(0.4)), ("dr-omar-haddad", Some(0.6))],
        ),
        Arc::new(settings),
    )
    .unwrap();

    let matches = engine.match_physicians("krazati_interstitial").await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].physician.id.as_str(), "dr-mei-tanaka");
    assert_eq!(
        engine.index().calls(),
        vec![QueryCall {
            index: "physicians_2025".to_string(),
            k: 1,
            include_distances: true,
        }]
    );
}

#[tokio::test]
async fn test_file_threshold_changes_selection() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(&dir, "[matching]\nquestion_threshold = 0.97\n");
    let settings = Settings::load_from(&path).unwrap();

    let question = "Is there anything new for rheumatoid arthritis?";
    let engine = AdEngine::new(
        Arc::new(Catalog::seeded()),
        MetricsStore::new(),
        ScriptedEmbedder::new(2).with(question, vec![0.0, 1.0]),
        // similarity 0.955: fine at the default threshold, not at 0.97
        ScriptedIndex::new().answer("mock_ad_cat_data", vec![("arthritis", Some(0.3))]),
        Arc::new(settings),
    )
    .unwrap();

    assert!(engine.select_ad_for_question(question).await.unwrap().is_none());
}

#[test]
fn test_out_of_range_file_values_fail_validation() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(&dir, "[simulator]\nviewability_rate = 2.5\n");

    // the file parses; validation is what rejects it
    let settings = Settings::load_from(&path).unwrap();
    let err = settings.validate().unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("viewability_rate"));
}

#[test]
fn test_malformed_file_is_a_load_error() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(&dir, "[matching]\nneighbors = \"three\"\n");

    assert!(Settings::load_from(&path).is_err());
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::load_from(dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_saved_settings_round_trip_through_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config").join("settings.toml");

    let mut settings = Settings::default();
    settings.simulator.seed = Some(1234);
    settings.matching.neighbors = 7;
    settings.logging.level = "debug".to_string();
    settings.save(&path).unwrap();

    let loaded = Settings::load_from(&path).unwrap();
    assert_eq!(loaded, settings);
}
