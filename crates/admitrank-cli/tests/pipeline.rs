//! End-to-end pipeline tests over the shared fixtures.
//!
//! These tests verify that loading, scoring, ranking, explaining and report
//! rendering work together with and without an external signal.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use admitrank_core::engine::{AdvisorEngine, RecommendRequest};
use admitrank_core::model::{SignalSource, SortKey};
use admitrank_core::parser;
use admitrank_core::report::RecommendationReport;
use admitrank_report::{generate_recommendation_html, write_recommendation_html};
use admitrank_signals::config::{create_signal, SignalConfig};
use admitrank_signals::mock::MockSignal;

fn fixtures() -> &'static Path {
    Path::new("../../fixtures")
}

#[tokio::test]
async fn fallback_pipeline_ranks_whole_catalog() {
    let candidates = parser::load_candidates(&fixtures().join("catalogs")).unwrap();
    let profile = parser::parse_profile(&fixtures().join("profile.toml")).unwrap();
    assert_eq!(candidates.len(), 8);

    let engine = AdvisorEngine::default();
    let request = RecommendRequest {
        explain: true,
        ..Default::default()
    };
    let rec = engine.recommend(&profile, &candidates, &request).await.unwrap();

    assert_eq!(rec.considered, 8);
    assert_eq!(rec.entries.len(), 8);
    assert!(rec
        .entries
        .iter()
        .all(|e| e.candidate.signal_source == SignalSource::Fallback));
    assert!(rec.entries.iter().all(|e| e.explanation.is_some()));

    let combined: Vec<f64> = rec
        .entries
        .iter()
        .map(|e| e.candidate.components.combined_score)
        .collect();
    assert!(combined.windows(2).all(|w| w[0] >= w[1]));
    assert!(combined.iter().all(|s| (0.0..=1.0).contains(s)));
}

#[tokio::test]
async fn external_signal_drives_acceptance_order() {
    let candidates = parser::load_candidates(&fixtures().join("catalogs/europe.toml")).unwrap();
    let profile = parser::parse_profile(&fixtures().join("profile.toml")).unwrap();

    let signal = MockSignal::new(
        HashMap::from([
            ("uc3m".to_string(), 0.95),
            ("polimi".to_string(), 0.85),
            ("tum".to_string(), 0.30),
        ]),
        0.5,
    );
    let engine = AdvisorEngine::default().with_signal(Arc::new(signal));
    let request = RecommendRequest {
        sort_key: SortKey::AcceptanceProbability,
        top_k: Some(2),
        ..Default::default()
    };

    let rec = engine.recommend(&profile, &candidates, &request).await.unwrap();
    assert_eq!(rec.candidate_ids(), ["uc3m", "polimi"]);
    assert_eq!(rec.entries[0].candidate.components.acceptance_probability, 95.0);
}

#[tokio::test]
async fn fixed_signal_from_config() {
    let candidates = parser::load_candidates(&fixtures().join("catalogs/europe.toml")).unwrap();
    let profile = parser::parse_profile(&fixtures().join("profile.toml")).unwrap();

    let signal = create_signal(&SignalConfig::Fixed { value: 0.7 }).unwrap();
    let engine = AdvisorEngine::default().with_signal(signal);

    let scored = engine.score_batch(&profile, &candidates).await.unwrap();
    assert!(scored.iter().all(|s| s.components.ml_score == 0.7));
    assert!(scored
        .iter()
        .all(|s| s.signal_source == SignalSource::External));
}

#[tokio::test]
async fn recommendation_report_round_trip_and_html() {
    let candidates = parser::load_candidates(&fixtures().join("catalogs")).unwrap();
    let profile = parser::parse_profile(&fixtures().join("profile.toml")).unwrap();

    let engine = AdvisorEngine::default();
    let request = RecommendRequest {
        top_k: Some(5),
        explain: true,
        ..Default::default()
    };
    let rec = engine.recommend(&profile, &candidates, &request).await.unwrap();
    let report = RecommendationReport::new("fixtures", profile, None, rec);
    assert_eq!(
        report.quality.as_ref().map(|q| q.total_recommendations),
        Some(5)
    );

    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("rec.json");
    report.save_json(&json).unwrap();
    let loaded = RecommendationReport::load_json(&json).unwrap();
    assert_eq!(loaded.recommendation, report.recommendation);

    let html = generate_recommendation_html(&loaded);
    assert!(html.contains("Explanations"));
    for entry in &loaded.recommendation.entries {
        assert!(html.contains(&entry.candidate.candidate_id));
    }

    let html_path = dir.path().join("out/rec.html");
    write_recommendation_html(&loaded, &html_path).unwrap();
    assert!(html_path.exists());
}

#[test]
fn evaluation_fixture_loads() {
    let log = parser::load_evaluation_log(&fixtures().join("evaluation-log.json")).unwrap();
    assert_eq!(log.name, "spring-intake");
    assert_eq!(log.queries.len(), 3);
    assert!(log.classification.is_some());
}
