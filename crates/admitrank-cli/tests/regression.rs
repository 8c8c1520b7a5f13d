//! Regression detection integration tests.
//!
//! Tests the report comparison workflow end-to-end, including
//! JSON serialization, report loading, and regression detection.

use admitrank_core::evaluation::{EvaluationLog, LoggedRecommendation, QueryLog};
use admitrank_core::report::EvaluationReport;

fn query(id: &str, ranked: &[&str], truth: &[&str]) -> QueryLog {
    QueryLog {
        query_id: id.into(),
        recommendations: ranked
            .iter()
            .enumerate()
            .map(|(i, r)| LoggedRecommendation {
                id: r.to_string(),
                score: 1.0 - i as f64 * 0.1,
            })
            .collect(),
        ground_truth: truth.iter().map(|t| t.to_string()).collect(),
    }
}

fn make_report(queries: Vec<QueryLog>) -> EvaluationReport {
    let log = EvaluationLog {
        name: "nightly".into(),
        queries,
        classification: None,
    };
    EvaluationReport::from_log(&log, None).unwrap()
}

#[test]
fn detects_ndcg_regression() {
    let baseline = make_report(vec![query("q1", &["a", "b", "c"], &["a"])]);
    let current = make_report(vec![query("q1", &["b", "c", "a"], &["a"])]);

    let report = current.compare(&baseline, 0.05);
    assert!(report.has_regressions());
    assert_eq!(report.regressions.len(), 1);
    assert_eq!(report.regressions[0].query_id, "q1");
    assert!(report.regressions[0].delta < 0.0);
    assert!(report.improvements.is_empty());
}

#[test]
fn detects_improvement() {
    let baseline = make_report(vec![query("q1", &["x", "y", "a"], &["a"])]);
    let current = make_report(vec![query("q1", &["a", "x", "y"], &["a"])]);

    let report = current.compare(&baseline, 0.05);
    assert!(!report.has_regressions());
    assert_eq!(report.improvements.len(), 1);
    assert_eq!(report.improvements[0].current_score, 1.0);
}

#[test]
fn small_changes_are_unchanged() {
    // position 9 vs 10 of a single relevant item moves NDCG by < 0.02
    let before: Vec<String> = (0..9).map(|i| format!("n{i}")).collect();
    let mut baseline_rank: Vec<&str> = before.iter().map(String::as_str).collect();
    let mut current_rank = baseline_rank.clone();
    baseline_rank.insert(8, "hit");
    current_rank.push("hit");

    let baseline = make_report(vec![query("q1", &baseline_rank, &["hit"])]);
    let current = make_report(vec![query("q1", &current_rank, &["hit"])]);

    let report = current.compare(&baseline, 0.05);
    assert_eq!(report.unchanged, 1);
    assert!(!report.has_regressions());
}

#[test]
fn tracks_new_and_removed_queries() {
    let baseline = make_report(vec![
        query("kept", &["a"], &["a"]),
        query("dropped", &["b"], &["b"]),
    ]);
    let current = make_report(vec![
        query("kept", &["a"], &["a"]),
        query("added", &["c"], &["c"]),
    ]);

    let report = current.compare(&baseline, 0.05);
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.new_queries, 1);
    assert_eq!(report.removed_queries, 1);
}

#[test]
fn reports_round_trip_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports/baseline.json");

    let report = make_report(vec![
        query("q1", &["a", "b"], &["b"]),
        query("q2", &["c", "d"], &["c", "d"]),
    ]);
    report.save_json(&path).unwrap();

    let loaded = EvaluationReport::load_json(&path).unwrap();
    assert_eq!(loaded.id, report.id);
    assert_eq!(loaded.summary, report.summary);
    assert_eq!(loaded.queries.len(), 2);

    let diff = report.compare(&loaded, 0.0);
    assert!(!diff.has_regressions());
    assert_eq!(diff.unchanged, 2);
}

#[test]
fn markdown_lists_regressions() {
    let baseline = make_report(vec![query("student-7", &["a", "b"], &["a"])]);
    let current = make_report(vec![query("student-7", &["b", "a"], &["a"])]);

    let md = current.compare(&baseline, 0.05).to_markdown();
    assert!(md.contains("1 regressions"));
    assert!(md.contains("### Regressions"));
    assert!(md.contains("| student-7 | 1.000 | 0.631 | -0.369 |"));
}
