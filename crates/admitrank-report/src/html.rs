//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use admitrank_core::engine::RankedEntry;
use admitrank_core::explain::MatchLabel;
use admitrank_core::report::{EvaluationReport, RecommendationReport};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn open_document(html: &mut String, title: &str) {
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>admitrank report: {}</title>\n",
        html_escape(title)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");
}

/// Raw JSON section, sort script and closing tags.
fn close_document<T: Serialize>(html: &mut String, report: &T) {
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
}

fn write_file(html: String, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

/// Generate an HTML page for a recommendation run.
pub fn generate_recommendation_html(report: &RecommendationReport) -> String {
    let mut html = String::new();
    let rec = &report.recommendation;

    open_document(&mut html, &report.catalog);

    html.push_str("<header>\n");
    html.push_str("<h1>admitrank recommendations</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Catalog: <strong>{}</strong> | {} considered | {} filtered out | sorted by {} | {}</p>\n",
        html_escape(&report.catalog),
        rec.considered,
        rec.filtered_out,
        rec.sort_key,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Profile</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>GPA</th><th>IELTS</th><th>Budget</th><th>Country</th><th>Field</th><th>Signal</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    let profile = &report.profile;
    html.push_str(&format!(
        "<tr><td>{:.2}</td><td>{:.1}</td><td>{:.0}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        profile.gpa,
        profile.ielts,
        profile.budget,
        html_escape(profile.preferred_country().unwrap_or("-")),
        html_escape(profile.field_of_study().unwrap_or("-")),
        html_escape(report.signal_provider.as_deref().unwrap_or("fallback")),
    ));
    html.push_str("</tbody></table>\n");

    if let Some(quality) = &report.quality {
        html.push_str(&format!(
            "<p class=\"meta\">Average match {:.1}% | median {:.1}% | {} high-quality of {}</p>\n",
            quality.average_match,
            quality.median_match,
            quality.high_quality_matches,
            quality.total_recommendations
        ));
    }

    if !rec.entries.is_empty() {
        html.push_str(&generate_bar_chart(
            rec.entries
                .iter()
                .map(|e| (e.candidate.name.as_str(), e.candidate.components.combined_score)),
        ));
    }
    html.push_str("</section>\n");

    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Ranking</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Rank</th><th onclick=\"sortTable(1)\">Candidate</th><th onclick=\"sortTable(2)\">Combined</th><th onclick=\"sortTable(3)\">Acceptance</th><th onclick=\"sortTable(4)\">Cost Fit</th><th onclick=\"sortTable(5)\">Signal</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for entry in &rec.entries {
        let c = &entry.candidate.components;
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{:.1}%</td><td>{:.1}%</td><td>{:.2}</td><td>{}</td></tr>\n",
            row_class(c.combined_score),
            entry.rank,
            html_escape(&entry.candidate.name),
            c.combined_score * 100.0,
            c.acceptance_probability,
            c.cost_fit,
            entry.candidate.signal_source,
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    let explained: Vec<&RankedEntry> = rec
        .entries
        .iter()
        .filter(|e| e.explanation.is_some())
        .collect();
    if !explained.is_empty() {
        html.push_str("<section class=\"explanations\">\n");
        html.push_str("<h2>Explanations</h2>\n");
        for entry in explained {
            html.push_str(&explanation_block(entry));
        }
        html.push_str("</section>\n");
    }

    close_document(&mut html, report);
    html
}

fn explanation_block(entry: &RankedEntry) -> String {
    let Some(exp) = &entry.explanation else {
        return String::new();
    };

    let class = match exp.label {
        MatchLabel::Likely => "pass",
        MatchLabel::Possible => "warn",
        MatchLabel::Unlikely => "fail",
    };

    let mut out = String::new();
    out.push_str("<details>\n");
    out.push_str(&format!(
        "<summary>#{} {} <span class=\"{}\">{:.1}% {} ({} confidence)</span></summary>\n",
        entry.rank,
        html_escape(&entry.candidate.name),
        class,
        exp.score_percent,
        exp.label,
        exp.confidence
    ));

    out.push_str("<table>\n<thead><tr><th>Feature</th><th>Impact</th><th>Direction</th></tr></thead>\n<tbody>\n");
    for attr in &exp.feature_importance {
        out.push_str(&format!(
            "<tr><td>{}</td><td>{:.1}%</td><td>{}</td></tr>\n",
            html_escape(&attr.feature_name),
            attr.impact_percentage,
            attr.contribution
        ));
    }
    out.push_str("</tbody></table>\n");

    for (heading, items) in [
        ("Strengths", &exp.positive_indicators),
        ("Concerns", &exp.concerns),
        ("Suggestions", &exp.recommendations),
    ] {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("<h3>{heading}</h3>\n<ul>\n"));
        for item in items {
            out.push_str(&format!("<li>{}</li>\n", html_escape(item)));
        }
        out.push_str("</ul>\n");
    }

    out.push_str("</details>\n");
    out
}

/// Write a recommendation HTML page to a file.
pub fn write_recommendation_html(report: &RecommendationReport, path: &Path) -> Result<()> {
    write_file(generate_recommendation_html(report), path)
}

/// Generate an HTML page for an evaluation report.
pub fn generate_evaluation_html(report: &EvaluationReport) -> String {
    let mut html = String::new();
    let summary = &report.summary;

    open_document(&mut html, &report.log_name);

    html.push_str("<header>\n");
    html.push_str("<h1>admitrank evaluation</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Log: <strong>{}</strong> | {} queries | {}</p>\n",
        html_escape(&report.log_name),
        summary.query_count,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n<thead><tr><th>Metric</th><th>Value</th></tr></thead>\n<tbody>\n");
    for (k, value) in &summary.precision_at_k {
        html.push_str(&format!("<tr><td>Precision@{k}</td><td>{value:.3}</td></tr>\n"));
    }
    for (k, value) in &summary.recall_at_k {
        html.push_str(&format!("<tr><td>Recall@{k}</td><td>{value:.3}</td></tr>\n"));
    }
    for (name, value) in [
        ("NDCG", summary.ndcg),
        ("MRR", summary.mrr),
        ("MAP", summary.map_score),
        ("F1", summary.f1_score),
    ] {
        html.push_str(&format!("<tr><td>{name}</td><td>{value:.3}</td></tr>\n"));
    }
    html.push_str("</tbody></table>\n");

    if let Some(cls) = &report.classification {
        let cm = &cls.confusion;
        html.push_str("<h2>Classification</h2>\n");
        html.push_str("<table class=\"summary\">\n<thead><tr><th>Accuracy</th><th>Precision</th><th>Recall</th><th>TP</th><th>TN</th><th>FP</th><th>FN</th></tr></thead>\n<tbody>\n");
        html.push_str(&format!(
            "<tr><td>{:.3}</td><td>{:.3}</td><td>{:.3}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            cls.accuracy,
            cls.precision,
            cls.recall,
            cm.true_positives,
            cm.true_negatives,
            cm.false_positives,
            cm.false_negatives
        ));
        html.push_str("</tbody></table>\n");
    }

    if !report.queries.is_empty() {
        html.push_str(&generate_bar_chart(
            report
                .queries
                .iter()
                .map(|q| (q.query_id.as_str(), q.metrics.ndcg)),
        ));
    }
    html.push_str("</section>\n");

    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Queries</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Query</th><th onclick=\"sortTable(1)\">NDCG</th><th onclick=\"sortTable(2)\">MRR</th><th onclick=\"sortTable(3)\">MAP</th><th onclick=\"sortTable(4)\">F1</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for q in &report.queries {
        let m = &q.metrics;
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{:.3}</td><td>{:.3}</td><td>{:.3}</td><td>{:.3}</td></tr>\n",
            row_class(m.ndcg),
            html_escape(&q.query_id),
            m.ndcg,
            m.mrr,
            m.map_score,
            m.f1_score
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    close_document(&mut html, report);
    html
}

/// Write an evaluation HTML page to a file.
pub fn write_evaluation_html(report: &EvaluationReport, path: &Path) -> Result<()> {
    write_file(generate_evaluation_html(report), path)
}

fn row_class(score: f64) -> &'static str {
    if score >= 0.7 {
        "pass"
    } else if score >= 0.5 {
        "warn"
    } else {
        "fail"
    }
}

/// Horizontal bars for 0-1 scores.
fn generate_bar_chart<'a>(bars: impl Iterator<Item = (&'a str, f64)>) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 260;

    let bars: Vec<(&str, f64)> = bars.map(|(l, s)| (l, s.clamp(0.0, 1.0))).collect();
    let total_height = bars.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, (label, score)) in bars.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (*score * max_width as f64) as usize;

        let color = if *score >= 0.7 {
            "#22c55e"
        } else if *score >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(label)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            score * 100.0
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --warn: #fef9c3; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --warn: #713f12; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.warn { background: var(--warn); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

// Numeric columns compare as numbers, everything else as text.
const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = parseFloat(va), nb = parseFloat(vb);
    if (!isNaN(na) && !isNaN(nb)) return asc ? na - nb : nb - na;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use admitrank_core::engine::Recommendation;
    use admitrank_core::evaluation::{
        ClassificationLog, EvaluationLog, LoggedRecommendation, QueryLog,
    };
    use admitrank_core::model::{
        ScoreComponents, ScoredCandidate, SignalSource, SortKey, StudentProfile,
    };

    fn make_recommendation_report() -> RecommendationReport {
        let entry = |rank: usize, id: &str, name: &str, combined: f64| RankedEntry {
            rank,
            candidate: ScoredCandidate {
                candidate_id: id.into(),
                name: name.into(),
                components: ScoreComponents {
                    ml_score: 0.6,
                    rule_score: combined,
                    combined_score: combined,
                    acceptance_probability: 60.0,
                    cost_fit: 0.8,
                },
                signal_source: SignalSource::Fallback,
            },
            explanation: None,
        };

        RecommendationReport::new(
            "Test Catalog",
            StudentProfile {
                gpa: 3.5,
                ielts: 7.0,
                budget: 20_000.0,
                country: Some("Germany".into()),
                field: Some("Computer Science".into()),
            },
            None,
            Recommendation {
                sort_key: SortKey::CombinedScore,
                top_k: Some(10),
                considered: 3,
                filtered_out: 1,
                entries: vec![
                    entry(1, "tum", "TU Munich", 0.82),
                    entry(2, "kit", "Karlsruhe <KIT>", 0.55),
                ],
            },
        )
    }

    fn make_evaluation_report() -> EvaluationReport {
        let log = EvaluationLog {
            name: "weekly".into(),
            queries: vec![QueryLog {
                query_id: "student-42".into(),
                recommendations: vec![
                    LoggedRecommendation {
                        id: "a".into(),
                        score: 0.9,
                    },
                    LoggedRecommendation {
                        id: "b".into(),
                        score: 0.4,
                    },
                ],
                ground_truth: vec!["a".into()],
            }],
            classification: Some(ClassificationLog {
                predictions: vec![1, 0, 1, 1],
                ground_truth: vec![1, 0, 0, 1],
            }),
        };
        EvaluationReport::from_log(&log, None).unwrap()
    }

    #[test]
    fn recommendation_html_contains_required_elements() {
        let html = generate_recommendation_html(&make_recommendation_report());

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Test Catalog"));
        assert!(html.contains("TU Munich"));
        assert!(html.contains("82.0%"));
        assert!(html.contains("<svg"));
    }

    #[test]
    fn recommendation_html_escapes_names() {
        let html = generate_recommendation_html(&make_recommendation_report());
        assert!(html.contains("Karlsruhe &lt;KIT&gt;"));
        assert!(!html.contains("Karlsruhe <KIT>"));
    }

    #[test]
    fn evaluation_html_contains_metrics() {
        let html = generate_evaluation_html(&make_evaluation_report());

        assert!(html.contains("weekly"));
        assert!(html.contains("student-42"));
        assert!(html.contains("Precision@1"));
        assert!(html.contains("Classification"));
        assert!(html.contains("<td>0.750</td>"));
    }

    #[test]
    fn html_reports_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let rec_path = dir.path().join("nested/recommendations.html");
        let eval_path = dir.path().join("evaluation.html");

        write_recommendation_html(&make_recommendation_report(), &rec_path).unwrap();
        write_evaluation_html(&make_evaluation_report(), &eval_path).unwrap();

        assert!(std::fs::read_to_string(&rec_path).unwrap().contains("<html"));
        assert!(std::fs::read_to_string(&eval_path).unwrap().contains("<html"));
    }
}
