//! Persisted reports with JSON round-tripping and regression detection.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analytics::{recommendation_quality, RecommendationQuality};
use crate::engine::Recommendation;
use crate::error::AdvisorResult;
use crate::evaluation::{
    classification_report, evaluate_log, ClassificationMetrics, EvaluationLog, EvaluationSummary,
    QueryMetrics,
};
use crate::model::StudentProfile;

fn save_pretty<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize report")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}

fn load<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read report from {}", path.display()))?;
    serde_json::from_str(&content).context("failed to parse report JSON")
}

/// Metrics for one evaluation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Name of the evaluated log.
    pub log_name: String,
    pub queries: Vec<QueryMetrics>,
    pub summary: EvaluationSummary,
    #[serde(default)]
    pub classification: Option<ClassificationMetrics>,
}

impl EvaluationReport {
    /// Evaluate `log` and wrap the result in a new report.
    pub fn from_log(log: &EvaluationLog, k_values: Option<&[usize]>) -> AdvisorResult<Self> {
        let (queries, summary) = evaluate_log(log, k_values);
        let classification = log
            .classification
            .as_ref()
            .map(|c| classification_report(&c.ground_truth, &c.predictions))
            .transpose()?;

        Ok(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            log_name: log.name.clone(),
            queries,
            summary,
            classification,
        })
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_pretty(self, path)
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        load(path)
    }

    /// Compare per-query NDCG against a baseline.
    ///
    /// A drop larger than `threshold` is a regression, a rise larger than
    /// `threshold` an improvement.
    pub fn compare(&self, baseline: &EvaluationReport, threshold: f64) -> RegressionReport {
        let ndcg_map = |report: &EvaluationReport| -> BTreeMap<String, f64> {
            report
                .queries
                .iter()
                .map(|q| (q.query_id.clone(), q.metrics.ndcg))
                .collect()
        };

        let baseline_scores = ndcg_map(baseline);
        let current_scores = ndcg_map(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_queries = 0usize;

        for (query_id, &current) in &current_scores {
            let Some(&baseline_score) = baseline_scores.get(query_id) else {
                new_queries += 1;
                continue;
            };
            let change = ScoreChange {
                query_id: query_id.clone(),
                baseline_score,
                current_score: current,
                delta: current - baseline_score,
            };
            if change.delta < -threshold {
                regressions.push(change);
            } else if change.delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_queries = baseline_scores
            .keys()
            .filter(|k| !current_scores.contains_key(*k))
            .count();

        RegressionReport {
            regressions,
            improvements,
            unchanged,
            new_queries,
            removed_queries,
        }
    }
}

/// Result of comparing two evaluation reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionReport {
    /// Queries whose NDCG went down.
    pub regressions: Vec<ScoreChange>,
    /// Queries whose NDCG went up.
    pub improvements: Vec<ScoreChange>,
    /// Queries with no significant change.
    pub unchanged: usize,
    /// Queries in current but not baseline.
    pub new_queries: usize,
    /// Queries in baseline but not current.
    pub removed_queries: usize,
}

/// NDCG movement for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreChange {
    pub query_id: String,
    pub baseline_score: f64,
    pub current_score: f64,
    pub delta: f64,
}

/// Layout used by [`RegressionReport::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegressionStyle {
    /// Plain terminal text.
    Text,
    /// GitHub-flavoured markdown tables.
    Markdown,
}

impl RegressionReport {
    fn counts(&self) -> String {
        format!(
            "{} regressions, {} improvements, {} unchanged, {} new, {} removed",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged,
            self.new_queries,
            self.removed_queries
        )
    }

    /// Render the summary line and one section per non-empty change list.
    pub fn render(&self, style: RegressionStyle) -> String {
        let mut out = match style {
            RegressionStyle::Text => format!("Comparison: {}\n", self.counts()),
            RegressionStyle::Markdown => format!("**Summary:** {}\n\n", self.counts()),
        };

        let sections = [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ];
        for (title, changes) in sections.into_iter().filter(|(_, c)| !c.is_empty()) {
            match style {
                RegressionStyle::Text => out.push_str(&format!("\n{title}:\n")),
                RegressionStyle::Markdown => {
                    out.push_str(&format!("### {title}\n\n"));
                    out.push_str("| Query | Baseline NDCG | Current NDCG | Delta |\n");
                    out.push_str("|-------|---------------|--------------|-------|\n");
                }
            }
            for c in changes {
                let (from, to, delta) = (c.baseline_score, c.current_score, c.delta);
                out.push_str(&match style {
                    RegressionStyle::Text => {
                        format!("  {} NDCG {from:.3} -> {to:.3} ({delta:+.3})\n", c.query_id)
                    }
                    RegressionStyle::Markdown => {
                        format!("| {} | {from:.3} | {to:.3} | {delta:+.3} |\n", c.query_id)
                    }
                });
            }
            if style == RegressionStyle::Markdown {
                out.push('\n');
            }
        }

        out
    }

    /// Format the regression report as markdown.
    pub fn to_markdown(&self) -> String {
        self.render(RegressionStyle::Markdown)
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}

/// A persisted recommendation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Catalog the candidates came from.
    pub catalog: String,
    pub profile: StudentProfile,
    /// Name of the external signal provider, when one was used.
    #[serde(default)]
    pub signal_provider: Option<String>,
    pub recommendation: Recommendation,
    #[serde(default)]
    pub quality: Option<RecommendationQuality>,
}

impl RecommendationReport {
    pub fn new(
        catalog: impl Into<String>,
        profile: StudentProfile,
        signal_provider: Option<String>,
        recommendation: Recommendation,
    ) -> Self {
        let quality = recommendation_quality(&recommendation.match_percentages());
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            catalog: catalog.into(),
            profile,
            signal_provider,
            recommendation,
            quality,
        }
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_pretty(self, path)
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        load(path)
    }
}
