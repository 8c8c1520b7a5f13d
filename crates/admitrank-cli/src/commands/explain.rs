//! The `admitrank explain` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};
use serde::Serialize;

use admitrank_core::explain::Explanation;
use admitrank_core::model::ScoredCandidate;
use admitrank_core::parser;
use admitrank_signals::config::load_config_from;

use super::{build_engine, load_catalog};

#[derive(Serialize)]
struct ExplainOutput<'a> {
    score: &'a ScoredCandidate,
    explanation: &'a Explanation,
}

pub async fn execute(
    catalog_path: PathBuf,
    profile_path: PathBuf,
    candidate_id: String,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let (_, candidates) = load_catalog(&catalog_path)?;
    let profile = parser::parse_profile(&profile_path)?;

    let candidate = candidates
        .iter()
        .find(|c| c.id == candidate_id)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "candidate '{candidate_id}' not found in {}",
                catalog_path.display()
            )
        })?;

    let engine = build_engine(&config)?;
    let (score, explanation) = engine.explain_candidate(&profile, candidate).await?;

    if format == "json" {
        let out = ExplainOutput {
            score: &score,
            explanation: &explanation,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "{}: {:.1}% match ({}, {} confidence, signal {})",
        score.name,
        explanation.score_percent,
        explanation.label,
        explanation.confidence,
        score.signal_source
    );
    println!(
        "Acceptance {:.1}% | rules {:.2} | cost fit {:.2}",
        score.components.acceptance_probability,
        score.components.rule_score,
        score.components.cost_fit
    );

    let mut table = Table::new();
    table.set_header(vec!["Feature", "Importance", "Impact", "Direction"]);
    for attr in &explanation.feature_importance {
        table.add_row(vec![
            Cell::new(&attr.feature_name),
            Cell::new(format!("{:.3}", attr.importance_score)),
            Cell::new(format!("{:.1}%", attr.impact_percentage)),
            Cell::new(attr.contribution),
        ]);
    }
    println!("{table}");

    for (heading, items) in [
        ("Strengths", &explanation.positive_indicators),
        ("Concerns", &explanation.concerns),
        ("Suggestions", &explanation.recommendations),
    ] {
        if items.is_empty() {
            continue;
        }
        println!("\n{heading}:");
        for item in items {
            println!("  - {item}");
        }
    }

    Ok(())
}
