//! The `admitrank recommend` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use admitrank_core::engine::{RecommendRequest, Recommendation};
use admitrank_core::model::SortKey;
use admitrank_core::parser;
use admitrank_core::ranking::CandidateFilter;
use admitrank_core::report::RecommendationReport;
use admitrank_report::write_recommendation_html;
use admitrank_signals::config::load_config_from;

use super::{build_engine, load_catalog};

pub struct RecommendArgs {
    pub catalog: PathBuf,
    pub profile: PathBuf,
    pub sort: Option<String>,
    pub top_k: Option<usize>,
    pub all: bool,
    pub filter: CandidateFilter,
    pub explain: bool,
    pub format: String,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

pub async fn execute(args: RecommendArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;

    let sort_key = match &args.sort {
        Some(s) => s.parse::<SortKey>().map_err(anyhow::Error::msg)?,
        None => config.default_sort,
    };
    let top_k = if args.all {
        None
    } else {
        args.top_k.or(config.default_top_k)
    };

    let (catalog_name, candidates) = load_catalog(&args.catalog)?;
    let profile = parser::parse_profile(&args.profile)?;
    let engine = build_engine(&config)?;

    let request = RecommendRequest {
        sort_key,
        top_k,
        filter: args.filter,
        explain: args.explain,
    };
    let recommendation = engine.recommend(&profile, &candidates, &request).await?;

    let report = RecommendationReport::new(
        catalog_name,
        profile,
        engine.signal_name().map(str::to_string),
        recommendation,
    );

    let output = args.output.unwrap_or_else(|| config.output_dir.clone());
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            let path = output.join(format!("recommendations-{timestamp}.json"));
            report.save_json(&path)?;
            eprintln!("Results saved to: {}", path.display());
        }
        "html" => {
            print_table(&report);
            let path = output.join(format!("recommendations-{timestamp}.html"));
            write_recommendation_html(&report, &path)?;
            println!("HTML report: {}", path.display());
        }
        "table" => print_table(&report),
        other => anyhow::bail!("unknown format: {other} (expected table, json or html)"),
    }

    Ok(())
}

fn print_table(report: &RecommendationReport) {
    let rec = &report.recommendation;

    println!(
        "{}: {} candidates considered, {} filtered out, sorted by {}",
        report.catalog, rec.considered, rec.filtered_out, rec.sort_key
    );

    if rec.entries.is_empty() {
        println!("No candidates matched.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Rank",
        "Candidate",
        "Match",
        "Acceptance",
        "Cost Fit",
        "Signal",
    ]);
    for entry in &rec.entries {
        let c = &entry.candidate.components;
        table.add_row(vec![
            Cell::new(entry.rank),
            Cell::new(&entry.candidate.name),
            Cell::new(format!("{:.1}%", c.combined_score * 100.0)),
            Cell::new(format!("{:.1}%", c.acceptance_probability)),
            Cell::new(format!("{:.2}", c.cost_fit)),
            Cell::new(entry.candidate.signal_source),
        ]);
    }
    println!("{table}");

    if let Some(quality) = &report.quality {
        println!(
            "Average match {:.1}%, {} of {} at or above 75%",
            quality.average_match, quality.high_quality_matches, quality.total_recommendations
        );
    }

    print_explanations(rec);
}

fn print_explanations(rec: &Recommendation) {
    for entry in &rec.entries {
        let Some(exp) = &entry.explanation else {
            continue;
        };
        println!(
            "\n#{} {}: {:.1}% ({}, {} confidence)",
            entry.rank, entry.candidate.name, exp.score_percent, exp.label, exp.confidence
        );
        for factor in &exp.contributing_factors {
            println!("  - {}", factor.summary);
        }
        for concern in &exp.concerns {
            println!("  ! {concern}");
        }
    }
}
