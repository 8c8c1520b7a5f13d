//! The `admitrank evaluate` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use admitrank_core::parser;
use admitrank_core::report::EvaluationReport;
use admitrank_report::write_evaluation_html;
use admitrank_signals::config::load_config_from;

use super::parse_k_values;

pub fn execute(
    log_path: PathBuf,
    k: Option<String>,
    format: String,
    save: Option<PathBuf>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let k_values = match &k {
        Some(s) => parse_k_values(s)?,
        None => config.k_values.clone(),
    };

    let log = parser::load_evaluation_log(&log_path)?;
    let report = EvaluationReport::from_log(&log, Some(k_values.as_slice()))?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "table" => print_summary(&report),
        "html" => {
            print_summary(&report);
            let output = output.unwrap_or_else(|| config.output_dir.clone());
            let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
            let path = output.join(format!("evaluation-{timestamp}.html"));
            write_evaluation_html(&report, &path)?;
            println!("HTML report: {}", path.display());
        }
        other => anyhow::bail!("unknown format: {other} (expected table, json or html)"),
    }

    if let Some(path) = save {
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &EvaluationReport) {
    let summary = &report.summary;
    println!(
        "Evaluation: {} ({} queries)",
        report.log_name, summary.query_count
    );

    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    for (k, value) in &summary.precision_at_k {
        table.add_row(vec![
            Cell::new(format!("Precision@{k}")),
            Cell::new(format!("{value:.3}")),
        ]);
    }
    for (k, value) in &summary.recall_at_k {
        table.add_row(vec![
            Cell::new(format!("Recall@{k}")),
            Cell::new(format!("{value:.3}")),
        ]);
    }
    for (name, value) in [
        ("NDCG", summary.ndcg),
        ("MRR", summary.mrr),
        ("MAP", summary.map_score),
        ("F1", summary.f1_score),
    ] {
        table.add_row(vec![Cell::new(name), Cell::new(format!("{value:.3}"))]);
    }
    println!("{table}");

    if let Some(cls) = &report.classification {
        let cm = &cls.confusion;
        println!(
            "Classification: accuracy {:.3}, precision {:.3}, recall {:.3} (tp {}, tn {}, fp {}, fn {})",
            cls.accuracy,
            cls.precision,
            cls.recall,
            cm.true_positives,
            cm.true_negatives,
            cm.false_positives,
            cm.false_negatives
        );
    }
}
