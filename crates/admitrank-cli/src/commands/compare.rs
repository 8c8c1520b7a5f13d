//! The `admitrank compare` command.

use std::path::PathBuf;

use anyhow::Result;

use admitrank_core::report::{EvaluationReport, RegressionStyle};

enum Output {
    Rendered(RegressionStyle),
    Json,
}

fn parse_output(format: &str) -> Result<Output> {
    Ok(match format {
        "text" => Output::Rendered(RegressionStyle::Text),
        "markdown" | "md" => Output::Rendered(RegressionStyle::Markdown),
        "json" => Output::Json,
        other => anyhow::bail!("unknown format: {other} (expected text, markdown or json)"),
    })
}

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must be non-negative");
    let output = parse_output(&format)?;

    let baseline = EvaluationReport::load_json(&baseline_path)?;
    let current = EvaluationReport::load_json(&current_path)?;
    let report = current.compare(&baseline, threshold);

    match output {
        Output::Rendered(style) => print!("{}", report.render(style)),
        Output::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if fail_on_regression && report.has_regressions() {
        tracing::warn!(
            regressions = report.regressions.len(),
            "regressions found, exiting with status 1"
        );
        std::process::exit(1);
    }

    Ok(())
}
