pub mod analyze;
pub mod compare;
pub mod evaluate;
pub mod explain;
pub mod init;
pub mod recommend;
pub mod validate;

use std::path::Path;

use anyhow::Result;

use admitrank_core::engine::{AdvisorEngine, EngineConfig};
use admitrank_core::explain::Explainer;
use admitrank_core::model::CandidateRecord;
use admitrank_core::parser;
use admitrank_core::scoring::{HybridScorer, RuleScorer};
use admitrank_signals::{create_signal, AdmitrankConfig};

/// Build the advisor engine described by `config`.
pub fn build_engine(config: &AdmitrankConfig) -> Result<AdvisorEngine> {
    anyhow::ensure!(config.parallelism >= 1, "parallelism must be at least 1");

    let scorer = HybridScorer::new(config.scoring_weights()?, RuleScorer::default());
    let engine = AdvisorEngine::new(
        scorer,
        Explainer::default(),
        EngineConfig {
            parallelism: config.parallelism,
        },
    );

    match &config.signal {
        Some(signal) => Ok(engine.with_signal(create_signal(signal)?)),
        None => Ok(engine),
    }
}

/// Candidates from a catalog file or directory, with a display label.
pub fn load_catalog(path: &Path) -> Result<(String, Vec<CandidateRecord>)> {
    if path.is_dir() {
        let catalogs = parser::load_catalog_directory(path)?;
        anyhow::ensure!(
            !catalogs.is_empty(),
            "no catalogs found in {}",
            path.display()
        );
        let label = catalogs
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let candidates = catalogs.into_iter().flat_map(|c| c.candidates).collect();
        Ok((label, candidates))
    } else {
        let catalog = parser::parse_catalog(path)?;
        Ok((catalog.name, catalog.candidates))
    }
}

/// Parse comma-separated cutoffs like `"1,5,10"`.
pub fn parse_k_values(s: &str) -> Result<Vec<usize>> {
    let values = s
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("invalid k value: '{}'", v.trim()))
        })
        .collect::<Result<Vec<_>>>()?;
    anyhow::ensure!(!values.is_empty(), "k must have at least one value");
    anyhow::ensure!(values.iter().all(|&k| k >= 1), "k values must be at least 1");
    Ok(values)
}
