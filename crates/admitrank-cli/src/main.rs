//! admitrank CLI: score, rank, explain and evaluate candidate recommendations.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "admitrank",
    version,
    about = "Candidate scoring, ranking and explanation advisor"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score and rank a catalog against a student profile
    Recommend {
        /// Path to a .toml catalog or a directory of catalogs
        #[arg(long)]
        catalog: PathBuf,

        /// Path to a .toml student profile
        #[arg(long)]
        profile: PathBuf,

        /// Sort key: combined_score, acceptance_probability, cost_fit
        #[arg(long)]
        sort: Option<String>,

        /// Keep only the best N candidates
        #[arg(long, conflicts_with = "all")]
        top_k: Option<usize>,

        /// Return every candidate, ignoring the configured limit
        #[arg(long)]
        all: bool,

        /// Best (smallest) ranking allowed
        #[arg(long)]
        min_ranking: Option<u32>,

        /// Worst (largest) ranking allowed
        #[arg(long)]
        max_ranking: Option<u32>,

        /// Highest tuition fee allowed
        #[arg(long)]
        max_tuition: Option<f64>,

        /// Only candidates in this country
        #[arg(long)]
        country: Option<String>,

        /// Only candidates offering scholarships
        #[arg(long)]
        scholarship: bool,

        /// Minimum acceptance probability (0-100)
        #[arg(long)]
        min_acceptance: Option<f64>,

        /// Attach an explanation to every ranked candidate
        #[arg(long)]
        explain: bool,

        /// Output format: table, json, html
        #[arg(long, default_value = "table")]
        format: String,

        /// Output directory for json/html files
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Explain the score of one candidate
    Explain {
        /// Path to a .toml catalog or a directory of catalogs
        #[arg(long)]
        catalog: PathBuf,

        /// Path to a .toml student profile
        #[arg(long)]
        profile: PathBuf,

        /// Candidate ID to explain
        #[arg(long)]
        candidate: String,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compute ranking and classification metrics for an evaluation log
    Evaluate {
        /// Path to a JSON evaluation log
        #[arg(long)]
        log: PathBuf,

        /// Cutoffs (comma-separated, default from config: "1,5,10")
        #[arg(long)]
        k: Option<String>,

        /// Output format: table, json, html
        #[arg(long, default_value = "table")]
        format: String,

        /// Write the evaluation report JSON to this path
        #[arg(long)]
        save: Option<PathBuf>,

        /// Output directory for html files
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare two evaluation reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Regression threshold on per-query NDCG
        #[arg(long, default_value = "0.05")]
        threshold: f64,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate catalog TOML files
    Validate {
        /// Path to a catalog file or directory
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Catalog statistics, costs and affordability
    Analyze {
        /// Path to a catalog file or directory
        #[arg(long)]
        catalog: PathBuf,

        /// Budget for the affordability summary
        #[arg(long)]
        budget: Option<f64>,

        /// Program length in years for total-cost estimates
        #[arg(long, default_value = "2")]
        years: u32,

        /// Scholarship list (.toml) to match against the catalog's countries
        #[arg(long)]
        scholarships: Option<PathBuf>,

        /// Only scholarships with this coverage: full, partial
        #[arg(long, requires = "scholarships")]
        coverage: Option<String>,

        /// Compare these candidates (comma-separated IDs, at least 2)
        #[arg(long)]
        compare: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config, catalog and profile
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("admitrank=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Recommend {
            catalog,
            profile,
            sort,
            top_k,
            all,
            min_ranking,
            max_ranking,
            max_tuition,
            country,
            scholarship,
            min_acceptance,
            explain,
            format,
            output,
            config,
        } => {
            let args = commands::recommend::RecommendArgs {
                catalog,
                profile,
                sort,
                top_k,
                all,
                filter: admitrank_core::ranking::CandidateFilter {
                    min_ranking,
                    max_ranking,
                    max_tuition,
                    country,
                    scholarship_required: scholarship,
                    min_acceptance_chance: min_acceptance,
                },
                explain,
                format,
                output,
                config,
            };
            commands::recommend::execute(args).await
        }
        Commands::Explain {
            catalog,
            profile,
            candidate,
            format,
            config,
        } => commands::explain::execute(catalog, profile, candidate, format, config).await,
        Commands::Evaluate {
            log,
            k,
            format,
            save,
            output,
            config,
        } => commands::evaluate::execute(log, k, format, save, output, config),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Validate { catalog } => commands::validate::execute(catalog),
        Commands::Analyze {
            catalog,
            budget,
            years,
            scholarships,
            coverage,
            compare,
            format,
            config,
        } => commands::analyze::execute(commands::analyze::AnalyzeArgs {
            catalog,
            budget,
            years,
            scholarships,
            coverage,
            compare,
            format,
            config,
        }),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
