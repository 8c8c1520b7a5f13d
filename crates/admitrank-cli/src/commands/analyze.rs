//! The `admitrank analyze` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};
use serde::Serialize;

use admitrank_core::analytics::{
    compare_candidates, summarize_catalog, CandidateComparison, CatalogSummary,
};
use admitrank_core::cost::{affordability, analyze_total_cost, AffordabilitySummary, CostBreakdown};
use admitrank_core::explain::format_amount;
use admitrank_core::model::CandidateRecord;
use admitrank_core::parser;
use admitrank_core::scholarships::{match_scholarships, Coverage, Scholarship};
use admitrank_signals::config::load_config_from;

use super::load_catalog;

pub struct AnalyzeArgs {
    pub catalog: PathBuf,
    pub budget: Option<f64>,
    pub years: u32,
    /// Scholarship list to match against the catalog's countries.
    pub scholarships: Option<PathBuf>,
    pub coverage: Option<String>,
    /// Comma-separated candidate IDs to compare.
    pub compare: Option<String>,
    pub format: String,
    pub config: Option<PathBuf>,
}

#[derive(Serialize)]
struct CandidateCost {
    candidate_id: String,
    name: String,
    #[serde(flatten)]
    breakdown: CostBreakdown,
}

#[derive(Serialize)]
struct Analysis {
    catalog: String,
    summary: CatalogSummary,
    costs: Vec<CandidateCost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    affordability: Option<AffordabilitySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scholarships: Option<Vec<CountryScholarships>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<CandidateComparison>,
}

#[derive(Serialize)]
struct CountryScholarships {
    country: String,
    scholarships: Vec<Scholarship>,
}

pub fn execute(args: AnalyzeArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let table = config.living_cost_table()?;
    let (catalog, candidates) = load_catalog(&args.catalog)?;
    let years = args.years;

    let costs = candidates
        .iter()
        .map(|c| {
            Ok(CandidateCost {
                candidate_id: c.id.clone(),
                name: c.name.clone(),
                breakdown: analyze_total_cost(c.tuition_fee, &c.country, years, &table)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let summary = summarize_catalog(&candidates);

    let coverage = args
        .coverage
        .as_deref()
        .map(str::parse::<Coverage>)
        .transpose()
        .map_err(anyhow::Error::msg)?;
    let scholarships = match &args.scholarships {
        Some(path) => {
            let list = parser::parse_scholarships(path)?;
            Some(scholarships_by_country(&list, &summary, coverage))
        }
        None => None,
    };

    let comparison = match &args.compare {
        Some(ids) => Some(compare_selected(&candidates, ids, &args.catalog)?),
        None => None,
    };

    let analysis = Analysis {
        catalog,
        summary,
        costs,
        affordability: args
            .budget
            .map(|b| affordability(&candidates, b))
            .transpose()?,
        scholarships,
        comparison,
    };

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&analysis)?),
        "table" => print_analysis(&analysis, years),
        other => anyhow::bail!("unknown format: {other} (expected table or json)"),
    }

    Ok(())
}

fn scholarships_by_country(
    list: &[Scholarship],
    summary: &CatalogSummary,
    coverage: Option<Coverage>,
) -> Vec<CountryScholarships> {
    summary
        .country_distribution
        .keys()
        .filter_map(|country| {
            let matched = match_scholarships(list, country, coverage);
            if matched.is_empty() {
                return None;
            }
            Some(CountryScholarships {
                country: country.clone(),
                scholarships: matched.into_iter().cloned().collect(),
            })
        })
        .collect()
}

fn compare_selected(
    candidates: &[CandidateRecord],
    ids: &str,
    catalog_path: &std::path::Path,
) -> Result<CandidateComparison> {
    let selected = ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            candidates.iter().find(|c| c.id == id).ok_or_else(|| {
                anyhow::anyhow!("candidate '{id}' not found in {}", catalog_path.display())
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(compare_candidates(&selected)?)
}

fn print_analysis(analysis: &Analysis, years: u32) {
    let summary = &analysis.summary;
    println!(
        "Catalog: {} ({} candidates, {} programs)",
        analysis.catalog, summary.total_candidates, summary.total_programs
    );

    if let Some(cost) = &summary.cost {
        println!(
            "Tuition: mean {} | median {} | min {} | max {} | std dev {}",
            format_amount(cost.mean),
            format_amount(cost.median),
            format_amount(cost.min),
            format_amount(cost.max),
            format_amount(cost.std_dev)
        );
    }
    if let Some(ranking) = &summary.ranking {
        println!(
            "Ranking: mean {:.1} | median {:.1} | best {} | worst {}",
            ranking.mean, ranking.median, ranking.best, ranking.worst
        );
    }
    println!(
        "Scholarships: {} ({:.1}%)",
        summary.scholarships.with_scholarships, summary.scholarships.percentage
    );

    let countries = summary
        .country_distribution
        .iter()
        .map(|(country, n)| format!("{country} {n}"))
        .collect::<Vec<_>>()
        .join(", ");
    if !countries.is_empty() {
        println!("Countries: {countries}");
    }

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Candidate"),
        Cell::new("Country"),
        Cell::new("Tuition/yr"),
        Cell::new("Living/yr"),
        Cell::new(format!("Total ({years}y)")),
        Cell::new("Per Month"),
    ]);
    for c in &analysis.costs {
        let b = &c.breakdown;
        let living = if b.used_default_living_cost {
            format!("{}*", format_amount(b.yearly_living_cost))
        } else {
            format_amount(b.yearly_living_cost)
        };
        table.add_row(vec![
            Cell::new(&c.name),
            Cell::new(&b.country),
            Cell::new(format_amount(b.tuition_fee)),
            Cell::new(living),
            Cell::new(format_amount(b.total_cost)),
            Cell::new(format_amount(b.total_cost_per_month)),
        ]);
    }
    println!("{table}");
    if analysis.costs.iter().any(|c| c.breakdown.used_default_living_cost) {
        println!("* default living cost");
    }

    if let Some(a) = &analysis.affordability {
        println!(
            "Affordable within {}: {} of {} ({:.1}%), cheapest {}, mean fee {}",
            format_amount(a.max_budget),
            a.affordable_candidates,
            a.total_candidates,
            a.percentage_affordable,
            a.cheapest_candidate.as_deref().unwrap_or("-"),
            format_amount(a.average_fee_in_budget)
        );
    }

    if let Some(cmp) = &analysis.comparison {
        let rankings = cmp
            .rankings
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "Comparing {} candidates: tuition {} to {}, rankings [{}], cheapest {}, best ranked {}",
            cmp.candidates_compared,
            format_amount(cmp.tuition_range.min),
            format_amount(cmp.tuition_range.max),
            rankings,
            cmp.cheapest,
            cmp.best_ranked
        );
    }

    if let Some(by_country) = &analysis.scholarships {
        if by_country.is_empty() {
            println!("No scholarships matched the catalog's countries.");
        }
        for entry in by_country {
            println!("Scholarships in {}:", entry.country);
            for s in &entry.scholarships {
                print!("  - {} ({}, {})", s.name, s.coverage, format_amount(s.amount));
                if s.eligibility.is_empty() {
                    println!();
                } else {
                    println!(": {}", s.eligibility);
                }
            }
        }
    }
}
