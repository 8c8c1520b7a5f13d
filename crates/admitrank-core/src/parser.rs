//! Catalog, profile, scholarship and evaluation-log loading.
//!
//! Catalogs, profiles and scholarship lists are TOML; evaluation logs are JSON. Every record
//! is sanitized and range-checked here so the scorers only ever see
//! well-formed input.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::evaluation::EvaluationLog;
use crate::model::{CandidateRecord, Catalog, StudentProfile};
use crate::scholarships::{Coverage, Scholarship};

/// Intermediate TOML structure for catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    catalog: TomlCatalogHeader,
    #[serde(default)]
    candidates: Vec<TomlCandidate>,
}

#[derive(Debug, Deserialize)]
struct TomlCatalogHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlCandidate {
    id: String,
    name: String,
    #[serde(default)]
    country: String,
    ranking: i64,
    #[serde(default)]
    tuition_fee: f64,
    #[serde(default)]
    programs: Vec<String>,
    #[serde(default)]
    scholarship_available: bool,
}

#[derive(Debug, Deserialize)]
struct TomlProfileFile {
    profile: TomlProfile,
}

#[derive(Debug, Deserialize)]
struct TomlProfile {
    gpa: f64,
    ielts: f64,
    #[serde(default)]
    budget: f64,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    field: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlScholarshipFile {
    #[serde(default)]
    scholarships: Vec<TomlScholarship>,
}

#[derive(Debug, Deserialize)]
struct TomlScholarship {
    name: String,
    country: String,
    coverage: String,
    #[serde(default)]
    amount: f64,
    #[serde(default)]
    eligibility: String,
}

/// Trim and fold line breaks into spaces.
pub fn sanitize_text(value: &str) -> String {
    value.trim().replace(['\n', '\r'], " ")
}

fn sanitize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| sanitize_text(&v))
        .filter(|v| !v.is_empty())
}

/// Parse a single TOML catalog file.
pub fn parse_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    parse_catalog_str(&content, path)
}

/// Parse a TOML string into a `Catalog`.
pub fn parse_catalog_str(content: &str, source_path: &Path) -> Result<Catalog> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let candidates = parsed
        .candidates
        .into_iter()
        .map(|c| {
            let ranking = u32::try_from(c.ranking)
                .ok()
                .filter(|r| *r > 0)
                .with_context(|| {
                    format!(
                        "candidate '{}': ranking must be a positive integer, got {}",
                        c.id, c.ranking
                    )
                })?;

            let candidate = CandidateRecord {
                id: sanitize_text(&c.id),
                name: sanitize_text(&c.name),
                country: sanitize_text(&c.country),
                ranking,
                tuition_fee: c.tuition_fee,
                programs: c
                    .programs
                    .iter()
                    .map(|p| sanitize_text(p))
                    .filter(|p| !p.is_empty())
                    .collect(),
                scholarship_available: c.scholarship_available,
            };
            candidate
                .validate()
                .with_context(|| format!("invalid candidate '{}'", candidate.id))?;
            Ok(candidate)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Catalog {
        id: sanitize_text(&parsed.catalog.id),
        name: sanitize_text(&parsed.catalog.name),
        description: sanitize_text(&parsed.catalog.description),
        candidates,
    })
}

/// Recursively load all `.toml` catalogs from a directory.
pub fn load_catalog_directory(dir: &Path) -> Result<Vec<Catalog>> {
    let mut catalogs = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();

        if path.is_dir() {
            catalogs.extend(load_catalog_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_catalog(&path) {
                Ok(catalog) => catalogs.push(catalog),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    catalogs.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(catalogs)
}

/// Load a catalog from a file, or merge every catalog in a directory.
pub fn load_candidates(path: &Path) -> Result<Vec<CandidateRecord>> {
    if path.is_dir() {
        Ok(load_catalog_directory(path)?
            .into_iter()
            .flat_map(|c| c.candidates)
            .collect())
    } else {
        Ok(parse_catalog(path)?.candidates)
    }
}

/// Parse a `[profile]` TOML file.
pub fn parse_profile(path: &Path) -> Result<StudentProfile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile file: {}", path.display()))?;

    parse_profile_str(&content, path)
}

pub fn parse_profile_str(content: &str, source_path: &Path) -> Result<StudentProfile> {
    let parsed: TomlProfileFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let p = parsed.profile;
    let profile = StudentProfile {
        gpa: p.gpa,
        ielts: p.ielts,
        budget: p.budget,
        country: sanitize_optional(p.country),
        field: sanitize_optional(p.field),
    };
    profile
        .validate()
        .with_context(|| format!("invalid profile: {}", source_path.display()))?;
    Ok(profile)
}

/// Parse a `[[scholarships]]` TOML file.
pub fn parse_scholarships(path: &Path) -> Result<Vec<Scholarship>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scholarship file: {}", path.display()))?;

    parse_scholarships_str(&content, path)
}

pub fn parse_scholarships_str(content: &str, source_path: &Path) -> Result<Vec<Scholarship>> {
    let parsed: TomlScholarshipFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    parsed
        .scholarships
        .into_iter()
        .map(|s| {
            let coverage = s
                .coverage
                .parse::<Coverage>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("scholarship '{}'", s.name))?;
            let scholarship = Scholarship {
                name: sanitize_text(&s.name),
                country: sanitize_text(&s.country),
                coverage,
                amount: s.amount,
                eligibility: sanitize_text(&s.eligibility),
            };
            scholarship
                .validate()
                .with_context(|| format!("invalid scholarship '{}'", scholarship.name))?;
            Ok(scholarship)
        })
        .collect()
}

/// Load a JSON evaluation log.
pub fn load_evaluation_log(path: &Path) -> Result<EvaluationLog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read evaluation log: {}", path.display()))?;
    let log: EvaluationLog = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse evaluation log: {}", path.display()))?;
    Ok(log)
}

/// A warning from catalog validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The candidate ID (if applicable).
    pub candidate_id: Option<String>,
    pub message: String,
}

/// Check a catalog for issues that don't prevent scoring.
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if catalog.candidates.is_empty() {
        warnings.push(ValidationWarning {
            candidate_id: None,
            message: "catalog has no candidates".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for c in &catalog.candidates {
        if !seen_ids.insert(&c.id) {
            warnings.push(ValidationWarning {
                candidate_id: Some(c.id.clone()),
                message: format!("duplicate candidate ID: {}", c.id),
            });
        }
    }

    for c in &catalog.candidates {
        if c.name.is_empty() {
            warnings.push(ValidationWarning {
                candidate_id: Some(c.id.clone()),
                message: "name is empty".into(),
            });
        }
        if c.programs.is_empty() {
            warnings.push(ValidationWarning {
                candidate_id: Some(c.id.clone()),
                message: "no programs listed; field alignment will be neutral".into(),
            });
        }
        if c.country.is_empty() {
            warnings.push(ValidationWarning {
                candidate_id: Some(c.id.clone()),
                message: "country is empty; living costs will use the default".into(),
            });
        }
    }

    warnings
}
