//! The `admitrank init` command.

use std::path::Path;

use anyhow::Result;

fn write_if_missing(path: &str, content: &str) -> Result<()> {
    if Path::new(path).exists() {
        println!("{path} already exists, skipping.");
    } else {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        println!("Created {path}");
    }
    Ok(())
}

pub fn execute() -> Result<()> {
    write_if_missing("admitrank.toml", SAMPLE_CONFIG)?;
    write_if_missing("catalogs/example.toml", EXAMPLE_CATALOG)?;
    write_if_missing("profile.toml", EXAMPLE_PROFILE)?;
    write_if_missing("scholarships.toml", EXAMPLE_SCHOLARSHIPS)?;

    println!("\nNext steps:");
    println!("  1. Edit profile.toml with the student's scores and budget");
    println!("  2. Run: admitrank validate --catalog catalogs/example.toml");
    println!("  3. Run: admitrank recommend --catalog catalogs --profile profile.toml --explain");
    println!("  4. Run: admitrank analyze --catalog catalogs --scholarships scholarships.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# admitrank configuration

# Remote admission model. Without a [signal] section the built-in
# GPA/IELTS heuristic is used.
# [signal]
# type = "http"
# base_url = "http://localhost:8080"
# api_key = "${ADMITRANK_SIGNAL_API_KEY}"
# timeout_secs = 10

parallelism = 4
k_values = [1, 5, 10]
default_sort = "combined_score"
default_top_k = 10
output_dir = "./admitrank-results"

[weights]
ml_weight = 0.6
rule_weight = 0.4

[living_costs]
default_monthly_cost = 1000.0

[living_costs.per_country]
# Portugal = 800.0
"#;

const EXAMPLE_CATALOG: &str = r#"[catalog]
id = "example"
name = "Example Catalog"
description = "A few European universities to get started"

[[candidates]]
id = "tum"
name = "Technical University of Munich"
country = "Germany"
ranking = 37
tuition_fee = 0.0
programs = ["Informatics", "Data Engineering and Analytics", "Robotics"]
scholarship_available = true

[[candidates]]
id = "uva"
name = "University of Amsterdam"
country = "Netherlands"
ranking = 55
tuition_fee = 16000.0
programs = ["Data Science", "Artificial Intelligence", "Computational Science"]
scholarship_available = true

[[candidates]]
id = "kth"
name = "KTH Royal Institute of Technology"
country = "Sweden"
ranking = 73
tuition_fee = 17500.0
programs = ["Computer Science", "Machine Learning"]
scholarship_available = false
"#;

const EXAMPLE_PROFILE: &str = r#"[profile]
gpa = 3.5
ielts = 7.0
budget = 15000.0
country = "Germany"
field = "Computer Science"
"#;

const EXAMPLE_SCHOLARSHIPS: &str = r#"# Scholarships matched by country in `admitrank analyze`.
# coverage is "full" or "partial"; amount is per year.

[[scholarships]]
name = "DAAD Study Scholarship"
country = "Germany"
coverage = "partial"
amount = 11208
eligibility = "Graduates with a first degree applying to a master's programme"

[[scholarships]]
name = "Swedish Institute Scholarship for Global Professionals"
country = "Sweden"
coverage = "full"
amount = 12000
eligibility = "Work experience and demonstrated leadership"
"#;
