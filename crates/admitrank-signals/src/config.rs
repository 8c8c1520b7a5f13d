//! Configuration file loading and the signal factory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use admitrank_core::cost::{LivingCostTable, DEFAULT_MONTHLY_LIVING_COST};
use admitrank_core::evaluation::DEFAULT_K_VALUES;
use admitrank_core::model::{CandidateRecord, SortKey, StudentProfile};
use admitrank_core::scoring::ScoringWeights;
use admitrank_core::traits::{FnSignal, SignalProvider};

use crate::http::{HttpSignalProvider, DEFAULT_TIMEOUT_SECS};

/// Where the admission-likelihood signal comes from.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SignalConfig {
    Http {
        base_url: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    Fixed {
        value: f64,
    },
}

impl std::fmt::Debug for SignalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalConfig::Http {
                base_url,
                api_key,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("api_key", &api_key.as_ref().map(|_| "***"))
                .field("timeout_secs", timeout_secs)
                .finish(),
            SignalConfig::Fixed { value } => {
                f.debug_struct("Fixed").field("value", value).finish()
            }
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Fusion weights as written in the config file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightsConfig {
    pub ml_weight: f64,
    pub rule_weight: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        let weights = ScoringWeights::default();
        Self {
            ml_weight: weights.ml_weight(),
            rule_weight: weights.rule_weight(),
        }
    }
}

/// Living-cost overrides layered on the built-in table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivingCostsConfig {
    #[serde(default = "default_monthly_cost")]
    pub default_monthly_cost: f64,
    #[serde(default)]
    pub per_country: BTreeMap<String, f64>,
}

impl Default for LivingCostsConfig {
    fn default() -> Self {
        Self {
            default_monthly_cost: default_monthly_cost(),
            per_country: BTreeMap::new(),
        }
    }
}

fn default_monthly_cost() -> f64 {
    DEFAULT_MONTHLY_LIVING_COST
}

/// Top-level admitrank configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmitrankConfig {
    /// External signal; the built-in heuristic is used when absent.
    #[serde(default)]
    pub signal: Option<SignalConfig>,
    #[serde(default)]
    pub weights: WeightsConfig,
    /// Max concurrent signal requests.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Cutoffs for ranking metrics.
    #[serde(default = "default_k_values")]
    pub k_values: Vec<usize>,
    #[serde(default)]
    pub default_sort: SortKey,
    #[serde(default = "default_top_k")]
    pub default_top_k: Option<usize>,
    #[serde(default)]
    pub living_costs: LivingCostsConfig,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_parallelism() -> usize {
    4
}
fn default_k_values() -> Vec<usize> {
    DEFAULT_K_VALUES.to_vec()
}
fn default_top_k() -> Option<usize> {
    Some(10)
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./admitrank-results")
}

impl Default for AdmitrankConfig {
    fn default() -> Self {
        Self {
            signal: None,
            weights: WeightsConfig::default(),
            parallelism: default_parallelism(),
            k_values: default_k_values(),
            default_sort: SortKey::default(),
            default_top_k: default_top_k(),
            living_costs: LivingCostsConfig::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl AdmitrankConfig {
    /// Validated fusion weights.
    pub fn scoring_weights(&self) -> Result<ScoringWeights> {
        ScoringWeights::new(self.weights.ml_weight, self.weights.rule_weight)
            .context("invalid [weights] in config")
    }

    /// The built-in living-cost table with this config's overrides applied.
    pub fn living_cost_table(&self) -> Result<LivingCostTable> {
        let table = LivingCostTable {
            default_monthly_cost: self.living_costs.default_monthly_cost,
            ..LivingCostTable::default()
        }
        .merged(&self.living_costs.per_country);
        table.validate().context("invalid [living_costs] in config")?;
        Ok(table)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn resolve_signal_config(config: &SignalConfig) -> SignalConfig {
    match config {
        SignalConfig::Http {
            base_url,
            api_key,
            timeout_secs,
        } => SignalConfig::Http {
            base_url: resolve_env_vars(base_url),
            api_key: api_key.as_deref().map(resolve_env_vars),
            timeout_secs: *timeout_secs,
        },
        SignalConfig::Fixed { value } => SignalConfig::Fixed { value: *value },
    }
}

/// Apply `ADMITRANK_SIGNAL_URL` / `ADMITRANK_SIGNAL_API_KEY` values.
fn apply_overrides(config: &mut AdmitrankConfig, url: Option<String>, key: Option<String>) {
    if let Some(url) = url {
        match &mut config.signal {
            Some(SignalConfig::Http { base_url, .. }) => *base_url = url,
            _ => {
                config.signal = Some(SignalConfig::Http {
                    base_url: url,
                    api_key: None,
                    timeout_secs: DEFAULT_TIMEOUT_SECS,
                })
            }
        }
    }

    if let Some(key) = key {
        if let Some(SignalConfig::Http { api_key, .. }) = &mut config.signal {
            *api_key = Some(key);
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `admitrank.toml` in the current directory
/// 2. `~/.config/admitrank/config.toml`
///
/// Environment variable overrides: `ADMITRANK_SIGNAL_URL`, `ADMITRANK_SIGNAL_API_KEY`.
pub fn load_config() -> Result<AdmitrankConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AdmitrankConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("admitrank.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            parse_config_file(&path)?
        }
        None => AdmitrankConfig::default(),
    };

    apply_overrides(
        &mut config,
        std::env::var("ADMITRANK_SIGNAL_URL").ok(),
        std::env::var("ADMITRANK_SIGNAL_API_KEY").ok(),
    );
    config.signal = config.signal.as_ref().map(resolve_signal_config);

    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<AdmitrankConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<AdmitrankConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("admitrank"))
}

/// Create a signal provider from its configuration.
pub fn create_signal(config: &SignalConfig) -> Result<Arc<dyn SignalProvider>> {
    match config {
        SignalConfig::Http {
            base_url,
            api_key,
            timeout_secs,
        } => Ok(Arc::new(HttpSignalProvider::new(
            base_url,
            api_key.clone(),
            *timeout_secs,
        )?)),
        SignalConfig::Fixed { value } => {
            let value = *value;
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("fixed signal value must be within [0, 1], got {value}");
            }
            Ok(Arc::new(FnSignal::new(
                "fixed",
                move |_: &CandidateRecord, _: &StudentProfile| value,
            )))
        }
    }
}
