use serde::Deserialize;
use std::path::Path;

/// Root application configuration. Loaded from environment variables
/// with the prefix `CAMPAIGN_INSIGHTS__` and an optional TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub reporting: ReportingConfig,
    #[serde(default)]
    pub ml: MlConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportingConfig {
    #[serde(default = "default_window_days")]
    pub default_window_days: i64,
    #[serde(default = "default_min_budget")]
    pub default_min_budget: f64,
    #[serde(default = "default_max_budget")]
    pub default_max_budget: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MlConfig {
    #[serde(default = "default_target_roas")]
    pub target_roas: f64,
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_ridge_lambda")]
    pub ridge_lambda: f64,
    #[serde(default = "default_model_dir")]
    pub model_dir: String,
}

// Default functions
fn default_log_filter() -> String {
    "campaign_insights=info,campaign_reporting=info,campaign_ml=info".to_string()
}
fn default_window_days() -> i64 {
    30
}
fn default_min_budget() -> f64 {
    crate::types::DEFAULT_MIN_BUDGET
}
fn default_max_budget() -> f64 {
    crate::types::DEFAULT_MAX_BUDGET
}
fn default_target_roas() -> f64 {
    3.0
}
fn default_test_fraction() -> f64 {
    0.2
}
fn default_seed() -> u64 {
    42
}
fn default_ridge_lambda() -> f64 {
    1e-3
}
fn default_model_dir() -> String {
    "./models".to_string()
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            default_window_days: default_window_days(),
            default_min_budget: default_min_budget(),
            default_max_budget: default_max_budget(),
        }
    }
}

impl Default for MlConfig {
    fn default() -> Self {
        Self {
            target_roas: default_target_roas(),
            test_fraction: default_test_fraction(),
            seed: default_seed(),
            ridge_lambda: default_ridge_lambda(),
            model_dir: default_model_dir(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            reporting: ReportingConfig::default(),
            ml: MlConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::builder(None)?.try_deserialize()
    }

    /// Load configuration from a TOML file, with environment variables taking precedence.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        Self::builder(Some(path))?.try_deserialize()
    }

    fn builder(path: Option<&Path>) -> Result<config::Config, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder
            .add_source(
                config::Environment::with_prefix("CAMPAIGN_INSIGHTS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
    }
}
