//! Pluggable performance-predictor abstraction.
//!
//! Any regression technique can back the optimizer as long as it implements
//! [`PerformancePredictor`] over the fixed feature layout in [`FEATURE_NAMES`].

use crate::error::{CampaignError, CampaignResult};
use serde::{Deserialize, Serialize};

/// Number of model input features.
pub const FEATURE_COUNT: usize = 9;

/// Feature vector layout. Substitute predictors must keep this order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "daily_budget",
    "bid_amount",
    "target_cpa",
    "target_roas",
    "impressions",
    "clicks",
    "ctr",
    "cpc",
    "days_running",
];

/// Upper bound on any confidence reported by the reference predictor.
pub const MAX_CONFIDENCE: f64 = 0.95;

pub type FeatureVector = [f64; FEATURE_COUNT];

/// Campaign attributes fed to a predictor. Missing fields deserialize to 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignFeatures {
    pub daily_budget: f64,
    pub bid_amount: f64,
    pub target_cpa: f64,
    pub target_roas: f64,
    pub impressions: f64,
    pub clicks: f64,
    pub ctr: f64,
    pub cpc: f64,
    pub days_running: f64,
}

impl CampaignFeatures {
    pub fn as_feature_vector(&self) -> FeatureVector {
        [
            self.daily_budget,
            self.bid_amount,
            self.target_cpa,
            self.target_roas,
            self.impressions,
            self.clicks,
            self.ctr,
            self.cpc,
            self.days_running,
        ]
    }
}

/// Historical observation used for training: features plus the observed outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    #[serde(flatten)]
    pub features: CampaignFeatures,
    #[serde(default)]
    pub roas: f64,
    #[serde(default)]
    pub conversions: f64,
}

/// Feature rows paired with one regression target.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<FeatureVector>,
    targets: Vec<f64>,
}

impl Dataset {
    pub fn new(rows: Vec<FeatureVector>, targets: Vec<f64>) -> CampaignResult<Self> {
        if rows.len() != targets.len() {
            return Err(CampaignError::invalid(format!(
                "dataset has {} rows but {} targets",
                rows.len(),
                targets.len()
            )));
        }
        Ok(Self { rows, targets })
    }

    /// Build a dataset from training samples, selecting the target with `target`.
    pub fn from_samples<F>(samples: &[TrainingSample], target: F) -> Self
    where
        F: Fn(&TrainingSample) -> f64,
    {
        Self {
            rows: samples.iter().map(|s| s.features.as_feature_vector()).collect(),
            targets: samples.iter().map(target).collect(),
        }
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Fit quality reported by [`PerformancePredictor::train`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub train_r2: f64,
    pub test_r2: f64,
    /// Rows used for fitting (the training split).
    pub n_samples: usize,
}

/// A single prediction with a confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub value: f64,
    pub confidence: f64,
}

/// Capability interface for regression models backing the optimizer.
pub trait PerformancePredictor: Send + Sync {
    /// Fit the model. Replaces any previous fit.
    fn train(&mut self, dataset: &Dataset) -> CampaignResult<TrainingMetrics>;

    /// Predict a value for one feature vector.
    ///
    /// Fails with [`CampaignError::ModelNotTrained`] before the first successful `train`.
    fn predict(&self, features: &FeatureVector) -> CampaignResult<Prediction>;

    fn is_trained(&self) -> bool;

    /// Predictor name for logging.
    fn name(&self) -> &str;
}
