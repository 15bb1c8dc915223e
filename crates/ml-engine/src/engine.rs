//! Campaign optimizer: owns the ROAS and conversion predictors and assembles
//! per-campaign insights.

use crate::model::RegressionPredictor;
use crate::recommendations::{generate_recommendations, recommend_budget, PerformanceSignals};
use campaign_core::config::MlConfig;
use campaign_core::error::CampaignResult;
use campaign_core::inference::{
    CampaignFeatures, Dataset, PerformancePredictor, Prediction, TrainingMetrics, TrainingSample,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

const ROAS_MODEL_FILE: &str = "roas_model.json";
const CONVERSION_MODEL_FILE: &str = "conversion_model.json";

/// Input for a single campaign insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRequest {
    pub campaign_id: Uuid,
    #[serde(default)]
    pub features: CampaignFeatures,
    /// ROAS observed so far.
    #[serde(default)]
    pub current_roas: f64,
}

/// Predicted performance plus recommendations for one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignInsight {
    pub campaign_id: Uuid,
    pub predicted_roas: f64,
    pub predicted_conversions: u64,
    pub recommended_budget: f64,
    pub confidence: f64,
    pub recommendations: Vec<String>,
}

/// Thread-safe optimizer wrapping two predictors.
///
/// Predictions take a read lock; training takes the write lock, so concurrent
/// training requests run one at a time.
pub struct CampaignOptimizer<P: PerformancePredictor = RegressionPredictor> {
    roas_model: RwLock<P>,
    conversion_model: RwLock<P>,
    config: MlConfig,
}

impl CampaignOptimizer<RegressionPredictor> {
    /// Optimizer backed by the reference ridge-regression predictors.
    pub fn new(config: &MlConfig) -> Self {
        Self::with_predictors(
            RegressionPredictor::new("roas", config),
            RegressionPredictor::new("conversions", config),
            config,
        )
    }
}

impl<P: PerformancePredictor> CampaignOptimizer<P> {
    pub fn with_predictors(roas_model: P, conversion_model: P, config: &MlConfig) -> Self {
        info!(
            roas_model = roas_model.name(),
            conversion_model = conversion_model.name(),
            "Campaign optimizer initialized"
        );
        Self {
            roas_model: RwLock::new(roas_model),
            conversion_model: RwLock::new(conversion_model),
            config: config.clone(),
        }
    }

    pub fn train_roas_model(&self, samples: &[TrainingSample]) -> CampaignResult<TrainingMetrics> {
        info!(samples = samples.len(), "Training ROAS prediction model");
        let dataset = Dataset::from_samples(samples, |s| s.roas);
        self.roas_model.write().train(&dataset)
    }

    pub fn train_conversion_model(
        &self,
        samples: &[TrainingSample],
    ) -> CampaignResult<TrainingMetrics> {
        info!(samples = samples.len(), "Training conversion prediction model");
        let dataset = Dataset::from_samples(samples, |s| s.conversions);
        self.conversion_model.write().train(&dataset)
    }

    pub fn predict_roas(&self, features: &CampaignFeatures) -> CampaignResult<Prediction> {
        let prediction = self.roas_model.read().predict(&features.as_feature_vector())?;
        metrics::counter!("ml.predictions", "model" => "roas").increment(1);
        Ok(prediction)
    }

    /// Predicted conversions, truncated and floored at zero.
    pub fn predict_conversions(&self, features: &CampaignFeatures) -> CampaignResult<u64> {
        let prediction = self
            .conversion_model
            .read()
            .predict(&features.as_feature_vector())?;
        metrics::counter!("ml.predictions", "model" => "conversions").increment(1);
        Ok(prediction.value.max(0.0).trunc() as u64)
    }

    pub fn is_trained(&self) -> bool {
        self.roas_model.read().is_trained() && self.conversion_model.read().is_trained()
    }

    /// Target ROAS from the features, or the configured default when unset.
    pub fn target_roas(&self, features: &CampaignFeatures) -> f64 {
        if features.target_roas > 0.0 {
            features.target_roas
        } else {
            self.config.target_roas
        }
    }

    /// Predictions, budget recommendation, and rule-based advice for one campaign.
    pub fn insight(&self, request: &InsightRequest) -> CampaignResult<CampaignInsight> {
        let roas = self.predict_roas(&request.features)?;
        let predicted_conversions = self.predict_conversions(&request.features)?;

        let target_roas = self.target_roas(&request.features);
        let signals = PerformanceSignals {
            ctr: request.features.ctr,
            cpc: request.features.cpc,
            roas: request.current_roas,
            target_roas,
            daily_budget: request.features.daily_budget,
        };
        let recommendations = generate_recommendations(&signals)
            .iter()
            .map(ToString::to_string)
            .collect();

        debug!(
            campaign_id = %request.campaign_id,
            predicted_roas = roas.value,
            "Insight generated"
        );

        Ok(CampaignInsight {
            campaign_id: request.campaign_id,
            predicted_roas: roas.value,
            predicted_conversions,
            recommended_budget: recommend_budget(
                request.features.daily_budget,
                request.current_roas,
                target_roas,
            ),
            confidence: roas.confidence,
            recommendations,
        })
    }
}

impl<P> CampaignOptimizer<P>
where
    P: PerformancePredictor + Serialize + DeserializeOwned,
{
    /// Write trained models as JSON into `dir`. Untrained models are skipped.
    pub fn save_models(&self, dir: &Path) -> CampaignResult<()> {
        fs::create_dir_all(dir)?;
        save_model(&*self.roas_model.read(), &dir.join(ROAS_MODEL_FILE))?;
        save_model(&*self.conversion_model.read(), &dir.join(CONVERSION_MODEL_FILE))?;
        info!(path = %dir.display(), "Models saved");
        Ok(())
    }

    /// Replace models with any saved under `dir`. Missing files are ignored.
    pub fn load_models(&self, dir: &Path) -> CampaignResult<()> {
        if let Some(model) = load_model(&dir.join(ROAS_MODEL_FILE))? {
            *self.roas_model.write() = model;
        }
        if let Some(model) = load_model(&dir.join(CONVERSION_MODEL_FILE))? {
            *self.conversion_model.write() = model;
        }
        info!(path = %dir.display(), "Models loaded");
        Ok(())
    }
}

fn save_model<P>(model: &P, path: &Path) -> CampaignResult<()>
where
    P: PerformancePredictor + Serialize,
{
    if !model.is_trained() {
        debug!(model = model.name(), "Skipping save of untrained model");
        return Ok(());
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, model)?;
    Ok(())
}

fn load_model<P: DeserializeOwned>(path: &Path) -> CampaignResult<Option<P>> {
    if !path.exists() {
        return Ok(None);
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(Some(serde_json::from_reader(reader)?))
}
