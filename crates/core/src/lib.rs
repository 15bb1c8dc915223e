pub mod config;
pub mod error;
pub mod inference;
pub mod store;
pub mod types;

pub use config::AppConfig;
pub use error::{CampaignError, CampaignResult};
pub use inference::{
    CampaignFeatures, Dataset, FeatureVector, PerformancePredictor, Prediction, TrainingMetrics,
    TrainingSample, FEATURE_COUNT, FEATURE_NAMES,
};
pub use store::{CampaignScope, MetricStore, RecordQuery};
pub use types::{CampaignIdentity, CampaignSnapshot, CampaignStatus, MetricRecord};
