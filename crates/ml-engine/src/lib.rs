pub mod engine;
pub mod model;
pub mod recommendations;

pub use engine::{CampaignInsight, CampaignOptimizer, InsightRequest};
pub use model::RegressionPredictor;
pub use recommendations::{
    generate_recommendations, recommend_budget, PerformanceSignals, Recommendation,
};
