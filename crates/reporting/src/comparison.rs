//! Side-by-side campaign comparison over a shared window.

use crate::summary::{summarize, AggregateSummary};
use campaign_core::types::{CampaignIdentity, CampaignStatus, MetricRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One campaign's records for the comparison window.
#[derive(Debug, Clone)]
pub struct CampaignRecords {
    pub identity: CampaignIdentity,
    pub records: Vec<MetricRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignComparison {
    pub campaign_id: Uuid,
    pub campaign_name: String,
    pub status: CampaignStatus,
    pub metrics: AggregateSummary,
}

/// Metric used to rank comparison rows for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMetric {
    Impressions,
    Clicks,
    Conversions,
    Cost,
    Revenue,
    Roas,
    Ctr,
}

impl ComparisonMetric {
    fn value(&self, s: &AggregateSummary) -> f64 {
        match self {
            Self::Impressions => s.total_impressions as f64,
            Self::Clicks => s.total_clicks as f64,
            Self::Conversions => s.total_conversions as f64,
            Self::Cost => s.total_cost,
            Self::Revenue => s.total_revenue,
            Self::Roas => s.total_roas,
            Self::Ctr => s.average_ctr,
        }
    }
}

/// Summarize each campaign independently, preserving input order.
///
/// Campaigns without records are kept with an all-zero summary.
pub fn compare(campaigns: &[CampaignRecords]) -> Vec<CampaignComparison> {
    campaigns
        .iter()
        .map(|c| CampaignComparison {
            campaign_id: c.identity.id,
            campaign_name: c.identity.name.clone(),
            status: c.identity.status,
            metrics: summarize(&c.records),
        })
        .collect()
}

/// Stable descending sort of comparison rows by `metric`.
pub fn rank_by(rows: &mut [CampaignComparison], metric: ComparisonMetric) {
    rows.sort_by(|a, b| {
        metric
            .value(&b.metrics)
            .total_cmp(&metric.value(&a.metrics))
    });
}
