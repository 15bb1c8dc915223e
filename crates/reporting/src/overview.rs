//! Portfolio overview: roll-up of per-campaign comparison rows.

use crate::comparison::CampaignComparison;
use campaign_core::types::{safe_ratio, CampaignStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How many campaigns the overview lists as top performers.
pub const TOP_CAMPAIGNS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioOverview {
    pub period: String,
    pub total_campaigns: usize,
    pub active_campaigns: usize,
    pub total_spend: f64,
    pub total_revenue: f64,
    pub total_impressions: i64,
    pub total_clicks: i64,
    pub total_conversions: i64,
    pub average_ctr: f64,
    pub average_cpc: f64,
    pub average_roas: f64,
    /// Highest-ROAS campaigns, best first.
    pub top_campaigns: Vec<CampaignComparison>,
    pub generated_at: DateTime<Utc>,
}

/// Roll up comparison rows for all campaigns into a single overview.
pub fn build_overview(rows: &[CampaignComparison], period_days: i64) -> PortfolioOverview {
    let total_spend: f64 = rows.iter().map(|r| r.metrics.total_cost).sum();
    let total_revenue: f64 = rows.iter().map(|r| r.metrics.total_revenue).sum();
    let total_impressions = saturating_total(rows, |r| r.metrics.total_impressions);
    let total_clicks = saturating_total(rows, |r| r.metrics.total_clicks);
    let total_conversions = saturating_total(rows, |r| r.metrics.total_conversions);

    let mut top_campaigns = rows.to_vec();
    top_campaigns.sort_by(|a, b| b.metrics.total_roas.total_cmp(&a.metrics.total_roas));
    top_campaigns.truncate(TOP_CAMPAIGNS);

    PortfolioOverview {
        period: format!("Last {period_days} days"),
        total_campaigns: rows.len(),
        active_campaigns: rows
            .iter()
            .filter(|r| r.status == CampaignStatus::Active)
            .count(),
        total_spend,
        total_revenue,
        total_impressions,
        total_clicks,
        total_conversions,
        average_ctr: safe_ratio(total_clicks as f64, total_impressions as f64) * 100.0,
        average_cpc: safe_ratio(total_spend, total_clicks as f64),
        average_roas: safe_ratio(total_revenue, total_spend),
        top_campaigns,
        generated_at: Utc::now(),
    }
}

fn saturating_total(rows: &[CampaignComparison], counter: fn(&CampaignComparison) -> i64) -> i64 {
    rows.iter().map(counter).fold(0, i64::saturating_add)
}
