//! Aggregation of metric records into totals and derived ratios.

use campaign_core::types::{safe_ratio, MetricRecord};
use serde::{Deserialize, Serialize};

/// Totals over a record set plus ratios computed from those totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub total_impressions: i64,
    pub total_clicks: i64,
    pub total_conversions: i64,
    pub total_cost: f64,
    pub total_revenue: f64,
    /// `total_clicks / total_impressions * 100`.
    pub average_ctr: f64,
    /// `total_cost / total_clicks`.
    pub average_cpc: f64,
    /// `total_cost / total_conversions`.
    pub average_cpa: f64,
    /// `total_revenue / total_cost`.
    pub total_roas: f64,
}

impl AggregateSummary {
    /// Fold one more record into the totals. Ratios are left stale until
    /// [`AggregateSummary::finalize`]. Counter totals saturate at the `i64` bounds.
    fn accumulate(&mut self, record: &MetricRecord) {
        self.total_impressions = self.total_impressions.saturating_add(record.impressions);
        self.total_clicks = self.total_clicks.saturating_add(record.clicks);
        self.total_conversions = self.total_conversions.saturating_add(record.conversions);
        self.total_cost += record.cost;
        self.total_revenue += record.revenue;
    }

    fn finalize(mut self) -> Self {
        let impressions = self.total_impressions as f64;
        let clicks = self.total_clicks as f64;
        let conversions = self.total_conversions as f64;

        self.average_ctr = safe_ratio(clicks, impressions) * 100.0;
        self.average_cpc = safe_ratio(self.total_cost, clicks);
        self.average_cpa = safe_ratio(self.total_cost, conversions);
        self.total_roas = safe_ratio(self.total_revenue, self.total_cost);
        self
    }

    /// Conversions per click, as a percentage.
    pub fn conversion_rate(&self) -> f64 {
        safe_ratio(self.total_conversions as f64, self.total_clicks as f64) * 100.0
    }

    pub fn is_empty(&self) -> bool {
        self.total_impressions == 0
            && self.total_clicks == 0
            && self.total_conversions == 0
            && self.total_cost == 0.0
            && self.total_revenue == 0.0
    }
}

/// Reduce records to an [`AggregateSummary`].
///
/// Ratios come from the totals, never from averaging per-record ratios, so
/// low-volume days do not skew the result. Negative or inconsistent values
/// are summed as given.
pub fn summarize(records: &[MetricRecord]) -> AggregateSummary {
    records
        .iter()
        .fold(AggregateSummary::default(), |mut acc, r| {
            acc.accumulate(r);
            acc
        })
        .finalize()
}
