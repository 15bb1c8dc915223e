use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default lower bound for a campaign's recommended budget.
pub const DEFAULT_MIN_BUDGET: f64 = 10.0;
/// Default upper bound for a campaign's recommended budget.
pub const DEFAULT_MAX_BUDGET: f64 = 1000.0;

/// Divide `num` by `den`, returning 0.0 unless the denominator is positive.
///
/// Reports must never fail over missing data, so every derived ratio goes
/// through this guard.
#[inline]
pub fn safe_ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Round to two decimal places (currency precision).
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One day of performance data for one campaign.
///
/// Counters are signed: upstream feeds occasionally send corrections as
/// negative values and the engine accepts them unchanged. `clicks <= impressions`
/// is likewise not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub campaign_id: Uuid,
    pub date: NaiveDate,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub cost: f64,
    pub revenue: f64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub cpc: f64,
    #[serde(default)]
    pub cpa: f64,
    #[serde(default)]
    pub roas: f64,
    #[serde(default)]
    pub conversion_rate: f64,
}

impl MetricRecord {
    /// Build a record and compute its derived ratios from the raw counters.
    pub fn new(
        campaign_id: Uuid,
        date: NaiveDate,
        impressions: i64,
        clicks: i64,
        conversions: i64,
        cost: f64,
        revenue: f64,
    ) -> Self {
        let mut record = Self {
            campaign_id,
            date,
            impressions,
            clicks,
            conversions,
            cost,
            revenue,
            ctr: 0.0,
            cpc: 0.0,
            cpa: 0.0,
            roas: 0.0,
            conversion_rate: 0.0,
        };
        record.recompute();
        record
    }

    /// Refresh the derived ratios from the raw counters.
    pub fn recompute(&mut self) {
        let impressions = self.impressions as f64;
        let clicks = self.clicks as f64;
        let conversions = self.conversions as f64;

        self.ctr = safe_ratio(clicks, impressions) * 100.0;
        self.cpc = safe_ratio(self.cost, clicks);
        self.cpa = safe_ratio(self.cost, conversions);
        self.roas = safe_ratio(self.revenue, self.cost);
        self.conversion_rate = safe_ratio(conversions, clicks) * 100.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Archived,
}

#[allow(clippy::derivable_impls)]
impl Default for CampaignStatus {
    fn default() -> Self {
        Self::Draft
    }
}

/// Campaign identity as returned by the external campaign lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignIdentity {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub status: CampaignStatus,
    #[serde(default)]
    pub min_budget: Option<f64>,
    #[serde(default)]
    pub max_budget: Option<f64>,
}

impl CampaignIdentity {
    pub fn new(id: Uuid, name: impl Into<String>, status: CampaignStatus) -> Self {
        Self {
            id,
            name: name.into(),
            status,
            min_budget: None,
            max_budget: None,
        }
    }

    pub fn with_bounds(mut self, min_budget: f64, max_budget: f64) -> Self {
        self.min_budget = Some(min_budget);
        self.max_budget = Some(max_budget);
        self
    }
}

/// Efficiency inputs for one campaign in a portfolio allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    pub campaign_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub status: CampaignStatus,
    #[serde(default)]
    pub roas: f64,
    #[serde(default)]
    pub conversions: i64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default = "default_min_budget")]
    pub min_budget: f64,
    #[serde(default = "default_max_budget")]
    pub max_budget: f64,
}

fn default_min_budget() -> f64 {
    DEFAULT_MIN_BUDGET
}
fn default_max_budget() -> f64 {
    DEFAULT_MAX_BUDGET
}

impl CampaignSnapshot {
    /// Snapshot with default budget bounds.
    pub fn new(
        campaign_id: Uuid,
        name: impl Into<String>,
        roas: f64,
        conversions: i64,
        cost: f64,
    ) -> Self {
        Self {
            campaign_id,
            name: name.into(),
            status: CampaignStatus::Active,
            roas,
            conversions,
            cost,
            min_budget: DEFAULT_MIN_BUDGET,
            max_budget: DEFAULT_MAX_BUDGET,
        }
    }

    pub fn with_bounds(mut self, min_budget: f64, max_budget: f64) -> Self {
        self.min_budget = min_budget;
        self.max_budget = max_budget;
        self
    }
}
