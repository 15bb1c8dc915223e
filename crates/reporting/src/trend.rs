//! Windowed daily trends for a single campaign.

use crate::summary::{summarize, AggregateSummary};
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::types::MetricRecord;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Date-ordered records for `[start_date, end_date]` with their summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub period_days: i64,
    pub records: Vec<MetricRecord>,
    pub summary: AggregateSummary,
}

/// Per-day projection of a record for charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub cost: f64,
    pub revenue: f64,
    pub roas: f64,
}

impl From<&MetricRecord> for TrendPoint {
    fn from(r: &MetricRecord) -> Self {
        Self {
            date: r.date,
            impressions: r.impressions,
            clicks: r.clicks,
            conversions: r.conversions,
            cost: r.cost,
            revenue: r.revenue,
            roas: r.roas,
        }
    }
}

/// Campaign trend result handed to the serialization layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub period_days: i64,
    pub data_points: usize,
    pub daily_data: Vec<TrendPoint>,
    pub totals: AggregateSummary,
}

impl TrendWindow {
    pub fn data_points(&self) -> usize {
        self.records.len()
    }

    pub fn daily(&self) -> Vec<TrendPoint> {
        self.records.iter().map(TrendPoint::from).collect()
    }

    pub fn report(&self) -> TrendReport {
        TrendReport {
            period_days: self.period_days,
            data_points: self.data_points(),
            daily_data: self.daily(),
            totals: self.summary.clone(),
        }
    }
}

/// Order `records` by date and summarize them as a `window_days` trend ending at `end_date`.
///
/// Records are expected to be pre-filtered to the window by the store; they
/// are re-sorted here since store ordering is not guaranteed.
pub fn build_trend(
    mut records: Vec<MetricRecord>,
    window_days: i64,
    end_date: NaiveDate,
) -> CampaignResult<TrendWindow> {
    let start_date = window_start(end_date, window_days)?;
    records.sort_by_key(|r| r.date);

    let outside = records
        .iter()
        .filter(|r| r.date < start_date || r.date > end_date)
        .count();
    if outside > 0 {
        debug!(outside, window_days, "Trend records fall outside the requested window");
    }

    let summary = summarize(&records);

    Ok(TrendWindow {
        start_date,
        end_date,
        period_days: window_days,
        records,
        summary,
    })
}

/// First day of a `window_days` window ending at `end_date`.
///
/// Fails with `InvalidArgument` unless `window_days` is positive.
pub fn window_start(end_date: NaiveDate, window_days: i64) -> CampaignResult<NaiveDate> {
    if window_days <= 0 {
        return Err(CampaignError::invalid(format!(
            "window_days must be positive, got {window_days}"
        )));
    }
    Duration::try_days(window_days)
        .and_then(|d| end_date.checked_sub_signed(d))
        .ok_or_else(|| {
            CampaignError::invalid(format!("window of {window_days} days is out of range"))
        })
}
