//! Calendar bucketing of daily records for analytics queries.

use campaign_core::types::MetricRecord;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Day,
    Week,
    Month,
}

impl GroupBy {
    /// First day of the bucket containing `date`. Weeks start on Monday.
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
            Self::Month => date.with_day(1).unwrap_or(date),
        }
    }
}

/// Sum records into one record per `(campaign, bucket)`, dated at the bucket
/// start, with ratios recomputed from the sums. Output is ordered by date,
/// then campaign.
pub fn rollup(records: &[MetricRecord], group_by: GroupBy) -> Vec<MetricRecord> {
    let mut buckets: BTreeMap<(NaiveDate, Uuid), MetricRecord> = BTreeMap::new();

    for r in records {
        let start = group_by.bucket_start(r.date);
        buckets
            .entry((start, r.campaign_id))
            .and_modify(|b| {
                b.impressions = b.impressions.saturating_add(r.impressions);
                b.clicks = b.clicks.saturating_add(r.clicks);
                b.conversions = b.conversions.saturating_add(r.conversions);
                b.cost += r.cost;
                b.revenue += r.revenue;
            })
            .or_insert_with(|| MetricRecord {
                date: start,
                ..r.clone()
            });
    }

    buckets
        .into_values()
        .map(|mut b| {
            b.recompute();
            b
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: Uuid, m: u32, d: u32, clicks: i64, cost: f64) -> MetricRecord {
        let date = NaiveDate::from_ymd_opt(2024, m, d).unwrap();
        MetricRecord::new(id, date, clicks * 10, clicks, 1, cost, cost * 2.0)
    }

    #[test]
    fn test_bucket_start() {
        // 2024-04-10 is a Wednesday.
        let d = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        assert_eq!(GroupBy::Day.bucket_start(d), d);
        assert_eq!(
            GroupBy::Week.bucket_start(d),
            NaiveDate::from_ymd_opt(2024, 4, 8).unwrap()
        );
        assert_eq!(
            GroupBy::Month.bucket_start(d),
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
        );
    }

    #[test]
    fn test_weekly_rollup_recomputes_ratios() {
        let id = Uuid::new_v4();
        let records = vec![
            rec(id, 4, 8, 5, 10.0),
            rec(id, 4, 9, 15, 30.0),
            rec(id, 4, 15, 2, 4.0),
        ];
        let weeks = rollup(&records, GroupBy::Week);
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].clicks, 20);
        assert_eq!(weeks[0].conversions, 2);
        assert!((weeks[0].cpc - 2.0).abs() < 1e-9);
        assert!((weeks[0].ctr - 10.0).abs() < 1e-9);
        assert!((weeks[0].roas - 2.0).abs() < 1e-9);
        assert_eq!(weeks[1].date, NaiveDate::from_ymd_opt(2024, 4, 15).unwrap());
    }

    #[test]
    fn test_rollup_counters_saturate() {
        let id = Uuid::new_v4();
        let mut big = rec(id, 4, 8, 1, 1.0);
        big.impressions = i64::MAX;
        big.conversions = i64::MAX;
        let records = vec![big, rec(id, 4, 9, 1, 1.0)];
        let weeks = rollup(&records, GroupBy::Week);
        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0].impressions, i64::MAX);
        assert_eq!(weeks[0].conversions, i64::MAX);
        assert_eq!(weeks[0].clicks, 2);
    }

    #[test]
    fn test_monthly_rollup_keeps_campaigns_apart() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let records = vec![
            rec(a, 4, 1, 1, 1.0),
            rec(b, 4, 2, 1, 1.0),
            rec(a, 4, 30, 1, 1.0),
        ];
        let months = rollup(&records, GroupBy::Month);
        assert_eq!(months.len(), 2);
        let for_a = months.iter().find(|r| r.campaign_id == a).unwrap();
        assert_eq!(for_a.clicks, 2);
    }
}
