//! Analytics facade over a [`MetricStore`]: fetches records for a request and
//! hands them to the aggregation, trend, comparison, and allocation components.

use crate::budget::{AllocationResult, PortfolioAllocator};
use crate::comparison::{compare, CampaignComparison, CampaignRecords};
use crate::overview::{build_overview, PortfolioOverview};
use crate::rollup::{rollup, GroupBy};
use crate::summary::{summarize, AggregateSummary};
use crate::trend::{build_trend, window_start, TrendWindow};
use campaign_core::config::ReportingConfig;
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::store::{CampaignScope, MetricStore, RecordQuery};
use campaign_core::types::{CampaignIdentity, MetricRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub campaign_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub group_by: Option<GroupBy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub campaign_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub data: Vec<MetricRecord>,
    pub summary: AggregateSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub period: String,
    pub campaigns_compared: usize,
    pub comparison: Vec<CampaignComparison>,
}

pub struct AnalyticsService<S: MetricStore> {
    store: Arc<S>,
    allocator: PortfolioAllocator,
    config: ReportingConfig,
}

impl<S: MetricStore> AnalyticsService<S> {
    pub fn new(store: Arc<S>, config: ReportingConfig) -> Self {
        Self {
            store,
            allocator: PortfolioAllocator::new(&config),
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Window length used when a request does not specify one.
    pub fn default_window_days(&self) -> i64 {
        self.config.default_window_days
    }

    /// Records and summary for a date range, optionally for one campaign.
    pub fn query(&self, query: &AnalyticsQuery) -> CampaignResult<AnalyticsReport> {
        if query.start_date > query.end_date {
            return Err(CampaignError::invalid(format!(
                "start_date {} is after end_date {}",
                query.start_date, query.end_date
            )));
        }

        let scope = match query.campaign_id {
            Some(id) => {
                self.store.campaign(&id)?;
                CampaignScope::single(id)
            }
            None => CampaignScope::All,
        };

        let mut records = self
            .store
            .records(&RecordQuery::new(scope, query.start_date, query.end_date))?;
        records.sort_by_key(|r| (r.date, r.campaign_id));

        let summary = summarize(&records);
        let data = match query.group_by {
            Some(group_by) => rollup(&records, group_by),
            None => records,
        };

        debug!(
            campaign_id = ?query.campaign_id,
            rows = data.len(),
            "Analytics query answered"
        );

        Ok(AnalyticsReport {
            campaign_id: query.campaign_id,
            start_date: query.start_date,
            end_date: query.end_date,
            data,
            summary,
        })
    }

    /// Daily trend for one campaign over the `days` ending at `as_of`.
    pub fn campaign_trend(
        &self,
        campaign_id: &Uuid,
        days: i64,
        as_of: NaiveDate,
    ) -> CampaignResult<TrendWindow> {
        let start = window_start(as_of, days)?;
        self.store.campaign(campaign_id)?;
        let records = self
            .store
            .records(&RecordQuery::new(CampaignScope::single(*campaign_id), start, as_of))?;
        build_trend(records, days, as_of)
    }

    /// Side-by-side summaries for `campaign_ids`, in the order given.
    pub fn compare_campaigns(
        &self,
        campaign_ids: &[Uuid],
        days: i64,
        as_of: NaiveDate,
    ) -> CampaignResult<ComparisonReport> {
        if campaign_ids.is_empty() {
            return Err(CampaignError::invalid("no campaigns to compare"));
        }
        let identities = campaign_ids
            .iter()
            .map(|id| self.store.campaign(id))
            .collect::<CampaignResult<Vec<_>>>()?;

        let campaigns = self.window_records(identities, days, as_of)?;
        let comparison = compare(&campaigns);

        Ok(ComparisonReport {
            period: format!("Last {days} days"),
            campaigns_compared: comparison.len(),
            comparison,
        })
    }

    /// Overview across every campaign in the store.
    pub fn overview(&self, days: i64, as_of: NaiveDate) -> CampaignResult<PortfolioOverview> {
        let identities = self.store.campaigns()?;
        let campaigns = self.window_records(identities, days, as_of)?;
        Ok(build_overview(&compare(&campaigns), days))
    }

    /// Reallocate `total_budget` across campaigns using their performance over the window.
    ///
    /// With no ids given, every campaign in the store takes part.
    pub fn optimize_budget(
        &self,
        campaign_ids: Option<&[Uuid]>,
        total_budget: f64,
        days: i64,
        as_of: NaiveDate,
    ) -> CampaignResult<AllocationResult> {
        let identities = match campaign_ids {
            Some(ids) => ids
                .iter()
                .map(|id| self.store.campaign(id))
                .collect::<CampaignResult<Vec<_>>>()?,
            None => self.store.campaigns()?,
        };

        let snapshots: Vec<_> = self
            .window_records(identities, days, as_of)?
            .iter()
            .map(|c| self.allocator.snapshot(&c.identity, &summarize(&c.records)))
            .collect();

        info!(campaigns = snapshots.len(), total_budget, days, "Optimizing portfolio budget");
        self.allocator.allocate(&snapshots, total_budget)
    }

    /// Fetch the window's records for `identities` in one query and group them per campaign.
    fn window_records(
        &self,
        identities: Vec<CampaignIdentity>,
        days: i64,
        as_of: NaiveDate,
    ) -> CampaignResult<Vec<CampaignRecords>> {
        let start = window_start(as_of, days)?;
        let ids: Vec<Uuid> = identities.iter().map(|c| c.id).collect();
        let records = self
            .store
            .records(&RecordQuery::new(CampaignScope::Campaigns(ids), start, as_of))?;

        let mut by_campaign: HashMap<Uuid, Vec<MetricRecord>> = HashMap::new();
        for record in records {
            by_campaign.entry(record.campaign_id).or_default().push(record);
        }

        Ok(identities
            .into_iter()
            .map(|identity| {
                // ids may repeat, so each occurrence gets its own copy
                let records = by_campaign.get(&identity.id).cloned().unwrap_or_default();
                CampaignRecords { identity, records }
            })
            .collect())
    }
}
