//! Read-only interface to the external metric record store.
//!
//! Implementations are expected to apply access control before the engine
//! sees any data.

use crate::error::CampaignResult;
use crate::types::{CampaignIdentity, MetricRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which campaigns a record query covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignScope {
    All,
    Campaigns(Vec<Uuid>),
}

impl CampaignScope {
    pub fn single(id: Uuid) -> Self {
        Self::Campaigns(vec![id])
    }

    pub fn includes(&self, id: &Uuid) -> bool {
        match self {
            Self::All => true,
            Self::Campaigns(ids) => ids.contains(id),
        }
    }
}

/// Inclusive date-range query for metric records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordQuery {
    pub scope: CampaignScope,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl RecordQuery {
    pub fn new(scope: CampaignScope, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            scope,
            start_date,
            end_date,
        }
    }

    pub fn contains(&self, record: &MetricRecord) -> bool {
        self.scope.includes(&record.campaign_id)
            && record.date >= self.start_date
            && record.date <= self.end_date
    }
}

pub trait MetricStore: Send + Sync {
    /// Records matching the query. Order is not guaranteed.
    fn records(&self, query: &RecordQuery) -> CampaignResult<Vec<MetricRecord>>;

    /// Resolve a campaign identity. Fails with `NotFound` for unknown ids.
    fn campaign(&self, id: &Uuid) -> CampaignResult<CampaignIdentity>;

    /// All campaigns visible to the caller.
    fn campaigns(&self) -> CampaignResult<Vec<CampaignIdentity>>;
}
