//! In-memory [`MetricStore`] for tests, fixtures, and the CLI.

use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::store::{MetricStore, RecordQuery};
use campaign_core::types::{CampaignIdentity, MetricRecord};
use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;

/// Concurrent store backed by `DashMap`, keyed by campaign.
pub struct InMemoryMetricStore {
    /// campaign_id -> identity
    campaigns: DashMap<Uuid, CampaignIdentity>,
    /// campaign_id -> daily records
    records: DashMap<Uuid, Vec<MetricRecord>>,
    /// registration order, so listings are stable
    order: RwLock<Vec<Uuid>>,
}

impl InMemoryMetricStore {
    pub fn new() -> Self {
        Self {
            campaigns: DashMap::new(),
            records: DashMap::new(),
            order: RwLock::new(Vec::new()),
        }
    }

    /// Register or replace a campaign identity.
    pub fn upsert_campaign(&self, identity: CampaignIdentity) {
        if self.campaigns.insert(identity.id, identity.clone()).is_none() {
            self.order.write().push(identity.id);
        }
    }

    /// Store a record, replacing any existing record for the same campaign and day.
    pub fn insert_record(&self, record: MetricRecord) {
        let mut entry = self.records.entry(record.campaign_id).or_default();
        match entry.iter().position(|r| r.date == record.date) {
            Some(pos) => entry[pos] = record,
            None => entry.push(record),
        }
    }

    pub fn extend_records<I>(&self, records: I)
    where
        I: IntoIterator<Item = MetricRecord>,
    {
        for record in records {
            self.insert_record(record);
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.iter().map(|e| e.value().len()).sum()
    }
}

impl Default for InMemoryMetricStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricStore for InMemoryMetricStore {
    fn records(&self, query: &RecordQuery) -> CampaignResult<Vec<MetricRecord>> {
        Ok(self
            .records
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|r| query.contains(r))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect())
    }

    fn campaign(&self, id: &Uuid) -> CampaignResult<CampaignIdentity> {
        self.campaigns
            .get(id)
            .map(|c| c.clone())
            .ok_or_else(|| CampaignError::not_found(format!("campaign {id}")))
    }

    fn campaigns(&self) -> CampaignResult<Vec<CampaignIdentity>> {
        Ok(self
            .order
            .read()
            .iter()
            .filter_map(|id| self.campaigns.get(id).map(|c| c.clone()))
            .collect())
    }
}
