//! JSON dataset loaded by the CLI: campaign identities, daily records, and
//! optional training samples.

use anyhow::Context;
use campaign_core::inference::TrainingSample;
use campaign_core::types::{CampaignIdentity, MetricRecord};
use campaign_reporting::InMemoryMetricStore;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub campaigns: Vec<CampaignIdentity>,
    pub records: Vec<MetricRecord>,
    pub training: Vec<TrainingSample>,
}

impl Dataset {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open dataset {}", path.display()))?;
        let dataset: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse dataset {}", path.display()))?;
        info!(
            campaigns = dataset.campaigns.len(),
            records = dataset.records.len(),
            training_samples = dataset.training.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Build a store from the dataset. Derived ratios are recomputed from the counters.
    pub fn into_store(self) -> (InMemoryMetricStore, Vec<TrainingSample>) {
        let store = InMemoryMetricStore::new();
        for campaign in self.campaigns {
            store.upsert_campaign(campaign);
        }
        store.extend_records(self.records.into_iter().map(|mut r| {
            r.recompute();
            r
        }));
        (store, self.training)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::store::{CampaignScope, MetricStore, RecordQuery};
    use chrono::NaiveDate;

    #[test]
    fn test_parse_dataset() {
        let json = r#"{
            "campaigns": [
                {"id": "6f1c1e5e-1b7e-4d4f-9a55-0c3a8e6e2f10", "name": "Spring", "status": "active"}
            ],
            "records": [
                {"campaign_id": "6f1c1e5e-1b7e-4d4f-9a55-0c3a8e6e2f10", "date": "2024-03-01",
                 "impressions": 1000, "clicks": 50, "conversions": 5,
                 "cost": 100.0, "revenue": 400.0}
            ],
            "training": [
                {"daily_budget": 100.0, "clicks": 50.0, "roas": 4.0, "conversions": 5.0}
            ]
        }"#;
        let dataset: Dataset = serde_json::from_str(json).unwrap();
        assert_eq!(dataset.training[0].features.daily_budget, 100.0);

        let (store, training) = dataset.into_store();
        assert_eq!(store.record_count(), 1);
        assert_eq!(training.len(), 1);
    }

    #[test]
    fn test_ratios_recomputed_on_load() {
        let json = r#"{
            "records": [
                {"campaign_id": "6f1c1e5e-1b7e-4d4f-9a55-0c3a8e6e2f10", "date": "2024-03-01",
                 "impressions": 1000, "clicks": 50, "conversions": 5, "cost": 100.0,
                 "revenue": 400.0, "roas": 99.0}
            ]
        }"#;
        let dataset: Dataset = serde_json::from_str(json).unwrap();
        let (store, _) = dataset.into_store();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let records = store
            .records(&RecordQuery::new(CampaignScope::All, day, day))
            .unwrap();
        assert!((records[0].roas - 4.0).abs() < 1e-9);
    }
}
