//! Campaign performance reporting: aggregation, daily trends, campaign
//! comparison, portfolio overview, and efficiency-based budget allocation.

pub mod budget;
pub mod comparison;
pub mod overview;
pub mod rollup;
pub mod service;
pub mod store;
pub mod summary;
pub mod trend;

pub use budget::{AllocationResult, AllocationStrategy, PortfolioAllocator};
pub use comparison::{compare, CampaignComparison, CampaignRecords, ComparisonMetric};
pub use overview::{build_overview, PortfolioOverview};
pub use rollup::GroupBy;
pub use service::{AnalyticsQuery, AnalyticsReport, AnalyticsService, ComparisonReport};
pub use store::InMemoryMetricStore;
pub use summary::{summarize, AggregateSummary};
pub use trend::{build_trend, TrendPoint, TrendReport, TrendWindow};
