//! Efficiency-weighted budget allocation across a campaign portfolio.

use crate::summary::AggregateSummary;
use campaign_core::config::ReportingConfig;
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::types::{round2, CampaignIdentity, CampaignSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

/// Weight of ROAS in the efficiency score.
pub const ROAS_WEIGHT: f64 = 0.7;
/// Weight of conversions-per-cost in the efficiency score.
pub const CONVERSION_WEIGHT: f64 = 0.3;
/// Spend below this is treated as this much when scoring.
pub const COST_FLOOR: f64 = 1.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the budget was split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStrategy {
    /// Proportional to each campaign's share of total efficiency.
    Proportional,
    /// Total efficiency was not positive; every campaign got the same share.
    EqualSplit,
}

/// One campaign's line in the efficiency-ranked allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAllocation {
    pub campaign_id: Uuid,
    pub name: String,
    pub efficiency: f64,
    pub budget: f64,
    /// Whether the min/max bounds changed the unclamped share.
    pub clamped: bool,
}

/// Recommended budget per campaign.
///
/// Every budget lies within its campaign's `[min_budget, max_budget]`.
/// `allocated_total` may differ from `requested_total` after clamping; the
/// difference is reported, not redistributed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub allocations: BTreeMap<Uuid, f64>,
    /// Campaigns in descending efficiency order (ties keep input order).
    pub ranked: Vec<RankedAllocation>,
    pub strategy: AllocationStrategy,
    pub requested_total: f64,
    pub allocated_total: f64,
}

impl AllocationResult {
    pub fn budget_for(&self, campaign_id: &Uuid) -> Option<f64> {
        self.allocations.get(campaign_id).copied()
    }

    /// `allocated_total - requested_total`.
    pub fn unallocated_delta(&self) -> f64 {
        self.allocated_total - self.requested_total
    }
}

/// Efficiency score used to rank and weight campaigns.
///
/// `roas * 0.7 + conversions / max(cost, 1) * 0.3`.
pub fn efficiency_score(campaign: &CampaignSnapshot) -> f64 {
    let cost = campaign.cost.max(COST_FLOOR);
    (campaign.roas * ROAS_WEIGHT) + (campaign.conversions as f64 / cost * CONVERSION_WEIGHT)
}

fn clamp_budget(value: f64, min_budget: f64, max_budget: f64) -> f64 {
    // min wins when the bounds are inverted
    value.min(max_budget).max(min_budget)
}

// ---------------------------------------------------------------------------
// PortfolioAllocator
// ---------------------------------------------------------------------------

/// Stateless allocator; safe to share across threads.
#[derive(Debug, Clone)]
pub struct PortfolioAllocator {
    default_min_budget: f64,
    default_max_budget: f64,
}

impl PortfolioAllocator {
    pub fn new(config: &ReportingConfig) -> Self {
        Self {
            default_min_budget: config.default_min_budget,
            default_max_budget: config.default_max_budget,
        }
    }

    /// Build an allocation input from a campaign's identity and window summary.
    ///
    /// Bounds missing from the identity fall back to the configured defaults.
    pub fn snapshot(
        &self,
        identity: &CampaignIdentity,
        summary: &AggregateSummary,
    ) -> CampaignSnapshot {
        CampaignSnapshot {
            campaign_id: identity.id,
            name: identity.name.clone(),
            status: identity.status,
            roas: summary.total_roas,
            conversions: summary.total_conversions,
            cost: summary.total_cost,
            min_budget: identity.min_budget.unwrap_or(self.default_min_budget),
            max_budget: identity.max_budget.unwrap_or(self.default_max_budget),
        }
    }

    /// Split `total_budget` across `campaigns` in proportion to efficiency.
    ///
    /// Each share is rounded to cents before it is clamped to the campaign's
    /// `[min_budget, max_budget]`, so a bound that is not a whole number of
    /// cents is returned exactly rather than rounded.
    pub fn allocate(
        &self,
        campaigns: &[CampaignSnapshot],
        total_budget: f64,
    ) -> CampaignResult<AllocationResult> {
        if campaigns.is_empty() {
            return Err(CampaignError::invalid("cannot allocate across zero campaigns"));
        }
        if !(total_budget > 0.0) {
            return Err(CampaignError::invalid(format!(
                "total_budget must be positive, got {total_budget}"
            )));
        }

        let mut scored: Vec<(&CampaignSnapshot, f64)> =
            campaigns.iter().map(|c| (c, efficiency_score(c))).collect();
        // Stable, so equal scores keep their input order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        // Summed in ranked order so the total does not depend on input order.
        let total_efficiency: f64 = scored.iter().map(|(_, e)| e).sum();

        let strategy = if total_efficiency > 0.0 {
            AllocationStrategy::Proportional
        } else {
            AllocationStrategy::EqualSplit
        };
        let equal_share = round2(total_budget / campaigns.len() as f64);

        let mut allocations = BTreeMap::new();
        let mut ranked = Vec::with_capacity(scored.len());

        for (campaign, efficiency) in scored {
            let share = match strategy {
                AllocationStrategy::Proportional => {
                    round2((efficiency / total_efficiency) * total_budget)
                }
                AllocationStrategy::EqualSplit => equal_share,
            };
            let budget = clamp_budget(share, campaign.min_budget, campaign.max_budget);
            let clamped = budget != share;

            debug!(
                campaign_id = %campaign.campaign_id,
                efficiency,
                share,
                budget,
                clamped,
                "Campaign budget computed"
            );

            allocations.insert(campaign.campaign_id, budget);
            ranked.push(RankedAllocation {
                campaign_id: campaign.campaign_id,
                name: campaign.name.clone(),
                efficiency,
                budget,
                clamped,
            });
        }

        let allocated_total = round2(ranked.iter().map(|r| r.budget).sum());

        metrics::counter!("reporting.allocations").increment(1);
        if strategy == AllocationStrategy::EqualSplit {
            metrics::counter!("reporting.allocation_equal_split").increment(1);
        }
        info!(
            campaigns = campaigns.len(),
            total_budget,
            allocated_total,
            ?strategy,
            "Portfolio allocation computed"
        );

        Ok(AllocationResult {
            allocations,
            ranked,
            strategy,
            requested_total: total_budget,
            allocated_total,
        })
    }
}

impl Default for PortfolioAllocator {
    fn default() -> Self {
        Self::new(&ReportingConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::types::CampaignStatus;

    fn snap(name: &str, roas: f64, conversions: i64, cost: f64) -> CampaignSnapshot {
        CampaignSnapshot::new(Uuid::new_v4(), name, roas, conversions, cost)
    }

    // 1. Efficiency scores ---------------------------------------------------

    #[test]
    fn test_efficiency_score_formula() {
        let a = snap("a", 4.0, 10, 100.0);
        let b = snap("b", 1.0, 2, 50.0);
        assert!((efficiency_score(&a) - 2.83).abs() < 1e-9);
        assert!((efficiency_score(&b) - 0.712).abs() < 1e-9);
    }

    #[test]
    fn test_efficiency_score_cost_floor() {
        // Zero spend is scored as spend of 1.
        let c = snap("free", 0.0, 5, 0.0);
        assert!((efficiency_score(&c) - 1.5).abs() < 1e-9);
        let tiny = snap("tiny", 0.0, 5, 0.25);
        assert!((efficiency_score(&tiny) - 1.5).abs() < 1e-9);
    }

    // 2. Proportional allocation ---------------------------------------------

    #[test]
    fn test_two_campaign_scenario() {
        let a = snap("a", 4.0, 10, 100.0);
        let b = snap("b", 1.0, 2, 50.0);
        let result = PortfolioAllocator::default()
            .allocate(&[a.clone(), b.clone()], 300.0)
            .unwrap();

        assert_eq!(result.strategy, AllocationStrategy::Proportional);
        assert_eq!(result.budget_for(&a.campaign_id), Some(239.70));
        assert_eq!(result.budget_for(&b.campaign_id), Some(60.30));
        assert!((result.allocated_total - 300.0).abs() < 1e-9);
        assert_eq!(result.ranked[0].campaign_id, a.campaign_id);
    }

    #[test]
    fn test_clamp_to_max_is_not_redistributed() {
        let big = snap("big", 10.0, 0, 100.0).with_bounds(10.0, 500.0);
        let small = snap("small", 1.0, 0, 100.0);
        let result = PortfolioAllocator::default()
            .allocate(&[big.clone(), small.clone()], 2000.0)
            .unwrap();

        assert_eq!(result.budget_for(&big.campaign_id), Some(500.0));
        assert_eq!(result.budget_for(&small.campaign_id), Some(181.82));
        assert!(result.ranked[0].clamped);
        assert!(result.unallocated_delta() < 0.0);
    }

    #[test]
    fn test_clamp_to_min() {
        let strong = snap("strong", 9.0, 0, 100.0);
        let weak = snap("weak", 0.01, 0, 100.0).with_bounds(25.0, 1000.0);
        let result = PortfolioAllocator::default()
            .allocate(&[strong, weak.clone()], 100.0)
            .unwrap();
        assert_eq!(result.budget_for(&weak.campaign_id), Some(25.0));
    }

    #[test]
    fn test_inverted_bounds_min_wins() {
        let odd = snap("odd", 1.0, 1, 10.0).with_bounds(50.0, 20.0);
        let result = PortfolioAllocator::default().allocate(&[odd.clone()], 1000.0).unwrap();
        assert_eq!(result.budget_for(&odd.campaign_id), Some(50.0));
    }

    // 3. Equal split ----------------------------------------------------------

    #[test]
    fn test_equal_split_when_no_efficiency() {
        let campaigns = vec![
            snap("a", 0.0, 0, 10.0),
            snap("b", 0.0, 0, 0.0),
            snap("c", 0.0, 0, 99.0),
        ];
        let result = PortfolioAllocator::default().allocate(&campaigns, 300.0).unwrap();
        assert_eq!(result.strategy, AllocationStrategy::EqualSplit);
        for c in &campaigns {
            assert_eq!(result.budget_for(&c.campaign_id), Some(100.0));
        }
    }

    #[test]
    fn test_equal_split_still_clamped() {
        let capped = snap("capped", 0.0, 0, 10.0).with_bounds(10.0, 40.0);
        let open = snap("open", 0.0, 0, 10.0);
        let result = PortfolioAllocator::default()
            .allocate(&[capped.clone(), open.clone()], 300.0)
            .unwrap();
        assert_eq!(result.budget_for(&capped.campaign_id), Some(40.0));
        assert_eq!(result.budget_for(&open.campaign_id), Some(150.0));
    }

    #[test]
    fn test_negative_total_efficiency_uses_equal_split() {
        let campaigns = vec![snap("a", -2.0, 0, 10.0), snap("b", -1.0, 0, 10.0)];
        let result = PortfolioAllocator::default().allocate(&campaigns, 100.0).unwrap();
        assert_eq!(result.strategy, AllocationStrategy::EqualSplit);
        assert!(result.allocations.values().all(|&v| v == 50.0));
    }

    // 4. Validation -----------------------------------------------------------

    #[test]
    fn test_rejects_empty_portfolio() {
        let err = PortfolioAllocator::default().allocate(&[], 100.0).unwrap_err();
        assert!(matches!(err, CampaignError::InvalidArgument(_)));
    }

    #[test]
    fn test_rejects_non_positive_budget() {
        let campaigns = vec![snap("a", 1.0, 1, 1.0)];
        for budget in [0.0, -10.0, f64::NAN] {
            let err = PortfolioAllocator::default().allocate(&campaigns, budget).unwrap_err();
            assert!(matches!(err, CampaignError::InvalidArgument(_)));
        }
    }

    // 5. Ordering -------------------------------------------------------------

    #[test]
    fn test_ties_keep_input_order() {
        let first = snap("first", 2.0, 0, 10.0);
        let second = snap("second", 2.0, 0, 10.0);
        let best = snap("best", 5.0, 0, 10.0);
        let result = PortfolioAllocator::default()
            .allocate(&[first.clone(), second.clone(), best.clone()], 90.0)
            .unwrap();
        let order: Vec<_> = result.ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(order, vec!["best", "first", "second"]);
    }

    #[test]
    fn test_permutation_invariance() {
        let campaigns = vec![
            snap("a", 3.3, 7, 120.0),
            snap("b", 0.4, 1, 80.0),
            snap("c", 1.9, 30, 0.0),
            snap("d", 0.0, 0, 15.0).with_bounds(5.0, 60.0),
        ];
        let allocator = PortfolioAllocator::default();
        let forward = allocator.allocate(&campaigns, 777.77).unwrap();
        let mut reversed = campaigns.clone();
        reversed.reverse();
        let backward = allocator.allocate(&reversed, 777.77).unwrap();
        assert_eq!(forward.allocations, backward.allocations);
    }

    // 6. Bounds sweep ---------------------------------------------------------

    #[test]
    fn test_every_budget_within_bounds() {
        let bounds = [
            (10.0, 1000.0),
            (0.0, 5.0),
            (2.5, 2.5),
            (0.333, 99.999),
            (100.0, 10_000.0),
        ];
        let portfolios: [&[(f64, i64, f64)]; 5] = [
            &[(4.0, 100, 1000.0), (1.0, 20, 500.0)],
            &[(0.0, 0, 0.0), (0.0, 0, 10.0), (0.0, 0, 99.0)],
            &[(-3.0, 0, 10.0), (1.0, 1, 10.0)],
            &[(12.5, 900, 0.5), (0.01, 0, 7.0), (2.2, 3, 40.0), (0.7, 1, 1.0)],
            &[(1.0, 1, 1.0); 6],
        ];
        let budgets = [0.01, 1.0, 37.5, 600.0, 5_000.0, 1_000_000.0];
        let allocator = PortfolioAllocator::default();

        for (p, portfolio) in portfolios.iter().enumerate() {
            for shift in 0..bounds.len() {
                let campaigns: Vec<_> = portfolio
                    .iter()
                    .enumerate()
                    .map(|(i, &(roas, conversions, cost))| {
                        let (min, max) = bounds[(i + shift) % bounds.len()];
                        snap(&format!("p{p}c{i}"), roas, conversions, cost).with_bounds(min, max)
                    })
                    .collect();

                for &budget in &budgets {
                    let result = allocator.allocate(&campaigns, budget).unwrap();
                    assert_eq!(result.allocations.len(), campaigns.len());
                    for c in &campaigns {
                        let value = result.budget_for(&c.campaign_id).unwrap();
                        assert!(
                            value >= c.min_budget && value <= c.max_budget,
                            "{} got {value} outside [{}, {}] for budget {budget}",
                            c.name,
                            c.min_budget,
                            c.max_budget
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_snapshot_uses_default_bounds() {
        let allocator = PortfolioAllocator::default();
        let identity = CampaignIdentity::new(Uuid::new_v4(), "x", CampaignStatus::Paused);
        let summary = AggregateSummary {
            total_conversions: 4,
            total_cost: 40.0,
            total_roas: 2.5,
            ..Default::default()
        };
        let s = allocator.snapshot(&identity, &summary);
        assert_eq!(s.min_budget, 10.0);
        assert_eq!(s.max_budget, 1000.0);
        assert_eq!(s.conversions, 4);
        assert_eq!(s.status, CampaignStatus::Paused);

        let bounded = identity.with_bounds(1.0, 2.0);
        let s = allocator.snapshot(&bounded, &summary);
        assert_eq!((s.min_budget, s.max_budget), (1.0, 2.0));
    }
}
