//! Rule layer turning current performance into actionable recommendations.

use campaign_core::types::round2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// CTR (percent) below which creatives are flagged.
pub const LOW_CTR: f64 = 1.0;
/// CTR (percent) above which the campaign is a scaling candidate.
pub const HIGH_CTR: f64 = 3.0;
/// CPC above which targeting and bidding are flagged.
pub const HIGH_CPC: f64 = 5.0;

/// Signals the rules read. `target_roas` must already be resolved to a default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSignals {
    pub ctr: f64,
    pub cpc: f64,
    pub roas: f64,
    pub target_roas: f64,
    pub daily_budget: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum Recommendation {
    LowCtr,
    ExcellentCtr,
    HighCpc,
    RoasFarBelowTarget,
    RoasBelowTarget,
    ExcellentRoas,
    IncreaseBudget(f64),
    DecreaseBudget(f64),
    PerformingWell,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowCtr => write!(
                f,
                "Low CTR detected. Consider improving ad creatives and headlines."
            ),
            Self::ExcellentCtr => write!(f, "Excellent CTR! Consider scaling this campaign."),
            Self::HighCpc => write!(
                f,
                "High CPC detected. Review targeting and bidding strategy."
            ),
            Self::RoasFarBelowTarget => write!(
                f,
                "ROAS significantly below target. Consider pausing campaign or major optimization."
            ),
            Self::RoasBelowTarget => write!(
                f,
                "ROAS below target. Optimize targeting, creatives, or landing pages."
            ),
            Self::ExcellentRoas => {
                write!(f, "Excellent ROAS! Consider increasing budget to scale.")
            }
            Self::IncreaseBudget(amount) => write!(
                f,
                "Increase daily budget to ${amount:.2} for better results."
            ),
            Self::DecreaseBudget(amount) => write!(
                f,
                "Decrease daily budget to ${amount:.2} to improve efficiency."
            ),
            Self::PerformingWell => write!(f, "Campaign is performing well. Continue monitoring."),
        }
    }
}

/// Scale the current daily budget by how close ROAS is to target.
///
/// | ROAS vs target | factor |
/// |---|---|
/// | `>= target` | 1.2 |
/// | `>= 0.8 × target` | 1.1 |
/// | `>= 0.5 × target` | 1.0 |
/// | below | 0.8 |
pub fn recommend_budget(daily_budget: f64, current_roas: f64, target_roas: f64) -> f64 {
    let factor = if current_roas >= target_roas {
        1.2
    } else if current_roas >= target_roas * 0.8 {
        1.1
    } else if current_roas >= target_roas * 0.5 {
        1.0
    } else {
        0.8
    };
    round2(daily_budget * factor)
}

/// Evaluate every rule in order. Falls back to [`Recommendation::PerformingWell`]
/// when none fires.
pub fn generate_recommendations(signals: &PerformanceSignals) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if signals.ctr < LOW_CTR {
        recommendations.push(Recommendation::LowCtr);
    } else if signals.ctr > HIGH_CTR {
        recommendations.push(Recommendation::ExcellentCtr);
    }

    if signals.cpc > HIGH_CPC {
        recommendations.push(Recommendation::HighCpc);
    }

    let target = signals.target_roas;
    if signals.roas < target * 0.5 {
        recommendations.push(Recommendation::RoasFarBelowTarget);
    } else if signals.roas < target {
        recommendations.push(Recommendation::RoasBelowTarget);
    } else if signals.roas > target * 1.5 {
        recommendations.push(Recommendation::ExcellentRoas);
    }

    let recommended = recommend_budget(signals.daily_budget, signals.roas, target);
    if recommended > signals.daily_budget {
        recommendations.push(Recommendation::IncreaseBudget(recommended));
    } else if recommended < signals.daily_budget {
        recommendations.push(Recommendation::DecreaseBudget(recommended));
    }

    if recommendations.is_empty() {
        recommendations.push(Recommendation::PerformingWell);
    }
    recommendations
}
