//! Streaming revenue breakdowns
//!
//! A `RevenueBreakdown` records every input the payout formula consumed along
//! with the floor-rounded result, so audit consumers can re-derive the number
//! without re-reading robot state. Battles and fame here are always the
//! post-accrual figures.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One streaming payout, fully itemized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RevenueBreakdown {
    pub base_amount: i64,
    pub battle_multiplier: f64,
    pub fame_multiplier: f64,
    pub studio_multiplier: f64,
    /// Floor of base × battle × fame × studio.
    pub total_revenue: i64,
    /// Battle count the formula actually used (post-accrual).
    pub battles_used: u64,
    /// Fame the formula actually used (post-accrual).
    pub fame_used: u64,
    pub studio_level: u32,
}

/// A team payout plus which robots supplied the maxima.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TeamRevenue {
    pub breakdown: RevenueBreakdown,
    /// Robot contributing the team's maximum battle count.
    pub max_battles_robot_id: u64,
    /// Robot contributing the team's maximum fame.
    pub max_fame_robot_id: u64,
}

/// Both teams' payouts for one tag-team battle. A bye side gets `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TagTeamRevenue {
    pub team_a: Option<TeamRevenue>,
    pub team_b: Option<TeamRevenue>,
}
