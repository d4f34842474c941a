//! Streaming revenue formula
//!
//! Pure payout calculator. Reads nothing but its arguments; the studio level
//! arrives as a parameter so the same calculator serves every stable, and the
//! bye flag short-circuits to no payout at all.
//!
//! The battle and fame figures passed here must already include the battle
//! being settled. Callers get those from the accrual step, never from a
//! pre-fight snapshot.

use super::config::{EconomyConfig, RevenueParams};
use crate::models::RevenueBreakdown;

#[derive(Debug, Clone)]
pub struct RevenueCalculator {
    params: RevenueParams,
}

impl RevenueCalculator {
    pub fn new(params: RevenueParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &EconomyConfig) -> Self {
        Self::new(config.revenue.clone())
    }

    /// Stable-wide multiplier: a function of the studio level alone, so every
    /// robot under one stable sees the identical value in a call window.
    pub fn studio_multiplier(&self, studio_level: u32) -> f64 {
        1.0 + studio_level as f64 * self.params.studio_rate
    }

    /// Compute one payout. `None` for bye participants: no payout and no
    /// ledger write, whatever the stats say.
    pub fn calculate(
        &self,
        battles: u64,
        fame: u64,
        studio_level: u32,
        is_bye_match: bool,
    ) -> Option<RevenueBreakdown> {
        if is_bye_match {
            return None;
        }

        let battle_multiplier = 1.0 + battles as f64 / self.params.battle_divisor;
        let fame_multiplier = 1.0 + fame as f64 / self.params.fame_divisor;
        let studio_multiplier = self.studio_multiplier(studio_level);

        let total = self.params.base_amount as f64
            * battle_multiplier
            * fame_multiplier
            * studio_multiplier;

        Some(RevenueBreakdown {
            base_amount: self.params.base_amount,
            battle_multiplier,
            fame_multiplier,
            studio_multiplier,
            total_revenue: total.floor() as i64,
            battles_used: battles,
            fame_used: fame,
            studio_level,
        })
    }
}

impl Default for RevenueCalculator {
    fn default() -> Self {
        Self::new(RevenueParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::proptest_gen::{battles_strategy, fame_strategy, studio_level_strategy};
    use proptest::prelude::*;

    #[test]
    fn test_bye_pays_nothing() {
        let calc = RevenueCalculator::default();
        assert!(calc.calculate(500, 9000, 8, true).is_none());
    }

    #[test]
    fn test_rookie_floor_payout() {
        let calc = RevenueCalculator::default();
        let breakdown = calc.calculate(0, 0, 0, false).unwrap();
        assert_eq!(breakdown.total_revenue, 1000);
        assert_eq!(breakdown.battle_multiplier, 1.0);
        assert_eq!(breakdown.fame_multiplier, 1.0);
        assert_eq!(breakdown.studio_multiplier, 1.0);
    }

    #[test]
    fn test_veteran_payout_figures() {
        // battles=1000 doubles the battle multiplier, fame=5009 gives
        // 2.0018, studio 5 at the standard rate gives 1.5.
        let calc = RevenueCalculator::default();
        let breakdown = calc.calculate(1000, 5009, 5, false).unwrap();
        assert_eq!(breakdown.battle_multiplier, 2.0);
        assert!((breakdown.fame_multiplier - 2.0018).abs() < 1e-12);
        assert_eq!(breakdown.studio_multiplier, 1.5);
        assert_eq!(breakdown.total_revenue, 6005);
    }

    #[test]
    fn test_flat_studio_rate() {
        let calc = RevenueCalculator::new(EconomyConfig::flat_studio().revenue);
        let breakdown = calc.calculate(0, 0, 3, false).unwrap();
        assert_eq!(breakdown.studio_multiplier, 4.0);
        assert_eq!(breakdown.total_revenue, 4000);
    }

    proptest! {
        #[test]
        fn bye_always_suppressed(
            battles in battles_strategy(),
            fame in fame_strategy(),
            level in studio_level_strategy(),
        ) {
            let calc = RevenueCalculator::default();
            prop_assert!(calc.calculate(battles, fame, level, true).is_none());
            let paid = calc.calculate(battles, fame, level, false).unwrap();
            prop_assert!(paid.total_revenue > 0);
        }

        #[test]
        fn revenue_monotone_in_each_input(
            battles in battles_strategy(),
            fame in fame_strategy(),
            level in 0u32..=9,
            battle_step in 1u64..=500,
            fame_step in 1u64..=2_000,
        ) {
            let calc = RevenueCalculator::default();
            let base = calc.calculate(battles, fame, level, false).unwrap().total_revenue;

            let more_battles =
                calc.calculate(battles + battle_step, fame, level, false).unwrap().total_revenue;
            let more_fame =
                calc.calculate(battles, fame + fame_step, level, false).unwrap().total_revenue;
            let better_studio =
                calc.calculate(battles, fame, level + 1, false).unwrap().total_revenue;

            prop_assert!(more_battles >= base);
            prop_assert!(more_fame >= base);
            prop_assert!(better_studio >= base);
        }

        #[test]
        fn studio_multiplier_is_stable_wide(
            level in studio_level_strategy(),
            battles_a in battles_strategy(),
            fame_a in fame_strategy(),
            battles_b in battles_strategy(),
            fame_b in fame_strategy(),
        ) {
            // Two robots under one stable differ in everything but the
            // studio, and their studio multiplier must not differ.
            let calc = RevenueCalculator::default();
            let a = calc.calculate(battles_a, fame_a, level, false).unwrap();
            let b = calc.calculate(battles_b, fame_b, level, false).unwrap();
            prop_assert_eq!(a.studio_multiplier, b.studio_multiplier);
        }
    }
}
