//! 태그팀 스트리밍 수익 집계
//!
//! 팀 수익은 두 로봇의 스탯 합산으로 계산하지 않는다. 전투 수와 명성 각각에
//! 대해 팀 내 최대값을 대표값으로 뽑아 지급액을 한 번만 계산한다. 두 대표가
//! 서로 다른 로봇일 수 있고, 동률이면 로스터 순서가 앞선 로봇이 대표가 된다.
//!
//! 여기에 들어오는 전투 수와 명성은 이미 이번 전투가 반영된 값이어야 한다.

use super::config::{EconomyConfig, RevenueParams};
use super::revenue::RevenueCalculator;
use crate::models::{RobotRecord, TagTeamRevenue, TeamRevenue};

/// 수익 계산에 필요한 로봇별 누적 수치.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotCounters {
    pub robot_id: u64,
    /// 1v1, 토너먼트, 태그팀을 모두 합친 전투 수.
    pub battles: u64,
    pub fame: u64,
}

impl RobotCounters {
    pub fn new(robot_id: u64, battles: u64, fame: u64) -> Self {
        Self { robot_id, battles, fame }
    }

    pub fn from_record(record: &RobotRecord) -> Self {
        Self {
            robot_id: record.robot_id,
            battles: record.total_battle_count(),
            fame: record.fame,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TeamRevenueAggregator {
    calculator: RevenueCalculator,
}

impl TeamRevenueAggregator {
    pub fn new(params: RevenueParams) -> Self {
        Self { calculator: RevenueCalculator::new(params) }
    }

    pub fn from_config(config: &EconomyConfig) -> Self {
        Self::new(config.revenue.clone())
    }

    /// 한 팀의 지급액. 부전승 팀은 지급 없이 `None`.
    pub fn team_payout(
        &self,
        roster: &[RobotCounters; 2],
        studio_level: u32,
        is_bye_match: bool,
    ) -> Option<TeamRevenue> {
        let (max_battles_robot_id, battles) = pick_max(roster, |r| r.battles);
        let (max_fame_robot_id, fame) = pick_max(roster, |r| r.fame);

        let breakdown = self.calculator.calculate(battles, fame, studio_level, is_bye_match)?;
        Some(TeamRevenue { breakdown, max_battles_robot_id, max_fame_robot_id })
    }

    /// 태그팀 전투 양 팀의 지급액을 한 번에 계산한다. 각 팀은 자기 스테이블의
    /// 스튜디오 레벨을 쓴다.
    pub fn tag_battle_payouts(
        &self,
        team_a: &[RobotCounters; 2],
        team_a_studio: u32,
        team_b: Option<&[RobotCounters; 2]>,
        team_b_studio: u32,
        is_bye_match: bool,
    ) -> TagTeamRevenue {
        TagTeamRevenue {
            team_a: self.team_payout(team_a, team_a_studio, is_bye_match),
            team_b: team_b.and_then(|roster| {
                self.team_payout(roster, team_b_studio, is_bye_match)
            }),
        }
    }
}

impl Default for TeamRevenueAggregator {
    fn default() -> Self {
        Self::new(RevenueParams::default())
    }
}

/// 동률이면 로스터 첫 번째 로봇을 유지한다.
fn pick_max<F>(roster: &[RobotCounters; 2], key: F) -> (u64, u64)
where
    F: Fn(&RobotCounters) -> u64,
{
    if key(&roster[0]) >= key(&roster[1]) {
        (roster[0].robot_id, key(&roster[0]))
    } else {
        (roster[1].robot_id, key(&roster[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::proptest_gen::{battles_strategy, fame_strategy, studio_level_strategy};
    use proptest::prelude::*;

    #[test]
    fn test_maxima_from_different_robots() {
        let agg = TeamRevenueAggregator::default();
        let roster =
            [RobotCounters::new(11, 100, 0), RobotCounters::new(12, 50, 5000)];
        let team = agg.team_payout(&roster, 0, false).unwrap();

        assert_eq!(team.max_battles_robot_id, 11);
        assert_eq!(team.max_fame_robot_id, 12);
        assert_eq!(team.breakdown.battles_used, 100);
        assert_eq!(team.breakdown.fame_used, 5000);
        // max 기반이므로 합산(150전, 5000명성)보다 적다.
        assert_eq!(team.breakdown.battle_multiplier, 1.1);
        assert_eq!(team.breakdown.fame_multiplier, 2.0);
        assert_eq!(team.breakdown.total_revenue, 2200);
    }

    #[test]
    fn test_tie_keeps_first_roster_robot() {
        let agg = TeamRevenueAggregator::default();
        let roster =
            [RobotCounters::new(21, 300, 700), RobotCounters::new(22, 300, 700)];
        let team = agg.team_payout(&roster, 0, false).unwrap();
        assert_eq!(team.max_battles_robot_id, 21);
        assert_eq!(team.max_fame_robot_id, 21);
    }

    #[test]
    fn test_bye_team_gets_nothing() {
        let agg = TeamRevenueAggregator::default();
        let roster = [RobotCounters::new(31, 10, 10), RobotCounters::new(32, 5, 5)];
        assert!(agg.team_payout(&roster, 4, true).is_none());

        let both = agg.tag_battle_payouts(&roster, 4, None, 0, true);
        assert!(both.team_a.is_none());
        assert!(both.team_b.is_none());
    }

    #[test]
    fn test_both_teams_settle_independently() {
        let agg = TeamRevenueAggregator::default();
        let team_a = [RobotCounters::new(41, 0, 0), RobotCounters::new(42, 0, 0)];
        let team_b = [RobotCounters::new(43, 1000, 2500), RobotCounters::new(44, 0, 0)];

        let both = agg.tag_battle_payouts(&team_a, 0, Some(&team_b), 2, false);
        let a = both.team_a.unwrap();
        let b = both.team_b.unwrap();
        assert_eq!(a.breakdown.total_revenue, 1000);
        assert_eq!(b.breakdown.studio_level, 2);
        // 1000 * 2.0 * 1.5 * 1.2
        assert_eq!(b.breakdown.total_revenue, 3600);
    }

    proptest! {
        #[test]
        fn team_payout_matches_solo_formula_on_maxima(
            battles_a in battles_strategy(),
            fame_a in fame_strategy(),
            battles_b in battles_strategy(),
            fame_b in fame_strategy(),
            level in studio_level_strategy(),
        ) {
            let agg = TeamRevenueAggregator::default();
            let roster = [
                RobotCounters::new(1, battles_a, fame_a),
                RobotCounters::new(2, battles_b, fame_b),
            ];
            let team = agg.team_payout(&roster, level, false).unwrap();

            let solo = RevenueCalculator::default()
                .calculate(battles_a.max(battles_b), fame_a.max(fame_b), level, false)
                .unwrap();
            prop_assert_eq!(team.breakdown, solo);
        }

        #[test]
        fn roster_order_never_changes_the_amount(
            battles_a in battles_strategy(),
            fame_a in fame_strategy(),
            battles_b in battles_strategy(),
            fame_b in fame_strategy(),
            level in studio_level_strategy(),
        ) {
            let agg = TeamRevenueAggregator::default();
            let forward = [
                RobotCounters::new(1, battles_a, fame_a),
                RobotCounters::new(2, battles_b, fame_b),
            ];
            let reversed = [forward[1], forward[0]];

            let a = agg.team_payout(&forward, level, false).unwrap();
            let b = agg.team_payout(&reversed, level, false).unwrap();
            prop_assert_eq!(a.breakdown.total_revenue, b.breakdown.total_revenue);
        }
    }
}
