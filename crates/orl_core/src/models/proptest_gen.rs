//! Property-based test generators for settlement types
//!
//! Strategies for battle reports and robot counters, shared by the property
//! suites across the crate. Ranges mirror live-game magnitudes: a robot deep
//! into a career sits around a few thousand battles and a few ten-thousand
//! fame, and studio levels stay in single digits.

use super::battle::{BattleReport, FighterReport, TeamSideReport, TournamentContext};
use super::participant::LeagueTier;
use proptest::prelude::*;

pub fn final_hp_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        3 => 0.0f64..=150.0,
        2 => Just(0.0f64),
        1 => -25.0f64..0.0,
    ]
}

pub fn battles_strategy() -> impl Strategy<Value = u64> {
    0u64..=5_000
}

pub fn fame_strategy() -> impl Strategy<Value = u64> {
    0u64..=20_000
}

pub fn studio_level_strategy() -> impl Strategy<Value = u32> {
    0u32..=10
}

pub fn league_tier_strategy() -> impl Strategy<Value = LeagueTier> {
    prop_oneof![
        Just(LeagueTier::Bronze),
        Just(LeagueTier::Silver),
        Just(LeagueTier::Gold),
        Just(LeagueTier::Platinum),
        Just(LeagueTier::Diamond),
        Just(LeagueTier::Champion),
    ]
}

pub fn fighter_report_strategy(robot_id: u64) -> impl Strategy<Value = FighterReport> {
    (final_hp_strategy(), 0.0f64..=50.0, 0.0f64..=300.0, 0u32..=300).prop_map(
        move |(final_hp, final_shield, damage_dealt, survival_seconds)| FighterReport {
            robot_id,
            final_hp,
            final_shield,
            damage_dealt,
            survival_seconds,
        },
    )
}

pub fn team_side_strategy(team_id: u64, id_base: u64) -> impl Strategy<Value = TeamSideReport> {
    (
        fighter_report_strategy(id_base),
        fighter_report_strategy(id_base + 1),
        proptest::option::of(1u32..=290),
    )
        .prop_map(move |(active, reserve, tag_out)| {
            let side = TeamSideReport::new(team_id, active, reserve);
            match tag_out {
                Some(second) => side.with_tag_out(second),
                None => side,
            }
        })
}

/// Non-bye solo league battle with distinct robots on each side.
pub fn solo_report_strategy(cycle_number: u32) -> impl Strategy<Value = BattleReport> {
    (fighter_report_strategy(1_001), fighter_report_strategy(2_001), any::<bool>()).prop_map(
        move |(side_a, side_b, timed_out)| {
            BattleReport::solo(cycle_number, side_a, side_b).with_duration(300, timed_out)
        },
    )
}

pub fn tag_report_strategy(cycle_number: u32) -> impl Strategy<Value = BattleReport> {
    (team_side_strategy(1, 1_001), team_side_strategy(2, 2_001), any::<bool>()).prop_map(
        move |(side_a, side_b, timed_out)| {
            BattleReport::tag_team(cycle_number, side_a, side_b).with_duration(300, timed_out)
        },
    )
}

pub fn tournament_report_strategy(cycle_number: u32) -> impl Strategy<Value = BattleReport> {
    (
        fighter_report_strategy(1_001),
        fighter_report_strategy(2_001),
        1u64..=50,
        1u32..=6,
    )
        .prop_map(move |(side_a, side_b, tournament_id, round)| {
            BattleReport::tournament(
                cycle_number,
                TournamentContext { tournament_id, round },
                side_a,
                side_b,
            )
        })
}

proptest! {
    #[test]
    fn generated_reports_validate(report in solo_report_strategy(1)) {
        prop_assert!(report.validate().is_ok());
    }

    #[test]
    fn generated_tag_reports_validate(report in tag_report_strategy(1)) {
        prop_assert!(report.validate().is_ok());
        prop_assert!(!report.is_bye());
    }

    #[test]
    fn tag_side_current_matches_slot(side in team_side_strategy(1, 10)) {
        let expected = if side.tag_out_occurred() {
            side.reserve.robot_id
        } else {
            side.active.robot_id
        };
        prop_assert_eq!(side.current().robot_id, expected);
    }
}
