//! Post-battle counter accrual
//!
//! One call per participant per settled battle, applying every persistent
//! counter change at once: battle count, fame, win/loss/draw, rating, league
//! points, tag transitions.
//!
//! The returned [`AccrualReceipt`] carries the post-accrual battle count and
//! fame. Revenue is computed from the receipt, never from a snapshot taken
//! before accrual, so payout math cannot observe stale counters.

use crate::models::{BattleKind, FightResult, ParticipantRole, RobotRecord};

/// One robot's part in one settled battle.
#[derive(Debug, Clone)]
pub struct BattleParticipation {
    pub kind: BattleKind,
    pub role: ParticipantRole,
    pub result: FightResult,
    /// Fame earned by the winning side. Losers and draws accrue none,
    /// whatever value sits here.
    pub fame_awarded: u64,
    pub rating_change: i32,
    pub league_points_delta: i32,
    pub tagged_in: bool,
    pub tagged_out: bool,
}

impl BattleParticipation {
    pub fn new(kind: BattleKind, role: ParticipantRole, result: FightResult) -> Self {
        Self {
            kind,
            role,
            result,
            fame_awarded: 0,
            rating_change: 0,
            league_points_delta: 0,
            tagged_in: false,
            tagged_out: false,
        }
    }

    pub fn with_fame(mut self, fame_awarded: u64) -> Self {
        self.fame_awarded = fame_awarded;
        self
    }

    pub fn with_rating_change(mut self, rating_change: i32) -> Self {
        self.rating_change = rating_change;
        self
    }

    pub fn with_league_points(mut self, delta: i32) -> Self {
        self.league_points_delta = delta;
        self
    }

    pub fn with_tag_transition(mut self, tagged_in: bool, tagged_out: bool) -> Self {
        self.tagged_in = tagged_in;
        self.tagged_out = tagged_out;
        self
    }
}

/// Post-accrual figures for the revenue step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccrualReceipt {
    pub robot_id: u64,
    /// `total_battle_count()` after the increment.
    pub battles_after: u64,
    pub fame_after: u64,
}

pub struct StatAccrual;

impl StatAccrual {
    /// Apply every counter increment for one battle.
    ///
    /// The battle counter moves by exactly 1 regardless of result. Fame moves
    /// only on a win. League points never drop below zero.
    pub fn apply_post_battle_counters(
        record: &mut RobotRecord,
        participation: &BattleParticipation,
    ) -> AccrualReceipt {
        match participation.kind {
            BattleKind::TagTeam => record.total_tag_battles += 1,
            BattleKind::League | BattleKind::Tournament(_) => record.total_battles += 1,
        }

        match participation.result {
            FightResult::Win => {
                record.wins += 1;
                record.fame += participation.fame_awarded;
            }
            FightResult::Loss => record.losses += 1,
            FightResult::Draw => record.draws += 1,
        }

        record.rating += participation.rating_change;

        let delta = participation.league_points_delta;
        record.league_points = if delta >= 0 {
            record.league_points.saturating_add(delta as u32)
        } else {
            record.league_points.saturating_sub(delta.unsigned_abs())
        };

        if participation.tagged_in {
            record.times_tagged_in += 1;
        }
        if participation.tagged_out {
            record.times_tagged_out += 1;
        }

        log::debug!(
            "Accrued robot {}: battles {}, fame {}, rating {}",
            record.robot_id,
            record.total_battle_count(),
            record.fame,
            record.rating
        );

        AccrualReceipt {
            robot_id: record.robot_id,
            battles_after: record.total_battle_count(),
            fame_after: record.fame,
        }
    }
}
