//! Battle report input contract
//!
//! A `BattleReport` is what the combat simulator hands the settlement
//! pipeline: final vitals per fighter plus match framing (format, cycle, bye
//! flag). It carries no verdict; deciding the winner is the resolver's job.
//!
//! Team sides name their current fighter explicitly (`FighterSlot`), so the
//! resolver and the accrual step share one notion of who was fighting when
//! the clock stopped. A reserve that never entered leaves the slot at
//! `FighterSlot::Active`.

use crate::error::{Result, SettlementError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Bracket coordinates for a tournament battle. Attached to the audit event;
/// never consulted by verdict logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TournamentContext {
    pub tournament_id: u64,
    pub round: u32,
}

/// Match format the report settles under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BattleKind {
    League,
    TagTeam,
    Tournament(TournamentContext),
}

impl BattleKind {
    pub fn is_tag_team(&self) -> bool {
        matches!(self, BattleKind::TagTeam)
    }

    pub fn is_tournament(&self) -> bool {
        matches!(self, BattleKind::Tournament(_))
    }
}

/// Which slot of a tag team holds the currently-fighting robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FighterSlot {
    Active,
    Reserve,
}

/// Final vitals for one robot, as reported by the combat simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FighterReport {
    pub robot_id: u64,
    pub final_hp: f64,
    pub final_shield: f64,
    #[serde(default)]
    pub damage_dealt: f64,
    #[serde(default)]
    pub survival_seconds: u32,
}

impl FighterReport {
    pub fn new(robot_id: u64, final_hp: f64, final_shield: f64) -> Self {
        Self { robot_id, final_hp, final_shield, damage_dealt: 0.0, survival_seconds: 0 }
    }

    pub fn with_damage(mut self, damage_dealt: f64, survival_seconds: u32) -> Self {
        self.damage_dealt = damage_dealt;
        self.survival_seconds = survival_seconds;
        self
    }

    /// Destroyed or incapacitated at the final bell.
    pub fn is_down(&self) -> bool {
        self.final_hp <= 0.0
    }

    fn validate(&self) -> Result<()> {
        if !self.final_hp.is_finite()
            || !self.final_shield.is_finite()
            || !self.damage_dealt.is_finite()
        {
            return Err(SettlementError::NonFiniteVitals { robot_id: self.robot_id });
        }
        Ok(())
    }
}

/// One side of a tag-team battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TeamSideReport {
    pub team_id: u64,
    pub active: FighterReport,
    pub reserve: FighterReport,
    /// Who was fighting when the battle ended.
    pub current_fighter: FighterSlot,
    /// Second of the battle at which the tag-out happened, when one did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_out_second: Option<u32>,
}

impl TeamSideReport {
    pub fn new(team_id: u64, active: FighterReport, reserve: FighterReport) -> Self {
        Self {
            team_id,
            active,
            reserve,
            current_fighter: FighterSlot::Active,
            tag_out_second: None,
        }
    }

    /// Marks the reserve as the current fighter after a tag-out.
    pub fn with_tag_out(mut self, at_second: u32) -> Self {
        self.current_fighter = FighterSlot::Reserve;
        self.tag_out_second = Some(at_second);
        self
    }

    /// The robot that was in the arena when the battle ended.
    pub fn current(&self) -> &FighterReport {
        match self.current_fighter {
            FighterSlot::Active => &self.active,
            FighterSlot::Reserve => &self.reserve,
        }
    }

    pub fn tag_out_occurred(&self) -> bool {
        matches!(self.current_fighter, FighterSlot::Reserve)
    }

    pub fn robot_ids(&self) -> [u64; 2] {
        [self.active.robot_id, self.reserve.robot_id]
    }
}

/// One side of any battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SideReport {
    Solo(FighterReport),
    Team(TeamSideReport),
}

impl SideReport {
    /// The fighter whose HP decides this side's fate.
    pub fn current_fighter(&self) -> &FighterReport {
        match self {
            SideReport::Solo(fighter) => fighter,
            SideReport::Team(team) => team.current(),
        }
    }

    pub fn fighters(&self) -> Vec<&FighterReport> {
        match self {
            SideReport::Solo(fighter) => vec![fighter],
            SideReport::Team(team) => vec![&team.active, &team.reserve],
        }
    }

    pub fn robot_ids(&self) -> Vec<u64> {
        self.fighters().iter().map(|fighter| fighter.robot_id).collect()
    }

    fn shape_name(&self) -> &'static str {
        match self {
            SideReport::Solo(_) => "solo",
            SideReport::Team(_) => "team",
        }
    }
}

/// Complete input for settling one battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BattleReport {
    pub battle_id: Uuid,
    pub cycle_number: u32,
    pub kind: BattleKind,
    pub side_a: SideReport,
    /// `None` marks a bye: side A fought nobody and wins by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_b: Option<SideReport>,
    #[serde(default)]
    pub duration_seconds: u32,
    /// The fight reached the time limit with both sides still standing.
    #[serde(default)]
    pub timed_out: bool,
}

impl BattleReport {
    pub fn solo(cycle_number: u32, side_a: FighterReport, side_b: FighterReport) -> Self {
        Self {
            battle_id: Uuid::new_v4(),
            cycle_number,
            kind: BattleKind::League,
            side_a: SideReport::Solo(side_a),
            side_b: Some(SideReport::Solo(side_b)),
            duration_seconds: 0,
            timed_out: false,
        }
    }

    pub fn tag_team(cycle_number: u32, side_a: TeamSideReport, side_b: TeamSideReport) -> Self {
        Self {
            battle_id: Uuid::new_v4(),
            cycle_number,
            kind: BattleKind::TagTeam,
            side_a: SideReport::Team(side_a),
            side_b: Some(SideReport::Team(side_b)),
            duration_seconds: 0,
            timed_out: false,
        }
    }

    pub fn tournament(
        cycle_number: u32,
        context: TournamentContext,
        side_a: FighterReport,
        side_b: FighterReport,
    ) -> Self {
        Self {
            battle_id: Uuid::new_v4(),
            cycle_number,
            kind: BattleKind::Tournament(context),
            side_a: SideReport::Solo(side_a),
            side_b: Some(SideReport::Solo(side_b)),
            duration_seconds: 0,
            timed_out: false,
        }
    }

    pub fn bye(cycle_number: u32, side_a: SideReport) -> Self {
        Self {
            battle_id: Uuid::new_v4(),
            cycle_number,
            kind: BattleKind::League,
            side_a,
            side_b: None,
            duration_seconds: 0,
            timed_out: false,
        }
    }

    pub fn with_duration(mut self, duration_seconds: u32, timed_out: bool) -> Self {
        self.duration_seconds = duration_seconds;
        self.timed_out = timed_out;
        self
    }

    pub fn is_bye(&self) -> bool {
        self.side_b.is_none()
    }

    pub fn sides(&self) -> impl Iterator<Item = &SideReport> {
        std::iter::once(&self.side_a).chain(self.side_b.iter())
    }

    /// Every robot named anywhere in the report.
    pub fn robot_ids(&self) -> Vec<u64> {
        self.sides().flat_map(|side| side.robot_ids()).collect()
    }

    /// Rejects malformed reports before any resolution or state mutation.
    ///
    /// Checks: finite vitals, side shape agreeing with the battle kind, no
    /// robot listed twice.
    pub fn validate(&self) -> Result<()> {
        for side in self.sides() {
            for fighter in side.fighters() {
                fighter.validate()?;
            }

            let expected = if self.kind.is_tag_team() { "team" } else { "solo" };
            if side.shape_name() != expected {
                return Err(SettlementError::SideShape { expected, found: side.shape_name() });
            }
        }

        let mut seen = HashSet::new();
        for robot_id in self.robot_ids() {
            if !seen.insert(robot_id) {
                return Err(SettlementError::DuplicateRobot { robot_id });
            }
        }

        Ok(())
    }
}
