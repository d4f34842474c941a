//! Resolved battle outcomes
//!
//! Immutable result of the resolver: a verdict plus compact per-side
//! summaries. Created once per battle, then embedded in the audit event.

use super::battle::{BattleKind, SideReport};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Side label, stable across report/outcome/audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SideId {
    A,
    B,
}

impl SideId {
    pub fn opponent(&self) -> SideId {
        match self {
            SideId::A => SideId::B,
            SideId::B => SideId::A,
        }
    }
}

impl fmt::Display for SideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideId::A => write!(f, "A"),
            SideId::B => write!(f, "B"),
        }
    }
}

/// Final verdict of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Win(SideId),
    Draw,
}

impl Verdict {
    pub fn winning_side(&self) -> Option<SideId> {
        match self {
            Verdict::Win(side) => Some(*side),
            Verdict::Draw => None,
        }
    }

    pub fn is_win_for(&self, side: SideId) -> bool {
        self.winning_side() == Some(side)
    }

    pub fn is_draw(&self) -> bool {
        matches!(self, Verdict::Draw)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Win(side) => write!(f, "side {} wins", side),
            Verdict::Draw => write!(f, "draw"),
        }
    }
}

/// One side's view of a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FightResult {
    Win,
    Loss,
    Draw,
}

impl FightResult {
    pub fn is_win(&self) -> bool {
        matches!(self, FightResult::Win)
    }

    pub fn is_draw(&self) -> bool {
        matches!(self, FightResult::Draw)
    }
}

impl Verdict {
    /// How the verdict reads from one side's corner.
    pub fn result_for(&self, side: SideId) -> FightResult {
        match self {
            Verdict::Draw => FightResult::Draw,
            Verdict::Win(winner) if *winner == side => FightResult::Win,
            Verdict::Win(_) => FightResult::Loss,
        }
    }
}

/// Compact record of one side's final state, as the verdict saw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SideSummary {
    pub robot_ids: Vec<u64>,
    /// Robot whose HP decided this side's fate.
    pub deciding_robot_id: u64,
    pub deciding_final_hp: f64,
    pub tag_out_occurred: bool,
}

impl SideSummary {
    pub fn from_report(side: &SideReport) -> Self {
        let deciding = side.current_fighter();
        Self {
            robot_ids: side.robot_ids(),
            deciding_robot_id: deciding.robot_id,
            deciding_final_hp: deciding.final_hp,
            tag_out_occurred: match side {
                SideReport::Solo(_) => false,
                SideReport::Team(team) => team.tag_out_occurred(),
            },
        }
    }
}

/// Immutable outcome of one resolved battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BattleOutcome {
    pub battle_id: Uuid,
    pub cycle_number: u32,
    pub kind: BattleKind,
    pub verdict: Verdict,
    pub is_bye: bool,
    /// Both sides standing without a time-out: resolved to a draw and
    /// flagged here so reporting can surface it.
    pub anomalous: bool,
    pub side_a: SideSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_b: Option<SideSummary>,
}

impl BattleOutcome {
    /// Robots on the winning side, empty for draws and byes never listed.
    pub fn winning_robot_ids(&self) -> Vec<u64> {
        match self.verdict.winning_side() {
            Some(SideId::A) => self.side_a.robot_ids.clone(),
            Some(SideId::B) => {
                self.side_b.as_ref().map(|side| side.robot_ids.clone()).unwrap_or_default()
            }
            None => Vec::new(),
        }
    }

    pub fn side(&self, id: SideId) -> Option<&SideSummary> {
        match id {
            SideId::A => Some(&self.side_a),
            SideId::B => self.side_b.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_accessors() {
        assert_eq!(Verdict::Win(SideId::A).winning_side(), Some(SideId::A));
        assert!(Verdict::Win(SideId::B).is_win_for(SideId::B));
        assert!(!Verdict::Win(SideId::B).is_win_for(SideId::A));
        assert!(Verdict::Draw.is_draw());
        assert_eq!(Verdict::Draw.winning_side(), None);
    }

    #[test]
    fn test_verdict_serde_naming() {
        let win = serde_json::to_string(&Verdict::Win(SideId::A)).unwrap();
        assert_eq!(win, "{\"win\":\"a\"}");
        let draw = serde_json::to_string(&Verdict::Draw).unwrap();
        assert_eq!(draw, "\"draw\"");
    }

    #[test]
    fn test_side_opponent() {
        assert_eq!(SideId::A.opponent(), SideId::B);
        assert_eq!(SideId::B.opponent(), SideId::A);
    }

    #[test]
    fn test_result_for_each_side() {
        let verdict = Verdict::Win(SideId::B);
        assert_eq!(verdict.result_for(SideId::A), FightResult::Loss);
        assert_eq!(verdict.result_for(SideId::B), FightResult::Win);
        assert_eq!(Verdict::Draw.result_for(SideId::A), FightResult::Draw);
    }
}
