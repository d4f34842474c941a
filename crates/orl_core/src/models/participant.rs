//! Participant snapshots and persistent robot counters
//!
//! `RobotRecord` is the persistent side of a combatant: the counters that
//! survive between cycles and that the settlement pipeline mutates exactly
//! once per settled battle. The per-battle vitals (final HP, damage dealt)
//! live in the battle report, not here.
//!
//! Revenue always reads `total_battle_count()`, the sum of solo and tag-team
//! battles, never either counter alone.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Starting rating for a freshly registered robot.
pub const INITIAL_RATING: i32 = 1000;

/// Default hull strength before any chassis upgrades.
pub const DEFAULT_MAX_HP: f64 = 100.0;

// ============================================
// League Tiers
// ============================================

/// League tiers, ordered from entry level upward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum LeagueTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Champion,
}

impl LeagueTier {
    /// Base fame for a decisive result at this tier.
    pub fn base_fame(&self) -> u64 {
        match self {
            LeagueTier::Bronze => 2,
            LeagueTier::Silver => 5,
            LeagueTier::Gold => 10,
            LeagueTier::Platinum => 15,
            LeagueTier::Diamond => 25,
            LeagueTier::Champion => 40,
        }
    }

    /// Stable prestige for a solo win at this tier.
    pub fn base_prestige(&self) -> u64 {
        match self {
            LeagueTier::Bronze => 5,
            LeagueTier::Silver => 10,
            LeagueTier::Gold => 20,
            LeagueTier::Platinum => 30,
            LeagueTier::Diamond => 50,
            LeagueTier::Champion => 75,
        }
    }
}

impl fmt::Display for LeagueTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LeagueTier::Bronze => "bronze",
            LeagueTier::Silver => "silver",
            LeagueTier::Gold => "gold",
            LeagueTier::Platinum => "platinum",
            LeagueTier::Diamond => "diamond",
            LeagueTier::Champion => "champion",
        };
        write!(f, "{}", name)
    }
}

/// Role a participant plays within its match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Solo,
    TeamActive,
    TeamReserve,
}

// ============================================
// Persistent Robot Record
// ============================================

/// Persistent counters for one robot.
///
/// Owned by a stable (`stable_id`); the stable's broadcast studio level
/// governs the shared revenue multiplier for every robot under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RobotRecord {
    pub robot_id: u64,
    /// Owning stable (player account).
    pub stable_id: u64,
    pub name: String,
    pub league: LeagueTier,
    pub max_hp: f64,
    /// Solo and tournament battles fought.
    pub total_battles: u64,
    /// Tag-team battles fought.
    pub total_tag_battles: u64,
    pub fame: u64,
    pub rating: i32,
    pub league_points: u32,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    pub times_tagged_in: u64,
    pub times_tagged_out: u64,
}

impl RobotRecord {
    pub fn new(robot_id: u64, stable_id: u64, name: impl Into<String>) -> Self {
        Self {
            robot_id,
            stable_id,
            name: name.into(),
            league: LeagueTier::Bronze,
            max_hp: DEFAULT_MAX_HP,
            total_battles: 0,
            total_tag_battles: 0,
            fame: 0,
            rating: INITIAL_RATING,
            league_points: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            times_tagged_in: 0,
            times_tagged_out: 0,
        }
    }

    pub fn with_league(mut self, league: LeagueTier) -> Self {
        self.league = league;
        self
    }

    pub fn with_counters(mut self, battles: u64, tag_battles: u64, fame: u64) -> Self {
        self.total_battles = battles;
        self.total_tag_battles = tag_battles;
        self.fame = fame;
        self
    }

    /// Battles fought across every format. Revenue multipliers read this,
    /// never a single counter.
    pub fn total_battle_count(&self) -> u64 {
        self.total_battles + self.total_tag_battles
    }
}
