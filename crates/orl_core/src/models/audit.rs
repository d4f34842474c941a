//! Audit events
//!
//! Append-only records of everything the pipeline settled. One event per
//! settled battle plus cycle lifecycle markers, each stamped with a
//! per-cycle monotonically increasing sequence number. Events are written
//! only after every ledger mutation for the battle has committed, so a
//! consumer replaying the log never sees a payout the ledger does not hold.

use super::battle::BattleKind;
use super::ledger::LedgerKey;
use super::outcome::BattleOutcome;
use super::participant::ParticipantRole;
use super::revenue::RevenueBreakdown;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================
// Event Kinds
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    BattleComplete,
    TagTeamBattle,
    TournamentMatch,
    CycleStart,
    CycleComplete,
}

impl fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuditEventKind::BattleComplete => "battle_complete",
            AuditEventKind::TagTeamBattle => "tag_team_battle",
            AuditEventKind::TournamentMatch => "tournament_match",
            AuditEventKind::CycleStart => "cycle_start",
            AuditEventKind::CycleComplete => "cycle_complete",
        };
        write!(f, "{}", name)
    }
}

// ============================================
// Battle Payload
// ============================================

/// Per-robot counter movement for one settled battle. Before/after pairs are
/// the exact values the pipeline read and wrote; revenue consumers can assert
/// the ordering contract from these alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SettlementRecord {
    pub robot_id: u64,
    pub role: ParticipantRole,
    pub battles_before: u64,
    pub battles_after: u64,
    pub fame_before: u64,
    pub fame_after: u64,
    pub fame_awarded: u64,
    pub rating_before: i32,
    pub rating_after: i32,
    pub league_points_before: u32,
    pub league_points_after: u32,
    pub repair_cost: i64,
    pub destroyed: bool,
    pub tagged_out: bool,
    pub tagged_in: bool,
}

/// Credits and prestige granted to one stable for this battle. Crediting the
/// stable balance is the stables service's job; settlement only reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StableAward {
    pub stable_id: u64,
    pub credits: i64,
    pub prestige: u64,
}

/// One ledger write that the settlement performed. Tag-team writes name the
/// robots whose maxima fed the formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RevenueRecord {
    pub key: LedgerKey,
    pub breakdown: RevenueBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_battles_robot_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fame_robot_id: Option<u64>,
}

/// Everything a settled battle leaves behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BattleAuditPayload {
    pub outcome: BattleOutcome,
    /// One record per paid ledger key; empty for byes.
    pub revenue: Vec<RevenueRecord>,
    pub participants: Vec<SettlementRecord>,
    /// One entry per real side.
    pub stable_awards: Vec<StableAward>,
}

// ============================================
// Cycle Lifecycle Payloads
// ============================================

/// Batch totals for one settled cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct CycleSummary {
    pub cycle_number: u32,
    pub scheduled: u32,
    pub settled: u32,
    pub decisive: u32,
    pub draws: u32,
    pub byes: u32,
    pub failed: u32,
    pub total_revenue_paid: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailedSettlement>,
}

/// A settlement that aborted, kept for operator review. The battle itself
/// remains unsettled and retryable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FailedSettlement {
    pub battle_id: Uuid,
    pub error: String,
    pub retryable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditPayload {
    Battle(BattleAuditPayload),
    CycleStart { scheduled: u32 },
    CycleComplete(CycleSummary),
}

// ============================================
// Audit Event
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub cycle_number: u32,
    /// Monotonically increasing within the cycle, starting at 1.
    pub sequence_number: u64,
    pub kind: AuditEventKind,
    pub timestamp: DateTime<Utc>,
    pub payload: AuditPayload,
}

impl AuditEvent {
    pub fn battle(cycle_number: u32, sequence_number: u64, payload: BattleAuditPayload) -> Self {
        let kind = match payload.outcome.kind {
            BattleKind::League => AuditEventKind::BattleComplete,
            BattleKind::TagTeam => AuditEventKind::TagTeamBattle,
            BattleKind::Tournament(_) => AuditEventKind::TournamentMatch,
        };
        Self {
            event_id: Uuid::new_v4(),
            cycle_number,
            sequence_number,
            kind,
            timestamp: Utc::now(),
            payload: AuditPayload::Battle(payload),
        }
    }

    pub fn cycle_start(cycle_number: u32, sequence_number: u64, scheduled: u32) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            cycle_number,
            sequence_number,
            kind: AuditEventKind::CycleStart,
            timestamp: Utc::now(),
            payload: AuditPayload::CycleStart { scheduled },
        }
    }

    pub fn cycle_complete(cycle_number: u32, sequence_number: u64, summary: CycleSummary) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            cycle_number,
            sequence_number,
            kind: AuditEventKind::CycleComplete,
            timestamp: Utc::now(),
            payload: AuditPayload::CycleComplete(summary),
        }
    }

    /// The settled battle, when this event carries one.
    pub fn battle_payload(&self) -> Option<&BattleAuditPayload> {
        match &self.payload {
            AuditPayload::Battle(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn is_bye_match(&self) -> bool {
        self.battle_payload().map(|payload| payload.outcome.is_bye).unwrap_or(false)
    }

    /// Generate the JSON schema for audit log consumers.
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AuditEvent)
    }
}
