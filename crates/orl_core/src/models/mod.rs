pub mod audit;
pub mod battle;
pub mod ledger;
pub mod outcome;
pub mod participant;
pub mod revenue;

#[cfg(test)]
pub mod proptest_gen;


pub use audit::{
    AuditEvent, AuditEventKind, AuditPayload, BattleAuditPayload, CycleSummary, FailedSettlement,
    RevenueRecord, SettlementRecord, StableAward,
};
pub use battle::{
    BattleKind, BattleReport, FighterReport, FighterSlot, SideReport, TeamSideReport,
    TournamentContext,
};
pub use ledger::{LedgerEntry, LedgerKey};
pub use outcome::{BattleOutcome, FightResult, SideId, SideSummary, Verdict};
pub use participant::{
    LeagueTier, ParticipantRole, RobotRecord, DEFAULT_MAX_HP, INITIAL_RATING,
};
pub use revenue::{RevenueBreakdown, TagTeamRevenue, TeamRevenue};
